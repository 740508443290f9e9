//! Layer-aware spatial index over routable items.
//!
//! Each copper layer gets its own R-tree of item outlines. Items are
//! identified by copyable handles; the index never owns the items
//! themselves and only learns about them through the `AccessItem` traits.

mod index;
pub mod shape_index;

pub use index::*;
