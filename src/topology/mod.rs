//! Reconstruction of the electrical paths a user interacts with: trivial
//! paths through vias, tuning paths between pads, and differential pairs.

pub mod diff_pair;
pub mod itemset;
mod topology;

pub use topology::*;
