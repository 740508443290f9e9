//! Board-level view: the routable node together with the metadata
//! (layer and net names, clearances, stackup) that gives it meaning.

mod board;
pub mod description;
pub mod mesadata;

pub use board::*;
