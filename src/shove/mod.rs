//! Pushing tracks of other nets aside as a new track is dragged through
//! them. Only segments move; vias, pads and arcs hold their ground.

mod shove;

pub use shove::*;
