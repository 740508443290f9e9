pub mod graph;
#[macro_use]
pub mod item;
pub mod board;
pub mod geometry;
pub mod index;
pub mod math;
pub mod node;
pub mod rules;
pub mod shove;
pub mod topology;
pub mod tuning;
