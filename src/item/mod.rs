#[macro_use]
pub mod graph;
pub mod arc;
pub mod layers;
pub mod line;
pub mod seg;
pub mod solid;
pub mod via;
