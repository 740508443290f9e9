pub mod branch;
mod node;

pub use node::*;
