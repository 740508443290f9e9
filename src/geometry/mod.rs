pub mod chain;
pub mod primitive;
pub mod shape;
