//! Interactive length and skew tuning with meanders.

pub mod meander;
pub mod placer;
pub mod settings;
pub mod skew;
