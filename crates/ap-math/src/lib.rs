//! alphaplan math utilities.

pub mod math;

pub use math::argmax::*;
pub use math::distribution::*;
pub use math::linear::*;
