//! Core math modules.

pub mod argmax;
pub mod distribution;
pub mod linear;
