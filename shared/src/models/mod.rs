//! Domain models for the horticulture operations platform

mod intake;
mod sorting;

pub use intake::*;
pub use sorting::*;
