//! HTTP handlers

pub mod health;
pub mod intake;
pub mod sorting;

pub use health::*;
pub use intake::*;
pub use sorting::*;
