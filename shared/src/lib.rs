//! Shared types and models for the horticulture operations platform
//!
//! This crate holds the intake and sorting models, the weight reconciliation
//! core and domain validation. It is used by the backend and compiled to WASM
//! for the sorting forms.

pub mod models;
pub mod reconcile;
pub mod types;
pub mod validation;

pub use models::*;
pub use reconcile::*;
pub use types::*;
pub use validation::*;
