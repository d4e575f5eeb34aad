//! Business logic services for the horticulture operations platform

pub mod intake;
pub mod sorting;

pub use intake::IntakeService;
pub use sorting::SortingService;
