//! Domain models
//!
//! This module contains all domain models used throughout the application.

pub mod grading;
pub mod language;
pub mod problem;
pub mod submission;
pub mod test_case;

pub use grading::*;
pub use language::*;
pub use problem::*;
pub use submission::*;
pub use test_case::*;
