//! Utility functions

pub mod validation;

pub use validation::{parse_id, parse_language, validate_source_code};
