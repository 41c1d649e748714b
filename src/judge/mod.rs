//! Code judging subsystem
//!
//! This module runs untrusted submissions against test cases:
//! - Language drivers that call the user's entry point
//! - Isolated sandboxes (subprocess or container per run)
//! - Output normalization and comparison
//! - Concurrent grading with per-case lifecycle tracking

pub mod compare;
pub mod engine;
pub mod harness;
pub mod languages;
pub mod outcome;
pub mod sandbox;

pub use engine::{GradeRequest, JudgeEngine, JudgeSettings};
pub use outcome::{CaseReport, CaseState};
pub use sandbox::{Sandbox, SandboxError};
