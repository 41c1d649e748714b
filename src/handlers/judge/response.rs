//! Run/submit response DTOs

pub use crate::models::{RunResultEntry, SubmissionResult};

/// Toast text for a run
pub fn run_message(results: &[RunResultEntry]) -> String {
    let passed = results.iter().filter(|r| r.passed).count();
    format!("{} of {} examples passed", passed, results.len())
}

/// Toast text for a submission
pub fn submit_message(result: &SubmissionResult) -> String {
    format!(
        "{}: {} of {} test cases passed",
        result.status, result.meta.passed_test_cases, result.meta.total_test_cases
    )
}
