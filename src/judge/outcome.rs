//! Per-test-case lifecycle and the report the engine produces

use serde::Serialize;

/// Lifecycle of a single test case execution
///
/// `Queued -> Running -> {Passed, Failed, TimedOut, Errored}`. Terminal
/// states never change again; there are no retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseState {
    Queued,
    Running,
    Passed,
    Failed,
    TimedOut,
    Errored,
}

/// Rejected state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid case transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: CaseState,
    pub to: CaseState,
}

impl CaseState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Passed | Self::Failed | Self::TimedOut | Self::Errored
        )
    }

    /// Move to `next`, enforcing the lifecycle
    pub fn advance(self, next: CaseState) -> Result<CaseState, InvalidTransition> {
        let allowed = match self {
            Self::Queued => matches!(next, Self::Running),
            Self::Running => next.is_terminal(),
            _ => false,
        };

        if allowed {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

/// Outcome of grading one test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    /// Stable index of the case within the graded set
    pub index: usize,
    pub state: CaseState,
    /// Lines the program printed before returning
    pub logs: Vec<String>,
    /// Value returned by the entry point (empty if it never returned)
    pub actual_output: String,
    /// `timeout`, `memory_limit_exceeded` or a diagnostic excerpt
    pub exit_error: Option<String>,
    pub elapsed_ms: u64,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.state == CaseState::Passed
    }

    /// Logs followed by the diagnostic line, if any
    pub fn logs_with_diagnostic(&self) -> Vec<String> {
        let mut logs = self.logs.clone();
        if let Some(error) = &self.exit_error {
            logs.push(format!("Error: {}", error));
        }
        logs
    }
}
