//! Isolated execution backends
//!
//! Every `execute` call owns a freshly created context (a temporary
//! directory or a container) that is destroyed before the call returns, or
//! when the call's future is dropped. Untrusted code never runs inside the
//! server process.

pub mod docker;
pub mod process;

use async_trait::async_trait;

use crate::models::Language;

use super::{harness::Program, languages::LanguageHandler};

pub use docker::DockerSandbox;
pub use process::ProcessSandbox;

/// Resource bounds for one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    pub time_limit_ms: u64,
    pub compile_time_limit_ms: u64,
    pub memory_limit_mb: u64,
    pub output_limit_bytes: usize,
}

/// One program to run
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub program: Program,
    pub limits: ExecutionLimits,
}

impl ExecutionRequest {
    pub fn language(&self) -> Language {
        self.program.language
    }
}

/// How the execution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Process exited on its own with the given code
    Exited(i32),
    /// Killed by a signal that is not attributable to a limit
    Signaled(i32),
    /// Wall-clock or CPU budget exhausted
    TimedOut,
    /// Memory ceiling breached
    MemoryLimitExceeded,
    /// Compile step failed; the program never ran
    CompileFailed,
}

/// Raw, unjudged result of an execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExecution {
    pub stdout: String,
    pub stderr: String,
    pub termination: Termination,
    pub elapsed_ms: u64,
}

/// Infrastructure failure (never a fault of the user's code)
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("sandbox I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("docker error: {0}")]
    Docker(String),

    #[error("sandbox unavailable: {0}")]
    Unavailable(String),
}

impl From<bollard::errors::Error> for SandboxError {
    fn from(err: bollard::errors::Error) -> Self {
        SandboxError::Docker(err.to_string())
    }
}

/// An isolated execution backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Compile (if needed) and run one program in a fresh isolated context
    async fn execute(&self, request: ExecutionRequest) -> Result<RawExecution, SandboxError>;
}

/// Handler table shared by the backends, with optional overrides
#[derive(Debug, Clone, Default)]
pub struct HandlerTable {
    overrides: Vec<LanguageHandler>,
}

impl HandlerTable {
    pub fn with_override(mut self, handler: LanguageHandler) -> Self {
        self.overrides.retain(|h| h.language() != handler.language());
        self.overrides.push(handler);
        self
    }

    pub fn get(&self, language: Language) -> LanguageHandler {
        self.overrides
            .iter()
            .find(|h| h.language() == language)
            .cloned()
            .unwrap_or_else(|| LanguageHandler::for_language(language))
    }
}

/// Keep at most `limit` bytes of captured output, cutting on a char boundary
pub fn truncate_output(mut text: String, limit: usize) -> String {
    if text.len() > limit {
        let mut cut = limit;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_table_override() {
        let table = HandlerTable::default().with_override(LanguageHandler::new(
            Language::Python,
            "main.sh",
            &["sh", "main.sh"],
        ));
        assert_eq!(table.get(Language::Python).source_file(), "main.sh");
        assert_eq!(table.get(Language::Php).source_file(), "solution.php");
    }

    #[test]
    fn test_truncate_output_respects_char_boundary() {
        let text = "héllo".to_string();
        assert_eq!(truncate_output(text.clone(), 2), "h");
        assert_eq!(truncate_output(text.clone(), 3), "hé");
        assert_eq!(truncate_output(text, 100), "héllo");
    }
}
