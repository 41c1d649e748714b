//! Judging engine
//!
//! Grades one piece of user code against an ordered set of cases. Cases run
//! concurrently in isolated sandboxes, bounded by `max_parallel_cases`, and
//! the reports come back in case order. User-code failures are reports,
//! never errors.
//!
//! Each case runs in its own spawned task that owns its data, so a case that
//! has started keeps running to its own cleanup when the caller goes away.

use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt};
use tokio::time::Instant;

use crate::{
    config::JudgeConfig,
    constants::{exit_errors, MAX_DIAGNOSTIC_CHARS},
    models::{GradingCase, Language},
};

use super::{
    compare::outputs_match,
    harness::{build_program, split_output},
    outcome::{CaseReport, CaseState},
    sandbox::{ExecutionLimits, ExecutionRequest, RawExecution, Sandbox, Termination},
};

/// Engine-wide knobs
#[derive(Debug, Clone, Copy)]
pub struct JudgeSettings {
    pub max_parallel_cases: usize,
    /// Deadline for grading all cases of one request
    pub request_timeout: Duration,
    pub compile_time_limit_ms: u64,
    pub output_limit_bytes: usize,
}

impl From<&JudgeConfig> for JudgeSettings {
    fn from(config: &JudgeConfig) -> Self {
        Self {
            max_parallel_cases: config.max_parallel_cases,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            compile_time_limit_ms: config.compile_time_limit_ms,
            output_limit_bytes: config.output_limit_bytes,
        }
    }
}

/// Code to grade against a set of cases
#[derive(Debug, Clone)]
pub struct GradeRequest {
    pub code: String,
    pub language: Language,
    pub entry_point: String,
    pub time_limit_ms: u64,
    pub memory_limit_mb: u64,
    pub cases: Vec<GradingCase>,
}

#[derive(Clone)]
pub struct JudgeEngine {
    sandbox: Arc<dyn Sandbox>,
    settings: JudgeSettings,
}

impl JudgeEngine {
    pub fn new(sandbox: Arc<dyn Sandbox>, settings: JudgeSettings) -> Self {
        Self { sandbox, settings }
    }

    /// Name of the sandbox backend in use
    pub fn backend(&self) -> &'static str {
        self.sandbox.name()
    }

    /// Grade every case; `result[i]` always belongs to `request.cases[i]`
    pub async fn grade(&self, request: &GradeRequest) -> Vec<CaseReport> {
        let deadline = Instant::now() + self.settings.request_timeout;
        let limits = ExecutionLimits {
            time_limit_ms: request.time_limit_ms,
            compile_time_limit_ms: self.settings.compile_time_limit_ms,
            memory_limit_mb: request.memory_limit_mb,
            output_limit_bytes: self.settings.output_limit_bytes,
        };

        tracing::debug!(
            language = %request.language,
            cases = request.cases.len(),
            backend = self.sandbox.name(),
            "Grading started"
        );

        let engine = self.clone();
        let shared = Arc::new(request.clone());

        stream::iter(0..request.cases.len())
            .map(move |position| {
                let engine = engine.clone();
                let request = Arc::clone(&shared);
                async move {
                    let index = request.cases[position].index;
                    tokio::spawn(async move {
                        engine.grade_case(&request, position, limits, deadline).await
                    })
                    .await
                    .unwrap_or_else(|e| {
                        tracing::error!(case = index, error = %e, "Case task failed");
                        let mut tracker = CaseTracker::new(index);
                        tracker.start();
                        tracker.finish(
                            Verdict::errored(Vec::new(), "internal grading failure".to_string()),
                            0,
                        )
                    })
                }
            })
            .buffered(self.settings.max_parallel_cases.max(1))
            .collect()
            .await
    }

    async fn grade_case(
        &self,
        request: &GradeRequest,
        position: usize,
        limits: ExecutionLimits,
        deadline: Instant,
    ) -> CaseReport {
        let case = &request.cases[position];
        let mut tracker = CaseTracker::new(case.index);

        let program = build_program(
            request.language,
            &request.code,
            &request.entry_point,
            &case.inputs,
        );
        let marker = program.marker.clone();

        tracker.start();
        let started = Instant::now();

        let execution = tokio::time::timeout_at(
            deadline,
            self.sandbox.execute(ExecutionRequest { program, limits }),
        )
        .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;

        let report = match execution {
            Err(_) => {
                tracing::warn!(case = case.index, "Request deadline reached before case finished");
                tracker.finish(Verdict::timed_out(Vec::new()), elapsed_ms)
            }
            Ok(Err(e)) => {
                tracing::error!(case = case.index, error = %e, "Sandbox failure");
                tracker.finish(Verdict::errored(Vec::new(), e.to_string()), elapsed_ms)
            }
            Ok(Ok(raw)) => {
                let elapsed_ms = raw.elapsed_ms;
                tracker.finish(judge(case, &raw, &marker), elapsed_ms)
            }
        };

        tracing::debug!(
            case = report.index,
            state = ?report.state,
            elapsed_ms = report.elapsed_ms,
            "Case finished"
        );

        report
    }
}

/// Terminal state plus what the case produced
#[derive(Debug)]
struct Verdict {
    state: CaseState,
    logs: Vec<String>,
    actual_output: String,
    exit_error: Option<String>,
}

impl Verdict {
    fn timed_out(logs: Vec<String>) -> Self {
        Self {
            state: CaseState::TimedOut,
            logs,
            actual_output: String::new(),
            exit_error: Some(exit_errors::TIMEOUT.to_string()),
        }
    }

    fn errored(logs: Vec<String>, diagnostic: String) -> Self {
        Self {
            state: CaseState::Errored,
            logs,
            actual_output: String::new(),
            exit_error: Some(diagnostic),
        }
    }
}

/// Walks one case through its lifecycle
struct CaseTracker {
    index: usize,
    state: CaseState,
}

impl CaseTracker {
    fn new(index: usize) -> Self {
        Self {
            index,
            state: CaseState::Queued,
        }
    }

    fn start(&mut self) {
        self.state = self.transition(CaseState::Running);
    }

    fn finish(mut self, verdict: Verdict, elapsed_ms: u64) -> CaseReport {
        self.state = self.transition(verdict.state);

        CaseReport {
            index: self.index,
            state: self.state,
            logs: verdict.logs,
            actual_output: verdict.actual_output,
            exit_error: verdict.exit_error,
            elapsed_ms,
        }
    }

    fn transition(&self, next: CaseState) -> CaseState {
        match self.state.advance(next) {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(case = self.index, error = %e, "Rejected case transition");
                CaseState::Errored
            }
        }
    }
}

/// Classify a finished execution
fn judge(case: &GradingCase, raw: &RawExecution, marker: &str) -> Verdict {
    let parsed = split_output(&raw.stdout, marker);

    match raw.termination {
        Termination::TimedOut => Verdict::timed_out(parsed.logs),
        Termination::MemoryLimitExceeded => Verdict::errored(
            parsed.logs,
            exit_errors::MEMORY_LIMIT_EXCEEDED.to_string(),
        ),
        Termination::CompileFailed => Verdict::errored(
            Vec::new(),
            format!("compilation_error: {}", excerpt(&raw.stderr)),
        ),
        Termination::Exited(0) => match parsed.result {
            Some(actual) => Verdict {
                state: if outputs_match(&actual, &case.expected_output) {
                    CaseState::Passed
                } else {
                    CaseState::Failed
                },
                logs: parsed.logs,
                actual_output: actual,
                exit_error: None,
            },
            None => Verdict::errored(
                parsed.logs,
                diagnostic(&raw.stderr, "program exited without returning a value"),
            ),
        },
        Termination::Exited(code) => Verdict::errored(
            parsed.logs,
            diagnostic(&raw.stderr, &format!("process exited with code {}", code)),
        ),
        Termination::Signaled(signal) => Verdict::errored(
            parsed.logs,
            diagnostic(&raw.stderr, &format!("process killed by signal {}", signal)),
        ),
    }
}

fn diagnostic(stderr: &str, fallback: &str) -> String {
    if stderr.trim().is_empty() {
        fallback.to_string()
    } else {
        excerpt(stderr)
    }
}

/// Trimmed stderr, capped at `MAX_DIAGNOSTIC_CHARS`
fn excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    match trimmed.char_indices().nth(MAX_DIAGNOSTIC_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::judge::sandbox::{MockSandbox, SandboxError};
    use crate::models::NamedInput;
    use crate::test_utils::{squares_cases, ScriptedRun, ScriptedSandbox};

    fn settings() -> JudgeSettings {
        JudgeSettings {
            max_parallel_cases: 4,
            request_timeout: Duration::from_secs(10),
            compile_time_limit_ms: 5_000,
            output_limit_bytes: 64 * 1024,
        }
    }

    fn request(cases: Vec<GradingCase>) -> GradeRequest {
        GradeRequest {
            code: "def solution(n):\n    return n * n\n".to_string(),
            language: Language::Python,
            entry_point: "solution".to_string(),
            time_limit_ms: 1_000,
            memory_limit_mb: 128,
            cases,
        }
    }

    fn engine(sandbox: impl Sandbox + 'static, settings: JudgeSettings) -> JudgeEngine {
        JudgeEngine::new(Arc::new(sandbox), settings)
    }

    fn states(reports: &[CaseReport]) -> Vec<CaseState> {
        reports.iter().map(|r| r.state).collect()
    }

    #[tokio::test]
    async fn test_grades_in_case_order() {
        let engine = engine(ScriptedSandbox::squaring(), settings());
        let reports = engine.grade(&request(squares_cases(&[("2", "4"), ("3", "9"), ("4", "16")]))).await;

        assert_eq!(reports.len(), 3);
        assert_eq!(reports.iter().map(|r| r.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(states(&reports), vec![CaseState::Passed; 3]);
        assert_eq!(reports[2].actual_output, "16");
    }

    #[tokio::test]
    async fn test_order_is_stable_when_later_cases_finish_first() {
        // Earlier cases sleep longer, so completion order is reversed
        let sandbox = ScriptedSandbox::new(|inputs| {
            let n: u64 = inputs[0].parse().unwrap();
            ScriptedRun::Return((n * n).to_string())
                .after(Duration::from_millis(200 - n * 40))
        });
        let engine = engine(sandbox, settings());
        let reports = engine
            .grade(&request(squares_cases(&[
                ("1", "1"),
                ("2", "4"),
                ("3", "9"),
                ("4", "16"),
            ])))
            .await;

        let outputs: Vec<&str> = reports.iter().map(|r| r.actual_output.as_str()).collect();
        assert_eq!(outputs, vec!["1", "4", "9", "16"]);
        assert!(reports.iter().all(|r| r.passed()));
    }

    #[tokio::test]
    async fn test_wrong_answer_is_failed_not_errored() {
        let engine = engine(ScriptedSandbox::squaring_with_bug(4, "15"), settings());
        let reports = engine
            .grade(&request(squares_cases(&[("2", "4"), ("3", "9"), ("4", "16")])))
            .await;

        assert_eq!(
            states(&reports),
            vec![CaseState::Passed, CaseState::Passed, CaseState::Failed]
        );
        assert_eq!(reports[2].actual_output, "15");
        assert_eq!(reports[2].exit_error, None);
    }

    #[tokio::test]
    async fn test_runtime_error_does_not_abort_other_cases() {
        let sandbox = ScriptedSandbox::new(|inputs| match inputs[0].as_str() {
            "2" => ScriptedRun::Crash("ZeroDivisionError: division by zero".to_string()),
            n => ScriptedRun::Return((n.parse::<i64>().unwrap().pow(2)).to_string()),
        });
        let engine = engine(sandbox, settings());
        let reports = engine
            .grade(&request(squares_cases(&[("2", "4"), ("3", "9"), ("4", "16")])))
            .await;

        assert_eq!(
            states(&reports),
            vec![CaseState::Errored, CaseState::Passed, CaseState::Passed]
        );
        let diagnostic = reports[0].exit_error.as_deref().unwrap();
        assert!(diagnostic.contains("ZeroDivisionError"));
    }

    #[tokio::test]
    async fn test_limit_breaches_are_classified() {
        let sandbox = ScriptedSandbox::new(|inputs| match inputs[0].as_str() {
            "1" => ScriptedRun::Timeout,
            "2" => ScriptedRun::OutOfMemory,
            _ => ScriptedRun::Return("9".to_string()),
        });
        let engine = engine(sandbox, settings());
        let reports = engine
            .grade(&request(squares_cases(&[("1", "1"), ("2", "4"), ("3", "9")])))
            .await;

        assert_eq!(reports[0].state, CaseState::TimedOut);
        assert_eq!(reports[0].exit_error.as_deref(), Some("timeout"));
        assert_eq!(reports[1].state, CaseState::Errored);
        assert_eq!(reports[1].exit_error.as_deref(), Some("memory_limit_exceeded"));
        assert_eq!(reports[2].state, CaseState::Passed);
    }

    #[tokio::test]
    async fn test_compile_error_reported_per_case() {
        let sandbox = ScriptedSandbox::new(|_| {
            ScriptedRun::CompileError("Main.java:3: error: ';' expected".to_string())
        });
        let engine = engine(sandbox, settings());
        let reports = engine.grade(&request(squares_cases(&[("2", "4"), ("3", "9")]))).await;

        for report in &reports {
            assert_eq!(report.state, CaseState::Errored);
            let error = report.exit_error.as_deref().unwrap();
            assert!(error.starts_with("compilation_error: "));
            assert!(error.contains("';' expected"));
        }
    }

    #[tokio::test]
    async fn test_logs_are_kept_separately_from_result() {
        let sandbox = ScriptedSandbox::new(|inputs| {
            ScriptedRun::ReturnWithLogs(
                vec![format!("got {}", inputs[0]), "done".to_string()],
                "4".to_string(),
            )
        });
        let engine = engine(sandbox, settings());
        let reports = engine.grade(&request(squares_cases(&[("2", "4")]))).await;

        assert_eq!(reports[0].logs, vec!["got 2", "done"]);
        assert_eq!(reports[0].actual_output, "4");
        assert!(reports[0].passed());
    }

    #[tokio::test]
    async fn test_request_deadline_times_out_slow_cases() {
        let sandbox = ScriptedSandbox::new(|_| {
            ScriptedRun::Return("4".to_string()).after(Duration::from_secs(5))
        });
        let engine = engine(
            sandbox,
            JudgeSettings {
                request_timeout: Duration::from_millis(100),
                ..settings()
            },
        );
        let started = std::time::Instant::now();
        let reports = engine.grade(&request(squares_cases(&[("2", "4"), ("2", "4")]))).await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(states(&reports), vec![CaseState::TimedOut; 2]);
        assert_eq!(reports[1].exit_error.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_sandbox_failure_is_errored_without_retry() {
        let mut sandbox = MockSandbox::new();
        sandbox.expect_name().return_const("mock");
        sandbox
            .expect_execute()
            .times(2)
            .returning(|_| Err(SandboxError::Unavailable("docker daemon unreachable".to_string())));

        let engine = engine(sandbox, settings());
        let reports = engine.grade(&request(squares_cases(&[("2", "4"), ("3", "9")]))).await;

        assert_eq!(states(&reports), vec![CaseState::Errored; 2]);
        assert!(reports[0]
            .exit_error
            .as_deref()
            .unwrap()
            .contains("docker daemon unreachable"));
    }

    #[tokio::test]
    async fn test_missing_result_marker_is_errored() {
        let mut sandbox = MockSandbox::new();
        sandbox.expect_name().return_const("mock");
        sandbox.expect_execute().returning(|_| {
            Ok(RawExecution {
                stdout: "partial output\n".to_string(),
                stderr: String::new(),
                termination: Termination::Exited(0),
                elapsed_ms: 3,
            })
        });

        let engine = engine(sandbox, settings());
        let reports = engine.grade(&request(squares_cases(&[("2", "4")]))).await;

        assert_eq!(reports[0].state, CaseState::Errored);
        assert_eq!(reports[0].logs, vec!["partial output"]);
        assert_eq!(
            reports[0].exit_error.as_deref(),
            Some("program exited without returning a value")
        );
    }

    #[tokio::test]
    async fn test_inputs_reach_sandbox_in_declared_order() {
        let sandbox = ScriptedSandbox::new(|inputs| ScriptedRun::Return(inputs.join("|")));
        let engine = engine(sandbox, settings());
        let case = GradingCase {
            index: 0,
            inputs: vec![NamedInput::new("a", "[1,2]"), NamedInput::new("b", "\"x\"")],
            expected_output: "[1,2]|\"x\"".to_string(),
        };
        let reports = engine.grade(&request(vec![case])).await;

        assert!(reports[0].passed());
    }

    struct SlowCountingSandbox {
        finished: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Sandbox for SlowCountingSandbox {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn execute(&self, request: ExecutionRequest) -> Result<RawExecution, SandboxError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(RawExecution {
                stdout: format!("{}\n4\n", request.program.marker),
                stderr: String::new(),
                termination: Termination::Exited(0),
                elapsed_ms: 200,
            })
        }
    }

    #[tokio::test]
    async fn test_started_cases_finish_after_caller_gives_up() {
        let finished = Arc::new(AtomicUsize::new(0));
        let engine = engine(
            SlowCountingSandbox {
                finished: Arc::clone(&finished),
            },
            settings(),
        );
        let request = request(squares_cases(&[("2", "4"), ("2", "4")]));

        let abandoned = tokio::time::timeout(Duration::from_millis(50), engine.grade(&request)).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_excerpt_caps_length() {
        let long = "e".repeat(MAX_DIAGNOSTIC_CHARS + 50);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), MAX_DIAGNOSTIC_CHARS + 3);
        assert!(cut.ends_with("..."));
        assert_eq!(excerpt("  short \n"), "short");
    }
}
