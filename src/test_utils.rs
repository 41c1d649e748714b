//! Shared fixtures for unit and router tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    cache::{detail_key, ProblemCache},
    config::Config,
    db::repositories::{MockProblemStore, MockSubmissionStore},
    judge::{
        sandbox::{ExecutionRequest, RawExecution, Termination},
        JudgeEngine, JudgeSettings, Sandbox, SandboxError,
    },
    middleware::{auth::AuthenticatedUser, rate_limit::MockRateLimiter},
    models::{Example, GradingCase, NamedInput, NewSubmission, Problem, Submission, TestCase},
    services::AuthService,
    state::AppState,
};

pub use crate::cache::MockProblemCache;

pub const TEST_JWT_SECRET: &str = "test-secret";

pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = [
        ("DATABASE_URL", "postgres://localhost/codejudge_test"),
        ("JWT_SECRET", TEST_JWT_SECRET),
    ]
    .into_iter()
    .collect();

    Config::from_source(&|key: &str| vars.get(key).map(|v| v.to_string()))
        .expect("test config should load")
}

pub fn test_user() -> AuthenticatedUser {
    AuthenticatedUser {
        id: Uuid::new_v4(),
        username: "ada".to_string(),
    }
}

/// Signed session token for the user
pub fn token_for(user: &AuthenticatedUser) -> String {
    AuthService::issue_token(user.id, &user.username, TEST_JWT_SECRET, chrono::Duration::hours(1))
        .expect("token should sign")
}

// Fixtures

pub fn problem_fixture(id: Uuid) -> Problem {
    Problem {
        id,
        title: "Square a number".to_string(),
        description: "Return n * n.".to_string(),
        entry_point: "solution".to_string(),
        time_limit_ms: 1_000,
        memory_limit_mb: 128,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn inputs(value: &str) -> Json<Vec<NamedInput>> {
    Json(vec![NamedInput::new("n", value)])
}

pub fn examples_fixture(problem_id: Uuid, pairs: &[(&str, &str)]) -> Vec<Example> {
    pairs
        .iter()
        .enumerate()
        .map(|(position, (input, output))| Example {
            id: Uuid::new_v4(),
            problem_id,
            position: position as i32,
            inputs: inputs(input),
            output: output.to_string(),
            explanation: None,
        })
        .collect()
}

pub fn test_cases_fixture(problem_id: Uuid, pairs: &[(&str, &str)]) -> Vec<TestCase> {
    pairs
        .iter()
        .enumerate()
        .map(|(position, (input, output))| TestCase {
            id: Uuid::new_v4(),
            problem_id,
            position: position as i32,
            inputs: inputs(input),
            output: output.to_string(),
        })
        .collect()
}

/// Single-input ("n") grading cases
pub fn squares_cases(pairs: &[(&str, &str)]) -> Vec<GradingCase> {
    pairs
        .iter()
        .enumerate()
        .map(|(index, (input, output))| GradingCase {
            index,
            inputs: vec![NamedInput::new("n", *input)],
            expected_output: output.to_string(),
        })
        .collect()
}

/// Store that knows exactly one problem
pub fn problem_store(
    problem: Problem,
    examples: Vec<Example>,
    test_cases: Vec<TestCase>,
) -> MockProblemStore {
    let known = problem.id;
    let mut store = MockProblemStore::new();
    store
        .expect_find_by_id()
        .returning(move |id| Ok((id == known).then(|| problem.clone())));
    store
        .expect_list_examples()
        .returning(move |_| Ok(examples.clone()));
    store
        .expect_list_test_cases()
        .returning(move |_| Ok(test_cases.clone()));
    store
}

pub fn saved_submission(new: &NewSubmission) -> Submission {
    Submission {
        id: Uuid::new_v4(),
        user_id: new.user_id,
        problem_id: new.problem_id,
        language: new.language.clone(),
        code: new.code.clone(),
        status: new.status.as_str().to_string(),
        passed_test_cases: new.passed_test_cases,
        total_test_cases: new.total_test_cases,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn empty_problem_store() -> MockProblemStore {
    let mut store = MockProblemStore::new();
    store.expect_find_by_id().returning(|_| Ok(None));
    store
}

fn quiet_cache() -> MockProblemCache {
    let mut cache = MockProblemCache::new();
    cache.expect_version().returning(|_| Ok(0));
    cache.expect_get_detail().returning(|_, _, _| Ok(None));
    cache.expect_put_detail().returning(|_, _, _, _, _| Ok(()));
    cache.expect_invalidate_problem().returning(|_| Ok(()));
    cache
}

fn open_limiter() -> MockRateLimiter {
    let mut limiter = MockRateLimiter::new();
    limiter.expect_hit().returning(|_, _| Ok(1));
    limiter
}

/// Application state assembled from mocks
pub struct TestStateBuilder {
    problems: MockProblemStore,
    submissions: MockSubmissionStore,
    cache: Arc<dyn ProblemCache>,
    limiter: MockRateLimiter,
    sandbox: Arc<dyn Sandbox>,
    config: Config,
}

impl TestStateBuilder {
    pub fn new() -> Self {
        Self {
            problems: empty_problem_store(),
            submissions: MockSubmissionStore::new(),
            cache: Arc::new(quiet_cache()),
            limiter: open_limiter(),
            sandbox: Arc::new(ScriptedSandbox::squaring()),
            config: test_config(),
        }
    }

    pub fn with_problems(mut self, problems: MockProblemStore) -> Self {
        self.problems = problems;
        self
    }

    pub fn with_submissions(mut self, submissions: MockSubmissionStore) -> Self {
        self.submissions = submissions;
        self
    }

    pub fn with_cache(mut self, cache: MockProblemCache) -> Self {
        self.cache = Arc::new(cache);
        self
    }

    pub fn with_shared_cache(mut self, cache: Arc<dyn ProblemCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_limiter(mut self, limiter: MockRateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_sandbox(mut self, sandbox: Arc<dyn Sandbox>) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> AppState {
        let judge = JudgeEngine::new(self.sandbox, JudgeSettings::from(&self.config.judge));
        AppState::new(
            Arc::new(self.problems),
            Arc::new(self.submissions),
            self.cache,
            Arc::new(self.limiter),
            judge,
            self.config,
        )
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// In-memory cache

/// Problem cache held in process, versioned like the Redis one
#[derive(Default)]
pub struct MemoryProblemCache {
    entries: Mutex<HashMap<String, String>>,
    versions: Mutex<HashMap<Uuid, u64>>,
}

impl MemoryProblemCache {
    pub fn bump_version(&self, problem_id: Uuid) {
        *self.versions.lock().unwrap().entry(problem_id).or_default() += 1;
    }
}

#[async_trait]
impl ProblemCache for MemoryProblemCache {
    async fn version(&self, problem_id: Uuid) -> Result<u64, redis::RedisError> {
        Ok(self.versions.lock().unwrap().get(&problem_id).copied().unwrap_or(0))
    }

    async fn get_detail(
        &self,
        problem_id: Uuid,
        user_id: Uuid,
        version: u64,
    ) -> Result<Option<String>, redis::RedisError> {
        let key = detail_key(problem_id, user_id, version);
        Ok(self.entries.lock().unwrap().get(&key).cloned())
    }

    async fn put_detail(
        &self,
        problem_id: Uuid,
        user_id: Uuid,
        version: u64,
        payload: String,
        _ttl_secs: u64,
    ) -> Result<(), redis::RedisError> {
        let key = detail_key(problem_id, user_id, version);
        self.entries.lock().unwrap().insert(key, payload);
        Ok(())
    }

    async fn invalidate_problem(&self, problem_id: Uuid) -> Result<(), redis::RedisError> {
        self.bump_version(problem_id);
        let prefix = format!("problem:detail:{}:", problem_id);
        self.entries.lock().unwrap().retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }
}

// Scripted sandbox

/// What a scripted program does for one case
#[derive(Debug, Clone)]
pub enum ScriptedRun {
    Return(String),
    ReturnWithLogs(Vec<String>, String),
    Crash(String),
    Timeout,
    OutOfMemory,
    CompileError(String),
    Unavailable(String),
    Delayed(Duration, Box<ScriptedRun>),
}

impl ScriptedRun {
    pub fn after(self, delay: Duration) -> Self {
        Self::Delayed(delay, Box::new(self))
    }
}

type Script = dyn Fn(&[String]) -> ScriptedRun + Send + Sync;

/// Sandbox that answers from a script instead of running code. The script
/// sees the decoded stdin values of each execution.
pub struct ScriptedSandbox {
    script: Box<Script>,
    executions: AtomicUsize,
}

impl ScriptedSandbox {
    pub fn new(script: impl Fn(&[String]) -> ScriptedRun + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            executions: AtomicUsize::new(0),
        }
    }

    /// A correct `solution(n) = n * n`
    pub fn squaring() -> Self {
        Self::new(|inputs| ScriptedRun::Return(square(&inputs[0])))
    }

    /// Squares everything except `bad_input`, which returns `wrong`
    pub fn squaring_with_bug(bad_input: i64, wrong: &'static str) -> Self {
        Self::new(move |inputs| {
            if inputs[0].trim().parse::<i64>().ok() == Some(bad_input) {
                ScriptedRun::Return(wrong.to_string())
            } else {
                ScriptedRun::Return(square(&inputs[0]))
            }
        })
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

fn square(raw: &str) -> String {
    let n: i64 = raw.trim().parse().unwrap_or_default();
    (n * n).to_string()
}

/// Input values, after the marker line
fn decode_stdin(stdin: &str) -> Vec<String> {
    let engine = base64::engine::general_purpose::STANDARD;
    stdin
        .lines()
        .skip(1)
        .map(|line| {
            let bytes = engine.decode(line).unwrap_or_default();
            String::from_utf8_lossy(&bytes).into_owned()
        })
        .collect()
}

fn raw(stdout: String, stderr: String, termination: Termination) -> RawExecution {
    RawExecution {
        stdout,
        stderr,
        termination,
        elapsed_ms: 1,
    }
}

#[async_trait]
impl Sandbox for ScriptedSandbox {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn execute(&self, request: ExecutionRequest) -> Result<RawExecution, SandboxError> {
        self.executions.fetch_add(1, Ordering::SeqCst);

        let inputs = decode_stdin(&request.program.stdin);
        let mut run = (self.script)(&inputs);
        while let ScriptedRun::Delayed(delay, inner) = run {
            tokio::time::sleep(delay).await;
            run = *inner;
        }

        let marker = &request.program.marker;
        let execution = match run {
            ScriptedRun::Return(value) => raw(
                format!("{}\n{}\n", marker, value),
                String::new(),
                Termination::Exited(0),
            ),
            ScriptedRun::ReturnWithLogs(logs, value) => raw(
                format!("{}\n{}\n{}\n", logs.join("\n"), marker, value),
                String::new(),
                Termination::Exited(0),
            ),
            ScriptedRun::Crash(stderr) => raw(String::new(), stderr, Termination::Exited(1)),
            ScriptedRun::Timeout => raw(String::new(), String::new(), Termination::TimedOut),
            ScriptedRun::OutOfMemory => raw(
                String::new(),
                String::new(),
                Termination::MemoryLimitExceeded,
            ),
            ScriptedRun::CompileError(stderr) => {
                raw(String::new(), stderr, Termination::CompileFailed)
            }
            ScriptedRun::Unavailable(message) => return Err(SandboxError::Unavailable(message)),
            ScriptedRun::Delayed(..) => unreachable!("delays are unwrapped above"),
        };

        Ok(execution)
    }
}
