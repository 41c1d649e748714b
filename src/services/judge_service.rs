//! Code submission gateway
//!
//! Validates run/submit requests, resolves the problem's cases, hands them to
//! the judging engine and shapes the result. Submit grades first and persists
//! second: a storage failure is logged and the grade is still returned.
//! Submit grading and recording run in a detached task, so they complete even
//! when the client disconnects.

use uuid::Uuid;
use validator::Validate;

use crate::{
    constants::DEFAULT_ENTRY_POINT,
    error::{AppError, AppResult},
    handlers::judge::{RunCodeRequest, SubmitCodeRequest},
    judge::GradeRequest,
    middleware::auth::AuthenticatedUser,
    models::{
        run_results, GradingCase, Language, NewSubmission, Problem, RunResultEntry,
        SubmissionResult,
    },
    state::AppState,
    utils::validation::{parse_id, parse_language},
};

pub struct JudgeService;

impl JudgeService {
    /// Grade code against the problem's visible examples; nothing is stored
    pub async fn run(state: &AppState, payload: RunCodeRequest) -> AppResult<Vec<RunResultEntry>> {
        payload.validate()?;
        let (problem, language) = Self::resolve(state, &payload).await?;

        let examples = state.problems().list_examples(problem.id).await?;
        let cases = GradingCase::from_examples(&examples);
        if cases.is_empty() {
            return Err(AppError::Validation(
                "Problem has no examples to run".to_string(),
            ));
        }

        let request = Self::grade_request(state, &problem, language, payload.code, cases);
        let reports = state.judge().grade(&request).await;
        let results = run_results(&request.cases, &reports);

        tracing::info!(
            problem_id = %problem.id,
            language = %language,
            passed = results.iter().filter(|r| r.passed).count(),
            total = results.len(),
            "Run graded"
        );

        Ok(results)
    }

    /// Grade code against the hidden test cases and record one submission
    pub async fn submit(
        state: &AppState,
        user: &AuthenticatedUser,
        payload: SubmitCodeRequest,
    ) -> AppResult<SubmissionResult> {
        payload.validate()?;

        let user_id = parse_id(&payload.user_id, "userId")?;
        if user_id != user.id {
            return Err(AppError::Forbidden(
                "userId does not match the signed-in user".to_string(),
            ));
        }

        let run = payload.as_run();
        let (problem, language) = Self::resolve(state, &run).await?;

        let test_cases = state.problems().list_test_cases(problem.id).await?;
        let cases = GradingCase::from_test_cases(&test_cases);
        if cases.is_empty() {
            return Err(AppError::Validation("Problem has no test cases".to_string()));
        }

        let request = Self::grade_request(state, &problem, language, run.code, cases);

        let task_state = state.clone();
        let problem_id = problem.id;
        tokio::spawn(async move {
            Self::grade_and_record(&task_state, user_id, problem_id, language, request).await
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("grading task failed: {}", e)))
    }

    async fn grade_and_record(
        state: &AppState,
        user_id: Uuid,
        problem_id: Uuid,
        language: Language,
        request: GradeRequest,
    ) -> SubmissionResult {
        let reports = state.judge().grade(&request).await;
        let mut result = SubmissionResult::from_reports(&request.cases, &reports);

        tracing::info!(
            problem_id = %problem_id,
            user_id = %user_id,
            language = %language,
            passed = result.meta.passed_test_cases,
            total = result.meta.total_test_cases,
            status = %result.status,
            "Submission graded"
        );

        let submission = NewSubmission {
            user_id,
            problem_id,
            language: language.as_str().to_string(),
            code: request.code,
            status: result.status,
            passed_test_cases: result.meta.passed_test_cases as i32,
            total_test_cases: result.meta.total_test_cases as i32,
        };

        match state.submissions().create(submission).await {
            Ok(saved) => {
                result.submission_id = Some(saved.id);

                if let Err(e) = state.cache().invalidate_problem(problem_id).await {
                    tracing::warn!(problem_id = %problem_id, error = %e, "Failed to invalidate problem cache");
                }
            }
            Err(e) => {
                tracing::error!(
                    problem_id = %problem_id,
                    user_id = %user_id,
                    error = %e,
                    "Failed to persist submission, returning grade anyway"
                );
            }
        }

        result
    }

    /// Check language and problem, in that order
    async fn resolve(state: &AppState, payload: &RunCodeRequest) -> AppResult<(Problem, Language)> {
        let language = parse_language(&payload.language, &state.config().judge)?;
        let problem_id = parse_id(&payload.problem_id, "problemId")?;

        let problem = state
            .problems()
            .find_by_id(problem_id)
            .await?
            .ok_or_else(|| AppError::Validation("Problem not found".to_string()))?;

        Ok((problem, language))
    }

    fn grade_request(
        state: &AppState,
        problem: &Problem,
        language: Language,
        code: String,
        cases: Vec<GradingCase>,
    ) -> GradeRequest {
        let judge = &state.config().judge;
        let entry_point = if problem.entry_point.trim().is_empty() {
            DEFAULT_ENTRY_POINT.to_string()
        } else {
            problem.entry_point.trim().to_string()
        };

        GradeRequest {
            code,
            language,
            entry_point,
            time_limit_ms: problem
                .effective_time_limit_ms(judge.default_time_limit_ms, judge.max_time_limit_ms),
            memory_limit_mb: problem
                .effective_memory_limit_mb(judge.default_memory_limit_mb, judge.max_memory_limit_mb),
            cases,
        }
    }
}
