//! Problem service

use crate::{
    constants::PROBLEM_DETAIL_HISTORY_SIZE,
    error::{AppError, AppResult},
    handlers::problems::response::{
        ProblemDetailResponse, SubmissionSummary, SubmissionsListResponse,
    },
    middleware::auth::AuthenticatedUser,
    state::AppState,
    utils::validation::parse_id,
};

/// Problem service for business logic
pub struct ProblemService;

impl ProblemService {
    /// Problem detail view for a user, served from cache when possible.
    /// The cache version is read before the database so a submit landing
    /// mid-read leaves this view under a stale version.
    pub async fn get_detail(
        state: &AppState,
        raw_id: &str,
        user: &AuthenticatedUser,
    ) -> AppResult<ProblemDetailResponse> {
        let problem_id = parse_id(raw_id, "Problem id")?;

        let version = match state.cache().version(problem_id).await {
            Ok(version) => Some(version),
            Err(e) => {
                tracing::warn!(problem_id = %problem_id, error = %e, "Problem cache unavailable");
                None
            }
        };

        if let Some(version) = version {
            match state.cache().get_detail(problem_id, user.id, version).await {
                Ok(Some(payload)) => match serde_json::from_str(&payload) {
                    Ok(detail) => return Ok(detail),
                    Err(e) => tracing::warn!(problem_id = %problem_id, error = %e, "Discarding unreadable cache entry"),
                },
                Ok(None) => {}
                Err(e) => tracing::warn!(problem_id = %problem_id, error = %e, "Problem cache unavailable"),
            }
        }

        let problem = state
            .problems()
            .find_by_id(problem_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Problem not found".to_string()))?;

        let examples = state.problems().list_examples(problem_id).await?;
        let history = state
            .submissions()
            .list_for_user_problem(user.id, problem_id, PROBLEM_DETAIL_HISTORY_SIZE, 0)
            .await?;

        let judge = &state.config().judge;
        let detail = ProblemDetailResponse::build(
            &problem,
            problem.effective_time_limit_ms(judge.default_time_limit_ms, judge.max_time_limit_ms),
            problem.effective_memory_limit_mb(judge.default_memory_limit_mb, judge.max_memory_limit_mb),
            judge.enabled_languages.clone(),
            examples,
            history,
        );

        if let Some(version) = version {
            match serde_json::to_string(&detail) {
                Ok(payload) => {
                    let ttl = state.config().cache.problem_ttl_secs;
                    if let Err(e) = state
                        .cache()
                        .put_detail(problem_id, user.id, version, payload, ttl)
                        .await
                    {
                        tracing::warn!(problem_id = %problem_id, error = %e, "Failed to cache problem detail");
                    }
                }
                Err(e) => tracing::warn!(problem_id = %problem_id, error = %e, "Failed to serialize problem detail"),
            }
        }

        Ok(detail)
    }

    /// The user's submissions for a problem, newest first
    pub async fn list_submissions(
        state: &AppState,
        raw_id: &str,
        user: &AuthenticatedUser,
        page: u32,
        per_page: u32,
    ) -> AppResult<SubmissionsListResponse> {
        let problem_id = parse_id(raw_id, "Problem id")?;

        if state.problems().find_by_id(problem_id).await?.is_none() {
            return Err(AppError::NotFound("Problem not found".to_string()));
        }

        let limit = per_page as i64;
        let offset = (page.saturating_sub(1) as i64) * limit;

        let submissions = state
            .submissions()
            .list_for_user_problem(user.id, problem_id, limit, offset)
            .await?;
        let total = state
            .submissions()
            .count_for_user_problem(user.id, problem_id)
            .await?;

        Ok(SubmissionsListResponse {
            submissions: submissions.into_iter().map(SubmissionSummary::from).collect(),
            total,
            page,
            per_page,
        })
    }
}
