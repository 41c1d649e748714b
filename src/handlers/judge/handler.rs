//! Run/submit handler implementations

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    handlers::{extract::AppJson, response::ApiResponse},
    middleware::auth::AuthenticatedUser,
    services::JudgeService,
    state::AppState,
};

use super::{
    request::{RunCodeRequest, SubmitCodeRequest},
    response::{run_message, submit_message, RunResultEntry, SubmissionResult},
};

/// Run code against the visible examples
pub async fn run_code(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    AppJson(payload): AppJson<RunCodeRequest>,
) -> AppResult<Json<ApiResponse<Vec<RunResultEntry>>>> {
    let results = JudgeService::run(&state, payload).await?;

    Ok(ApiResponse::ok(run_message(&results), results))
}

/// Grade code against the hidden test cases and record the submission
pub async fn submit_code(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(payload): AppJson<SubmitCodeRequest>,
) -> AppResult<Json<ApiResponse<SubmissionResult>>> {
    let result = JudgeService::submit(&state, &user, payload).await?;

    Ok(ApiResponse::ok(submit_message(&result), result))
}
