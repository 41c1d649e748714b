//! Problem handler implementations

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    handlers::response::ApiResponse,
    middleware::auth::AuthenticatedUser,
    services::ProblemService,
    state::AppState,
};

use super::{
    request::ListSubmissionsQuery,
    response::{ProblemDetailResponse, SubmissionsListResponse},
};

/// Get problem detail with the caller's submission history
pub async fn get_problem(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ProblemDetailResponse>>> {
    let detail = ProblemService::get_detail(&state, &id, &user).await?;

    Ok(ApiResponse::ok("Problem fetched", detail))
}

/// List the caller's submissions for a problem (paginated)
pub async fn list_submissions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Query(query): Query<ListSubmissionsQuery>,
) -> AppResult<Json<ApiResponse<SubmissionsListResponse>>> {
    let (page, per_page) = query.pagination();
    let list = ProblemService::list_submissions(&state, &id, &user, page, per_page).await?;

    Ok(ApiResponse::ok("Submissions fetched", list))
}
