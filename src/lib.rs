//! CodeJudge - code submission and grading gateway
//!
//! Accepts user code for a coding-practice problem, runs it against the
//! problem's visible examples ("Run") or hidden test cases ("Submit") inside
//! an isolated sandbox, and reports per-case results. Submissions are
//! recorded and the problem detail view is cached per user.
//!
//! # Architecture
//!
//! - **Handlers**: HTTP request handlers (thin layer)
//! - **Services**: Request validation, grading orchestration, persistence
//! - **Judge**: Language drivers, sandboxes, concurrent case grading
//! - **Repositories**: Database access behind store traits
//! - **Cache**: Redis-backed problem detail cache with tag invalidation

pub mod cache;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod judge;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use constants::{API_BASE_PATH, MAX_REQUEST_BODY_BYTES};

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;

/// Build the application router. Grading endpoints are served under the API
/// prefix and also at the root for clients that post to `/run-code` directly.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest(API_BASE_PATH, handlers::routes(state.clone()))
        .merge(handlers::judge::routes(state.clone()))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
