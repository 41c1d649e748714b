//! Code run and submit handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;

use axum::{middleware, routing::post, Router};

use crate::{
    middleware::{auth::auth_middleware, rate_limit::rate_limit_middleware},
    state::AppState,
};

/// Grading routes (authenticated, rate limited per user)
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/run-code", post(handler::run_code))
        .route("/submit-code", post(handler::submit_code))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
