//! Problem view handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{middleware, routing::get, Router};

use crate::{middleware::auth::auth_middleware, state::AppState};

/// Problem routes
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/{id}", get(handler::get_problem))
        .route("/{id}/submissions", get(handler::list_submissions))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
