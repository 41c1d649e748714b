//! HTTP middleware

pub mod auth;
pub mod rate_limit;

pub use auth::{auth_middleware, AuthenticatedUser};
pub use rate_limit::rate_limit_middleware;
