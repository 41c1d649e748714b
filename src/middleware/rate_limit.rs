//! Per-user rate limiting for grading endpoints
//!
//! Fixed-window counters in Redis: `INCR` and `EXPIRE ... NX` in one
//! `MULTI`/`EXEC` transaction, so a counter never outlives its window
//! (`EXPIRE NX` needs Redis 7). When Redis is unreachable the request is
//! allowed and a warning is logged.

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use redis::aio::ConnectionManager;

use crate::{constants::rate_limits, error::AppError, state::AppState};

use super::AuthenticatedUser;

/// Rate-limited action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateBucket {
    Run,
    Submit,
}

impl RateBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Submit => "submit",
        }
    }

    /// `(max requests, window seconds)`
    pub fn limits(&self) -> (i64, i64) {
        match self {
            Self::Run => (rate_limits::RUN_MAX_REQUESTS, rate_limits::RUN_WINDOW_SECS),
            Self::Submit => (
                rate_limits::SUBMIT_MAX_REQUESTS,
                rate_limits::SUBMIT_WINDOW_SECS,
            ),
        }
    }

    /// Bucket for a request path
    pub fn for_path(path: &str) -> Option<Self> {
        if path.ends_with("/run-code") {
            Some(Self::Run)
        } else if path.ends_with("/submit-code") {
            Some(Self::Submit)
        } else {
            None
        }
    }
}

/// Request counter store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count a hit and return the number of hits in the current window
    async fn hit(&self, key: &str, window_secs: i64) -> Result<i64, redis::RedisError>;
}

/// Redis-backed counter
pub struct RedisRateLimiter {
    redis: ConnectionManager,
}

impl RedisRateLimiter {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

/// Count a hit and start the window if it has no expiry yet
fn hit_pipeline(key: &str, window_secs: i64) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .incr(key, 1)
        .cmd("EXPIRE")
        .arg(key)
        .arg(window_secs)
        .arg("NX")
        .ignore();
    pipe
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn hit(&self, key: &str, window_secs: i64) -> Result<i64, redis::RedisError> {
        let mut redis = self.redis.clone();
        let (count,): (i64,) = hit_pipeline(key, window_secs).query_async(&mut redis).await?;
        Ok(count)
    }
}

pub fn rate_limit_key(bucket: RateBucket, user: &AuthenticatedUser) -> String {
    format!("rate_limit:{}:{}", bucket.as_str(), user.id)
}

/// Rate limit middleware; must run after `auth_middleware`
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let bucket = RateBucket::for_path(request.uri().path());
    let user = request.extensions().get::<AuthenticatedUser>().cloned();

    if let (Some(bucket), Some(user)) = (bucket, user) {
        let (limit, window) = bucket.limits();
        let key = rate_limit_key(bucket, &user);

        match state.rate_limiter().hit(&key, window).await {
            Ok(count) if count > limit => {
                tracing::info!(user_id = %user.id, bucket = bucket.as_str(), count, "Rate limit exceeded");
                return Err(AppError::TooManyRequests);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, bucket = bucket.as_str(), "Rate limiter unavailable, allowing request");
            }
        }
    }

    Ok(next.run(request).await)
}
