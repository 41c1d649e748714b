//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use crate::{
    cache::ProblemCache,
    config::Config,
    db::repositories::{ProblemStore, SubmissionStore},
    judge::JudgeEngine,
    middleware::rate_limit::RateLimiter,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    problems: Arc<dyn ProblemStore>,
    submissions: Arc<dyn SubmissionStore>,
    cache: Arc<dyn ProblemCache>,
    rate_limiter: Arc<dyn RateLimiter>,
    judge: JudgeEngine,
    config: Config,
}

impl AppState {
    /// Create a new application state
    pub fn new(
        problems: Arc<dyn ProblemStore>,
        submissions: Arc<dyn SubmissionStore>,
        cache: Arc<dyn ProblemCache>,
        rate_limiter: Arc<dyn RateLimiter>,
        judge: JudgeEngine,
        config: Config,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                problems,
                submissions,
                cache,
                rate_limiter,
                judge,
                config,
            }),
        }
    }

    pub fn problems(&self) -> &dyn ProblemStore {
        self.inner.problems.as_ref()
    }

    pub fn submissions(&self) -> &dyn SubmissionStore {
        self.inner.submissions.as_ref()
    }

    /// Get the problem view cache
    pub fn cache(&self) -> &dyn ProblemCache {
        self.inner.cache.as_ref()
    }

    pub fn rate_limiter(&self) -> &dyn RateLimiter {
        self.inner.rate_limiter.as_ref()
    }

    /// Get the judging engine
    pub fn judge(&self) -> &JudgeEngine {
        &self.inner.judge
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
