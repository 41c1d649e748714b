//! Problem model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Problem database model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Problem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Name of the function the harness calls
    pub entry_point: String,
    pub time_limit_ms: i32,
    pub memory_limit_mb: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Problem {
    /// Per-test-case time limit, clamped to the judge maximum
    pub fn effective_time_limit_ms(&self, default_ms: u64, max_ms: u64) -> u64 {
        effective_limit(self.time_limit_ms, default_ms, max_ms)
    }

    /// Memory ceiling, clamped to the judge maximum
    pub fn effective_memory_limit_mb(&self, default_mb: u64, max_mb: u64) -> u64 {
        effective_limit(self.memory_limit_mb, default_mb, max_mb)
    }
}

/// Unset (non-positive) limits fall back to the default
fn effective_limit(value: i32, default: u64, max: u64) -> u64 {
    let value = if value > 0 { value as u64 } else { default };
    value.min(max)
}
