//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// SESSION DEFAULTS
// =============================================================================

/// Cookie carrying the session token issued by the auth service
pub const DEFAULT_SESSION_COOKIE: &str = "token";

// =============================================================================
// JUDGE DEFAULTS
// =============================================================================

/// Default per-test-case time limit in milliseconds
pub const DEFAULT_TIME_LIMIT_MS: u64 = 2_000;

/// Default memory ceiling in megabytes
pub const DEFAULT_MEMORY_LIMIT_MB: u64 = 256;

/// Time budget for the compile step of compiled languages
pub const DEFAULT_COMPILE_TIME_LIMIT_MS: u64 = 15_000;

/// Upper bound for a whole run/submit request
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

/// Test cases of one request executed at the same time
pub const DEFAULT_MAX_PARALLEL_CASES: usize = 4;

/// Captured stdout/stderr per execution (64 KB)
pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 64 * 1024;

/// Maximum time limit a problem may request
pub const MAX_TIME_LIMIT_MS: u64 = 10_000;

/// Maximum memory limit a problem may request
pub const MAX_MEMORY_LIMIT_MB: u64 = 1024;

/// Entry point the harness calls when a problem does not name one
pub const DEFAULT_ENTRY_POINT: &str = "solution";

/// Longest diagnostic excerpt surfaced to the user
pub const MAX_DIAGNOSTIC_CHARS: usize = 2_000;

// =============================================================================
// SANDBOX BACKENDS
// =============================================================================

/// Sandbox backend identifiers
pub mod sandbox_backends {
    pub const DOCKER: &str = "docker";
    /// Host subprocesses without a jail; development and CI only
    pub const UNSAFE_LOCAL: &str = "unsafe-local";
}

/// Container images for each language
pub mod container_images {
    pub const JAVASCRIPT: &str = "node:20-alpine";
    pub const PYTHON: &str = "python:3.12-alpine";
    pub const JAVA: &str = "eclipse-temurin:21-jdk";
    pub const CSHARP: &str = "mono:6.12";
    pub const PHP: &str = "php:8.3-cli-alpine";
}

/// Label attached to every sandbox container
pub const CONTAINER_LABEL: &str = "codejudge.execution";

// =============================================================================
// SUBMISSION STATUSES
// =============================================================================

/// Persisted submission statuses
pub mod statuses {
    pub const ACCEPTED: &str = "Accepted";
    pub const WRONG_ANSWER: &str = "WrongAnswer";
}

/// Diagnostic codes reported as `exitError`
pub mod exit_errors {
    pub const TIMEOUT: &str = "timeout";
    pub const MEMORY_LIMIT_EXCEEDED: &str = "memory_limit_exceeded";
}

// =============================================================================
// API VERSIONING
// =============================================================================

/// API base path
pub const API_BASE_PATH: &str = "/api/v1";

/// Request body ceiling (source code plus JSON escaping overhead)
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// RATE LIMITING
// =============================================================================

/// Rate limiting configuration
pub mod rate_limits {
    /// Run endpoint - max requests
    pub const RUN_MAX_REQUESTS: i64 = 30;
    /// Run endpoint - window in seconds
    pub const RUN_WINDOW_SECS: i64 = 60;

    /// Submit endpoint - max requests
    pub const SUBMIT_MAX_REQUESTS: i64 = 10;
    /// Submit endpoint - window in seconds
    pub const SUBMIT_WINDOW_SECS: i64 = 60;
}

// =============================================================================
// CACHE
// =============================================================================

/// Lifetime of a cached problem detail view
pub const DEFAULT_PROBLEM_CACHE_TTL_SECS: u64 = 300;

/// Submissions embedded in the problem detail view
pub const PROBLEM_DETAIL_HISTORY_SIZE: i64 = 20;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for paginated results
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum page size for paginated results
pub const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// VALIDATION
// =============================================================================

/// Maximum source code size in bytes (1 MB)
pub const MAX_SOURCE_CODE_SIZE: usize = 1024 * 1024;
