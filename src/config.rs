//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the application runs.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::constants::{
    sandbox_backends, DEFAULT_COMPILE_TIME_LIMIT_MS, DEFAULT_DATABASE_MAX_CONNECTIONS,
    DEFAULT_MAX_PARALLEL_CASES, DEFAULT_MEMORY_LIMIT_MB, DEFAULT_OUTPUT_LIMIT_BYTES,
    DEFAULT_PROBLEM_CACHE_TTL_SECS, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT, DEFAULT_SESSION_COOKIE, DEFAULT_TIME_LIMIT_MS, MAX_MEMORY_LIMIT_MB,
    MAX_TIME_LIMIT_MS,
};
use crate::models::Language;

/// Global application configuration (lazily initialized)
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::from_env().expect("Failed to load configuration from environment")
});

/// Variable lookup used while loading configuration
type Source<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub sandbox: SandboxConfig,
    pub judge: JudgeConfig,
    pub cache: CacheConfig,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub log_format: LogFormat,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Session token verification
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Cookie the session token is read from
    pub cookie_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxBackend {
    Docker,
    /// Runs user code as a host subprocess of the server's own user
    UnsafeLocal,
}

/// Sandbox backend selection
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub backend: SandboxBackend,
    pub docker_socket: String,
    /// Parent directory for per-run workspaces (system temp dir when unset)
    pub workspace_root: Option<PathBuf>,
}

/// Grading limits
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub default_time_limit_ms: u64,
    pub max_time_limit_ms: u64,
    pub default_memory_limit_mb: u64,
    pub max_memory_limit_mb: u64,
    pub compile_time_limit_ms: u64,
    pub request_timeout_ms: u64,
    pub max_parallel_cases: usize,
    pub output_limit_bytes: usize,
    pub enabled_languages: Vec<Language>,
}

/// Problem view cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub problem_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(&|key: &str| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_source(get: Source<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_source(get)?,
            database: DatabaseConfig::from_source(get)?,
            redis: RedisConfig::from_source(get)?,
            jwt: JwtConfig::from_source(get)?,
            sandbox: SandboxConfig::from_source(get)?,
            judge: JudgeConfig::from_source(get)?,
            cache: CacheConfig::from_source(get)?,
        })
    }
}

impl ServerConfig {
    fn from_source(get: Source<'_>) -> Result<Self, ConfigError> {
        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("pretty") | Some("text") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(_) => return Err(ConfigError::InvalidValue("LOG_FORMAT".to_string())),
        };

        Ok(Self {
            host: get("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            port: parse_or(get, "SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            log_format,
        })
    }
}

impl DatabaseConfig {
    fn from_source(get: Source<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            url: required(get, "DATABASE_URL")?,
            max_connections: parse_or(
                get,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            )?,
        })
    }
}

impl RedisConfig {
    fn from_source(get: Source<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            url: get("REDIS_URL").unwrap_or_else(|| "redis://localhost:6379".to_string()),
        })
    }
}

impl JwtConfig {
    fn from_source(get: Source<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            secret: required(get, "JWT_SECRET")?,
            cookie_name: get("SESSION_COOKIE").unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string()),
        })
    }
}

impl SandboxConfig {
    fn from_source(get: Source<'_>) -> Result<Self, ConfigError> {
        let backend = match get("SANDBOX_BACKEND").as_deref() {
            None | Some(sandbox_backends::DOCKER) => SandboxBackend::Docker,
            Some(sandbox_backends::UNSAFE_LOCAL) => SandboxBackend::UnsafeLocal,
            Some(_) => return Err(ConfigError::InvalidValue("SANDBOX_BACKEND".to_string())),
        };

        Ok(Self {
            backend,
            docker_socket: get("DOCKER_SOCKET")
                .unwrap_or_else(|| "/var/run/docker.sock".to_string()),
            workspace_root: get("SANDBOX_WORKSPACE_ROOT").map(PathBuf::from),
        })
    }
}

impl JudgeConfig {
    fn from_source(get: Source<'_>) -> Result<Self, ConfigError> {
        let enabled_languages = match get("ENABLED_LANGUAGES") {
            None => Language::ALL.to_vec(),
            Some(list) => list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| {
                    Language::parse(s)
                        .ok_or_else(|| ConfigError::InvalidValue("ENABLED_LANGUAGES".to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        let config = Self {
            default_time_limit_ms: parse_or(get, "DEFAULT_TIME_LIMIT_MS", DEFAULT_TIME_LIMIT_MS)?,
            max_time_limit_ms: parse_or(get, "MAX_TIME_LIMIT_MS", MAX_TIME_LIMIT_MS)?,
            default_memory_limit_mb: parse_or(
                get,
                "DEFAULT_MEMORY_LIMIT_MB",
                DEFAULT_MEMORY_LIMIT_MB,
            )?,
            max_memory_limit_mb: parse_or(get, "MAX_MEMORY_LIMIT_MB", MAX_MEMORY_LIMIT_MB)?,
            compile_time_limit_ms: parse_or(
                get,
                "COMPILE_TIME_LIMIT_MS",
                DEFAULT_COMPILE_TIME_LIMIT_MS,
            )?,
            request_timeout_ms: parse_or(get, "REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?,
            max_parallel_cases: parse_or(get, "MAX_PARALLEL_CASES", DEFAULT_MAX_PARALLEL_CASES)?,
            output_limit_bytes: parse_or(get, "OUTPUT_LIMIT_BYTES", DEFAULT_OUTPUT_LIMIT_BYTES)?,
            enabled_languages,
        };

        if config.max_parallel_cases == 0 {
            return Err(ConfigError::InvalidValue("MAX_PARALLEL_CASES".to_string()));
        }
        if config.enabled_languages.is_empty() {
            return Err(ConfigError::InvalidValue("ENABLED_LANGUAGES".to_string()));
        }

        Ok(config)
    }

    pub fn is_enabled(&self, language: Language) -> bool {
        self.enabled_languages.contains(&language)
    }
}

impl CacheConfig {
    fn from_source(get: Source<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            problem_ttl_secs: parse_or(
                get,
                "PROBLEM_CACHE_TTL_SECS",
                DEFAULT_PROBLEM_CACHE_TTL_SECS,
            )?,
        })
    }
}

fn required(get: Source<'_>, key: &str) -> Result<String, ConfigError> {
    get(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
}

fn parse_or<T: FromStr>(get: Source<'_>, key: &str, default: T) -> Result<T, ConfigError> {
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
