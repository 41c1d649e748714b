//! CodeJudge - Application Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use bollard::Docker;
use redis::Client as RedisClient;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codejudge::{
    cache::RedisProblemCache,
    config::{LogFormat, SandboxBackend, CONFIG},
    create_router,
    db::{self, repositories::{ProblemRepository, SubmissionRepository}},
    judge::{
        sandbox::{docker::DockerSandbox, process::ProcessSandbox},
        JudgeEngine, JudgeSettings, Sandbox,
    },
    middleware::rate_limit::RedisRateLimiter,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| CONFIG.server.rust_log.clone().into());
    let registry = tracing_subscriber::registry().with(filter);
    match CONFIG.server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting CodeJudge server...");

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&CONFIG.database).await?;

    tracing::info!("Running database migrations...");
    db::run_migrations(&db_pool).await?;

    tracing::info!("Connecting to Redis...");
    let redis_client = RedisClient::open(CONFIG.redis.url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;

    let sandbox: Arc<dyn Sandbox> = match CONFIG.sandbox.backend {
        SandboxBackend::UnsafeLocal => {
            tracing::warn!(
                "SANDBOX_BACKEND=unsafe-local: user code runs as this server's user with host \
                 filesystem and /proc access; never expose this instance to untrusted users"
            );
            Arc::new(ProcessSandbox::new(CONFIG.sandbox.workspace_root.clone()))
        }
        SandboxBackend::Docker => {
            tracing::info!("Connecting to Docker...");
            let docker = Docker::connect_with_socket(
                &CONFIG.sandbox.docker_socket,
                120,
                bollard::API_DEFAULT_VERSION,
            )?;

            let docker_info = docker.version().await?;
            tracing::info!(
                "Connected to Docker version: {}",
                docker_info.version.unwrap_or_default()
            );

            Arc::new(DockerSandbox::new(docker))
        }
    };
    tracing::info!(backend = sandbox.name(), "Sandbox ready");

    let judge = JudgeEngine::new(sandbox, JudgeSettings::from(&CONFIG.judge));

    let state = AppState::new(
        Arc::new(ProblemRepository::new(db_pool.clone())),
        Arc::new(SubmissionRepository::new(db_pool)),
        Arc::new(RedisProblemCache::new(redis_conn.clone())),
        Arc::new(RedisRateLimiter::new(redis_conn)),
        judge,
        CONFIG.clone(),
    );

    let app = create_router(state);

    let addr = SocketAddr::new(CONFIG.server.host.parse()?, CONFIG.server.port);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutting down");
}
