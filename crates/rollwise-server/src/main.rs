//! Rollwise Server
//!
//! Serves the decision lifecycle HTTP API: AI-generated alternatives behind
//! a daily quota, randomized resolution, and outcome history.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use rollwise_server::api::{self, AppState};
use rollwise_server::auth::JwtManager;
use rollwise_server::decision::DecisionService;
use rollwise_server::generator::{
    CompletionProvider, DisabledProvider, GeneratorAdapter, HttpCompletionProvider, ProviderConfig,
};
use rollwise_server::quota::QuotaLedger;
use rollwise_server::storage::Database;

#[derive(Parser, Debug)]
#[command(name = "rollwise-server")]
#[command(version, about = "Rollwise server - decision dice backend")]
struct Args {
    /// TCP bind address (defaults to 127.0.0.1 with the configured port)
    #[arg(long, env = "ROLLWISE_ADDR")]
    addr: Option<SocketAddr>,

    /// Database file path
    #[arg(long, env = "ROLLWISE_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Daily AI-generation limit for non-premium users
    #[arg(long, env = "ROLLWISE_DAILY_LIMIT")]
    daily_limit: Option<u32>,

    /// Secret shared with the auth service for bearer-token validation
    #[arg(long, env = "ROLLWISE_JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Access-token lifetime in seconds (dev-issued tokens only)
    #[arg(long, default_value_t = 30 * 24 * 60 * 60, env = "ROLLWISE_TOKEN_TTL")]
    token_ttl_secs: i64,

    /// API key for the alternative-generation provider; without it the
    /// server runs degraded on the fixed fallback list
    #[arg(long, env = "ROLLWISE_GENERATOR_API_KEY", hide_env_values = true)]
    generator_api_key: Option<String>,

    /// Log level filter for the server (e.g. "info", "debug", "warn").
    #[arg(long, default_value = "info", env = "ROLLWISE_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "ROLLWISE_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_filter = format!("rollwise_server={}", args.log_level);
    rollwise_core::tracing_init::init_tracing(&log_filter, args.log_json);

    let cwd = std::env::current_dir().ok();
    let config = rollwise_core::config::load_config(cwd.as_deref())?;

    let addr = args
        .addr
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], config.server.port)));
    let daily_limit = args.daily_limit.unwrap_or(config.quota.daily_limit);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %addr,
        daily_limit,
        "Starting rollwise-server"
    );

    // Initialize database
    let db_path = match args.db_path.or(config.server.database_path) {
        Some(path) => path,
        None => rollwise_core::config::database_path()
            .ok_or_else(|| anyhow::anyhow!("Cannot determine database path"))?,
    };
    info!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).await?;

    // Completion provider: real client when a key is configured, otherwise
    // the disabled provider (every create serves the fallback list).
    let provider: Arc<dyn CompletionProvider> = match args.generator_api_key {
        Some(key) if !key.is_empty() => Arc::new(HttpCompletionProvider::new(&ProviderConfig {
            base_url: config.generator.base_url.clone(),
            api_key: key,
            model: config.generator.model.clone(),
            timeout: Duration::from_secs(config.generator.timeout_secs),
        })?),
        _ => {
            warn!("No generator API key configured; alternatives will use the fallback list");
            Arc::new(DisabledProvider)
        }
    };

    let ledger = QuotaLedger::new(db.clone(), daily_limit);
    let generator = GeneratorAdapter::new(provider);
    let service = DecisionService::new(db, ledger.clone(), generator);
    let jwt = Arc::new(JwtManager::new(args.jwt_secret.as_bytes(), args.token_ttl_secs));

    let app = api::router(AppState { service, ledger, jwt })
        .layer(axum::extract::DefaultBodyLimit::max(config.server.max_body_bytes));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "HTTP server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves when Ctrl+C or (on unix) SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C shutdown signal"),
        () = terminate => info!("Received SIGTERM shutdown signal"),
    }
}
