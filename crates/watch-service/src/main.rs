//! Watch Service
//!
//! Entry point: accepts watch registrations over HTTP and polls each watched
//! URL until the process shuts down.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use watch_service::config::Config;
use watch_service::observability::init_metrics_recorder;
use watch_service::routes::{self, AppState};
use watch_service::services::{SqliteMatchStore, UrlChecker};
use watch_service::tasks::WatchScheduler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watch_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Watch Service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        check_timeout_seconds = config.check_timeout_seconds,
        "Configuration loaded successfully"
    );

    info!("Opening match store...");
    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(|e| {
            error!("Invalid database URL: {}", e);
            e
        })?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let db_pool = SqlitePoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| {
            error!("Failed to run migrations: {}", e);
            e
        })?;

    info!("Match store ready");

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let store = Arc::new(SqliteMatchStore::new(db_pool.clone()));
    let checker = Arc::new(UrlChecker::new(store, config.check_timeout())?);

    // Root token for every watch loop; cancelled once the server stops
    let cancel_token = CancellationToken::new();
    let scheduler = WatchScheduler::new(checker, cancel_token.clone());

    let bind_address = config.bind_address.clone();

    let state = Arc::new(AppState {
        pool: db_pool,
        scheduler: scheduler.clone(),
    });

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Watch Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(
        active_watches = scheduler.active_count(),
        "Stopping watch schedulers"
    );
    scheduler.shutdown();

    info!("Watch Service shutdown complete");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM, after the optional drain period.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&str>();

    let received = tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
    };
    info!(signal = received, "Starting graceful shutdown");

    let drain = drain_period();
    if drain.is_zero() {
        return;
    }

    warn!("Draining connections for {:?}", drain);
    tokio::time::sleep(drain).await;
    info!("Drain period complete");
}

/// `WATCH_DRAIN_SECONDS`, read when shutdown starts. Unset or unparsable
/// means no drain.
fn drain_period() -> Duration {
    std::env::var("WATCH_DRAIN_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::ZERO)
}
