//! Test server harness for E2E testing
//!
//! Provides `TestWatchServer` for spawning real Watch Service instances in
//! tests. The server uses the real checker and the SQLite match store backed
//! by the pool handed in by `#[sqlx::test]`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use watch_service::config::Config;
use watch_service::observability::init_metrics_recorder;
use watch_service::routes::{self, AppState};
use watch_service::services::{SqliteMatchStore, UrlChecker};
use watch_service::tasks::WatchScheduler;

/// One recorder per test process; later servers share its handle.
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning Watch Service in E2E tests.
///
/// Dropping the harness stops the HTTP server and every watch it scheduled.
pub struct TestWatchServer {
    addr: SocketAddr,
    pool: SqlitePool,
    config: Config,
    scheduler: WatchScheduler,
    _handle: JoinHandle<()>,
}

impl TestWatchServer {
    /// Spawn a server with the default check timeout.
    pub async fn spawn(pool: SqlitePool) -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(pool, HashMap::new()).await
    }

    /// Spawn a server whose checks time out after `seconds`.
    pub async fn spawn_with_timeout(pool: SqlitePool, seconds: u64) -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([("CHECK_TIMEOUT_SECONDS".to_string(), seconds.to_string())]);
        Self::spawn_with_vars(pool, vars).await
    }

    async fn spawn_with_vars(
        pool: SqlitePool,
        mut vars: HashMap<String, String>,
    ) -> Result<Self, anyhow::Error> {
        vars.insert("DATABASE_URL".to_string(), "sqlite::memory:".to_string());
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string());

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let store = Arc::new(SqliteMatchStore::new(pool.clone()));
        let checker = Arc::new(
            UrlChecker::new(store, config.check_timeout())
                .map_err(|e| anyhow::anyhow!("Failed to create checker: {}", e))?,
        );
        let scheduler = WatchScheduler::new(checker, CancellationToken::new());

        let state = Arc::new(AppState {
            pool: pool.clone(),
            scheduler: scheduler.clone(),
        });

        let app = routes::build_routes(state, test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            pool,
            config,
            scheduler,
            _handle: handle,
        })
    }

    /// Get reference to the database pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the scheduler that owns this server's watches.
    pub fn scheduler(&self) -> &WatchScheduler {
        &self.scheduler
    }
}

impl Drop for TestWatchServer {
    fn drop(&mut self) {
        self.scheduler.shutdown();
        self._handle.abort();
    }
}
