//! Billing service runtime.
//!
//! [`ServerHandle`] owns the process lifecycle: metrics recorder, storage
//! (SeaORM or in-memory), services, the REST API and graceful shutdown.

use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::{create_event_bus, BillingService, SharedEventBus, TariffService};
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::{init_database, InMemoryStorage, SeaOrmRepositoryProvider};
use crate::interfaces::http::{create_api_router, ApiState};
use crate::support::{AppError, InfraError, ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup
    pub auto_migrate: bool,
    /// Keep everything in process memory instead of the configured database
    pub in_memory: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            in_memory: false,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running billing service.
///
/// ```rust,no_run
/// use utility_billing::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub event_bus: SharedEventBus,
    pub repos: Arc<dyn RepositoryProvider>,
    pub tariffs: Arc<TariffService>,
    pub billing: Arc<BillingService>,
    pub config: AppConfig,
    /// Port the API is listening on
    pub api_port: u16,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

/// The global recorder can only be installed once per process; later
/// starts in the same process reuse it.
fn prometheus_handle() -> Result<PrometheusHandle, InfraError> {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| InfraError::Metrics(e.to_string()))?;
    info!("Prometheus metrics recorder installed");
    Ok(PROM_HANDLE.get_or_init(|| handle).clone())
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, AppError> {
        let config = opts.config;
        config.validate()?;
        info!("Starting utility billing service...");

        let prometheus = prometheus_handle()?;

        // ── Storage ────────────────────────────────────────────
        let (repos, db): (Arc<dyn RepositoryProvider>, Option<DatabaseConnection>) =
            if opts.in_memory {
                warn!("Using in-memory storage; data is lost on shutdown");
                (Arc::new(InMemoryStorage::new()), None)
            } else {
                let db_config = config.database.to_database_config(opts.auto_migrate);
                let db = init_database(&db_config).await?;
                (
                    Arc::new(SeaOrmRepositoryProvider::new(db.clone())),
                    Some(db),
                )
            };

        // ── Services ───────────────────────────────────────────
        let event_bus = create_event_bus();
        let tariffs = Arc::new(TariffService::new(repos.clone(), event_bus.clone()));
        let billing = Arc::new(BillingService::new(
            repos.clone(),
            tariffs.clone(),
            event_bus.clone(),
            config.billing.settings(),
        ));
        info!(
            prefix = %config.billing.bill_number_prefix,
            due_days = config.billing.due_days,
            late_fee = %config.billing.late_fee,
            "Billing configured"
        );

        // ── REST API ───────────────────────────────────────────
        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let api_shutdown = shutdown.signal();

        let state = ApiState::new(
            tariffs.clone(),
            billing.clone(),
            db.clone(),
            config.billing.currency.clone(),
        );
        let router = create_api_router(state, prometheus);

        let listener = tokio::net::TcpListener::bind(config.api_address()).await?;
        let bound = listener.local_addr()?;
        info!("REST API listening on http://{}", bound);
        info!("Swagger UI available at http://{}/docs/", bound);

        let api_server = axum::serve(listener, router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API received shutdown signal");
        });
        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            event_bus,
            repos,
            tariffs,
            billing,
            config,
            api_port: bound.port(),
            db,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Trigger shutdown on SIGINT / SIGTERM.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for shutdown to be triggered, let the API drain, then close the
    /// database. Bounded by `server.shutdown_timeout`.
    pub async fn wait(self) {
        let Self {
            shutdown,
            api_task,
            db,
            ..
        } = self;

        let completed = shutdown
            .shutdown_with_cleanup(|| async move {
                info!("Waiting for in-flight requests...");
                match api_task.await {
                    Ok(()) => info!("REST API server stopped"),
                    Err(e) => error!("REST API task panicked: {}", e),
                }
                if let Some(db) = db {
                    match db.close().await {
                        Ok(()) => info!("Database connection closed"),
                        Err(e) => warn!("Error closing database connection: {}", e),
                    }
                }
            })
            .await;

        if !completed {
            warn!("Shutdown cleanup did not finish in time");
        }
        info!("Utility billing service shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("Shutting down utility billing service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing from the application config. `RUST_LOG` wins over
/// `logging.level`. Call once, before [`ServerHandle::start`].
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
