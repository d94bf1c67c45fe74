//! GridLab server: consumes component status from the bus and keeps the
//! registry reconciled.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use gridlab_bus::{BusError, BusSession, InMemoryBus};
use gridlab_db::repository::SurrealComponentRepository;
use gridlab_db::{DbError, DbManager};
use gridlab_reconcile::{ActionPublisher, GoneSweeper, Reconciler, run_consumer, spawn_periodic};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, DEFAULT_LOG_FILTER, ServerConfig};

#[derive(Debug, Error)]
enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Bus(#[from] BusError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServerConfig::load(Some(&config_path()));

    let filter = config
        .as_ref()
        .map(|c| c.log_filter.clone())
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .json()
        .init();

    info!("Starting GridLab server...");

    let result = match config {
        Ok(config) => run(config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => {
            info!("GridLab server stopped.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "GridLab server failed");
            ExitCode::FAILURE
        }
    }
}

/// First argument, else `GRIDLAB_CONFIG`, else `gridlab.toml`.
fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("GRIDLAB_CONFIG").ok())
        .unwrap_or_else(|| "gridlab.toml".into())
        .into()
}

async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let db = DbManager::connect(&config.database).await?;
    db.migrate().await?;

    // Status only reaches this process through a bus session bound here;
    // a broker-backed `BusSession` is handed to `serve` the same way.
    let bus = Arc::new(InMemoryBus::new());
    bus.bind(&config.bus.queue, &config.bus.exchange);

    serve(config, db, bus).await
}

/// Reconcile status from `bus` until shutdown is requested or the
/// consumer stops.
async fn serve<B: BusSession + 'static>(
    config: ServerConfig,
    db: DbManager,
    bus: Arc<B>,
) -> Result<(), ServerError> {
    let subscription = bus.subscribe(&config.bus.queue).await?;

    let components = SurrealComponentRepository::new(db.client().clone());
    let publisher = ActionPublisher::new(Arc::clone(&bus), config.bus.exchange.clone());
    let reconciler = Reconciler::new(components.clone(), publisher.clone());
    let sweeper = GoneSweeper::new(components);

    let shutdown = CancellationToken::new();

    let mut consumer = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { run_consumer(&reconciler, subscription, shutdown).await })
    };

    let pinger = spawn_periodic(
        "broadcast-ping",
        config.reconcile.ping_interval(),
        shutdown.clone(),
        move || {
            let publisher = publisher.clone();
            async move {
                if let Err(e) = publisher.broadcast_ping().await {
                    warn!(error = %e, "Broadcast ping failed");
                }
            }
        },
    );

    let sweep = spawn_periodic(
        "gone-sweep",
        config.reconcile.sweep_interval(),
        shutdown.clone(),
        move || {
            let sweeper = sweeper.clone();
            async move {
                if let Err(e) = sweeper.sweep().await {
                    warn!(error = %e, "Gone sweep failed");
                }
            }
        },
    );

    let consumer_done = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown requested");
            false
        }
        exit = &mut consumer => {
            match exit {
                Ok(exit) => warn!(?exit, "Status consumer stopped"),
                Err(e) => error!(error = %e, "Status consumer panicked"),
            }
            true
        }
    };

    shutdown.cancel();
    if !consumer_done {
        if let Err(e) = consumer.await {
            error!(error = %e, "Status consumer panicked");
        }
    }
    for task in [pinger, sweep] {
        if let Err(e) = task.await {
            error!(error = %e, "Periodic task panicked");
        }
    }

    Ok(())
}
