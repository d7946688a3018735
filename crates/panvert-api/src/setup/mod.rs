//! Application setup and initialization

pub mod routes;
pub mod server;

use anyhow::{Context, Result};
use axum::Router;
use panvert_core::Config;
use panvert_infra::{
    init_telemetry, CleanupScheduler, InMemoryRateLimitStore, RateLimitStore, SweepConfig,
};
use panvert_processing::{DocumentConverter, PandocConverter};
use panvert_storage::{FileJobStatusStore, StagingArea};
use std::sync::Arc;
use std::time::Duration;

use crate::state::AppState;

/// How often expired rate-limit counters are dropped.
const RATE_LIMIT_PURGE_INTERVAL: Duration = Duration::from_secs(300);

/// Everything `main` needs to serve requests and shut down cleanly.
pub struct App {
    pub state: Arc<AppState>,
    pub router: Router,
    pub cleanup: Arc<CleanupScheduler>,
}

/// Initialize the application: telemetry, storage, converter, sweeper, routes.
pub async fn initialize_app(config: Config) -> Result<App> {
    init_telemetry(config.environment(), std::env::var("LOG_LEVEL").ok().as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        upload_dir = %config.upload_dir().display(),
        status_dir = %config.status_dir().display(),
        "Starting Panvert"
    );

    let staging = StagingArea::new(config.upload_dir())
        .await
        .context("Failed to create upload directory")?;

    let converter = Arc::new(PandocConverter::new(
        config.pandoc_path(),
        config.pdf_engine(),
        config.conversion_timeout(),
        staging.dir(),
    ));
    match converter.version().await {
        Some(version) => tracing::info!(version = %version, "Converter available"),
        None => tracing::warn!(
            pandoc_path = %config.pandoc_path(),
            "Converter could not be run; conversions will fail until it is installed"
        ),
    }

    let state = build_state(config.clone(), converter, staging).await?;
    spawn_rate_limit_purge(state.rate_limiter.clone());

    let cleanup = Arc::new(CleanupScheduler::new(SweepConfig {
        dirs: vec![
            config.upload_dir().to_path_buf(),
            config.status_dir().to_path_buf(),
        ],
        max_age: config.cleanup_max_age(),
        interval: config.cleanup_interval(),
    }));
    cleanup.start();

    let router = routes::setup_routes(&config, state.clone());

    Ok(App {
        state,
        router,
        cleanup,
    })
}

/// Assemble the shared state around a converter.
pub async fn build_state(
    config: Config,
    converter: Arc<dyn DocumentConverter>,
    staging: StagingArea,
) -> Result<Arc<AppState>> {
    let jobs = FileJobStatusStore::new(config.status_dir())
        .await
        .context("Failed to create job status directory")?;

    let rate_limiter = InMemoryRateLimitStore::new(
        config.rate_limit_per_minute(),
        config.rate_limit_window(),
    );
    tracing::info!(
        limit = config.rate_limit_per_minute(),
        window_secs = config.rate_limit_window().as_secs(),
        "HTTP rate limiting enabled"
    );

    Ok(Arc::new(AppState {
        config,
        converter,
        jobs: Arc::new(jobs),
        staging,
        rate_limiter: Arc::new(rate_limiter),
    }))
}

fn spawn_rate_limit_purge(store: Arc<dyn RateLimitStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            store.purge_expired().await;
        }
    });
}
