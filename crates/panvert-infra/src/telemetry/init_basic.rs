use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const DEFAULT_DIRECTIVES: &str = "panvert=info,tower_http=info";

/// Filter directives for the service.
///
/// `LOG_LEVEL` (a bare level such as `debug`) scopes the level to the
/// service's own crates and the HTTP layer. Otherwise `RUST_LOG` is used
/// verbatim, falling back to info level.
pub fn default_filter(log_level: Option<&str>) -> EnvFilter {
    if let Some(level) = log_level.map(str::trim).filter(|l| !l.is_empty()) {
        let directives = format!("panvert={level},tower_http={level}");
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }

    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_DIRECTIVES.into())
}

/// Initialize tracing.
///
/// Production emits one JSON object per event so logs can be ingested
/// as-is; other environments get the compact console format.
pub fn init_telemetry(
    environment: &str,
    log_level: Option<&str>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env = environment.to_lowercase();
    let is_production = env == "production" || env == "prod";

    let json_layer = is_production.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
    });

    let console_layer = (!is_production).then(|| {
        tracing_subscriber::fmt::layer()
            .event_format(Format::default().compact().with_target(false))
    });

    tracing_subscriber::registry()
        .with(default_filter(log_level))
        .with(json_layer)
        .with(console_layer)
        .try_init()?;

    tracing::info!(environment, json = is_production, "Tracing initialized");
    Ok(())
}

pub async fn shutdown_telemetry() {
    tracing::debug!("Telemetry shutdown");
}
