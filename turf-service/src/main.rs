use service_core::observability::init_tracing;
use turf_service::config::TurfConfig;
use turf_service::services::init_metrics;
use turf_service::Application;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize metrics recorder (must be before any metrics are recorded)
    init_metrics();

    let config = TurfConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start turf-service: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;
    application.run_until_stopped().await
}
