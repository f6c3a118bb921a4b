use hr_churn::{
    api::{build_router, AppState},
    config::Config,
    ml::{InferenceService, ModelArtifact},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("hr_churn={},tower_http=info", config.observability.log_level).into()
    });
    let fmt_layer = if config.observability.json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Starting HR churn service v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    // The service must not start without a model
    let artifact = match ModelArtifact::load(&config.model.artifact_path) {
        Ok(artifact) => artifact,
        Err(e) => {
            tracing::error!("{}", e);
            tracing::error!("Train a model first: hr-churn-cli train");
            return Err(e.into());
        }
    };
    let metrics = &artifact.metadata().validation_metrics;
    tracing::info!(
        model_id = %artifact.metadata().model_id,
        trained_at = %artifact.metadata().trained_at,
        accuracy = metrics.accuracy,
        "✅ Model ready"
    );

    let inference = InferenceService::new(Arc::new(artifact), config.model.decision_threshold)?;
    tracing::info!(
        "Dataset: {} (read on every analytics request)",
        config.data.dataset_path.display()
    );

    let http_addr = format!("{}:{}", config.server.host, config.server.port);
    let app_state = AppState::new(&config, inference);
    let app = build_router(app_state);

    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("🚀 HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Metrics: http://{}/dataset/metrics", http_addr);
    tracing::info!("   Predict: POST http://{}/predict", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(http_listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down gracefully...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
