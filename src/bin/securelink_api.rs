//! SecureLink API Server
//!
//! Serves the browser form and the JSON prediction API on top of the trained
//! model. Refuses to start when the model artifact is missing or unreadable.
//!
//! Usage:
//!   cargo run --bin securelink_api
//!
//! Environment:
//!   PORT / SECURELINK_PORT          - Server port (default: 8080)
//!   SECURELINK_HOST                 - Server host (default: 0.0.0.0)
//!   SECURELINK_MODEL_PATH           - Model artifact (default: artifacts/model.json)
//!   SECURELINK_PROBE_TIMEOUT_SECS   - Per-probe timeout (default: 5)
//!   RUST_LOG                        - Log level (default: info)

use eyre::WrapErr;
use securelink::api::{create_router, start_cleanup_task, AppState};
use securelink::core::predictor::Predictor;
use securelink::models::config::{LogConfig, ServiceConfig};
use securelink::utils::logging::init_logging;
use securelink::utils::telemetry::ServiceStats;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_logging(&LogConfig::for_service())?;

    let config = ServiceConfig::default();

    let predictor = match Predictor::from_config(&config) {
        Ok(predictor) => predictor,
        Err(e) => {
            error!(code = e.code_str(), error = %e, "❌ Cannot start without a model");
            return Err(e).wrap_err("loading model artifact");
        }
    };
    info!(model = predictor.model_name(), "📦 Model ready");

    let stats = Arc::new(ServiceStats::new());
    let state = Arc::new(AppState::new(predictor, stats.clone()));

    start_cleanup_task();

    let app = create_router(state);
    let addr: SocketAddr = config
        .bind_addr()
        .parse()
        .wrap_err_with(|| format!("invalid bind address {}", config.bind_addr()))?;

    info!("🚀 SecureLink API starting on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /              - URL check form");
    info!("  POST /predict       - Form submit (field: urlinput)");
    info!("  POST /v1/predict    - JSON verdict");
    info!("  POST /v1/features   - Extracted feature vector");
    info!("  GET  /v1/stats      - Service statistics");
    info!("  GET  /v1/health     - Health check");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🛑 Shutdown signal received, exporting statistics...");
    let snapshot = stats.snapshot();
    info!(
        total_predictions = snapshot.total_predictions,
        safe_predictions = snapshot.safe_predictions,
        unsafe_predictions = snapshot.unsafe_predictions,
        "Final counters"
    );
    match stats.export_stats_json() {
        Ok(path) => info!("   ✅ Stats exported to: {}", path.display()),
        Err(e) => warn!("   ⚠️ Failed to export stats: {}", e),
    }

    Ok(())
}
