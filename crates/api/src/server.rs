//! API server — HTTP routes plus the Prometheus metrics exporter.

use crate::handlers::{self, AppState};
use adserve_core::config::AppConfig;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router. Separated from `start_http` so tests
/// can drive it without a socket.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        // Cron triggers (shared-secret guarded in the handlers)
        .route("/api/v1/cron/quality-recalc", post(handlers::cron_quality_recalc))
        .route("/api/v1/cron/budget-daily", post(handlers::cron_budget_daily))
        .route("/api/v1/cron/budget-exhaustion", post(handlers::cron_budget_exhaustion))
        .route("/api/v1/cron/billing-hourly", post(handlers::cron_billing_hourly))
        // Conversion reporting
        .route("/api/v1/conversions", post(handlers::record_conversion))
        // Operational endpoints
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness))
        .route("/live", get(handlers::liveness))
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server wrapping the router with the app configuration.
pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Start the HTTP server and serve until shutdown.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = app_router(self.state.clone());

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);
        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }

    /// Start the Prometheus metrics exporter on its own port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}
