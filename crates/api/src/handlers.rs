//! Axum handlers. The cron endpoints are the scheduler's only way
//! into the passes; each one re-checks the shared secret and returns
//! the pass summary so operational tooling can alert on error counts
//! without reading logs.

use adserve_attribution::{AttributionOutcome, ConversionAttributor, ConversionRequest};
use adserve_auction::{QualityRecalcPass, QualityRecalcSummary};
use adserve_billing::{BillingSummary, ImpressionBiller};
use adserve_budget::{BudgetLifecycle, BudgetPassSummary};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Header carrying the scheduler's shared secret.
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub quality: Arc<QualityRecalcPass>,
    pub budget: Arc<BudgetLifecycle>,
    pub biller: Arc<ImpressionBiller>,
    pub attributor: Arc<ConversionAttributor>,
    pub cron_secret: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Check the cron shared secret. An absent or mismatched header means
/// the request does no work at all.
pub fn cron_authorized(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == secret)
}

fn unauthorized() -> (StatusCode, Json<ErrorResponse>) {
    metrics::counter!("api.cron.unauthorized").increment(1);
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "unauthorized".to_string(),
            message: "missing or invalid cron secret".to_string(),
        }),
    )
}

// ─── Cron triggers ─────────────────────────────────────────────────────────

/// POST /api/v1/cron/quality-recalc
pub async fn cron_quality_recalc(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<QualityRecalcSummary>, (StatusCode, Json<ErrorResponse>)> {
    if !cron_authorized(&headers, &state.cron_secret) {
        return Err(unauthorized());
    }
    let summary = state.quality.run(Utc::now());
    metrics::counter!("quality.recalc.runs").increment(1);
    if !summary.errors.is_empty() {
        warn!(errors = summary.errors.len(), "quality recalc ran degraded");
        metrics::counter!("quality.recalc.errors").increment(summary.errors.len() as u64);
    }
    Ok(Json(summary))
}

/// POST /api/v1/cron/budget-daily
pub async fn cron_budget_daily(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BudgetPassSummary>, (StatusCode, Json<ErrorResponse>)> {
    if !cron_authorized(&headers, &state.cron_secret) {
        return Err(unauthorized());
    }
    let summary = state.budget.run_daily_pass(Utc::now());
    metrics::counter!("budget.daily.runs").increment(1);
    Ok(Json(summary))
}

/// POST /api/v1/cron/budget-exhaustion
pub async fn cron_budget_exhaustion(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BudgetPassSummary>, (StatusCode, Json<ErrorResponse>)> {
    if !cron_authorized(&headers, &state.cron_secret) {
        return Err(unauthorized());
    }
    let summary = state.budget.run_exhaustion_pass();
    metrics::counter!("budget.exhaustion.runs").increment(1);
    Ok(Json(summary))
}

/// POST /api/v1/cron/billing-hourly
pub async fn cron_billing_hourly(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BillingSummary>, (StatusCode, Json<ErrorResponse>)> {
    if !cron_authorized(&headers, &state.cron_secret) {
        return Err(unauthorized());
    }
    let summary = state.biller.run_hourly_pass(Utc::now());
    metrics::counter!("billing.hourly.runs").increment(1);
    metrics::counter!("billing.billed_cents").increment(summary.total_billed_cents.max(0) as u64);
    Ok(Json(summary))
}

// ─── Conversions ───────────────────────────────────────────────────────────

/// POST /api/v1/conversions — report a conversion-worthy action from
/// the ordering platform. Always 200; a miss is a normal outcome.
pub async fn record_conversion(
    State(state): State<AppState>,
    Json(req): Json<ConversionRequest>,
) -> Json<AttributionOutcome> {
    let outcome = state.attributor.record_conversion(&req, Utc::now());
    if outcome.attributed {
        metrics::counter!("attribution.attributed").increment(1);
    } else {
        metrics::counter!("attribution.missed").increment(1);
    }
    Json(outcome)
}

// ─── Probes ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// GET /ready — readiness probe for Kubernetes.
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}

/// GET /live — liveness probe for Kubernetes.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
