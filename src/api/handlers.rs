//! API Request Handlers

use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, Form, Json, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

use super::page;
use super::types::*;
use crate::core::features::extract;
use crate::core::predictor::Predictor;
use crate::models::errors::{AppError, ErrorCode};
use crate::models::types::Verdict;
use crate::utils::constants::APP_VERSION;
use crate::utils::telemetry::ServiceStats;

/// Shared application state
pub struct AppState {
    pub predictor: Predictor,
    pub stats: Arc<ServiceStats>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(predictor: Predictor, stats: Arc<ServiceStats>) -> Self {
        Self {
            predictor,
            stats,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Run the prediction pipeline and record the outcome
    async fn predict(&self, url: &str) -> Result<Verdict, AppError> {
        let start = Instant::now();
        let verdict = self.predictor.predict(url).await?;
        self.stats
            .record_verdict(&verdict, start.elapsed().as_millis() as u64);
        Ok(verdict)
    }
}

type JsonError = (StatusCode, Json<ApiResponse<()>>);

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn json_error(error: ApiError, start: Instant) -> JsonError {
    (error.status, Json(ApiResponse::error(error, elapsed_ms(start))))
}

fn reject(state: &AppState, start: Instant, message: impl Into<String>) -> JsonError {
    state.stats.record_rejected();
    json_error(ApiError::bad_request(message), start)
}

/// Pull a non-blank URL out of a JSON body
fn url_from_json(
    state: &AppState,
    start: Instant,
    body: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<String, JsonError> {
    let Json(req) = body.map_err(|e| reject(state, start, e.body_text()))?;
    if req.url.trim().is_empty() {
        return Err(reject(state, start, "URL must not be empty"));
    }
    Ok(req.url)
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        model: state.predictor.model_name().to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Browser form
// ============================================

pub async fn home() -> Html<String> {
    Html(page::render_home())
}

pub async fn predict_form(
    State(state): State<Arc<AppState>>,
    form: Result<Form<PredictForm>, FormRejection>,
) -> Response {
    let url = match form {
        Ok(Form(form)) if !form.urlinput.trim().is_empty() => form.urlinput,
        Ok(_) => {
            state.stats.record_rejected();
            let page = page::render_error("Please enter a URL.");
            return (status_for(ErrorCode::ApiBadRequest), Html(page)).into_response();
        }
        Err(e) => {
            state.stats.record_rejected();
            warn!(error = %e, "Malformed form submission");
            let page = page::render_error(&e.body_text());
            return (status_for(ErrorCode::ApiBadRequest), Html(page)).into_response();
        }
    };

    match state.predict(&url).await {
        Ok(verdict) => Html(page::render_verdict(&verdict)).into_response(),
        Err(e) => {
            error!(code = e.code_str(), error = %e, "Prediction failed");
            let page = page::render_error("The model could not classify this URL.");
            (status_for(e.code), Html(page)).into_response()
        }
    }
}

// ============================================
// JSON API
// ============================================

pub async fn predict_json(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Verdict>>, JsonError> {
    let start = Instant::now();
    let url = url_from_json(&state, start, body)?;

    let verdict = state.predict(&url).await.map_err(|e| {
        error!(code = e.code_str(), error = %e, "Prediction failed");
        json_error(ApiError::from(&e), start)
    })?;

    Ok(Json(ApiResponse::success(verdict, elapsed_ms(start))))
}

pub async fn extract_features(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<FeaturesData>>, JsonError> {
    let start = Instant::now();
    let url = url_from_json(&state, start, body)?;
    let features = extract(&url);
    Ok(Json(ApiResponse::success(
        FeaturesData::new(url, &features),
        elapsed_ms(start),
    )))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();
    let stats = state.stats.snapshot();

    let data = StatsData {
        unsafe_rate_percent: stats.unsafe_rate(),
        stats,
        model: state.predictor.model_name().to_string(),
        uptime_seconds: state.uptime_seconds(),
        api_version: APP_VERSION.to_string(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}
