//! API Request/Response Types

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::core::features::FeatureVector;
use crate::models::errors::{AppError, ErrorCode};
use crate::utils::telemetry::StatsSnapshot;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Response status derived from the error code
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_str(),
            message: message.into(),
            details: None,
            status: status_for(code),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, message)
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        let mut error = Self::new(
            ErrorCode::ApiRateLimited,
            format!("Rate limit exceeded. Retry after {} seconds", retry_after),
        );
        error.details = Some(format!("retry_after: {}", retry_after));
        error
    }
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self::new(err.code, err.message.clone())
    }
}

/// HTTP status for an application error code
pub fn status_for(code: ErrorCode) -> StatusCode {
    StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

// ============================================
// Prediction
// ============================================

/// JSON body for `/v1/predict` and `/v1/features`
#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

/// Form body for `/predict`
#[derive(Debug, Deserialize)]
pub struct PredictForm {
    pub urlinput: String,
}

#[derive(Debug, Serialize)]
pub struct NamedFeature {
    pub name: &'static str,
    pub value: i64,
}

#[derive(Debug, Serialize)]
pub struct FeaturesData {
    pub url: String,
    pub features: Vec<NamedFeature>,
}

impl FeaturesData {
    pub fn new(url: String, features: &FeatureVector) -> Self {
        Self {
            url,
            features: features
                .named()
                .map(|(name, value)| NamedFeature { name, value })
                .collect(),
        }
    }
}

// ============================================
// Stats / Health
// ============================================

#[derive(Debug, Serialize)]
pub struct StatsData {
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    pub unsafe_rate_percent: f64,
    pub model: String,
    pub uptime_seconds: u64,
    pub api_version: String,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub model: String,
    pub uptime_seconds: u64,
}
