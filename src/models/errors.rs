//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so that logs from the trainer and
//! the service can be grepped by category.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - MODEL_xxx: model artifact load/save/inference errors
//! - TRAIN_xxx: model selection errors
//! - DATASET_xxx: dataset ingestion and transformation errors
//! - API_xxx: API errors
//! - CFG_xxx: Configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message, prefixed with the operation that failed
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Prefix the message with the operation that was running (`stage: message`).
    pub fn context(mut self, operation: impl fmt::Display) -> Self {
        self.message = format!("{}: {}", operation, self.message);
        self
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Model Artifact Errors
    // ============================================
    /// Artifact file missing or unreadable
    ModelNotFound,
    /// Artifact present but cannot be decoded
    ModelCorrupt,
    /// Artifact was trained against a different feature layout
    ModelSchemaMismatch,
    /// Artifact could not be written
    ModelSaveFailed,
    /// Loaded model failed to produce a prediction
    ModelPredictFailed,

    // ============================================
    // Training Errors
    // ============================================
    /// A classifier variant failed to fit
    TrainFitFailed,
    /// A fitted classifier failed to predict on a split
    TrainPredictFailed,
    /// No variants or no report rows to select from
    TrainNoModels,

    // ============================================
    // Dataset Errors
    // ============================================
    /// Dataset file missing or unreadable
    DatasetIo,
    /// Header or required columns missing / unexpected layout
    DatasetInvalidSchema,
    /// A row could not be parsed
    DatasetInvalidRow,
    /// Dataset (or one of its splits) has no rows
    DatasetEmpty,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Rate limit exceeded
    ApiRateLimited,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModelNotFound => "MODEL_NOT_FOUND",
            Self::ModelCorrupt => "MODEL_CORRUPT",
            Self::ModelSchemaMismatch => "MODEL_SCHEMA_MISMATCH",
            Self::ModelSaveFailed => "MODEL_SAVE_FAILED",
            Self::ModelPredictFailed => "MODEL_PREDICT_FAILED",

            Self::TrainFitFailed => "TRAIN_FIT_FAILED",
            Self::TrainPredictFailed => "TRAIN_PREDICT_FAILED",
            Self::TrainNoModels => "TRAIN_NO_MODELS",

            Self::DatasetIo => "DATASET_IO",
            Self::DatasetInvalidSchema => "DATASET_INVALID_SCHEMA",
            Self::DatasetInvalidRow => "DATASET_INVALID_ROW",
            Self::DatasetEmpty => "DATASET_EMPTY",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiRateLimited => "API_RATE_LIMITED",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest => 400,
            Self::ApiRateLimited => 429,
            _ => 500,
        }
    }

    /// Errors that must stop the service from starting
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound | Self::ModelCorrupt | Self::ModelSchemaMismatch
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Dataset row could not be parsed
    pub fn invalid_row(line: usize, msg: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatasetInvalidRow, format!("line {}: {}", line, msg))
    }

    /// Dataset header/layout problem
    pub fn invalid_schema(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatasetInvalidSchema, msg)
    }

    /// Variant failed during fit
    pub fn fit_failed(model: &str, cause: impl fmt::Display) -> Self {
        Self::new(ErrorCode::TrainFitFailed, format!("{} fit: {}", model, cause))
    }

    /// Variant failed during predict; the model error is kept as the source
    pub fn predict_failed(model: &str, split: &str, cause: AppError) -> Self {
        let message = format!("{} predict ({} split): {}", model, split, cause.message);
        Self::with_source(ErrorCode::TrainPredictFailed, message, cause)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;
