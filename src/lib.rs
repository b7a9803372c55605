//! SecureLink Library
//!
//! URL safety classifier:
//! - Lexical feature extraction over a fixed 33-slot layout
//! - Offline model selection across several classifier families
//! - Prediction service combining the trained model with live security probes
//!   (TLS certificate, server banner, HSTS, X-XSS-Protection)

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{extract, FeatureVector, ModelVariant, Predictor, TrainedModel};
pub use models::{AppError, AppResult, ErrorCode, ServiceConfig, TrainingConfig, Verdict};
pub use providers::{LiveProbes, OfflineProbes, ProbeClient};
pub use utils::{ModelArtifact, ServiceStats};
