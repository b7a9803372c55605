//! Prediction Pipeline
//!
//! Per-request flow: extract features, classify with the loaded model, run
//! the live probes, assemble a `Verdict`. The model is loaded once at start-up
//! and shared read-only between requests.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::features::{extract, FeatureVector};
use crate::models::config::ServiceConfig;
use crate::models::errors::AppResult;
use crate::models::types::{to_percent, SafetyLabel, Verdict};
use crate::providers::probes::{LiveProbes, ProbeClient};
use crate::utils::store::{load_model, ModelArtifact};

/// Classification of one feature vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub class: u32,
    pub probabilities: Option<[f64; 2]>,
}

#[derive(Clone)]
pub struct Predictor {
    artifact: Arc<ModelArtifact>,
    probes: Arc<dyn LiveProbes>,
}

impl Predictor {
    pub fn new(artifact: ModelArtifact, probes: Arc<dyn LiveProbes>) -> Self {
        Self {
            artifact: Arc::new(artifact),
            probes,
        }
    }

    /// Load the persisted model and build live probes. A missing or unreadable
    /// model is returned as an error so the service refuses to start.
    pub fn from_config(config: &ServiceConfig) -> AppResult<Self> {
        let artifact = load_model(&config.model_path)?;
        let probes = ProbeClient::new(&config.probes)?;
        Ok(Self::new(artifact, Arc::new(probes)))
    }

    pub fn model_name(&self) -> &str {
        &self.artifact.model_name
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Model output for a feature vector, no network access
    pub fn classify(&self, features: &FeatureVector) -> AppResult<Classification> {
        let row = features.to_row();
        let class = self.artifact.model.predict(&row)?;
        let probabilities = self.artifact.model.predict_proba(&row)?;
        Ok(Classification {
            class,
            probabilities,
        })
    }

    /// Full verdict for a URL. Probe failures never fail the request.
    pub async fn predict(&self, url: &str) -> AppResult<Verdict> {
        let started = Instant::now();
        let features = extract(url);
        debug!(url, features = %features, "Features extracted");

        let classification = self.classify(&features)?;
        let probes = self.probes.run(url).await;

        let label = SafetyLabel::from_class(classification.class);
        let verdict = Verdict {
            id: Uuid::new_v4(),
            url: url.to_string(),
            label,
            class: classification.class,
            probability_percent: classification.probabilities.map(|[_, p1]| to_percent(p1)),
            probabilities: classification.probabilities,
            model: self.artifact.model_name.clone(),
            probes,
            features,
            analyzed_at: Utc::now(),
        };

        info!(
            id = %verdict.id,
            label = label.as_str(),
            probes_detected = verdict.probes.detected_count(),
            latency_ms = started.elapsed().as_millis() as u64,
            "{}",
            verdict.summary()
        );
        Ok(verdict)
    }
}
