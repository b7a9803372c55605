//! Artifact Store
//!
//! JSON persistence for everything the training pipeline hands to the service:
//! the winning model, the preprocessing schema and the comparison report.
//! The model artifact records the feature layout it was trained on; loading
//! refuses an artifact whose layout differs from the compiled-in schema.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::core::classifier::TrainedModel;
use crate::core::features::feature_names;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::{COLUMN_RESULT, EXCLUDED_COLUMNS};

/// Persisted winning model
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model_name: String,
    /// Feature layout the model was fit against
    pub feature_names: Vec<String>,
    pub test_accuracy: f64,
    pub created_at: DateTime<Utc>,
    pub model: TrainedModel,
}

impl ModelArtifact {
    pub fn new(model: TrainedModel, test_accuracy: f64) -> Self {
        Self {
            model_name: model.name().to_string(),
            feature_names: feature_names().into_iter().map(String::from).collect(),
            test_accuracy,
            created_at: Utc::now(),
            model,
        }
    }

    /// Whether the artifact was trained on the current feature layout
    pub fn matches_schema(&self) -> bool {
        let current = feature_names();
        self.feature_names.len() == current.len()
            && self.feature_names.iter().zip(current).all(|(a, b)| a == b)
    }
}

/// Persisted preprocessing description: which columns feed the model, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub feature_names: Vec<String>,
    pub excluded_columns: Vec<String>,
    pub target_column: String,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            feature_names: feature_names().into_iter().map(String::from).collect(),
            excluded_columns: EXCLUDED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            target_column: COLUMN_RESULT.to_string(),
        }
    }
}

/// Serialize any value to a JSON file, creating parent directories
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    let save_error = |e: std::io::Error| {
        AppError::with_source(ErrorCode::ModelSaveFailed, path.display().to_string(), e)
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(save_error)?;
    }
    let file = fs::File::create(path).map_err(save_error)?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer(&mut out, value).map_err(|e| {
        AppError::with_source(ErrorCode::ModelSaveFailed, path.display().to_string(), e)
    })?;
    out.flush().map_err(save_error)
}

/// Read a JSON file; missing file and decode failure get distinct codes
pub fn load_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let file = fs::File::open(path).map_err(|e| {
        AppError::with_source(ErrorCode::ModelNotFound, path.display().to_string(), e)
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        AppError::with_source(ErrorCode::ModelCorrupt, path.display().to_string(), e)
    })
}

/// Persist the winning model
pub fn save_model(path: &Path, artifact: &ModelArtifact) -> AppResult<()> {
    save_json(path, artifact)?;
    info!(path = %path.display(), model = %artifact.model_name, "💾 Model saved");
    Ok(())
}

/// Load and validate a model artifact
pub fn load_model(path: &Path) -> AppResult<ModelArtifact> {
    let artifact: ModelArtifact = load_json(path)?;
    if !artifact.matches_schema() {
        return Err(AppError::new(
            ErrorCode::ModelSchemaMismatch,
            format!(
                "{}: trained on {} features, extractor produces {}",
                path.display(),
                artifact.feature_names.len(),
                feature_names().len()
            ),
        ));
    }
    info!(
        path = %path.display(),
        model = %artifact.model_name,
        test_accuracy = artifact.test_accuracy,
        "📦 Model loaded"
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::{default_variants, ModelVariant};
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("securelink-store-{}", uuid::Uuid::new_v4()))
    }

    fn tiny_model() -> TrainedModel {
        let rows = vec![vec![0.0, 1.0], vec![0.2, 1.1], vec![5.0, 0.0], vec![5.3, 0.2]];
        ModelVariant::DecisionTree.fit(&rows, &[0, 0, 1, 1]).unwrap()
    }

    #[test]
    fn test_missing_model_is_not_found() {
        let err = load_model(&temp_dir().join("model.json")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ModelNotFound);
    }

    #[test]
    fn test_corrupt_model() {
        let dir = temp_dir();
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.json");
        fs::write(&path, b"{ not json").unwrap();
        let err = load_model(&path).unwrap_err();
        assert_eq!(err.code, ErrorCode::ModelCorrupt);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_schema_mismatch_is_rejected() {
        let dir = temp_dir();
        let path = dir.join("model.json");
        let mut artifact = ModelArtifact::new(tiny_model(), 100.0);
        artifact.feature_names.pop();
        save_model(&path, &artifact).unwrap();
        let err = load_model(&path).unwrap_err();
        assert_eq!(err.code, ErrorCode::ModelSchemaMismatch);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_round_trip_keeps_predictions() {
        let dir = temp_dir();
        let path = dir.join("nested").join("model.json");
        let artifact = ModelArtifact::new(tiny_model(), 100.0);
        let batch = vec![vec![0.1, 1.0], vec![5.1, 0.1], vec![2.6, 0.5]];
        let before = artifact.model.predict_batch(&batch).unwrap();

        save_model(&path, &artifact).unwrap();
        let loaded = load_model(&path).unwrap();
        assert_eq!(loaded.model_name, "Decision Tree");
        assert_eq!(loaded.model.predict_batch(&batch).unwrap(), before);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_every_variant_survives_reload() {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..15 {
            let jitter = (i % 5) as f64 * 0.2;
            rows.push(vec![1.0 + jitter, 2.0 - jitter]);
            labels.push(0);
            rows.push(vec![6.0 + jitter, 0.5 + jitter]);
            labels.push(1);
        }
        let batch = vec![vec![1.1, 1.9], vec![6.3, 0.7], vec![3.5, 1.2], vec![0.0, 0.0]];

        let dir = temp_dir();
        for variant in default_variants(7, 42) {
            let model = variant.fit(&rows, &labels).unwrap();
            let path = dir.join(format!("{}.json", variant.name()));
            let artifact = ModelArtifact::new(model, 100.0);
            let before = artifact.model.predict_batch(&batch).unwrap();
            let proba_before: Vec<_> = batch
                .iter()
                .map(|r| artifact.model.predict_proba(r).unwrap())
                .collect();

            save_model(&path, &artifact).unwrap();
            let loaded = load_model(&path).unwrap();
            assert_eq!(loaded.model_name, variant.name());
            assert_eq!(loaded.model.predict_batch(&batch).unwrap(), before, "{}", variant);
            for (row, expected) in batch.iter().zip(&proba_before) {
                let got = loaded.model.predict_proba(row).unwrap();
                match (got, expected) {
                    (Some(a), Some(b)) => {
                        assert!((a[1] - b[1]).abs() < 1e-9, "{}: {:?} vs {:?}", variant, a, b)
                    }
                    (None, None) => {}
                    other => panic!("{}: probability support changed: {:?}", variant, other),
                }
            }
        }
        fs::remove_dir_all(dir).ok();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_failure_is_reported() {
        let err = save_json(Path::new("/dev/full"), &Preprocessor::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ModelSaveFailed);
    }

    #[test]
    fn test_preprocessor_round_trip() {
        let dir = temp_dir();
        let path = dir.join("preprocessor.json");
        save_json(&path, &Preprocessor::default()).unwrap();
        let loaded: Preprocessor = load_json(&path).unwrap();
        assert_eq!(loaded, Preprocessor::default());
        assert_eq!(loaded.target_column, "result");
        fs::remove_dir_all(dir).ok();
    }
}
