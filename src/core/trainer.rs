//! Model Selection Harness
//!
//! Fits every configured classifier variant on the training split, scores it
//! on both splits and keeps the variant with the highest test accuracy. Ties
//! go to the variant listed first.

use serde::Serialize;
use std::fmt::Write as _;
use tracing::{error, info};

use crate::core::classifier::{default_variants, ModelVariant, TrainedModel};
use crate::models::config::TrainingConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{ConfusionMatrix, LabeledSample, ModelReportRow};
use crate::utils::dataset::{initiate_data_ingestion, initiate_data_transformation, to_matrix};
use crate::utils::store::{save_json, save_model, ModelArtifact, Preprocessor};

/// Fraction of matching labels, in percent. An empty split scores 0.
pub fn accuracy(truth: &[u32], predicted: &[u32]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let hits = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    hits as f64 / truth.len() as f64 * 100.0
}

/// Index of the row with the highest test accuracy; first one wins ties
pub fn select_best(rows: &[ModelReportRow]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, row) in rows.iter().enumerate() {
        match best {
            Some(b) if rows[b].test_accuracy >= row.test_accuracy => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Report rows plus the fitted models, index-aligned
#[derive(Debug)]
pub struct Evaluation {
    pub rows: Vec<ModelReportRow>,
    models: Vec<TrainedModel>,
}

impl Evaluation {
    pub fn best_index(&self) -> Option<usize> {
        select_best(&self.rows)
    }

    pub fn models(&self) -> &[TrainedModel] {
        &self.models
    }

    /// Consume the evaluation, keeping only the winning row and model
    pub fn into_best(mut self) -> AppResult<(ModelReportRow, TrainedModel)> {
        let index = self
            .best_index()
            .ok_or_else(|| AppError::new(ErrorCode::TrainNoModels, "no report rows to select from"))?;
        Ok((self.rows.swap_remove(index), self.models.swap_remove(index)))
    }
}

/// Render report rows as a fixed-width table
pub fn render_report(rows: &[ModelReportRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<22} {:>14} {:>14}  {}",
        "Model", "Train Acc (%)", "Test Acc (%)", "Confusion Matrix"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<22} {:>14.2} {:>14.2}  {}",
            row.model, row.train_accuracy, row.test_accuracy, row.confusion_matrix
        );
    }
    out
}

/// Fit and score each variant. Any failure aborts the run with the variant's
/// name and the failing operation in the error message.
pub fn evaluate(
    x_train: &[Vec<f64>],
    y_train: &[u32],
    x_test: &[Vec<f64>],
    y_test: &[u32],
    variants: &[ModelVariant],
) -> AppResult<Evaluation> {
    if variants.is_empty() {
        return Err(AppError::new(ErrorCode::TrainNoModels, "no classifier variants configured"));
    }

    let mut rows = Vec::with_capacity(variants.len());
    let mut models = Vec::with_capacity(variants.len());

    for variant in variants {
        let name = variant.name();
        let model = variant.fit(x_train, y_train)?;

        let train_pred = model
            .predict_batch(x_train)
            .map_err(|e| AppError::predict_failed(name, "train", e))?;
        let test_pred = model
            .predict_batch(x_test)
            .map_err(|e| AppError::predict_failed(name, "test", e))?;

        let row = ModelReportRow {
            model: name.to_string(),
            train_accuracy: accuracy(y_train, &train_pred),
            test_accuracy: accuracy(y_test, &test_pred),
            confusion_matrix: ConfusionMatrix::from_labels(y_test, &test_pred),
        };
        info!(
            model = name,
            train_accuracy = row.train_accuracy,
            test_accuracy = row.test_accuracy,
            confusion = %row.confusion_matrix,
            "📊 Variant scored"
        );

        rows.push(row);
        models.push(model);
    }

    Ok(Evaluation { rows, models })
}

/// Persisted comparison report
#[derive(Debug, Serialize)]
pub struct TrainingReport {
    pub best_model: String,
    pub best_test_accuracy: f64,
    pub train_samples: usize,
    pub test_samples: usize,
    pub seed: u64,
    pub rows: Vec<ModelReportRow>,
}

/// Train on prepared splits, persist the winner and the report
pub fn initiate_model_trainer(
    config: &TrainingConfig,
    train: &[LabeledSample],
    test: &[LabeledSample],
) -> AppResult<TrainingReport> {
    let (x_train, y_train) = to_matrix(train);
    let (x_test, y_test) = to_matrix(test);

    let variants = default_variants(config.forest_trees, config.seed);
    let evaluation = evaluate(&x_train, &y_train, &x_test, &y_test, &variants)?;
    let rows = evaluation.rows.clone();
    info!("Model comparison:\n{}", render_report(&rows));

    let (best_row, best_model) = evaluation.into_best()?;
    info!(
        model = %best_row.model,
        test_accuracy = best_row.test_accuracy,
        "🏆 Best model selected"
    );

    let artifact = ModelArtifact::new(best_model, best_row.test_accuracy);
    save_model(&config.model_path(), &artifact)?;

    let report = TrainingReport {
        best_model: best_row.model,
        best_test_accuracy: best_row.test_accuracy,
        train_samples: train.len(),
        test_samples: test.len(),
        seed: config.seed,
        rows,
    };
    save_json(&config.report_path(), &report)?;
    Ok(report)
}

fn run_stages(config: &TrainingConfig) -> AppResult<TrainingReport> {
    let (train_path, test_path) = initiate_data_ingestion(config)?;
    let (train, test) = initiate_data_transformation(&train_path, &test_path)?;
    save_json(&config.preprocessor_path(), &Preprocessor::default())?;
    initiate_model_trainer(config, &train, &test)
}

/// Full offline run: ingestion, transformation, training
pub fn run_training_pipeline(config: &TrainingConfig) -> AppResult<TrainingReport> {
    info!(
        dataset = %config.dataset_path.display(),
        artifacts = %config.artifacts_dir.display(),
        "🚀 Training pipeline started"
    );
    let result = run_stages(config);

    if let Err(e) = &result {
        error!(code = e.code_str(), error = %e, "❌ Training pipeline failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(model: &str, test_accuracy: f64) -> ModelReportRow {
        ModelReportRow {
            model: model.to_string(),
            train_accuracy: 100.0,
            test_accuracy,
            confusion_matrix: ConfusionMatrix::default(),
        }
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]), 75.0);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_select_best_prefers_first_on_tie() {
        let rows = vec![row("a", 90.0), row("b", 95.0), row("c", 95.0), row("d", 10.0)];
        assert_eq!(select_best(&rows), Some(1));
        assert_eq!(select_best(&[row("only", 0.0)]), Some(0));
        assert_eq!(select_best(&[]), None);
    }

    #[test]
    fn test_evaluate_reports_every_variant() {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..30 {
            let jitter = (i % 6) as f64 * 0.2;
            x.push(vec![1.0 + jitter, 4.0 - jitter]);
            y.push(0);
            x.push(vec![8.0 + jitter, 1.0 + jitter]);
            y.push(1);
        }
        let (x_test, y_test) = (x[..10].to_vec(), y[..10].to_vec());

        let variants = default_variants(5, 42);
        let evaluation = evaluate(&x, &y, &x_test, &y_test, &variants).unwrap();
        assert_eq!(evaluation.rows.len(), variants.len());
        assert_eq!(evaluation.models().len(), variants.len());
        for (row, variant) in evaluation.rows.iter().zip(&variants) {
            assert_eq!(row.model, variant.name());
            assert!((0.0..=100.0).contains(&row.test_accuracy));
            let cm = row.confusion_matrix;
            let total = cm.true_negatives()
                + cm.false_positives()
                + cm.false_negatives()
                + cm.true_positives();
            assert_eq!(total, 10);
        }

        let (best, model) = evaluation.into_best().unwrap();
        assert_eq!(best.test_accuracy, 100.0);
        assert_eq!(best.model, "Decision Tree");
        assert_eq!(model.name(), "Decision Tree");
    }

    #[test]
    fn test_evaluate_without_variants() {
        let err = evaluate(&[vec![1.0]], &[0], &[vec![1.0]], &[0], &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::TrainNoModels);
    }

    #[test]
    fn test_fit_failure_names_variant() {
        // One class only: trees cannot split, logistic regression refuses
        let x = vec![vec![1.0, 2.0], vec![1.5, 2.5]];
        let err = evaluate(&x, &[0, 0], &x, &[0, 0], &[ModelVariant::LogisticRegression]).unwrap_err();
        assert_eq!(err.code, ErrorCode::TrainFitFailed);
        assert!(err.message.contains("Logistic Regression"));
    }

    #[test]
    fn test_render_report() {
        let table = render_report(&[row("Decision Tree", 91.256)]);
        assert!(table.contains("Decision Tree"));
        assert!(table.contains("91.26"));
        assert!(table.contains("[[0 0] [0 0]]"));
    }
}
