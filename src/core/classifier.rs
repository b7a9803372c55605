//! Classifier Variants
//!
//! The fixed set of model families the selection harness compares, plus the
//! fitted, serializable model the service loads. Trees, logistic regression
//! and KNN come from `smartcore`; the bagged ensemble is assembled here from
//! smartcore decision trees so it can report vote fractions as class
//! probabilities. Gaussian naive Bayes is implemented here with variance
//! smoothing, since count features are often constant within one class.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};
use smartcore::metrics::distance::euclidian::Euclidian;
use smartcore::neighbors::knn_classifier::{KNNClassifier, KNNClassifierParameters};
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters,
};
use std::fmt;
use tracing::debug;

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::{DEFAULT_KNN_K, LABEL_MALICIOUS, LABEL_SAFE};

type Matrix = DenseMatrix<f64>;
type Labels = Vec<u32>;

pub type TreeModel = DecisionTreeClassifier<f64, u32, Matrix, Labels>;
pub type LogisticModel = LogisticRegression<f64, u32, Matrix, Labels>;
pub type KnnModel = KNNClassifier<f64, u32, Matrix, Labels, Euclidian<f64>>;

/// An untrained classifier configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModelVariant {
    DecisionTree,
    LogisticRegression,
    /// Bootstrap-aggregated decision trees
    BaggedTrees { trees: usize, seed: u64 },
    Knn { k: usize },
    NaiveBayes,
}

impl ModelVariant {
    /// Report name
    pub fn name(&self) -> &'static str {
        match self {
            Self::DecisionTree => "Decision Tree",
            Self::LogisticRegression => "Logistic Regression",
            Self::BaggedTrees { .. } => "Bagged Trees",
            Self::Knn { .. } => "KNN",
            Self::NaiveBayes => "Naive Bayes",
        }
    }

    /// Fit this variant on a feature matrix and label vector
    pub fn fit(&self, rows: &[Vec<f64>], labels: &[u32]) -> AppResult<TrainedModel> {
        if rows.is_empty() {
            return Err(AppError::fit_failed(self.name(), "no training samples"));
        }
        if rows.len() != labels.len() {
            return Err(AppError::fit_failed(
                self.name(),
                format!("{} rows but {} labels", rows.len(), labels.len()),
            ));
        }

        let x = DenseMatrix::from_2d_vec(&rows.to_vec());
        let y: Labels = labels.to_vec();
        let fail = |e: smartcore::error::Failed| AppError::fit_failed(self.name(), e);

        let model = match *self {
            Self::DecisionTree => TrainedModel::DecisionTree(
                TreeModel::fit(&x, &y, DecisionTreeClassifierParameters::default()).map_err(fail)?,
            ),
            Self::LogisticRegression => TrainedModel::LogisticRegression(
                LogisticModel::fit(&x, &y, LogisticRegressionParameters::default()).map_err(fail)?,
            ),
            Self::BaggedTrees { trees, seed } => {
                TrainedModel::BaggedTrees(BaggedTrees::fit(rows, labels, trees, seed).map_err(fail)?)
            }
            Self::Knn { k } if rows.len() < k => {
                return Err(AppError::fit_failed(
                    self.name(),
                    format!("k = {} needs at least {} training rows, found {}", k, k, rows.len()),
                ));
            }
            Self::Knn { k } => TrainedModel::Knn(
                KnnModel::fit(&x, &y, KNNClassifierParameters::default().with_k(k)).map_err(fail)?,
            ),
            Self::NaiveBayes => TrainedModel::NaiveBayes(
                GaussianBayes::fit(rows, labels).map_err(|e| AppError::fit_failed(self.name(), e))?,
            ),
        };

        debug!(model = self.name(), samples = rows.len(), "Variant fitted");
        Ok(model)
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The variants compared by a training run, in report order
pub fn default_variants(trees: usize, seed: u64) -> Vec<ModelVariant> {
    vec![
        ModelVariant::DecisionTree,
        ModelVariant::LogisticRegression,
        ModelVariant::BaggedTrees { trees, seed },
        ModelVariant::Knn { k: DEFAULT_KNN_K },
        ModelVariant::NaiveBayes,
    ]
}

// ============================================
// BAGGED TREES
// ============================================

/// Decision trees fit on seeded bootstrap samples; votes give probabilities.
#[derive(Serialize, Deserialize)]
pub struct BaggedTrees {
    trees: Vec<TreeModel>,
}

impl BaggedTrees {
    fn fit(
        rows: &[Vec<f64>],
        labels: &[u32],
        n_trees: usize,
        seed: u64,
    ) -> Result<Self, smartcore::error::Failed> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(n_trees.max(1));

        for _ in 0..n_trees.max(1) {
            let (sample_rows, sample_labels) = bootstrap(rows, labels, &mut rng);
            let x = DenseMatrix::from_2d_vec(&sample_rows);
            trees.push(TreeModel::fit(
                &x,
                &sample_labels,
                DecisionTreeClassifierParameters::default(),
            )?);
        }

        Ok(Self { trees })
    }

    /// Fraction of trees voting malicious, per row
    fn vote_fractions(&self, x: &Matrix, n_rows: usize) -> Result<Vec<f64>, smartcore::error::Failed> {
        let mut votes = vec![0usize; n_rows];
        for tree in &self.trees {
            for (vote, label) in votes.iter_mut().zip(tree.predict(x)?) {
                if label == LABEL_MALICIOUS {
                    *vote += 1;
                }
            }
        }
        let total = self.trees.len() as f64;
        Ok(votes.into_iter().map(|v| v as f64 / total).collect())
    }
}

/// Draw `n` rows with replacement. Trees need both classes, so a
/// single-class draw is retried a few times before using the full set.
fn bootstrap(rows: &[Vec<f64>], labels: &[u32], rng: &mut StdRng) -> (Vec<Vec<f64>>, Vec<u32>) {
    const MAX_DRAWS: usize = 8;
    let n = rows.len();
    let has_both_classes = |ls: &[u32]| ls.iter().any(|&l| l != ls[0]);

    for _ in 0..MAX_DRAWS {
        let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        let sample_labels: Vec<u32> = indices.iter().map(|&i| labels[i]).collect();
        if has_both_classes(&sample_labels) || !has_both_classes(labels) {
            let sample_rows = indices.iter().map(|&i| rows[i].clone()).collect();
            return (sample_rows, sample_labels);
        }
    }
    (rows.to_vec(), labels.to_vec())
}

// ============================================
// GAUSSIAN NAIVE BAYES
// ============================================

/// Gaussian naive Bayes. Every per-class variance is widened by a small
/// fraction of the largest feature variance, so constant features are safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianBayes {
    classes: Vec<u32>,
    log_priors: Vec<f64>,
    means: Vec<Vec<f64>>,
    variances: Vec<Vec<f64>>,
}

impl GaussianBayes {
    const VAR_SMOOTHING: f64 = 1e-9;

    fn fit(rows: &[Vec<f64>], labels: &[u32]) -> Result<Self, String> {
        let width = rows.first().map(Vec::len).ok_or("no training samples")?;
        if rows.iter().any(|r| r.len() != width) {
            return Err("rows have different lengths".to_string());
        }

        let mut classes = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let epsilon = (Self::VAR_SMOOTHING
            * (0..width)
                .map(|j| variance(rows.iter().map(|r| r[j])))
                .fold(0.0, f64::max))
        .max(Self::VAR_SMOOTHING);

        let n = rows.len() as f64;
        let mut log_priors = Vec::with_capacity(classes.len());
        let mut means = Vec::with_capacity(classes.len());
        let mut variances = Vec::with_capacity(classes.len());

        for &class in &classes {
            let members: Vec<&Vec<f64>> = rows
                .iter()
                .zip(labels)
                .filter(|(_, l)| **l == class)
                .map(|(r, _)| r)
                .collect();
            log_priors.push((members.len() as f64 / n).ln());
            means.push(
                (0..width)
                    .map(|j| members.iter().map(|r| r[j]).sum::<f64>() / members.len() as f64)
                    .collect(),
            );
            variances.push(
                (0..width)
                    .map(|j| variance(members.iter().map(|r| r[j])) + epsilon)
                    .collect(),
            );
        }

        Ok(Self {
            classes,
            log_priors,
            means,
            variances,
        })
    }

    fn joint_log_likelihood(&self, row: &[f64]) -> Vec<f64> {
        let ln_2pi = (2.0 * std::f64::consts::PI).ln();
        (0..self.classes.len())
            .map(|c| {
                let ll: f64 = row
                    .iter()
                    .zip(&self.means[c])
                    .zip(&self.variances[c])
                    .map(|((x, mean), var)| -0.5 * (ln_2pi + var.ln()) - (x - mean).powi(2) / (2.0 * var))
                    .sum();
                self.log_priors[c] + ll
            })
            .collect()
    }

    /// Most likely class; the smaller label wins ties
    fn predict(&self, row: &[f64]) -> u32 {
        let scores = self.joint_log_likelihood(row);
        let mut best = 0;
        for (i, score) in scores.iter().enumerate() {
            if score.total_cmp(&scores[best]).is_gt() {
                best = i;
            }
        }
        self.classes[best]
    }

    /// Posterior probability of `class` (0 when the class was never seen)
    fn probability_of(&self, row: &[f64], class: u32) -> f64 {
        let Some(index) = self.classes.iter().position(|&c| c == class) else {
            return 0.0;
        };
        let scores = self.joint_log_likelihood(row);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let total: f64 = scores.iter().map(|s| (s - max).exp()).sum();
        (scores[index] - max).exp() / total
    }
}

/// Population variance
fn variance(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let n = values.clone().count() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean = values.clone().sum::<f64>() / n;
    values.map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

// ============================================
// TRAINED MODEL
// ============================================

/// A fitted classifier. Immutable once fitted or loaded.
#[derive(Serialize, Deserialize)]
pub enum TrainedModel {
    DecisionTree(TreeModel),
    LogisticRegression(LogisticModel),
    BaggedTrees(BaggedTrees),
    Knn(KnnModel),
    NaiveBayes(GaussianBayes),
}

impl fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrainedModel({})", self.name())
    }
}

fn predict_error(model: &str, e: impl fmt::Display) -> AppError {
    AppError::new(ErrorCode::ModelPredictFailed, format!("{}: {}", model, e))
}

impl TrainedModel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DecisionTree(_) => "Decision Tree",
            Self::LogisticRegression(_) => "Logistic Regression",
            Self::BaggedTrees(_) => "Bagged Trees",
            Self::Knn(_) => "KNN",
            Self::NaiveBayes(_) => "Naive Bayes",
        }
    }

    /// Class labels for a batch of rows
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> AppResult<Vec<u32>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = DenseMatrix::from_2d_vec(&rows.to_vec());
        let err = |e: smartcore::error::Failed| predict_error(self.name(), e);

        match self {
            Self::DecisionTree(m) => m.predict(&x).map_err(err),
            Self::LogisticRegression(m) => m.predict(&x).map_err(err),
            Self::Knn(m) => m.predict(&x).map_err(err),
            Self::NaiveBayes(m) => Ok(rows.iter().map(|row| m.predict(row)).collect()),
            Self::BaggedTrees(m) => Ok(m
                .vote_fractions(&x, rows.len())
                .map_err(err)?
                .into_iter()
                .map(|p| if p > 0.5 { LABEL_MALICIOUS } else { LABEL_SAFE })
                .collect()),
        }
    }

    /// Class label for one row
    pub fn predict(&self, row: &[f64]) -> AppResult<u32> {
        self.predict_batch(&[row.to_vec()])?
            .first()
            .copied()
            .ok_or_else(|| predict_error(self.name(), "empty prediction"))
    }

    /// `[p_safe, p_malicious]` for one row, when the family supports it
    pub fn predict_proba(&self, row: &[f64]) -> AppResult<Option<[f64; 2]>> {
        let p_malicious = match self {
            Self::BaggedTrees(m) => {
                let x = DenseMatrix::from_2d_vec(&vec![row.to_vec()]);
                m.vote_fractions(&x, 1)
                    .map_err(|e| predict_error(self.name(), e))?
                    .first()
                    .copied()
            }
            Self::LogisticRegression(m) => Some(logistic_probability(m, row)),
            // Fully grown trees end in pure leaves
            Self::DecisionTree(_) => Some(if self.predict(row)? == LABEL_MALICIOUS { 1.0 } else { 0.0 }),
            Self::NaiveBayes(m) => Some(m.probability_of(row, LABEL_MALICIOUS)),
            Self::Knn(_) => None,
        };
        Ok(p_malicious.map(|p| [1.0 - p, p]))
    }
}

/// Sigmoid of the fitted linear score; positive class is the larger label.
fn logistic_probability(model: &LogisticModel, row: &[f64]) -> f64 {
    let coefficients = model.coefficients();
    let (rows, cols) = coefficients.shape();
    let weight = |j: usize| {
        if rows == 1 {
            *coefficients.get((0, j))
        } else {
            *coefficients.get((j, 0))
        }
    };
    let width = if rows == 1 { cols } else { rows };

    let mut z = *model.intercept().get((0, 0));
    for (j, value) in row.iter().enumerate().take(width) {
        z += weight(j) * value;
    }
    1.0 / (1.0 + (-z).exp())
}
