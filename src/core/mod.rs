//! Core Module - URL features, classifiers, training and prediction

pub mod classifier;
pub mod features;
pub mod predictor;
pub mod trainer;
pub mod url_parts;

pub use classifier::{default_variants, ModelVariant, TrainedModel};
pub use features::{extract, feature_names, FeatureVector, FEATURE_COUNT, FEATURE_SCHEMA};
pub use predictor::{Classification, Predictor};
pub use trainer::{evaluate, run_training_pipeline, Evaluation, TrainingReport};
pub use url_parts::UrlParts;
