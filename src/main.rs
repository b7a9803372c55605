//! SecureLink training pipeline
//!
//! Reads the labelled URL dataset, extracts features, compares the classifier
//! variants and persists the best one for the prediction service.
//!
//! Usage:
//!   securelink [DATASET_CSV] [ARTIFACTS_DIR]
//!
//! Environment: see `TrainingConfig` (SECURELINK_DATASET, SECURELINK_ARTIFACTS_DIR,
//! SECURELINK_TEST_RATIO, SECURELINK_SEED, SECURELINK_FOREST_TREES, SECURELINK_LOG_DIR).

use eyre::{Result, WrapErr};
use securelink::core::trainer::{render_report, run_training_pipeline};
use securelink::models::config::{LogConfig, TrainingConfig};
use securelink::utils::logging::init_logging;
use tracing::info;

fn main() -> Result<()> {
    let log_file = init_logging(&LogConfig::for_training())?;

    let mut config = TrainingConfig::default();
    let mut args = std::env::args().skip(1);
    if let Some(dataset) = args.next() {
        config.dataset_path = dataset.into();
    }
    if let Some(artifacts) = args.next() {
        config.artifacts_dir = artifacts.into();
    }

    println!("🛡️  SecureLink training pipeline");
    println!("   Dataset:   {}", config.dataset_path.display());
    println!("   Artifacts: {}", config.artifacts_dir.display());
    if let Some(path) = &log_file {
        println!("   Log file:  {}", path.display());
    }

    let report = run_training_pipeline(&config).wrap_err("training pipeline failed")?;

    println!();
    println!("{}", render_report(&report.rows));
    println!(
        "🏆 Best model: {} ({:.2}% test accuracy, {} train / {} test samples)",
        report.best_model, report.best_test_accuracy, report.train_samples, report.test_samples
    );
    println!("💾 Saved to {}", config.model_path().display());
    info!(model = %report.best_model, "Training finished");

    Ok(())
}
