//! Integration tests for the SecureLink training pipeline

use securelink::core::features::{feature_names, FEATURE_COUNT};
use securelink::core::predictor::Predictor;
use securelink::core::trainer::{accuracy, run_training_pipeline};
use securelink::models::config::{ProbeConfig, ServiceConfig, TrainingConfig};
use securelink::models::errors::ErrorCode;
use securelink::utils::dataset::{load_samples, to_matrix};
use securelink::utils::store::{load_json, load_model, Preprocessor};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("securelink-{}-{}", tag, uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Labelled dataset in the usual export layout: index, url, label, result
fn write_dataset(dir: &Path, rows: usize) -> PathBuf {
    let mut csv = String::from(",url,label,result\n");
    for i in 0..rows {
        if i % 2 == 0 {
            csv.push_str(&format!(
                "{},https://www.site{}.com/docs/page{},benign,0\n",
                i,
                i,
                i % 7
            ));
        } else {
            csv.push_str(&format!(
                "{},http://10.{}.{}.7/secure-login/verify-account{}.php?user={}&token=a-b-{}&next=%2F,malicious,1\n",
                i,
                i % 200,
                i % 13,
                i,
                i,
                i
            ));
        }
    }
    let path = dir.join("urldata.csv");
    fs::write(&path, csv).unwrap();
    path
}

fn config(dataset: &Path, artifacts: &Path) -> TrainingConfig {
    let mut config = TrainingConfig::with_dirs(dataset, artifacts);
    config.forest_trees = 9;
    config
}

#[test]
fn test_full_pipeline_writes_every_artifact() {
    let dir = temp_dir("pipeline");
    let dataset = write_dataset(&dir, 120);
    let config = config(&dataset, &dir.join("artifacts"));

    let report = run_training_pipeline(&config).unwrap();

    for path in [
        config.raw_data_path(),
        config.train_data_path(),
        config.test_data_path(),
        config.preprocessor_path(),
        config.model_path(),
        config.report_path(),
    ] {
        assert!(path.exists(), "{} missing", path.display());
    }

    assert_eq!(report.rows.len(), 5);
    assert_eq!(report.train_samples, 96);
    assert_eq!(report.test_samples, 24);
    assert!(report.best_test_accuracy >= 90.0);
    let best = report
        .rows
        .iter()
        .map(|r| r.test_accuracy)
        .fold(f64::MIN, f64::max);
    assert_eq!(report.best_test_accuracy, best);

    let preprocessor: Preprocessor = load_json(&config.preprocessor_path()).unwrap();
    assert_eq!(preprocessor.feature_names.len(), FEATURE_COUNT);
    assert_eq!(preprocessor.feature_names, feature_names());

    let raw = fs::read_to_string(config.raw_data_path()).unwrap();
    let header = raw.lines().next().unwrap();
    assert!(header.starts_with("Unnamed: 0,url,label,result,hostname_length"));
    assert_eq!(raw.lines().count(), 121);

    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_reloaded_model_reproduces_reported_accuracy() {
    let dir = temp_dir("reload");
    let dataset = write_dataset(&dir, 100);
    let config = config(&dataset, &dir.join("artifacts"));
    let report = run_training_pipeline(&config).unwrap();

    let artifact = load_model(&config.model_path()).unwrap();
    assert_eq!(artifact.model_name, report.best_model);

    let test = load_samples(&config.test_data_path()).unwrap();
    let (rows, labels) = to_matrix(&test);
    let predicted = artifact.model.predict_batch(&rows).unwrap();
    assert_eq!(accuracy(&labels, &predicted), report.best_test_accuracy);

    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_runs_are_reproducible() {
    let dir = temp_dir("repro");
    let dataset = write_dataset(&dir, 80);

    let first = config(&dataset, &dir.join("a"));
    let second = config(&dataset, &dir.join("b"));
    let report_a = run_training_pipeline(&first).unwrap();
    let report_b = run_training_pipeline(&second).unwrap();

    assert_eq!(report_a.rows, report_b.rows);
    assert_eq!(
        fs::read_to_string(first.train_data_path()).unwrap(),
        fs::read_to_string(second.train_data_path()).unwrap()
    );
    assert_eq!(
        fs::read_to_string(first.test_data_path()).unwrap(),
        fs::read_to_string(second.test_data_path()).unwrap()
    );

    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_bad_dataset_is_rejected_with_stage() {
    let dir = temp_dir("bad");
    let dataset = dir.join("urldata.csv");
    fs::write(&dataset, "link,result\nhttp://a.com,0\nhttp://b.com,1\n").unwrap();

    let err = run_training_pipeline(&config(&dataset, &dir.join("artifacts"))).unwrap_err();
    assert_eq!(err.code, ErrorCode::DatasetInvalidSchema);
    assert!(err.message.starts_with("data ingestion"));

    let err = run_training_pipeline(&config(&dir.join("absent.csv"), &dir)).unwrap_err();
    assert_eq!(err.code, ErrorCode::DatasetIo);

    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_tiny_dataset_is_rejected_before_training() {
    let dir = temp_dir("tiny");
    let dataset = write_dataset(&dir, 6);

    let err = run_training_pipeline(&config(&dataset, &dir.join("artifacts"))).unwrap_err();
    assert_eq!(err.code, ErrorCode::DatasetEmpty);
    assert!(err.message.starts_with("data ingestion"));

    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_service_refuses_to_start_without_model() {
    let dir = temp_dir("nomodel");
    let config = ServiceConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        model_path: dir.join("model.json"),
        probes: ProbeConfig {
            timeout: Duration::from_secs(1),
        },
    };

    let err = Predictor::from_config(&config).err().unwrap();
    assert_eq!(err.code, ErrorCode::ModelNotFound);
    assert!(err.code.is_startup_fatal());

    fs::write(&config.model_path, "{\"model_name\": 3}").unwrap();
    let err = Predictor::from_config(&config).err().unwrap();
    assert_eq!(err.code, ErrorCode::ModelCorrupt);

    fs::remove_dir_all(dir).ok();
}
