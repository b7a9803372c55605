//! Configuration module for SecureLink
//!
//! Every value is read from the environment once at start-up and never
//! mutated afterwards. Defaults live in utils/constants.rs.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::utils::constants::{
    DEFAULT_ARTIFACTS_DIR, DEFAULT_DATASET_PATH, DEFAULT_FOREST_TREES, DEFAULT_HOST,
    DEFAULT_MODEL_PATH, DEFAULT_PORT, DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_SEED, DEFAULT_TEST_RATIO,
    DEFAULT_TRAINING_LOG_DIR, MODEL_FILE, PREPROCESSOR_FILE, RAW_DATA_FILE, REPORT_FILE,
    TEST_DATA_FILE, TRAIN_DATA_FILE,
};

/// Read and parse an environment variable, falling back on absence or parse error
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "Invalid value in environment, using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Live probe settings
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Upper bound for each probe, TLS handshake included
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(env_or(
                "SECURELINK_PROBE_TIMEOUT_SECS",
                DEFAULT_PROBE_TIMEOUT_SECS,
            )),
        }
    }
}

/// Logging destination and level
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `securelink=debug`
    pub filter: String,
    /// When set, logs go to `<dir>/log_<timestamp>.log` instead of stdout
    pub log_dir: Option<PathBuf>,
}

impl LogConfig {
    /// Service logging: stdout unless `SECURELINK_LOG_DIR` is set
    pub fn for_service() -> Self {
        Self {
            filter: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_dir: std::env::var("SECURELINK_LOG_DIR").ok().map(PathBuf::from),
        }
    }

    /// Training logging: always to a timestamped file
    pub fn for_training() -> Self {
        Self {
            filter: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_dir: Some(env_path("SECURELINK_LOG_DIR", DEFAULT_TRAINING_LOG_DIR)),
        }
    }
}

/// Prediction service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Persisted model artifact loaded at start-up
    pub model_path: PathBuf,
    pub probes: ProbeConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        // PORT wins so the service runs unchanged on PaaS hosts
        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("SECURELINK_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            host: std::env::var("SECURELINK_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port,
            model_path: env_path("SECURELINK_MODEL_PATH", DEFAULT_MODEL_PATH),
            probes: ProbeConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Offline training pipeline configuration
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Raw labelled dataset (CSV)
    pub dataset_path: PathBuf,
    /// Directory receiving every training output
    pub artifacts_dir: PathBuf,
    /// Fraction of rows held out for testing
    pub test_ratio: f64,
    /// Seed for the split shuffle and ensemble bootstrap
    pub seed: u64,
    /// Trees in the bagged ensemble
    pub forest_trees: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let test_ratio = env_or("SECURELINK_TEST_RATIO", DEFAULT_TEST_RATIO);
        Self {
            dataset_path: env_path("SECURELINK_DATASET", DEFAULT_DATASET_PATH),
            artifacts_dir: env_path("SECURELINK_ARTIFACTS_DIR", DEFAULT_ARTIFACTS_DIR),
            test_ratio: if test_ratio > 0.0 && test_ratio < 1.0 {
                test_ratio
            } else {
                warn!(test_ratio, "Test ratio must be in (0, 1), using default");
                DEFAULT_TEST_RATIO
            },
            seed: env_or("SECURELINK_SEED", DEFAULT_SEED),
            forest_trees: env_or("SECURELINK_FOREST_TREES", DEFAULT_FOREST_TREES).max(1),
        }
    }
}

impl TrainingConfig {
    /// Configuration rooted at an explicit artifacts directory (used by tests and tools)
    pub fn with_dirs(dataset_path: impl Into<PathBuf>, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            artifacts_dir: artifacts_dir.into(),
            test_ratio: DEFAULT_TEST_RATIO,
            seed: DEFAULT_SEED,
            forest_trees: DEFAULT_FOREST_TREES,
        }
    }

    pub fn raw_data_path(&self) -> PathBuf {
        self.artifacts_dir.join(RAW_DATA_FILE)
    }

    pub fn train_data_path(&self) -> PathBuf {
        self.artifacts_dir.join(TRAIN_DATA_FILE)
    }

    pub fn test_data_path(&self) -> PathBuf {
        self.artifacts_dir.join(TEST_DATA_FILE)
    }

    pub fn preprocessor_path(&self) -> PathBuf {
        self.artifacts_dir.join(PREPROCESSOR_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.artifacts_dir.join(MODEL_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.artifacts_dir.join(REPORT_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_paths() {
        let config = TrainingConfig::with_dirs("data/urls.csv", "out");
        assert_eq!(config.train_data_path(), PathBuf::from("out/train.csv"));
        assert_eq!(config.test_data_path(), PathBuf::from("out/test.csv"));
        assert_eq!(config.model_path(), PathBuf::from("out/model.json"));
        assert_eq!(config.test_ratio, 0.2);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_env_or_falls_back() {
        assert_eq!(env_or("SECURELINK_TEST_UNSET_VARIABLE", 7u64), 7);
    }

    #[test]
    fn test_bind_addr() {
        let config = ServiceConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            probes: ProbeConfig {
                timeout: Duration::from_secs(1),
            },
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
    }
}
