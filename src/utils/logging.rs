//! Process-wide logging set-up
//!
//! Initialised once per process from a read-only `LogConfig`. With a log
//! directory configured, output goes to `<dir>/log_<timestamp>.log` without
//! ANSI colours; otherwise to stdout.

use chrono::Local;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::models::config::LogConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};

/// `log_<YYYY-mm-dd_HH-MM-SS>.log`
pub fn log_file_name() -> String {
    format!("log_{}.log", Local::now().format("%Y-%m-%d_%H-%M-%S"))
}

/// Install the global subscriber. Returns the log file path when logging to a file.
pub fn init_logging(config: &LogConfig) -> AppResult<Option<PathBuf>> {
    let filter = EnvFilter::try_new(&config.filter).map_err(|e| {
        AppError::with_source(
            ErrorCode::ConfigInvalidValue,
            format!("log filter {:?}", config.filter),
            e,
        )
    })?;
    let init_error = |e: Box<dyn std::error::Error + Send + Sync>| {
        AppError::new(ErrorCode::ConfigInvalidValue, format!("logging already initialised: {}", e))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    match &config.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| {
                AppError::with_source(ErrorCode::ConfigInvalidValue, dir.display().to_string(), e)
            })?;
            let path = dir.join(log_file_name());
            let file = fs::File::create(&path).map_err(|e| {
                AppError::with_source(ErrorCode::ConfigInvalidValue, path.display().to_string(), e)
            })?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(init_error)?;
            Ok(Some(path))
        }
        None => {
            builder.try_init().map_err(init_error)?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name() {
        let name = log_file_name();
        assert!(name.starts_with("log_"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "log_2024-01-01_00-00-00.log".len());
    }

    #[test]
    fn test_bad_filter_is_rejected() {
        let config = LogConfig {
            filter: "securelink=verbose".to_string(),
            log_dir: None,
        };
        let err = init_logging(&config).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidValue);
    }
}
