//! Constants Module - Single Source of Truth
//!
//! Every default, header name and dataset column name used across the crate
//! is defined here.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "SecureLink";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for probe requests
pub const USER_AGENT: &str = concat!("SecureLink/", env!("CARGO_PKG_VERSION"));

// ============================================
// PROBE CONSTANTS
// ============================================

/// Default timeout for every live probe (seconds)
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// Response header inspected by the server banner probe
pub const HEADER_SERVER: &str = "server";

/// Response header inspected by the HSTS probe
pub const HEADER_HSTS: &str = "strict-transport-security";

/// Response header inspected by the XSS protection probe
pub const HEADER_X_XSS_PROTECTION: &str = "x-xss-protection";

// ============================================
// SERVICE CONSTANTS
// ============================================

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port
pub const DEFAULT_PORT: u16 = 8080;

/// Default model artifact location
pub const DEFAULT_MODEL_PATH: &str = "artifacts/model.json";

/// Form field carrying the submitted URL
pub const FORM_URL_FIELD: &str = "urlinput";

// ============================================
// TRAINING CONSTANTS
// ============================================

/// Default raw dataset location
pub const DEFAULT_DATASET_PATH: &str = "src/datasets/urldata.csv";

/// Default directory for every training output
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Canonical test split ratio (80/20)
pub const DEFAULT_TEST_RATIO: f64 = 0.2;

/// Canonical seed for splitting and ensemble bootstrap
pub const DEFAULT_SEED: u64 = 42;

/// Trees in the bagged ensemble
pub const DEFAULT_FOREST_TREES: usize = 50;

/// Neighbours consulted by the KNN variant
pub const DEFAULT_KNN_K: usize = 5;

/// Smallest train split every default variant can be fit on
pub const MIN_TRAIN_ROWS: usize = DEFAULT_KNN_K;

/// Default log directory for the training pipeline
pub const DEFAULT_TRAINING_LOG_DIR: &str = "secure_link_monitor_logs";

/// Output file names inside the artifacts directory
pub const RAW_DATA_FILE: &str = "data.csv";
pub const TRAIN_DATA_FILE: &str = "train.csv";
pub const TEST_DATA_FILE: &str = "test.csv";
pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
pub const MODEL_FILE: &str = "model.json";
pub const REPORT_FILE: &str = "model_report.json";

// ============================================
// DATASET COLUMNS
// ============================================

/// Column holding the raw URL
pub const COLUMN_URL: &str = "url";

/// Textual label column (`benign` / `malicious`)
pub const COLUMN_LABEL: &str = "label";

/// Numeric target column (0 = safe, 1 = malicious)
pub const COLUMN_RESULT: &str = "result";

/// Index column written by dataframe exports
pub const COLUMN_INDEX: &str = "Unnamed: 0";

/// Columns never fed to a classifier
pub const EXCLUDED_COLUMNS: [&str; 4] = [COLUMN_URL, COLUMN_LABEL, COLUMN_RESULT, COLUMN_INDEX];

/// Class label for a safe URL
pub const LABEL_SAFE: u32 = 0;

/// Class label for a malicious URL
pub const LABEL_MALICIOUS: u32 = 1;

/// Map a textual or numeric label cell to a class label
pub fn parse_label(raw: &str) -> Option<u32> {
    let value = raw.trim().to_ascii_lowercase();
    match value.as_str() {
        "benign" | "safe" | "good" | "legitimate" => return Some(LABEL_SAFE),
        "malicious" | "unsafe" | "bad" | "phishing" | "malware" => return Some(LABEL_MALICIOUS),
        _ => {}
    }
    match value.parse::<f64>() {
        Ok(v) if v == 0.0 => Some(LABEL_SAFE),
        Ok(v) if v == 1.0 => Some(LABEL_MALICIOUS),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label() {
        assert_eq!(parse_label("0"), Some(LABEL_SAFE));
        assert_eq!(parse_label("1.0"), Some(LABEL_MALICIOUS));
        assert_eq!(parse_label(" Benign "), Some(LABEL_SAFE));
        assert_eq!(parse_label("malicious"), Some(LABEL_MALICIOUS));
        assert_eq!(parse_label("2"), None);
        assert_eq!(parse_label(""), None);
    }
}
