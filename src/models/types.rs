//! Type definitions for SecureLink
//! Verdicts, probe outcomes and model report rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::core::features::FeatureVector;
use crate::utils::constants::LABEL_SAFE;

/// Safety classification of a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLabel {
    Safe,
    Unsafe,
}

impl SafetyLabel {
    /// Class 0 is safe, anything else is unsafe
    pub fn from_class(class: u32) -> Self {
        if class == LABEL_SAFE {
            Self::Safe
        } else {
            Self::Unsafe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Unsafe => "unsafe",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Safe => "🟢",
            Self::Unsafe => "🔴",
        }
    }
}

/// Result of one live probe. Failures of any kind are `NotDetected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Signal present; `value` carries the header or certificate where available
    Detected { value: Option<String> },
    NotDetected,
}

impl ProbeOutcome {
    pub fn detected(value: impl Into<String>) -> Self {
        Self::Detected {
            value: Some(value.into()),
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Detected { .. })
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Detected { value } => value.as_deref(),
            Self::NotDetected => None,
        }
    }
}

/// The four live security signals for one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub ssl_certificate: ProbeOutcome,
    pub server_banner: ProbeOutcome,
    pub hsts: ProbeOutcome,
    pub x_xss_protection: ProbeOutcome,
}

impl ProbeReport {
    /// Report with every signal absent
    pub fn none_detected() -> Self {
        Self {
            ssl_certificate: ProbeOutcome::NotDetected,
            server_banner: ProbeOutcome::NotDetected,
            hsts: ProbeOutcome::NotDetected,
            x_xss_protection: ProbeOutcome::NotDetected,
        }
    }

    pub fn detected_count(&self) -> usize {
        [
            &self.ssl_certificate,
            &self.server_banner,
            &self.hsts,
            &self.x_xss_protection,
        ]
        .iter()
        .filter(|p| p.is_detected())
        .count()
    }
}

/// Per-request prediction output. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub id: Uuid,
    pub url: String,
    pub label: SafetyLabel,
    /// Raw class predicted by the model (0 = safe, 1 = malicious)
    pub class: u32,
    /// Probability of class 1 in percent, two decimals
    pub probability_percent: Option<f64>,
    /// `[p_safe, p_malicious]` when the model supports probabilities
    pub probabilities: Option<[f64; 2]>,
    pub model: String,
    pub probes: ProbeReport,
    pub features: FeatureVector,
    pub analyzed_at: DateTime<Utc>,
}

impl Verdict {
    pub fn is_safe(&self) -> bool {
        self.label == SafetyLabel::Safe
    }

    pub fn summary(&self) -> String {
        let probability = self
            .probability_percent
            .map(|p| format!("{:.2}%", p))
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "{} {} | URL: {} | P(class 1): {} | Probes: {}/4 | Model: {}",
            self.label.emoji(),
            self.label.as_str().to_uppercase(),
            self.url,
            probability,
            self.probes.detected_count(),
            self.model,
        )
    }
}

/// Round a probability to a percentage with two decimals
pub fn to_percent(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}

/// 2x2 confusion matrix: rows = true label, columns = predicted label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix(pub [[u64; 2]; 2]);

impl ConfusionMatrix {
    /// Count label pairs; labels outside {0, 1} are ignored
    pub fn from_labels(truth: &[u32], predicted: &[u32]) -> Self {
        let mut m = [[0u64; 2]; 2];
        for (&t, &p) in truth.iter().zip(predicted) {
            if t < 2 && p < 2 {
                m[t as usize][p as usize] += 1;
            }
        }
        Self(m)
    }

    pub fn true_negatives(&self) -> u64 {
        self.0[0][0]
    }
    pub fn false_positives(&self) -> u64 {
        self.0[0][1]
    }
    pub fn false_negatives(&self) -> u64 {
        self.0[1][0]
    }
    pub fn true_positives(&self) -> u64 {
        self.0[1][1]
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[[{} {}] [{} {}]]",
            self.0[0][0], self.0[0][1], self.0[1][0], self.0[1][1]
        )
    }
}

/// One row of the model comparison report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReportRow {
    pub model: String,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub confusion_matrix: ConfusionMatrix,
}

/// Feature vector with its class label, as used for training
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSample {
    pub features: FeatureVector,
    pub label: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_convention() {
        assert_eq!(SafetyLabel::from_class(0), SafetyLabel::Safe);
        assert_eq!(SafetyLabel::from_class(1), SafetyLabel::Unsafe);
    }

    #[test]
    fn test_to_percent_rounds_two_decimals() {
        assert_eq!(to_percent(0.123456), 12.35);
        assert_eq!(to_percent(1.0), 100.0);
        assert_eq!(to_percent(0.0), 0.0);
    }

    #[test]
    fn test_confusion_matrix() {
        let truth = [0, 0, 1, 1, 1];
        let predicted = [0, 1, 1, 0, 1];
        let cm = ConfusionMatrix::from_labels(&truth, &predicted);
        assert_eq!(cm.true_negatives(), 1);
        assert_eq!(cm.false_positives(), 1);
        assert_eq!(cm.false_negatives(), 1);
        assert_eq!(cm.true_positives(), 2);
        assert_eq!(cm.to_string(), "[[1 1] [1 2]]");
    }

    #[test]
    fn test_probe_outcome_serialization() {
        let json = serde_json::to_value(ProbeOutcome::NotDetected).unwrap();
        assert_eq!(json["status"], "not_detected");
        let json = serde_json::to_value(ProbeOutcome::detected("nginx")).unwrap();
        assert_eq!(json["status"], "detected");
        assert_eq!(json["value"], "nginx");
    }

    #[test]
    fn test_probe_report_counts() {
        let mut report = ProbeReport::none_detected();
        assert_eq!(report.detected_count(), 0);
        report.hsts = ProbeOutcome::detected("max-age=31536000");
        assert_eq!(report.detected_count(), 1);
        assert_eq!(report.hsts.value(), Some("max-age=31536000"));
        assert_eq!(report.server_banner.value(), None);
    }
}
