//! Telemetry Module for SecureLink
//!
//! Aggregate counters for the prediction service:
//! - Predictions served, split by safe / unsafe verdict
//! - How often each live probe detected its signal
//! - Average end-to-end latency
//!
//! No URLs are stored, only counts.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::types::Verdict;

/// Snapshot of the service counters
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StatsSnapshot {
    pub total_predictions: u64,
    pub safe_predictions: u64,
    pub unsafe_predictions: u64,
    /// Requests rejected before reaching the model
    pub rejected_requests: u64,
    pub ssl_detected: u64,
    pub server_banner_detected: u64,
    pub hsts_detected: u64,
    pub x_xss_protection_detected: u64,
    pub avg_latency_ms: f64,
    pub period_start: u64,
    pub period_end: u64,
}

impl StatsSnapshot {
    /// Share of verdicts that were unsafe, in percent
    pub fn unsafe_rate(&self) -> f64 {
        if self.total_predictions == 0 {
            0.0
        } else {
            self.unsafe_predictions as f64 / self.total_predictions as f64 * 100.0
        }
    }
}

/// Lock-free service counters
pub struct ServiceStats {
    total_predictions: AtomicU64,
    safe_predictions: AtomicU64,
    unsafe_predictions: AtomicU64,
    rejected_requests: AtomicU64,
    ssl_detected: AtomicU64,
    server_banner_detected: AtomicU64,
    hsts_detected: AtomicU64,
    x_xss_protection_detected: AtomicU64,
    total_latency_ms: AtomicU64,
    session_start: u64,
    export_dir: PathBuf,
}

impl ServiceStats {
    pub fn new() -> Self {
        Self::with_export_dir(PathBuf::from("./telemetry"))
    }

    pub fn with_export_dir(export_dir: PathBuf) -> Self {
        Self {
            total_predictions: AtomicU64::new(0),
            safe_predictions: AtomicU64::new(0),
            unsafe_predictions: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
            ssl_detected: AtomicU64::new(0),
            server_banner_detected: AtomicU64::new(0),
            hsts_detected: AtomicU64::new(0),
            x_xss_protection_detected: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            session_start: current_timestamp(),
            export_dir,
        }
    }

    /// Record a served verdict
    pub fn record_verdict(&self, verdict: &Verdict, latency_ms: u64) {
        self.total_predictions.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);

        if verdict.is_safe() {
            self.safe_predictions.fetch_add(1, Ordering::Relaxed);
        } else {
            self.unsafe_predictions.fetch_add(1, Ordering::Relaxed);
        }

        let probes = &verdict.probes;
        for (outcome, counter) in [
            (&probes.ssl_certificate, &self.ssl_detected),
            (&probes.server_banner, &self.server_banner_detected),
            (&probes.hsts, &self.hsts_detected),
            (&probes.x_xss_protection, &self.x_xss_protection_detected),
        ] {
            if outcome.is_detected() {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record a request that never reached the model (empty URL, bad body)
    pub fn record_rejected(&self) {
        self.rejected_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let total = self.total_predictions.load(Ordering::Relaxed);
        let latency = self.total_latency_ms.load(Ordering::Relaxed);

        StatsSnapshot {
            total_predictions: total,
            safe_predictions: self.safe_predictions.load(Ordering::Relaxed),
            unsafe_predictions: self.unsafe_predictions.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            ssl_detected: self.ssl_detected.load(Ordering::Relaxed),
            server_banner_detected: self.server_banner_detected.load(Ordering::Relaxed),
            hsts_detected: self.hsts_detected.load(Ordering::Relaxed),
            x_xss_protection_detected: self.x_xss_protection_detected.load(Ordering::Relaxed),
            avg_latency_ms: if total > 0 {
                latency as f64 / total as f64
            } else {
                0.0
            },
            period_start: self.session_start,
            period_end: current_timestamp(),
        }
    }

    /// Write the current snapshot to `<export_dir>/service_stats.json`
    pub fn export_stats_json(&self) -> Result<PathBuf, std::io::Error> {
        fs::create_dir_all(&self.export_dir)?;
        let path = self.export_dir.join("service_stats.json");
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        fs::write(&path, json)?;
        Ok(path)
    }
}

impl Default for ServiceStats {
    fn default() -> Self {
        Self::new()
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
