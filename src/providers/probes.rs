//! Live Security Probes
//!
//! Four best-effort checks against the host of a submitted URL:
//! - TLS handshake succeeds and the peer presents a certificate
//! - `Server` response header (banner)
//! - `Strict-Transport-Security` response header
//! - `X-XSS-Protection` response header
//!
//! Every probe is bounded by the configured timeout. Timeouts, DNS failures,
//! refused connections and TLS errors all collapse to `NotDetected`; nothing
//! here returns an error to the caller.

use futures_util::future::BoxFuture;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::url_parts::UrlParts;
use crate::models::config::ProbeConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{ProbeOutcome, ProbeReport};
use crate::utils::constants::{HEADER_HSTS, HEADER_SERVER, HEADER_X_XSS_PROTECTION, USER_AGENT};

/// Runs the full probe set for a URL. Implementations never fail.
pub trait LiveProbes: Send + Sync {
    fn run<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ProbeReport>;
}

/// reqwest-backed probe runner
pub struct ProbeClient {
    /// Follows redirects like a browser would for header checks
    http: reqwest::Client,
    /// No redirects, exposes TLS peer information
    tls: reqwest::Client,
    timeout: Duration,
}

impl ProbeClient {
    pub fn new(config: &ProbeConfig) -> AppResult<Self> {
        let build_error =
            |e: reqwest::Error| AppError::with_source(ErrorCode::ConfigInvalidValue, "HTTP client", e);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(build_error)?;

        let tls = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .tls_info(true)
            .build()
            .map_err(build_error)?;

        Ok(Self {
            http,
            tls,
            timeout: config.timeout,
        })
    }

    /// Run all four probes concurrently
    pub async fn run_all(&self, url: &str) -> ProbeReport {
        let (ssl_certificate, server_banner, hsts, x_xss_protection) = tokio::join!(
            self.check_ssl_certificate(url),
            self.check_server_banner(url),
            self.check_hsts(url),
            self.check_x_xss_protection(url),
        );

        ProbeReport {
            ssl_certificate,
            server_banner,
            hsts,
            x_xss_protection,
        }
    }

    /// TLS handshake on port 443 of the URL's host; value is the hex DER certificate
    pub async fn check_ssl_certificate(&self, url: &str) -> ProbeOutcome {
        let parts = UrlParts::split(url);
        let host = parts.host();
        if host.is_empty() {
            debug!(url, "SSL probe skipped: no host");
            return ProbeOutcome::NotDetected;
        }

        let target = if host.contains(':') {
            format!("https://[{}]/", host)
        } else {
            format!("https://{}/", host)
        };

        let request = self.tls.head(&target).send();
        match self.bounded("ssl", request).await {
            Some(response) => {
                let certificate = response
                    .extensions()
                    .get::<reqwest::tls::TlsInfo>()
                    .and_then(|info| info.peer_certificate())
                    .map(hex::encode);
                match certificate {
                    Some(der) => ProbeOutcome::detected(der),
                    None => ProbeOutcome::NotDetected,
                }
            }
            None => ProbeOutcome::NotDetected,
        }
    }

    /// `Server` header presence
    pub async fn check_server_banner(&self, url: &str) -> ProbeOutcome {
        self.check_header(url, HEADER_SERVER).await
    }

    /// `Strict-Transport-Security` header presence
    pub async fn check_hsts(&self, url: &str) -> ProbeOutcome {
        self.check_header(url, HEADER_HSTS).await
    }

    /// `X-XSS-Protection` header presence
    pub async fn check_x_xss_protection(&self, url: &str) -> ProbeOutcome {
        self.check_header(url, HEADER_X_XSS_PROTECTION).await
    }

    async fn check_header(&self, url: &str, header: &'static str) -> ProbeOutcome {
        let request = self.http.get(url).send();
        match self.bounded(header, request).await {
            Some(response) => match response.headers().get(header) {
                Some(value) => {
                    ProbeOutcome::detected(String::from_utf8_lossy(value.as_bytes()).into_owned())
                }
                None => ProbeOutcome::NotDetected,
            },
            None => ProbeOutcome::NotDetected,
        }
    }

    /// Await a request under the probe timeout; any failure becomes `None`
    async fn bounded<F>(&self, probe: &str, request: F) -> Option<reqwest::Response>
    where
        F: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => Some(response),
            Ok(Err(e)) => {
                warn!(probe, error = %e, "⚠️ Probe failed, treating as not detected");
                None
            }
            Err(_) => {
                warn!(probe, timeout_secs = self.timeout.as_secs(), "⚠️ Probe timed out");
                None
            }
        }
    }
}

impl LiveProbes for ProbeClient {
    fn run<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ProbeReport> {
        Box::pin(self.run_all(url))
    }
}

/// Probe runner that reports every signal absent without touching the network
pub struct OfflineProbes;

impl LiveProbes for OfflineProbes {
    fn run<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, ProbeReport> {
        Box::pin(async { ProbeReport::none_detected() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn client(timeout_ms: u64) -> ProbeClient {
        ProbeClient::new(&ProbeConfig {
            timeout: Duration::from_millis(timeout_ms),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_refused_connection_is_not_detected() {
        let probes = client(2000);
        // Port 1 is never listening on loopback
        let report = probes.run_all("http://127.0.0.1:1/").await;
        assert_eq!(report, ProbeReport::none_detected());
    }

    #[tokio::test]
    async fn test_garbage_url_is_not_detected() {
        let probes = client(500);
        let report = probes.run_all("not a url at all").await;
        assert_eq!(report.detected_count(), 0);
        assert_eq!(report.hsts.value(), None);
    }

    #[tokio::test]
    async fn test_probes_respect_timeout() {
        // Non-routable address: the connect attempt hangs until the timeout
        let probes = client(300);
        let started = Instant::now();
        let report = probes.run_all("http://10.255.255.1/").await;
        assert_eq!(report.detected_count(), 0);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_offline_probes() {
        let report = OfflineProbes.run("https://example.com").await;
        assert_eq!(report, ProbeReport::none_detected());
    }
}
