//! Live probe tests against a local HTTP server on an ephemeral port

use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use securelink::models::config::ProbeConfig;
use securelink::models::types::ProbeOutcome;
use securelink::providers::probes::ProbeClient;
use std::time::Duration;
use tokio::net::TcpListener;

/// Server that sends a banner and an XSS header but no HSTS
async fn spawn_server() -> String {
    async fn page() -> impl IntoResponse {
        (
            [
                (header::SERVER, "securelink-test"),
                (header::HeaderName::from_static("x-xss-protection"), "1; mode=block"),
            ],
            "ok",
        )
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, Router::new().route("/", get(page)))
            .await
            .unwrap();
    });
    format!("http://{}/", addr)
}

fn client() -> ProbeClient {
    ProbeClient::new(&ProbeConfig {
        timeout: Duration::from_secs(2),
    })
    .unwrap()
}

#[tokio::test]
async fn test_header_probes_against_local_server() {
    let url = spawn_server().await;
    let probes = client();

    let banner = probes.check_server_banner(&url).await;
    assert_eq!(banner, ProbeOutcome::detected("securelink-test"));

    let hsts = probes.check_hsts(&url).await;
    assert_eq!(hsts, ProbeOutcome::NotDetected);
    assert_eq!(hsts.value(), None);

    let xss = probes.check_x_xss_protection(&url).await;
    assert_eq!(xss.value(), Some("1; mode=block"));
}

#[tokio::test]
async fn test_plain_http_host_has_no_certificate() {
    let url = spawn_server().await;
    let report = client().run_all(&url).await;

    // Nothing listens for TLS on 127.0.0.1:443
    assert_eq!(report.ssl_certificate, ProbeOutcome::NotDetected);
    assert!(report.server_banner.is_detected());
    assert!(!report.hsts.is_detected());
    assert_eq!(report.detected_count(), 2);
}
