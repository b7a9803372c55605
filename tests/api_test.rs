//! HTTP surface tests: the router is driven in-process with `oneshot`

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use securelink::api::{create_router, AppState};
use securelink::core::classifier::ModelVariant;
use securelink::core::features::FEATURE_COUNT;
use securelink::core::predictor::Predictor;
use securelink::providers::probes::OfflineProbes;
use securelink::utils::store::ModelArtifact;
use securelink::utils::telemetry::ServiceStats;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

/// Naive Bayes over synthetic rows, probes disabled
fn app() -> Router {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..12 {
        rows.push((0..FEATURE_COUNT).map(|j| (i % 4 + j % 3) as f64).collect());
        labels.push(0);
        rows.push((0..FEATURE_COUNT).map(|j| (40 + i % 5 + j % 2) as f64).collect());
        labels.push(1);
    }
    let model = ModelVariant::NaiveBayes.fit(&rows, &labels).unwrap();
    let predictor = Predictor::new(ModelArtifact::new(model, 100.0), Arc::new(OfflineProbes));
    create_router(Arc::new(AppState::new(predictor, Arc::new(ServiceStats::new()))))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn form(body: &str) -> Request<Body> {
    Request::post("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_home_page_has_form() {
    let (status, body) = send(app(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"name="urlinput""#));
}

#[tokio::test]
async fn test_form_prediction_renders_verdict() {
    let (status, body) = send(app(), form("urlinput=https%3A%2F%2Fexample.com%2F")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Entered Website: https://example.com/"));
    assert!(body.contains("SAFE to visit"));
    assert!(body.contains("HSTS is not enabled for the website."));
    assert!(body.contains("does not have a valid SSL certificate"));
}

#[tokio::test]
async fn test_form_escapes_submitted_url() {
    let (status, body) = send(app(), form("urlinput=%3Cscript%3Ex%3C%2Fscript%3E")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("<script>x"));
    assert!(body.contains("&lt;script&gt;x"));
}

#[tokio::test]
async fn test_form_rejects_blank_or_missing_url() {
    let (status, _) = send(app(), form("urlinput=+++")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app(), form("other=1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_json_prediction() {
    let (status, body) = send(app(), json("/v1/predict", r#"{"url": "https://example.com/"}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["success"], true);
    let data = &value["data"];
    assert_eq!(data["url"], "https://example.com/");
    assert_eq!(data["label"], "safe");
    assert_eq!(data["model"], "Naive Bayes");
    assert_eq!(data["probes"]["hsts"]["status"], "not_detected");
    assert!(data["probes"]["hsts"].get("value").is_none());
    assert_eq!(data["features"].as_array().unwrap().len(), FEATURE_COUNT);
    let percent = data["probability_percent"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&percent));
}

#[tokio::test]
async fn test_json_rejects_bad_requests() {
    let (status, body) = send(app(), json("/v1/predict", r#"{"url": "   "}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["code"], "API_BAD_REQUEST");

    let (status, _) = send(app(), json("/v1/predict", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app(), json("/v1/features", r#"{"link": "x"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_features_endpoint() {
    let (status, body) = send(
        app(),
        json("/v1/features", r#"{"url": "http://example.com/a/b?x=1&y=2"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let value: Value = serde_json::from_str(&body).unwrap();
    let features = value["data"]["features"].as_array().unwrap();
    assert_eq!(features.len(), FEATURE_COUNT);
    let lookup = |name: &str| {
        features
            .iter()
            .find(|f| f["name"] == name)
            .and_then(|f| f["value"].as_i64())
            .unwrap()
    };
    assert_eq!(lookup("hostname_length"), 11);
    assert_eq!(lookup("path_length"), 4);
    assert_eq!(lookup("params_length"), 2);
    assert_eq!(lookup("count_of_http"), 1);
    assert_eq!(features[0]["name"], "hostname_length");
}

#[tokio::test]
async fn test_stats_count_served_and_rejected() {
    let app = app();
    send(app.clone(), json("/v1/predict", r#"{"url": "https://example.com/"}"#)).await;
    send(app.clone(), json("/v1/predict", r#"{"url": ""}"#)).await;

    let (status, body) = send(app, get("/v1/stats")).await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["data"]["total_predictions"], 1);
    assert_eq!(value["data"]["safe_predictions"], 1);
    assert_eq!(value["data"]["rejected_requests"], 1);
    assert_eq!(value["data"]["model"], "Naive Bayes");
}

#[tokio::test]
async fn test_health_endpoints() {
    for uri in ["/health", "/v1/health"] {
        let (status, body) = send(app(), get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["data"]["status"], "healthy");
    }
}

#[tokio::test]
async fn test_rate_limit_is_per_peer_without_proxy_headers() {
    let app = app();
    let from = |peer: &str| {
        let mut request = json("/v1/predict", r#"{"url": "https://example.com/"}"#);
        let addr: SocketAddr = peer.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    };

    for _ in 0..60 {
        let (status, _) = send(app.clone(), from("198.51.100.10:40000")).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(app.clone(), from("198.51.100.10:40001")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["error"]["code"], "API_RATE_LIMITED");

    let (status, _) = send(app, from("198.51.100.11:40000")).await;
    assert_eq!(status, StatusCode::OK);
}
