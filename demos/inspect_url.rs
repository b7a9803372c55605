//! URL Inspection Demo
//!
//! Prints the feature vector of each URL and, when a trained model is
//! available, the full verdict including live probes.
//!
//! Run with: cargo run --example inspect_url -- https://example.com http://192.168.0.1/login.php

use securelink::core::features::extract;
use securelink::core::predictor::Predictor;
use securelink::models::config::ServiceConfig;

#[tokio::main]
async fn main() {
    let mut urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        urls = vec![
            "https://www.wikipedia.org/".to_string(),
            "http://192.168.10.4/secure-login/update.php?acct=1&session=abc".to_string(),
            "paypal.com.account-verify.example-host.ru/signin".to_string(),
        ];
    }

    println!("🔍 SecureLink URL inspection\n");

    for url in &urls {
        let features = extract(url);
        println!("{}", url);
        for (name, value) in features.named() {
            println!("   {:<22} {:>5}", name, value);
        }
        println!();
    }

    let config = ServiceConfig::default();
    let predictor = match Predictor::from_config(&config) {
        Ok(predictor) => predictor,
        Err(e) => {
            println!("⚠️  No model available ({}). Train one with `cargo run --bin securelink`.", e);
            return;
        }
    };

    println!("📦 Model: {}\n", predictor.model_name());
    for url in &urls {
        match predictor.predict(url).await {
            Ok(verdict) => println!("{}", verdict.summary()),
            Err(e) => println!("❌ {}: {}", url, e),
        }
    }
}
