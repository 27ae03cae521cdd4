mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

// Lives in its own file (own server process) so burning through the
// health budget cannot affect other tests.

#[tokio::test]
async fn health_endpoint_throttles_per_ip() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let url = format!("{}/healthz", server.base_url);

    // Default budget is 30/min per IP
    for i in 0..30 {
        let resp = client
            .get(&url)
            .header("x-forwarded-for", "203.0.113.9")
            .send()
            .await?;
        assert_ne!(
            resp.status(),
            StatusCode::TOO_MANY_REQUESTS,
            "throttled too early on request {}",
            i + 1
        );
    }

    let resp = client
        .get(&url)
        .header("x-forwarded-for", "203.0.113.9")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let body: Value = resp.json().await?;
    assert_eq!(body["code"], "TOO_MANY_REQUESTS");
    assert!(body["retry_after"].as_u64().unwrap() >= 1);

    // A different address still has its own budget
    let other = client
        .get(&url)
        .header("x-forwarded-for", "203.0.113.10")
        .send()
        .await?;
    assert_ne!(other.status(), StatusCode::TOO_MANY_REQUESTS);

    Ok(())
}
