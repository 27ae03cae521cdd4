mod common;

use anyhow::Result;
use uuid::Uuid;

#[tokio::test]
async fn every_response_carries_a_request_id() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/", server.base_url)).send().await?;

    let header = resp
        .headers()
        .get("x-request-id")
        .expect("missing X-Request-Id header")
        .to_str()?;
    Uuid::parse_str(header).expect("X-Request-Id is not a UUID");

    Ok(())
}

#[tokio::test]
async fn valid_incoming_request_id_is_echoed() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let id = Uuid::new_v4().to_string();
    let resp = client
        .get(format!("{}/", server.base_url))
        .header("x-request-id", &id)
        .send()
        .await?;

    assert_eq!(resp.headers().get("x-request-id").unwrap().to_str()?, id);

    Ok(())
}

#[tokio::test]
async fn malformed_request_id_is_replaced() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/", server.base_url))
        .header("x-request-id", "not-a-uuid; DROP TABLE tenants")
        .send()
        .await?;

    let header = resp.headers().get("x-request-id").unwrap().to_str()?;
    assert_ne!(header, "not-a-uuid; DROP TABLE tenants");
    Uuid::parse_str(header).expect("replacement id is not a UUID");

    Ok(())
}

#[tokio::test]
async fn error_responses_carry_a_request_id_too() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Admin routes reject non-central hosts with 403
    let resp = client
        .get(format!("{}/admin/tenants", server.base_url))
        .header("host", "shop.example.com")
        .send()
        .await?;

    assert_eq!(resp.status(), reqwest::StatusCode::FORBIDDEN);
    let header = resp.headers().get("x-request-id").unwrap().to_str()?;
    Uuid::parse_str(header)?;

    Ok(())
}
