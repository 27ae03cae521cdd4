mod common;

use anyhow::Result;

#[tokio::test]
async fn csp_header_has_a_fresh_nonce_per_response() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let first = client.get(format!("{}/", server.base_url)).send().await?;
    let second = client.get(format!("{}/", server.base_url)).send().await?;

    let csp_a = first
        .headers()
        .get("content-security-policy")
        .expect("missing CSP header")
        .to_str()?
        .to_string();
    let csp_b = second
        .headers()
        .get("content-security-policy")
        .unwrap()
        .to_str()?
        .to_string();

    let nonce_a = extract_nonce(&csp_a);
    let nonce_b = extract_nonce(&csp_b);

    assert_eq!(nonce_a.len(), 32);
    assert!(nonce_a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(nonce_a, nonce_b, "nonce must change per response");

    Ok(())
}

#[tokio::test]
async fn csp_is_strict() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/", server.base_url)).send().await?;
    let csp = resp
        .headers()
        .get("content-security-policy")
        .unwrap()
        .to_str()?;

    assert!(csp.contains("default-src 'self'"));
    assert!(csp.contains("frame-ancestors 'none'"));
    assert!(csp.contains("object-src 'none'"));
    assert!(!csp.contains("unsafe-inline"));
    assert!(!csp.contains("unsafe-eval"));

    Ok(())
}

#[tokio::test]
async fn standard_security_headers_are_present() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/", server.base_url)).send().await?;
    let headers = resp.headers();

    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(
        headers.get("referrer-policy").unwrap(),
        "strict-origin-when-cross-origin"
    );

    // HSTS is reserved for production deployments
    assert!(headers.get("strict-transport-security").is_none());

    Ok(())
}

fn extract_nonce(csp: &str) -> String {
    let start = csp.find("'nonce-").expect("no nonce in CSP") + "'nonce-".len();
    let rest = &csp[start..];
    let end = rest.find('\'').expect("unterminated nonce");
    rest[..end].to_string()
}
