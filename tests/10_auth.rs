mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", server.base_url)).send().await?;

    // OK with a database, SERVICE_UNAVAILABLE without one
    let status = res.status();
    assert!(
        status == StatusCode::OK || status == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        status
    );

    let body = res.json::<Value>().await?;
    if status == StatusCode::OK {
        assert_eq!(body["data"]["status"], "ok");
    } else {
        assert_eq!(body["success"], false);
        assert_eq!(body["data"]["status"], "degraded");
    }
    Ok(())
}

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let server = common::ensure_server().await?;

    let body = reqwest::get(format!("{}/", server.base_url)).await?.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Climate Economy Assistant API");
    assert!(body["data"]["endpoints"]["chat"].is_string());
    Ok(())
}

#[tokio::test]
async fn v1_requires_bearer_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/v1/conversations", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "UNAUTHORIZED");

    let res = client
        .get(format!("{}/api/v1/profile", server.base_url))
        .header("authorization", "Bearer not-a-real-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn admin_requires_bearer_token() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .get(format!("{}/api/admin/access", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
