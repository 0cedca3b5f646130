mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn login_requires_email_and_password() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
    assert!(body["error"]["field_errors"]["email"].is_string());
    assert!(body["error"]["field_errors"]["password"].is_string());
    Ok(())
}

#[tokio::test]
async fn dev_login_issues_a_usable_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let token = common::dev_login(&server.base_url, "admin@churchflow.local").await?;

    let res = client
        .get(format!("{}/api/auth/whoami", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["email"], json!("admin@churchflow.local"));
    assert_eq!(body["data"]["role"], json!("superadmin"));
    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_or_garbage_tokens() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/auth/whoami", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/api/auth/whoami", server.base_url))
        .bearer_auth("not.a.jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"]["code"], json!("UNAUTHORIZED"));
    Ok(())
}

#[tokio::test]
async fn refresh_exchanges_a_valid_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let token = common::dev_login(&server.base_url, "staff@churchflow.local").await?;

    let res = client
        .post(format!("{}/api/auth/refresh", server.base_url))
        .json(&json!({ "token": token }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    let new_token = body["data"]["token"].as_str().unwrap();

    // The refreshed token still authenticates
    let res = client
        .get(format!("{}/api/auth/whoami", server.base_url))
        .bearer_auth(new_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn refresh_rejects_garbage() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/auth/refresh", server.base_url))
        .json(&json!({ "token": "garbage" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn wrong_dev_password_is_unauthorized_or_unavailable() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Falls through the dev store to the database; without one the service
    // degrades to 503, with one the credentials are simply wrong
    let res = client
        .post(format!("{}/api/auth/login", server.base_url))
        .json(&json!({ "email": "admin@churchflow.local", "password": "wrong" }))
        .send()
        .await?;
    assert!(
        res.status() == StatusCode::UNAUTHORIZED
            || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );
    Ok(())
}
