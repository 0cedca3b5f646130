mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn data_routes_require_authentication() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/announcements", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unknown_resource_is_404() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::dev_login(&server.base_url, "admin@churchflow.local").await?;

    let res = client
        .get(format!("{}/api/sermons", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
    Ok(())
}

#[tokio::test]
async fn create_with_missing_fields_names_each_field() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::dev_login(&server.base_url, "admin@churchflow.local").await?;

    let res = client
        .post(format!("{}/api/announcements", server.base_url))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
    for field in ["title", "body", "audience"] {
        assert_eq!(
            body["error"]["field_errors"][field],
            json!("this field is required"),
            "expected field error for {}",
            field
        );
    }
    Ok(())
}

#[tokio::test]
async fn unknown_and_out_of_set_values_are_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::dev_login(&server.base_url, "admin@churchflow.local").await?;

    let res = client
        .post(format!("{}/api/announcements", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Harvest Sunday",
            "body": "Join us",
            "audience": "everyone",
            "color": "red",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"]["field_errors"]["color"], json!("unknown field"));
    assert!(body["error"]["field_errors"]["audience"]
        .as_str()
        .unwrap()
        .contains("one of"));
    Ok(())
}

#[tokio::test]
async fn status_columns_are_read_only_on_the_data_plane() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::dev_login(&server.base_url, "admin@churchflow.local").await?;

    let res = client
        .patch(format!(
            "{}/api/leave-requests/5f4c1b9a-52f6-41a4-9a3e-7b1d7b1d7b1d",
            server.base_url
        ))
        .bearer_auth(&token)
        .json(&json!({ "status": "approved" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(
        body["error"]["field_errors"]["status"],
        json!("read-only field")
    );
    Ok(())
}

#[tokio::test]
async fn staff_cannot_write_admin_resources() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::dev_login(&server.base_url, "staff@churchflow.local").await?;

    // users admin is superadmin-only
    let res = client
        .post(format!("{}/api/users", server.base_url))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // announcements are created by district admins
    let res = client
        .post(format!("{}/api/announcements", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "title": "t", "body": "b", "audience": "all" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // audit logs are superadmin-only reading
    let res = client
        .get(format!("{}/api/audit-logs", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn malformed_record_ids_are_400() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::dev_login(&server.base_url, "admin@churchflow.local").await?;

    let res = client
        .delete(format!("{}/api/announcements/not-a-uuid", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn invalid_filter_and_order_params_are_400() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::dev_login(&server.base_url, "admin@churchflow.local").await?;

    let res = client
        .get(format!(
            "{}/api/announcements?favourite_color=blue",
            server.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert!(body["error"]["field_errors"]["favourite_color"].is_string());

    let res = client
        .get(format!("{}/api/announcements?order=body", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn status_transition_endpoints_validate_before_touching_the_database() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Staff may not drive transitions at all
    let staff = common::dev_login(&server.base_url, "staff@churchflow.local").await?;
    let res = client
        .patch(format!(
            "{}/api/leave-requests/5f4c1b9a-52f6-41a4-9a3e-7b1d7b1d7b1d/status",
            server.base_url
        ))
        .bearer_auth(&staff)
        .json(&json!({ "status": "approved" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Unknown status literal fails before any lookup
    let admin = common::dev_login(&server.base_url, "admin@churchflow.local").await?;
    let res = client
        .patch(format!(
            "{}/api/compliance-issues/5f4c1b9a-52f6-41a4-9a3e-7b1d7b1d7b1d/status",
            server.base_url
        ))
        .bearer_auth(&admin)
        .json(&json!({ "status": "sideways" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn list_works_or_degrades_without_a_database() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::dev_login(&server.base_url, "admin@churchflow.local").await?;

    let res = client
        .get(format!("{}/api/announcements?limit=5", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );

    if res.status() == StatusCode::OK {
        let body = res.json::<serde_json::Value>().await?;
        assert!(body["data"].is_array());
        assert!(body["meta"]["total"].is_i64() || body["meta"]["total"].is_u64());
        assert_eq!(body["meta"]["limit"], json!(5));
    }
    Ok(())
}

#[tokio::test]
async fn notification_send_validates_channels_first() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::dev_login(&server.base_url, "admin@churchflow.local").await?;

    // No channels at all
    let res = client
        .post(format!("{}/api/notifications/send", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "subject": "s", "body": "b", "recipients": [{ "email": "a@b.c" }] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Unknown channel name
    let res = client
        .post(format!("{}/api/notifications/send", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "subject": "s",
            "body": "b",
            "channels": ["pigeon"],
            "recipients": [{ "email": "a@b.c" }],
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Known channel that is not configured in the test environment
    let res = client
        .post(format!("{}/api/notifications/send", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "subject": "s",
            "body": "b",
            "channels": ["sms"],
            "recipients": [{ "phone": "+233200000000" }],
        }))
        .send()
        .await?;
    assert!(
        res.status() == StatusCode::SERVICE_UNAVAILABLE
            || res.status() == StatusCode::BAD_GATEWAY
            || res.status() == StatusCode::OK,
        "unexpected status: {}",
        res.status()
    );
    Ok(())
}

#[tokio::test]
async fn file_upload_validates_payload_before_storage() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::dev_login(&server.base_url, "admin@churchflow.local").await?;

    // Missing everything
    let res = client
        .post(format!("{}/api/files", server.base_url))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert!(body["error"]["field_errors"]["filename"].is_string());
    assert!(body["error"]["field_errors"]["data"].is_string());

    // Garbage base64
    let res = client
        .post(format!("{}/api/files", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "filename": "a.txt", "data": "!!!not-base64!!!" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Valid payload, but no store configured in the test environment
    let res = client
        .post(format!("{}/api/files", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "filename": "a.txt", "data": "aGVsbG8=" }))
        .send()
        .await?;
    assert!(
        res.status() == StatusCode::SERVICE_UNAVAILABLE
            || res.status() == StatusCode::BAD_GATEWAY
            || res.status() == StatusCode::CREATED,
        "unexpected status: {}",
        res.status()
    );
    Ok(())
}
