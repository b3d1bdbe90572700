//! Integration tests for the identity webhook receiver.
//!
//! These tests require:
//! - A running admin server (cargo run -p larkspur-admin)
//! - `IDENTITY_WEBHOOK_SECRET` in the environment, matching the server's
//!
//! Run with: cargo test -p larkspur-integration-tests -- --ignored

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use sha2::Sha256;

use larkspur_integration_tests::{admin_base_url, client};

type HmacSha256 = Hmac<Sha256>;

fn webhook_secret() -> String {
    std::env::var("IDENTITY_WEBHOOK_SECRET").expect("IDENTITY_WEBHOOK_SECRET must be set")
}

fn sign(secret: &str, id: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(format!("{id}.{timestamp}.").as_bytes());
    mac.update(body);
    format!("v1,{}", BASE64.encode(mac.finalize().into_bytes()))
}

#[tokio::test]
#[ignore = "Requires running admin server and webhook secret"]
async fn test_signed_user_created_event_is_accepted() {
    let client = client();
    let base_url = admin_base_url();
    let secret = webhook_secret();

    let body = serde_json::json!({
        "type": "user.created",
        "data": {
            "id": "user_webhook_test",
            "email": "webhook-test@example.com",
            "name": "Webhook Test",
            "role": "customer"
        }
    })
    .to_string();

    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = sign(&secret, "msg_test_1", &timestamp, body.as_bytes());

    let resp = client
        .post(format!("{base_url}/webhooks/identity"))
        .header("webhook-id", "msg_test_1")
        .header("webhook-timestamp", timestamp)
        .header("webhook-signature", signature)
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .expect("Failed to post webhook");

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running admin server and webhook secret"]
async fn test_unsigned_event_is_rejected() {
    let client = client();
    let base_url = admin_base_url();

    let resp = client
        .post(format!("{base_url}/webhooks/identity"))
        .header("content-type", "application/json")
        .body(r#"{"type":"user.created","data":{"id":"x","email":"x@y.z"}}"#)
        .send()
        .await
        .expect("Failed to post webhook");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server and webhook secret"]
async fn test_tampered_body_is_rejected() {
    let client = client();
    let base_url = admin_base_url();
    let secret = webhook_secret();

    let signed_body = r#"{"type":"user.created","data":{"id":"a","email":"a@b.c"}}"#;
    let sent_body = r#"{"type":"user.deleted","data":{"id":"a","email":"a@b.c"}}"#;

    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = sign(&secret, "msg_test_2", &timestamp, signed_body.as_bytes());

    let resp = client
        .post(format!("{base_url}/webhooks/identity"))
        .header("webhook-id", "msg_test_2")
        .header("webhook-timestamp", timestamp)
        .header("webhook-signature", signature)
        .header("content-type", "application/json")
        .body(sent_body)
        .send()
        .await
        .expect("Failed to post webhook");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
