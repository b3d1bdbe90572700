//! Webhook receiver for identity-provider sync.
//!
//! The provider signs each delivery with HMAC-SHA256 over
//! `{id}.{timestamp}.{body}` using the shared webhook secret. The signature
//! header carries one or more `v1,<base64>` entries (older entries stick
//! around across secret rotations). Deliveries older than the tolerance are
//! rejected to blunt replays.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::Sha256;
use tracing::instrument;

use larkspur_store::UserRepository;

use crate::error::{AppError, Result};
use crate::services::identity::{ProviderUser, profile_from_provider};
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed clock skew between the delivery timestamp and now.
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Webhook event envelope.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: ProviderUser,
}

/// Errors detected while verifying a webhook delivery.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum WebhookError {
    #[error("missing header: {0}")]
    MissingHeader(&'static str),
    #[error("timestamp is not a number")]
    BadTimestamp,
    #[error("timestamp outside tolerance")]
    StaleTimestamp,
    #[error("no signature matched")]
    BadSignature,
}

/// Verify a delivery's signature and timestamp.
///
/// # Errors
///
/// Returns a [`WebhookError`] describing the first check that failed.
pub fn verify_delivery(
    secret: &str,
    id: &str,
    timestamp: &str,
    signature_header: &str,
    body: &[u8],
    now_unix: i64,
) -> std::result::Result<(), WebhookError> {
    let ts: i64 = timestamp.parse().map_err(|_| WebhookError::BadTimestamp)?;
    if (now_unix - ts).abs() > TIMESTAMP_TOLERANCE_SECS {
        return Err(WebhookError::StaleTimestamp);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(id.as_bytes());
    mac.update(b".");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);

    // The header may carry several space-separated versioned signatures
    for entry in signature_header.split_whitespace() {
        let Some(encoded) = entry.strip_prefix("v1,") else {
            continue;
        };
        let Ok(candidate) = BASE64.decode(encoded) else {
            continue;
        };
        // verify_slice is constant-time
        if mac.clone().verify_slice(&candidate).is_ok() {
            return Ok(());
        }
    }

    Err(WebhookError::BadSignature)
}

fn header<'h>(
    headers: &'h HeaderMap,
    name: &'static str,
) -> std::result::Result<&'h str, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingHeader(name))
}

/// Receive an identity-provider event.
///
/// Returns 204 for handled and ignored events alike, so the provider does
/// not retry events this version does not care about.
#[instrument(skip(state, headers, body))]
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let verification = (|| {
        let id = header(&headers, "webhook-id")?;
        let timestamp = header(&headers, "webhook-timestamp")?;
        let signature = header(&headers, "webhook-signature")?;
        verify_delivery(
            state.config().identity.webhook_secret.expose_secret(),
            id,
            timestamp,
            signature,
            &body,
            chrono::Utc::now().timestamp(),
        )
    })();

    if let Err(e) = verification {
        tracing::warn!(error = %e, "rejected webhook delivery");
        return Err(AppError::Unauthorized("invalid webhook signature".to_owned()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid webhook body: {e}")))?;

    let repo = UserRepository::new(state.pool());
    match event.kind.as_str() {
        "user.created" | "user.updated" => {
            let profile = profile_from_provider(event.data)
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            let user = repo.upsert_from_identity(&profile).await?;
            tracing::info!(user_id = %user.id, kind = %event.kind, "synced user from webhook");
        }
        "user.deleted" => {
            let deleted = repo.delete_by_external_id(&event.data.id).await?;
            tracing::info!(external_id = %event.data.id, deleted, "handled user deletion webhook");
        }
        other => {
            tracing::debug!(kind = %other, "ignoring webhook event");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "whk_0f8a31b2c4d5e6f7";

    fn sign(secret: &str, id: &str, timestamp: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{id}.{timestamp}.").as_bytes());
        mac.update(body);
        format!("v1,{}", BASE64.encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_valid_signature_passes() {
        let body = br#"{"type":"user.created"}"#;
        let header = sign(SECRET, "msg_1", "1000", body);
        assert_eq!(
            verify_delivery(SECRET, "msg_1", "1000", &header, body, 1000),
            Ok(())
        );
    }

    #[test]
    fn test_signature_over_wrong_body_fails() {
        let header = sign(SECRET, "msg_1", "1000", b"original");
        assert_eq!(
            verify_delivery(SECRET, "msg_1", "1000", &header, b"tampered", 1000),
            Err(WebhookError::BadSignature)
        );
    }

    #[test]
    fn test_wrong_secret_fails() {
        let body = b"payload";
        let header = sign("other-secret", "msg_1", "1000", body);
        assert_eq!(
            verify_delivery(SECRET, "msg_1", "1000", &header, body, 1000),
            Err(WebhookError::BadSignature)
        );
    }

    #[test]
    fn test_second_signature_entry_matches() {
        let body = b"payload";
        let good = sign(SECRET, "msg_1", "1000", body);
        let header = format!("v1,AAAA {good}");
        assert_eq!(
            verify_delivery(SECRET, "msg_1", "1000", &header, body, 1000),
            Ok(())
        );
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let body = b"payload";
        let header = sign(SECRET, "msg_1", "1000", body);
        assert_eq!(
            verify_delivery(SECRET, "msg_1", "1000", &header, body, 1000 + 301),
            Err(WebhookError::StaleTimestamp)
        );
        // Future-dated deliveries are just as suspect
        assert_eq!(
            verify_delivery(SECRET, "msg_1", "1000", &header, body, 1000 - 301),
            Err(WebhookError::StaleTimestamp)
        );
    }

    #[test]
    fn test_garbage_timestamp_rejected() {
        assert_eq!(
            verify_delivery(SECRET, "msg_1", "soon", "v1,AAAA", b"x", 0),
            Err(WebhookError::BadTimestamp)
        );
    }

    #[test]
    fn test_unversioned_entries_ignored() {
        let body = b"payload";
        // Correct MAC but missing the v1 prefix
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(b"msg_1.1000.payload");
        let bare = BASE64.encode(mac.finalize().into_bytes());
        assert_eq!(
            verify_delivery(SECRET, "msg_1", "1000", &bare, body, 1000),
            Err(WebhookError::BadSignature)
        );
    }
}
