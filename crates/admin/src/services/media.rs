//! Media service client.
//!
//! Product images live on a cloud media service. Uploads go up as multipart
//! form data; destructive calls carry an HMAC-SHA256 signature over the
//! sorted request parameters plus a timestamp, hex-encoded.

use hmac::{Hmac, Mac};
use reqwest::multipart;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use crate::config::MediaConfig;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur when talking to the media service.
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A stored asset as reported by the media service.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaAsset {
    /// The service's identifier, needed later to destroy the asset.
    pub public_id: String,
    /// Delivery URL.
    pub url: String,
}

/// Client for the media service API.
#[derive(Clone)]
pub struct MediaClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    api_secret: SecretString,
}

impl MediaClient {
    /// Create a new media client.
    #[must_use]
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    /// Upload image bytes, returning the stored asset.
    ///
    /// # Errors
    ///
    /// Returns a [`MediaError`] if the upload is rejected or the response
    /// cannot be parsed.
    pub async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<MediaAsset, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("timestamp", timestamp.as_str())],
            self.api_secret.expose_secret(),
        );

        let form = multipart::Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .part(
                "file",
                multipart::Part::bytes(bytes).file_name(filename.to_owned()),
            );

        let response = self
            .client
            .post(format!("{}/v1/upload", self.api_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<MediaAsset>()
            .await
            .map_err(|e| MediaError::Parse(e.to_string()))
    }

    /// Destroy a stored asset.
    ///
    /// # Errors
    ///
    /// Returns a [`MediaError`] if the service rejects the request. A missing
    /// asset is not an error; the goal state is "gone".
    pub async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", timestamp.as_str())],
            self.api_secret.expose_secret(),
        );

        let response = self
            .client
            .post(format!("{}/v1/destroy", self.api_url))
            .form(&[
                ("api_key", self.api_key.as_str()),
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Hex HMAC-SHA256 over `key=value` pairs sorted by key and joined with `&`.
fn sign_params(params: &[(&str, &str)], secret: &str) -> String {
    let mut pairs: Vec<(&str, &str)> = params.to_vec();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let message: String = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_params_is_deterministic() {
        let a = sign_params(&[("timestamp", "100")], "secret-key");
        let b = sign_params(&[("timestamp", "100")], "secret-key");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64); // hex sha256
    }

    #[test]
    fn test_sign_params_order_independent() {
        let a = sign_params(&[("public_id", "x"), ("timestamp", "100")], "k");
        let b = sign_params(&[("timestamp", "100"), ("public_id", "x")], "k");
        assert_eq!(a, b);
    }

    #[test]
    fn test_sign_params_varies_with_inputs() {
        let base = sign_params(&[("timestamp", "100")], "k");
        assert_ne!(base, sign_params(&[("timestamp", "101")], "k"));
        assert_ne!(base, sign_params(&[("timestamp", "100")], "other"));
    }
}
