//! Identity provider client (user-management side).
//!
//! The admin panel can verify hosted-login tokens (like the storefront) and
//! additionally change user roles and delete users at the provider. The
//! local `shop.user` mirror always follows what the provider confirms.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use larkspur_core::{Email, UserRole};
use larkspur_store::models::IdentityProfile;

use crate::config::IdentityAdminConfig;

/// Errors that can occur when talking to the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The session token was rejected.
    #[error("session token rejected")]
    InvalidToken,

    /// The provider does not know this user.
    #[error("user not found at provider: {0}")]
    UserNotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Client for the identity provider's admin API.
#[derive(Clone)]
pub struct IdentityAdminClient {
    client: reqwest::Client,
    issuer_url: String,
    publishable_key: String,
}

/// Provider user payload.
#[derive(Debug, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// Role claim from the provider's metadata; absent means customer.
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    user: ProviderUser,
}

impl IdentityAdminClient {
    /// Create a new identity admin client.
    ///
    /// # Panics
    ///
    /// Panics if the API key contains bytes that cannot appear in an HTTP
    /// header, which `from_env` validation already rules out.
    #[must_use]
    pub fn new(config: &IdentityAdminConfig) -> Self {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value).expect("API key is valid header material"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("reqwest client with static config");

        Self {
            client,
            issuer_url: config.issuer_url.trim_end_matches('/').to_owned(),
            publishable_key: config.publishable_key.clone(),
        }
    }

    /// URL of the provider's hosted login page.
    #[must_use]
    pub fn hosted_login_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}/login?publishable_key={}&redirect_uri={}&state={}",
            self.issuer_url,
            urlencoding::encode(&self.publishable_key),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
        )
    }

    /// Exchange a callback token for the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidToken`] if the provider rejects the
    /// token, and other variants for transport or parse failures.
    pub async fn verify_session_token(&self, token: &str) -> Result<IdentityProfile, IdentityError> {
        let url = format!("{}/v1/sessions/verify", self.issuer_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::InvalidToken);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let verified: VerifyResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        profile_from_provider(verified.user)
    }

    /// Write a role into the user's provider metadata.
    ///
    /// The webhook that follows keeps other replicas in sync; callers still
    /// update the local mirror immediately so the panel reflects the change.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UserNotFound`] if the provider does not know
    /// the user.
    pub async fn set_role(&self, external_id: &str, role: UserRole) -> Result<(), IdentityError> {
        let url = format!(
            "{}/v1/users/{}/metadata",
            self.issuer_url,
            urlencoding::encode(external_id)
        );

        let response = self
            .client
            .patch(&url)
            .json(&serde_json::json!({ "role": role.to_string() }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::UserNotFound(external_id.to_owned()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    /// Delete a user at the provider.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UserNotFound`] if the provider does not know
    /// the user.
    pub async fn delete_user(&self, external_id: &str) -> Result<(), IdentityError> {
        let url = format!(
            "{}/v1/users/{}",
            self.issuer_url,
            urlencoding::encode(external_id)
        );

        let response = self.client.delete(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::UserNotFound(external_id.to_owned()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Convert a provider user payload into the local mirror shape.
///
/// # Errors
///
/// Returns [`IdentityError::Parse`] if the email is malformed.
pub fn profile_from_provider(user: ProviderUser) -> Result<IdentityProfile, IdentityError> {
    let email = Email::parse(&user.email)
        .map_err(|e| IdentityError::Parse(format!("invalid email from provider: {e}")))?;

    let role = match user.role.as_deref() {
        Some("admin") => UserRole::Admin,
        _ => UserRole::Customer,
    };

    let name = if user.name.trim().is_empty() {
        email.local_part().to_owned()
    } else {
        user.name
    };

    Ok(IdentityProfile {
        external_id: user.id,
        email,
        name,
        role,
    })
}
