//! Identity provider client (verification side).
//!
//! The storefront never sees credentials. Sign-in happens on the provider's
//! hosted pages; the browser comes back with a one-time session token that
//! this client exchanges for the user's profile.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use larkspur_core::{Email, UserRole};
use larkspur_store::models::IdentityProfile;

use crate::config::IdentityConfig;

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

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Client for the identity provider's verification API.
#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    issuer_url: String,
    publishable_key: String,
}

/// Provider user payload, shared by token verification and the admin API.
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

impl IdentityClient {
    /// Create a new identity client.
    ///
    /// # Panics
    ///
    /// Panics if the API key contains bytes that cannot appear in an HTTP
    /// header, which `from_env` validation already rules out.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
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
    ///
    /// `redirect_uri` is where the provider sends the browser back with a
    /// `token` query parameter; `state` is echoed for CSRF checking.
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn provider_user(role: Option<&str>) -> ProviderUser {
        ProviderUser {
            id: "user_123".to_string(),
            email: "maker@example.com".to_string(),
            name: "Maker".to_string(),
            role: role.map(String::from),
        }
    }

    #[test]
    fn test_profile_roles() {
        assert_eq!(
            profile_from_provider(provider_user(Some("admin"))).unwrap().role,
            UserRole::Admin
        );
        assert_eq!(
            profile_from_provider(provider_user(Some("customer"))).unwrap().role,
            UserRole::Customer
        );
        assert_eq!(
            profile_from_provider(provider_user(None)).unwrap().role,
            UserRole::Customer
        );
    }

    #[test]
    fn test_profile_falls_back_to_email_local_part() {
        let mut user = provider_user(None);
        user.name = "  ".to_string();
        let profile = profile_from_provider(user).unwrap();
        assert_eq!(profile.name, "maker");
    }

    #[test]
    fn test_profile_rejects_bad_email() {
        let mut user = provider_user(None);
        user.email = "not-an-email".to_string();
        assert!(matches!(
            profile_from_provider(user),
            Err(IdentityError::Parse(_))
        ));
    }

    #[test]
    fn test_hosted_login_url_encodes_params() {
        let config = IdentityConfig {
            issuer_url: "https://id.test/".to_string(),
            publishable_key: "pk_test".to_string(),
            api_key: secrecy::SecretString::from("sk_test"),
        };
        let client = IdentityClient::new(&config);
        let url = client.hosted_login_url("https://shop.test/auth/callback", "abc/123");

        assert!(url.starts_with("https://id.test/login?"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fshop.test%2Fauth%2Fcallback"));
        assert!(url.contains("state=abc%2F123"));
    }
}
