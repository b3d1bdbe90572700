//! Auth route handlers.
//!
//! Sign-in is delegated to the identity provider's hosted login. The
//! storefront only redirects out, verifies the returned token, and keeps a
//! session.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use rand::Rng;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use larkspur_store::UserRepository;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::auth::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Callback query parameters from the hosted login.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub token: Option<String>,
    pub state: Option<String>,
}

/// Generate a random URL-safe state string.
fn random_state() -> String {
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::rng();
    (0..32)
        .map(|_| {
            let idx = rng.random_range(0..CHARS.len());
            char::from(CHARS[idx])
        })
        .collect()
}

/// Redirect to the provider's hosted login page.
#[instrument(skip(state, session))]
pub async fn login(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let login_state = random_state();
    session
        .insert(session_keys::LOGIN_STATE, &login_state)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    let redirect_uri = format!("{}/auth/callback", state.config().base_url);
    let url = state.identity().hosted_login_url(&redirect_uri, &login_state);

    Ok(Redirect::to(&url))
}

/// Handle the return from the hosted login.
///
/// Verifies the CSRF state, exchanges the token for a profile, refreshes the
/// local user mirror, and starts the session.
#[instrument(skip(state, session, query))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse> {
    let expected_state: Option<String> = session
        .remove(session_keys::LOGIN_STATE)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    if expected_state.is_none() || expected_state != query.state {
        return Err(AppError::BadRequest("login state mismatch".to_owned()));
    }

    let token = query
        .token
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("missing token".to_owned()))?;

    let profile = state.identity().verify_session_token(token).await?;

    let user = UserRepository::new(state.pool())
        .upsert_from_identity(&profile)
        .await?;

    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "user signed in");

    Ok(Redirect::to("/account"))
}

/// Log out and clear the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<impl IntoResponse> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();

    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_state_shape() {
        let state = random_state();
        assert_eq!(state.len(), 32);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_state_unique() {
        assert_ne!(random_state(), random_state());
    }
}
