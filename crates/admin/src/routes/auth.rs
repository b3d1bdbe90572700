//! Admin auth route handlers.
//!
//! Same hosted-login flow as the storefront, with one extra gate: the
//! verified profile must carry the admin role or the session is refused.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use rand::Rng;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use larkspur_core::UserRole;
use larkspur_store::UserRepository;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::auth::{clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Callback query parameters from the hosted login.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub token: Option<String>,
    pub state: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {}

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

/// Display the login page.
#[instrument]
pub async fn login_page() -> LoginTemplate {
    LoginTemplate {}
}

/// Redirect to the provider's hosted login page.
#[instrument(skip(state, session))]
pub async fn start(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
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

    if profile.role != UserRole::Admin {
        tracing::warn!(external_id = %profile.external_id, "non-admin sign-in attempt on admin panel");
        return Err(AppError::Forbidden("admin role required".to_owned()));
    }

    let user = UserRepository::new(state.pool())
        .upsert_from_identity(&profile)
        .await?;

    let admin = CurrentAdmin {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
    };
    set_current_admin(&session, &admin)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    set_sentry_user(user.id.as_i32(), Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "admin signed in");

    Ok(Redirect::to("/"))
}

/// Log out and clear the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<impl IntoResponse> {
    clear_current_admin(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();

    Ok(Redirect::to("/auth/login"))
}
