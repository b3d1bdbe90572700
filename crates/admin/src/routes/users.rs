//! User management route handlers.
//!
//! Role changes and deletions go to the identity provider first; the local
//! mirror only changes once the provider confirms. The provider's webhook
//! will land the same change again, which the upsert absorbs.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use larkspur_core::{UserId, UserRole};
use larkspur_store::UserRepository;
use larkspur_store::models::User;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// User row for tables.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_i32(),
            name: user.name.clone(),
            email: user.email.to_string(),
            role: user.role.to_string(),
            is_admin: user.role == UserRole::Admin,
            created_at: user.created_at,
        }
    }
}

/// Role change form body.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
}

/// Users page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub users: Vec<UserRow>,
}

/// List all users.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse> {
    let users = UserRepository::new(state.pool()).list_all().await?;

    Ok(UsersIndexTemplate {
        users: users.iter().map(UserRow::from).collect(),
    })
}

/// Promote or demote a user.
#[instrument(skip(state, admin, form))]
pub async fn set_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
    Form(form): Form<RoleForm>,
) -> Result<impl IntoResponse> {
    let id = UserId::new(id);
    let role: UserRole = form.role.parse().map_err(AppError::BadRequest)?;

    if id == admin.id && role != UserRole::Admin {
        return Err(AppError::BadRequest(
            "you cannot demote your own account".to_owned(),
        ));
    }

    let repo = UserRepository::new(state.pool());
    let user = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

    // Provider first; the mirror follows
    state.identity().set_role(&user.external_id, role).await?;
    repo.set_role(id, role).await?;

    tracing::info!(user_id = %id, role = %role, "user role changed");

    Ok(Redirect::to("/users"))
}

/// Delete a user at the provider and locally.
#[instrument(skip(state, admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = UserId::new(id);

    if id == admin.id {
        return Err(AppError::BadRequest(
            "you cannot delete your own account".to_owned(),
        ));
    }

    let repo = UserRepository::new(state.pool());
    let user = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

    state.identity().delete_user(&user.external_id).await?;
    repo.delete_by_external_id(&user.external_id).await?;

    tracing::info!(user_id = %id, "user deleted");

    Ok(Redirect::to("/users"))
}
