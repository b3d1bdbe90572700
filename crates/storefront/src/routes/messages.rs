//! Message route handlers (customer side of the conversation).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use larkspur_store::models::Message;
use larkspur_store::{MessageRepository, UserRepository};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Message display data for templates.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub content: String,
    pub from_me: bool,
    pub created_at: DateTime<Utc>,
}

/// Conversation page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/messages.html")]
pub struct MessagesTemplate {
    pub messages: Vec<MessageView>,
}

/// Form body for sending a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageForm {
    pub content: String,
}

/// Display the signed-in user's conversation with the shop.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse> {
    let repo = MessageRepository::new(state.pool());
    let messages = repo.conversation(user.id).await?;

    // Opening the thread reads the replies
    repo.mark_received_read(user.id).await?;

    Ok(MessagesTemplate {
        messages: messages
            .iter()
            .map(|m| message_view(m, user.id.as_i32()))
            .collect(),
    })
}

/// Send a message to the shop.
#[instrument(skip(state, user, form))]
pub async fn send(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Form(form): Form<SendMessageForm>,
) -> Result<impl IntoResponse> {
    let content = form.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("message cannot be empty".to_owned()));
    }

    let admin = UserRepository::new(state.pool())
        .first_admin()
        .await?
        .ok_or_else(|| AppError::Internal("no admin account to receive messages".to_owned()))?;

    MessageRepository::new(state.pool())
        .create(user.id, admin.id, content)
        .await?;

    Ok(Redirect::to("/account/messages"))
}

fn message_view(message: &Message, my_id: i32) -> MessageView {
    MessageView {
        content: message.content.clone(),
        from_me: message.sender_id.as_i32() == my_id,
        created_at: message.created_at,
    }
}
