//! Message route handlers (shop side of the conversations).

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

use larkspur_core::UserId;
use larkspur_store::models::{ConversationSummary, Message};
use larkspur_store::{MessageRepository, UserRepository};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Inbox row for the conversation list.
#[derive(Debug, Clone)]
pub struct InboxRow {
    pub customer_id: i32,
    pub customer_name: String,
    pub customer_email: String,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i64,
}

impl From<&ConversationSummary> for InboxRow {
    fn from(summary: &ConversationSummary) -> Self {
        Self {
            customer_id: summary.customer_id.as_i32(),
            customer_name: summary.customer_name.clone(),
            customer_email: summary.customer_email.to_string(),
            last_message_at: summary.last_message_at,
            unread_count: summary.unread_count,
        }
    }
}

/// Message display data.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub content: String,
    pub from_customer: bool,
    pub created_at: DateTime<Utc>,
}

/// Reply form body.
#[derive(Debug, Deserialize)]
pub struct ReplyForm {
    pub content: String,
}

/// Inbox page template.
#[derive(Template, WebTemplate)]
#[template(path = "messages/index.html")]
pub struct InboxTemplate {
    pub conversations: Vec<InboxRow>,
}

/// Conversation page template.
#[derive(Template, WebTemplate)]
#[template(path = "messages/show.html")]
pub struct ConversationTemplate {
    pub customer_id: i32,
    pub customer_name: String,
    pub messages: Vec<MessageView>,
}

/// Display the inbox, one row per customer.
#[instrument(skip(state, _admin))]
pub async fn inbox(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse> {
    let conversations = MessageRepository::new(state.pool()).inbox().await?;

    Ok(InboxTemplate {
        conversations: conversations.iter().map(InboxRow::from).collect(),
    })
}

/// Display a conversation and mark the customer's messages read.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(customer_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let customer_id = UserId::new(customer_id);
    let customer = UserRepository::new(state.pool())
        .get_by_id(customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {customer_id}")))?;

    let repo = MessageRepository::new(state.pool());
    let messages = repo.conversation(customer_id).await?;
    repo.mark_conversation_read(customer_id).await?;

    Ok(ConversationTemplate {
        customer_id: customer_id.as_i32(),
        customer_name: customer.name,
        messages: messages
            .iter()
            .map(|m| message_view(m, customer_id))
            .collect(),
    })
}

/// Reply to a customer.
#[instrument(skip(state, admin, form))]
pub async fn reply(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(customer_id): Path<i32>,
    Form(form): Form<ReplyForm>,
) -> Result<impl IntoResponse> {
    let content = form.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("message cannot be empty".to_owned()));
    }

    MessageRepository::new(state.pool())
        .create(admin.id, UserId::new(customer_id), content)
        .await?;

    Ok(Redirect::to(&format!("/messages/{customer_id}")))
}

fn message_view(message: &Message, customer_id: UserId) -> MessageView {
    MessageView {
        content: message.content.clone(),
        from_customer: message.sender_id == customer_id,
        created_at: message.created_at,
    }
}
