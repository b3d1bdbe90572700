//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use larkspur_store::models::DashboardCounts;
use larkspur_store::{MessageRepository, OrderRequestRepository, UserRepository};

use larkspur_core::OrderStatus;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::orders::OrderRow;
use crate::state::AppState;

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_name: String,
    pub counts: DashboardCounts,
    pub pending_orders: Vec<OrderRow>,
    pub unread_conversations: usize,
}

/// Display the dashboard.
#[instrument(skip(state, admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let counts = UserRepository::new(state.pool()).dashboard_counts().await?;

    let pending = OrderRequestRepository::new(state.pool())
        .list_all(Some(OrderStatus::Pending))
        .await?;

    let inbox = MessageRepository::new(state.pool()).inbox().await?;
    let unread_conversations = inbox.iter().filter(|c| c.unread_count > 0).count();

    Ok(DashboardTemplate {
        admin_name: admin.name,
        counts,
        pending_orders: pending.iter().take(10).map(OrderRow::from).collect(),
        unread_conversations,
    })
}
