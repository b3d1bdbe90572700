//! Order-request route handlers (review side).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use larkspur_core::{OrderRequestId, OrderStatus};
use larkspur_store::OrderRequestRepository;
use larkspur_store::models::OrderRequestDetail;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Order-request row for tables.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: i32,
    pub product_title: String,
    pub customer_name: String,
    pub customer_email: String,
    pub quantity: i32,
    pub total: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&OrderRequestDetail> for OrderRow {
    fn from(order: &OrderRequestDetail) -> Self {
        Self {
            id: order.id.as_i32(),
            product_title: order.product_title.clone(),
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.to_string(),
            quantity: order.quantity,
            total: format!("${}", order.total_price.round_dp(2)),
            status: order.status.to_string(),
            created_at: order.created_at,
        }
    }
}

/// Listing filter query parameters.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
}

/// Status transition form body.
#[derive(Debug, Deserialize)]
pub struct TransitionForm {
    pub status: String,
}

/// Order listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub orders: Vec<OrderRow>,
    pub status_filter: String,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub order: OrderRow,
    pub product_slug: String,
    pub unit_price: String,
    pub delivery_fee: String,
    pub note: Option<String>,
    pub can_approve: bool,
    pub can_reject: bool,
    pub can_deliver: bool,
    pub can_cancel: bool,
}

/// List order requests, optionally filtered by status.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse> {
    let status = match query.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(s) => Some(s.parse::<OrderStatus>().map_err(AppError::BadRequest)?),
    };

    let orders = OrderRequestRepository::new(state.pool())
        .list_all(status)
        .await?;

    Ok(OrdersIndexTemplate {
        orders: orders.iter().map(OrderRow::from).collect(),
        status_filter: status.map_or_else(|| "all".to_owned(), |s| s.to_string()),
    })
}

/// Display one order request.
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let order = OrderRequestRepository::new(state.pool())
        .get_detail(OrderRequestId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order request {id}")))?;

    let status = order.status;
    Ok(OrderShowTemplate {
        product_slug: order.product_slug.to_string(),
        unit_price: format!("${}", order.unit_price.round_dp(2)),
        delivery_fee: format!("${}", order.delivery_fee.round_dp(2)),
        note: order.note.clone(),
        can_approve: status.can_transition_to(OrderStatus::Approved),
        can_reject: status.can_transition_to(OrderStatus::Rejected),
        can_deliver: status.can_transition_to(OrderStatus::Delivered),
        can_cancel: status.can_transition_to(OrderStatus::Cancelled),
        order: OrderRow::from(&order),
    })
}

/// Move an order request to a new status.
#[instrument(skip(state, _admin, form))]
pub async fn transition(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<i32>,
    Form(form): Form<TransitionForm>,
) -> Result<impl IntoResponse> {
    let next = form
        .status
        .parse::<OrderStatus>()
        .map_err(AppError::BadRequest)?;

    let order = OrderRequestRepository::new(state.pool())
        .transition(OrderRequestId::new(id), next)
        .await?;

    tracing::info!(order_id = %order.id, status = %order.status, "order request transitioned");

    Ok(Redirect::to(&format!("/orders/{id}")))
}
