//! Order-request route handlers (customer side).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use larkspur_core::pricing::OrderPricing;
use larkspur_core::{OrderRequestId, Slug};
use larkspur_store::models::OrderRequestDetail;
use larkspur_store::{OrderRequestRepository, ProductRepository};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Flat delivery fee applied to every order request.
///
/// The shop ships everything in one box; fee changes are a config knob for
/// a later day.
const DELIVERY_FEE_CENTS: i64 = 599;

/// Order request display data for templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: i32,
    pub product_title: String,
    pub product_slug: String,
    pub quantity: i32,
    pub total: String,
    pub status: String,
    pub is_pending: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&OrderRequestDetail> for OrderView {
    fn from(order: &OrderRequestDetail) -> Self {
        Self {
            id: order.id.as_i32(),
            product_title: order.product_title.clone(),
            product_slug: order.product_slug.to_string(),
            quantity: order.quantity,
            total: format!("${}", order.total_price.round_dp(2)),
            status: order.status.to_string(),
            is_pending: order.status == larkspur_core::OrderStatus::Pending,
            created_at: order.created_at,
        }
    }
}

/// Form body for creating an order request.
#[derive(Debug, Deserialize)]
pub struct CreateOrderForm {
    pub product: String,
    pub quantity: u32,
    #[serde(default)]
    pub note: String,
}

/// Own order requests page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub orders: Vec<OrderView>,
}

/// List the signed-in user's order requests.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse> {
    let orders = OrderRequestRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(OrdersTemplate {
        orders: orders.iter().map(OrderView::from).collect(),
    })
}

/// Create an order request from a product page.
///
/// The unit price is the product's current effective price; the total is
/// derived server-side.
#[instrument(skip(state, user, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Form(form): Form<CreateOrderForm>,
) -> Result<impl IntoResponse> {
    let slug = Slug::parse(&form.product)
        .map_err(|_| AppError::BadRequest("unknown product".to_owned()))?;

    let product = ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    let pricing = OrderPricing::new(
        product.effective_price().amount,
        form.quantity,
        Decimal::new(DELIVERY_FEE_CENTS, 2),
    )
    .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let note = form.note.trim();
    let order = OrderRequestRepository::new(state.pool())
        .create(
            user.id,
            product.id,
            pricing,
            (!note.is_empty()).then_some(note),
        )
        .await?;

    tracing::info!(order_id = %order.id, user_id = %user.id, "order request created");

    Ok(Redirect::to("/account/orders"))
}

/// Cancel an own pending order request.
#[instrument(skip(state, user))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    OrderRequestRepository::new(state.pool())
        .cancel_own(OrderRequestId::new(id), user.id)
        .await?;

    Ok(Redirect::to("/account/orders"))
}
