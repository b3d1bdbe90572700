//! Account route handlers (overview, favorites).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use tracing::instrument;

use larkspur_core::Slug;
use larkspur_store::{FavoriteRepository, MessageRepository, OrderRequestRepository, ProductRepository};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireUser;
use crate::routes::products::ProductView;
use crate::state::AppState;

/// Account overview template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub name: String,
    pub email: String,
    pub order_count: usize,
    pub favorite_count: usize,
    pub unread_messages: i64,
}

/// Favorites page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/favorites.html")]
pub struct FavoritesTemplate {
    pub products: Vec<ProductView>,
}

/// Display the account overview.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse> {
    let orders = OrderRequestRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    let favorites = FavoriteRepository::new(state.pool())
        .list_products(user.id)
        .await?;
    let unread_messages = MessageRepository::new(state.pool())
        .unread_count_for(user.id)
        .await?;

    Ok(AccountIndexTemplate {
        name: user.name,
        email: user.email.to_string(),
        order_count: orders.len(),
        favorite_count: favorites.len(),
        unread_messages,
    })
}

/// Display the favorites page.
#[instrument(skip(state, user))]
pub async fn favorites(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse> {
    let products = FavoriteRepository::new(state.pool())
        .list_products(user.id)
        .await?;

    Ok(FavoritesTemplate {
        products: products.iter().map(ProductView::from).collect(),
    })
}

/// Add a product to the favorites, then return to its page.
#[instrument(skip(state, user))]
pub async fn add_favorite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let slug = Slug::parse(&slug).map_err(|_| AppError::NotFound(format!("product {slug}")))?;
    let product = ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    FavoriteRepository::new(state.pool())
        .add(user.id, product.id)
        .await?;

    Ok(Redirect::to(&format!("/products/{slug}")))
}

/// Remove a product from the favorites, then return to the favorites page.
#[instrument(skip(state, user))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let slug = Slug::parse(&slug).map_err(|_| AppError::NotFound(format!("product {slug}")))?;
    let product = ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    FavoriteRepository::new(state.pool())
        .remove(user.id, product.id)
        .await?;

    Ok(Redirect::to("/account/favorites"))
}
