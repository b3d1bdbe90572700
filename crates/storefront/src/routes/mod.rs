//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//!
//! # Catalog
//! GET  /products               - Product listing
//! GET  /products/{slug}        - Product detail
//! GET  /categories             - Category grid
//! GET  /categories/{slug}      - Category detail (subtree products)
//! GET  /api/categories/tree    - Category tree as JSON
//!
//! # Search
//! GET  /search                 - Full search page
//! GET  /search/suggest         - Type-ahead fragment (HTMX)
//!
//! # Navigation fragments (HTMX)
//! GET  /partials/nav           - Category menu
//! GET  /partials/footer        - Footer category links
//!
//! # Auth (hosted login at the identity provider)
//! GET  /auth/login             - Redirect to hosted login
//! GET  /auth/callback          - Verify returned token, start session
//! POST /auth/logout            - Logout action
//!
//! # Account (requires auth)
//! GET  /account                - Account overview
//! GET  /account/orders         - Own order requests
//! POST /account/orders         - Create an order request
//! POST /account/orders/{id}/cancel - Cancel an own pending request
//! GET  /account/favorites      - Favorite products
//! POST /account/favorites/{slug}   - Add favorite
//! POST /account/favorites/{slug}/remove - Remove favorite
//! GET  /account/messages       - Own conversation with the shop
//! POST /account/messages       - Send a message to the shop
//! ```

pub mod account;
pub mod auth;
pub mod categories;
pub mod home;
pub mod messages;
pub mod orders;
pub mod products;
pub mod search;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{slug}", get(categories::show))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(orders::index).post(orders::create))
        .route("/orders/{id}/cancel", post(orders::cancel))
        .route("/favorites", get(account::favorites))
        .route("/favorites/{slug}", post(account::add_favorite))
        .route("/favorites/{slug}/remove", post(account::remove_favorite))
        .route("/messages", get(messages::index).post(messages::send))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .route("/api/categories/tree", get(categories::tree_json))
        // Search
        .merge(search::router())
        // Navigation fragments
        .route("/partials/nav", get(categories::nav_fragment))
        .route("/partials/footer", get(categories::footer_fragment))
        // Account
        .nest("/account", account_routes())
        // Auth
        .nest("/auth", auth_routes())
}
