//! HTTP route handlers for the admin panel.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Dashboard
//! GET  /                       - Dashboard overview
//!
//! # Auth (hosted login at the identity provider, admin role required)
//! GET  /auth/login             - Login page
//! GET  /auth/start             - Redirect to hosted login
//! GET  /auth/callback          - Verify returned token, start session
//! POST /auth/logout            - Logout
//!
//! # Products
//! GET  /products               - Product listing
//! GET  /products/new           - New product form
//! POST /products               - Create product
//! GET  /products/{id}/edit     - Edit form (with images)
//! POST /products/{id}          - Update product
//! POST /products/{id}/delete   - Delete product (cascade + media destroy)
//! POST /products/{id}/images   - Upload an image (multipart)
//! POST /products/{id}/images/{image_id}/delete - Remove an image
//!
//! # Categories
//! GET  /categories             - Tree view + create form
//! POST /categories             - Create category
//! GET  /categories/{id}/edit   - Edit form (re-parent select)
//! POST /categories/{id}        - Update category (cycle-checked)
//! POST /categories/{id}/delete - Delete category (refused while non-empty)
//!
//! # Order requests
//! GET  /orders                 - Listing, filter by status
//! GET  /orders/{id}            - Detail
//! POST /orders/{id}/status     - Transition (approve/reject/deliver/cancel)
//!
//! # Messages
//! GET  /messages               - Inbox grouped by customer
//! GET  /messages/{customer_id} - Conversation (marks read)
//! POST /messages/{customer_id} - Reply
//!
//! # Users
//! GET  /users                  - User listing
//! POST /users/{id}/role        - Promote/demote (provider first, then mirror)
//! POST /users/{id}/delete      - Delete at provider and locally
//!
//! # Webhooks (signature-verified, no session)
//! POST /webhooks/identity      - Identity provider event feed
//! ```

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod messages;
pub mod orders;
pub mod products;
pub mod users;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page))
        .route("/start", get(auth::start))
        .route("/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new_form))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit_form))
        .route("/{id}/delete", post(products::delete))
        .route("/{id}/images", post(products::upload_image))
        .route("/{id}/images/{image_id}/delete", post(products::delete_image))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/{id}", post(categories::update))
        .route("/{id}/edit", get(categories::edit_form))
        .route("/{id}/delete", post(categories::delete))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::transition))
}

/// Create the message routes router.
pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(messages::inbox))
        .route("/{customer_id}", get(messages::show).post(messages::reply))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route("/{id}/role", post(users::set_role))
        .route("/{id}/delete", post(users::delete))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/orders", order_routes())
        .nest("/messages", message_routes())
        .nest("/users", user_routes())
        .route("/webhooks/identity", post(webhooks::receive))
}
