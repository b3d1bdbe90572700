//! Domain models as persisted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use larkspur_core::{
    CategoryId, CurrencyCode, Email, MessageId, OrderRequestId, OrderStatus, Price, ProductId,
    ProductImageId, Slug, UserId, UserRole,
};

/// A product category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub parent_id: Option<CategoryId>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub name: String,
    pub slug: Slug,
    pub parent_id: Option<CategoryId>,
    pub description: Option<String>,
}

/// Fields for updating a category (all replaced).
#[derive(Debug, Clone)]
pub struct UpdateCategory {
    pub name: String,
    pub slug: Slug,
    pub parent_id: Option<CategoryId>,
    pub description: Option<String>,
}

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub slug: Slug,
    pub description: String,
    pub price: Decimal,
    /// Percentage off (0-100), if a discount is active.
    pub discount_percent: Option<Decimal>,
    pub category_id: CategoryId,
    pub featured: bool,
    pub is_popular: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// List price as a [`Price`].
    #[must_use]
    pub const fn list_price(&self) -> Price {
        Price::new(self.price, CurrencyCode::USD)
    }

    /// Price after any active discount.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        match self.discount_percent {
            Some(percent) => self.list_price().discounted(percent),
            None => self.list_price(),
        }
    }
}

/// Fields for creating a product.
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub title: String,
    pub slug: Slug,
    pub description: String,
    pub price: Decimal,
    pub discount_percent: Option<Decimal>,
    pub category_id: CategoryId,
    pub featured: bool,
    pub is_popular: bool,
}

/// Fields for updating a product (all replaced).
#[derive(Debug, Clone)]
pub struct UpdateProduct {
    pub title: String,
    pub slug: Slug,
    pub description: String,
    pub price: Decimal,
    pub discount_percent: Option<Decimal>,
    pub category_id: CategoryId,
    pub featured: bool,
    pub is_popular: bool,
}

/// An image attached to a product, stored on the media service.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: ProductImageId,
    pub product_id: ProductId,
    /// The media service's identifier, needed to destroy the asset.
    pub media_public_id: String,
    /// Delivery URL.
    pub url: String,
    pub position: i32,
}

/// Filter and paging options for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Restrict to these categories (a category plus its descendants).
    pub category_ids: Option<Vec<CategoryId>>,
    pub featured: Option<bool>,
    pub is_popular: Option<bool>,
    pub sort: ProductSort,
    pub limit: i64,
    pub offset: i64,
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Title,
}

impl ProductSort {
    /// Parse from a URL parameter value.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "price-ascending" | "price_asc" => Self::PriceAsc,
            "price-descending" | "price_desc" => Self::PriceDesc,
            "title" => Self::Title,
            _ => Self::Newest,
        }
    }

    /// Convert to a URL parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price-ascending",
            Self::PriceDesc => "price-descending",
            Self::Title => "title",
        }
    }
}

/// A local user, mirrored from the identity provider.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    /// The identity provider's id for this user.
    pub external_id: String,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields pushed by the identity provider (webhook or token verify).
#[derive(Debug, Clone)]
pub struct IdentityProfile {
    pub external_id: String,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
}

/// A message between a customer and the shop.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// An admin-inbox conversation summary (one per customer).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ConversationSummary {
    pub customer_id: UserId,
    pub customer_name: String,
    pub customer_email: Email,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i64,
}

/// A customer-submitted purchase intent requiring admin review.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderRequest {
    pub id: OrderRequestId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub delivery_fee: Decimal,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order request joined with product and customer display fields.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderRequestDetail {
    pub id: OrderRequestId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub delivery_fee: Decimal,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub product_title: String,
    pub product_slug: Slug,
    pub customer_name: String,
    pub customer_email: Email,
}

/// Entity counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DashboardCounts {
    pub products: i64,
    pub categories: i64,
    pub users: i64,
    pub pending_orders: i64,
    pub unread_messages: i64,
}
