//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use larkspur_core::Slug;
use larkspur_store::models::{Product, ProductFilter, ProductImage, ProductSort};
use larkspur_store::ProductRepository;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalUser;
use crate::state::AppState;

/// Products per page for listing views.
pub const PRODUCTS_PER_PAGE: i64 = 12;

/// Image display data for templates.
#[derive(Debug, Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub slug: String,
    pub title: String,
    pub description: String,
    /// Effective price, formatted ("$19.99").
    pub price: String,
    /// List price, formatted, when a discount is active.
    pub original_price: Option<String>,
    pub featured: bool,
    pub is_popular: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let effective = product.effective_price();
        let original_price = product
            .discount_percent
            .map(|_| product.list_price().display());

        Self {
            slug: product.slug.to_string(),
            title: product.title.clone(),
            description: product.description.clone(),
            price: effective.display(),
            original_price,
            featured: product.featured,
            is_popular: product.is_popular,
        }
    }
}

/// Pagination and sorting query parameters.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub page: Option<u32>,
    pub sort: Option<String>,
    /// "1" restricts the listing to featured products.
    pub featured: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
    pub current_page: u32,
    pub total_pages: u32,
    pub sort: String,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
    pub images: Vec<ImageView>,
    pub category_name: String,
    pub category_slug: String,
    pub is_favorite: bool,
    pub signed_in: bool,
}

/// Compute page count from a total and page size.
pub fn page_count(total: i64, per_page: i64) -> u32 {
    let pages = (total + per_page - 1) / per_page.max(1);
    u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
}

/// Display the product listing page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let current_page = query.page.unwrap_or(1).max(1);
    let sort = ProductSort::parse(query.sort.as_deref().unwrap_or(""));

    let filter = ProductFilter {
        featured: (query.featured.as_deref() == Some("1")).then_some(true),
        sort,
        limit: PRODUCTS_PER_PAGE,
        offset: i64::from(current_page - 1) * PRODUCTS_PER_PAGE,
        ..ProductFilter::default()
    };

    let repo = ProductRepository::new(state.pool());
    let products = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(ProductsIndexTemplate {
        products: products.iter().map(ProductView::from).collect(),
        current_page,
        total_pages: page_count(total, PRODUCTS_PER_PAGE),
        sort: sort.as_str().to_string(),
    })
}

/// Display the product detail page.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let slug = Slug::parse(&slug).map_err(|_| AppError::NotFound(format!("product {slug}")))?;

    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    let images = repo.list_images(product.id).await?;

    // The category is shown as a breadcrumb; fall back to the raw tree
    // rather than a second query.
    let tree = state.category_tree().await?;
    let (category_name, category_slug) = tree
        .flatten()
        .into_iter()
        .find(|c| c.id == product.category_id)
        .map_or_else(
            || (String::new(), String::new()),
            |c| (c.name, c.slug.to_string()),
        );

    let is_favorite = match &user {
        Some(user) => {
            larkspur_store::FavoriteRepository::new(state.pool())
                .contains(user.id, product.id)
                .await?
        }
        None => false,
    };

    Ok(ProductShowTemplate {
        product: ProductView::from(&product),
        images: images.iter().map(image_view).collect(),
        category_name,
        category_slug,
        is_favorite,
        signed_in: user.is_some(),
    })
}

fn image_view(image: &ProductImage) -> ImageView {
    ImageView {
        url: image.url.clone(),
        alt: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 12), 1);
        assert_eq!(page_count(1, 12), 1);
        assert_eq!(page_count(12, 12), 1);
        assert_eq!(page_count(13, 12), 2);
        assert_eq!(page_count(25, 12), 3);
    }
}
