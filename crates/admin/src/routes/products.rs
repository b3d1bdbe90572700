//! Product management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use larkspur_core::{CategoryId, ProductId, ProductImageId, Slug};
use larkspur_store::models::{CreateProduct, Product, ProductFilter, ProductSort, UpdateProduct};
use larkspur_store::{CategoryRepository, ProductRepository};

use larkspur_core::category::CategoryTree;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::categories::CategoryRow;
use crate::state::AppState;

/// Products per page in the admin listing.
const PRODUCTS_PER_PAGE: i64 = 25;

/// Product row for tables.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub price: String,
    pub discount_percent: Option<String>,
    pub featured: bool,
    pub is_popular: bool,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            title: product.title.clone(),
            slug: product.slug.to_string(),
            price: product.list_price().display(),
            discount_percent: product.discount_percent.map(|d| format!("{d}%")),
            featured: product.featured,
            is_popular: product.is_popular,
        }
    }
}

/// Image row for the edit page.
#[derive(Debug, Clone)]
pub struct ImageRow {
    pub id: i32,
    pub url: String,
}

/// Category option for the form's parent select.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub id: i32,
    pub name: String,
    pub depth: usize,
    pub selected: bool,
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub page: Option<u32>,
    pub category: Option<i32>,
}

/// Product form body (create and update share it).
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount_percent: String,
    pub category_id: i32,
    #[serde(default)]
    pub featured: Option<String>,
    #[serde(default)]
    pub is_popular: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductRow>,
    pub categories: Vec<CategoryRow>,
    pub current_page: u32,
    pub total_pages: u32,
}

/// Product form page template (create and edit).
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    /// None for the create form.
    pub id: Option<i32>,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: String,
    pub discount_percent: String,
    pub featured: bool,
    pub is_popular: bool,
    pub categories: Vec<CategoryOption>,
    pub images: Vec<ImageRow>,
}

async fn category_rows(state: &AppState) -> Result<Vec<CategoryRow>> {
    let records = CategoryRepository::new(state.pool()).list_records().await?;
    let tree = CategoryTree::build(records).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(tree.flatten().iter().map(CategoryRow::from).collect())
}

async fn category_options(
    state: &AppState,
    selected: Option<CategoryId>,
) -> Result<Vec<CategoryOption>> {
    let records = CategoryRepository::new(state.pool()).list_records().await?;
    let tree = CategoryTree::build(records).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(tree
        .flatten()
        .iter()
        .map(|c| CategoryOption {
            id: c.id.as_i32(),
            name: c.name.clone(),
            depth: c.depth,
            selected: Some(c.id) == selected,
        })
        .collect())
}

fn parse_form(form: &ProductForm) -> Result<(String, Slug, String, Option<Decimal>)> {
    let title = form.title.trim().to_owned();
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".to_owned()));
    }

    let slug = if form.slug.trim().is_empty() {
        Slug::slugify(&title)
    } else {
        Slug::parse(form.slug.trim())
    }
    .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if form.price.is_sign_negative() {
        return Err(AppError::BadRequest("price must not be negative".to_owned()));
    }

    let discount = form.discount_percent.trim();
    let discount_percent = if discount.is_empty() {
        None
    } else {
        let value: Decimal = discount
            .parse()
            .map_err(|_| AppError::BadRequest("invalid discount".to_owned()))?;
        if value < Decimal::ZERO || value > Decimal::from(100) {
            return Err(AppError::BadRequest(
                "discount must be between 0 and 100".to_owned(),
            ));
        }
        Some(value)
    };

    Ok((title, slug, form.description.trim().to_owned(), discount_percent))
}

/// List products with paging and an optional category filter.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<ProductsQuery>,
) -> Result<impl IntoResponse> {
    let current_page = query.page.unwrap_or(1).max(1);

    let filter = ProductFilter {
        category_ids: query.category.map(|id| vec![CategoryId::new(id)]),
        sort: ProductSort::Newest,
        limit: PRODUCTS_PER_PAGE,
        offset: i64::from(current_page - 1) * PRODUCTS_PER_PAGE,
        ..ProductFilter::default()
    };

    let repo = ProductRepository::new(state.pool());
    let products = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total_pages = (((total + PRODUCTS_PER_PAGE - 1) / PRODUCTS_PER_PAGE).max(1)) as u32;

    Ok(ProductsIndexTemplate {
        products: products.iter().map(ProductRow::from).collect(),
        categories: category_rows(&state).await?,
        current_page,
        total_pages,
    })
}

/// Display the create form.
#[instrument(skip(state, _admin))]
pub async fn new_form(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse> {
    Ok(ProductFormTemplate {
        id: None,
        title: String::new(),
        slug: String::new(),
        description: String::new(),
        price: String::new(),
        discount_percent: String::new(),
        featured: false,
        is_popular: false,
        categories: category_options(&state, None).await?,
        images: Vec::new(),
    })
}

/// Create a product.
#[instrument(skip(state, _admin, form))]
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Form(form): Form<ProductForm>,
) -> Result<impl IntoResponse> {
    let (title, slug, description, discount_percent) = parse_form(&form)?;

    let product = ProductRepository::new(state.pool())
        .create(CreateProduct {
            title,
            slug,
            description,
            price: form.price,
            discount_percent,
            category_id: CategoryId::new(form.category_id),
            featured: form.featured.is_some(),
            is_popular: form.is_popular.is_some(),
        })
        .await?;

    tracing::info!(product_id = %product.id, "product created");

    Ok(Redirect::to(&format!("/products/{}/edit", product.id)))
}

/// Display the edit form with images.
#[instrument(skip(state, _admin))]
pub async fn edit_form(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get_by_id(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let images = repo.list_images(product.id).await?;

    Ok(ProductFormTemplate {
        id: Some(product.id.as_i32()),
        title: product.title,
        slug: product.slug.to_string(),
        description: product.description,
        price: product.price.round_dp(2).to_string(),
        discount_percent: product
            .discount_percent
            .map(|d| d.to_string())
            .unwrap_or_default(),
        featured: product.featured,
        is_popular: product.is_popular,
        categories: category_options(&state, Some(product.category_id)).await?,
        images: images
            .iter()
            .map(|i| ImageRow {
                id: i.id.as_i32(),
                url: i.url.clone(),
            })
            .collect(),
    })
}

/// Update a product.
#[instrument(skip(state, _admin, form))]
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<i32>,
    Form(form): Form<ProductForm>,
) -> Result<impl IntoResponse> {
    let (title, slug, description, discount_percent) = parse_form(&form)?;

    let product = ProductRepository::new(state.pool())
        .update(
            ProductId::new(id),
            UpdateProduct {
                title,
                slug,
                description,
                price: form.price,
                discount_percent,
                category_id: CategoryId::new(form.category_id),
                featured: form.featured.is_some(),
                is_popular: form.is_popular.is_some(),
            },
        )
        .await?;

    tracing::info!(product_id = %product.id, "product updated");

    Ok(Redirect::to(&format!("/products/{id}/edit")))
}

/// Delete a product, its local rows, and its media assets.
///
/// The database cascade commits first; asset destruction is best-effort
/// afterwards (a leaked asset is re-destroyable, a half-deleted product is
/// not).
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let images = ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await?;

    for image in &images {
        if let Err(e) = state.media().destroy(&image.media_public_id).await {
            tracing::warn!(
                error = %e,
                public_id = %image.media_public_id,
                "failed to destroy media asset for deleted product"
            );
        }
    }

    tracing::info!(product_id = id, images = images.len(), "product deleted");

    Ok(Redirect::to("/products"))
}

/// Upload a product image (multipart field `file`).
#[instrument(skip(state, _admin, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let product_id = ProductId::new(id);
    let repo = ProductRepository::new(state.pool());
    repo.get_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("invalid upload: {e}")))?;

        if bytes.is_empty() {
            return Err(AppError::BadRequest("empty upload".to_owned()));
        }

        let asset = state.media().upload(bytes.to_vec(), &filename).await?;
        let image = repo
            .add_image(product_id, &asset.public_id, &asset.url)
            .await?;

        tracing::info!(product_id = id, image_id = %image.id, "image uploaded");
        return Ok(Redirect::to(&format!("/products/{id}/edit")));
    }

    Err(AppError::BadRequest("no file in upload".to_owned()))
}

/// Remove a product image locally and on the media service.
#[instrument(skip(state, _admin))]
pub async fn delete_image(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path((id, image_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse> {
    let image = ProductRepository::new(state.pool())
        .remove_image(ProductId::new(id), ProductImageId::new(image_id))
        .await?;

    if let Err(e) = state.media().destroy(&image.media_public_id).await {
        tracing::warn!(
            error = %e,
            public_id = %image.media_public_id,
            "failed to destroy removed media asset"
        );
    }

    Ok(Redirect::to(&format!("/products/{id}/edit")))
}
