//! Category route handlers.
//!
//! All of these render from the one cached `CategoryTree` on `AppState`;
//! none of them re-walk the flat records.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Serialize;
use tracing::instrument;

use larkspur_core::Slug;
use larkspur_core::category::{CategoryNode, FlatCategory};
use larkspur_store::ProductRepository;
use larkspur_store::models::{ProductFilter, ProductSort};

use crate::error::{AppError, Result};
use crate::filters;
use crate::routes::products::{ListingQuery, PRODUCTS_PER_PAGE, ProductView, page_count};
use crate::state::AppState;

/// Category display data for templates.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub depth: usize,
    pub product_count: i64,
    pub total_product_count: i64,
    pub has_children: bool,
}

impl From<&FlatCategory> for CategoryView {
    fn from(flat: &FlatCategory) -> Self {
        Self {
            name: flat.name.clone(),
            slug: flat.slug.to_string(),
            description: None,
            depth: flat.depth,
            product_count: flat.product_count,
            total_product_count: flat.total_product_count,
            has_children: flat.has_children,
        }
    }
}

/// Category grid page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub categories: Vec<CategoryView>,
}

/// Category detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub category: CategoryView,
    pub children: Vec<CategoryView>,
    pub products: Vec<ProductView>,
    pub current_page: u32,
    pub total_pages: u32,
    pub sort: String,
}

/// Nav menu fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/nav.html")]
pub struct NavFragmentTemplate {
    pub categories: Vec<CategoryView>,
}

/// Footer links fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/footer.html")]
pub struct FooterFragmentTemplate {
    pub categories: Vec<CategoryView>,
}

/// Display the category grid.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let tree = state.category_tree().await?;
    let categories = tree.flatten().iter().map(CategoryView::from).collect();

    Ok(CategoriesIndexTemplate { categories })
}

/// Display a category with the products of its whole subtree.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let slug = Slug::parse(&slug).map_err(|_| AppError::NotFound(format!("category {slug}")))?;

    let tree = state.category_tree().await?;
    let node = tree
        .find_by_slug(&slug)
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    let current_page = query.page.unwrap_or(1).max(1);
    let sort = ProductSort::parse(query.sort.as_deref().unwrap_or(""));

    let filter = ProductFilter {
        category_ids: Some(tree.subtree_ids(node.id)),
        sort,
        limit: PRODUCTS_PER_PAGE,
        offset: i64::from(current_page - 1) * PRODUCTS_PER_PAGE,
        ..ProductFilter::default()
    };

    let repo = ProductRepository::new(state.pool());
    let products = repo.list(&filter).await?;
    let total = repo.count(&filter).await?;

    Ok(CategoryShowTemplate {
        category: node_view(node),
        children: node.children.iter().map(node_view).collect(),
        products: products.iter().map(ProductView::from).collect(),
        current_page,
        total_pages: page_count(total, PRODUCTS_PER_PAGE),
        sort: sort.as_str().to_string(),
    })
}

/// Nav menu fragment (HTMX).
#[instrument(skip(state))]
pub async fn nav_fragment(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let tree = state.category_tree().await?;
    let categories = tree.flatten().iter().map(CategoryView::from).collect();

    Ok(NavFragmentTemplate { categories })
}

/// Footer links fragment (HTMX). Top-level categories only.
#[instrument(skip(state))]
pub async fn footer_fragment(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let tree = state.category_tree().await?;
    let categories = tree
        .flatten()
        .iter()
        .filter(|c| c.depth == 0)
        .map(CategoryView::from)
        .collect();

    Ok(FooterFragmentTemplate { categories })
}

/// JSON body for the category tree endpoint.
#[derive(Debug, Serialize)]
pub struct CategoryTreeBody {
    pub roots: Vec<CategoryNode>,
}

/// The whole category tree as JSON, for progressive enhancement.
#[instrument(skip(state))]
pub async fn tree_json(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let tree = state.category_tree().await?;

    Ok(Json(CategoryTreeBody {
        roots: tree.roots().to_vec(),
    }))
}

fn node_view(node: &CategoryNode) -> CategoryView {
    CategoryView {
        name: node.name.clone(),
        slug: node.slug.to_string(),
        description: node.description.clone(),
        depth: 0,
        product_count: node.product_count,
        total_product_count: node.total_product_count,
        has_children: !node.children.is_empty(),
    }
}
