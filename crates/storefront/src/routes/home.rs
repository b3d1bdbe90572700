//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use larkspur_store::ProductRepository;
use larkspur_store::models::{ProductFilter, ProductSort};

use crate::error::Result;
use crate::filters;
use crate::routes::categories::CategoryView;
use crate::routes::products::ProductView;
use crate::state::AppState;

/// How many featured/popular products the home page shows.
const HOME_SHELF_SIZE: i64 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub featured: Vec<ProductView>,
    pub popular: Vec<ProductView>,
    pub categories: Vec<CategoryView>,
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let repo = ProductRepository::new(state.pool());

    let featured = repo
        .list(&ProductFilter {
            featured: Some(true),
            sort: ProductSort::Newest,
            limit: HOME_SHELF_SIZE,
            ..ProductFilter::default()
        })
        .await?;

    let popular = repo
        .list(&ProductFilter {
            is_popular: Some(true),
            sort: ProductSort::Newest,
            limit: HOME_SHELF_SIZE,
            ..ProductFilter::default()
        })
        .await?;

    // Top-level category grid with rolled-up counts
    let tree = state.category_tree().await?;
    let categories = tree
        .flatten()
        .iter()
        .filter(|c| c.depth == 0)
        .map(CategoryView::from)
        .collect();

    Ok(HomeTemplate {
        featured: featured.iter().map(ProductView::from).collect(),
        popular: popular.iter().map(ProductView::from).collect(),
        categories,
    })
}
