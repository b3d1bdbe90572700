//! Category management route handlers.
//!
//! The tree view and the parent selectors render from the same
//! `CategoryTree` component the storefront uses; the admin panel never
//! hand-rolls its own hierarchy walk.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use larkspur_core::category::{CategoryTree, FlatCategory};
use larkspur_core::{CategoryId, Slug};
use larkspur_store::CategoryRepository;
use larkspur_store::models::{CreateCategory, UpdateCategory};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Category row for the tree view and parent selectors.
#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub depth: usize,
    pub product_count: i64,
    pub total_product_count: i64,
}

impl From<&FlatCategory> for CategoryRow {
    fn from(flat: &FlatCategory) -> Self {
        Self {
            id: flat.id.as_i32(),
            name: flat.name.clone(),
            slug: flat.slug.to_string(),
            depth: flat.depth,
            product_count: flat.product_count,
            total_product_count: flat.total_product_count,
        }
    }
}

/// Category form body (create and update share it).
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    /// Empty string means "no parent" in the select.
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub description: String,
}

/// Category tree page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub categories: Vec<CategoryRow>,
}

/// Parent option for the edit form's select.
#[derive(Debug, Clone)]
pub struct ParentOption {
    pub id: i32,
    pub name: String,
    pub depth: usize,
    pub selected: bool,
}

/// Category edit page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/edit.html")]
pub struct CategoryEditTemplate {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Valid parent options: the tree minus this category's own subtree.
    pub parent_options: Vec<ParentOption>,
}

/// Load the tree fresh from the database.
async fn load_tree(state: &AppState) -> Result<CategoryTree> {
    let records = CategoryRepository::new(state.pool()).list_records().await?;
    CategoryTree::build(records).map_err(|e| AppError::Internal(e.to_string()))
}

fn parse_form(form: &CategoryForm) -> Result<(String, Slug, Option<CategoryId>, Option<String>)> {
    let name = form.name.trim().to_owned();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_owned()));
    }

    // Blank slug field means derive one from the name
    let slug = if form.slug.trim().is_empty() {
        Slug::slugify(&name)
    } else {
        Slug::parse(form.slug.trim())
    }
    .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let parent_id = if form.parent_id.trim().is_empty() {
        None
    } else {
        let raw: i32 = form
            .parent_id
            .trim()
            .parse()
            .map_err(|_| AppError::BadRequest("invalid parent".to_owned()))?;
        Some(CategoryId::new(raw))
    };

    let description = form.description.trim();
    let description = (!description.is_empty()).then(|| description.to_owned());

    Ok((name, slug, parent_id, description))
}

/// Display the category tree with the create form.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse> {
    let tree = load_tree(&state).await?;
    let categories = tree.flatten().iter().map(CategoryRow::from).collect();

    Ok(CategoriesIndexTemplate { categories })
}

/// Create a category.
#[instrument(skip(state, _admin, form))]
pub async fn create(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Form(form): Form<CategoryForm>,
) -> Result<impl IntoResponse> {
    let (name, slug, parent_id, description) = parse_form(&form)?;

    let category = CategoryRepository::new(state.pool())
        .create(CreateCategory {
            name,
            slug,
            parent_id,
            description,
        })
        .await?;

    tracing::info!(category_id = %category.id, "category created");

    Ok(Redirect::to("/categories"))
}

/// Display the edit form for a category.
#[instrument(skip(state, _admin))]
pub async fn edit_form(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    let id = CategoryId::new(id);
    let category = CategoryRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;

    // A category cannot be moved under itself or its own descendants
    let tree = load_tree(&state).await?;
    let excluded = tree.subtree_ids(id);
    let parent_options = tree
        .flatten()
        .iter()
        .filter(|c| !excluded.contains(&c.id))
        .map(|c| ParentOption {
            id: c.id.as_i32(),
            name: c.name.clone(),
            depth: c.depth,
            selected: Some(c.id) == category.parent_id,
        })
        .collect();

    Ok(CategoryEditTemplate {
        id: id.as_i32(),
        name: category.name,
        slug: category.slug.to_string(),
        description: category.description.unwrap_or_default(),
        parent_options,
    })
}

/// Update a category (rename, re-slug, re-parent).
#[instrument(skip(state, _admin, form))]
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<i32>,
    Form(form): Form<CategoryForm>,
) -> Result<impl IntoResponse> {
    let (name, slug, parent_id, description) = parse_form(&form)?;

    let category = CategoryRepository::new(state.pool())
        .update(
            CategoryId::new(id),
            UpdateCategory {
                name,
                slug,
                parent_id,
                description,
            },
        )
        .await?;

    tracing::info!(category_id = %category.id, "category updated");

    Ok(Redirect::to("/categories"))
}

/// Delete a category. Refused while children or products remain.
#[instrument(skip(state, _admin))]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    CategoryRepository::new(state.pool())
        .delete(CategoryId::new(id))
        .await?;

    tracing::info!(category_id = id, "category deleted");

    Ok(Redirect::to("/categories"))
}
