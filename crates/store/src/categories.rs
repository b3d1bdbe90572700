//! Category repository.
//!
//! Loads the flat record set the category tree is built from, and performs
//! the admin-side mutations. Cycle prevention on re-parenting happens here,
//! before the UPDATE, with a recursive ancestor walk.

use sqlx::PgPool;

use larkspur_core::category::CategoryRecord;
use larkspur_core::{CategoryId, Slug};

use crate::models::{Category, CreateCategory, UpdateCategory};
use crate::{RepositoryError, map_insert_error};

/// Repository for category operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load every category with its direct product count.
    ///
    /// This is the input to `CategoryTree::build`; rolled-up counts are
    /// computed there, not in SQL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_records(&self) -> Result<Vec<CategoryRecord>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: CategoryId,
            parent_id: Option<CategoryId>,
            name: String,
            slug: Slug,
            description: Option<String>,
            product_count: i64,
        }

        let rows = sqlx::query_as::<_, Row>(
            r"
            SELECT c.id, c.parent_id, c.name, c.slug, c.description,
                   COUNT(p.id) AS product_count
            FROM catalog.category c
            LEFT JOIN catalog.product p ON p.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CategoryRecord {
                id: r.id,
                parent_id: r.parent_id,
                name: r.name,
                slug: r.slug,
                description: r.description,
                product_count: r.product_count,
            })
            .collect())
    }

    /// Get a category by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &Slug) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, slug, parent_id, description, created_at, updated_at
            FROM catalog.category
            WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    /// Get a category by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, slug, parent_id, description, created_at, updated_at
            FROM catalog.category
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    /// Create a new category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken or the parent
    /// does not exist, `RepositoryError::Database` otherwise.
    pub async fn create(&self, input: CreateCategory) -> Result<Category, RepositoryError> {
        if let Some(parent_id) = input.parent_id
            && self.get_by_id(parent_id).await?.is_none()
        {
            return Err(RepositoryError::Conflict(format!(
                "parent category {parent_id} does not exist"
            )));
        }

        let category = sqlx::query_as::<_, Category>(
            r"
            INSERT INTO catalog.category (name, slug, parent_id, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, slug, parent_id, description, created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.parent_id)
        .bind(&input.description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_insert_error(e, "category slug"))?;

        Ok(category)
    }

    /// Update a category, re-checking the no-cycle invariant when the parent
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new parent would create a
    /// cycle (or is the category itself), `RepositoryError::NotFound` if the
    /// category does not exist.
    pub async fn update(
        &self,
        id: CategoryId,
        input: UpdateCategory,
    ) -> Result<Category, RepositoryError> {
        if let Some(parent_id) = input.parent_id {
            if parent_id == id {
                return Err(RepositoryError::Conflict(
                    "a category cannot be its own parent".to_owned(),
                ));
            }
            if self.is_descendant_of(parent_id, id).await? {
                return Err(RepositoryError::Conflict(
                    "moving a category under its own descendant would create a cycle".to_owned(),
                ));
            }
        }

        let category = sqlx::query_as::<_, Category>(
            r"
            UPDATE catalog.category
            SET name = $2, slug = $3, parent_id = $4, description = $5, updated_at = now()
            WHERE id = $1
            RETURNING id, name, slug, parent_id, description, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.parent_id)
        .bind(&input.description)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_insert_error(e, "category slug"))?;

        category.ok_or(RepositoryError::NotFound)
    }

    /// Delete a category.
    ///
    /// Refused while child categories or products remain; a product always
    /// belongs to a category, so there is nothing sensible to cascade to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category still has children
    /// or products, `RepositoryError::NotFound` if it does not exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (child_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM catalog.category WHERE parent_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if child_count > 0 {
            return Err(RepositoryError::Conflict(format!(
                "category has {child_count} child categories"
            )));
        }

        let (product_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM catalog.product WHERE category_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if product_count > 0 {
            return Err(RepositoryError::Conflict(format!(
                "category has {product_count} products"
            )));
        }

        let result = sqlx::query("DELETE FROM catalog.category WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Whether `candidate` sits somewhere below `ancestor` in the tree.
    async fn is_descendant_of(
        &self,
        candidate: CategoryId,
        ancestor: CategoryId,
    ) -> Result<bool, RepositoryError> {
        let (found,): (bool,) = sqlx::query_as(
            r"
            WITH RECURSIVE descendants AS (
                SELECT id FROM catalog.category WHERE parent_id = $1
                UNION ALL
                SELECT c.id FROM catalog.category c
                JOIN descendants d ON c.parent_id = d.id
            )
            SELECT EXISTS (SELECT 1 FROM descendants WHERE id = $2)
            ",
        )
        .bind(ancestor)
        .bind(candidate)
        .fetch_one(self.pool)
        .await?;

        Ok(found)
    }
}
