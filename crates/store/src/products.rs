//! Product repository.

use sqlx::{PgPool, QueryBuilder};

use larkspur_core::{ProductId, ProductImageId, Slug};

use crate::models::{CreateProduct, Product, ProductFilter, ProductImage, ProductSort, UpdateProduct};
use crate::{RepositoryError, map_insert_error};

const PRODUCT_COLUMNS: &str = "id, title, slug, description, price, discount_percent, \
     category_id, featured, is_popular, created_at, updated_at";

/// Repository for product operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching the filter, paged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut builder: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM catalog.product WHERE TRUE"
        ));

        if let Some(ids) = &filter.category_ids {
            let raw: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
            builder.push(" AND category_id = ANY(");
            builder.push_bind(raw);
            builder.push(")");
        }
        if let Some(featured) = filter.featured {
            builder.push(" AND featured = ");
            builder.push_bind(featured);
        }
        if let Some(popular) = filter.is_popular {
            builder.push(" AND is_popular = ");
            builder.push_bind(popular);
        }

        builder.push(match filter.sort {
            ProductSort::Newest => " ORDER BY created_at DESC, id DESC",
            ProductSort::PriceAsc => " ORDER BY price ASC, id ASC",
            ProductSort::PriceDesc => " ORDER BY price DESC, id ASC",
            ProductSort::Title => " ORDER BY title ASC, id ASC",
        });

        builder.push(" LIMIT ");
        builder.push_bind(filter.limit.max(1));
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset.max(0));

        let products = builder
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;

        Ok(products)
    }

    /// Count products matching the filter (ignores paging).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, filter: &ProductFilter) -> Result<i64, RepositoryError> {
        let mut builder: QueryBuilder<'_, sqlx::Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM catalog.product WHERE TRUE");

        if let Some(ids) = &filter.category_ids {
            let raw: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
            builder.push(" AND category_id = ANY(");
            builder.push_bind(raw);
            builder.push(")");
        }
        if let Some(featured) = filter.featured {
            builder.push(" AND featured = ");
            builder.push_bind(featured);
        }
        if let Some(popular) = filter.is_popular {
            builder.push(" AND is_popular = ");
            builder.push_bind(popular);
        }

        let (count,): (i64,) = builder.build_query_as().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM catalog.product WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM catalog.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken,
    /// `RepositoryError::Database` otherwise.
    pub async fn create(&self, input: CreateProduct) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO catalog.product
                (title, slug, description, price, discount_percent,
                 category_id, featured, is_popular)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.discount_percent)
        .bind(input.category_id)
        .bind(input.featured)
        .bind(input.is_popular)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_insert_error(e, "product slug"))?;

        Ok(product)
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist,
    /// `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(
        &self,
        id: ProductId,
        input: UpdateProduct,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE catalog.product
            SET title = $2, slug = $3, description = $4, price = $5,
                discount_percent = $6, category_id = $7, featured = $8,
                is_popular = $9, updated_at = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.discount_percent)
        .bind(input.category_id)
        .bind(input.featured)
        .bind(input.is_popular)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_insert_error(e, "product slug"))?;

        product.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product and everything hanging off it.
    ///
    /// Removes images, favorites, and order requests in one transaction, then
    /// the product row. Returns the removed images so the caller can destroy
    /// the assets on the media service afterwards.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<Vec<ProductImage>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let images = sqlx::query_as::<_, ProductImage>(
            r"
            DELETE FROM catalog.product_image
            WHERE product_id = $1
            RETURNING id, product_id, media_public_id, url, position
            ",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM shop.favorite WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM shop.order_request WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM catalog.product WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(images)
    }

    /// List a product's images, in position order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_images(&self, id: ProductId) -> Result<Vec<ProductImage>, RepositoryError> {
        let images = sqlx::query_as::<_, ProductImage>(
            r"
            SELECT id, product_id, media_public_id, url, position
            FROM catalog.product_image
            WHERE product_id = $1
            ORDER BY position ASC, id ASC
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(images)
    }

    /// Attach an image uploaded to the media service.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add_image(
        &self,
        product_id: ProductId,
        media_public_id: &str,
        url: &str,
    ) -> Result<ProductImage, RepositoryError> {
        let image = sqlx::query_as::<_, ProductImage>(
            r"
            INSERT INTO catalog.product_image (product_id, media_public_id, url, position)
            VALUES (
                $1, $2, $3,
                COALESCE(
                    (SELECT MAX(position) + 1 FROM catalog.product_image WHERE product_id = $1),
                    0
                )
            )
            RETURNING id, product_id, media_public_id, url, position
            ",
        )
        .bind(product_id)
        .bind(media_public_id)
        .bind(url)
        .fetch_one(self.pool)
        .await?;

        Ok(image)
    }

    /// Remove an image row, returning it so the asset can be destroyed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the image does not exist on the
    /// given product.
    pub async fn remove_image(
        &self,
        product_id: ProductId,
        image_id: ProductImageId,
    ) -> Result<ProductImage, RepositoryError> {
        let image = sqlx::query_as::<_, ProductImage>(
            r"
            DELETE FROM catalog.product_image
            WHERE id = $1 AND product_id = $2
            RETURNING id, product_id, media_public_id, url, position
            ",
        )
        .bind(image_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        image.ok_or(RepositoryError::NotFound)
    }

    /// All products with the name of their category, for search indexing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_indexing(
        &self,
    ) -> Result<Vec<(Product, String, Option<String>)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            product: Product,
            category_name: String,
            image_url: Option<String>,
        }

        let rows = sqlx::query_as::<_, Row>(
            r"
            SELECT p.id, p.title, p.slug, p.description, p.price, p.discount_percent,
                   p.category_id, p.featured, p.is_popular, p.created_at, p.updated_at,
                   c.name AS category_name,
                   (SELECT i.url FROM catalog.product_image i
                    WHERE i.product_id = p.id
                    ORDER BY i.position ASC, i.id ASC LIMIT 1) AS image_url
            FROM catalog.product p
            JOIN catalog.category c ON c.id = p.category_id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.product, r.category_name, r.image_url))
            .collect())
    }

}
