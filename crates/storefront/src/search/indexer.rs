//! Search index builder.
//!
//! Builds the search index asynchronously from the catalog tables and
//! rebuilds it on an interval so admin edits become searchable without a
//! restart.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::PgPool;
use tantivy::Index;
use tracing::{debug, error, info, instrument, warn};

use larkspur_core::category::CategoryTree;
use larkspur_store::{CategoryRepository, ProductRepository};

use super::{DocType, SearchFields, SearchIndex};

/// How often the index is rebuilt from the database.
const REBUILD_INTERVAL: std::time::Duration = std::time::Duration::from_secs(300);

/// Spawn a background task that builds the search index, then keeps
/// rebuilding it on an interval.
///
/// Until the first build completes, `SearchIndex::search()` returns empty
/// results.
pub fn build_index_async(search_index: SearchIndex, pool: PgPool) {
    info!("Spawning background search index build task");
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REBUILD_INTERVAL);
        loop {
            interval.tick().await;
            match build_index(&pool).await {
                Ok((index, fields)) => {
                    if let Err(e) = search_index.set_ready(index, fields) {
                        error!(error = %e, "Failed to set search index as ready");
                    } else {
                        let docs = search_index.num_docs();
                        info!(docs, "Search index rebuilt and serving requests");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to build search index");
                }
            }
        }
    });
}

/// Build the search index (called by the background task).
#[instrument(skip_all)]
async fn build_index(pool: &PgPool) -> Result<(Index, SearchFields), BuildError> {
    debug!("Building search schema");
    let (schema, fields) = SearchIndex::build_schema();

    // Create in-memory index
    let index = Index::create_in_ram(schema);

    // Register the English stemmer tokenizer
    let tokenizer_manager = index.tokenizers();
    tokenizer_manager.register(
        "en_stem",
        tantivy::tokenizer::TextAnalyzer::builder(tantivy::tokenizer::SimpleTokenizer::default())
            .filter(tantivy::tokenizer::RemoveLongFilter::limit(40))
            .filter(tantivy::tokenizer::LowerCaser)
            .filter(tantivy::tokenizer::Stemmer::new(
                tantivy::tokenizer::Language::English,
            ))
            .build(),
    );

    let mut writer = index
        .writer(50_000_000) // 50MB buffer
        .map_err(|e| BuildError(format!("Failed to create writer: {e}")))?;

    // Index products with their category names and first image
    let products_count = index_products(pool, &writer, &fields).await?;
    info!(count = products_count, "Indexed products");

    // Index categories with rolled-up counts from the shared tree builder
    let categories_count = index_categories(pool, &writer, &fields).await?;
    info!(count = categories_count, "Indexed categories");

    // Commit the index
    writer
        .commit()
        .map_err(|e| BuildError(format!("Failed to commit index: {e}")))?;

    let total = products_count + categories_count;
    info!(total, "Search index built successfully");

    Ok((index, fields))
}

/// Index all products.
async fn index_products(
    pool: &PgPool,
    writer: &tantivy::IndexWriter,
    fields: &SearchFields,
) -> Result<usize, BuildError> {
    let repo = ProductRepository::new(pool);
    let rows = repo
        .list_for_indexing()
        .await
        .map_err(|e| BuildError(format!("Failed to load products: {e}")))?;

    let mut count = 0;
    for (product, category_name, image_url) in rows {
        let effective = product.effective_price();
        let doc = tantivy::doc!(
            fields.doc_type => DocType::Product.as_str(),
            fields.slug => product.slug.as_str(),
            fields.title => product.title.clone(),
            fields.description => product.description.clone(),
            fields.image_url => image_url.unwrap_or_default(),
            fields.price => effective.display(),
            fields.price_cents => price_cents(effective.amount),
            fields.category => category_name.to_lowercase(),
            fields.discounted => u64::from(product.discount_percent.is_some()),
            fields.title_text => product.title.clone(),
            fields.description_text => product.description.clone(),
            fields.category_text => category_name.clone()
        );

        if let Err(e) = writer.add_document(doc) {
            warn!(error = %e, slug = %product.slug, "Failed to index product");
        } else {
            count += 1;
        }
    }

    Ok(count)
}

/// Index all categories, with rolled-up product counts in the description.
async fn index_categories(
    pool: &PgPool,
    writer: &tantivy::IndexWriter,
    fields: &SearchFields,
) -> Result<usize, BuildError> {
    let records = CategoryRepository::new(pool)
        .list_records()
        .await
        .map_err(|e| BuildError(format!("Failed to load categories: {e}")))?;

    let tree = CategoryTree::build(records)
        .map_err(|e| BuildError(format!("Failed to build category tree: {e}")))?;

    let mut count = 0;
    for flat in tree.flatten() {
        let description = format!(
            "{} item{}",
            flat.total_product_count,
            if flat.total_product_count == 1 { "" } else { "s" }
        );
        let doc = tantivy::doc!(
            fields.doc_type => DocType::Category.as_str(),
            fields.slug => flat.slug.as_str(),
            fields.title => flat.name.clone(),
            fields.description => description,
            fields.image_url => String::new(),
            fields.price => String::new(),
            fields.price_cents => 0u64,
            fields.category => String::new(),
            fields.discounted => 0u64,
            fields.title_text => flat.name.clone(),
            fields.description_text => String::new(),
            fields.category_text => flat.name.clone()
        );

        if let Err(e) = writer.add_document(doc) {
            warn!(error = %e, slug = %flat.slug, "Failed to index category");
        } else {
            count += 1;
        }
    }

    Ok(count)
}

/// Convert a decimal price to whole cents (e.g., 24.99 -> 2499).
fn price_cents(amount: Decimal) -> u64 {
    (amount * Decimal::from(100))
        .round()
        .to_u64()
        .unwrap_or(0)
}

/// Build error wrapper.
#[derive(Debug)]
struct BuildError(String);

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BuildError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_cents() {
        assert_eq!(price_cents(Decimal::new(2499, 2)), 2499);
        assert_eq!(price_cents(Decimal::from(10)), 1000);
        assert_eq!(price_cents(Decimal::ZERO), 0);
    }

    #[test]
    fn test_price_cents_negative_clamps_to_zero() {
        assert_eq!(price_cents(Decimal::from(-5)), 0);
    }
}
