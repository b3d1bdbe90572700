//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use larkspur_core::category::CategoryTree;
use larkspur_store::CategoryRepository;

use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::search::SearchIndex;
use crate::services::identity::IdentityClient;

/// How long a built category tree is served before being rebuilt.
const CATEGORY_TREE_TTL: Duration = Duration::from_secs(60);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    identity: IdentityClient,
    search: SearchIndex,
    /// Single-entry cache holding the assembled category tree.
    category_tree: Cache<(), Arc<CategoryTree>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let identity = IdentityClient::new(&config.identity);
        let category_tree = Cache::builder()
            .max_capacity(1)
            .time_to_live(CATEGORY_TREE_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                identity,
                search: SearchIndex::new(),
                category_tree,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the search index.
    #[must_use]
    pub fn search(&self) -> &SearchIndex {
        &self.inner.search
    }

    /// The category tree, rebuilt from the database at most once per TTL.
    ///
    /// Every consumer of the hierarchy (nav, footer, category grid, JSON
    /// endpoint) goes through here, so they all see the same tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be loaded or the tree cannot
    /// be assembled (cycle in the stored parent links).
    pub async fn category_tree(&self) -> Result<Arc<CategoryTree>, AppError> {
        let pool = self.inner.pool.clone();
        self.inner
            .category_tree
            .try_get_with((), async move {
                let records = CategoryRepository::new(&pool).list_records().await?;
                let tree = CategoryTree::build(records)
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                if !tree.orphans().is_empty() {
                    tracing::warn!(orphans = ?tree.orphans(), "categories reference missing parents");
                }
                Ok::<_, AppError>(Arc::new(tree))
            })
            .await
            .map_err(|e: Arc<AppError>| AppError::Internal(e.to_string()))
    }

    /// Spawn the background search index build and refresh loop.
    pub fn start_search_indexing(&self) {
        crate::search::build_index_async(self.inner.search.clone(), self.inner.pool.clone());
    }
}
