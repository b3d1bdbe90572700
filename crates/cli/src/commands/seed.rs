//! Seed the database with a sample catalog.
//!
//! Inserts a small nested category tree, a handful of products, and a demo
//! admin account. Idempotent: slugs and external ids conflict-skip, so
//! re-running does not duplicate rows.

use rust_decimal::Decimal;

use larkspur_core::{Slug, UserRole};
use larkspur_store::CategoryRepository;
use larkspur_store::models::{CreateCategory, CreateProduct, IdentityProfile};
use larkspur_store::{ProductRepository, RepositoryError, UserRepository};

use super::{CommandError, connect};

/// (title, price dollars, discount percent, category slug, featured, popular)
const PRODUCTS: &[(&str, i64, Option<i64>, &str, bool, bool)] = &[
    ("Walnut Serving Board", 6400, None, "boards", true, true),
    ("End-Grain Chopping Block", 9800, Some(10), "boards", false, false),
    ("Stoneware Mug", 2800, None, "mugs", true, true),
    ("Travel Mug with Cork Lid", 3400, None, "mugs", false, false),
    ("Beeswax Candle Trio", 2200, Some(15), "candles", false, true),
    ("Pressed-Flower Notebook", 1800, None, "stationery", true, false),
    ("Letterpress Card Set", 1500, None, "stationery", false, false),
];

/// (name, parent slug)
const CATEGORIES: &[(&str, Option<&str>)] = &[
    ("Kitchen", None),
    ("Boards", Some("kitchen")),
    ("Mugs", Some("kitchen")),
    ("Candles", None),
    ("Stationery", None),
];

/// Run the seed.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails for a
/// reason other than "already there".
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    let categories = CategoryRepository::new(&pool);
    let products = ProductRepository::new(&pool);
    let users = UserRepository::new(&pool);

    for (name, parent_slug) in CATEGORIES {
        let slug = Slug::slugify(name).map_err(|e| CommandError::Invalid(e.to_string()))?;

        let parent_id = match parent_slug {
            Some(p) => {
                let parent_slug =
                    Slug::parse(p).map_err(|e| CommandError::Invalid(e.to_string()))?;
                categories.get_by_slug(&parent_slug).await?.map(|c| c.id)
            }
            None => None,
        };

        match categories
            .create(CreateCategory {
                name: (*name).to_owned(),
                slug,
                parent_id,
                description: None,
            })
            .await
        {
            Ok(category) => tracing::info!(slug = %category.slug, "seeded category"),
            Err(RepositoryError::Conflict(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    for (title, price_cents, discount, category_slug, featured, popular) in PRODUCTS {
        let slug = Slug::slugify(title).map_err(|e| CommandError::Invalid(e.to_string()))?;
        let category_slug =
            Slug::parse(category_slug).map_err(|e| CommandError::Invalid(e.to_string()))?;
        let category = categories
            .get_by_slug(&category_slug)
            .await?
            .ok_or_else(|| CommandError::Invalid(format!("missing category {category_slug}")))?;

        match products
            .create(CreateProduct {
                title: (*title).to_owned(),
                slug,
                description: format!("{title}, made by hand in small batches."),
                price: Decimal::new(*price_cents, 2),
                discount_percent: discount.map(Decimal::from),
                category_id: category.id,
                featured: *featured,
                is_popular: *popular,
            })
            .await
        {
            Ok(product) => tracing::info!(slug = %product.slug, "seeded product"),
            Err(RepositoryError::Conflict(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let admin = users
        .upsert_from_identity(&IdentityProfile {
            external_id: "seed_admin".to_owned(),
            email: "admin@larkspurgoods.test"
                .parse()
                .map_err(|e: larkspur_core::EmailError| CommandError::Invalid(e.to_string()))?,
            name: "Demo Admin".to_owned(),
            role: UserRole::Admin,
        })
        .await?;
    tracing::info!(user_id = %admin.id, "seeded demo admin");

    tracing::info!("Seed complete");
    Ok(())
}
