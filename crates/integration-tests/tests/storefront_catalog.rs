//! Integration tests for the storefront catalog surfaces.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations and seed applied
//! - The storefront server running (cargo run -p larkspur-storefront)
//!
//! Run with: cargo test -p larkspur-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::Value;

use larkspur_integration_tests::{client, storefront_base_url};

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_home_page_renders() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .get(&base_url)
        .send()
        .await
        .expect("Failed to get home page");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Browse by category"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_category_tree_json_rolls_up_counts() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/api/categories/tree"))
        .send()
        .await
        .expect("Failed to get category tree");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse JSON");

    let roots = body["roots"].as_array().expect("roots array");
    assert!(!roots.is_empty());

    // Every node's rolled-up count is its own plus its children's
    fn check(node: &Value) {
        let own = node["product_count"].as_i64().expect("product_count");
        let total = node["total_product_count"]
            .as_i64()
            .expect("total_product_count");
        let children = node["children"].as_array().expect("children");

        let child_sum: i64 = children
            .iter()
            .map(|c| c["total_product_count"].as_i64().expect("child total"))
            .sum();
        assert_eq!(total, own + child_sum);

        for child in children {
            check(child);
        }
    }
    for root in roots {
        check(root);
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_category_page_includes_descendant_products() {
    let client = client();
    let base_url = storefront_base_url();

    // The seed files boards and mugs under kitchen; the kitchen page must
    // show products from both subtrees.
    let resp = client
        .get(format!("{base_url}/categories/kitchen"))
        .send()
        .await
        .expect("Failed to get category page");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Walnut Serving Board"));
    assert!(body.contains("Stoneware Mug"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_unknown_category_is_404() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/categories/no-such-category"))
        .send()
        .await
        .expect("Failed to get category page");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_product_detail_by_slug() {
    let client = client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/products/walnut-serving-board"))
        .send()
        .await
        .expect("Failed to get product page");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Walnut Serving Board"));
    assert!(body.contains("$64.00"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded database"]
async fn test_search_page_finds_seeded_product() {
    let client = client();
    let base_url = storefront_base_url();

    // The index is built in the background; it may lag right after boot
    let resp = client
        .get(format!("{base_url}/search?q=walnut"))
        .send()
        .await
        .expect("Failed to search");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    if body.contains("warming up") {
        eprintln!("search index not ready yet; skipping content assertion");
        return;
    }
    assert!(body.contains("walnut-serving-board"));
}
