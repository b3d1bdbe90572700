//! Integration test helpers for Larkspur.
//!
//! The actual tests live in `tests/` and run against locally started
//! binaries; they are `#[ignore]`d by default. Start the stack first:
//!
//! ```bash
//! cargo run -p larkspur-cli -- migrate
//! cargo run -p larkspur-cli -- seed
//! cargo run -p larkspur-storefront &
//! cargo run -p larkspur-admin &
//! cargo test -p larkspur-integration-tests -- --ignored
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin panel (configurable via environment).
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Create an HTTP client with a cookie store (for session flows).
///
/// # Panics
///
/// Panics if the client cannot be constructed.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}
