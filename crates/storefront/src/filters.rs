//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Shorten free text to a listing-card blurb.
///
/// Usage in templates: `{{ product.description|blurb }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn blurb(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    const MAX: usize = 140;
    let text = value.to_string();
    if text.chars().count() <= MAX {
        return Ok(text);
    }
    let cut: String = text.chars().take(MAX).collect();
    Ok(format!("{}…", cut.trim_end()))
}
