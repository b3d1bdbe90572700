//! Core type definitions.
//!
//! All types here are plain data with validation - no I/O.

pub mod email;
pub mod id;
pub mod price;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use slug::{Slug, SlugError};
pub use status::{OrderStatus, UserRole};
