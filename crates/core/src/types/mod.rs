//! Core types for the storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod price;
pub mod product;
pub mod purchase;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::{DEFAULT_AVATAR_URL, Identity};
pub use price::Price;
pub use product::{CartItem, Category, Product};
pub use purchase::{PURCHASES_COLLECTION, PurchaseKey, PurchaseRecord};
