//! Products and cart items.
//!
//! The catalog and the cart share one shape: adding a product to the cart
//! stores a copy of the catalog entry. Field names follow the camelCase JSON
//! used by the catalog source and the durable cart format.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// Product category, compared by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Create a category from its identifier (e.g., `"laptops"`).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The raw category identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

/// A product listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub img_src: String,
    pub category: Category,
}

/// An entry in the shopping cart. Identity is `id`.
pub type CartItem = Product;
