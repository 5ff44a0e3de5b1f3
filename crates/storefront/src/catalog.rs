//! Product catalog.
//!
//! The catalog is a static, read-only product list bundled with the binary.
//! Listing views narrow it with a [`Filter`]; every filter preserves the
//! source order.

use storefront_core::{Category, Price, Product, ProductId};
use thiserror::Error;

/// Bundled catalog data.
const BUNDLED_PRODUCTS: &str = include_str!("../data/products.json");

/// Categories offered as quick filters.
pub const CATEGORY_PRESETS: &[&str] = &["mobiles", "laptops", "tablets"];

/// Price thresholds (₹) offered as quick filters.
pub const PRICE_PRESETS: &[i64] = &[29_999, 49_999, 69_999, 89_999];

/// Errors loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog JSON does not match the product shape.
    #[error("invalid catalog data: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two products share an id.
    #[error("duplicate product id: {0}")]
    DuplicateId(ProductId),
}

/// How to narrow the product listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    /// Every product.
    #[default]
    All,
    /// Products whose category equals this one.
    Category(Category),
    /// Products priced at or above this threshold.
    MinPrice(Price),
}

impl Filter {
    /// Whether `product` passes this filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Category(category) => &product.category == category,
            Self::MinPrice(threshold) => product.price >= *threshold,
        }
    }
}

/// Read-only product list.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// The catalog bundled with the storefront.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the bundled data is invalid.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_PRODUCTS)
    }

    /// Load a catalog from a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the JSON is malformed or ids repeat.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::new(products)
    }

    /// Build a catalog from products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if two products share an id.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = std::collections::HashSet::new();
        for product in &products {
            if !seen.insert(&product.id) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }
        Ok(Self { products })
    }

    /// Every product, in source order.
    #[must_use]
    pub fn all(&self) -> &[Product] {
        &self.products
    }

    /// Look a product up by id.
    #[must_use]
    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Products passing `filter`, in source order.
    #[must_use]
    pub fn filter(&self, filter: &Filter) -> Vec<&Product> {
        self.products.iter().filter(|p| filter.matches(p)).collect()
    }

    /// Products in `category`.
    #[must_use]
    pub fn by_category(&self, category: &Category) -> Vec<&Product> {
        self.filter(&Filter::Category(category.clone()))
    }

    /// Products priced at or above `threshold`.
    #[must_use]
    pub fn at_least(&self, threshold: Price) -> Vec<&Product> {
        self.filter(&Filter::MinPrice(threshold))
    }

    /// Case-insensitive title search. A blank term matches nothing.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Product> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }
        self.products
            .iter()
            .filter(|p| p.title.to_lowercase().contains(&term))
            .collect()
    }

    /// Other products in the same category as `product`.
    #[must_use]
    pub fn related(&self, product: &Product) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.category == product.category && p.id != product.id)
            .collect()
    }
}
