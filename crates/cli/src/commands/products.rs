//! Product listing commands.
//!
//! # Usage
//!
//! ```bash
//! shop products                      # everything
//! shop products --category laptops   # one category
//! shop products --min-price 49999    # price >= threshold
//! shop products --search galaxy      # title search
//! shop product 9                     # details + related products
//! ```

use storefront::catalog::{CATEGORY_PRESETS, Filter, PRICE_PRESETS};
use storefront::error::{AppError, Result};
use storefront::state::AppState;
use storefront_core::{Category, Price, Product, ProductId};

use crate::terminal::product_line;

/// Which listing the user asked for.
#[derive(Debug, Default)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub min_price: Option<Price>,
    pub search: Option<String>,
}

impl ListingQuery {
    /// Resolve the query against the catalog. Search wins over filters.
    fn run<'a>(&self, state: &'a AppState) -> Result<Vec<&'a Product>> {
        let catalog = state.catalog();
        if let Some(term) = &self.search {
            return Ok(catalog.search(term));
        }
        let filter = match (&self.category, self.min_price) {
            (Some(_), Some(_)) => {
                return Err(AppError::BadRequest(
                    "choose either --category or --min-price".to_string(),
                ));
            }
            (Some(category), None) => Filter::Category(Category::new(category.as_str())),
            (None, Some(price)) => Filter::MinPrice(price),
            (None, None) => Filter::All,
        };
        Ok(catalog.filter(&filter))
    }
}

/// List products.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for conflicting filters.
#[allow(clippy::print_stdout)]
pub fn list(state: &AppState, query: &ListingQuery) -> Result<()> {
    let products = query.run(state)?;
    if products.is_empty() {
        println!("No products found.");
    }
    for product in products {
        println!("{}", product_line(product));
    }

    let thresholds: Vec<String> = PRICE_PRESETS.iter().map(|p| format!(">={p}")).collect();
    println!(
        "\nFilter by -> {} | {}",
        CATEGORY_PRESETS.join(" | "),
        thresholds.join(" | ")
    );
    Ok(())
}

/// Show one product and others from its category.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the id is unknown.
#[allow(clippy::print_stdout)]
pub fn show(state: &AppState, id: &ProductId) -> Result<()> {
    let catalog = state.catalog();
    let product = catalog
        .find(id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    println!("{}", product.title);
    println!("{}", product.description);
    println!("Price: {}", product.price.display_inr());
    println!("Image: {}", product.img_src);

    let related = catalog.related(product);
    if !related.is_empty() {
        println!("\nRelated products:");
        for other in related {
            println!("{}", product_line(other));
        }
    }
    Ok(())
}
