//! Cart and purchase commands.
//!
//! # Usage
//!
//! ```bash
//! shop cart              # show the cart
//! shop cart add 9        # add a catalog product
//! shop cart remove 9     # remove it again
//! shop cart clear        # empty the cart
//! shop buy 9             # buy a cart item (asks for confirmation)
//! ```

use std::sync::Arc;

use storefront::error::{AppError, Result, add_breadcrumb};
use storefront::purchase::PurchaseOutcome;
use storefront::state::AppState;
use storefront_core::ProductId;
use tracing::info;

use crate::commands::require_online;
use crate::terminal::{TerminalConfirm, TerminalNotifier, product_line};

/// Print the cart.
///
/// # Errors
///
/// Returns `AppError::Storage` if the cart cannot be read.
#[allow(clippy::print_stdout)]
pub fn show(state: &AppState) -> Result<()> {
    let cart = state.open_cart()?;
    if cart.is_empty() {
        println!("Your Cart is Empty");
        println!("Continue shopping with `shop products`.");
        return Ok(());
    }

    for item in cart.items() {
        println!("{}", product_line(item));
    }
    println!("\n{} item(s), total {}", cart.len(), cart.total().display_inr());
    Ok(())
}

/// Add a catalog product to the cart.
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown ids, or a storage error.
#[allow(clippy::print_stdout)]
pub fn add(state: &AppState, id: &ProductId) -> Result<()> {
    let product = state
        .catalog()
        .find(id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?
        .clone();

    let mut cart = state.open_cart()?;
    let title = product.title.clone();
    cart.add(product)?;
    add_breadcrumb("cart", "Added item", Some(&[("product_id", id.as_str())]));
    info!(product_id = %id, items = cart.len(), "Added to cart");
    println!("Added {title} to the cart ({} item(s)).", cart.len());
    Ok(())
}

/// Remove an item from the cart.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the item is not in the cart, or a
/// storage error.
#[allow(clippy::print_stdout)]
pub fn remove(state: &AppState, id: &ProductId) -> Result<()> {
    let mut cart = state.open_cart()?;
    if !cart.remove(id)? {
        return Err(AppError::NotFound(format!("cart item {id}")));
    }
    add_breadcrumb("cart", "Removed item", Some(&[("product_id", id.as_str())]));
    println!("Removed item {id} ({} item(s) left).", cart.len());
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns a storage error if the stored cart cannot be deleted.
#[allow(clippy::print_stdout)]
pub fn clear(state: &AppState) -> Result<()> {
    let mut cart = state.open_cart()?;
    cart.clear()?;
    add_breadcrumb("cart", "Cleared cart", None);
    println!("Cart cleared.");
    Ok(())
}

/// Buy one cart item.
///
/// Purchase failures are reported as notices, not errors.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the item is not in the cart, an auth
/// error if Firebase is not configured, or a storage error if the cart
/// cannot be read.
pub async fn buy(state: &AppState, id: &ProductId) -> Result<PurchaseOutcome> {
    require_online(state)?;
    let mut cart = state.open_cart()?;
    let item = cart
        .items()
        .iter()
        .find(|item| &item.id == id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("cart item {id}")))?;

    let flow = state.purchase_flow(Arc::new(TerminalConfirm), Arc::new(TerminalNotifier));
    Ok(flow.buy(&mut cart, &item).await)
}
