//! `shop` subcommand implementations.

use storefront::auth::AuthError;
use storefront::error::Result;
use storefront::state::AppState;

pub mod account;
pub mod cart;
pub mod products;

/// Fail unless sign-in and purchases are configured.
///
/// # Errors
///
/// Returns `AuthError::NotConfigured` when running offline.
pub fn require_online(state: &AppState) -> Result<()> {
    if state.is_online() {
        Ok(())
    } else {
        Err(AuthError::NotConfigured.into())
    }
}
