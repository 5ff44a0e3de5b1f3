//! Purchase flow.
//!
//! Buying a cart item is a linear sequence with one suspension point:
//!
//! 1. No signed-in user: warn and stop.
//! 2. Renew the ID token if it is about to expire. A session the provider
//!    will not renew is signed out and treated as step 1.
//! 3. Ask the user to confirm; a cancel ends the flow silently.
//! 4. Write a [`PurchaseRecord`] under `purchases/{uid}-{epochMillis}`.
//! 5. On success, announce it and drop the item from the cart. On failure,
//!    announce a generic error and leave the cart alone.
//!
//! Errors never escape [`PurchaseFlow::buy`]; the returned
//! [`PurchaseOutcome`] says which branch ran.

use std::sync::Arc;

use chrono::Utc;
use storefront_core::{CartItem, PurchaseKey, PurchaseRecord};
use tracing::{info, instrument, warn};

use crate::auth::AuthSession;
use crate::cart::CartStore;
use crate::error::{AppError, add_breadcrumb};
use crate::firestore::PurchaseStore;
use crate::notice::{Confirm, Notice, Notifier};

/// Which branch a purchase attempt took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Nobody is signed in, or the session could not be renewed.
    LoginRequired,
    /// The user declined the confirmation.
    Cancelled,
    /// The record was written under this key.
    Purchased(PurchaseKey),
    /// The token renewal or the remote write failed.
    Failed,
}

/// Coordinates confirmation, the remote write and the cart update.
pub struct PurchaseFlow {
    auth: Arc<AuthSession>,
    purchases: Arc<dyn PurchaseStore>,
    confirm: Arc<dyn Confirm>,
    notifier: Arc<dyn Notifier>,
}

impl PurchaseFlow {
    #[must_use]
    pub fn new(
        auth: Arc<AuthSession>,
        purchases: Arc<dyn PurchaseStore>,
        confirm: Arc<dyn Confirm>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            auth,
            purchases,
            confirm,
            notifier,
        }
    }

    /// Buy `item` on behalf of the signed-in user.
    #[instrument(skip_all, fields(product_id = %item.id))]
    pub async fn buy(&self, cart: &mut CartStore, item: &CartItem) -> PurchaseOutcome {
        if self.auth.current_user().is_none() {
            return self.login_required();
        }
        let id_token = match self.auth.fresh_id_token().await {
            Ok(Some(token)) => token,
            Ok(None) => return self.login_required(),
            Err(e) => {
                AppError::from(e).capture();
                self.notifier.notify(&Notice::PurchaseFailed);
                return PurchaseOutcome::Failed;
            }
        };
        // Renewal keeps the user, but a concurrent sign-out may not have.
        let Some(identity) = self.auth.current_user() else {
            return self.login_required();
        };

        let question = Notice::ConfirmPurchase {
            title: item.title.clone(),
            price: item.price,
        };
        if !self.confirm.confirm(&question).await {
            return PurchaseOutcome::Cancelled;
        }

        let now = Utc::now();
        let key = PurchaseKey::new(&identity.uid, now);
        let record = PurchaseRecord::new(item, &identity, now);
        add_breadcrumb(
            "purchase",
            "Writing purchase record",
            Some(&[("product_id", item.id.as_str()), ("document", key.as_str())]),
        );

        if let Err(e) = self.purchases.write(&key, &record, &id_token).await {
            AppError::from(e).capture();
            self.notifier.notify(&Notice::PurchaseFailed);
            return PurchaseOutcome::Failed;
        }

        info!(document = %key, price = %item.price, "Purchase recorded");
        self.notifier.notify(&Notice::PurchaseSucceeded);

        // The purchase stands even if the local cart cannot be updated.
        if let Err(e) = cart.remove(&item.id) {
            warn!("Purchased item could not be removed from the cart");
            AppError::from(e).capture();
        }

        PurchaseOutcome::Purchased(key)
    }

    fn login_required(&self) -> PurchaseOutcome {
        self.notifier.notify(&Notice::LoginRequired);
        PurchaseOutcome::LoginRequired
    }
}
