//! Application state shared by front ends.
//!
//! Without Firebase settings the state is offline: the catalog and the cart
//! work, nobody is signed in, and sign-in or purchase attempts are refused.

use std::sync::Arc;

use crate::auth::{AuthSession, FirebaseAuthClient, IdentityProvider, UnconfiguredProvider};
use crate::cart::CartStore;
use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::firestore::{FirestoreClient, PurchaseStore, UnconfiguredPurchaseStore};
use crate::notice::{Confirm, Notifier};
use crate::purchase::PurchaseFlow;
use crate::storage::{FileStore, KeyValueStore, StorageError};

/// Everything a front end needs to run the storefront.
///
/// Cheaply cloneable via `Arc`. The cart is not held here: each view opens
/// its own [`CartStore`] on the shared durable store and owns it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    catalog: Catalog,
    store: Arc<dyn KeyValueStore>,
    auth: Arc<AuthSession>,
    purchases: Arc<dyn PurchaseStore>,
    online: bool,
}

impl AppState {
    /// Wire up the production collaborators from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory, the bundled catalog or an
    /// HTTP client cannot be initialized.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, AppError> {
        let store = Arc::new(FileStore::open(&config.data_dir)?);
        let catalog = Catalog::bundled()?;

        let Some(firebase) = &config.firebase else {
            tracing::info!("Firebase not configured, running offline");
            return Ok(Self::offline(catalog, store));
        };
        let provider = Arc::new(FirebaseAuthClient::new(firebase)?);
        let purchases = Arc::new(FirestoreClient::new(firebase)?);

        Self::new(catalog, store, provider, purchases)
    }

    /// State without an identity provider or purchase store.
    #[must_use]
    pub fn offline(catalog: Catalog, store: Arc<dyn KeyValueStore>) -> Self {
        let auth = Arc::new(AuthSession::signed_out(
            Arc::new(UnconfiguredProvider),
            store.clone(),
        ));

        Self {
            inner: Arc::new(AppStateInner {
                catalog,
                store,
                auth,
                purchases: Arc::new(UnconfiguredPurchaseStore),
                online: false,
            }),
        }
    }

    /// Assemble state from explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the saved session cannot be read.
    pub fn new(
        catalog: Catalog,
        store: Arc<dyn KeyValueStore>,
        provider: Arc<dyn IdentityProvider>,
        purchases: Arc<dyn PurchaseStore>,
    ) -> Result<Self, AppError> {
        let auth = Arc::new(AuthSession::restore(provider, store.clone())?);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                catalog,
                store,
                auth,
                purchases,
                online: true,
            }),
        })
    }

    /// Whether sign-in and purchases are available.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.inner.online
    }

    /// The product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// The authentication session.
    #[must_use]
    pub fn auth(&self) -> &Arc<AuthSession> {
        &self.inner.auth
    }

    /// The durable key-value store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner.store
    }

    /// Hydrate the cart from durable storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub fn open_cart(&self) -> Result<CartStore, StorageError> {
        CartStore::open(self.inner.store.clone())
    }

    /// A purchase flow that asks and reports through the given front end.
    #[must_use]
    pub fn purchase_flow(
        &self,
        confirm: Arc<dyn Confirm>,
        notifier: Arc<dyn Notifier>,
    ) -> PurchaseFlow {
        PurchaseFlow::new(
            self.inner.auth.clone(),
            self.inner.purchases.clone(),
            confirm,
            notifier,
        )
    }
}
