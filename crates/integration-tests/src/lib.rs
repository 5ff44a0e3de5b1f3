//! Integration tests for the storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory collaborators only
//! cargo test -p storefront-integration-tests
//!
//! # Also hit a real Firebase project
//! FIREBASE_API_KEY=... FIREBASE_PROJECT_ID=... SHOP_TEST_EMAIL=... SHOP_TEST_PASSWORD=... \
//!     cargo test -p storefront-integration-tests -- --ignored
//! ```
//!
//! This crate provides the shared harness: a [`TestShop`] wired with an
//! in-memory durable store, a scripted identity provider, an in-memory
//! purchase store, and recording front-end doubles.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use storefront::auth::{AuthError, Credentials, IdentityProvider, SignedIn};
use storefront::catalog::Catalog;
use storefront::firestore::MemoryPurchaseStore;
use storefront::notice::{Confirm, Notice, Notifier};
use storefront::purchase::PurchaseFlow;
use storefront::state::AppState;
use storefront::storage::{KeyValueStore, MemoryStore};
use storefront_core::{CartItem, Category, Identity, Price, ProductId, UserUid};

/// Password the [`ScriptedProvider`] accepts.
pub const GOOD_PASSWORD: &str = "correct horse";

/// Identity provider that accepts [`GOOD_PASSWORD`] for any email.
pub struct ScriptedProvider;

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignedIn, AuthError> {
        if credentials.password.expose_secret() != GOOD_PASSWORD {
            return Err(AuthError::Provider("INVALID_LOGIN_CREDENTIALS".to_string()));
        }
        Ok(SignedIn {
            identity: Identity {
                uid: UserUid::new(format!("uid-{}", credentials.email.local_part())),
                email: Some(credentials.email.clone()),
                photo_url: None,
            },
            id_token: SecretString::from("test-id-token"),
            refresh_token: None,
            expires_at: None,
        })
    }

    async fn sign_out(&self, _session: &SignedIn) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Provider whose tokens are already expired when issued.
///
/// Renewal succeeds with [`RENEWED_TOKEN`] when `renews` is set, otherwise
/// the provider refuses it as Firebase does for a revoked refresh token.
pub struct ExpiringProvider {
    pub renews: bool,
}

/// ID token handed out by a successful [`ExpiringProvider`] renewal.
pub const RENEWED_TOKEN: &str = "renewed-id-token";

#[async_trait]
impl IdentityProvider for ExpiringProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignedIn, AuthError> {
        let mut session = ScriptedProvider.sign_in(credentials).await?;
        session.refresh_token = Some(SecretString::from("test-refresh-token"));
        session.expires_at = Some(Utc::now() - TimeDelta::minutes(1));
        Ok(session)
    }

    async fn sign_out(&self, _session: &SignedIn) -> Result<(), AuthError> {
        Ok(())
    }

    async fn refresh(&self, session: &SignedIn) -> Result<SignedIn, AuthError> {
        if !self.renews {
            return Err(AuthError::Provider("TOKEN_EXPIRED".to_string()));
        }
        Ok(SignedIn {
            id_token: SecretString::from(RENEWED_TOKEN),
            expires_at: Some(Utc::now() + TimeDelta::hours(1)),
            ..session.clone()
        })
    }
}

/// Notifier that remembers every notice.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    /// Notices shown so far, in order.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
    }
}

/// Confirm prompt with a fixed answer that remembers the questions asked.
pub struct ScriptedConfirm {
    answer: bool,
    asked: Mutex<Vec<Notice>>,
}

impl ScriptedConfirm {
    #[must_use]
    pub const fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Questions asked so far.
    #[must_use]
    pub fn asked(&self) -> Vec<Notice> {
        self.asked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Confirm for ScriptedConfirm {
    async fn confirm(&self, question: &Notice) -> bool {
        self.asked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(question.clone());
        self.answer
    }
}

/// A fully wired storefront over in-memory collaborators.
pub struct TestShop {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub purchases: Arc<MemoryPurchaseStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub confirm: Arc<ScriptedConfirm>,
}

impl TestShop {
    /// A shop whose confirmation prompt always answers `confirm`.
    ///
    /// # Panics
    ///
    /// Panics if the bundled catalog is invalid.
    #[must_use]
    pub fn new(confirm: bool) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), confirm)
    }

    /// Same as [`TestShop::new`] over an existing store.
    ///
    /// # Panics
    ///
    /// Panics if the bundled catalog is invalid.
    #[must_use]
    pub fn with_store(store: Arc<MemoryStore>, confirm: bool) -> Self {
        Self::with_provider(store, Arc::new(ScriptedProvider), confirm)
    }

    /// A shop signing in through `provider`.
    ///
    /// # Panics
    ///
    /// Panics if the bundled catalog is invalid.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_provider(
        store: Arc<MemoryStore>,
        provider: Arc<dyn IdentityProvider>,
        confirm: bool,
    ) -> Self {
        let purchases = Arc::new(MemoryPurchaseStore::new());
        let state = AppState::new(
            Catalog::bundled().expect("bundled catalog"),
            store.clone() as Arc<dyn KeyValueStore>,
            provider,
            purchases.clone(),
        )
        .expect("memory store never fails");

        Self::assemble(state, store, purchases, confirm)
    }

    /// A shop with no identity provider or purchase store configured.
    ///
    /// `purchases` stays empty; nothing can reach it.
    ///
    /// # Panics
    ///
    /// Panics if the bundled catalog is invalid.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn offline(store: Arc<MemoryStore>) -> Self {
        let state = AppState::offline(
            Catalog::bundled().expect("bundled catalog"),
            store.clone() as Arc<dyn KeyValueStore>,
        );
        Self::assemble(state, store, Arc::new(MemoryPurchaseStore::new()), true)
    }

    fn assemble(
        state: AppState,
        store: Arc<MemoryStore>,
        purchases: Arc<MemoryPurchaseStore>,
        confirm: bool,
    ) -> Self {
        Self {
            state,
            store,
            purchases,
            notifier: Arc::new(RecordingNotifier::default()),
            confirm: Arc::new(ScriptedConfirm::answering(confirm)),
        }
    }

    /// Purchase flow reporting to this shop's doubles.
    #[must_use]
    pub fn flow(&self) -> PurchaseFlow {
        self.state
            .purchase_flow(self.confirm.clone(), self.notifier.clone())
    }

    /// Sign in as `email` with the accepted password.
    ///
    /// # Panics
    ///
    /// Panics if the email is malformed.
    #[allow(clippy::expect_used)]
    pub async fn sign_in(&self, email: &str) -> Identity {
        let credentials = Credentials::new(email, GOOD_PASSWORD).expect("valid email");
        self.state
            .auth()
            .sign_in(&credentials)
            .await
            .expect("scripted provider accepts the good password")
    }

    /// Raw JSON currently stored under `key`.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn stored(&self, key: &str) -> Option<String> {
        self.store.get(key).expect("memory store never fails")
    }
}

/// A cart item that is not in the bundled catalog.
#[must_use]
pub fn item(id: &str, category: &str, price: i64) -> CartItem {
    CartItem {
        id: ProductId::new(id),
        title: format!("Test product {id}"),
        description: format!("A {category} for testing"),
        price: Price::from_rupees(price),
        img_src: format!("/images/test/{id}.png"),
        category: Category::from(category),
    }
}
