//! Authentication session.
//!
//! The identity provider owns the user's lifecycle; the storefront keeps an
//! [`AuthSession`] that remembers who is signed in, persists that across
//! restarts, and tells interested parties when it changes.
//!
//! # Subscriptions
//!
//! [`AuthSession::subscribe`] returns an [`AuthSubscription`]. The current
//! state is delivered first, followed by every transition exactly once and
//! in order. Dropping the handle unregisters it; nothing is delivered after
//! that.
//!
//! # Token renewal
//!
//! ID tokens are short-lived. [`AuthSession::fresh_id_token`] renews a token
//! that is about to expire through [`IdentityProvider::refresh`]; when the
//! provider refuses, the session ends and the user is signed out.

mod error;
pub mod firebase;

pub use error::AuthError;
pub use firebase::FirebaseAuthClient;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use storefront_core::{Email, Identity};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::storage::{KeyValueStore, StorageError};

/// Durable-store key holding the signed-in session.
pub const SESSION_KEY: &str = "auth_user";

/// Tokens expiring within this many seconds are renewed before use.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Email/password credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

impl Credentials {
    /// Build credentials from raw user input.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email is malformed.
    pub fn new(email: &str, password: impl Into<String>) -> Result<Self, AuthError> {
        Ok(Self {
            email: Email::parse(email)?,
            password: SecretString::from(password.into()),
        })
    }
}

/// A successful sign-in: who, plus the token that authorizes their writes.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub identity: Identity,
    pub id_token: SecretString,
    pub refresh_token: Option<SecretString>,
    /// When `id_token` stops being accepted. `None` if the provider did not say.
    pub expires_at: Option<DateTime<Utc>>,
}

impl SignedIn {
    /// Whether the ID token expires within the renewal margin of `now`.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| now + TimeDelta::seconds(REFRESH_MARGIN_SECS) >= at)
    }
}

/// Authentication state as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    SignedIn(Identity),
    SignedOut,
}

impl AuthState {
    /// The signed-in identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            Self::SignedOut => None,
        }
    }
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange credentials for a signed-in session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the provider rejects the credentials or
    /// cannot be reached.
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignedIn, AuthError>;

    /// End a session with the provider.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the provider rejects the request.
    async fn sign_out(&self, session: &SignedIn) -> Result<(), AuthError>;

    /// Exchange the session's refresh token for a new ID token.
    ///
    /// Providers that cannot renew sessions keep this default, which ends
    /// the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the session cannot be renewed.
    async fn refresh(&self, _session: &SignedIn) -> Result<SignedIn, AuthError> {
        Err(AuthError::SessionExpired)
    }
}

/// Provider used when no identity service is configured.
///
/// Nobody can sign in; any saved session is ended on first use.
pub struct UnconfiguredProvider;

#[async_trait]
impl IdentityProvider for UnconfiguredProvider {
    async fn sign_in(&self, _credentials: &Credentials) -> Result<SignedIn, AuthError> {
        Err(AuthError::NotConfigured)
    }

    async fn sign_out(&self, _session: &SignedIn) -> Result<(), AuthError> {
        Ok(())
    }

    async fn refresh(&self, _session: &SignedIn) -> Result<SignedIn, AuthError> {
        Err(AuthError::NotConfigured)
    }
}

/// Persisted form of [`SignedIn`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    user: Identity,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl From<&SignedIn> for StoredSession {
    fn from(session: &SignedIn) -> Self {
        Self {
            user: session.identity.clone(),
            id_token: session.id_token.expose_secret().to_owned(),
            refresh_token: session
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().to_owned()),
            expires_at: session.expires_at,
        }
    }
}

impl From<StoredSession> for SignedIn {
    fn from(stored: StoredSession) -> Self {
        Self {
            identity: stored.user,
            id_token: SecretString::from(stored.id_token),
            refresh_token: stored.refresh_token.map(SecretString::from),
            expires_at: stored.expires_at,
        }
    }
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    senders: HashMap<u64, mpsc::UnboundedSender<AuthState>>,
}

impl Subscribers {
    fn broadcast(&mut self, state: &AuthState) {
        self.senders
            .retain(|_, sender| sender.send(state.clone()).is_ok());
    }
}

/// Who is signed in, persisted and observable.
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn KeyValueStore>,
    current: Mutex<Option<SignedIn>>,
    subscribers: Arc<Mutex<Subscribers>>,
}

impl AuthSession {
    /// Restore the session saved in `store`, if any.
    ///
    /// A saved session that cannot be parsed is discarded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read, or a corrupt
    /// session cannot be removed.
    pub fn restore(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, StorageError> {
        let current = match store.get(SESSION_KEY)? {
            None => None,
            Some(raw) => match serde_json::from_str::<StoredSession>(&raw) {
                Ok(stored) => Some(SignedIn::from(stored)),
                Err(e) => {
                    warn!(error = %e, "Discarding corrupt stored session");
                    store.remove(SESSION_KEY)?;
                    None
                }
            },
        };

        Ok(Self {
            provider,
            store,
            current: Mutex::new(current),
            subscribers: Arc::new(Mutex::new(Subscribers::default())),
        })
    }

    /// A session that starts signed out and leaves any saved session alone.
    ///
    /// Used when no identity provider is configured, so that a session saved
    /// by a configured run survives until one comes back.
    #[must_use]
    pub fn signed_out(provider: Arc<dyn IdentityProvider>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            provider,
            store,
            current: Mutex::new(None),
            subscribers: Arc::new(Mutex::new(Subscribers::default())),
        }
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<Identity> {
        self.lock_current().as_ref().map(|s| s.identity.clone())
    }

    /// ID token of the signed-in user, if any, as last issued.
    ///
    /// May be expired; use [`AuthSession::fresh_id_token`] before writes.
    #[must_use]
    pub fn id_token(&self) -> Option<SecretString> {
        self.lock_current().as_ref().map(|s| s.id_token.clone())
    }

    /// ID token of the signed-in user, renewed first if it is about to expire.
    ///
    /// Returns `Ok(None)` when nobody is signed in, or when the provider
    /// refuses to renew the session; in that case the user is signed out.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the provider cannot be reached. The session
    /// is kept.
    pub async fn fresh_id_token(&self) -> Result<Option<SecretString>, AuthError> {
        let Some(session) = self.lock_current().clone() else {
            return Ok(None);
        };
        if !session.needs_refresh(Utc::now()) {
            return Ok(Some(session.id_token));
        }

        match self.provider.refresh(&session).await {
            Ok(renewed) => {
                let token = renewed.id_token.clone();
                if self.renew(renewed) {
                    debug!(uid = %session.identity.uid, "ID token renewed");
                    Ok(Some(token))
                } else {
                    Ok(None)
                }
            }
            Err(e) if e.ends_session() => {
                warn!(uid = %session.identity.uid, error = %e, "Session could not be renewed, signing out");
                self.expire(&session);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Current state in subscriber form.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.current_user()
            .map_or(AuthState::SignedOut, AuthState::SignedIn)
    }

    /// Sign in with the provider and remember the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the provider rejects the credentials or the
    /// session cannot be persisted. Subscribers are only notified on success.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let session = self.provider.sign_in(credentials).await?;
        self.save(&session)?;

        let identity = session.identity.clone();
        self.transition(Some(session));
        info!(uid = %identity.uid, "Signed in");
        Ok(identity)
    }

    /// Sign out of the provider and forget the session.
    ///
    /// Signing out while signed out is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the provider rejects the request or the saved
    /// session cannot be removed; the session stays active in that case.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.lock_current().clone() else {
            return Ok(());
        };

        self.provider.sign_out(&session).await?;
        self.store.remove(SESSION_KEY)?;
        self.transition(None);
        info!(uid = %session.identity.uid, "Signed out");
        Ok(())
    }

    /// Subscribe to authentication changes.
    #[must_use]
    pub fn subscribe(&self) -> AuthSubscription {
        let (tx, rx) = mpsc::unbounded_channel();

        // Lock order: current, then subscribers (same as `transition`).
        let current = self.lock_current();
        let initial = current
            .as_ref()
            .map_or(AuthState::SignedOut, |s| AuthState::SignedIn(s.identity.clone()));

        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        // Receiver is alive, so this send cannot fail.
        let _ = tx.send(initial);
        subscribers.senders.insert(id, tx);
        drop(subscribers);
        drop(current);

        AuthSubscription {
            id,
            rx,
            registry: Arc::downgrade(&self.subscribers),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .senders
            .len()
    }

    fn save(&self, session: &SignedIn) -> Result<(), AuthError> {
        let json = serde_json::to_string(&StoredSession::from(session))
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
        self.store.set(SESSION_KEY, &json)?;
        Ok(())
    }

    /// Swap in a renewed token for the same user. Not a transition.
    ///
    /// Returns false if the user changed or signed out meanwhile.
    fn renew(&self, renewed: SignedIn) -> bool {
        let mut current = self.lock_current();
        let same_user = current
            .as_ref()
            .is_some_and(|s| s.identity.uid == renewed.identity.uid);
        if !same_user {
            return false;
        }
        // The renewed token still works for this run if it cannot be saved.
        if let Err(e) = self.save(&renewed) {
            warn!(error = %e, "Renewed session could not be saved");
        }
        *current = Some(renewed);
        true
    }

    /// End `session` locally if it is still the current one.
    fn expire(&self, session: &SignedIn) {
        let still_current = self
            .lock_current()
            .as_ref()
            .is_some_and(|s| s.identity.uid == session.identity.uid);
        if !still_current {
            return;
        }
        if let Err(e) = self.store.remove(SESSION_KEY) {
            warn!(error = %e, "Expired session could not be removed");
        }
        self.transition(None);
    }

    fn transition(&self, next: Option<SignedIn>) {
        let mut current = self.lock_current();
        let state = next
            .as_ref()
            .map_or(AuthState::SignedOut, |s| AuthState::SignedIn(s.identity.clone()));
        *current = next;
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .broadcast(&state);
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<SignedIn>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Live subscription to [`AuthSession`] changes. Unregisters on drop.
pub struct AuthSubscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<AuthState>,
    registry: Weak<Mutex<Subscribers>>,
}

impl AuthSubscription {
    /// Wait for the next state. Returns `None` once the session is gone.
    pub async fn next(&mut self) -> Option<AuthState> {
        self.rx.recv().await
    }

    /// Take the next state if one is already queued.
    pub fn try_next(&mut self) -> Option<AuthState> {
        self.rx.try_recv().ok()
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .senders
                .remove(&self.id);
        }
    }
}
