//! Account actions as seen from the navigation bar.
//!
//! Sign-in and sign-out failures stop here: they are turned into a
//! [`Notice::AuthActionFailed`] and never reach the caller as errors.

use storefront_core::Identity;

use crate::auth::{AuthSession, Credentials};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::notice::{AuthAction, Notice, Notifier};

/// Sign in and tell the user how it went.
pub async fn sign_in_and_notify(
    auth: &AuthSession,
    notifier: &dyn Notifier,
    credentials: &Credentials,
) -> Option<Identity> {
    match auth.sign_in(credentials).await {
        Ok(identity) => {
            set_sentry_user(&identity.uid, identity.email.as_ref().map(|e| e.as_str()));
            notifier.notify(&Notice::SignedIn);
            Some(identity)
        }
        Err(e) => {
            let message = e.user_message();
            AppError::from(e).capture();
            notifier.notify(&Notice::AuthActionFailed {
                action: AuthAction::SignIn,
                message,
            });
            None
        }
    }
}

/// Sign out and tell the user how it went. Returns whether it succeeded.
pub async fn sign_out_and_notify(auth: &AuthSession, notifier: &dyn Notifier) -> bool {
    match auth.sign_out().await {
        Ok(()) => {
            clear_sentry_user();
            notifier.notify(&Notice::SignedOut);
            true
        }
        Err(e) => {
            let message = e.user_message();
            AppError::from(e).capture();
            notifier.notify(&Notice::AuthActionFailed {
                action: AuthAction::SignOut,
                message,
            });
            false
        }
    }
}
