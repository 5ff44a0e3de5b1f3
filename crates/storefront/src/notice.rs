//! User-facing notices and confirmation prompts.
//!
//! Every message the storefront shows the user is a [`Notice`] with a fixed
//! severity, title and text. Front ends decide how to render them by
//! implementing [`Notifier`]; blocking yes/no questions go through
//! [`Confirm`], which the purchase flow awaits as a suspension point.

use std::time::Duration;

use async_trait::async_trait;
use storefront_core::Price;

/// Visual severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
}

/// Which account action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    SignIn,
    SignOut,
}

/// A message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Ask the user to confirm buying an item.
    ConfirmPurchase { title: String, price: Price },
    /// The purchase record was written.
    PurchaseSucceeded,
    /// The purchase record could not be written.
    PurchaseFailed,
    /// A purchase was attempted without a signed-in user.
    LoginRequired,
    /// Sign-in completed.
    SignedIn,
    /// Sign-out completed.
    SignedOut,
    /// The identity provider rejected a sign-in or sign-out.
    AuthActionFailed { action: AuthAction, message: String },
}

impl Notice {
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::PurchaseSucceeded | Self::SignedIn | Self::SignedOut => Severity::Success,
            Self::PurchaseFailed | Self::AuthActionFailed { .. } => Severity::Error,
            Self::ConfirmPurchase { .. } | Self::LoginRequired => Severity::Warning,
        }
    }

    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::ConfirmPurchase { .. } => "Are you sure?".to_string(),
            Self::PurchaseSucceeded => "Purchase Successful!".to_string(),
            Self::PurchaseFailed => "Purchase Failed".to_string(),
            Self::LoginRequired => "Please Log In".to_string(),
            Self::SignedIn => "Login successful!".to_string(),
            Self::SignedOut => "Logged out successfully!".to_string(),
            Self::AuthActionFailed { action, message } => match action {
                AuthAction::SignIn => format!("Login failed: {message}"),
                AuthAction::SignOut => format!("Logout failed: {message}"),
            },
        }
    }

    /// Body text, if the notice has one.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        match self {
            Self::ConfirmPurchase { title, price } => Some(format!(
                "Do you want to buy {title} for {}?",
                price.display_inr()
            )),
            Self::PurchaseSucceeded => Some("Your order has been placed.".to_string()),
            Self::PurchaseFailed => {
                Some("Something went wrong while processing your purchase.".to_string())
            }
            Self::LoginRequired => Some("You must be logged in to make a purchase.".to_string()),
            Self::SignedIn | Self::SignedOut | Self::AuthActionFailed { .. } => None,
        }
    }

    /// Button labels `(confirm, cancel)` for question notices.
    #[must_use]
    pub const fn buttons(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::ConfirmPurchase { .. } => Some(("Yes, Buy Now!", "Cancel")),
            _ => None,
        }
    }

    /// How long a self-dismissing notice stays up.
    #[must_use]
    pub const fn auto_close(&self) -> Option<Duration> {
        match self {
            Self::SignedIn | Self::SignedOut => Some(Duration::from_millis(1500)),
            _ => None,
        }
    }
}

/// Shows notices to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Asks the user a yes/no question and waits for the answer.
#[async_trait]
pub trait Confirm: Send + Sync {
    /// Returns `true` when the user accepts.
    async fn confirm(&self, question: &Notice) -> bool;
}
