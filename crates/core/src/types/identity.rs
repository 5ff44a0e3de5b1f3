//! Authenticated user identity.

use serde::{Deserialize, Serialize};

use super::{Email, UserUid};

/// Profile picture shown when the provider has no photo for the account.
pub const DEFAULT_AVATAR_URL: &str = "https://www.example.com/default-profile-picture.png";

/// The signed-in user as reported by the identity provider.
///
/// Its lifecycle belongs to the provider; the storefront only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: UserUid,
    #[serde(default)]
    pub email: Option<Email>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl Identity {
    /// Profile picture URL, falling back to [`DEFAULT_AVATAR_URL`].
    #[must_use]
    pub fn avatar_url(&self) -> &str {
        self.photo_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_AVATAR_URL)
    }
}
