//! Authentication error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] storefront_core::EmailError),

    /// The identity provider rejected the request (e.g. `INVALID_PASSWORD`).
    #[error("identity provider rejected request: {0}")]
    Provider(String),

    /// HTTP request to the identity provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider endpoint URL could not be built.
    #[error("invalid provider URL: {0}")]
    Url(#[from] url::ParseError),

    /// The provider answered without the fields we need.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// The identity provider answered with a server error.
    #[error("identity provider unavailable (HTTP {0})")]
    Unavailable(u16),

    /// The session can no longer be renewed; the user must sign in again.
    #[error("session expired")]
    SessionExpired,

    /// No identity provider is configured.
    #[error("identity provider not configured")]
    NotConfigured,

    /// Persisting or clearing the local session failed.
    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Short message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(e) => e.to_string(),
            Self::Provider(code) => match code.split(':').next().unwrap_or_default().trim() {
                "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                    "invalid email or password".to_string()
                }
                "USER_DISABLED" => "this account has been disabled".to_string(),
                "TOO_MANY_ATTEMPTS_TRY_LATER" => {
                    "too many attempts, please try again later".to_string()
                }
                other => other.to_lowercase().replace('_', " "),
            },
            Self::Http(_) | Self::Unavailable(_) => {
                "could not reach the sign-in service".to_string()
            }
            Self::SessionExpired => "your session has expired, please log in again".to_string(),
            Self::NotConfigured => {
                "sign-in is unavailable: FIREBASE_API_KEY and FIREBASE_PROJECT_ID are not set"
                    .to_string()
            }
            Self::Url(_) | Self::MalformedResponse(_) => {
                "unexpected response from the sign-in service".to_string()
            }
            Self::Storage(_) => "could not save the session on this device".to_string(),
        }
    }

    /// Whether this error points at our side rather than the user's input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::Unavailable(_)
                | Self::Url(_)
                | Self::MalformedResponse(_)
                | Self::Storage(_)
        )
    }

    /// Whether the provider has refused to keep the session alive.
    ///
    /// Transport and server failures do not end a session.
    #[must_use]
    pub const fn ends_session(&self) -> bool {
        matches!(
            self,
            Self::Provider(_) | Self::SessionExpired | Self::NotConfigured
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_codes_map_to_friendly_messages() {
        assert_eq!(
            AuthError::Provider("INVALID_LOGIN_CREDENTIALS".to_string()).user_message(),
            "invalid email or password"
        );
        assert_eq!(
            AuthError::Provider("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled".to_string())
                .user_message(),
            "too many attempts, please try again later"
        );
        assert_eq!(
            AuthError::Provider("OPERATION_NOT_ALLOWED".to_string()).user_message(),
            "operation not allowed"
        );
    }

    #[test]
    fn test_internal_classification() {
        assert!(!AuthError::Provider("USER_DISABLED".to_string()).is_internal());
        assert!(AuthError::MalformedResponse("no idToken".to_string()).is_internal());
        assert!(!AuthError::SessionExpired.is_internal());
    }

    #[test]
    fn test_only_provider_refusals_end_a_session() {
        assert!(AuthError::Provider("TOKEN_EXPIRED".to_string()).ends_session());
        assert!(AuthError::SessionExpired.ends_session());
        assert!(!AuthError::Unavailable(503).ends_session());
        assert!(!AuthError::MalformedResponse("no id_token".to_string()).ends_session());
    }
}
