//! Firebase Authentication (Identity Toolkit REST API) client.
//!
//! Signs users in with email and password, then looks up the account to
//! pick up the profile photo. Signing out is local: Firebase ID tokens are
//! not revoked server-side, the session simply forgets them.
//!
//! ID tokens last an hour. They are renewed by exchanging the refresh token
//! at the Secure Token API (`{token_url}/v1/token`).

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use storefront_core::{Email, Identity, UserUid};
use tracing::{debug, instrument};
use url::Url;

use super::{AuthError, Credentials, IdentityProvider, SignedIn};
use crate::config::FirebaseConfig;

/// Identity Toolkit API client.
#[derive(Clone)]
pub struct FirebaseAuthClient {
    client: reqwest::Client,
    base_url: Url,
    token_url: Url,
    api_key: SecretString,
}

impl FirebaseAuthClient {
    /// Create a new Identity Toolkit client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &FirebaseConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// URL of an `accounts:*` endpoint, keyed with the project's API key.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL cannot be joined.
    pub fn endpoint(&self, method: &str) -> Result<Url, AuthError> {
        let mut url = self.base_url.join(&format!("v1/accounts:{method}"))?;
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        Ok(url)
    }

    /// Secure Token endpoint used to renew ID tokens.
    ///
    /// # Errors
    ///
    /// Returns error if the token URL cannot be joined.
    pub fn token_endpoint(&self) -> Result<Url, AuthError> {
        let mut url = self.token_url.join("v1/token")?;
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        Ok(url)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, AuthError> {
        let response = self
            .client
            .post(self.endpoint(method)?)
            .json(body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(provider_error(status, &text));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))
    }

    /// Fetch the account's profile photo, if it has one.
    async fn lookup_photo(&self, id_token: &SecretString) -> Result<Option<String>, AuthError> {
        let body = serde_json::json!({ "idToken": id_token.expose_secret() });
        let lookup: LookupResponse = self.post("lookup", &body).await?;
        Ok(lookup
            .users
            .into_iter()
            .next()
            .and_then(|user| user.photo_url))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    #[instrument(skip(self, credentials), fields(email = %credentials.email.masked()))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignedIn, AuthError> {
        let body = serde_json::json!({
            "email": credentials.email.as_str(),
            "password": credentials.password.expose_secret(),
            "returnSecureToken": true,
        });
        let response: SignInResponse = self.post("signInWithPassword", &body).await?;

        let id_token = SecretString::from(response.id_token);
        // A missing photo is not worth failing the sign-in over.
        let photo_url = match self.lookup_photo(&id_token).await {
            Ok(photo) => photo,
            Err(e) => {
                debug!(error = %e, "Account lookup failed, continuing without photo");
                None
            }
        };

        let email = match response.email.as_deref() {
            Some(raw) => Some(Email::parse(raw)?),
            None => Some(credentials.email.clone()),
        };

        Ok(SignedIn {
            identity: Identity {
                uid: UserUid::new(response.local_id),
                email,
                photo_url,
            },
            id_token,
            refresh_token: response.refresh_token.map(SecretString::from),
            expires_at: expiry(response.expires_in.as_deref(), Utc::now()),
        })
    }

    #[instrument(skip(self, session), fields(uid = %session.identity.uid))]
    async fn refresh(&self, session: &SignedIn) -> Result<SignedIn, AuthError> {
        let Some(refresh_token) = &session.refresh_token else {
            return Err(AuthError::SessionExpired);
        };

        let response = self
            .client
            .post(self.token_endpoint()?)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.expose_secret()),
            ])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(provider_error(status, &text));
        }

        let renewed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
        if renewed.user_id != session.identity.uid.as_str() {
            return Err(AuthError::MalformedResponse(
                "renewed token belongs to another user".to_string(),
            ));
        }

        Ok(SignedIn {
            identity: session.identity.clone(),
            id_token: SecretString::from(renewed.id_token),
            refresh_token: Some(SecretString::from(renewed.refresh_token)),
            expires_at: expiry(Some(&renewed.expires_in), Utc::now()),
        })
    }

    async fn sign_out(&self, session: &SignedIn) -> Result<(), AuthError> {
        debug!(uid = %session.identity.uid, "Discarding Firebase ID token");
        Ok(())
    }
}

/// Turn an Identity Toolkit error body into an [`AuthError`].
///
/// Error bodies look like `{"error":{"code":400,"message":"EMAIL_NOT_FOUND"}}`.
/// Server errors mean the service is down, not that it refused us.
fn provider_error(status: StatusCode, body: &str) -> AuthError {
    if status.is_server_error() {
        return AuthError::Unavailable(status.as_u16());
    }
    serde_json::from_str::<ErrorResponse>(body).map_or_else(
        |_| AuthError::Provider(format!("HTTP {}", status.as_u16())),
        |parsed| AuthError::Provider(parsed.error.message),
    )
}

/// Expiry instant from a lifetime in seconds, sent as a decimal string.
fn expiry(expires_in: Option<&str>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let seconds = expires_in?.parse::<i64>().ok()?;
    Some(now + TimeDelta::seconds(seconds))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
}

/// Secure Token API answer; unlike Identity Toolkit it is `snake_case`.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    #[serde(default)]
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> FirebaseAuthClient {
        FirebaseAuthClient::new(&FirebaseConfig {
            api_key: SecretString::from("AIzaTestKey"),
            project_id: "e-cart".to_string(),
            auth_url: Url::parse("https://identitytoolkit.googleapis.com").unwrap(),
            token_url: Url::parse("https://securetoken.googleapis.com").unwrap(),
            firestore_url: Url::parse("https://firestore.googleapis.com").unwrap(),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_carries_api_key() {
        let url = client().endpoint("signInWithPassword").unwrap();
        assert_eq!(
            url.as_str(),
            "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword?key=AIzaTestKey"
        );
    }

    #[test]
    fn test_provider_error_extracts_message() {
        let err = provider_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":400,"message":"EMAIL_NOT_FOUND","errors":[]}}"#,
        );
        assert!(matches!(err, AuthError::Provider(ref m) if m == "EMAIL_NOT_FOUND"));
    }

    #[test]
    fn test_provider_error_without_json_body() {
        let err = provider_error(StatusCode::NOT_FOUND, "<html>");
        assert!(matches!(err, AuthError::Provider(ref m) if m == "HTTP 404"));
    }

    #[test]
    fn test_server_error_is_unavailable_not_a_refusal() {
        let err = provider_error(
            StatusCode::BAD_GATEWAY,
            r#"{"error":{"code":502,"message":"BACKEND"}}"#,
        );
        assert!(matches!(err, AuthError::Unavailable(502)));
        assert!(!err.ends_session());

        let refused = provider_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"code":400,"message":"TOKEN_EXPIRED","status":"INVALID_ARGUMENT"}}"#,
        );
        assert!(refused.ends_session());
    }

    #[test]
    fn test_token_endpoint_carries_api_key() {
        let url = client().token_endpoint().unwrap();
        assert_eq!(
            url.as_str(),
            "https://securetoken.googleapis.com/v1/token?key=AIzaTestKey"
        );
    }

    #[test]
    fn test_expiry_from_lifetime() {
        let now = Utc::now();
        assert_eq!(expiry(Some("3600"), now), Some(now + TimeDelta::hours(1)));
        assert_eq!(expiry(Some("soon"), now), None);
        assert_eq!(expiry(None, now), None);
    }

    #[test]
    fn test_refresh_response_shape() {
        let parsed: RefreshResponse = serde_json::from_str(
            r#"{
                "expires_in": "3600",
                "token_type": "Bearer",
                "refresh_token": "AEu4IL1",
                "id_token": "eyJrenewed",
                "user_id": "ZY1rJK0eYLg",
                "project_id": "1234567890"
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.id_token, "eyJrenewed");
        assert_eq!(parsed.user_id, "ZY1rJK0eYLg");
        assert_eq!(parsed.expires_in, "3600");
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_expires_session() {
        let session = SignedIn {
            identity: Identity {
                uid: UserUid::new("u"),
                email: None,
                photo_url: None,
            },
            id_token: SecretString::from("t"),
            refresh_token: None,
            expires_at: None,
        };
        let err = client().refresh(&session).await.unwrap_err();
        assert!(matches!(err, AuthError::SessionExpired));
    }

    #[test]
    fn test_sign_in_response_shape() {
        let parsed: SignInResponse = serde_json::from_str(
            r#"{
                "kind": "identitytoolkit#VerifyPasswordResponse",
                "localId": "ZY1rJK0eYLg",
                "email": "shopper@example.com",
                "displayName": "",
                "idToken": "eyJhbGciOi",
                "registered": true,
                "refreshToken": "AEu4IL0",
                "expiresIn": "3600"
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.local_id, "ZY1rJK0eYLg");
        assert_eq!(parsed.refresh_token.as_deref(), Some("AEu4IL0"));
        assert_eq!(parsed.expires_in.as_deref(), Some("3600"));
    }
}
