//! Remote document store for purchase records.
//!
//! Purchases are written to Cloud Firestore through its REST API as
//! `purchases/{uid}-{epochMillis}` documents, authorized with the signed-in
//! user's ID token. The write is a full overwrite (set), not a merge.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use storefront_core::{PurchaseKey, PurchaseRecord};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::FirebaseConfig;

/// Errors that can occur when writing to Firestore.
#[derive(Debug, Error)]
pub enum FirestoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Document URL could not be built.
    #[error("invalid document URL: {0}")]
    Url(#[from] url::ParseError),

    /// Write rejected by a test double.
    #[error("write rejected: {0}")]
    Rejected(String),

    /// No Firebase project is configured.
    #[error("purchase store not configured")]
    NotConfigured,
}

/// Destination for purchase records.
#[async_trait]
pub trait PurchaseStore: Send + Sync {
    /// Write `record` at `key`, authorized by `id_token`.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError` on any transport, permission or validation
    /// failure.
    async fn write(
        &self,
        key: &PurchaseKey,
        record: &PurchaseRecord,
        id_token: &SecretString,
    ) -> Result<(), FirestoreError>;
}

// =============================================================================
// REST client
// =============================================================================

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    client: reqwest::Client,
    documents_url: Url,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the project
    /// document URL is invalid.
    pub fn new(config: &FirebaseConfig) -> Result<Self, FirestoreError> {
        let client = reqwest::Client::builder().build()?;
        let documents_url = config.firestore_url.join(&format!(
            "v1/projects/{}/databases/(default)/documents/",
            config.project_id
        ))?;

        Ok(Self {
            client,
            documents_url,
        })
    }

    /// URL of the document at `key`.
    ///
    /// # Errors
    ///
    /// Returns error if the key produces an invalid URL.
    pub fn document_url(&self, key: &PurchaseKey) -> Result<Url, FirestoreError> {
        Ok(self.documents_url.join(&key.document_path())?)
    }
}

#[async_trait]
impl PurchaseStore for FirestoreClient {
    #[instrument(skip(self, record, id_token), fields(document = %key))]
    async fn write(
        &self,
        key: &PurchaseKey,
        record: &PurchaseRecord,
        id_token: &SecretString,
    ) -> Result<(), FirestoreError> {
        let url = self.document_url(key)?;
        let response = self
            .client
            .patch(url)
            .bearer_auth(id_token.expose_secret())
            .json(&document_body(record))
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FirestoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Encode a record as a Firestore document with typed field values.
#[must_use]
pub fn document_body(record: &PurchaseRecord) -> Value {
    let price = if record.price.is_whole() {
        json!({ "integerValue": record.price.to_string() })
    } else {
        json!({ "doubleValue": record.price.amount().to_f64().unwrap_or_default() })
    };
    let email = record.email.as_ref().map_or_else(
        || json!({ "nullValue": null }),
        |email| json!({ "stringValue": email.as_str() }),
    );

    json!({
        "fields": {
            "productId": { "stringValue": record.product_id.as_str() },
            "title": { "stringValue": record.title },
            "price": price,
            "email": email,
            "purchaseDate": { "stringValue": record.purchase_date },
        }
    })
}

/// Stand-in used when no Firebase project is configured; refuses every write.
#[derive(Debug, Default)]
pub struct UnconfiguredPurchaseStore;

#[async_trait]
impl PurchaseStore for UnconfiguredPurchaseStore {
    async fn write(
        &self,
        _key: &PurchaseKey,
        _record: &PurchaseRecord,
        _id_token: &SecretString,
    ) -> Result<(), FirestoreError> {
        Err(FirestoreError::NotConfigured)
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Records writes in memory. Can be switched into a failing mode.
#[derive(Debug, Default)]
pub struct MemoryPurchaseStore {
    written: Mutex<Vec<(PurchaseKey, PurchaseRecord)>>,
    failure: Mutex<Option<String>>,
}

impl MemoryPurchaseStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    /// Everything written so far, in order.
    #[must_use]
    pub fn written(&self) -> Vec<(PurchaseKey, PurchaseRecord)> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PurchaseStore for MemoryPurchaseStore {
    async fn write(
        &self,
        key: &PurchaseKey,
        record: &PurchaseRecord,
        _id_token: &SecretString,
    ) -> Result<(), FirestoreError> {
        let failure = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(message) = failure {
            return Err(FirestoreError::Rejected(message));
        }

        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((key.clone(), record.clone()));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use storefront_core::{Email, Price, ProductId, UserUid};

    use super::*;

    fn record(price: Price, email: Option<&str>) -> PurchaseRecord {
        PurchaseRecord {
            product_id: ProductId::new("3"),
            title: "iPad Air".to_string(),
            price,
            email: email.map(|e| Email::parse(e).unwrap()),
            purchase_date: "2024-05-01T10:00:00.000Z".to_string(),
        }
    }

    fn config() -> FirebaseConfig {
        FirebaseConfig {
            api_key: SecretString::from("key"),
            project_id: "e-cart".to_string(),
            auth_url: Url::parse("https://identitytoolkit.googleapis.com").unwrap(),
            token_url: Url::parse("https://securetoken.googleapis.com").unwrap(),
            firestore_url: Url::parse("https://firestore.googleapis.com").unwrap(),
        }
    }

    #[test]
    fn test_document_url() {
        let client = FirestoreClient::new(&config()).unwrap();
        let at = Utc.timestamp_millis_opt(1_714_557_600_000).unwrap();
        let key = PurchaseKey::new(&UserUid::new("uid42"), at);

        assert_eq!(
            client.document_url(&key).unwrap().as_str(),
            "https://firestore.googleapis.com/v1/projects/e-cart/databases/(default)/documents/purchases/uid42-1714557600000"
        );
    }

    #[test]
    fn test_document_body_whole_price() {
        let body = document_body(&record(Price::from_rupees(54999), Some("a@b.co")));
        let fields = &body["fields"];

        assert_eq!(fields["productId"]["stringValue"], "3");
        assert_eq!(fields["title"]["stringValue"], "iPad Air");
        assert_eq!(fields["price"]["integerValue"], "54999");
        assert_eq!(fields["email"]["stringValue"], "a@b.co");
        assert_eq!(fields["purchaseDate"]["stringValue"], "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn test_document_body_fractional_price_and_missing_email() {
        let body = document_body(&record("199.5".parse().unwrap(), None));
        let fields = &body["fields"];

        assert_eq!(fields["price"]["doubleValue"], 199.5);
        assert!(fields["email"]["nullValue"].is_null());
        assert!(fields["email"].get("nullValue").is_some());
    }

    #[tokio::test]
    async fn test_memory_store_records_and_fails() {
        let store = MemoryPurchaseStore::new();
        let token = SecretString::from("t");
        let key = PurchaseKey::new(&UserUid::new("u"), Utc::now());

        store
            .write(&key, &record(Price::from_rupees(1), None), &token)
            .await
            .unwrap();
        assert_eq!(store.written().len(), 1);

        store.fail_with("permission denied");
        let err = store
            .write(&key, &record(Price::from_rupees(1), None), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, FirestoreError::Rejected(_)));
        assert_eq!(store.written().len(), 1);
    }

    #[tokio::test]
    async fn test_unconfigured_store_refuses_writes() {
        let key = PurchaseKey::new(&UserUid::new("u"), Utc::now());
        let err = UnconfiguredPurchaseStore
            .write(&key, &record(Price::from_rupees(1), None), &SecretString::from("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, FirestoreError::NotConfigured));
    }
}
