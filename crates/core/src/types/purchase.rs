//! Purchase records written to the remote document store.

use core::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{CartItem, Email, Identity, Price, ProductId, UserUid};

/// Collection that holds purchase documents.
pub const PURCHASES_COLLECTION: &str = "purchases";

/// Document key of a purchase: `{uid}-{epochMillis}`.
///
/// Unique per user unless two purchases land in the same millisecond.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PurchaseKey(String);

impl PurchaseKey {
    /// Build the key for a purchase made by `uid` at `at`.
    #[must_use]
    pub fn new(uid: &UserUid, at: DateTime<Utc>) -> Self {
        Self(format!("{uid}-{}", at.timestamp_millis()))
    }

    /// The raw document id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full document path, e.g. `purchases/abc-1700000000000`.
    #[must_use]
    pub fn document_path(&self) -> String {
        format!("{PURCHASES_COLLECTION}/{}", self.0)
    }
}

impl fmt::Display for PurchaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An immutable record of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub product_id: ProductId,
    pub title: String,
    pub price: Price,
    pub email: Option<Email>,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub purchase_date: String,
}

impl PurchaseRecord {
    /// Record `identity` buying `item` at `at`.
    #[must_use]
    pub fn new(item: &CartItem, identity: &Identity, at: DateTime<Utc>) -> Self {
        Self {
            product_id: item.id.clone(),
            title: item.title.clone(),
            price: item.price,
            email: identity.email.clone(),
            purchase_date: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
