//! Shopping cart store.
//!
//! [`CartStore`] owns the in-memory cart and mirrors it into a
//! [`KeyValueStore`] under the [`CART_KEY`] key. Every mutation goes through
//! one explicit persist step that runs before the in-memory state is
//! replaced, so the two sides never diverge: a failed write leaves both
//! untouched.
//!
//! An empty cart is stored as an absent key, never as `[]`.

use std::sync::Arc;

use storefront_core::{CartItem, Price, ProductId};
use tracing::{debug, warn};

use crate::storage::{KeyValueStore, StorageError};

/// Durable-store key holding the JSON-encoded cart.
pub const CART_KEY: &str = "cart";

/// The user's cart, synchronized with durable storage.
pub struct CartStore {
    items: Vec<CartItem>,
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Hydrate the cart from durable storage.
    ///
    /// A missing key yields an empty cart. A value that does not parse as a
    /// cart is discarded: the key is removed and the cart starts empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read, or if a corrupt
    /// value cannot be removed.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let items = match store.get(CART_KEY)? {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<CartItem>>(&raw) {
                Ok(items) => items,
                Err(e) => {
                    warn!(error = %e, "Discarding corrupt stored cart");
                    store.remove(CART_KEY)?;
                    Vec::new()
                }
            },
        };

        debug!(items = items.len(), "Cart hydrated");
        Ok(Self { items, store })
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of items in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether an item with `id` is in the cart.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    /// Sum of all item prices.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(|item| item.price).sum()
    }

    /// Append an item.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the updated cart cannot be persisted; the
    /// cart is left unchanged.
    pub fn add(&mut self, item: CartItem) -> Result<(), StorageError> {
        let mut next = self.items.clone();
        next.push(item);
        self.commit(next)
    }

    /// Remove every item with `id`. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the updated cart cannot be persisted; the
    /// cart is left unchanged.
    pub fn remove(&mut self, id: &ProductId) -> Result<bool, StorageError> {
        if !self.contains(id) {
            return Ok(false);
        }
        let next = self
            .items
            .iter()
            .filter(|item| &item.id != id)
            .cloned()
            .collect();
        self.commit(next)?;
        Ok(true)
    }

    /// Empty the cart and delete the stored key. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the key cannot be deleted; the cart is left
    /// unchanged.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.commit(Vec::new())
    }

    fn commit(&mut self, next: Vec<CartItem>) -> Result<(), StorageError> {
        persist(self.store.as_ref(), &next)?;
        self.items = next;
        Ok(())
    }
}

fn persist(store: &dyn KeyValueStore, items: &[CartItem]) -> Result<(), StorageError> {
    if items.is_empty() {
        return store.remove(CART_KEY);
    }
    let json = serde_json::to_string(items)?;
    store.set(CART_KEY, &json)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storefront_core::Category;

    use super::*;
    use crate::storage::MemoryStore;

    fn item(id: &str, price: i64) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            title: format!("Item {id}"),
            description: String::new(),
            price: Price::from_rupees(price),
            img_src: format!("/img/{id}.png"),
            category: Category::from("mobiles"),
        }
    }

    fn stored(store: &MemoryStore) -> Option<Vec<CartItem>> {
        store
            .get(CART_KEY)
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    /// Store that refuses every write.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::InvalidKey(key.to_owned()))
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            Err(StorageError::InvalidKey(key.to_owned()))
        }
    }

    #[test]
    fn test_open_without_key_is_empty() {
        let cart = CartStore::open(Arc::new(MemoryStore::new())).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_persists_in_order() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = CartStore::open(store.clone()).unwrap();
        cart.add(item("1", 100)).unwrap();
        cart.add(item("2", 200)).unwrap();

        assert_eq!(stored(&store).unwrap(), vec![item("1", 100), item("2", 200)]);
        assert_eq!(cart.total(), Price::from_rupees(300));
    }

    #[test]
    fn test_stored_prices_are_plain_integers() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = CartStore::open(store.clone()).unwrap();
        cart.add(item("1", 49_999)).unwrap();

        let raw = store.get(CART_KEY).unwrap().unwrap();
        assert!(raw.contains(r#""price":49999,"#), "{raw}");
        assert!(!raw.contains("49999.0"));
    }

    #[test]
    fn test_remove_last_item_deletes_key() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = CartStore::open(store.clone()).unwrap();
        cart.add(item("1", 100)).unwrap();

        assert!(cart.remove(&ProductId::new("1")).unwrap());
        assert!(cart.is_empty());
        assert!(!store.contains(CART_KEY));
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = CartStore::open(store.clone()).unwrap();
        cart.add(item("1", 100)).unwrap();

        assert!(!cart.remove(&ProductId::new("9")).unwrap());
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_remove_drops_duplicates() {
        let store = Arc::new(MemoryStore::new());
        let mut cart = CartStore::open(store.clone()).unwrap();
        cart.add(item("1", 100)).unwrap();
        cart.add(item("2", 200)).unwrap();
        cart.add(item("1", 100)).unwrap();

        cart.remove(&ProductId::new("1")).unwrap();
        assert_eq!(cart.items(), &[item("2", 200)]);
        assert_eq!(stored(&store).unwrap(), vec![item("2", 200)]);
    }

    #[test]
    fn test_corrupt_storage_resets_to_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(CART_KEY, "{not json").unwrap();

        let cart = CartStore::open(store.clone()).unwrap();
        assert!(cart.is_empty());
        assert!(!store.contains(CART_KEY));
    }

    #[test]
    fn test_failed_write_leaves_cart_unchanged() {
        let mut cart = CartStore::open(Arc::new(ReadOnlyStore)).unwrap();
        assert!(cart.add(item("1", 100)).is_err());
        assert!(cart.is_empty());
    }
}
