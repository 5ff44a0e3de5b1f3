//! Expiring ID tokens: renewal before a purchase, and offline mode.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use storefront::account::sign_in_and_notify;
use storefront::auth::{AuthState, Credentials, SESSION_KEY};
use storefront::cart::CART_KEY;
use storefront::notice::{AuthAction, Notice};
use storefront::purchase::PurchaseOutcome;
use storefront::storage::MemoryStore;
use storefront_integration_tests::{
    ExpiringProvider, GOOD_PASSWORD, RENEWED_TOKEN, RecordingNotifier, TestShop, item,
};

#[tokio::test]
async fn test_expired_token_is_renewed_before_purchase() {
    let store = Arc::new(MemoryStore::new());
    let shop = TestShop::with_provider(store, Arc::new(ExpiringProvider { renews: true }), true);
    let identity = shop.sign_in("shopper@example.com").await;

    let a = item("a", "laptops", 54_999);
    let mut cart = shop.state.open_cart().unwrap();
    cart.add(a.clone()).unwrap();

    let outcome = shop.flow().buy(&mut cart, &a).await;

    assert!(matches!(outcome, PurchaseOutcome::Purchased(_)));
    assert_eq!(shop.state.auth().current_user(), Some(identity));
    assert!(shop.stored(SESSION_KEY).unwrap().contains(RENEWED_TOKEN));
    assert_eq!(shop.purchases.written().len(), 1);
    assert_eq!(shop.notifier.notices(), vec![Notice::PurchaseSucceeded]);
}

#[tokio::test]
async fn test_refused_renewal_signs_out_and_keeps_cart() {
    let store = Arc::new(MemoryStore::new());
    let shop = TestShop::with_provider(store, Arc::new(ExpiringProvider { renews: false }), true);
    shop.sign_in("shopper@example.com").await;
    let mut subscription = shop.state.auth().subscribe();
    subscription.try_next();

    let a = item("a", "mobiles", 24_999);
    let mut cart = shop.state.open_cart().unwrap();
    cart.add(a.clone()).unwrap();
    let before = shop.stored(CART_KEY);

    let outcome = shop.flow().buy(&mut cart, &a).await;

    assert_eq!(outcome, PurchaseOutcome::LoginRequired);
    assert_eq!(shop.state.auth().state(), AuthState::SignedOut);
    assert_eq!(shop.stored(SESSION_KEY), None);
    assert_eq!(shop.stored(CART_KEY), before);
    assert!(shop.confirm.asked().is_empty());
    assert!(shop.purchases.written().is_empty());
    assert_eq!(subscription.try_next(), Some(AuthState::SignedOut));
    assert_eq!(shop.notifier.notices(), vec![Notice::LoginRequired]);
}

#[tokio::test]
async fn test_offline_shop_reads_as_signed_out_but_keeps_saved_session() {
    let store = Arc::new(MemoryStore::new());
    let online = TestShop::with_store(store.clone(), true);
    online.sign_in("shopper@example.com").await;
    drop(online);

    let offline = TestShop::offline(store.clone());

    assert!(!offline.state.is_online());
    assert_eq!(offline.state.auth().state(), AuthState::SignedOut);
    assert!(offline.stored(SESSION_KEY).is_some());

    let back = TestShop::with_store(store, true);
    assert!(back.state.auth().current_user().is_some());
}

#[tokio::test]
async fn test_offline_shop_browses_and_keeps_a_cart() {
    let shop = TestShop::offline(Arc::new(MemoryStore::new()));
    assert!(!shop.state.catalog().all().is_empty());

    let a = item("a", "tablets", 19_999);
    let mut cart = shop.state.open_cart().unwrap();
    cart.add(a.clone()).unwrap();

    let outcome = shop.flow().buy(&mut cart, &a).await;

    assert_eq!(outcome, PurchaseOutcome::LoginRequired);
    assert_eq!(shop.state.open_cart().unwrap().items(), [a].as_slice());
}

#[tokio::test]
async fn test_offline_sign_in_is_refused_with_a_reason() {
    let shop = TestShop::offline(Arc::new(MemoryStore::new()));
    let notifier = RecordingNotifier::default();
    let credentials = Credentials::new("shopper@example.com", GOOD_PASSWORD).unwrap();

    assert!(
        sign_in_and_notify(shop.state.auth(), &notifier, &credentials)
            .await
            .is_none()
    );

    assert_eq!(
        notifier.notices(),
        vec![Notice::AuthActionFailed {
            action: AuthAction::SignIn,
            message: "sign-in is unavailable: FIREBASE_API_KEY and FIREBASE_PROJECT_ID are not set"
                .to_string(),
        }]
    );
}
