//! End-to-end purchase flow over in-memory collaborators.

#![allow(clippy::unwrap_used)]

use storefront::cart::CART_KEY;
use storefront::notice::Notice;
use storefront::purchase::PurchaseOutcome;
use storefront_core::Price;
use storefront_integration_tests::{TestShop, item};

#[tokio::test]
async fn test_purchase_removes_only_the_bought_item() {
    let shop = TestShop::new(true);
    let identity = shop.sign_in("shopper@example.com").await;

    let a = item("a", "laptops", 54_999);
    let b = item("b", "tablets", 19_999);
    let mut cart = shop.state.open_cart().unwrap();
    cart.add(a.clone()).unwrap();
    cart.add(b.clone()).unwrap();

    let outcome = shop.flow().buy(&mut cart, &a).await;

    let PurchaseOutcome::Purchased(key) = outcome else {
        panic!("expected a purchase, got {outcome:?}");
    };
    assert!(key.as_str().starts_with(&format!("{}-", identity.uid)));
    assert_eq!(cart.items(), std::slice::from_ref(&b));

    let stored = shop.stored(CART_KEY).unwrap();
    let reloaded: Vec<storefront_core::CartItem> = serde_json::from_str(&stored).unwrap();
    assert_eq!(reloaded, vec![b]);

    assert_eq!(shop.notifier.notices(), vec![Notice::PurchaseSucceeded]);
}

#[tokio::test]
async fn test_purchase_record_contents() {
    let shop = TestShop::new(true);
    let identity = shop.sign_in("shopper@example.com").await;

    let laptop = item("5", "laptops", 99_999);
    let mut cart = shop.state.open_cart().unwrap();
    cart.add(laptop.clone()).unwrap();

    shop.flow().buy(&mut cart, &laptop).await;

    let written = shop.purchases.written();
    assert_eq!(written.len(), 1);
    let (key, record) = &written[0];
    assert_eq!(key.document_path(), format!("purchases/{key}"));
    assert_eq!(record.product_id, laptop.id);
    assert_eq!(record.title, laptop.title);
    assert_eq!(record.price, Price::from_rupees(99_999));
    assert_eq!(record.email, identity.email);
    assert!(record.purchase_date.ends_with('Z'));
}

#[tokio::test]
async fn test_confirmation_names_item_and_price() {
    let shop = TestShop::new(true);
    shop.sign_in("shopper@example.com").await;

    let phone = item("1", "mobiles", 79_999);
    let mut cart = shop.state.open_cart().unwrap();
    cart.add(phone.clone()).unwrap();
    shop.flow().buy(&mut cart, &phone).await;

    let asked = shop.confirm.asked();
    assert_eq!(asked.len(), 1);
    assert_eq!(
        asked[0],
        Notice::ConfirmPurchase {
            title: phone.title.clone(),
            price: phone.price,
        }
    );
    assert_eq!(
        asked[0].text().unwrap(),
        format!("Do you want to buy {} for 79999 ₹?", phone.title)
    );
}

#[tokio::test]
async fn test_unauthenticated_purchase_changes_nothing() {
    let shop = TestShop::new(true);

    let a = item("a", "mobiles", 24_999);
    let mut cart = shop.state.open_cart().unwrap();
    cart.add(a.clone()).unwrap();
    let before = shop.stored(CART_KEY);

    let outcome = shop.flow().buy(&mut cart, &a).await;

    assert_eq!(outcome, PurchaseOutcome::LoginRequired);
    assert_eq!(cart.items(), std::slice::from_ref(&a));
    assert_eq!(shop.stored(CART_KEY), before);
    assert!(shop.purchases.written().is_empty());
    assert!(shop.confirm.asked().is_empty());
    assert_eq!(shop.notifier.notices(), vec![Notice::LoginRequired]);
}

#[tokio::test]
async fn test_cancelled_purchase_changes_nothing() {
    let shop = TestShop::new(false);
    shop.sign_in("shopper@example.com").await;

    let a = item("a", "tablets", 26_999);
    let mut cart = shop.state.open_cart().unwrap();
    cart.add(a.clone()).unwrap();

    let outcome = shop.flow().buy(&mut cart, &a).await;

    assert_eq!(outcome, PurchaseOutcome::Cancelled);
    assert_eq!(cart.len(), 1);
    assert!(shop.purchases.written().is_empty());
    assert!(shop.notifier.notices().is_empty());
}

#[tokio::test]
async fn test_failed_write_keeps_cart_and_reports_once() {
    let shop = TestShop::new(true);
    shop.sign_in("shopper@example.com").await;
    shop.purchases.fail_with("PERMISSION_DENIED");

    let a = item("a", "laptops", 45_999);
    let b = item("b", "laptops", 54_999);
    let mut cart = shop.state.open_cart().unwrap();
    cart.add(a.clone()).unwrap();
    cart.add(b.clone()).unwrap();
    let before = shop.stored(CART_KEY);

    let outcome = shop.flow().buy(&mut cart, &a).await;

    assert_eq!(outcome, PurchaseOutcome::Failed);
    assert_eq!(cart.items(), [a, b].as_slice());
    assert_eq!(shop.stored(CART_KEY), before);
    assert_eq!(shop.notifier.notices(), vec![Notice::PurchaseFailed]);
}

#[tokio::test]
async fn test_buying_last_item_empties_stored_cart() {
    let shop = TestShop::new(true);
    shop.sign_in("shopper@example.com").await;

    let only = item("only", "mobiles", 59_999);
    let mut cart = shop.state.open_cart().unwrap();
    cart.add(only.clone()).unwrap();

    shop.flow().buy(&mut cart, &only).await;

    assert!(cart.is_empty());
    assert_eq!(shop.stored(CART_KEY), None);
}

#[tokio::test]
async fn test_purchase_removes_every_copy_of_the_item() {
    let shop = TestShop::new(true);
    shop.sign_in("shopper@example.com").await;

    let a = item("a", "mobiles", 24_999);
    let b = item("b", "mobiles", 64_999);
    let mut cart = shop.state.open_cart().unwrap();
    cart.add(a.clone()).unwrap();
    cart.add(b.clone()).unwrap();
    cart.add(a.clone()).unwrap();

    shop.flow().buy(&mut cart, &a).await;

    assert_eq!(cart.items(), [b].as_slice());
}

#[tokio::test]
async fn test_purchase_key_is_uid_and_millis() {
    let shop = TestShop::new(true);
    let identity = shop.sign_in("shopper@example.com").await;

    let a = item("a", "mobiles", 24_999);
    let mut cart = shop.state.open_cart().unwrap();
    cart.add(a.clone()).unwrap();

    let PurchaseOutcome::Purchased(key) = shop.flow().buy(&mut cart, &a).await else {
        panic!("purchase should succeed");
    };

    let millis = key
        .as_str()
        .strip_prefix(&format!("{}-", identity.uid))
        .unwrap();
    assert!(millis.parse::<i64>().unwrap() > 1_600_000_000_000);
}
