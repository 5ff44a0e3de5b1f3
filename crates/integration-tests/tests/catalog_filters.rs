//! Catalog filters over the bundled product list.

#![allow(clippy::unwrap_used)]

use storefront::catalog::{CATEGORY_PRESETS, Catalog, Filter, PRICE_PRESETS};
use storefront_core::{Category, Price, Product};
use storefront_integration_tests::TestShop;

fn ids<'a>(products: &[&'a Product]) -> Vec<&'a str> {
    products.iter().map(|p| p.id.as_str()).collect()
}

#[test]
fn test_category_filter_is_exact_and_complete() {
    let catalog = Catalog::bundled().unwrap();
    let laptops = Category::from("laptops");

    let shown = catalog.filter(&Filter::Category(laptops.clone()));

    assert_eq!(ids(&shown), ["5", "6", "7", "8"]);
    let hidden = catalog.all().iter().filter(|p| p.category == laptops).count();
    assert_eq!(hidden, shown.len());
}

#[test]
fn test_price_filter_is_inclusive_lower_bound() {
    let catalog = Catalog::bundled().unwrap();
    let threshold = Price::from_rupees(49_999);

    let shown = catalog.filter(&Filter::MinPrice(threshold));

    assert!(shown.iter().all(|p| p.price >= threshold));
    assert_eq!(ids(&shown), ["1", "2", "3", "5", "6", "8", "9", "10"]);
    assert_eq!(
        catalog.all().iter().filter(|p| p.price >= threshold).count(),
        shown.len()
    );
}

#[test]
fn test_every_preset_matches_predicate() {
    let catalog = Catalog::bundled().unwrap();

    for name in CATEGORY_PRESETS {
        let category = Category::from(*name);
        let shown = catalog.by_category(&category);
        assert!(!shown.is_empty(), "{name} has no products");
        assert!(shown.iter().all(|p| p.category == category));
    }

    for rupees in PRICE_PRESETS {
        let threshold = Price::from_rupees(*rupees);
        let expected = catalog.all().iter().filter(|p| p.price >= threshold).count();
        assert_eq!(catalog.at_least(threshold).len(), expected);
    }
}

#[test]
fn test_unknown_category_is_empty() {
    let catalog = Catalog::bundled().unwrap();
    assert!(catalog.by_category(&Category::from("Laptops")).is_empty());
}

#[test]
fn test_search_and_related() {
    let shop = TestShop::new(true);
    let catalog = shop.state.catalog();

    assert_eq!(ids(&catalog.search("galaxy")), ["2", "10"]);

    let ipad = catalog.all().iter().find(|p| p.id.as_str() == "9").unwrap();
    assert_eq!(ids(&catalog.related(ipad)), ["10", "11", "12"]);
}
