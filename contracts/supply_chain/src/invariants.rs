#![allow(dead_code)]

extern crate std;

use soroban_sdk::Vec;

use crate::types::{Product, StatusEntry};

/// INV-1: Product ids are sequential starting from 1.
pub fn assert_sequential_ids(products: &[Product]) {
    for (i, product) in products.iter().enumerate() {
        assert_eq!(
            product.id,
            i as u64 + 1,
            "INV-1 violated: expected id {}, got {}",
            i + 1,
            product.id
        );
    }
}

/// INV-2: The counter equals the id of the newest product and never decreases.
pub fn assert_counter_monotonic(count_before: u64, count_after: u64) {
    assert!(
        count_after >= count_before,
        "INV-2 violated: product counter decreased from {} to {}",
        count_before,
        count_after
    );
}

/// INV-3: Product names are never empty.
pub fn assert_name_non_empty(product: &Product) {
    assert!(
        product.name.len() > 0,
        "INV-3 violated: product {} has an empty name",
        product.id
    );
}

/// INV-4: Fields fixed at creation (id, name, added_by) never change.
pub fn assert_product_immutable_fields(original: &Product, current: &Product) {
    assert_eq!(original.id, current.id, "INV-4 violated: product id changed");
    assert_eq!(
        original.name, current.name,
        "INV-4 violated: product name changed"
    );
    assert_eq!(
        original.added_by, current.added_by,
        "INV-4 violated: product added_by changed"
    );
}

/// INV-5: The newest history entry mirrors the product's current state.
pub fn assert_history_matches_state(product: &Product, history: &Vec<StatusEntry>) {
    let last = history
        .last()
        .unwrap_or_else(|| panic!("INV-5 violated: product {} has no history", product.id));
    assert_eq!(
        last.status, product.status,
        "INV-5 violated: history status diverges for product {}",
        product.id
    );
    assert_eq!(
        last.location, product.location,
        "INV-5 violated: history location diverges for product {}",
        product.id
    );
}

/// Run all stateless product invariants.
pub fn assert_all_product_invariants(product: &Product) {
    assert_name_non_empty(product);
}
