//! # Storage
//!
//! Typed helpers over the two Soroban storage tiers used by the registry.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key            | Type  | Description                        |
//! |----------------|-------|------------------------------------|
//! | `ProductCount` | `u64` | Last assigned product id           |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key              | Type               | Description                  |
//! |------------------|--------------------|------------------------------|
//! | `ProdRecord(id)` | `ProductRecord`    | Immutable product fields     |
//! | `ProdState(id)`  | `ProductState`     | Mutable location and status  |
//! | `History(id)`    | `Vec<StatusEntry>` | Append-only status history   |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! Role assignments live under their own key space in [`crate::rbac`].

use soroban_sdk::{contracttype, Env, Vec};

use crate::types::{Product, ProductRecord, ProductState, StatusEntry};

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
pub(crate) const DAY_IN_LEDGERS: u32 = 17_280;

pub(crate) const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
pub(crate) const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

pub(crate) const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
pub(crate) const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Product id counter (Instance).
    ProductCount,
    /// Immutable product fields keyed by id (Persistent).
    ProdRecord(u64),
    /// Mutable product fields keyed by id (Persistent).
    ProdState(u64),
    /// Status history keyed by id (Persistent).
    History(u64),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

pub(crate) fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Current value of the product counter (0 before the first product).
pub fn product_count(env: &Env) -> u64 {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::ProductCount)
        .unwrap_or(0)
}

/// Increments the product counter and returns the new value, which is the
/// id of the product being created.
pub fn next_product_id(env: &Env) -> u64 {
    let next = product_count(env) + 1;
    env.storage().instance().set(&DataKey::ProductCount, &next);
    next
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// `true` if `id` is within `1..=counter` and its record slot is populated.
pub fn product_exists(env: &Env, id: u64) -> bool {
    id >= 1
        && id <= product_count(env)
        && env.storage().persistent().has(&DataKey::ProdRecord(id))
}

/// Persist a freshly created product as record + state.
pub fn save_product(env: &Env, product: &Product) {
    let record_key = DataKey::ProdRecord(product.id);
    let state_key = DataKey::ProdState(product.id);

    let record = ProductRecord {
        id: product.id,
        name: product.name.clone(),
        added_by: product.added_by.clone(),
    };
    let state = ProductState {
        location: product.location.clone(),
        status: product.status.clone(),
    };

    env.storage().persistent().set(&record_key, &record);
    env.storage().persistent().set(&state_key, &state);
    bump_persistent(env, &record_key);
    bump_persistent(env, &state_key);
}

/// Load the full `Product` if both halves are present.
pub fn try_load_product(env: &Env, id: u64) -> Option<Product> {
    let record_key = DataKey::ProdRecord(id);
    let state_key = DataKey::ProdState(id);

    let record: ProductRecord = env.storage().persistent().get(&record_key)?;
    let state: ProductState = env.storage().persistent().get(&state_key)?;
    bump_persistent(env, &record_key);
    bump_persistent(env, &state_key);

    Some(Product {
        id: record.id,
        name: record.name,
        location: state.location,
        status: state.status,
        added_by: record.added_by,
    })
}

/// Overwrite only the mutable half of a product.
pub fn save_product_state(env: &Env, id: u64, state: &ProductState) {
    let key = DataKey::ProdState(id);
    env.storage().persistent().set(&key, state);
    bump_persistent(env, &key);
}

pub fn load_history(env: &Env, id: u64) -> Vec<StatusEntry> {
    let key = DataKey::History(id);
    match env.storage().persistent().get(&key) {
        Some(history) => {
            bump_persistent(env, &key);
            history
        }
        None => Vec::new(env),
    }
}

pub fn append_history(env: &Env, id: u64, entry: StatusEntry) {
    let key = DataKey::History(id);
    let mut history = load_history(env, id);
    history.push_back(entry);
    env.storage().persistent().set(&key, &history);
    bump_persistent(env, &key);
}
