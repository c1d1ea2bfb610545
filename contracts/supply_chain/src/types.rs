//! # Types
//!
//! Shared data structures used across the supply-chain registry.
//!
//! ## Record / State split
//!
//! A `Product` is internally stored as two separate ledger entries:
//!
//! - [`ProductRecord`] — written once by `add_product`; never mutated.
//! - [`ProductState`] — rewritten by every `update_product`.
//!
//! The public API exposes the reconstructed [`Product`] struct.
//!
//! Products are never deleted: the ledger is append/update-only, and every
//! successful write appends a [`StatusEntry`] to the product's history.

use soroban_sdk::{contracttype, Address, String};

/// Fields fixed at creation time.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProductRecord {
    pub id: u64,
    pub name: String,
    pub added_by: Address,
}

/// Fields an operator may overwrite.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProductState {
    pub location: String,
    pub status: String,
}

/// A tracked physical item or batch.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Product {
    /// Sequential identifier, starting at 1.
    pub id: u64,
    /// Display name; immutable.
    pub name: String,
    /// Current location, e.g. "Warehouse A".
    pub location: String,
    /// Free-form status, e.g. "In Stock" or "Shipped".
    pub status: String,
    /// Operator that created the product; immutable.
    pub added_by: Address,
}

/// One entry in a product's status history.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusEntry {
    pub status: String,
    pub location: String,
    pub updated_by: Address,
    /// Ledger timestamp at which the entry was written.
    pub timestamp: u64,
}
