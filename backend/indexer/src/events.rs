//! Canonical event types emitted by the supply-chain registry contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/supply_chain/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the registry contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A product was created (`added` topic).
    ProductAdded,
    /// A product's status and location were overwritten (`updated` topic).
    ProductUpdated,
    /// A participant was assigned a role (`role_set` topic).
    RoleAssigned,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "added" => Self::ProductAdded,
            "updated" => Self::ProductUpdated,
            "role_set" => Self::RoleAssigned,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductAdded => "product_added",
            Self::ProductUpdated => "product_updated",
            Self::RoleAssigned => "role_assigned",
            Self::Unknown => "unknown",
        }
    }
}

/// A fully decoded registry event, ready to be stored in the database.
///
/// Field usage per kind:
///
/// | Kind             | `product_id` | `actor`       | `target` | `name` | `status` | `location` | `role` |
/// |------------------|:------------:|---------------|:--------:|:------:|:--------:|:----------:|:------:|
/// | `product_added`  | ✓            | `added_by`    |          | ✓      | ✓        | ✓          |        |
/// | `product_updated`| ✓            |               |          |        | ✓        | ✓          |        |
/// | `role_assigned`  |              | `assigned_by` | ✓        |        |          |            | ✓      |
///
/// `event_id` is the RPC's per-event id and is unique across the whole chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEvent {
    pub event_id: String,
    pub event_type: String,
    pub product_id: Option<i64>,
    pub actor: Option<String>,
    pub target: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub role: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

impl RegistryEvent {
    pub fn kind(&self) -> EventKind {
        match self.event_type.as_str() {
            "product_added" => EventKind::ProductAdded,
            "product_updated" => EventKind::ProductUpdated,
            "role_assigned" => EventKind::RoleAssigned,
            _ => EventKind::Unknown,
        }
    }
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub product_id: Option<i64>,
    pub actor: Option<String>,
    pub target: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub role: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

/// Current state of a product, folded from its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
    pub status: Option<String>,
    pub added_by: Option<String>,
    pub created_ledger: i64,
    pub updated_ledger: i64,
}

/// One status change of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryRow {
    pub product_id: i64,
    pub status: Option<String>,
    pub location: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub tx_hash: Option<String>,
}

/// Last role observed for a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleRow {
    pub address: String,
    pub role: String,
    pub assigned_by: Option<String>,
    pub ledger: i64,
}
