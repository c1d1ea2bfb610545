//! # Events
//!
//! Notifications published for off-chain indexers.
//!
//! | Topics                 | Data             |
//! |------------------------|------------------|
//! | `("added", id)`        | [`ProductAdded`]   |
//! | `("updated", id)`      | [`ProductUpdated`] |
//! | `("role_set", target)` | [`RoleAssigned`]   |

use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

use crate::rbac::Role;
use crate::types::Product;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProductAdded {
    pub product_id: u64,
    pub name: String,
    pub location: String,
    pub status: String,
    pub added_by: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProductUpdated {
    pub product_id: u64,
    pub status: String,
    pub location: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleAssigned {
    pub target: Address,
    pub role: Role,
    pub assigned_by: Address,
}

/// Carries the initial location and status so indexers can rebuild the
/// product without a follow-up `updated` event.
pub fn emit_product_added(env: &Env, product: Product) {
    env.events().publish(
        (symbol_short!("added"), product.id),
        ProductAdded {
            product_id: product.id,
            name: product.name,
            location: product.location,
            status: product.status,
            added_by: product.added_by,
        },
    );
}

pub fn emit_product_updated(env: &Env, product_id: u64, status: String, location: String) {
    env.events().publish(
        (symbol_short!("updated"), product_id),
        ProductUpdated {
            product_id,
            status,
            location,
        },
    );
}

pub fn emit_role_assigned(env: &Env, target: Address, role: Role, assigned_by: Address) {
    env.events().publish(
        (symbol_short!("role_set"), target.clone()),
        RoleAssigned {
            target,
            role,
            assigned_by,
        },
    );
}
