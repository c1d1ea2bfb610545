//! # Supply Chain Registry Contract
//!
//! A role-gated ledger of products and their status history, addressed by
//! sequential ids. The single Soroban contract [`SupplyChain`] exposes:
//!
//! | Phase        | Entry Point(s)                                         |
//! |--------------|--------------------------------------------------------|
//! | Deployment   | `__constructor`                                        |
//! | Role admin   | [`SupplyChain::assign_role`]                           |
//! | Ledger write | [`SupplyChain::add_product`], [`SupplyChain::update_product`] |
//! | Guarded read | `get_product`, `get_product_history`                   |
//! | Open read    | `check_my_role`, `has_role`, `role_of`, `product_counter`, `products` |
//!
//! ## Architecture
//!
//! Authorization is delegated to [`rbac`], storage access to [`storage`] and
//! event publication to [`events`]. Entry points follow guard-then-act: every
//! check runs before the first write, so a failed call leaves no trace.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Env, String, Vec};

pub mod events;
pub mod rbac;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;

pub use rbac::{Role, RoleId};
pub use types::{Product, ProductState, StatusEntry};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    /// Caller lacks the role or capability required for a write.
    Unauthorized = 1,
    /// Role name is not one of `MANAGER`, `OPERATOR`, `VIEWER`.
    InvalidRole = 2,
    /// Product id is zero, beyond the counter, or unpopulated.
    InvalidProductId = 3,
    /// Caller holds no role on a guarded read.
    AccessDenied = 4,
    /// `add_product` was given an empty name.
    EmptyProductName = 5,
}

#[contract]
pub struct SupplyChain;

#[contractimpl]
impl SupplyChain {
    // ─────────────────────────────────────────────────────────
    // Deployment
    // ─────────────────────────────────────────────────────────

    /// Runs once, atomically with deployment. `admin` receives the admin
    /// capability and the `Manager` role.
    pub fn __constructor(env: Env, admin: Address) {
        rbac::init_admin(&env, &admin);
    }

    // ─────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────

    /// Assign `role_name` (`"MANAGER"`, `"OPERATOR"` or `"VIEWER"`) to `target`.
    ///
    /// - `caller` must hold the admin capability or the `Manager` role.
    /// - Reassigning overwrites; assigning the same role again is a no-op.
    pub fn assign_role(
        env: Env,
        caller: Address,
        target: Address,
        role_name: String,
    ) -> Result<(), Error> {
        caller.require_auth();
        rbac::assign_role(&env, &caller, &target, &role_name)
    }

    /// Return the caller's role name, or `"NO ROLE"`.
    pub fn check_my_role(env: Env, caller: Address) -> String {
        caller.require_auth();
        rbac::role_name(&env, &caller)
    }

    /// Return `true` if `address` holds `role` (including the admin capability).
    pub fn has_role(env: Env, role: RoleId, address: Address) -> bool {
        rbac::has_role(&env, role, &address)
    }

    /// Return the role held by `address`.
    pub fn role_of(env: Env, address: Address) -> Role {
        rbac::role_of(&env, &address)
    }

    // ─────────────────────────────────────────────────────────
    // Product ledger
    // ─────────────────────────────────────────────────────────

    /// Create a product and return its id.
    ///
    /// `caller` must hold the `Operator` role and becomes `added_by`.
    pub fn add_product(
        env: Env,
        caller: Address,
        name: String,
        location: String,
        status: String,
    ) -> Result<u64, Error> {
        caller.require_auth();
        rbac::require_operator(&env, &caller)?;

        if name.len() == 0 {
            return Err(Error::EmptyProductName);
        }

        let id = storage::next_product_id(&env);
        let product = Product {
            id,
            name,
            location: location.clone(),
            status: status.clone(),
            added_by: caller.clone(),
        };
        storage::save_product(&env, &product);
        storage::append_history(
            &env,
            id,
            StatusEntry {
                status,
                location,
                updated_by: caller.clone(),
                timestamp: env.ledger().timestamp(),
            },
        );

        events::emit_product_added(&env, product);
        Ok(id)
    }

    /// Overwrite the status and location of product `id`.
    ///
    /// The id is validated before the role, so an unknown id reports
    /// `InvalidProductId` whoever the caller is.
    pub fn update_product(
        env: Env,
        caller: Address,
        id: u64,
        new_status: String,
        new_location: String,
    ) -> Result<(), Error> {
        caller.require_auth();
        if !storage::product_exists(&env, id) {
            return Err(Error::InvalidProductId);
        }
        rbac::require_operator(&env, &caller)?;

        storage::save_product_state(
            &env,
            id,
            &ProductState {
                location: new_location.clone(),
                status: new_status.clone(),
            },
        );
        storage::append_history(
            &env,
            id,
            StatusEntry {
                status: new_status.clone(),
                location: new_location.clone(),
                updated_by: caller,
                timestamp: env.ledger().timestamp(),
            },
        );

        events::emit_product_updated(&env, id, new_status, new_location);
        Ok(())
    }

    /// Guarded product lookup for any caller holding a role.
    pub fn get_product(env: Env, caller: Address, id: u64) -> Result<Product, Error> {
        caller.require_auth();
        Self::require_readable(&env, &caller, id)?;
        storage::try_load_product(&env, id).ok_or(Error::InvalidProductId)
    }

    /// Status history of product `id`, oldest first. Same guard as `get_product`.
    pub fn get_product_history(
        env: Env,
        caller: Address,
        id: u64,
    ) -> Result<Vec<StatusEntry>, Error> {
        caller.require_auth();
        Self::require_readable(&env, &caller, id)?;
        Ok(storage::load_history(&env, id))
    }

    /// Number of products created so far; also the id of the newest one.
    pub fn product_counter(env: Env) -> u64 {
        storage::product_count(&env)
    }

    /// Unguarded storage read. `None` when `id` was never assigned.
    pub fn products(env: Env, id: u64) -> Option<Product> {
        storage::try_load_product(&env, id)
    }

    // ─────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────

    fn require_readable(env: &Env, caller: &Address, id: u64) -> Result<(), Error> {
        if !storage::product_exists(env, id) {
            return Err(Error::InvalidProductId);
        }
        rbac::require_viewer_or_above(env, caller)
    }
}
