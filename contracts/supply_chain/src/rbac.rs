//! # Role-Based Access Control
//!
//! Every participant holds at most one [`Role`]. Assignment is a flat
//! overwrite: there is no hierarchy between `Manager`, `Operator` and
//! `Viewer` beyond who may call [`assign_role`].
//!
//! The **admin** capability is held by the address passed to the contract
//! constructor and is tracked separately from the assignable roles. That
//! address also starts out as a `Manager`.
//!
//! | Capability           | Admin | Manager | Operator | Viewer | None |
//! |----------------------|:-----:|:-------:|:--------:|:------:|:----:|
//! | `assign_role`        |   ✓   |    ✓    |          |        |      |
//! | `add_product`        |       |         |    ✓     |        |      |
//! | `update_product`     |       |         |    ✓     |        |      |
//! | `get_product`        |       |    ✓    |    ✓     |   ✓    |      |
//! | `check_my_role`      |   ✓   |    ✓    |    ✓     |   ✓    |  ✓   |
//!
//! The admin column applies to the capability alone; the deployer can still
//! read products through its `Manager` role.

use soroban_sdk::{contracttype, Address, Env, String};

use crate::events;
use crate::storage::{
    bump_instance, PERSISTENT_BUMP_AMOUNT, PERSISTENT_LIFETIME_THRESHOLD,
};
use crate::Error;

/// Longest accepted role name, in bytes.
const MAX_ROLE_NAME_LEN: usize = 16;

/// Rendering of [`Role::None`] returned by `check_my_role`.
pub const NO_ROLE: &str = "NO ROLE";

/// Assignable participant role.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    /// Unassigned. Not assignable through `assign_role`.
    None,
    Manager,
    Operator,
    Viewer,
}

impl Default for Role {
    fn default() -> Self {
        Role::None
    }
}

impl Role {
    /// Parse one of `"MANAGER"`, `"OPERATOR"` or `"VIEWER"`.
    ///
    /// Any other value, `"NONE"` included, yields `None`.
    pub fn from_name(name: &String) -> Option<Role> {
        let len = name.len() as usize;
        if len > MAX_ROLE_NAME_LEN {
            return None;
        }
        let mut buf = [0u8; MAX_ROLE_NAME_LEN];
        name.copy_into_slice(&mut buf[..len]);

        match &buf[..len] {
            b"MANAGER" => Some(Role::Manager),
            b"OPERATOR" => Some(Role::Operator),
            b"VIEWER" => Some(Role::Viewer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::None => NO_ROLE,
            Role::Manager => "MANAGER",
            Role::Operator => "OPERATOR",
            Role::Viewer => "VIEWER",
        }
    }

    /// Roles allowed through the guarded product read path.
    pub fn can_view(&self) -> bool {
        matches!(self, Role::Manager | Role::Operator | Role::Viewer)
    }
}

/// Identifier accepted by `has_role`; unlike [`Role`] it can name the admin
/// capability.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoleId {
    Admin,
    Manager,
    Operator,
    Viewer,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RbacKey {
    /// Address holding the admin capability (Instance).
    Admin,
    /// Role assigned to an address (Persistent).
    Role(Address),
}

// ── Initialisation ───────────────────────────────────────────────────

/// Grant the admin capability and the `Manager` role to `admin`.
pub fn init_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&RbacKey::Admin, admin);
    bump_instance(env);
    set_role(env, admin, Role::Manager);
}

// ── Queries ──────────────────────────────────────────────────────────

pub fn is_admin(env: &Env, address: &Address) -> bool {
    env.storage()
        .instance()
        .get::<_, Address>(&RbacKey::Admin)
        .map(|admin| admin == *address)
        .unwrap_or(false)
}

/// Role held by `address`, [`Role::None`] when unassigned.
pub fn role_of(env: &Env, address: &Address) -> Role {
    let key = RbacKey::Role(address.clone());
    match env.storage().persistent().get::<_, Role>(&key) {
        Some(role) => {
            env.storage().persistent().extend_ttl(
                &key,
                PERSISTENT_LIFETIME_THRESHOLD,
                PERSISTENT_BUMP_AMOUNT,
            );
            role
        }
        None => Role::default(),
    }
}

pub fn has_role(env: &Env, role: RoleId, address: &Address) -> bool {
    match role {
        RoleId::Admin => is_admin(env, address),
        RoleId::Manager => role_of(env, address) == Role::Manager,
        RoleId::Operator => role_of(env, address) == Role::Operator,
        RoleId::Viewer => role_of(env, address) == Role::Viewer,
    }
}

pub fn role_name(env: &Env, address: &Address) -> String {
    String::from_str(env, role_of(env, address).as_str())
}

// ── Guards ───────────────────────────────────────────────────────────

pub fn require_admin_or_manager(env: &Env, caller: &Address) -> Result<(), Error> {
    if is_admin(env, caller) || role_of(env, caller) == Role::Manager {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

pub fn require_operator(env: &Env, caller: &Address) -> Result<(), Error> {
    if role_of(env, caller) == Role::Operator {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

pub fn require_viewer_or_above(env: &Env, caller: &Address) -> Result<(), Error> {
    if role_of(env, caller).can_view() {
        Ok(())
    } else {
        Err(Error::AccessDenied)
    }
}

// ── Mutations ────────────────────────────────────────────────────────

/// Assign the role named `role_name` to `target`, replacing any previous one.
///
/// The name is validated before the caller's privileges, so an unknown name
/// fails with `InvalidRole` for every caller.
pub fn assign_role(
    env: &Env,
    caller: &Address,
    target: &Address,
    role_name: &String,
) -> Result<(), Error> {
    let role = Role::from_name(role_name).ok_or(Error::InvalidRole)?;
    require_admin_or_manager(env, caller)?;

    set_role(env, target, role);
    events::emit_role_assigned(env, target.clone(), role, caller.clone());
    Ok(())
}

fn set_role(env: &Env, address: &Address, role: Role) {
    let key = RbacKey::Role(address.clone());
    env.storage().persistent().set(&key, &role);
    env.storage()
        .persistent()
        .extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}
