//! # Role Manager
//!
//! Authorization mapping from identity to role. Exactly one role per
//! identity; identities never assigned hold `Role::None`.

use super::access::{AccessGate, RoleLookup};
use super::errors::RegistryError;
use serde::{Deserialize, Serialize};
use shared_types::{Identity, Role};
use std::collections::HashMap;

/// Identity → role assignments.
///
/// Revocation is an assignment of `None`; such entries are dropped from the
/// map since the lookup default already answers `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleManager {
    assignments: HashMap<Identity, Role>,
}

impl RoleManager {
    /// Start with a single `Admin`.
    #[must_use]
    pub fn with_admin(admin: Identity) -> Self {
        let mut assignments = HashMap::new();
        assignments.insert(admin, Role::Admin);
        Self { assignments }
    }

    /// Current role of `identity`.
    #[must_use]
    pub fn role_of(&self, identity: &Identity) -> Role {
        self.assignments.get(identity).copied().unwrap_or_default()
    }

    /// Overwrite `target`'s role. Only an `Admin` caller may do this, and it
    /// may demote any identity, itself included.
    ///
    /// Returns the role `target` held before.
    pub fn assign_role(
        &mut self,
        caller: &Identity,
        target: Identity,
        role: Role,
    ) -> Result<Role, RegistryError> {
        AccessGate::require_role(&*self, caller, Role::Admin)?;

        let previous = if role.is_assigned() {
            self.assignments.insert(target, role)
        } else {
            self.assignments.remove(&target)
        };
        Ok(previous.unwrap_or_default())
    }

    /// Number of identities holding a role other than `None`.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.assignments.len()
    }

    /// Identities currently holding `role`, in unspecified order.
    pub fn holders(&self, role: Role) -> impl Iterator<Item = &Identity> + '_ {
        self.assignments
            .iter()
            .filter(move |(_, held)| **held == role)
            .map(|(identity, _)| identity)
    }
}

impl RoleLookup for RoleManager {
    fn role_of(&self, identity: &Identity) -> Role {
        RoleManager::role_of(self, identity)
    }
}
