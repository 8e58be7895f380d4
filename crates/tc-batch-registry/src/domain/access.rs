//! # Access Gate
//!
//! Stateless guard consulted by every mutating operation. It reads roles
//! through [`RoleLookup`] and never changes anything, so it can be tested
//! against any lookup without touching registry storage.

use super::errors::{RegistryError, RoleRequirement};
use shared_types::{Identity, Role};

/// Read access to the current role assignments.
pub trait RoleLookup {
    /// Role held by `identity`; `Role::None` when never assigned.
    fn role_of(&self, identity: &Identity) -> Role;
}

impl<F> RoleLookup for F
where
    F: Fn(&Identity) -> Role,
{
    fn role_of(&self, identity: &Identity) -> Role {
        self(identity)
    }
}

/// Role predicates for mutating operations.
pub struct AccessGate;

impl AccessGate {
    /// Fail with `Unauthorized` unless `identity` holds exactly `required`.
    pub fn require_role(
        roles: &impl RoleLookup,
        identity: &Identity,
        required: Role,
    ) -> Result<(), RegistryError> {
        let actual = roles.role_of(identity);
        if actual == required {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized {
                identity: *identity,
                actual,
                required: RoleRequirement::Exactly(required),
            })
        }
    }

    /// Fail with `Unauthorized` if `identity` holds `None`.
    ///
    /// Returns the role actually held, which is what gets recorded.
    pub fn require_any_role(
        roles: &impl RoleLookup,
        identity: &Identity,
    ) -> Result<Role, RegistryError> {
        let actual = roles.role_of(identity);
        if actual.is_assigned() {
            Ok(actual)
        } else {
            Err(RegistryError::Unauthorized {
                identity: *identity,
                actual,
                required: RoleRequirement::AnyAssigned,
            })
        }
    }
}
