//! # Roles
//!
//! The closed set of capability tags and their external encodings.
//!
//! Callers outside the workspace name roles either by label (`"PRODUCER"`)
//! or by the keccak-256 hash of the upper-case label, which is how the
//! deployment tooling encodes them (`ethers.utils.id("PRODUCER")`).
//! [`Role::parse`] accepts both and nothing else.

use crate::entities::Hash;
use crate::errors::ParseRoleError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Capability tag. Exactly one per identity; unassigned identities hold `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    None,
    Admin,
    Producer,
    Transporter,
    Inspector,
    Buyer,
}

/// keccak-256 hash of a role label.
pub type RoleId = Hash;

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 6] = [
        Role::None,
        Role::Admin,
        Role::Producer,
        Role::Transporter,
        Role::Inspector,
        Role::Buyer,
    ];

    /// Canonical upper-case label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Role::None => "NONE",
            Role::Admin => "ADMIN",
            Role::Producer => "PRODUCER",
            Role::Transporter => "TRANSPORTER",
            Role::Inspector => "INSPECTOR",
            Role::Buyer => "BUYER",
        }
    }

    /// Hash identifier. `None` is the zero hash.
    #[must_use]
    pub fn id(&self) -> RoleId {
        match self {
            Role::None => [0u8; 32],
            other => Keccak256::digest(other.label().as_bytes()).into(),
        }
    }

    /// Whether this role grants any capability at all.
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        !matches!(self, Role::None)
    }

    /// Look up a role by its hash identifier.
    #[must_use]
    pub fn from_id(id: &RoleId) -> Option<Role> {
        Self::ALL.into_iter().find(|role| role.id() == *id)
    }

    /// Parse a role from a label (any case) or a hex-encoded role hash.
    pub fn parse(input: &str) -> Result<Role, ParseRoleError> {
        let trimmed = input.trim();
        let upper = trimmed.to_ascii_uppercase();
        if let Some(role) = Self::ALL.into_iter().find(|role| role.label() == upper) {
            return Ok(role);
        }

        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() == 64 {
            if let Ok(bytes) = hex::decode(digits) {
                let mut id = [0u8; 32];
                id.copy_from_slice(&bytes);
                if let Some(role) = Self::from_id(&id) {
                    return Ok(role);
                }
            }
        }

        Err(ParseRoleError::Unrecognized(input.to_string()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels_case_insensitive() {
        assert_eq!(Role::parse("PRODUCER").unwrap(), Role::Producer);
        assert_eq!(Role::parse("producer").unwrap(), Role::Producer);
        assert_eq!(Role::parse(" Transporter ").unwrap(), Role::Transporter);
        assert_eq!(Role::parse("none").unwrap(), Role::None);
    }

    #[test]
    fn test_parse_role_hash() {
        let hash = "a26228957b4ff1ee8d2f4555d58f130924b7939446a6af38afd42a510a51fbb4";
        assert_eq!(hex::encode(Role::Producer.id()), hash);
        assert_eq!(Role::parse(&format!("0x{hash}")).unwrap(), Role::Producer);
        assert_eq!(Role::parse(hash).unwrap(), Role::Producer);
    }

    #[test]
    fn test_zero_hash_is_none() {
        let zero = format!("0x{}", "0".repeat(64));
        assert_eq!(Role::parse(&zero).unwrap(), Role::None);
    }

    #[test]
    fn test_known_keccak_vector() {
        // keccak256("ADMIN")
        assert_eq!(
            hex::encode(Role::Admin.id()),
            "df8b4c520ffe197c5343c6f5aec59570151ef9a492f2c624fd45ddde6135ec42"
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(Role::parse("SUPERUSER").is_err());
        assert!(Role::parse(&format!("0x{}", "ab".repeat(32))).is_err());
        assert!(Role::parse("").is_err());
    }

    #[test]
    fn test_ids_are_distinct() {
        for a in Role::ALL {
            for b in Role::ALL {
                assert_eq!(a == b, a.id() == b.id());
            }
        }
    }

    #[test]
    fn test_serde_uses_labels() {
        assert_eq!(serde_json::to_string(&Role::Inspector).unwrap(), "\"INSPECTOR\"");
        let role: Role = serde_json::from_str("\"BUYER\"").unwrap();
        assert_eq!(role, Role::Buyer);
    }
}
