//! # Error Types
//!
//! Parse errors raised when external strings are converted into shared types.

use thiserror::Error;

/// An identity string could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIdentityError {
    /// Not valid hexadecimal.
    #[error("identity is not valid hex: {0}")]
    InvalidHex(String),

    /// Decoded to the wrong number of bytes.
    #[error("identity must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// A role label or role hash did not name a known role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRoleError {
    /// Neither a known label nor a known role hash.
    #[error("unrecognized role: {0}")]
    Unrecognized(String),
}
