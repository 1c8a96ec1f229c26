//! Account address type with `hive_` prefix.

use crate::error::HiveError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A Hive account address, always prefixed with `hive_`.
///
/// Key-backed addresses are derived from an Ed25519 public key via
/// `hive_crypto::derive_address`. Schemes and owning identities may use any
/// well-formed address.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// The standard prefix for all Hive addresses.
    pub const PREFIX: &'static str = "hive_";

    /// Create a new address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `hive_`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with hive_");
        Self(s)
    }

    /// Parse an address, rejecting strings without the prefix or with an empty body.
    pub fn parse(raw: &str) -> Result<Self, HiveError> {
        let candidate = Self(raw.to_string());
        if candidate.is_valid() {
            Ok(candidate)
        } else {
            Err(HiveError::InvalidAddress(raw.to_string()))
        }
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Validate that this address is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
