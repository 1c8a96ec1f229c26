//! Domain separation for signed actions.
//!
//! A signature produced for one engine deployment (name, version, chain,
//! instance) must never verify against another. Every action digest starts
//! with the 32-byte separator computed here.

use crate::hash::blake2b_256_multi;
use serde::{Deserialize, Serialize};

/// Identifies the application context a signature is valid in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    /// Distinguishes engine instances sharing a chain.
    pub instance: String,
}

impl SigningDomain {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            instance: instance.into(),
        }
    }

    /// H("hive/domain" ‖ H(name) ‖ H(version) ‖ chain_id ‖ H(instance)).
    pub fn separator(&self) -> [u8; 32] {
        let name = blake2b_256_multi(&[self.name.as_bytes()]);
        let version = blake2b_256_multi(&[self.version.as_bytes()]);
        let instance = blake2b_256_multi(&[self.instance.as_bytes()]);
        blake2b_256_multi(&[
            b"hive/domain",
            &name,
            &version,
            &self.chain_id.to_be_bytes(),
            &instance,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_changes_with_every_field() {
        let base = SigningDomain::new("hive", "1", 1, "main");
        let others = [
            SigningDomain::new("other", "1", 1, "main"),
            SigningDomain::new("hive", "2", 1, "main"),
            SigningDomain::new("hive", "1", 2, "main"),
            SigningDomain::new("hive", "1", 1, "side"),
        ];
        for other in others {
            assert_ne!(base.separator(), other.separator());
        }
    }
}
