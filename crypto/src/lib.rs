//! Cryptographic primitives for the Hive voting engine.
//!
//! - **Ed25519** for signing relayable actions
//! - **Blake2b** for identifiers, parameter hashes and signing digests
//! - Signer address derivation with `hive_` prefix and base32 encoding
//! - Domain separators binding signatures to one engine deployment

pub mod address;
pub mod domain;
pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;

pub use address::derive_address;
pub use domain::SigningDomain;
pub use error::CryptoError;
pub use hash::{blake2b_256, blake2b_256_multi, hash_params, hash_proposal_id, hash_scheme_id};
pub use keys::{generate_keypair, keypair_from_seed};
pub use sign::{sign_message, verify_signature};
