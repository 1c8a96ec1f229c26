//! Signer address derivation from public keys.
//!
//! Address format: `hive_` + base32(fingerprint, 32 chars) + base32(checksum, 8 chars)
//!
//! Fingerprint: first 20 bytes of Blake2b-256(public_key). The key itself is
//! not recoverable from the address, so a signed action carries its public
//! key and the verifier re-derives the address to "recover" the signer.
//! Checksum: first 5 bytes of Blake2b-256(fingerprint).
//! Base32 alphabet: `13456789abcdefghijkmnopqrstuwxyz` (avoids ambiguous chars).

use hive_types::{Address, PublicKey};

const BASE32_ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

const PREFIX: &str = Address::PREFIX;
const FINGERPRINT_LEN: usize = 20;

fn encode_base32(bytes: &[u8]) -> String {
    let total_bits = bytes.len() * 8;
    let mut result = String::with_capacity(total_bits.div_ceil(5));

    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | byte as u64;
        bits_in_buffer += 8;
        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let idx = ((buffer >> bits_in_buffer) & 0x1F) as usize;
            result.push(BASE32_ALPHABET[idx] as char);
        }
    }
    if bits_in_buffer > 0 {
        let idx = ((buffer << (5 - bits_in_buffer)) & 0x1F) as usize;
        result.push(BASE32_ALPHABET[idx] as char);
    }

    result
}

/// The 20-byte key fingerprint an address is built from.
fn key_fingerprint(public_key: &PublicKey) -> [u8; FINGERPRINT_LEN] {
    let hash = crate::blake2b_256(public_key.as_bytes());
    let mut fingerprint = [0u8; FINGERPRINT_LEN];
    fingerprint.copy_from_slice(&hash[..FINGERPRINT_LEN]);
    fingerprint
}

/// Derive the `hive_`-prefixed signer address for a public key.
pub fn derive_address(public_key: &PublicKey) -> Address {
    let fingerprint = key_fingerprint(public_key);
    let checksum = crate::blake2b_256(&fingerprint);
    Address::new(format!(
        "{}{}{}",
        PREFIX,
        encode_base32(&fingerprint),
        encode_base32(&checksum[..5])
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::keypair_from_seed;

    #[test]
    fn derived_address_has_prefix_fingerprint_and_checksum() {
        let kp = keypair_from_seed(&[3u8; 32]);
        let addr = derive_address(&kp.public);
        assert!(addr.as_str().starts_with("hive_"));
        assert_eq!(addr.as_str().len(), 45);
        assert!(addr.is_valid());
        let body = &addr.as_str()[5..];
        assert_eq!(&body[..32], encode_base32(&key_fingerprint(&kp.public)));
    }

    #[test]
    fn derivation_is_deterministic() {
        let kp = keypair_from_seed(&[7u8; 32]);
        let again = keypair_from_seed(&[7u8; 32]);
        assert_eq!(derive_address(&kp.public), derive_address(&again.public));
    }

    #[test]
    fn base32_uses_unambiguous_alphabet() {
        let encoded = encode_base32(&[0xDE, 0xAD, 0xBE, 0xEF, 0x42]);
        assert_eq!(encoded.len(), 8);
        assert!(encoded.bytes().all(|c| BASE32_ALPHABET.contains(&c)));
        assert_eq!(encode_base32(&[0u8; 5]), "11111111");
    }

    #[test]
    fn different_keys_different_addresses() {
        let k1 = keypair_from_seed(&[1u8; 32]);
        let k2 = keypair_from_seed(&[2u8; 32]);
        assert_ne!(derive_address(&k1.public), derive_address(&k2.public));
    }
}
