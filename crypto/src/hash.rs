//! Blake2b hashing for identifiers and signing digests.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use hive_types::{Address, ParamsHash, ProposalId, SchemeId};

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[data])
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Length-prefix a variable-size field so adjacent fields cannot be shifted
/// into each other.
fn framed(bytes: &[u8]) -> [u8; 8] {
    (bytes.len() as u64).to_be_bytes()
}

/// Scheme id = H("hive/scheme" ‖ scheme ‖ owner).
pub fn hash_scheme_id(scheme: &Address, owner: &Address) -> SchemeId {
    SchemeId::new(blake2b_256_multi(&[
        b"hive/scheme",
        &framed(scheme.as_bytes()),
        scheme.as_bytes(),
        &framed(owner.as_bytes()),
        owner.as_bytes(),
    ]))
}

/// Proposal id = H("hive/proposal" ‖ scheme ‖ proposer ‖ nonce).
pub fn hash_proposal_id(scheme: &SchemeId, proposer: &Address, nonce: u64) -> ProposalId {
    ProposalId::new(blake2b_256_multi(&[
        b"hive/proposal",
        scheme.as_bytes(),
        &framed(proposer.as_bytes()),
        proposer.as_bytes(),
        &nonce.to_be_bytes(),
    ]))
}

/// Parameter set hash over the canonical big-endian value array.
pub fn hash_params(values: &[u128]) -> ParamsHash {
    let mut hasher = Blake2b256::new();
    hasher.update(b"hive/params");
    for value in values {
        hasher.update(value.to_be_bytes());
    }
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    ParamsHash::new(output)
}
