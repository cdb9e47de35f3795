//! Hashing utilities for MetaCollab

use sha3::{Digest, Keccak256};

/// Prefix of an Ethereum `personal_sign` message
pub const ETH_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Compute Keccak-256 of data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute Keccak-256 over several items as if concatenated
pub fn keccak256_all(items: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for item in items {
        hasher.update(item);
    }
    hasher.finalize().into()
}

/// Ethereum signed-message digest of `message`
///
/// `keccak256("\x19Ethereum Signed Message:\n" ‖ len(message) ‖ message)`
pub fn eth_message_hash(message: &[u8]) -> [u8; 32] {
    let len = message.len().to_string();
    keccak256_all(&[ETH_MESSAGE_PREFIX.as_bytes(), len.as_bytes(), message])
}

/// Digest a co-signed payload is signed over
///
/// The payload is hashed first, and the 32-byte hash is signed as a
/// personal message.
pub fn payload_digest(payload: &[u8]) -> [u8; 32] {
    eth_message_hash(&keccak256(payload))
}
