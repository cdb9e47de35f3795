//! MetaCollab Crypto - Signing primitives for co-signed escrow payloads
//!
//! This crate provides:
//! - Keccak-256 hashing and Ethereum signed-message digests
//! - secp256k1 local wallets with Ethereum-compatible addresses
//! - 65-byte recoverable signatures (`r ‖ s ‖ v`)
//! - Ordered signature sets recovered and checked position by position
//!
//! # Security Invariant
//!
//! **A signature set is valid only if signer `i` signed in position `i`.**

pub mod hash;
pub mod keys;
pub mod signature;
pub mod multisig;

pub use hash::*;
pub use keys::*;
pub use signature::*;
pub use multisig::*;

use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Signature is not in low-s form")]
    HighS,

    #[error("Public key recovery failed: {0}")]
    RecoveryFailed(String),

    #[error("Signature blob length {0} is not a multiple of 65")]
    InvalidBlobLength(usize),

    #[error("Expected {expected} signatures, got {actual}")]
    SignatureCountMismatch { expected: usize, actual: usize },

    #[error("Signer mismatch at position {position}")]
    SignerMismatch { position: usize },
}

pub type CryptoResult<T> = Result<T, CryptoError>;
