//! Local secp256k1 wallets
//!
//! - label → `blake3::derive_key` seed → secp256k1 signing key
//! - address = `keccak256(uncompressed_pubkey[1..])[12..]`

use std::fmt;

use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint as _;
use metacollab_types::Address;
use rand::rngs::OsRng;

use crate::hash::{keccak256, payload_digest};
use crate::signature::RecoverableSignature;
use crate::{CryptoError, CryptoResult};

/// Domain separation context for label-derived wallets
const LABEL_SEED_CONTEXT: &str = "metacollab local wallet secp256k1 seed v1";

/// A signing wallet held in process memory
#[derive(Clone)]
pub struct LocalWallet {
    signing_key: SigningKey,
    address: Address,
}

impl LocalWallet {
    /// Generate a new random wallet
    pub fn random() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        Self::from_signing_key(signing_key)
    }

    /// Create from a 32-byte secret scalar
    pub fn from_seed(seed: &[u8; 32]) -> CryptoResult<Self> {
        let signing_key = SigningKey::from_bytes(seed.into())
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(Self::from_signing_key(signing_key))
    }

    /// Deterministic wallet for a human-readable label
    ///
    /// The same label always yields the same key, which keeps demos and
    /// tests reproducible.
    pub fn from_label(label: &str) -> CryptoResult<Self> {
        let seed = blake3::derive_key(LABEL_SEED_CONTEXT, label.as_bytes());
        Self::from_seed(&seed)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = address_of(signing_key.verifying_key());
        Self {
            signing_key,
            address,
        }
    }

    /// Ethereum-compatible address of this wallet
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte digest as-is
    pub fn sign_digest(&self, digest: &[u8; 32]) -> CryptoResult<RecoverableSignature> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        RecoverableSignature::from_parts(&signature.to_bytes(), 27 + recovery_id.to_byte())
    }

    /// Sign a canonically encoded payload the way co-signers do
    pub fn sign_payload(&self, payload: &[u8]) -> CryptoResult<RecoverableSignature> {
        self.sign_digest(&payload_digest(payload))
    }
}

impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Ethereum address of a secp256k1 public key
pub fn address_of(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    // Skip the 0x04 prefix byte
    let hash = keccak256(&encoded.as_bytes()[1..]);
    Address::from_digest(&hash)
}
