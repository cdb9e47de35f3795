//! Recoverable secp256k1 signatures in Ethereum wire form

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use metacollab_types::Address;
use serde::{Deserialize, Serialize};

use crate::keys::address_of;
use crate::{CryptoError, CryptoResult};

/// Length of one wire signature record
pub const SIGNATURE_LEN: usize = 65;

/// A 65-byte `r ‖ s ‖ v` signature record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Recovery byte, `27`/`28` (or `0`/`1`)
    pub v: u8,
}

impl RecoverableSignature {
    pub(crate) fn from_parts(rs: &[u8], v: u8) -> CryptoResult<Self> {
        if rs.len() != 64 {
            return Err(CryptoError::MalformedSignature(format!(
                "expected 64 bytes of r and s, got {}",
                rs.len()
            )));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&rs[..32]);
        s.copy_from_slice(&rs[32..]);
        Ok(Self { r, s, v })
    }

    /// Parse one 65-byte record
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(CryptoError::MalformedSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LEN,
                bytes.len()
            )));
        }
        Self::from_parts(&bytes[..64], bytes[64])
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    fn recovery_id(&self) -> CryptoResult<RecoveryId> {
        let parity = match self.v {
            0 | 27 => 0,
            1 | 28 => 1,
            other => {
                return Err(CryptoError::MalformedSignature(format!(
                    "invalid recovery byte {}",
                    other
                )))
            }
        };
        RecoveryId::from_byte(parity)
            .ok_or_else(|| CryptoError::MalformedSignature("invalid recovery id".to_string()))
    }

    fn signature(&self) -> CryptoResult<Signature> {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        let signature = Signature::from_slice(&rs)
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
        // Malleable high-s twins are refused
        if signature.normalize_s().is_some() {
            return Err(CryptoError::HighS);
        }
        Ok(signature)
    }

    /// Recover the signer's address from a 32-byte digest
    pub fn recover(&self, digest: &[u8; 32]) -> CryptoResult<Address> {
        let signature = self.signature()?;
        let recovery_id = self.recovery_id()?;
        let key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id)
            .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;
        Ok(address_of(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::payload_digest;
    use crate::keys::LocalWallet;

    /// secp256k1 group order
    const ORDER: &str = "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";

    fn negate_mod_order(s: &[u8; 32]) -> [u8; 32] {
        let mut n = [0u8; 32];
        hex::decode_to_slice(ORDER, &mut n).unwrap();
        let mut out = [0u8; 32];
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let mut diff = n[i] as i16 - s[i] as i16 - borrow;
            borrow = 0;
            if diff < 0 {
                diff += 256;
                borrow = 1;
            }
            out[i] = diff as u8;
        }
        out
    }

    #[test]
    fn test_sign_and_recover() {
        let wallet = LocalWallet::from_label("funder").unwrap();
        let sig = wallet.sign_payload(b"gig payload").unwrap();
        let digest = payload_digest(b"gig payload");
        assert_eq!(sig.recover(&digest).unwrap(), wallet.address());
    }

    #[test]
    fn test_zero_one_recovery_byte_accepted() {
        let wallet = LocalWallet::from_label("doer").unwrap();
        let mut sig = wallet.sign_payload(b"x").unwrap();
        sig.v -= 27;
        assert_eq!(sig.recover(&payload_digest(b"x")).unwrap(), wallet.address());
    }

    #[test]
    fn test_bad_recovery_byte_rejected() {
        let wallet = LocalWallet::from_label("doer").unwrap();
        let mut sig = wallet.sign_payload(b"x").unwrap();
        sig.v = 29;
        assert!(matches!(
            sig.recover(&payload_digest(b"x")),
            Err(CryptoError::MalformedSignature(_))
        ));
    }

    #[test]
    fn test_high_s_rejected() {
        let wallet = LocalWallet::from_label("funder").unwrap();
        let sig = wallet.sign_payload(b"payload").unwrap();
        let twin = RecoverableSignature {
            r: sig.r,
            s: negate_mod_order(&sig.s),
            v: if sig.v == 27 { 28 } else { 27 },
        };
        assert_eq!(
            twin.recover(&payload_digest(b"payload")),
            Err(CryptoError::HighS)
        );
    }

    #[test]
    fn test_different_digest_recovers_other_address() {
        let wallet = LocalWallet::from_label("funder").unwrap();
        let sig = wallet.sign_payload(b"one").unwrap();
        let recovered = sig.recover(&payload_digest(b"two"));
        assert!(recovered.map(|a| a != wallet.address()).unwrap_or(true));
    }

    #[test]
    fn test_wire_bytes() {
        let wallet = LocalWallet::from_label("funder").unwrap();
        let sig = wallet.sign_payload(b"one").unwrap();
        let bytes = sig.to_bytes();
        assert_eq!(RecoverableSignature::from_bytes(&bytes).unwrap(), sig);
        assert!(RecoverableSignature::from_bytes(&bytes[..64]).is_err());
    }
}
