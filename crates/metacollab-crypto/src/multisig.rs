//! Ordered signature sets
//!
//! A signature set is the concatenation of 65-byte records, one per required
//! signer, in the order the signers are required. Verification recovers one
//! address per record against the payload digest and compares position by
//! position; signing the same payload in the wrong order fails.

use metacollab_types::Address;

use crate::hash::payload_digest;
use crate::keys::LocalWallet;
use crate::signature::{RecoverableSignature, SIGNATURE_LEN};
use crate::{CryptoError, CryptoResult};

/// An ordered set of signature records
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureSet {
    records: Vec<RecoverableSignature>,
}

impl SignatureSet {
    /// Split a concatenated blob into records
    pub fn parse(blob: &[u8]) -> CryptoResult<Self> {
        if blob.len() % SIGNATURE_LEN != 0 {
            return Err(CryptoError::InvalidBlobLength(blob.len()));
        }
        let records = blob
            .chunks_exact(SIGNATURE_LEN)
            .map(RecoverableSignature::from_bytes)
            .collect::<CryptoResult<Vec<_>>>()?;
        Ok(Self { records })
    }

    /// Sign `payload` with every wallet, in order
    pub fn sign(payload: &[u8], signers: &[&LocalWallet]) -> CryptoResult<Self> {
        let records = signers
            .iter()
            .map(|wallet| wallet.sign_payload(payload))
            .collect::<CryptoResult<Vec<_>>>()?;
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[RecoverableSignature] {
        &self.records
    }

    /// Concatenated wire blob
    pub fn to_bytes(&self) -> Vec<u8> {
        self.records.iter().flat_map(|r| r.to_bytes()).collect()
    }

    /// Recover one signer per record, in order
    pub fn recover_signers(&self, payload: &[u8]) -> CryptoResult<Vec<Address>> {
        let digest = payload_digest(payload);
        self.records.iter().map(|r| r.recover(&digest)).collect()
    }

    /// Check that record `i` was produced by `required[i]` over `payload`
    pub fn verify(&self, payload: &[u8], required: &[Address]) -> CryptoResult<()> {
        if self.records.len() != required.len() {
            return Err(CryptoError::SignatureCountMismatch {
                expected: required.len(),
                actual: self.records.len(),
            });
        }
        let recovered = self.recover_signers(payload)?;
        match recovered.iter().zip(required).position(|(got, want)| got != want) {
            Some(position) => Err(CryptoError::SignerMismatch { position }),
            None => Ok(()),
        }
    }
}

/// Concatenate signatures over `payload` from `signers`, in order
pub fn multisign(payload: &[u8], signers: &[&LocalWallet]) -> CryptoResult<Vec<u8>> {
    Ok(SignatureSet::sign(payload, signers)?.to_bytes())
}

/// Verify a concatenated blob against an ordered signer list
///
/// Any malformed record, unrecoverable signature, count mismatch or
/// positional mismatch yields `false`.
pub fn verify_signatures(payload: &[u8], blob: &[u8], required: &[Address]) -> bool {
    SignatureSet::parse(blob)
        .and_then(|set| set.verify(payload, required))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parties() -> (LocalWallet, LocalWallet) {
        (
            LocalWallet::from_label("funder").unwrap(),
            LocalWallet::from_label("doer").unwrap(),
        )
    }

    #[test]
    fn test_ordered_signatures_verify() {
        let (funder, doer) = parties();
        let blob = multisign(b"payload", &[&funder, &doer]).unwrap();
        assert_eq!(blob.len(), 130);
        assert!(verify_signatures(
            b"payload",
            &blob,
            &[funder.address(), doer.address()]
        ));
    }

    #[test]
    fn test_swapped_order_fails() {
        let (funder, doer) = parties();
        let blob = multisign(b"payload", &[&doer, &funder]).unwrap();
        let set = SignatureSet::parse(&blob).unwrap();
        assert_eq!(
            set.verify(b"payload", &[funder.address(), doer.address()]),
            Err(CryptoError::SignerMismatch { position: 0 })
        );
    }

    #[test]
    fn test_wrong_signer_count_fails() {
        let (funder, doer) = parties();
        let blob = multisign(b"payload", &[&funder]).unwrap();
        let set = SignatureSet::parse(&blob).unwrap();
        assert!(matches!(
            set.verify(b"payload", &[funder.address(), doer.address()]),
            Err(CryptoError::SignatureCountMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_other_payload_fails() {
        let (funder, doer) = parties();
        let blob = multisign(b"payload", &[&funder, &doer]).unwrap();
        assert!(!verify_signatures(
            b"tampered",
            &blob,
            &[funder.address(), doer.address()]
        ));
    }

    #[test]
    fn test_truncated_blob_rejected() {
        let (funder, doer) = parties();
        let blob = multisign(b"payload", &[&funder, &doer]).unwrap();
        assert_eq!(
            SignatureSet::parse(&blob[..129]),
            Err(CryptoError::InvalidBlobLength(129))
        );
        assert!(!verify_signatures(b"payload", &[], &[funder.address()]));
    }

    #[test]
    fn test_recover_signers_in_order() {
        let (funder, doer) = parties();
        let set = SignatureSet::sign(b"payload", &[&doer, &funder]).unwrap();
        assert_eq!(
            set.recover_signers(b"payload").unwrap(),
            vec![doer.address(), funder.address()]
        );
    }
}
