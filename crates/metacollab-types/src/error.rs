//! Error types for MetaCollab domain types
//!
//! Decoding failures are explicit: a payload that does not match its canonical
//! layout is rejected, never partially accepted.

use thiserror::Error;

/// Errors parsing identity types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Hex string could not be decoded
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Decoded bytes have the wrong length
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Errors from the canonical ABI codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// Input ended before a word could be read
    #[error("Payload truncated: need {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A dynamic offset or length does not fit in memory
    #[error("Offset or length out of range at {offset}")]
    OffsetOutOfRange { offset: usize },

    /// An address word carries non-zero padding
    #[error("Dirty address padding at {offset}")]
    DirtyAddress { offset: usize },

    /// An integer does not fit its declared width
    #[error("Value out of range for uint{bits} at {offset}")]
    ValueOutOfRange { bits: u16, offset: usize },

    /// A decoded value had an unexpected shape
    #[error("Type mismatch: expected {expected}")]
    TypeMismatch { expected: String },
}

/// Result type for ABI operations
pub type AbiResult<T> = std::result::Result<T, AbiError>;
