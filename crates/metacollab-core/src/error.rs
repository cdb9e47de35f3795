//! Error types for MetaCollab core operations
//!
//! Every failure aborts the whole operation. Display strings match the
//! revert reasons agreements have always reported.

use metacollab_ledger::LedgerError;
use metacollab_types::Address;
use thiserror::Error;

/// Errors raised by agreements, factories and the chain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollabError {
    #[error("invalid data")]
    InvalidData,

    #[error("invalid signatures")]
    InvalidSignatures,

    #[error("invalid gig")]
    InvalidGig,

    #[error("only funder")]
    OnlyFunder,

    #[error("only party")]
    OnlyParty,

    #[error("invalid resolver")]
    InvalidResolver,

    #[error("invalid thirdParty")]
    InvalidThirdParty,

    #[error("invalid timestamp")]
    InvalidTimestamp,

    #[error("still counting")]
    StillCounting,

    #[error("invalid value")]
    InvalidValue,

    #[error("invalid ratio")]
    InvalidRatio,

    #[error("invalid implementation")]
    InvalidImplementation,

    #[error("already initialized")]
    AlreadyInitialized,

    #[error("clone failed")]
    CloneFailed,

    #[error("transfer failed for token {token}")]
    TransferFailed { token: Address },

    #[error("unknown contract {address}")]
    UnknownContract { address: Address },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, CollabError>;
