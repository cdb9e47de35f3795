//! Emitted event records
//!
//! Every successful state transition emits one or more events. The chain
//! stamps each event with its emitter and block time into a [`LogRecord`].

use serde::{Deserialize, Serialize};

use crate::identity::hex_bytes;
use crate::{Address, Bytes32, Timestamp, TokenAmount};

/// Events emitted by an agreement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum CollabEvent {
    /// A gig was created; `reference` is the opaque payload reference
    GigInit {
        gig_id: u64,
        #[serde(with = "hex_bytes")]
        reference: Vec<u8>,
    },
    /// Funds were pulled into custody
    GigActive { gig_id: u64 },
    /// The funder cancelled the gig
    GigCancelled { gig_id: u64 },
    /// A party started the dispute countdown
    GigLockCountdownStarted { gig_id: u64 },
    /// The countdown elapsed and the resolver was paid
    GigLockedForDispute { gig_id: u64 },
    /// Custody was split between funder and doer
    GigDone { gig_id: u64, ratio: [u8; 2] },
    /// A party recorded its third-party identity
    GigThirdPartyUpdated { gig_id: u64 },
    /// Both parties re-published the gig reference
    GigHashUpdated {
        gig_id: u64,
        #[serde(with = "hex_bytes")]
        reference: Vec<u8>,
    },
    /// Both parties named a resolver for a gig created without one
    GigResolverUpdated { gig_id: u64, resolver: Address },
}

impl CollabEvent {
    /// Gig this event refers to
    pub fn gig_id(&self) -> u64 {
        match self {
            Self::GigInit { gig_id, .. }
            | Self::GigActive { gig_id }
            | Self::GigCancelled { gig_id }
            | Self::GigLockCountdownStarted { gig_id }
            | Self::GigLockedForDispute { gig_id }
            | Self::GigDone { gig_id, .. }
            | Self::GigThirdPartyUpdated { gig_id }
            | Self::GigHashUpdated { gig_id, .. }
            | Self::GigResolverUpdated { gig_id, .. } => *gig_id,
        }
    }
}

/// Events emitted by the agreement factory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum FactoryEvent {
    /// A new agreement clone was deployed and initialized
    LogNewCollab { index: u64, collab: Address },
    /// A resolver changed its flat fee
    UpdateFlatFee {
        resolver: Address,
        fee: TokenAmount,
        reference: Bytes32,
    },
}

/// Any event the chain records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Event {
    Collab(CollabEvent),
    Factory(FactoryEvent),
}

impl From<CollabEvent> for Event {
    fn from(event: CollabEvent) -> Self {
        Self::Collab(event)
    }
}

impl From<FactoryEvent> for Event {
    fn from(event: FactoryEvent) -> Self {
        Self::Factory(event)
    }
}

/// An event stamped with its emitter and block time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub emitter: Address,
    pub block_time: Timestamp,
    pub event: Event,
}
