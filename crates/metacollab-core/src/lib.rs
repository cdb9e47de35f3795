//! MetaCollab Core - Two-party escrow agreements for funders and doers
//!
//! This crate implements the contracts of MetaCollab and the chain they run on:
//! - Agreement: a funder/doer pair and the gigs they co-sign
//! - Gig state machine: custody, cancellation windows, dispute countdown
//! - CollabFactory: minimal-clone deployment and resolver fee schedule
//! - Chain: atomic, serialized execution over an in-memory ledger
//!
//! # Architectural Invariants
//!
//! 1. A gig's status only moves forward
//! 2. A gig's resolver and flat fee never change after creation
//! 3. Every co-signed payload is bound to one agreement and, for creation,
//!    to its current gig count
//! 4. A failed call has no effect

pub mod error;
pub mod payload;
pub mod clones;
pub mod agreement;
pub mod factory;
pub mod chain;

pub use error::*;
pub use payload::*;
pub use clones::*;
pub use agreement::*;
pub use factory::*;
pub use chain::*;
