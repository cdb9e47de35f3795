//! MetaCollab Types - Canonical domain types for funder/doer escrow agreements
//!
//! This crate contains the foundational types for MetaCollab with zero
//! dependencies on other metacollab crates:
//!
//! - Identity types (`Address`, `Bytes32`)
//! - Gig records and their status machine
//! - Emitted event records
//! - The canonical ABI codec used for co-signed payloads
//!
//! # Invariants carried by these types
//!
//! 1. A gig's `tokens` and `amounts` are positionally paired
//! 2. A gig's fee/reward ratio never sums to zero
//! 3. Every co-signed payload is encoded with one canonical layout

pub mod identity;
pub mod gig;
pub mod event;
pub mod abi;
pub mod error;

pub use identity::*;
pub use gig::*;
pub use event::*;
pub use abi::{AbiType, AbiValue};
pub use error::*;

/// Version of the MetaCollab types schema
pub const TYPES_VERSION: &str = "0.1.0";

/// Block timestamp in seconds
pub type Timestamp = u64;

/// Token quantity in the token's smallest unit
pub type TokenAmount = u128;
