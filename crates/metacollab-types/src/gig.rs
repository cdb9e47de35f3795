//! Gig records for MetaCollab
//!
//! A gig is one escrow task inside an agreement. It custodies one or more
//! token balances, carries its own timers and an optional resolver, and only
//! ever moves forward through its status machine.

use serde::{Deserialize, Serialize};

use crate::{Address, Timestamp, TokenAmount};

/// Status of a gig
///
/// The discriminants follow the order the status is exposed in on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GigStatus {
    /// Created, no funds custodied yet
    Init = 0,
    /// Funds custodied, work in progress
    Active = 1,
    /// Dispute countdown running
    Countdown = 2,
    /// Locked for dispute, resolver paid
    Locked = 3,
    /// Reserved; no transition produces it
    Resolved = 4,
    /// Cancelled by the funder
    Cancelled = 5,
    /// Completed and paid out
    Done = 6,
}

impl GigStatus {
    /// Terminal statuses are permanent historical records
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Done)
    }
}

/// Index of the cancellation window in [`Gig::durations`]
pub const CANCELLATION_WINDOW: usize = 0;
/// Index of the dispute countdown period in [`Gig::durations`]
pub const COUNTDOWN_PERIOD: usize = 1;
/// Index of the expiration period in [`Gig::durations`]
pub const EXPIRATION_PERIOD: usize = 2;

/// Slot in [`Gig::third_parties`] written by the funder
pub const FUNDER_SLOT: usize = 0;
/// Slot in [`Gig::third_parties`] written by the doer
pub const DOER_SLOT: usize = 1;

/// A single escrow task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gig {
    pub status: GigStatus,
    pub tokens: Vec<Address>,
    pub amounts: Vec<TokenAmount>,
    pub start_timestamp: Timestamp,
    pub countdown_timestamp: Timestamp,
    /// `[cancellation_window, countdown_period, expiration_period]`
    pub durations: [u64; 3],
    pub resolver: Address,
    pub flat_resolver_fee: TokenAmount,
    /// `[funder_share, doer_share]`
    pub fee_reward_ratio: [u8; 2],
    pub third_parties: [Address; 2],
}

impl Gig {
    /// Last instant at which an active gig may still be cancelled early
    pub fn cancellation_deadline(&self) -> Timestamp {
        self.start_timestamp
            .saturating_add(self.durations[CANCELLATION_WINDOW])
    }

    /// First instant at which an active gig may be cancelled as expired
    pub fn expires_at(&self) -> Timestamp {
        self.start_timestamp
            .saturating_add(self.durations[EXPIRATION_PERIOD])
    }

    /// First instant at which a running countdown can be turned into a lock
    pub fn countdown_ends_at(&self) -> Timestamp {
        self.countdown_timestamp
            .saturating_add(self.durations[COUNTDOWN_PERIOD])
    }

    /// Whether an active gig may be cancelled at `now`
    ///
    /// Permitted on `[start, start + window] ∪ [start + expiration, ∞)`.
    pub fn cancellable_at(&self, now: Timestamp) -> bool {
        now <= self.cancellation_deadline() || now >= self.expires_at()
    }

    /// Whether a dispute lock is possible at all
    pub fn has_resolver(&self) -> bool {
        !self.resolver.is_zero()
    }

    /// Custodied `(token, amount)` pairs
    pub fn holdings(&self) -> impl Iterator<Item = (&Address, TokenAmount)> {
        self.tokens.iter().zip(self.amounts.iter().copied())
    }
}

/// Whether a `[funder_share, doer_share]` ratio is usable for a split
pub fn is_valid_ratio(ratio: &[u8; 2]) -> bool {
    ratio[0] != 0 || ratio[1] != 0
}

/// Split `amount` by `ratio` into `(funder_share, doer_share)`
///
/// The funder share is `floor(amount * r0 / (r0 + r1))`; the doer receives
/// the remainder, so the two shares always sum to `amount`. Returns `None` for
/// a zero ratio.
pub fn split_by_ratio(amount: TokenAmount, ratio: &[u8; 2]) -> Option<(TokenAmount, TokenAmount)> {
    let total = ratio[0] as u128 + ratio[1] as u128;
    if total == 0 {
        return None;
    }
    let r0 = ratio[0] as u128;
    // floor(a * r0 / t) without forming a * r0
    let funder = (amount / total) * r0 + ((amount % total) * r0) / total;
    Some((funder, amount - funder))
}
