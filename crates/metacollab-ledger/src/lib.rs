//! MetaCollab Ledger - Token custody host for escrow agreements
//!
//! The ledger is:
//! - Token-scoped (one balance table and allowance table per token address)
//! - Native-aware (plain value transfers for resolver fees)
//! - Journaled (every write inside a checkpoint can be undone)
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. A rolled-back checkpoint leaves every balance and allowance as it was
//! 3. A token in failure mode moves nothing and reports `false`

use metacollab_types::{Address, TokenAmount};
use thiserror::Error;

pub mod clock;
pub mod ledger;

pub use clock::BlockClock;
pub use ledger::{Checkpoint, Ledger};

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Unknown token: {token}")]
    UnknownToken { token: Address },

    #[error("Token already registered: {token}")]
    TokenExists { token: Address },

    #[error("Insufficient balance of {account}: have {available}, need {required}")]
    InsufficientBalance {
        account: Address,
        available: TokenAmount,
        required: TokenAmount,
    },

    #[error("Insufficient allowance for {spender} on {owner}: have {available}, need {required}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        available: TokenAmount,
        required: TokenAmount,
    },

    #[error("Balance overflow for {account}")]
    BalanceOverflow { account: Address },

    #[error("Checkpoint {0} is not open")]
    StaleCheckpoint(usize),

    #[error("Clock cannot move backwards from {now} to {requested}")]
    ClockBackwards { now: u64, requested: u64 },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Fungible token transfer interface
///
/// Mirrors the ERC-20 surface the agreement relies on. `Ok(false)` is a
/// token that declined the transfer without reverting; callers decide how to
/// treat it.
pub trait FungibleToken {
    fn balance_of(&self, token: &Address, account: &Address) -> Result<TokenAmount>;

    /// Move `amount` from `from` (the calling account) to `to`
    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<bool>;

    /// Move `amount` from `from` to `to` against `spender`'s allowance
    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<bool>;
}

/// Native currency transfer interface
pub trait NativeCurrency {
    fn native_balance(&self, account: &Address) -> TokenAmount;

    fn transfer_native(&mut self, from: &Address, to: &Address, amount: TokenAmount) -> Result<()>;
}

/// Everything an agreement may move
pub trait Assets: FungibleToken + NativeCurrency {}

impl<T: FungibleToken + NativeCurrency + ?Sized> Assets for T {}
