//! In-memory ledger
//!
//! Holds every token's balance and allowance tables plus native balances.
//! Writes made while a [`Checkpoint`] is open are journaled with their
//! previous value so the checkpoint can be rolled back exactly.

use std::collections::HashMap;

use metacollab_types::{Address, TokenAmount};
use tracing::{debug, info, warn};

use crate::{FungibleToken, LedgerError, NativeCurrency, Result};

#[derive(Debug, Clone, Default)]
struct TokenState {
    symbol: String,
    total_supply: TokenAmount,
    balances: HashMap<Address, TokenAmount>,
    /// `(owner, spender)` → remaining allowance
    allowances: HashMap<(Address, Address), TokenAmount>,
    /// Report `false` from every transfer instead of moving funds
    fail_transfers: bool,
}

#[derive(Debug, Clone)]
enum JournalEntry {
    Balance {
        token: Address,
        account: Address,
        previous: TokenAmount,
    },
    Allowance {
        token: Address,
        owner: Address,
        spender: Address,
        previous: TokenAmount,
    },
    Supply {
        token: Address,
        previous: TokenAmount,
    },
    Native {
        account: Address,
        previous: TokenAmount,
    },
}

/// Handle to an open checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    index: usize,
    depth: usize,
}

/// Token and native-currency ledger
#[derive(Debug, Default)]
pub struct Ledger {
    tokens: HashMap<Address, TokenState>,
    native: HashMap<Address, TokenAmount>,
    journal: Vec<JournalEntry>,
    open: usize,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token contract at `token`
    pub fn register_token(&mut self, token: Address, symbol: impl Into<String>) -> Result<()> {
        if self.tokens.contains_key(&token) {
            return Err(LedgerError::TokenExists { token });
        }
        let symbol = symbol.into();
        info!(%token, symbol = %symbol, "Token registered");
        self.tokens.insert(
            token,
            TokenState {
                symbol,
                ..TokenState::default()
            },
        );
        Ok(())
    }

    pub fn has_token(&self, token: &Address) -> bool {
        self.tokens.contains_key(token)
    }

    pub fn token_symbol(&self, token: &Address) -> Option<&str> {
        self.tokens.get(token).map(|t| t.symbol.as_str())
    }

    pub fn total_supply(&self, token: &Address) -> Result<TokenAmount> {
        Ok(self.token(token)?.total_supply)
    }

    /// Create `amount` new units of `token` for `to`
    pub fn mint(&mut self, token: &Address, to: &Address, amount: TokenAmount) -> Result<()> {
        let state = self.token(token)?;
        let supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { account: *to })?;
        let balance = state.balances.get(to).copied().unwrap_or(0);
        let balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { account: *to })?;

        self.write_supply(token, supply);
        self.write_balance(token, to, balance);
        debug!(%token, %to, amount, "Minted");
        Ok(())
    }

    /// Set `spender`'s allowance over `owner`'s balance
    pub fn approve(
        &mut self,
        token: &Address,
        owner: &Address,
        spender: &Address,
        amount: TokenAmount,
    ) -> Result<()> {
        self.token(token)?;
        self.write_allowance(token, owner, spender, amount);
        debug!(%token, %owner, %spender, amount, "Approved");
        Ok(())
    }

    pub fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Result<TokenAmount> {
        Ok(self
            .token(token)?
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0))
    }

    /// Make every transfer of `token` return `false` without moving funds
    pub fn set_transfer_failure(&mut self, token: &Address, fail: bool) -> Result<()> {
        self.token_mut(token)?.fail_transfers = fail;
        Ok(())
    }

    /// Credit native currency out of thin air
    pub fn fund_native(&mut self, account: &Address, amount: TokenAmount) -> Result<()> {
        let balance = self
            .native_balance(account)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { account: *account })?;
        self.write_native(account, balance);
        Ok(())
    }

    /// Open a checkpoint; every write until it closes is journaled
    pub fn checkpoint(&mut self) -> Checkpoint {
        self.open += 1;
        Checkpoint {
            index: self.journal.len(),
            depth: self.open,
        }
    }

    /// Undo every write made since `checkpoint` and close it
    pub fn rollback_to(&mut self, checkpoint: Checkpoint) -> Result<()> {
        self.ensure_innermost(checkpoint)?;
        let undone = self.journal.len() - checkpoint.index;
        while self.journal.len() > checkpoint.index {
            if let Some(entry) = self.journal.pop() {
                self.undo(entry);
            }
        }
        self.close();
        if undone > 0 {
            warn!(undone, "Ledger rolled back");
        }
        Ok(())
    }

    /// Keep every write made since `checkpoint` and close it
    pub fn commit(&mut self, checkpoint: Checkpoint) -> Result<()> {
        self.ensure_innermost(checkpoint)?;
        self.close();
        Ok(())
    }

    fn ensure_innermost(&self, checkpoint: Checkpoint) -> Result<()> {
        if checkpoint.depth != self.open || checkpoint.index > self.journal.len() {
            return Err(LedgerError::StaleCheckpoint(checkpoint.depth));
        }
        Ok(())
    }

    fn close(&mut self) {
        self.open -= 1;
        // Nothing left to roll back to
        if self.open == 0 {
            self.journal.clear();
        }
    }

    fn undo(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::Balance {
                token,
                account,
                previous,
            } => {
                if let Some(state) = self.tokens.get_mut(&token) {
                    state.balances.insert(account, previous);
                }
            }
            JournalEntry::Allowance {
                token,
                owner,
                spender,
                previous,
            } => {
                if let Some(state) = self.tokens.get_mut(&token) {
                    state.allowances.insert((owner, spender), previous);
                }
            }
            JournalEntry::Supply { token, previous } => {
                if let Some(state) = self.tokens.get_mut(&token) {
                    state.total_supply = previous;
                }
            }
            JournalEntry::Native { account, previous } => {
                self.native.insert(account, previous);
            }
        }
    }

    fn record(&mut self, entry: JournalEntry) {
        if self.open > 0 {
            self.journal.push(entry);
        }
    }

    fn token(&self, token: &Address) -> Result<&TokenState> {
        self.tokens
            .get(token)
            .ok_or(LedgerError::UnknownToken { token: *token })
    }

    fn token_mut(&mut self, token: &Address) -> Result<&mut TokenState> {
        self.tokens
            .get_mut(token)
            .ok_or(LedgerError::UnknownToken { token: *token })
    }

    fn write_balance(&mut self, token: &Address, account: &Address, value: TokenAmount) {
        let Some(state) = self.tokens.get_mut(token) else {
            return;
        };
        let previous = state.balances.insert(*account, value).unwrap_or(0);
        self.record(JournalEntry::Balance {
            token: *token,
            account: *account,
            previous,
        });
    }

    fn write_allowance(&mut self, token: &Address, owner: &Address, spender: &Address, value: TokenAmount) {
        let Some(state) = self.tokens.get_mut(token) else {
            return;
        };
        let previous = state.allowances.insert((*owner, *spender), value).unwrap_or(0);
        self.record(JournalEntry::Allowance {
            token: *token,
            owner: *owner,
            spender: *spender,
            previous,
        });
    }

    fn write_supply(&mut self, token: &Address, value: TokenAmount) {
        let Some(state) = self.tokens.get_mut(token) else {
            return;
        };
        let previous = std::mem::replace(&mut state.total_supply, value);
        self.record(JournalEntry::Supply {
            token: *token,
            previous,
        });
    }

    fn write_native(&mut self, account: &Address, value: TokenAmount) {
        let previous = self.native.insert(*account, value).unwrap_or(0);
        self.record(JournalEntry::Native {
            account: *account,
            previous,
        });
    }

    /// Debit `from` and credit `to`; the balance check happens before any write
    fn move_tokens(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<()> {
        let available = self.balance_of(token, from)?;
        let remaining = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                account: *from,
                available,
                required: amount,
            })?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(token, to)?
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { account: *to })?;

        self.write_balance(token, from, remaining);
        self.write_balance(token, to, credited);
        debug!(%token, %from, %to, amount, "Token transfer");
        Ok(())
    }
}

impl FungibleToken for Ledger {
    fn balance_of(&self, token: &Address, account: &Address) -> Result<TokenAmount> {
        Ok(self.token(token)?.balances.get(account).copied().unwrap_or(0))
    }

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<bool> {
        if self.token(token)?.fail_transfers {
            debug!(%token, %from, %to, amount, "Token declined transfer");
            return Ok(false);
        }
        self.move_tokens(token, from, to, amount)?;
        Ok(true)
    }

    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<bool> {
        if self.token(token)?.fail_transfers {
            debug!(%token, %from, %to, amount, "Token declined transferFrom");
            return Ok(false);
        }

        let allowed = self.allowance(token, from, spender)?;
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: *from,
                spender: *spender,
                available: allowed,
                required: amount,
            });
        }
        let available = self.balance_of(token, from)?;
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: *from,
                available,
                required: amount,
            });
        }

        // Allowance is spent only once the balances have moved
        self.move_tokens(token, from, to, amount)?;
        // An unlimited allowance is never spent down
        if allowed != TokenAmount::MAX {
            self.write_allowance(token, from, spender, allowed - amount);
        }
        Ok(true)
    }
}

impl NativeCurrency for Ledger {
    fn native_balance(&self, account: &Address) -> TokenAmount {
        self.native.get(account).copied().unwrap_or(0)
    }

    fn transfer_native(&mut self, from: &Address, to: &Address, amount: TokenAmount) -> Result<()> {
        let available = self.native_balance(from);
        let remaining = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                account: *from,
                available,
                required: amount,
            })?;
        if from == to || amount == 0 {
            return Ok(());
        }
        let credited = self
            .native_balance(to)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { account: *to })?;

        self.write_native(from, remaining);
        self.write_native(to, credited);
        debug!(%from, %to, amount, "Native transfer");
        Ok(())
    }
}
