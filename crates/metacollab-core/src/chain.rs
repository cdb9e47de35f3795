//! In-process chain hosting tokens, agreements and factories
//!
//! The chain owns every piece of state: the ledger, the block clock, the
//! agreement arena, the factories and the event log. Mutation takes
//! `&mut Chain`, so operations are serialized by construction.
//!
//! Each call is atomic. The chain opens a ledger checkpoint (which also covers
//! the native value attached to the call), runs the operation, then either
//! commits the checkpoint and appends the buffered events to the log, or rolls
//! the ledger back and discards the events.

use std::collections::HashMap;

use metacollab_ledger::{BlockClock, Ledger, NativeCurrency as _};
use metacollab_types::{Address, Bytes32, CollabEvent, Event, LogRecord, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agreement::{Agreement, Env};
use crate::clones::{create_address, CONTRACT_START_NONCE};
use crate::error::{CollabError, Result};
use crate::factory::{AgreementHost, CollabFactory, FactoryEnv, FeeSchedule};

/// Chain configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Genesis block timestamp; wall-clock time when unset
    #[serde(default)]
    pub genesis_timestamp: Option<Timestamp>,
}

/// What occupies a deployed address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployed {
    Agreement(usize),
    Factory(usize),
    Token,
}

/// The whole world MetaCollab contracts run in
#[derive(Debug)]
pub struct Chain {
    clock: BlockClock,
    ledger: Ledger,
    agreements: Vec<Agreement>,
    factories: Vec<CollabFactory>,
    registry: HashMap<Address, Deployed>,
    /// Deployment nonces of accounts that have deployed something
    nonces: HashMap<Address, u64>,
    logs: Vec<LogRecord>,
}

impl Chain {
    pub fn new(config: ChainConfig) -> Self {
        let clock = match config.genesis_timestamp {
            Some(genesis) => BlockClock::new(genesis),
            None => BlockClock::starting_now(),
        };
        info!(genesis = clock.now(), "Chain started");
        Self {
            clock,
            ledger: Ledger::new(),
            agreements: Vec::new(),
            factories: Vec::new(),
            registry: HashMap::new(),
            nonces: HashMap::new(),
            logs: Vec::new(),
        }
    }

    // ========================================================================
    // Clock and ledger
    // ========================================================================

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Move the block clock forward by `seconds`
    pub fn advance(&mut self, seconds: u64) -> Timestamp {
        self.clock.advance(seconds)
    }

    pub fn warp_to(&mut self, timestamp: Timestamp) -> Result<()> {
        Ok(self.clock.warp_to(timestamp)?)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Every event emitted by a successful call, oldest first
    pub fn logs(&self) -> &[LogRecord] {
        &self.logs
    }

    /// Events emitted by `emitter`, oldest first
    pub fn events_of(&self, emitter: &Address) -> Vec<&Event> {
        self.logs
            .iter()
            .filter(|record| record.emitter == *emitter)
            .map(|record| &record.event)
            .collect()
    }

    // ========================================================================
    // Deployment
    // ========================================================================

    /// Deploy a token contract from `deployer`
    pub fn deploy_token(&mut self, deployer: &Address, symbol: &str) -> Result<Address> {
        let address = self.next_deploy_address(deployer)?;
        self.ledger.register_token(address, symbol)?;
        self.registry.insert(address, Deployed::Token);
        Ok(address)
    }

    /// Deploy the sealed agreement template from `deployer`
    pub fn deploy_template(&mut self, deployer: &Address) -> Result<Address> {
        let address = self.next_deploy_address(deployer)?;
        self.registry
            .insert(address, Deployed::Agreement(self.agreements.len()));
        self.agreements.push(Agreement::template(address));
        info!(template = %address, "Agreement template deployed");
        Ok(address)
    }

    /// Deploy a factory for `implementation` from `deployer`
    pub fn deploy_factory(&mut self, deployer: &Address, implementation: Address) -> Result<Address> {
        let factory = CollabFactory::new(self.peek_deploy_address(deployer), implementation)?;
        let address = self.next_deploy_address(deployer)?;
        self.registry
            .insert(address, Deployed::Factory(self.factories.len()));
        self.factories.push(factory);
        info!(factory = %address, %implementation, "Factory deployed");
        Ok(address)
    }

    fn nonce_of(&self, account: &Address) -> u64 {
        let start = match self.registry.get(account) {
            Some(_) => CONTRACT_START_NONCE,
            None => 0,
        };
        self.nonces.get(account).copied().unwrap_or(start)
    }

    fn peek_deploy_address(&self, deployer: &Address) -> Address {
        create_address(deployer, self.nonce_of(deployer))
    }

    /// Claim the next CREATE address of `deployer`
    fn next_deploy_address(&mut self, deployer: &Address) -> Result<Address> {
        let nonce = self.nonce_of(deployer);
        let address = create_address(deployer, nonce);
        if self.registry.contains_key(&address) {
            return Err(CollabError::CloneFailed);
        }
        self.nonces.insert(*deployer, nonce + 1);
        Ok(address)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn agreement(&self, address: &Address) -> Result<&Agreement> {
        match self.registry.get(address) {
            Some(Deployed::Agreement(index)) => self
                .agreements
                .get(*index)
                .ok_or(CollabError::UnknownContract { address: *address }),
            _ => Err(CollabError::UnknownContract { address: *address }),
        }
    }

    pub fn collab_factory(&self, address: &Address) -> Result<&CollabFactory> {
        match self.registry.get(address) {
            Some(Deployed::Factory(index)) => self
                .factories
                .get(*index)
                .ok_or(CollabError::UnknownContract { address: *address }),
            _ => Err(CollabError::UnknownContract { address: *address }),
        }
    }

    pub fn deployed(&self, address: &Address) -> Option<Deployed> {
        self.registry.get(address).copied()
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Prepare a call into the agreement at `address`
    pub fn collab(&mut self, address: Address) -> CollabCall<'_> {
        CollabCall {
            chain: self,
            address,
            caller: Address::ZERO,
        }
    }

    /// Prepare a call into the factory at `address`
    pub fn factory(&mut self, address: Address) -> FactoryCall<'_> {
        FactoryCall {
            chain: self,
            address,
            caller: Address::ZERO,
        }
    }

    fn execute_collab<T>(
        &mut self,
        address: Address,
        caller: Address,
        value: TokenAmount,
        op: impl FnOnce(&mut Agreement, &mut Env<'_>) -> Result<T>,
    ) -> Result<T> {
        let index = match self.registry.get(&address) {
            Some(Deployed::Agreement(index)) => *index,
            _ => return Err(CollabError::UnknownContract { address }),
        };

        let checkpoint = self.ledger.checkpoint();
        match self.dispatch_collab(address, index, caller, value, op) {
            Ok((output, events)) => {
                self.ledger.commit(checkpoint)?;
                self.append_logs(address, events.into_iter().map(Event::from));
                Ok(output)
            }
            Err(err) => {
                self.ledger.rollback_to(checkpoint)?;
                warn!(collab = %address, %caller, error = %err, "Call reverted");
                Err(err)
            }
        }
    }

    fn dispatch_collab<T>(
        &mut self,
        address: Address,
        index: usize,
        caller: Address,
        value: TokenAmount,
        op: impl FnOnce(&mut Agreement, &mut Env<'_>) -> Result<T>,
    ) -> Result<(T, Vec<CollabEvent>)> {
        let Chain {
            clock,
            ledger,
            agreements,
            factories,
            registry,
            ..
        } = &mut *self;

        let agreement = agreements
            .get_mut(index)
            .ok_or(CollabError::UnknownContract { address })?;
        if value > 0 {
            ledger.transfer_native(&caller, &address, value)?;
        }

        let fees = match registry.get(&agreement.fee_store()) {
            Some(Deployed::Factory(i)) => factories.get(*i).map(|f| f as &dyn FeeSchedule),
            _ => None,
        };
        let mut env = Env {
            caller,
            value,
            now: clock.now(),
            assets: ledger,
            fees,
            events: Vec::new(),
        };
        let output = op(agreement, &mut env)?;
        Ok((output, env.events))
    }

    fn execute_factory<T>(
        &mut self,
        address: Address,
        caller: Address,
        op: impl FnOnce(&mut CollabFactory, &mut FactoryEnv<'_>) -> Result<T>,
    ) -> Result<T> {
        let index = match self.registry.get(&address) {
            Some(Deployed::Factory(index)) => *index,
            _ => return Err(CollabError::UnknownContract { address }),
        };

        let Chain {
            agreements,
            factories,
            registry,
            ..
        } = &mut *self;
        let factory = factories
            .get_mut(index)
            .ok_or(CollabError::UnknownContract { address })?;
        let mut host = Deployments {
            agreements,
            registry,
        };
        let mut env = FactoryEnv::new(caller, &mut host);

        match op(factory, &mut env) {
            Ok(output) => {
                let events = std::mem::take(&mut env.events);
                self.append_logs(address, events.into_iter().map(Event::from));
                Ok(output)
            }
            Err(err) => {
                warn!(factory = %address, %caller, error = %err, "Call reverted");
                Err(err)
            }
        }
    }

    fn append_logs(&mut self, emitter: Address, events: impl Iterator<Item = Event>) {
        let block_time = self.clock.now();
        self.logs.extend(events.map(|event| LogRecord {
            emitter,
            block_time,
            event,
        }));
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

/// Agreement arena as seen by a deploying factory
struct Deployments<'a> {
    agreements: &'a mut Vec<Agreement>,
    registry: &'a mut HashMap<Address, Deployed>,
}

impl AgreementHost for Deployments<'_> {
    fn is_deployed(&self, address: &Address) -> bool {
        self.registry.contains_key(address)
    }

    fn install(&mut self, agreement: Agreement) {
        self.registry
            .insert(agreement.address(), Deployed::Agreement(self.agreements.len()));
        self.agreements.push(agreement);
    }
}

/// A pending call into an agreement
pub struct CollabCall<'c> {
    chain: &'c mut Chain,
    address: Address,
    caller: Address,
}

impl CollabCall<'_> {
    /// Send the call from `caller`
    pub fn from(mut self, caller: Address) -> Self {
        self.caller = caller;
        self
    }

    pub fn init(self, funder: Address, doer: Address, fee_store: Address) -> Result<()> {
        self.chain
            .execute_collab(self.address, self.caller, 0, |agreement, _| {
                agreement.init(funder, doer, fee_store)
            })
    }

    pub fn create_new_gig(self, data: &[u8], signatures: &[u8]) -> Result<u64> {
        self.chain
            .execute_collab(self.address, self.caller, 0, |agreement, env| {
                agreement.create_new_gig(env, data, signatures)
            })
    }

    pub fn start_new_gig(self, data: &[u8], signatures: &[u8]) -> Result<u64> {
        self.chain
            .execute_collab(self.address, self.caller, 0, |agreement, env| {
                agreement.start_new_gig(env, data, signatures)
            })
    }

    pub fn start_gig(self, gig_id: u64) -> Result<()> {
        self.chain
            .execute_collab(self.address, self.caller, 0, |agreement, env| {
                agreement.start_gig(env, gig_id)
            })
    }

    pub fn cancel_gig(self, gig_id: u64) -> Result<()> {
        self.chain
            .execute_collab(self.address, self.caller, 0, |agreement, env| {
                agreement.cancel_gig(env, gig_id)
            })
    }

    /// Lock or start the countdown, paying `payment` in native currency
    pub fn lock_gig(self, gig_id: u64, payment: TokenAmount) -> Result<()> {
        self.chain
            .execute_collab(self.address, self.caller, payment, |agreement, env| {
                agreement.lock_gig(env, gig_id)
            })
    }

    pub fn complete_gig(self, data: &[u8], signatures: &[u8]) -> Result<()> {
        self.chain
            .execute_collab(self.address, self.caller, 0, |agreement, env| {
                agreement.complete_gig(env, data, signatures)
            })
    }

    pub fn update_gig_hash(self, data: &[u8], signatures: &[u8]) -> Result<()> {
        self.chain
            .execute_collab(self.address, self.caller, 0, |agreement, env| {
                agreement.update_gig_hash(env, data, signatures)
            })
    }

    pub fn update_gig_resolver(self, data: &[u8], signatures: &[u8]) -> Result<()> {
        self.chain
            .execute_collab(self.address, self.caller, 0, |agreement, env| {
                agreement.update_gig_resolver(env, data, signatures)
            })
    }

    pub fn update_third_party(self, gig_id: u64, third_party: Address) -> Result<()> {
        self.chain
            .execute_collab(self.address, self.caller, 0, |agreement, env| {
                agreement.update_third_party(env, gig_id, third_party)
            })
    }
}

/// A pending call into a factory
pub struct FactoryCall<'c> {
    chain: &'c mut Chain,
    address: Address,
    caller: Address,
}

impl FactoryCall<'_> {
    /// Send the call from `caller`
    pub fn from(mut self, caller: Address) -> Self {
        self.caller = caller;
        self
    }

    pub fn create(self, funder: Address, doer: Address) -> Result<Address> {
        self.chain
            .execute_factory(self.address, self.caller, |factory, env| {
                factory.create(env, funder, doer)
            })
    }

    pub fn create_deterministic(self, funder: Address, doer: Address, salt: Bytes32) -> Result<Address> {
        self.chain
            .execute_factory(self.address, self.caller, |factory, env| {
                factory.create_deterministic(env, funder, doer, &salt)
            })
    }

    pub fn update_flat_fee(self, fee: TokenAmount, reference: Bytes32) -> Result<()> {
        self.chain
            .execute_factory(self.address, self.caller, |factory, env| {
                factory.update_flat_fee(env, fee, reference);
                Ok(())
            })
    }
}
