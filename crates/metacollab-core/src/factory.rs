//! MetaCollab Factory - Clone deployment and resolver fee schedule
//!
//! The factory holds one agreement template and deploys minimal clones of it,
//! either at the next CREATE address or at a salt-determined CREATE2 address.
//! Every clone is initialized in the same step it is deployed, with the
//! factory as its fee store.

use std::collections::HashMap;

use metacollab_types::{Address, Bytes32, FactoryEvent, TokenAmount};
use tracing::info;

use crate::agreement::Agreement;
use crate::clones::{create_address, predict_deterministic_address, CONTRACT_START_NONCE};
use crate::error::{CollabError, Result};

/// Source of resolver flat fees
pub trait FeeSchedule {
    /// Flat fee `resolver` charges to lock a gig; zero if never set
    fn flat_fee(&self, resolver: &Address) -> TokenAmount;
}

/// Where deployed agreements live
pub trait AgreementHost {
    /// Whether any contract already occupies `address`
    fn is_deployed(&self, address: &Address) -> bool;

    fn install(&mut self, agreement: Agreement);
}

/// Execution context of one call into a factory
pub struct FactoryEnv<'a> {
    pub caller: Address,
    pub host: &'a mut dyn AgreementHost,
    pub events: Vec<FactoryEvent>,
}

impl<'a> FactoryEnv<'a> {
    pub fn new(caller: Address, host: &'a mut dyn AgreementHost) -> Self {
        Self {
            caller,
            host,
            events: Vec::new(),
        }
    }
}

/// Agreement factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollabFactory {
    address: Address,
    implementation: Address,
    /// CREATE nonce; bumped by every deployment, deterministic or not
    nonce: u64,
    collabs: Vec<Address>,
    flat_fees: HashMap<Address, TokenAmount>,
}

impl CollabFactory {
    pub fn new(address: Address, implementation: Address) -> Result<Self> {
        if implementation.is_zero() {
            return Err(CollabError::InvalidImplementation);
        }
        Ok(Self {
            address,
            implementation,
            nonce: CONTRACT_START_NONCE,
            collabs: Vec::new(),
            flat_fees: HashMap::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn implementation(&self) -> Address {
        self.implementation
    }

    pub fn collab_count(&self) -> u64 {
        self.collabs.len() as u64
    }

    /// Address of the agreement deployed at `index`
    pub fn collab_address(&self, index: u64) -> Option<Address> {
        usize::try_from(index).ok().and_then(|i| self.collabs.get(i)).copied()
    }

    pub fn flat_fees(&self, resolver: &Address) -> TokenAmount {
        self.flat_fees.get(resolver).copied().unwrap_or(0)
    }

    /// Address the next non-deterministic clone will land at
    pub fn next_collab_address(&self) -> Address {
        create_address(&self.address, self.nonce)
    }

    /// Address a clone created with `salt` lands at
    pub fn predict_deterministic_address(&self, salt: &Bytes32) -> Address {
        predict_deterministic_address(&self.implementation, salt, &self.address)
    }

    /// Deploy and initialize a clone at the next CREATE address
    pub fn create(&mut self, env: &mut FactoryEnv<'_>, funder: Address, doer: Address) -> Result<Address> {
        let address = self.next_collab_address();
        self.deploy(env, address, funder, doer)
    }

    /// Deploy and initialize a clone at the CREATE2 address for `salt`
    pub fn create_deterministic(
        &mut self,
        env: &mut FactoryEnv<'_>,
        funder: Address,
        doer: Address,
        salt: &Bytes32,
    ) -> Result<Address> {
        let address = self.predict_deterministic_address(salt);
        self.deploy(env, address, funder, doer)
    }

    /// Set the caller's flat resolver fee
    ///
    /// Gigs snapshot the fee when created, so existing gigs are unaffected.
    pub fn update_flat_fee(&mut self, env: &mut FactoryEnv<'_>, fee: TokenAmount, reference: Bytes32) {
        let resolver = env.caller;
        self.flat_fees.insert(resolver, fee);
        env.events.push(FactoryEvent::UpdateFlatFee {
            resolver,
            fee,
            reference,
        });
        info!(factory = %self.address, %resolver, fee, "Flat fee updated");
    }

    fn deploy(&mut self, env: &mut FactoryEnv<'_>, address: Address, funder: Address, doer: Address) -> Result<Address> {
        if env.host.is_deployed(&address) {
            return Err(CollabError::CloneFailed);
        }

        let mut agreement = Agreement::clone_of(address, self.implementation);
        agreement.init(funder, doer, self.address)?;
        env.host.install(agreement);

        self.nonce += 1;
        let index = self.collab_count();
        self.collabs.push(address);
        env.events.push(FactoryEvent::LogNewCollab {
            index,
            collab: address,
        });

        info!(factory = %self.address, index, collab = %address, "Agreement deployed");
        Ok(address)
    }
}

impl FeeSchedule for CollabFactory {
    fn flat_fee(&self, resolver: &Address) -> TokenAmount {
        self.flat_fees(resolver)
    }
}
