//! MetaCollab Agreement - Funder/doer escrow with a per-gig state machine
//!
//! An agreement binds one funder and one doer. Both parties co-sign payloads
//! to create gigs and to settle them; the funder alone starts and cancels;
//! either party may escalate to the resolver named in the gig.
//!
//! ```text
//! Init      --start-->      Active
//! Init      --cancel-->     Cancelled
//! Active    --cancel-->     Cancelled   (inside the window or after expiry)
//! Active    --lock-->       Countdown
//! Active    --complete-->   Done
//! Countdown --complete-->   Done
//! Countdown --lock + fee--> Locked      (after the countdown period)
//! ```
//!
//! # Key Principle
//!
//! Every fallible step runs before agreement state is written. A failed
//! operation therefore leaves the agreement untouched; token movements are
//! undone by the chain's ledger checkpoint.

use metacollab_crypto::SignatureSet;
use metacollab_ledger::{Assets, FungibleToken as _, NativeCurrency as _};
use metacollab_types::{
    is_valid_ratio, split_by_ratio, Address, CollabEvent, Gig, GigStatus, Timestamp, TokenAmount,
    DOER_SLOT, FUNDER_SLOT,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CollabError, Result};
use crate::factory::FeeSchedule;
use crate::payload::{GigCompletion, GigHashUpdate, GigProposal, GigResolverUpdate};

/// Execution context of one call into an agreement
pub struct Env<'a> {
    /// Account that sent the call
    pub caller: Address,
    /// Native currency sent with the call, already credited to the agreement
    pub value: TokenAmount,
    /// Block timestamp
    pub now: Timestamp,
    pub assets: &'a mut dyn Assets,
    /// Fee schedule at the agreement's fee store, if one is deployed there
    pub fees: Option<&'a dyn FeeSchedule>,
    /// Events emitted so far; kept only if the call succeeds
    pub events: Vec<CollabEvent>,
}

impl<'a> Env<'a> {
    pub fn new(caller: Address, now: Timestamp, assets: &'a mut dyn Assets) -> Self {
        Self {
            caller,
            value: 0,
            now,
            assets,
            fees: None,
            events: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: TokenAmount) -> Self {
        self.value = value;
        self
    }

    pub fn with_fees(mut self, fees: &'a dyn FeeSchedule) -> Self {
        self.fees = Some(fees);
        self
    }

    fn emit(&mut self, event: CollabEvent) {
        self.events.push(event);
    }
}

/// One funder/doer agreement and the gigs it custodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    address: Address,
    /// Template this instance delegates to; `None` for the template itself
    implementation: Option<Address>,
    initialized: bool,
    funder: Address,
    doer: Address,
    fee_store: Address,
    gigs: Vec<Gig>,
}

impl Agreement {
    /// The shared template; it is sealed and can never be initialized
    pub fn template(address: Address) -> Self {
        Self {
            address,
            implementation: None,
            initialized: true,
            funder: Address::ZERO,
            doer: Address::ZERO,
            fee_store: Address::ZERO,
            gigs: Vec::new(),
        }
    }

    /// A fresh, uninitialized clone of `implementation`
    pub fn clone_of(address: Address, implementation: Address) -> Self {
        Self {
            address,
            implementation: Some(implementation),
            initialized: false,
            funder: Address::ZERO,
            doer: Address::ZERO,
            fee_store: Address::ZERO,
            gigs: Vec::new(),
        }
    }

    /// Bind the parties and fee store; runs once per instance
    pub fn init(&mut self, funder: Address, doer: Address, fee_store: Address) -> Result<()> {
        if self.initialized {
            return Err(CollabError::AlreadyInitialized);
        }
        self.funder = funder;
        self.doer = doer;
        self.fee_store = fee_store;
        self.initialized = true;
        info!(collab = %self.address, %funder, %doer, "Agreement initialized");
        Ok(())
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn implementation(&self) -> Option<Address> {
        self.implementation
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn funder(&self) -> Address {
        self.funder
    }

    pub fn doer(&self) -> Address {
        self.doer
    }

    pub fn fee_store(&self) -> Address {
        self.fee_store
    }

    /// Number of gigs ever created; also the next gig index
    pub fn gig_count(&self) -> u64 {
        self.gigs.len() as u64
    }

    pub fn gig(&self, gig_id: u64) -> Result<&Gig> {
        usize::try_from(gig_id)
            .ok()
            .and_then(|i| self.gigs.get(i))
            .ok_or(CollabError::InvalidGig)
    }

    pub fn gigs(&self) -> &[Gig] {
        &self.gigs
    }

    // ========================================================================
    // Co-signed operations
    // ========================================================================

    /// Record a new gig in `Init` without moving funds
    pub fn create_new_gig(&mut self, env: &mut Env<'_>, data: &[u8], signatures: &[u8]) -> Result<u64> {
        let proposal = self.accept_proposal(data, signatures)?;
        let fee = self.resolver_fee(env, &proposal.resolver)?;

        let gig_id = self.gig_count();
        self.gigs.push(proposal.to_gig(GigStatus::Init, env.now, fee));
        env.emit(CollabEvent::GigInit {
            gig_id,
            reference: proposal.reference,
        });

        info!(collab = %self.address, gig_id, "Gig created");
        Ok(gig_id)
    }

    /// Record a new gig and custody its funds in one step
    pub fn start_new_gig(&mut self, env: &mut Env<'_>, data: &[u8], signatures: &[u8]) -> Result<u64> {
        let proposal = self.accept_proposal(data, signatures)?;
        let fee = self.resolver_fee(env, &proposal.resolver)?;
        let gig = proposal.to_gig(GigStatus::Active, env.now, fee);

        self.pull_funds(env, &gig)?;

        let gig_id = self.gig_count();
        self.gigs.push(gig);
        env.emit(CollabEvent::GigInit {
            gig_id,
            reference: proposal.reference,
        });
        env.emit(CollabEvent::GigActive { gig_id });

        info!(collab = %self.address, gig_id, "Gig created and started");
        Ok(gig_id)
    }

    /// Split custody between funder and doer by an agreed ratio
    pub fn complete_gig(&mut self, env: &mut Env<'_>, data: &[u8], signatures: &[u8]) -> Result<()> {
        let completion = GigCompletion::decode(data).map_err(|e| {
            debug!(collab = %self.address, error = %e, "Malformed completion payload");
            CollabError::InvalidData
        })?;
        self.verify_parties(data, signatures)?;
        if completion.collab != self.address {
            return Err(CollabError::InvalidData);
        }

        let gig_id = completion.gig_id;
        let gig = self.gig(gig_id)?;
        if !matches!(gig.status, GigStatus::Active | GigStatus::Countdown) {
            return Err(CollabError::InvalidGig);
        }
        if !is_valid_ratio(&completion.ratio) {
            return Err(CollabError::InvalidRatio);
        }

        let payouts = gig
            .holdings()
            .map(|(token, amount)| {
                split_by_ratio(amount, &completion.ratio)
                    .map(|(to_funder, to_doer)| (*token, to_funder, to_doer))
                    .ok_or(CollabError::InvalidRatio)
            })
            .collect::<Result<Vec<_>>>()?;

        for (token, to_funder, to_doer) in payouts {
            if to_funder > 0 {
                self.push_funds(env, &token, &self.funder, to_funder)?;
            }
            if to_doer > 0 {
                self.push_funds(env, &token, &self.doer, to_doer)?;
            }
        }

        self.gig_mut(gig_id)?.status = GigStatus::Done;
        env.emit(CollabEvent::GigDone {
            gig_id,
            ratio: completion.ratio,
        });

        info!(collab = %self.address, gig_id, ratio = ?completion.ratio, "Gig completed");
        Ok(())
    }

    /// Re-publish a gig's opaque reference
    pub fn update_gig_hash(&mut self, env: &mut Env<'_>, data: &[u8], signatures: &[u8]) -> Result<()> {
        let update = GigHashUpdate::decode(data).map_err(|e| {
            debug!(collab = %self.address, error = %e, "Malformed hash update payload");
            CollabError::InvalidData
        })?;
        self.verify_parties(data, signatures)?;
        if update.collab != self.address {
            return Err(CollabError::InvalidData);
        }
        if self.gig(update.gig_id)?.status == GigStatus::Locked {
            return Err(CollabError::InvalidGig);
        }

        env.emit(CollabEvent::GigHashUpdated {
            gig_id: update.gig_id,
            reference: update.reference,
        });
        info!(collab = %self.address, gig_id = update.gig_id, "Gig reference updated");
        Ok(())
    }

    /// Name a resolver for a gig that has none, re-snapshotting the fee
    ///
    /// Only a zero resolver can be replaced, and only before any dispute
    /// countdown, so a non-zero resolver and its fee stay fixed.
    pub fn update_gig_resolver(&mut self, env: &mut Env<'_>, data: &[u8], signatures: &[u8]) -> Result<()> {
        let update = GigResolverUpdate::decode(data).map_err(|e| {
            debug!(collab = %self.address, error = %e, "Malformed resolver update payload");
            CollabError::InvalidData
        })?;
        self.verify_parties(data, signatures)?;
        if update.collab != self.address {
            return Err(CollabError::InvalidData);
        }

        let gig = self.gig(update.gig_id)?;
        if !matches!(gig.status, GigStatus::Init | GigStatus::Active) {
            return Err(CollabError::InvalidGig);
        }
        if gig.has_resolver() || update.resolver.is_zero() {
            return Err(CollabError::InvalidResolver);
        }
        if !is_valid_ratio(&update.fee_reward_ratio) {
            return Err(CollabError::InvalidRatio);
        }
        let fee = self.resolver_fee(env, &update.resolver)?;

        let gig = self.gig_mut(update.gig_id)?;
        gig.resolver = update.resolver;
        gig.flat_resolver_fee = fee;
        gig.fee_reward_ratio = update.fee_reward_ratio;
        env.emit(CollabEvent::GigResolverUpdated {
            gig_id: update.gig_id,
            resolver: update.resolver,
        });

        info!(collab = %self.address, gig_id = update.gig_id, resolver = %update.resolver, "Gig resolver assigned");
        Ok(())
    }

    // ========================================================================
    // Single-party operations
    // ========================================================================

    /// Custody the funds of a gig in `Init`
    pub fn start_gig(&mut self, env: &mut Env<'_>, gig_id: u64) -> Result<()> {
        self.only_funder(env)?;
        let gig = self.gig(gig_id)?;
        if gig.status != GigStatus::Init {
            return Err(CollabError::InvalidGig);
        }

        self.pull_funds(env, gig)?;

        self.gig_mut(gig_id)?.status = GigStatus::Active;
        env.emit(CollabEvent::GigActive { gig_id });

        info!(collab = %self.address, gig_id, "Gig started");
        Ok(())
    }

    /// Cancel a gig, refunding the funder if funds were custodied
    pub fn cancel_gig(&mut self, env: &mut Env<'_>, gig_id: u64) -> Result<()> {
        self.only_funder(env)?;
        let gig = self.gig(gig_id)?;

        match gig.status {
            GigStatus::Init => {}
            GigStatus::Active => {
                if !gig.cancellable_at(env.now) {
                    debug!(
                        collab = %self.address,
                        gig_id,
                        now = env.now,
                        deadline = gig.cancellation_deadline(),
                        expires_at = gig.expires_at(),
                        "Cancellation outside of permitted windows"
                    );
                    return Err(CollabError::InvalidTimestamp);
                }
                let refunds: Vec<(Address, TokenAmount)> =
                    gig.holdings().map(|(token, amount)| (*token, amount)).collect();
                for (token, amount) in refunds {
                    self.push_funds(env, &token, &self.funder, amount)?;
                }
            }
            _ => return Err(CollabError::InvalidGig),
        }

        self.gig_mut(gig_id)?.status = GigStatus::Cancelled;
        env.emit(CollabEvent::GigCancelled { gig_id });

        info!(collab = %self.address, gig_id, "Gig cancelled");
        Ok(())
    }

    /// Escalate a gig towards its resolver
    ///
    /// The first call from `Active` starts the countdown. Once the countdown
    /// period has elapsed, a second call paying exactly the resolver's flat fee
    /// locks the gig and forwards the fee.
    pub fn lock_gig(&mut self, env: &mut Env<'_>, gig_id: u64) -> Result<()> {
        self.only_party(env)?;
        let gig = self.gig(gig_id)?;
        if !gig.has_resolver() {
            return Err(CollabError::InvalidResolver);
        }

        match gig.status {
            GigStatus::Active => {
                if env.value != 0 {
                    return Err(CollabError::InvalidValue);
                }
                let gig = self.gig_mut(gig_id)?;
                gig.countdown_timestamp = env.now;
                gig.status = GigStatus::Countdown;
                env.emit(CollabEvent::GigLockCountdownStarted { gig_id });
                info!(collab = %self.address, gig_id, "Dispute countdown started");
            }
            GigStatus::Countdown => {
                if env.now < gig.countdown_ends_at() {
                    return Err(CollabError::StillCounting);
                }
                if env.value != gig.flat_resolver_fee {
                    debug!(
                        collab = %self.address,
                        gig_id,
                        paid = env.value,
                        fee = gig.flat_resolver_fee,
                        "Resolver fee mismatch"
                    );
                    return Err(CollabError::InvalidValue);
                }
                let resolver = gig.resolver;
                if env.value > 0 {
                    env.assets.transfer_native(&self.address, &resolver, env.value)?;
                }
                self.gig_mut(gig_id)?.status = GigStatus::Locked;
                env.emit(CollabEvent::GigLockedForDispute { gig_id });
                info!(collab = %self.address, gig_id, %resolver, "Gig locked for dispute");
            }
            _ => return Err(CollabError::InvalidGig),
        }
        Ok(())
    }

    /// Record the caller's third-party identity on a gig
    pub fn update_third_party(&mut self, env: &mut Env<'_>, gig_id: u64, third_party: Address) -> Result<()> {
        self.only_party(env)?;
        let gig = self.gig(gig_id)?;
        if third_party.is_zero() {
            return Err(CollabError::InvalidThirdParty);
        }
        if gig.status == GigStatus::Locked {
            return Err(CollabError::InvalidGig);
        }

        let slot = if env.caller == self.funder {
            FUNDER_SLOT
        } else {
            DOER_SLOT
        };
        self.gig_mut(gig_id)?.third_parties[slot] = third_party;
        env.emit(CollabEvent::GigThirdPartyUpdated { gig_id });

        info!(collab = %self.address, gig_id, slot, %third_party, "Third party updated");
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Decode, validate and authenticate gig creation terms
    ///
    /// Field checks run before signatures, so a stale or foreign payload is
    /// `InvalidData` whoever signed it.
    fn accept_proposal(&self, data: &[u8], signatures: &[u8]) -> Result<GigProposal> {
        let proposal = GigProposal::decode(data).map_err(|e| {
            debug!(collab = %self.address, error = %e, "Malformed gig proposal");
            CollabError::InvalidData
        })?;

        if proposal.tokens.is_empty() || proposal.tokens.len() != proposal.amounts.len() {
            debug!(collab = %self.address, "Token and amount lists do not pair up");
            return Err(CollabError::InvalidData);
        }
        if !is_valid_ratio(&proposal.fee_reward_ratio) {
            debug!(collab = %self.address, "Zero fee/reward ratio");
            return Err(CollabError::InvalidData);
        }
        if proposal.collab != self.address {
            debug!(collab = %self.address, bound_to = %proposal.collab, "Proposal bound to another agreement");
            return Err(CollabError::InvalidData);
        }
        if proposal.nonce != self.gig_count() {
            debug!(collab = %self.address, nonce = proposal.nonce, expected = self.gig_count(), "Stale or future nonce");
            return Err(CollabError::InvalidData);
        }
        self.verify_parties(data, signatures)?;
        Ok(proposal)
    }

    /// Signatures must come from the funder then the doer
    fn verify_parties(&self, data: &[u8], signatures: &[u8]) -> Result<()> {
        SignatureSet::parse(signatures)
            .and_then(|set| set.verify(data, &[self.funder, self.doer]))
            .map_err(|e| {
                debug!(collab = %self.address, error = %e, "Signature check failed");
                CollabError::InvalidSignatures
            })
    }

    fn resolver_fee(&self, env: &Env<'_>, resolver: &Address) -> Result<TokenAmount> {
        if resolver.is_zero() {
            return Ok(0);
        }
        let fees = env.fees.ok_or(CollabError::UnknownContract {
            address: self.fee_store,
        })?;
        Ok(fees.flat_fee(resolver))
    }

    fn only_funder(&self, env: &Env<'_>) -> Result<()> {
        if env.caller != self.funder {
            return Err(CollabError::OnlyFunder);
        }
        Ok(())
    }

    fn only_party(&self, env: &Env<'_>) -> Result<()> {
        if env.caller != self.funder && env.caller != self.doer {
            return Err(CollabError::OnlyParty);
        }
        Ok(())
    }

    fn gig_mut(&mut self, gig_id: u64) -> Result<&mut Gig> {
        usize::try_from(gig_id)
            .ok()
            .and_then(|i| self.gigs.get_mut(i))
            .ok_or(CollabError::InvalidGig)
    }

    /// Move every holding of `gig` from the funder into custody
    fn pull_funds(&self, env: &mut Env<'_>, gig: &Gig) -> Result<()> {
        for (token, amount) in gig.holdings() {
            let moved = env
                .assets
                .transfer_from(token, &self.address, &self.funder, &self.address, amount)?;
            if !moved {
                return Err(CollabError::TransferFailed { token: *token });
            }
        }
        Ok(())
    }

    /// Pay `amount` of `token` out of custody
    fn push_funds(&self, env: &mut Env<'_>, token: &Address, to: &Address, amount: TokenAmount) -> Result<()> {
        let moved = env.assets.transfer(token, &self.address, to, amount)?;
        if !moved {
            return Err(CollabError::TransferFailed { token: *token });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metacollab_crypto::{multisign, LocalWallet};
    use metacollab_ledger::{FungibleToken, Ledger, NativeCurrency};

    struct Fees(TokenAmount);

    impl FeeSchedule for Fees {
        fn flat_fee(&self, _resolver: &Address) -> TokenAmount {
            self.0
        }
    }

    struct Fixture {
        funder: LocalWallet,
        doer: LocalWallet,
        token: Address,
        ledger: Ledger,
        agreement: Agreement,
    }

    fn fixture() -> Fixture {
        let funder = LocalWallet::from_label("unit funder").unwrap();
        let doer = LocalWallet::from_label("unit doer").unwrap();
        let token = Address::new([0xee; 20]);
        let collab = Address::new([0xcc; 20]);

        let mut ledger = Ledger::new();
        ledger.register_token(token, "TKN").unwrap();
        ledger.mint(&token, &funder.address(), 100).unwrap();
        ledger.approve(&token, &funder.address(), &collab, 100).unwrap();

        let mut agreement = Agreement::clone_of(collab, Address::new([0x01; 20]));
        agreement
            .init(funder.address(), doer.address(), Address::new([0xfa; 20]))
            .unwrap();

        Fixture {
            funder,
            doer,
            token,
            ledger,
            agreement,
        }
    }

    fn proposal(f: &Fixture, resolver: Address) -> GigProposal {
        GigProposal {
            reference: vec![0u8; 32],
            tokens: vec![f.token],
            amounts: vec![10],
            durations: [10, 10, 20],
            resolver,
            fee_reward_ratio: [0, 1],
            collab: f.agreement.address(),
            nonce: f.agreement.gig_count(),
        }
    }

    fn cosign(f: &Fixture, data: &[u8]) -> Vec<u8> {
        multisign(data, &[&f.funder, &f.doer]).unwrap()
    }

    #[test]
    fn test_second_init_rejected() {
        let mut f = fixture();
        assert_eq!(
            f.agreement.init(Address::ZERO, Address::ZERO, Address::ZERO),
            Err(CollabError::AlreadyInitialized)
        );
        assert_eq!(
            Agreement::template(Address::new([5; 20])).init(Address::ZERO, Address::ZERO, Address::ZERO),
            Err(CollabError::AlreadyInitialized)
        );
    }

    #[test]
    fn test_create_snapshots_fee() {
        let mut f = fixture();
        let resolver = Address::new([0x33; 20]);
        let data = proposal(&f, resolver).encode();
        let sigs = cosign(&f, &data);
        let fees = Fees(10);

        let mut env = Env::new(f.funder.address(), 1_000, &mut f.ledger).with_fees(&fees);
        let gig_id = f.agreement.create_new_gig(&mut env, &data, &sigs).unwrap();
        assert_eq!(env.events.len(), 1);

        let gig = f.agreement.gig(gig_id).unwrap();
        assert_eq!(gig.status, GigStatus::Init);
        assert_eq!(gig.flat_resolver_fee, 10);
        assert_eq!(gig.start_timestamp, 1_000);
    }

    #[test]
    fn test_resolver_without_fee_store_rejected() {
        let mut f = fixture();
        let data = proposal(&f, Address::new([0x33; 20])).encode();
        let sigs = cosign(&f, &data);

        let mut env = Env::new(f.funder.address(), 1_000, &mut f.ledger);
        let result = f.agreement.create_new_gig(&mut env, &data, &sigs);
        assert!(matches!(result, Err(CollabError::UnknownContract { .. })));
        assert_eq!(f.agreement.gig_count(), 0);
    }

    #[test]
    fn test_malformed_payload_is_invalid_data() {
        let mut f = fixture();
        let mut env = Env::new(f.funder.address(), 1_000, &mut f.ledger);
        let result = f.agreement.create_new_gig(&mut env, &[1, 2, 3], &[]);
        assert_eq!(result, Err(CollabError::InvalidData));
    }

    #[test]
    fn test_start_new_gig_custodies_funds() {
        let mut f = fixture();
        let data = proposal(&f, Address::ZERO).encode();
        let sigs = cosign(&f, &data);

        let mut env = Env::new(f.doer.address(), 1_000, &mut f.ledger);
        f.agreement.start_new_gig(&mut env, &data, &sigs).unwrap();
        assert_eq!(env.events.len(), 2);

        let collab = f.agreement.address();
        assert_eq!(f.ledger.balance_of(&f.token, &collab).unwrap(), 10);
        assert_eq!(f.ledger.balance_of(&f.token, &f.funder.address()).unwrap(), 90);
    }

    #[test]
    fn test_countdown_then_lock_pays_resolver() {
        let mut f = fixture();
        let resolver = Address::new([0x33; 20]);
        let fees = Fees(10);
        let data = proposal(&f, resolver).encode();
        let sigs = cosign(&f, &data);
        let collab = f.agreement.address();

        let mut env = Env::new(f.funder.address(), 1_000, &mut f.ledger).with_fees(&fees);
        f.agreement.start_new_gig(&mut env, &data, &sigs).unwrap();

        let mut env = Env::new(f.doer.address(), 1_001, &mut f.ledger);
        f.agreement.lock_gig(&mut env, 0).unwrap();
        assert_eq!(f.agreement.gig(0).unwrap().countdown_timestamp, 1_001);

        let mut env = Env::new(f.doer.address(), 1_005, &mut f.ledger);
        assert_eq!(f.agreement.lock_gig(&mut env, 0), Err(CollabError::StillCounting));

        // The chain credits call value to the agreement before dispatch
        f.ledger.fund_native(&collab, 10).unwrap();
        let mut env = Env::new(f.doer.address(), 1_011, &mut f.ledger).with_value(10);
        f.agreement.lock_gig(&mut env, 0).unwrap();

        assert_eq!(f.agreement.gig(0).unwrap().status, GigStatus::Locked);
        assert_eq!(f.ledger.native_balance(&resolver), 10);
        assert_eq!(f.ledger.native_balance(&collab), 0);
    }

    #[test]
    fn test_payment_while_starting_countdown_rejected() {
        let mut f = fixture();
        let fees = Fees(10);
        let data = proposal(&f, Address::new([0x33; 20])).encode();
        let sigs = cosign(&f, &data);

        let mut env = Env::new(f.funder.address(), 1_000, &mut f.ledger).with_fees(&fees);
        f.agreement.start_new_gig(&mut env, &data, &sigs).unwrap();

        let mut env = Env::new(f.funder.address(), 1_000, &mut f.ledger).with_value(1);
        assert_eq!(f.agreement.lock_gig(&mut env, 0), Err(CollabError::InvalidValue));
        assert_eq!(f.agreement.gig(0).unwrap().status, GigStatus::Active);
    }

    #[test]
    fn test_complete_splits_with_remainder_to_doer() {
        let mut f = fixture();
        let mut terms = proposal(&f, Address::ZERO);
        terms.amounts = vec![11];
        let data = terms.encode();
        let sigs = cosign(&f, &data);

        let mut env = Env::new(f.funder.address(), 1_000, &mut f.ledger);
        f.agreement.start_new_gig(&mut env, &data, &sigs).unwrap();

        let completion = GigCompletion {
            collab: f.agreement.address(),
            gig_id: 0,
            ratio: [1, 1],
        }
        .encode();
        let sigs = cosign(&f, &completion);
        let mut env = Env::new(f.doer.address(), 1_001, &mut f.ledger);
        f.agreement.complete_gig(&mut env, &completion, &sigs).unwrap();

        assert_eq!(f.ledger.balance_of(&f.token, &f.funder.address()).unwrap(), 89 + 5);
        assert_eq!(f.ledger.balance_of(&f.token, &f.doer.address()).unwrap(), 6);
        let gig = f.agreement.gig(0).unwrap();
        assert_eq!(gig.status, GigStatus::Done);
        assert_eq!(gig.fee_reward_ratio, [0, 1]);
    }

    #[test]
    fn test_unknown_gig_reads() {
        let f = fixture();
        assert_eq!(f.agreement.gig(0), Err(CollabError::InvalidGig));
        assert_eq!(f.agreement.gig(u64::MAX), Err(CollabError::InvalidGig));
    }
}
