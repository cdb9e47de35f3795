//! Demo command - a full agreement lifecycle on an in-memory chain
//!
//! Deploys a token, the agreement template and a factory, then drives two
//! gigs: one settled by co-signed completion, one escalated to the resolver.

use metacollab_core::{Chain, GigCompletion, GigProposal};
use metacollab_crypto::{multisign, LocalWallet};
use metacollab_ledger::{FungibleToken, NativeCurrency};
use metacollab_types::{Address, Bytes32, GigStatus, LogRecord, TokenAmount};
use tracing::info;

use crate::config::CliConfig;
use crate::display;

/// Everything the demo leaves behind
pub struct DemoOutcome {
    pub chain: Chain,
    pub token: Address,
    pub factory: Address,
    pub collab: Address,
    pub funder: Address,
    pub doer: Address,
    pub resolver: Address,
}

impl DemoOutcome {
    pub fn logs(&self) -> &[LogRecord] {
        self.chain.logs()
    }
}

/// Run the lifecycle without printing anything
pub fn execute(config: &CliConfig) -> anyhow::Result<DemoOutcome> {
    let demo = &config.demo;
    let funder = LocalWallet::from_label(&demo.funder)?;
    let doer = LocalWallet::from_label(&demo.doer)?;
    let resolver = LocalWallet::from_label(&demo.resolver)?;
    let parties = [&funder, &doer];

    let mut chain = Chain::new(config.chain.clone());
    let deployer = funder.address();
    let token = chain.deploy_token(&deployer, &demo.token_symbol)?;
    let template = chain.deploy_template(&deployer)?;
    let factory = chain.deploy_factory(&deployer, template)?;

    chain
        .factory(factory)
        .from(resolver.address())
        .update_flat_fee(demo.resolver_fee(), Bytes32::ZERO)?;
    let collab = chain
        .factory(factory)
        .from(funder.address())
        .create(funder.address(), doer.address())?;

    let budget = demo.amount() * 2;
    chain.ledger_mut().mint(&token, &funder.address(), budget)?;
    chain
        .ledger_mut()
        .approve(&token, &funder.address(), &collab, budget)?;
    chain
        .ledger_mut()
        .fund_native(&funder.address(), demo.resolver_fee())?;

    let proposal = |nonce: u64, resolver: Address| GigProposal {
        reference: demo.reference.as_bytes().to_vec(),
        tokens: vec![token],
        amounts: vec![demo.amount()],
        durations: demo.durations(),
        resolver,
        fee_reward_ratio: demo.ratio(),
        collab,
        nonce,
    };

    // Settled gig: created and funded in one step, then completed by ratio
    let data = proposal(0, Address::ZERO).encode();
    let sigs = multisign(&data, &parties)?;
    let settled = chain
        .collab(collab)
        .from(funder.address())
        .start_new_gig(&data, &sigs)?;

    let data = GigCompletion {
        collab,
        gig_id: settled,
        ratio: demo.ratio(),
    }
    .encode();
    let sigs = multisign(&data, &parties)?;
    chain
        .collab(collab)
        .from(doer.address())
        .complete_gig(&data, &sigs)?;
    info!(%collab, gig_id = settled, "Demo gig settled");

    // Disputed gig: created, started, countdown, then locked with the fee
    let data = proposal(1, resolver.address()).encode();
    let sigs = multisign(&data, &parties)?;
    let disputed = chain
        .collab(collab)
        .from(funder.address())
        .create_new_gig(&data, &sigs)?;
    chain.collab(collab).from(funder.address()).start_gig(disputed)?;
    chain
        .collab(collab)
        .from(doer.address())
        .lock_gig(disputed, 0)?;
    chain.advance(demo.countdown_period);
    chain
        .collab(collab)
        .from(funder.address())
        .lock_gig(disputed, demo.resolver_fee())?;
    info!(%collab, gig_id = disputed, "Demo gig locked for dispute");

    Ok(DemoOutcome {
        chain,
        token,
        factory,
        collab,
        funder: funder.address(),
        doer: doer.address(),
        resolver: resolver.address(),
    })
}

/// Run the lifecycle and print a summary followed by the event log
pub fn run(config: &CliConfig, json_only: bool) -> anyhow::Result<()> {
    let outcome = execute(config)?;
    let log = serde_json::to_string_pretty(outcome.logs())?;

    if json_only {
        println!("{log}");
        return Ok(());
    }

    let chain = &outcome.chain;
    display::section("Deployment");
    display::kv("factory", &outcome.factory.to_string());
    display::kv("agreement", &outcome.collab.to_string());
    display::kv("token", &outcome.token.to_string());

    display::section("Gigs");
    let agreement = chain.agreement(&outcome.collab)?;
    for (gig_id, gig) in agreement.gigs().iter().enumerate() {
        let message = format!("gig {gig_id}: {}", status_label(gig.status));
        match gig.status {
            GigStatus::Done | GigStatus::Locked => display::success(&message),
            _ => display::info(&message),
        }
    }

    display::section("Balances");
    let balance = |account: &Address| -> anyhow::Result<TokenAmount> {
        Ok(chain.ledger().balance_of(&outcome.token, account)?)
    };
    display::kv("funder", &balance(&outcome.funder)?.to_string());
    display::kv("doer", &balance(&outcome.doer)?.to_string());
    display::kv("agreement", &balance(&outcome.collab)?.to_string());
    display::kv(
        "resolver (native)",
        &chain.ledger().native_balance(&outcome.resolver).to_string(),
    );

    display::section("Event log");
    println!("{log}");
    Ok(())
}

fn status_label(status: GigStatus) -> &'static str {
    match status {
        GigStatus::Init => "created",
        GigStatus::Active => "active",
        GigStatus::Countdown => "dispute countdown",
        GigStatus::Locked => "locked for dispute",
        GigStatus::Resolved => "resolved",
        GigStatus::Cancelled => "cancelled",
        GigStatus::Done => "completed",
    }
}
