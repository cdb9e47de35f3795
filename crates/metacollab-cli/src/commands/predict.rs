//! Deterministic clone address prediction

use anyhow::Context;
use metacollab_core::predict_deterministic_address;
use metacollab_types::{Address, Bytes32};

/// CREATE2 address a factory deploys a clone of `implementation` to for `salt`
pub fn predict(factory: &str, implementation: &str, salt: &str) -> anyhow::Result<Address> {
    let factory = Address::parse(factory).context("invalid factory address")?;
    let implementation = Address::parse(implementation).context("invalid implementation address")?;
    let salt = Bytes32::parse(salt).context("salt must be 32 bytes of hex")?;
    Ok(predict_deterministic_address(&implementation, &salt, &factory))
}

pub fn run(factory: &str, implementation: &str, salt: &str) -> anyhow::Result<()> {
    println!("{}", predict(factory, implementation, salt)?);
    Ok(())
}
