//! Wallet address derivation

use metacollab_crypto::LocalWallet;
use metacollab_types::Address;

/// Address of the deterministic wallet behind `label`
pub fn label_address(label: &str) -> anyhow::Result<Address> {
    Ok(LocalWallet::from_label(label)?.address())
}

pub fn run(label: &str) -> anyhow::Result<()> {
    println!("{}", label_address(label)?);
    Ok(())
}
