//! Minimal-clone addressing
//!
//! Agreements are deployed as EIP-1167 minimal proxies of a shared template.
//! Their addresses follow the EVM rules, so a clone's address can be known
//! before it exists:
//!
//! - CREATE:  `keccak256(rlp([deployer, nonce]))[12..]`
//! - CREATE2: `keccak256(0xff ‖ deployer ‖ salt ‖ keccak256(init_code))[12..]`

use metacollab_crypto::{keccak256, keccak256_all};
use metacollab_types::{Address, Bytes32};

/// Creation code before the embedded implementation address
const CLONE_PREFIX: [u8; 20] = [
    0x3d, 0x60, 0x2d, 0x80, 0x60, 0x0a, 0x3d, 0x39, 0x81, 0xf3, 0x36, 0x3d, 0x3d, 0x37, 0x3d, 0x3d,
    0x3d, 0x36, 0x3d, 0x73,
];

/// Creation code after the embedded implementation address
const CLONE_SUFFIX: [u8; 15] = [
    0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d, 0x91, 0x60, 0x2b, 0x57, 0xfd, 0x5b, 0xf3,
];

/// Nonce a freshly deployed contract starts with
pub const CONTRACT_START_NONCE: u64 = 1;

/// EIP-1167 creation code for a clone of `implementation`
pub fn clone_init_code(implementation: &Address) -> Vec<u8> {
    let mut code = Vec::with_capacity(CLONE_PREFIX.len() + Address::LEN + CLONE_SUFFIX.len());
    code.extend_from_slice(&CLONE_PREFIX);
    code.extend_from_slice(implementation.as_bytes());
    code.extend_from_slice(&CLONE_SUFFIX);
    code
}

/// Address of the contract `deployer` creates with CREATE at `nonce`
pub fn create_address(deployer: &Address, nonce: u64) -> Address {
    let nonce_rlp = rlp_uint(nonce);
    let payload_len = 1 + Address::LEN + nonce_rlp.len();

    let mut stream = Vec::with_capacity(1 + payload_len);
    // Always a short list: at most 1 + 20 + 9 bytes
    stream.push(0xc0 + payload_len as u8);
    stream.push(0x80 + Address::LEN as u8);
    stream.extend_from_slice(deployer.as_bytes());
    stream.extend_from_slice(&nonce_rlp);

    Address::from_digest(&keccak256(&stream))
}

/// Address of the contract `deployer` creates with CREATE2
pub fn create2_address(deployer: &Address, salt: &Bytes32, init_code_hash: &[u8; 32]) -> Address {
    let digest = keccak256_all(&[&[0xff], deployer.as_bytes(), salt.as_bytes(), init_code_hash]);
    Address::from_digest(&digest)
}

/// Address a deterministic clone of `implementation` lands at
pub fn predict_deterministic_address(
    implementation: &Address,
    salt: &Bytes32,
    deployer: &Address,
) -> Address {
    let init_code_hash = keccak256(&clone_init_code(implementation));
    create2_address(deployer, salt, &init_code_hash)
}

fn rlp_uint(value: u64) -> Vec<u8> {
    match value {
        0 => vec![0x80],
        1..=0x7f => vec![value as u8],
        _ => {
            let bytes = value.to_be_bytes();
            let skip = bytes.iter().take_while(|b| **b == 0).count();
            let mut out = vec![0x80 + (bytes.len() - skip) as u8];
            out.extend_from_slice(&bytes[skip..]);
            out
        }
    }
}
