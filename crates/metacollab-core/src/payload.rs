//! Co-signed payloads
//!
//! Each payload is the ABI encoding of a fixed tuple. Parties sign the
//! encoded bytes; the agreement decodes the same bytes, so what was signed is
//! exactly what is executed.

use metacollab_types::abi::{self, AbiType, AbiValue};
use metacollab_types::{AbiError, AbiResult, Address, Gig, GigStatus, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};

/// Gig creation terms: `(bytes, address[], uint256[], uint256[3], address, uint8[2], address, uint256)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GigProposal {
    /// Opaque off-chain reference, echoed in `GigInit`
    #[serde(with = "metacollab_types::hex_bytes")]
    pub reference: Vec<u8>,
    pub tokens: Vec<Address>,
    pub amounts: Vec<TokenAmount>,
    pub durations: [u64; 3],
    pub resolver: Address,
    pub fee_reward_ratio: [u8; 2],
    /// Agreement the proposal is bound to
    pub collab: Address,
    /// Expected gig index; doubles as the anti-replay nonce
    pub nonce: u64,
}

impl GigProposal {
    pub fn abi_types() -> Vec<AbiType> {
        vec![
            AbiType::Bytes,
            AbiType::array(AbiType::Address),
            AbiType::array(AbiType::Uint(256)),
            AbiType::fixed_array(AbiType::Uint(256), 3),
            AbiType::Address,
            AbiType::fixed_array(AbiType::Uint(8), 2),
            AbiType::Address,
            AbiType::Uint(256),
        ]
    }

    pub fn encode(&self) -> Vec<u8> {
        abi::encode(&[
            AbiValue::Bytes(self.reference.clone()),
            AbiValue::Array(self.tokens.iter().copied().map(AbiValue::Address).collect()),
            AbiValue::Array(self.amounts.iter().copied().map(AbiValue::Uint).collect()),
            AbiValue::FixedArray(self.durations.iter().map(|d| AbiValue::Uint(*d as u128)).collect()),
            AbiValue::Address(self.resolver),
            AbiValue::FixedArray(ratio_values(&self.fee_reward_ratio)),
            AbiValue::Address(self.collab),
            AbiValue::Uint(self.nonce as u128),
        ])
    }

    pub fn decode(data: &[u8]) -> AbiResult<Self> {
        let mut fields = abi::decode(&Self::abi_types(), data)?.into_iter();
        let reference = next(&mut fields)?.into_bytes()?;
        let tokens = next(&mut fields)?
            .into_items()?
            .into_iter()
            .map(AbiValue::into_address)
            .collect::<AbiResult<Vec<_>>>()?;
        let amounts = next(&mut fields)?
            .into_items()?
            .into_iter()
            .map(AbiValue::into_uint)
            .collect::<AbiResult<Vec<_>>>()?;
        let durations = fixed_u64s(next(&mut fields)?)?;
        let resolver = next(&mut fields)?.into_address()?;
        let fee_reward_ratio = ratio_from(next(&mut fields)?)?;
        let collab = next(&mut fields)?.into_address()?;
        let nonce = next(&mut fields)?.into_u64()?;

        Ok(Self {
            reference,
            tokens,
            amounts,
            durations,
            resolver,
            fee_reward_ratio,
            collab,
            nonce,
        })
    }

    /// Gig record these terms describe
    pub(crate) fn to_gig(&self, status: GigStatus, now: Timestamp, flat_resolver_fee: TokenAmount) -> Gig {
        Gig {
            status,
            tokens: self.tokens.clone(),
            amounts: self.amounts.clone(),
            start_timestamp: now,
            countdown_timestamp: 0,
            durations: self.durations,
            resolver: self.resolver,
            flat_resolver_fee,
            fee_reward_ratio: self.fee_reward_ratio,
            third_parties: [Address::ZERO; 2],
        }
    }
}

/// Completion terms: `(address, uint256, uint8[2])`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GigCompletion {
    pub collab: Address,
    pub gig_id: u64,
    /// Final `[funder_share, doer_share]`
    pub ratio: [u8; 2],
}

impl GigCompletion {
    pub fn abi_types() -> Vec<AbiType> {
        vec![
            AbiType::Address,
            AbiType::Uint(256),
            AbiType::fixed_array(AbiType::Uint(8), 2),
        ]
    }

    pub fn encode(&self) -> Vec<u8> {
        abi::encode(&[
            AbiValue::Address(self.collab),
            AbiValue::Uint(self.gig_id as u128),
            AbiValue::FixedArray(ratio_values(&self.ratio)),
        ])
    }

    pub fn decode(data: &[u8]) -> AbiResult<Self> {
        let mut fields = abi::decode(&Self::abi_types(), data)?.into_iter();
        Ok(Self {
            collab: next(&mut fields)?.into_address()?,
            gig_id: next(&mut fields)?.into_u64()?,
            ratio: ratio_from(next(&mut fields)?)?,
        })
    }
}

/// Reference re-publication: `(address, uint256, bytes)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GigHashUpdate {
    pub collab: Address,
    pub gig_id: u64,
    #[serde(with = "metacollab_types::hex_bytes")]
    pub reference: Vec<u8>,
}

impl GigHashUpdate {
    pub fn abi_types() -> Vec<AbiType> {
        vec![AbiType::Address, AbiType::Uint(256), AbiType::Bytes]
    }

    pub fn encode(&self) -> Vec<u8> {
        abi::encode(&[
            AbiValue::Address(self.collab),
            AbiValue::Uint(self.gig_id as u128),
            AbiValue::Bytes(self.reference.clone()),
        ])
    }

    pub fn decode(data: &[u8]) -> AbiResult<Self> {
        let mut fields = abi::decode(&Self::abi_types(), data)?.into_iter();
        Ok(Self {
            collab: next(&mut fields)?.into_address()?,
            gig_id: next(&mut fields)?.into_u64()?,
            reference: next(&mut fields)?.into_bytes()?,
        })
    }
}

/// Resolver assignment: `(address, uint256, address, uint8[2])`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GigResolverUpdate {
    pub collab: Address,
    pub gig_id: u64,
    pub resolver: Address,
    /// Replaces the gig's `fee_reward_ratio`
    pub fee_reward_ratio: [u8; 2],
}

impl GigResolverUpdate {
    pub fn abi_types() -> Vec<AbiType> {
        vec![
            AbiType::Address,
            AbiType::Uint(256),
            AbiType::Address,
            AbiType::fixed_array(AbiType::Uint(8), 2),
        ]
    }

    pub fn encode(&self) -> Vec<u8> {
        abi::encode(&[
            AbiValue::Address(self.collab),
            AbiValue::Uint(self.gig_id as u128),
            AbiValue::Address(self.resolver),
            AbiValue::FixedArray(ratio_values(&self.fee_reward_ratio)),
        ])
    }

    pub fn decode(data: &[u8]) -> AbiResult<Self> {
        let mut fields = abi::decode(&Self::abi_types(), data)?.into_iter();
        Ok(Self {
            collab: next(&mut fields)?.into_address()?,
            gig_id: next(&mut fields)?.into_u64()?,
            resolver: next(&mut fields)?.into_address()?,
            fee_reward_ratio: ratio_from(next(&mut fields)?)?,
        })
    }
}

fn next(fields: &mut impl Iterator<Item = AbiValue>) -> AbiResult<AbiValue> {
    fields.next().ok_or(AbiError::TypeMismatch {
        expected: "another tuple field".to_string(),
    })
}

fn ratio_values(ratio: &[u8; 2]) -> Vec<AbiValue> {
    ratio.iter().map(|r| AbiValue::Uint(*r as u128)).collect()
}

fn ratio_from(value: AbiValue) -> AbiResult<[u8; 2]> {
    let items = value.into_items()?;
    let mut ratio = [0u8; 2];
    for (slot, item) in ratio.iter_mut().zip(items) {
        *slot = item.into_u8()?;
    }
    Ok(ratio)
}

fn fixed_u64s(value: AbiValue) -> AbiResult<[u64; 3]> {
    let items = value.into_items()?;
    let mut out = [0u64; 3];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.into_u64()?;
    }
    Ok(out)
}
