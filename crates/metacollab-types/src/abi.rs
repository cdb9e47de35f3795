//! Canonical payload codec
//!
//! Co-signed payloads use the Ethereum contract ABI tuple encoding
//! (`abi.encode`). Only the shapes MetaCollab payloads need are supported:
//! `address`, `uintN`, `bytes`, `T[]` and `T[k]`.
//!
//! Layout rules: static values are laid out inline in the head; dynamic values
//! (`bytes`, `T[]`, and `T[k]` of a dynamic `T`) put a 32-byte offset in the
//! head, measured from the start of the enclosing tuple, and their contents in
//! the tail.

use crate::error::{AbiError, AbiResult};
use crate::Address;

const WORD: usize = 32;

/// ABI parameter type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiType {
    Address,
    /// Unsigned integer of the given bit width (8..=256)
    Uint(u16),
    Bytes,
    Array(Box<AbiType>),
    FixedArray(Box<AbiType>, usize),
}

impl AbiType {
    /// `T[]`
    pub fn array(inner: AbiType) -> Self {
        Self::Array(Box::new(inner))
    }

    /// `T[k]`
    pub fn fixed_array(inner: AbiType, len: usize) -> Self {
        Self::FixedArray(Box::new(inner), len)
    }

    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Address | Self::Uint(_) => false,
            Self::Bytes | Self::Array(_) => true,
            Self::FixedArray(inner, _) => inner.is_dynamic(),
        }
    }

    /// Bytes this type occupies in its enclosing head
    fn head_size(&self) -> usize {
        match self {
            Self::FixedArray(inner, len) if !inner.is_dynamic() => inner.head_size() * len,
            _ => WORD,
        }
    }
}

/// ABI value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    /// Any `uintN`; values are limited to 128 bits
    Uint(u128),
    Bytes(Vec<u8>),
    Array(Vec<AbiValue>),
    FixedArray(Vec<AbiValue>),
}

impl AbiValue {
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Address(_) | Self::Uint(_) => false,
            Self::Bytes(_) | Self::Array(_) => true,
            Self::FixedArray(items) => items.iter().any(AbiValue::is_dynamic),
        }
    }

    fn head_size(&self) -> usize {
        match self {
            Self::FixedArray(items) if !self.is_dynamic() => {
                items.iter().map(AbiValue::head_size).sum()
            }
            _ => WORD,
        }
    }

    pub fn into_address(self) -> AbiResult<Address> {
        match self {
            Self::Address(a) => Ok(a),
            _ => Err(mismatch("address")),
        }
    }

    pub fn into_uint(self) -> AbiResult<u128> {
        match self {
            Self::Uint(v) => Ok(v),
            _ => Err(mismatch("uint")),
        }
    }

    /// Unsigned integer narrowed to `u64`
    pub fn into_u64(self) -> AbiResult<u64> {
        u64::try_from(self.into_uint()?).map_err(|_| mismatch("uint64"))
    }

    /// Unsigned integer narrowed to `u8`
    pub fn into_u8(self) -> AbiResult<u8> {
        u8::try_from(self.into_uint()?).map_err(|_| mismatch("uint8"))
    }

    pub fn into_bytes(self) -> AbiResult<Vec<u8>> {
        match self {
            Self::Bytes(b) => Ok(b),
            _ => Err(mismatch("bytes")),
        }
    }

    /// Items of either a dynamic or a fixed-size array
    pub fn into_items(self) -> AbiResult<Vec<AbiValue>> {
        match self {
            Self::Array(items) | Self::FixedArray(items) => Ok(items),
            _ => Err(mismatch("array")),
        }
    }
}

fn mismatch(expected: &str) -> AbiError {
    AbiError::TypeMismatch {
        expected: expected.to_string(),
    }
}

/// Encode a tuple of values (`abi.encode(v0, v1, ...)`)
pub fn encode(values: &[AbiValue]) -> Vec<u8> {
    encode_tuple(values)
}

fn encode_tuple(values: &[AbiValue]) -> Vec<u8> {
    let head_len: usize = values.iter().map(AbiValue::head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for value in values {
        if value.is_dynamic() {
            head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
            tail.extend(encode_value(value));
        } else {
            head.extend(encode_value(value));
        }
    }

    head.extend(tail);
    head
}

fn encode_value(value: &AbiValue) -> Vec<u8> {
    match value {
        AbiValue::Address(a) => a.to_word().to_vec(),
        AbiValue::Uint(v) => uint_word(*v).to_vec(),
        AbiValue::Bytes(bytes) => {
            let mut out = uint_word(bytes.len() as u128).to_vec();
            out.extend_from_slice(bytes);
            let padding = (WORD - bytes.len() % WORD) % WORD;
            out.resize(out.len() + padding, 0);
            out
        }
        AbiValue::Array(items) => {
            let mut out = uint_word(items.len() as u128).to_vec();
            out.extend(encode_tuple(items));
            out
        }
        AbiValue::FixedArray(items) => encode_tuple(items),
    }
}

fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Decode a tuple of values laid out per `types`
pub fn decode(types: &[AbiType], data: &[u8]) -> AbiResult<Vec<AbiValue>> {
    let mut out = Vec::with_capacity(types.len());
    let mut cursor = 0;
    for ty in types {
        out.push(decode_slot(ty, data, 0, cursor)?);
        cursor += ty.head_size();
    }
    Ok(out)
}

/// Decode the value whose head slot sits at `slot` inside a tuple starting at `base`
fn decode_slot(ty: &AbiType, data: &[u8], base: usize, slot: usize) -> AbiResult<AbiValue> {
    if ty.is_dynamic() {
        let relative = read_len(data, slot)?;
        let start = base
            .checked_add(relative)
            .ok_or(AbiError::OffsetOutOfRange { offset: slot })?;
        decode_value(ty, data, start)
    } else {
        decode_value(ty, data, slot)
    }
}

fn decode_value(ty: &AbiType, data: &[u8], at: usize) -> AbiResult<AbiValue> {
    match ty {
        AbiType::Address => {
            let word = read_word(data, at)?;
            if word[..12].iter().any(|b| *b != 0) {
                return Err(AbiError::DirtyAddress { offset: at });
            }
            Ok(AbiValue::Address(Address::from_digest(word)))
        }
        AbiType::Uint(bits) => {
            let word = read_word(data, at)?;
            let value = read_uint(word, *bits, at)?;
            Ok(AbiValue::Uint(value))
        }
        AbiType::Bytes => {
            let len = read_len(data, at)?;
            let start = at + WORD;
            let end = start
                .checked_add(len)
                .ok_or(AbiError::OffsetOutOfRange { offset: at })?;
            let bytes = data.get(start..end).ok_or(AbiError::Truncated {
                offset: start,
                needed: len,
                available: data.len().saturating_sub(start),
            })?;
            Ok(AbiValue::Bytes(bytes.to_vec()))
        }
        AbiType::Array(inner) => {
            let len = read_len(data, at)?;
            let start = at + WORD;
            // Reject lengths the remaining input cannot possibly hold
            let needed = len
                .checked_mul(inner.head_size())
                .ok_or(AbiError::OffsetOutOfRange { offset: at })?;
            let available = data.len().saturating_sub(start);
            if needed > available {
                return Err(AbiError::Truncated {
                    offset: start,
                    needed,
                    available,
                });
            }
            decode_sequence(inner, len, data, start).map(AbiValue::Array)
        }
        AbiType::FixedArray(inner, len) => {
            decode_sequence(inner, *len, data, at).map(AbiValue::FixedArray)
        }
    }
}

fn decode_sequence(
    inner: &AbiType,
    len: usize,
    data: &[u8],
    base: usize,
) -> AbiResult<Vec<AbiValue>> {
    let step = inner.head_size();
    (0..len)
        .map(|i| decode_slot(inner, data, base, base + i * step))
        .collect()
}

fn read_word(data: &[u8], at: usize) -> AbiResult<&[u8; WORD]> {
    data.get(at..at.saturating_add(WORD))
        .and_then(|s| s.try_into().ok())
        .ok_or(AbiError::Truncated {
            offset: at,
            needed: WORD,
            available: data.len().saturating_sub(at),
        })
}

fn read_uint(word: &[u8; WORD], bits: u16, at: usize) -> AbiResult<u128> {
    if word[..16].iter().any(|b| *b != 0) {
        return Err(AbiError::ValueOutOfRange { bits: bits.min(128), offset: at });
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    let value = u128::from_be_bytes(low);
    if bits < 128 && value >> bits != 0 {
        return Err(AbiError::ValueOutOfRange { bits, offset: at });
    }
    Ok(value)
}

/// Read an offset or length word that must fit in `usize`
fn read_len(data: &[u8], at: usize) -> AbiResult<usize> {
    let word = read_word(data, at)?;
    let value = read_uint(word, 64, at).map_err(|_| AbiError::OffsetOutOfRange { offset: at })?;
    usize::try_from(value).map_err(|_| AbiError::OffsetOutOfRange { offset: at })
}
