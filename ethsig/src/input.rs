//! Strict parsing of caller-supplied hex values.
//!
//! Everything here runs before any network call, so a malformed address or
//! signature never costs an RPC round trip.

use std::str::FromStr;

use alloy_primitives::{Address, Bytes, hex};

/// Rejections produced while parsing caller input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedInputError {
    /// Not a `0x`-prefixed string of 40 hex digits.
    #[error("invalid address {0:?}: expected 0x followed by 40 hex digits")]
    InvalidAddress(String),
    /// Mixed-case address whose EIP-55 checksum does not match.
    #[error("address {0:?} has an invalid EIP-55 checksum")]
    BadChecksum(String),
    /// Not a `0x`-prefixed, non-empty, even-length hex string.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}

/// Parses a `0x`-prefixed account address.
///
/// All-lowercase and all-uppercase digits are accepted as-is. Mixed-case input
/// must carry a valid EIP-55 checksum.
///
/// # Errors
///
/// Returns [`MalformedInputError::InvalidAddress`] for anything that is not
/// 20 hex-encoded bytes, and [`MalformedInputError::BadChecksum`] when a
/// mixed-case checksum does not verify.
pub fn parse_address(input: &str) -> Result<Address, MalformedInputError> {
    let invalid = || MalformedInputError::InvalidAddress(input.to_owned());
    let digits = input.strip_prefix("0x").ok_or_else(invalid)?;
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let address = Address::from_str(input).map_err(|_| invalid())?;

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper && address.to_checksum(None) != input {
        return Err(MalformedInputError::BadChecksum(input.to_owned()));
    }
    Ok(address)
}

/// Parses a `0x`-prefixed signature into raw bytes.
///
/// No shape is imposed here: raw ECDSA, EIP-1271 payloads and EIP-6492
/// envelopes are all just bytes at this stage.
///
/// # Errors
///
/// Returns [`MalformedInputError::InvalidSignature`] when the prefix is
/// missing, the hex is invalid or has odd length, or the result is empty.
pub fn parse_signature(input: &str) -> Result<Bytes, MalformedInputError> {
    let digits = input
        .strip_prefix("0x")
        .ok_or_else(|| MalformedInputError::InvalidSignature("missing 0x prefix".into()))?;
    let bytes =
        hex::decode(digits).map_err(|e| MalformedInputError::InvalidSignature(e.to_string()))?;
    if bytes.is_empty() {
        return Err(MalformedInputError::InvalidSignature("empty signature".into()));
    }
    Ok(bytes.into())
}

/// Returns the UTF-8 bytes of a personal message.
#[must_use]
pub fn parse_message_bytes(message: &str) -> Bytes {
    Bytes::copy_from_slice(message.as_bytes())
}
