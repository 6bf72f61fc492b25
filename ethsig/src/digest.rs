//! The two digest schemes a wallet may sign.

use std::fmt;

use alloy_primitives::{B256, keccak256};

use crate::typed_data::{TypeEncodingError, TypedDataSchema};

/// Prefix mixed into every EIP-191 personal message before hashing.
pub const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// A 32-byte hash that a signer actually signed.
///
/// Only [`Digest::personal_message`] and [`Digest::typed_data`] produce one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(B256);

impl Digest {
    /// EIP-191 digest: `keccak256(prefix ‖ decimal(len) ‖ message)`.
    #[must_use]
    pub fn personal_message(message: &[u8]) -> Self {
        let length = message.len().to_string();
        let mut buf =
            Vec::with_capacity(PERSONAL_MESSAGE_PREFIX.len() + length.len() + message.len());
        buf.extend_from_slice(PERSONAL_MESSAGE_PREFIX.as_bytes());
        buf.extend_from_slice(length.as_bytes());
        buf.extend_from_slice(message);
        Self(keccak256(&buf))
    }

    /// EIP-712 digest: `keccak256(0x1901 ‖ domainSeparator ‖ hashStruct(primaryType, message))`.
    ///
    /// # Errors
    ///
    /// Returns [`TypeEncodingError`] when the message does not fit the schema.
    pub fn typed_data(schema: &TypedDataSchema) -> Result<Self, TypeEncodingError> {
        schema.signing_hash().map(Self)
    }

    /// Returns the underlying hash.
    #[must_use]
    pub const fn as_b256(&self) -> &B256 {
        &self.0
    }
}

impl From<Digest> for B256 {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
