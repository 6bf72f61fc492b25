//! Error types for on-chain signature validation.

use alloy_transport::{RpcError, TransportError};
use ethsig::{MalformedInputError, MalformedWrapperError, TypeEncodingError};

/// Why a validation could not reach a verdict.
///
/// An invalid signature is not an error: it is `Ok(false)`. Every variant here
/// means the answer is unknown.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Address or signature text could not be parsed.
    #[error(transparent)]
    MalformedInput(#[from] MalformedInputError),
    /// Signature carries the EIP-6492 suffix but the envelope does not decode.
    #[error(transparent)]
    MalformedWrapper(#[from] MalformedWrapperError),
    /// Typed data does not fit its schema.
    #[error(transparent)]
    TypeEncoding(#[from] TypeEncodingError),
    /// No provider is configured for the requested network selector.
    #[error("unknown network {0:?}")]
    UnknownNetwork(String),
    /// The node could not be reached or answered with garbage.
    #[error("network error: {0}")]
    Network(#[from] TransportError),
    /// The node answered, but not in any shape the validator produces.
    #[error("unexpected RPC response: {0}")]
    UnexpectedResponse(String),
}

impl ValidationError {
    /// Sorts a failed `eth_call` into "the call reverted" (`Ok(false)`) or an error.
    ///
    /// A JSON-RPC error with code `3` or a message mentioning a revert is an
    /// execution revert. Other JSON-RPC errors and `null` results are
    /// [`Self::UnexpectedResponse`]. Everything else is [`Self::Network`].
    pub(crate) fn from_call_error(err: TransportError) -> Result<bool, Self> {
        match err {
            RpcError::ErrorResp(payload) => {
                if payload.code == 3 || payload.message.to_ascii_lowercase().contains("revert") {
                    Ok(false)
                } else {
                    Err(Self::UnexpectedResponse(format!(
                        "JSON-RPC error {}: {}",
                        payload.code, payload.message
                    )))
                }
            }
            RpcError::NullResp => Err(Self::UnexpectedResponse("null result".into())),
            RpcError::DeserError { text, .. } if text.trim() == "null" => {
                Err(Self::UnexpectedResponse("null result".into()))
            }
            other => Err(Self::Network(other)),
        }
    }

    /// `true` for errors raised before any RPC was attempted.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput(_)
                | Self::MalformedWrapper(_)
                | Self::TypeEncoding(_)
                | Self::UnknownNetwork(_)
        )
    }
}
