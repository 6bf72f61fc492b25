//! Universal on-chain signature validation.
//!
//! One `eth_call` answers for every account kind. Inside the simulated call
//! the validator routine:
//!
//! 1. deploys the wallet through its factory when the signature is an
//!    EIP-6492 envelope (a revert here is tolerated),
//! 2. asks the wallet's `isValidSignature` when the address has code, and
//!    accepts only the `0x1626ba7e` magic value,
//! 3. otherwise recovers the ECDSA signer and compares it to the address.
//!
//! By default the routine runs as creation code in a call with no `to`, so it
//! needs nothing deployed on the target chain. The universally deployed
//! validator contract can be called instead where it exists.

use std::future::IntoFuture;

use alloy_primitives::{Address, B256, Bytes, address, hex};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{TransactionInput, TransactionRequest};
use alloy_sol_types::{SolCall, SolConstructor};
use ethsig::{Digest, StructuredSignature, TypedDataSchema};
#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::contract::{VALIDATE_SIG_OFFCHAIN_BYTECODE, ValidateSigOffchain, Validator6492};
use crate::error::ValidationError;

/// Address of the universally deployed EIP-6492 validator.
pub const VALIDATOR_ADDRESS: Address = address!("0xdAcD51A54883eb67D95FAEb2BBfdC4a9a6BD2a3B");

/// How the validator routine is reached.
///
/// The default is [`Deployless`](Self::Deployless) with the built-in
/// [`VALIDATE_SIG_OFFCHAIN_BYTECODE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniversalValidator {
    /// Call the deployed validator's `isValidSigWithSideEffects`.
    ///
    /// Only works on chains where that contract exists. Elsewhere the call
    /// returns no data, which reads as invalid.
    Deployed(Address),
    /// Run the `ValidateSigOffchain` creation code with the arguments appended.
    Deployless(Bytes),
}

impl Default for UniversalValidator {
    fn default() -> Self {
        Self::Deployless(VALIDATE_SIG_OFFCHAIN_BYTECODE.clone())
    }
}

/// Errors while loading deployless validator bytecode.
#[derive(Debug, thiserror::Error)]
pub enum ValidatorArtifactError {
    /// The artifact is not hex.
    #[error("invalid validator bytecode: {0}")]
    Hex(#[from] hex::FromHexError),
    /// The artifact decoded to nothing.
    #[error("validator bytecode is empty")]
    Empty,
}

impl UniversalValidator {
    /// The validator contract at [`VALIDATOR_ADDRESS`].
    #[must_use]
    pub const fn deployed() -> Self {
        Self::Deployed(VALIDATOR_ADDRESS)
    }

    /// Loads deployless creation code from a hex artifact (`0x` optional,
    /// surrounding whitespace ignored).
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorArtifactError`] if the text is not hex or is empty.
    pub fn deployless_from_hex(artifact: &str) -> Result<Self, ValidatorArtifactError> {
        let bytecode = hex::decode(artifact.trim())?;
        if bytecode.is_empty() {
            return Err(ValidatorArtifactError::Empty);
        }
        Ok(Self::Deployless(bytecode.into()))
    }

    /// Builds the read-only call that validates `signature` for `signer` over `hash`.
    #[must_use]
    pub fn request(&self, signer: Address, hash: B256, signature: Bytes) -> TransactionRequest {
        match self {
            Self::Deployed(validator) => {
                let calldata = Validator6492::isValidSigWithSideEffectsCall {
                    signer,
                    hash,
                    signature,
                }
                .abi_encode();
                TransactionRequest::default()
                    .to(*validator)
                    .input(TransactionInput::new(calldata.into()))
            }
            Self::Deployless(bytecode) => {
                let args = ValidateSigOffchain::constructorCall {
                    _signer: signer,
                    _hash: hash,
                    _signature: signature,
                }
                .abi_encode();
                let mut payload = Vec::with_capacity(bytecode.len() + args.len());
                payload.extend_from_slice(bytecode);
                payload.extend_from_slice(&args);
                TransactionRequest::default().input(TransactionInput::new(payload.into()))
            }
        }
    }
}

/// Validates `signature` for `signer` over `hash` with one `eth_call`.
///
/// The signature is parsed first: a malformed EIP-6492 envelope fails here
/// without touching the network.
///
/// Returns `Ok(false)` for empty return data, a zero verdict, or an execution
/// revert.
///
/// # Errors
///
/// - [`ValidationError::MalformedWrapper`] for an undecodable envelope
/// - [`ValidationError::Network`] when the node cannot be reached
/// - [`ValidationError::UnexpectedResponse`] for any answer the routine cannot produce
#[cfg_attr(
    feature = "telemetry",
    instrument(skip_all, err, fields(signer = %signer, hash = %hash))
)]
#[cfg_attr(not(feature = "telemetry"), allow(unused_variables))]
pub async fn validate<P: Provider>(
    provider: &P,
    validator: &UniversalValidator,
    signer: Address,
    hash: B256,
    signature: &Bytes,
) -> Result<bool, ValidationError> {
    let shape = StructuredSignature::parse(signature)?;
    let request = validator.request(signer, hash, signature.clone());
    let call = provider.call(request).into_future();
    let outcome = traced!(
        call,
        tracing::info_span!("eth_call_validate_signature",
            signer = %signer,
            shape = shape.kind(),
            otel.kind = "client",
        )
    );
    match outcome {
        Ok(data) => interpret_return(&data),
        Err(err) => ValidationError::from_call_error(err),
    }
}

/// Reads the validator's verdict out of raw return data.
fn interpret_return(data: &[u8]) -> Result<bool, ValidationError> {
    match data.len() {
        0 => Ok(false),
        1 => Ok(data[0] == 0x01),
        32 => Ok(data == B256::with_last_byte(1).as_slice()),
        n => Err(ValidationError::UnexpectedResponse(format!(
            "{n} bytes of return data"
        ))),
    }
}

/// Validates a signature over an EIP-191 personal message.
///
/// # Errors
///
/// Same as [`validate`].
pub async fn is_valid_message_signature<P: Provider>(
    provider: &P,
    validator: &UniversalValidator,
    signer: Address,
    message: &[u8],
    signature: &Bytes,
) -> Result<bool, ValidationError> {
    let digest = Digest::personal_message(message);
    validate(provider, validator, signer, digest.into(), signature).await
}

/// Validates a signature over EIP-712 typed data.
///
/// # Errors
///
/// [`ValidationError::TypeEncoding`] when the message does not fit the
/// schema, otherwise same as [`validate`].
pub async fn is_valid_typed_data_signature<P: Provider>(
    provider: &P,
    validator: &UniversalValidator,
    signer: Address,
    schema: &TypedDataSchema,
    signature: &Bytes,
) -> Result<bool, ValidationError> {
    let digest = Digest::typed_data(schema)?;
    validate(provider, validator, signer, digest.into(), signature).await
}
