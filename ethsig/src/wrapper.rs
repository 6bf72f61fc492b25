//! The EIP-6492 envelope for signatures of counterfactual wallets.
//!
//! A wrapped signature is `abi.encode(address factory, bytes factoryCalldata, bytes innerSig)`
//! followed by [`MAGIC_SUFFIX`]. Two checks exist on purpose:
//!
//! - [`is_wrapped`] only looks at the suffix. It is cheap and permissive and is
//!   meant for classification and UI hints.
//! - [`unwrap`] and [`StructuredSignature::parse`] also ABI-decode the body in
//!   validating mode. The validation path uses these and nothing else.

use alloy_primitives::{Address, Bytes, Signature, hex};
use alloy_sol_types::SolType;

/// The fixed 32-byte marker defined by [EIP-6492](https://eips.ethereum.org/EIPS/eip-6492).
pub const MAGIC_SUFFIX: [u8; 32] =
    hex!("6492649264926492649264926492649264926492649264926492649264926492");

mod abi {
    alloy_sol_types::sol! {
        /// Body of an EIP-6492 wrapped signature.
        struct Sig6492 {
            address factory;
            bytes   factoryCalldata;
            bytes   innerSig;
        }
    }
}

use abi::Sig6492;

/// Decoded contents of an EIP-6492 envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedSignature {
    /// Factory that deploys the wallet.
    pub factory: Address,
    /// Calldata sent to the factory.
    pub factory_calldata: Bytes,
    /// Signature to validate once the wallet exists.
    pub inner: Bytes,
}

/// Errors from strict envelope decoding.
#[derive(Debug, thiserror::Error)]
pub enum MalformedWrapperError {
    /// The signature does not end with [`MAGIC_SUFFIX`].
    #[error("signature does not end with the EIP-6492 magic suffix")]
    MissingSuffix,
    /// The body before the suffix is not a well-formed `(address, bytes, bytes)` tuple.
    #[error("invalid EIP-6492 body: {0}")]
    InvalidAbi(#[from] alloy_sol_types::Error),
}

/// Returns `true` when the last 32 bytes of `signature` equal [`MAGIC_SUFFIX`].
///
/// The body is not inspected, so an ordinary signature that happens to end in
/// the pattern is reported as wrapped.
#[must_use]
pub fn is_wrapped(signature: &[u8]) -> bool {
    signature.ends_with(&MAGIC_SUFFIX)
}

/// Strictly decodes an EIP-6492 envelope.
///
/// # Errors
///
/// Returns [`MalformedWrapperError::MissingSuffix`] if the suffix is absent and
/// [`MalformedWrapperError::InvalidAbi`] if the body does not decode.
pub fn unwrap(signature: &[u8]) -> Result<WrappedSignature, MalformedWrapperError> {
    let body = signature
        .strip_suffix(&MAGIC_SUFFIX)
        .ok_or(MalformedWrapperError::MissingSuffix)?;
    let decoded = <Sig6492 as SolType>::abi_decode_params_validate(body)?;
    Ok(WrappedSignature {
        factory: decoded.factory,
        factory_calldata: decoded.factoryCalldata,
        inner: decoded.innerSig,
    })
}

/// Builds an EIP-6492 envelope around `inner`.
#[must_use]
pub fn wrap(factory: Address, factory_calldata: Bytes, inner: Bytes) -> Bytes {
    let body = Sig6492 {
        factory,
        factoryCalldata: factory_calldata,
        innerSig: inner,
    };
    let mut out = <Sig6492 as SolType>::abi_encode_params(&body);
    out.extend_from_slice(&MAGIC_SUFFIX);
    out.into()
}

/// A signature sorted by shape.
///
/// Shape is decided from the bytes alone:
/// - `Wrapped` when the suffix is present (the body must decode),
/// - `Eoa` for 65 bytes that parse as `r ‖ s ‖ v`,
/// - `Contract` for anything else, passed to EIP-1271 as-is.
#[derive(Debug, Clone)]
pub enum StructuredSignature {
    /// EIP-6492 envelope of a counterfactual wallet.
    Wrapped(WrappedSignature),
    /// Raw ECDSA signature.
    Eoa(Signature),
    /// Opaque EIP-1271 payload.
    Contract(Bytes),
}

impl StructuredSignature {
    /// Sorts `bytes` into one of the three shapes.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedWrapperError`] when the suffix is present but the
    /// body is not a valid envelope.
    pub fn parse(bytes: &[u8]) -> Result<Self, MalformedWrapperError> {
        if is_wrapped(bytes) {
            return unwrap(bytes).map(Self::Wrapped);
        }
        if bytes.len() == 65 {
            if let Ok(signature) = Signature::from_raw(bytes) {
                return Ok(Self::Eoa(signature));
            }
        }
        Ok(Self::Contract(Bytes::copy_from_slice(bytes)))
    }

    /// Short label of the shape, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Wrapped(_) => "eip6492",
            Self::Eoa(_) => "eoa",
            Self::Contract(_) => "eip1271",
        }
    }
}
