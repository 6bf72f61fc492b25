#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Chain-agnostic building blocks for Ethereum signature validation.
//!
//! This crate holds everything that can be decided without talking to a node:
//!
//! - [`input`] - strict parsing of caller-supplied addresses and signatures
//! - [`digest`] - EIP-191 personal-message and EIP-712 typed-data digests
//! - [`typed_data`] - an explicit, validated EIP-712 schema
//! - [`wrapper`] - the EIP-6492 counterfactual signature envelope
//! - [`networks`] - known networks and their RPC endpoints
//!
//! The JSON-RPC side (on-chain validation, wallet classification and failure
//! diagnostics) lives in `ethsig-evm`.

pub mod digest;
pub mod input;
pub mod networks;
pub mod typed_data;
pub mod wrapper;

pub use digest::Digest;
pub use input::MalformedInputError;
pub use networks::{KNOWN_NETWORKS, NetworkEndpoint, NetworkInfo, NetworkRegistry};
pub use typed_data::{TypeEncodingError, TypedDataSchema};
pub use wrapper::{MAGIC_SUFFIX, MalformedWrapperError, StructuredSignature, WrappedSignature};
