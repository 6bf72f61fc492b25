#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EVM JSON-RPC side of signature validation.
//!
//! Every check that needs a node lives here:
//!
//! - [`validator`] - one `eth_call` running the universal EIP-6492 validator,
//!   covering EOAs, deployed EIP-1271 wallets and counterfactual wallets
//! - [`classify`] - concurrent `eth_getCode` probes that label a wallet
//! - [`diagnose`] - alternate digests that explain why a signature failed
//! - [`verifier`] - the [`SignatureVerifier`] facade tying these to a set of networks
//! - [`provider`] - HTTP transports with timeouts and rate limits
//!
//! # Feature Flags
//!
//! - `telemetry` - `tracing` spans around every RPC call

/// Awaits a future, optionally instrumenting it with a tracing span.
macro_rules! traced {
    ($fut:expr, $span:expr) => {{
        #[cfg(feature = "telemetry")]
        {
            use tracing::Instrument;
            $fut.instrument($span).await
        }
        #[cfg(not(feature = "telemetry"))]
        {
            $fut.await
        }
    }};
}

pub mod classify;
pub mod contract;
pub mod diagnose;
pub mod error;
pub mod provider;
pub mod validator;
pub mod verifier;

#[cfg(test)]
mod testing;

pub use classify::{WalletClassification, WalletKind};
pub use contract::VALIDATE_SIG_OFFCHAIN_BYTECODE;
pub use diagnose::{Diagnosis, DiagnosticEngine, Scenario};
pub use error::ValidationError;
pub use provider::{ReadProvider, TransportConfig};
pub use validator::{UniversalValidator, VALIDATOR_ADDRESS};
pub use verifier::{SignatureVerifier, ValidationResult};
