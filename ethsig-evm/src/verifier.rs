//! The [`SignatureVerifier`] facade.

use alloy_primitives::{Address, Bytes};
use alloy_provider::Provider;
use ethsig::{NetworkEndpoint, NetworkRegistry, TypedDataSchema};
use serde::Serialize;
#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::classify::{WalletClassification, classify};
use crate::diagnose::{Diagnosis, DiagnosticEngine};
use crate::error::ValidationError;
use crate::provider::{ProviderBuildError, ReadProvider, TransportConfig, connect};
use crate::validator::{
    UniversalValidator, is_valid_message_signature, is_valid_typed_data_signature,
};

/// Verdict plus, for failed personal messages, the likely cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the signature is valid.
    pub is_valid: bool,
    /// First matching diagnostic scenario, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<Diagnosis>,
}

/// Validates signatures against a fixed set of networks.
///
/// Holds one provider per network, the [`UniversalValidator`] used for every
/// call, and the [`DiagnosticEngine`] consulted when a personal-message
/// signature fails. Nothing is mutated after construction, so one instance
/// can be shared across tasks.
#[derive(Debug, Clone)]
pub struct SignatureVerifier<P = ReadProvider> {
    networks: Vec<(NetworkEndpoint, P)>,
    validator: UniversalValidator,
    diagnostics: DiagnosticEngine,
}

impl SignatureVerifier<ReadProvider> {
    /// Connects one HTTP provider per registry entry, in registry order.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderBuildError`] if any endpoint cannot be connected.
    pub fn connect(
        registry: &NetworkRegistry,
        transport: &TransportConfig,
        validator: UniversalValidator,
    ) -> Result<Self, ProviderBuildError> {
        let mut verifier = Self::new(validator);
        for endpoint in registry {
            let provider = connect(endpoint, transport)?;
            verifier = verifier.with_network(endpoint.clone(), provider);
        }
        Ok(verifier)
    }
}

impl<P: Provider> SignatureVerifier<P> {
    /// A verifier with no networks and the built-in diagnostics.
    #[must_use]
    pub fn new(validator: UniversalValidator) -> Self {
        Self {
            networks: Vec::new(),
            validator,
            diagnostics: DiagnosticEngine::default(),
        }
    }

    /// Adds a network, replacing any network with the same selector.
    #[must_use]
    pub fn with_network(mut self, endpoint: NetworkEndpoint, provider: P) -> Self {
        match self
            .networks
            .iter_mut()
            .find(|(existing, _)| existing.selector == endpoint.selector)
        {
            Some(slot) => *slot = (endpoint, provider),
            None => self.networks.push((endpoint, provider)),
        }
        self
    }

    /// Replaces the diagnostic engine.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticEngine) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Configured networks in order.
    pub fn networks(&self) -> impl Iterator<Item = &NetworkEndpoint> {
        self.networks.iter().map(|(endpoint, _)| endpoint)
    }

    /// The validator every call goes through.
    #[must_use]
    pub const fn validator(&self) -> &UniversalValidator {
        &self.validator
    }

    fn provider(&self, network: &str) -> Result<&P, ValidationError> {
        self.networks
            .iter()
            .find(|(endpoint, _)| endpoint.selector == network)
            .map(|(_, provider)| provider)
            .ok_or_else(|| ValidationError::UnknownNetwork(network.to_owned()))
    }

    /// Verifies a personal-message signature on `network`, diagnosing failures.
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnknownNetwork`] for an unconfigured selector, plus
    /// everything [`crate::validator::validate`] returns. Diagnostic errors
    /// are never surfaced.
    #[cfg_attr(feature = "telemetry", instrument(skip(self, message, signature), err))]
    pub async fn verify_message(
        &self,
        network: &str,
        address: Address,
        message: &[u8],
        signature: &Bytes,
    ) -> Result<ValidationResult, ValidationError> {
        let provider = self.provider(network)?;
        let is_valid =
            is_valid_message_signature(provider, &self.validator, address, message, signature)
                .await?;
        let diagnosis = if is_valid {
            None
        } else {
            self.diagnostics
                .explain_failure(provider, &self.validator, address, message, signature)
                .await
        };
        Ok(ValidationResult { is_valid, diagnosis })
    }

    /// Verifies an EIP-712 signature on `network`.
    ///
    /// # Errors
    ///
    /// As [`Self::verify_message`], plus [`ValidationError::TypeEncoding`].
    #[cfg_attr(feature = "telemetry", instrument(skip(self, schema, signature), err))]
    pub async fn verify_typed_data(
        &self,
        network: &str,
        address: Address,
        schema: &TypedDataSchema,
        signature: &Bytes,
    ) -> Result<ValidationResult, ValidationError> {
        let provider = self.provider(network)?;
        let is_valid =
            is_valid_typed_data_signature(provider, &self.validator, address, schema, signature)
                .await?;
        Ok(ValidationResult {
            is_valid,
            diagnosis: None,
        })
    }

    /// Classifies `address` across every configured network.
    pub async fn classify(
        &self,
        address: Address,
        signature: Option<&[u8]>,
    ) -> WalletClassification {
        let probes = self
            .networks
            .iter()
            .map(|(endpoint, provider)| (endpoint.selector.as_str(), provider));
        classify(probes, address, signature).await
    }
}
