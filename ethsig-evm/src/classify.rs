//! Wallet classification from deployed code.
//!
//! Probes run concurrently, one `eth_getCode` per network, and every probe is
//! awaited. A failed probe counts as "no code seen" on that network and never
//! cancels the others.

use std::future::IntoFuture;

use alloy_primitives::{Address, Bytes};
use alloy_provider::Provider;
use alloy_transport::TransportResult;
use ethsig::wrapper::is_wrapped;
use futures_util::future::join_all;
use serde::Serialize;
#[cfg(feature = "telemetry")]
use tracing::instrument;

/// What kind of account an address appears to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WalletKind {
    /// No code anywhere and no EIP-6492 envelope.
    ExternallyOwned,
    /// Code was observed on at least one network.
    DeployedContract,
    /// No code yet, but the signature carries an EIP-6492 envelope.
    CounterfactualContract,
    /// Not classified yet. [`classify`] never returns it.
    #[default]
    Unknown,
}

/// Result of [`classify`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletClassification {
    /// The verdict.
    pub kind: WalletKind,
    /// Selectors with non-empty code, in probe order.
    pub deployed_on: Vec<String>,
}

impl WalletClassification {
    /// Whether validation depends on picking the right network.
    ///
    /// EOA signatures verify the same everywhere; contract wallets do not.
    #[must_use]
    pub const fn needs_network_selector(&self) -> bool {
        !matches!(self.kind, WalletKind::ExternallyOwned)
    }
}

/// Classifies `address` by probing its code on every `(selector, provider)` pair.
///
/// `signature`, when given, is only checked for the EIP-6492 suffix.
#[cfg_attr(feature = "telemetry", instrument(skip_all, fields(address = %address)))]
pub async fn classify<'a, P, I>(
    probes: I,
    address: Address,
    signature: Option<&[u8]>,
) -> WalletClassification
where
    P: Provider + 'a,
    I: IntoIterator<Item = (&'a str, &'a P)>,
{
    let outcomes = join_all(
        probes
            .into_iter()
            .map(|(selector, provider)| probe_code(selector, provider, address)),
    )
    .await;

    let deployed_on = outcomes
        .into_iter()
        .filter_map(|(selector, outcome)| match outcome {
            Ok(code) => (!code.is_empty()).then(|| selector.to_owned()),
            Err(err) => {
                probe_failed(selector, &err);
                None
            }
        })
        .collect();
    classify_outcome(deployed_on, signature)
}

async fn probe_code<'a, P: Provider>(
    selector: &'a str,
    provider: &P,
    address: Address,
) -> (&'a str, TransportResult<Bytes>) {
    let fut = provider.get_code_at(address).into_future();
    let code = traced!(
        fut,
        tracing::info_span!("eth_getCode",
            network = selector,
            address = %address,
            otel.kind = "client",
        )
    );
    (selector, code)
}

#[cfg_attr(not(feature = "telemetry"), allow(unused_variables))]
fn probe_failed(selector: &str, err: &alloy_transport::TransportError) {
    #[cfg(feature = "telemetry")]
    tracing::warn!(network = selector, error = %err, "code probe failed, counting as no code");
}

/// Applies the classification rule to settled probe results.
///
/// No code seen, including when there was nothing to probe, means
/// externally owned unless the signature is wrapped.
fn classify_outcome(deployed_on: Vec<String>, signature: Option<&[u8]>) -> WalletClassification {
    let kind = if !deployed_on.is_empty() {
        WalletKind::DeployedContract
    } else if signature.is_some_and(is_wrapped) {
        WalletKind::CounterfactualContract
    } else {
        WalletKind::ExternallyOwned
    };
    WalletClassification { kind, deployed_on }
}
