//! Read-only JSON-RPC providers over HTTP.
//!
//! Each network gets one [`RootProvider`] backed by an HTTP transport with a
//! request timeout and an optional [`ThrottleLayer`] rate limit. No signer or
//! filler is attached: only `eth_call` and `eth_getCode` are ever issued.

use std::time::Duration;

use alloy_provider::RootProvider;
use alloy_rpc_client::RpcClient;
use alloy_transport::layers::ThrottleLayer;
use alloy_transport_http::{Http, reqwest};
use ethsig::NetworkEndpoint;
use tower::ServiceBuilder;
use url::Url;

/// Provider type used for every configured network.
pub type ReadProvider = RootProvider;

/// Default bound on a single RPC round trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport settings shared by all endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Upper bound on one HTTP request, connection included.
    pub request_timeout: Duration,
    /// Requests per second per endpoint; unlimited when `None` or zero.
    pub rate_limit: Option<u32>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            rate_limit: None,
        }
    }
}

/// Errors while constructing a provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderBuildError {
    /// Only `http` and `https` endpoints are supported.
    #[error("unsupported RPC URL scheme {scheme:?} for {url}")]
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
        /// The endpoint URL.
        url: Url,
    },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Creates an RPC client for one HTTP endpoint.
///
/// # Errors
///
/// Returns [`ProviderBuildError`] for non-HTTP URLs or when the HTTP client
/// cannot be built.
pub fn rpc_client(url: &Url, config: &TransportConfig) -> Result<RpcClient, ProviderBuildError> {
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ProviderBuildError::UnsupportedScheme {
            scheme: scheme.to_owned(),
            url: url.clone(),
        });
    }
    #[cfg(feature = "telemetry")]
    tracing::info!(rpc_url = %url, rate_limit = ?config.rate_limit, timeout = ?config.request_timeout, "Using HTTP transport");

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    let http = Http::with_client(client, url.clone());
    let is_local = http.guess_local();
    let service = ServiceBuilder::new()
        .layer(ThrottleLayer::new(
            config.rate_limit.filter(|&n| n > 0).unwrap_or(u32::MAX),
        ))
        .service(http);
    Ok(RpcClient::new(service, is_local))
}

/// Connects a read-only provider to `endpoint`.
///
/// # Errors
///
/// Same as [`rpc_client`].
pub fn connect(
    endpoint: &NetworkEndpoint,
    config: &TransportConfig,
) -> Result<ReadProvider, ProviderBuildError> {
    rpc_client(&endpoint.url, config).map(RootProvider::new)
}
