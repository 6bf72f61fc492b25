//! Known networks and the RPC endpoints used to reach them.
//!
//! Each network is addressed by a short *selector* (e.g. `"polygon"`). By
//! default the endpoint is `{base_url}/{selector}`; individual endpoints can
//! be overridden with [`NetworkRegistry::register`].

use std::collections::HashMap;

use url::Url;

/// Default RPC gateway; endpoints are `{DEFAULT_RPC_BASE_URL}/{selector}`.
pub const DEFAULT_RPC_BASE_URL: &str = "https://nodes.sequence.app";

/// A known network definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Display name (e.g. "Polygon zkEVM").
    pub name: &'static str,
    /// Endpoint path segment (e.g. "polygon-zkevm").
    pub selector: &'static str,
    /// EIP-155 chain id.
    pub chain_id: u64,
}

/// Networks selectable out of the box, mainnets first.
pub const KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "Arbitrum",
        selector: "arbitrum",
        chain_id: 42161,
    },
    NetworkInfo {
        name: "Arbitrum Nova",
        selector: "arbitrum-nova",
        chain_id: 42170,
    },
    NetworkInfo {
        name: "Avalanche",
        selector: "avalanche",
        chain_id: 43114,
    },
    NetworkInfo {
        name: "Base",
        selector: "base",
        chain_id: 8453,
    },
    NetworkInfo {
        name: "BNB Smart Chain",
        selector: "bsc",
        chain_id: 56,
    },
    NetworkInfo {
        name: "Ethereum",
        selector: "mainnet",
        chain_id: 1,
    },
    NetworkInfo {
        name: "Gnosis Chain",
        selector: "gnosis",
        chain_id: 100,
    },
    NetworkInfo {
        name: "Homeverse",
        selector: "homeverse",
        chain_id: 19011,
    },
    NetworkInfo {
        name: "Optimism",
        selector: "optimism",
        chain_id: 10,
    },
    NetworkInfo {
        name: "Polygon",
        selector: "polygon",
        chain_id: 137,
    },
    NetworkInfo {
        name: "Polygon zkEVM",
        selector: "polygon-zkevm",
        chain_id: 1101,
    },
    NetworkInfo {
        name: "Arbitrum Goerli",
        selector: "arbitrum-goerli",
        chain_id: 421_613,
    },
    NetworkInfo {
        name: "Avalanche Testnet",
        selector: "avalanche-testnet",
        chain_id: 43113,
    },
    NetworkInfo {
        name: "Base Goerli",
        selector: "base-goerli",
        chain_id: 84531,
    },
    NetworkInfo {
        name: "BNB Smart Chain Testnet",
        selector: "bsc-testnet",
        chain_id: 97,
    },
    NetworkInfo {
        name: "Goerli",
        selector: "goerli",
        chain_id: 5,
    },
    NetworkInfo {
        name: "Homeverse Testnet",
        selector: "homeverse-testnet",
        chain_id: 40875,
    },
    NetworkInfo {
        name: "Polygon Mumbai",
        selector: "mumbai",
        chain_id: 80001,
    },
    NetworkInfo {
        name: "Sepolia",
        selector: "sepolia",
        chain_id: 11_155_111,
    },
];

/// Looks up a known network by selector.
#[must_use]
pub fn known_network(selector: &str) -> Option<&'static NetworkInfo> {
    KNOWN_NETWORKS.iter().find(|n| n.selector == selector)
}

/// A network together with the RPC endpoint that serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEndpoint {
    /// Endpoint path segment and lookup key.
    pub selector: String,
    /// Display name.
    pub name: String,
    /// EIP-155 chain id, when known.
    pub chain_id: Option<u64>,
    /// JSON-RPC URL.
    pub url: Url,
}

/// Ordered mapping from selector to [`NetworkEndpoint`].
///
/// Iteration follows registration order, which is also the order classification
/// reports networks in.
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    endpoints: Vec<NetworkEndpoint>,
    index: HashMap<String, usize>,
}

impl NetworkRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry for `networks`, each served at `{base_url}/{selector}`.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if `base_url` does not form a valid URL.
    pub fn from_known(base_url: &str, networks: &[NetworkInfo]) -> Result<Self, url::ParseError> {
        let base = base_url.trim_end_matches('/');
        let mut registry = Self::new();
        for info in networks {
            let url = Url::parse(&format!("{base}/{}", info.selector))?;
            registry.register(NetworkEndpoint {
                selector: info.selector.to_owned(),
                name: info.name.to_owned(),
                chain_id: Some(info.chain_id),
                url,
            });
        }
        Ok(registry)
    }

    /// Adds an endpoint, replacing in place any endpoint with the same selector.
    pub fn register(&mut self, endpoint: NetworkEndpoint) {
        if let Some(&i) = self.index.get(&endpoint.selector) {
            self.endpoints[i] = endpoint;
        } else {
            self.index.insert(endpoint.selector.clone(), self.endpoints.len());
            self.endpoints.push(endpoint);
        }
    }

    /// Builder-style [`Self::register`].
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: NetworkEndpoint) -> Self {
        self.register(endpoint);
        self
    }

    /// Replaces the URL of an already registered network. Returns `false` if
    /// the selector is unknown.
    pub fn override_url(&mut self, selector: &str, url: Url) -> bool {
        match self.index.get(selector) {
            Some(&i) => {
                self.endpoints[i].url = url;
                true
            }
            None => false,
        }
    }

    /// Looks up an endpoint by selector.
    #[must_use]
    pub fn endpoint(&self, selector: &str) -> Option<&NetworkEndpoint> {
        self.index.get(selector).map(|&i| &self.endpoints[i])
    }

    /// Endpoints in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &NetworkEndpoint> {
        self.endpoints.iter()
    }

    /// Returns the number of registered networks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` if no networks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl<'a> IntoIterator for &'a NetworkRegistry {
    type Item = &'a NetworkEndpoint;
    type IntoIter = std::slice::Iter<'a, NetworkEndpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.endpoints.iter()
    }
}
