//! Debugger service configuration.
//!
//! Loaded from a TOML file in which string values may reference environment
//! variables as `$VAR` or `${VAR}`. A missing file means all defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 4022
//! rpc_base_url = "https://nodes.sequence.app"
//! request_timeout_secs = 30
//! rate_limit = 50
//! networks = ["mainnet", "polygon"]
//!
//! # built-in creation code, no contract needed on the chain (the default)
//! [validator]
//! mode = "deployless"
//!
//! [endpoints]
//! polygon = "https://polygon-rpc.example/$POLYGON_KEY"
//! ```
//!
//! # Environment Variables
//!
//! - `HOST` - overrides `host`
//! - `PORT` - overrides `port`
//! - anything referenced as `$VAR` in the file
//!
//! To call the deployed validator instead, set `mode = "deployed"` and
//! optionally `address` (defaults to [`VALIDATOR_ADDRESS`]).

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_primitives::Address;
use ethsig::networks::{DEFAULT_RPC_BASE_URL, NetworkInfo, known_network};
use ethsig::{KNOWN_NETWORKS, NetworkEndpoint, NetworkRegistry};
use ethsig_evm::validator::ValidatorArtifactError;
use ethsig_evm::{TransportConfig, UniversalValidator, VALIDATOR_ADDRESS};
use serde::{Deserialize, Serialize};
use url::Url;

/// Errors while loading or applying the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The TOML did not match the expected shape.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// `networks` names a selector that is neither known nor in `endpoints`.
    #[error("unknown network {0:?} in `networks`")]
    UnknownNetwork(String),
    /// `rpc_base_url` does not form valid endpoint URLs.
    #[error("invalid rpc_base_url: {0}")]
    BaseUrl(#[from] url::ParseError),
    /// The deployless validator artifact could not be loaded.
    #[error("invalid validator bytecode in {}: {source}", path.display())]
    Artifact {
        /// Artifact path.
        path: PathBuf,
        /// Why it was rejected.
        source: ValidatorArtifactError,
    },
}

/// Top-level debugger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebuggerConfig {
    /// Bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Bind port (default: `4022`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Endpoints default to `{rpc_base_url}/{selector}`.
    #[serde(default = "default_rpc_base_url")]
    pub rpc_base_url: String,

    /// Upper bound on a single RPC request, in seconds (default: `30`).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Requests per second per endpoint. Unlimited when absent.
    #[serde(default)]
    pub rate_limit: Option<u32>,

    /// Subset of known networks to serve. All known networks when absent.
    #[serde(default)]
    pub networks: Option<Vec<String>>,

    /// Per-selector endpoint overrides. Unknown selectors add a custom network.
    #[serde(default)]
    pub endpoints: BTreeMap<String, Url>,

    /// How the universal validator is reached.
    #[serde(default)]
    pub validator: ValidatorConfig,
}

/// Universal validator selection. Deployless with the built-in bytecode
/// unless configured otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ValidatorConfig {
    /// Call a deployed validator contract.
    Deployed {
        /// Validator address.
        #[serde(default = "default_validator_address")]
        address: Address,
    },
    /// Run validator creation code with the arguments appended.
    Deployless {
        /// Hex artifact replacing the built-in creation code.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bytecode_path: Option<PathBuf>,
    },
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::Deployless {
            bytecode_path: None,
        }
    }
}

const fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_port() -> u16 {
    4022
}

fn default_rpc_base_url() -> String {
    DEFAULT_RPC_BASE_URL.to_owned()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_validator_address() -> Address {
    VALIDATOR_ADDRESS
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            rpc_base_url: default_rpc_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            rate_limit: None,
            networks: None,
            endpoints: BTreeMap::new(),
            validator: ValidatorConfig::default(),
        }
    }
}

impl DebuggerConfig {
    /// Loads `path`, then applies `HOST` / `PORT` from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };
        let mut config = Self::from_toml(&content)?;

        if let Some(host) = std::env::var("HOST").ok().and_then(|h| h.parse().ok()) {
            config.host = host;
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            config.port = port;
        }
        Ok(config)
    }

    /// Parses TOML text after expanding environment references.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_vars(content, |name| std::env::var(name).ok());
        Ok(toml::from_str(&expanded)?)
    }

    /// Builds the network registry: the selected known networks at
    /// `{rpc_base_url}/{selector}`, then `endpoints` applied on top.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownNetwork`] for a selector in `networks`
    /// that has no built-in entry and no explicit endpoint, and
    /// [`ConfigError::BaseUrl`] for an unusable `rpc_base_url`.
    pub fn registry(&self) -> Result<NetworkRegistry, ConfigError> {
        let selected: Vec<NetworkInfo> = match &self.networks {
            None => KNOWN_NETWORKS.to_vec(),
            Some(selectors) => selectors
                .iter()
                .filter_map(|selector| match known_network(selector) {
                    Some(info) => Some(Ok(*info)),
                    None if self.endpoints.contains_key(selector) => None,
                    None => Some(Err(ConfigError::UnknownNetwork(selector.clone()))),
                })
                .collect::<Result<_, _>>()?,
        };

        let mut registry = NetworkRegistry::from_known(&self.rpc_base_url, &selected)?;
        for (selector, url) in &self.endpoints {
            if !registry.override_url(selector, url.clone()) {
                registry.register(NetworkEndpoint {
                    selector: selector.clone(),
                    name: selector.clone(),
                    chain_id: None,
                    url: url.clone(),
                });
            }
        }
        Ok(registry)
    }

    /// Transport settings for every endpoint.
    #[must_use]
    pub const fn transport(&self) -> TransportConfig {
        TransportConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            rate_limit: self.rate_limit,
        }
    }

    /// Resolves the validator, reading the artifact if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Artifact`] when the
    /// deployless artifact is missing or not valid hex.
    pub fn universal_validator(&self) -> Result<UniversalValidator, ConfigError> {
        match &self.validator {
            ValidatorConfig::Deployed { address } => Ok(UniversalValidator::Deployed(*address)),
            ValidatorConfig::Deployless {
                bytecode_path: None,
            } => Ok(UniversalValidator::default()),
            ValidatorConfig::Deployless {
                bytecode_path: Some(bytecode_path),
            } => {
                let artifact =
                    std::fs::read_to_string(bytecode_path).map_err(|source| ConfigError::Read {
                        path: bytecode_path.clone(),
                        source,
                    })?;
                UniversalValidator::deployless_from_hex(&artifact).map_err(|source| {
                    ConfigError::Artifact {
                        path: bytecode_path.clone(),
                        source,
                    }
                })
            }
        }
    }
}

/// Replaces `$VAR` and `${VAR}` with `lookup(VAR)`. References that do not
/// resolve are kept verbatim.
fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            braced.find('}').map_or(("", 0), |end| (&braced[..end], end + 2))
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };
        let value = if name.is_empty() { None } else { lookup(name) };
        match value {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[pos..=pos + consumed]),
        }
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}
