//! Network configuration for the supported CCIP chains.
//!
//! Static chain metadata ships with the crate (`chains.json`) and can be layered with a
//! user-provided override file. Deploy-time settings (RPC URL, signer accounts) are merged in
//! once, when the [`NetworkRegistry`] is built.

mod explorer;

pub use explorer::{CustomChain, ExplorerConfig, ExplorerUrls};

use std::{collections::BTreeMap, path::Path};

use alloy_core::primitives::Address;
use anyhow::Context;
use derive_more::Deref;
use figment::{
    Figment,
    providers::{Format, Json, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ConfigError;

/// Chain metadata embedded at compile time.
const EMBEDDED_CHAINS: &str = include_str!("chains.json");

/// Public RPC endpoint for Soneium Minato.
pub const SONEIUM_MINATO_RPC_URL: &str = "https://rpc.minato.soneium.org";
/// Public RPC endpoint for Soneium, used when no override is provided.
pub const SONEIUM_RPC_URL: &str = "https://rpc.soneium.org";

/// Chains the deployment tooling knows about.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum Chain {
    SoneiumMinato,
    Soneium,
}

/// Immutable per-chain metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// EVM chain id.
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// CCIP chain selector.
    pub chain_selector: String,
    /// CCIP router.
    #[serde(default)]
    pub router: Option<Address>,
    /// Risk management network proxy.
    #[serde(default)]
    pub rmn_proxy: Option<Address>,
    #[serde(default)]
    pub token_admin_registry: Option<Address>,
    #[serde(default)]
    pub registry_module_owner_custom: Option<Address>,
    /// LINK token.
    #[serde(default)]
    pub link: Option<Address>,
    /// Number of blocks to wait for after each transaction.
    #[serde(default)]
    pub confirmations: Option<u64>,
    pub native_currency_symbol: String,
}

/// The chain metadata of every supported chain, keyed by chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Deref)]
pub struct ChainConfigs(BTreeMap<Chain, ChainConfig>);

impl ChainConfigs {
    /// Load the embedded chain metadata.
    pub fn embedded() -> anyhow::Result<Self> {
        Self::extract(Figment::new().merge(Json::string(EMBEDDED_CHAINS)))
    }

    /// Load the embedded chain metadata, layered with an optional override file.
    ///
    /// Files ending in `.json` are read as JSON, anything else as TOML. Values in the override
    /// file take precedence, key by key.
    pub fn load(override_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Json::string(EMBEDDED_CHAINS));

        if let Some(path) = override_path {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }

            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };

            tracing::debug!(path = %path.display(), "Layering chain configuration override");
        }

        Self::extract(figment)
    }

    /// Parse chain metadata from a JSON document, without the embedded defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Self::extract(Figment::new().merge(Json::string(json)))
    }

    fn extract(figment: Figment) -> anyhow::Result<Self> {
        let chains: BTreeMap<Chain, ChainConfig> = figment
            .extract()
            .context("Failed to parse chain configuration")?;
        Ok(Self(chains))
    }
}

/// Secrets and endpoint overrides read from the environment at start-up.
///
/// Credentials are passed through as-is: their format is checked only when a signer is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    /// First signer private key (`PRIVATE_KEY`).
    pub private_key: Option<String>,
    /// Second signer private key (`PRIVATE_KEY_2`).
    pub private_key_2: Option<String>,
    /// RPC override for Soneium (`SONEIUM_RPC_URL`).
    pub soneium_rpc_url: Option<String>,
}

impl Secrets {
    /// The ordered signer accounts: `PRIVATE_KEY` first, then `PRIVATE_KEY_2`.
    pub fn accounts(&self) -> Vec<String> {
        [&self.private_key, &self.private_key_2]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }
}

/// Chain metadata extended with everything needed to send transactions.
#[derive(Debug, Clone, PartialEq, Eq, Deref)]
pub struct NetworkConfig {
    /// The chain this configuration belongs to.
    pub chain: Chain,
    #[deref]
    pub config: ChainConfig,
    /// JSON-RPC endpoint.
    pub url: Url,
    /// Fixed gas price in wei, instead of the node's estimate.
    pub gas_price: Option<u128>,
    /// Starting nonce, instead of the signer's pending nonce.
    pub nonce: Option<u64>,
    /// Signer private keys, in order of preference. May be empty.
    pub accounts: Vec<String>,
}

/// CCIP addresses and confirmation depth a deployment cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcipTargets {
    pub router: Address,
    pub rmn_proxy: Address,
    pub confirmations: u64,
}

impl NetworkConfig {
    /// Check that the router, the RMN proxy and the confirmation count are all defined.
    pub fn ccip_targets(&self) -> Result<CcipTargets, ConfigError> {
        let (Some(router), Some(rmn_proxy)) = (self.router, self.rmn_proxy) else {
            return Err(ConfigError::MissingRouterOrRmnProxy {
                network: self.chain,
            });
        };

        let confirmations = self
            .confirmations
            .ok_or(ConfigError::MissingConfirmations {
                network: self.chain,
            })?;

        Ok(CcipTargets {
            router,
            rmn_proxy,
            confirmations,
        })
    }

    fn default_rpc_url(chain: Chain, secrets: &Secrets) -> String {
        match chain {
            Chain::SoneiumMinato => SONEIUM_MINATO_RPC_URL.to_string(),
            Chain::Soneium => secrets
                .soneium_rpc_url
                .clone()
                .unwrap_or_else(|| SONEIUM_RPC_URL.to_string()),
        }
    }
}

/// Registry of every configured network, built once per process.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    /// A network whose settings are invalid keeps its error, raised when it is resolved.
    networks: BTreeMap<Chain, Result<NetworkConfig, ConfigError>>,
    explorer: ExplorerConfig,
}

impl NetworkRegistry {
    /// Merge the chain metadata with the environment-derived secrets.
    pub fn new(chains: ChainConfigs, secrets: &Secrets) -> Self {
        let accounts = secrets.accounts();

        let networks = chains
            .0
            .into_iter()
            .map(|(chain, config)| {
                let raw_url = NetworkConfig::default_rpc_url(chain, secrets);
                let network = match Url::parse(&raw_url) {
                    Ok(url) => Ok(NetworkConfig {
                        chain,
                        config,
                        url,
                        gas_price: None,
                        nonce: None,
                        accounts: accounts.clone(),
                    }),
                    Err(err) => {
                        tracing::warn!(network = %chain, url = %raw_url, error = %err, "Invalid RPC URL");
                        Err(ConfigError::InvalidRpcUrl {
                            network: chain,
                            url: raw_url,
                        })
                    }
                };
                (chain, network)
            })
            .collect();

        Self {
            networks,
            explorer: ExplorerConfig::default(),
        }
    }

    /// Replace the block explorer settings.
    pub fn with_explorer(mut self, explorer: ExplorerConfig) -> Self {
        self.explorer = explorer;
        self
    }

    /// Look up the network configuration for a chain name.
    pub fn resolve(&self, name: &str) -> Result<&NetworkConfig, ConfigError> {
        let network = name
            .parse::<Chain>()
            .ok()
            .and_then(|chain| self.networks.get(&chain))
            .ok_or_else(|| ConfigError::NetworkNotFound {
                network: name.to_string(),
            })?;

        network.as_ref().map_err(|err| err.clone())
    }

    /// All usable networks, ordered by chain.
    pub fn networks(&self) -> impl Iterator<Item = &NetworkConfig> {
        self.networks.values().filter_map(|network| network.as_ref().ok())
    }

    pub fn explorer(&self) -> &ExplorerConfig {
        &self.explorer
    }
}
