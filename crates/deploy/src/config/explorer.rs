//! Block explorer settings used for source verification.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Chain;

/// API and browser endpoints of an Etherscan-compatible explorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerUrls {
    #[serde(rename = "apiURL")]
    pub api_url: String,
    #[serde(rename = "browserURL")]
    pub browser_url: String,
}

/// An explorer for a chain that verification services do not know natively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomChain {
    pub network: Chain,
    pub chain_id: u64,
    pub urls: ExplorerUrls,
}

/// Explorer API keys and custom chain endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerConfig {
    pub api_key: BTreeMap<Chain, String>,
    pub custom_chains: Vec<CustomChain>,
}

impl ExplorerConfig {
    /// The API key and endpoints to use for a chain, if one is configured.
    pub fn for_chain(&self, chain: Chain) -> Option<(&str, &CustomChain)> {
        let custom_chain = self.custom_chains.iter().find(|c| c.network == chain)?;
        let api_key = self.api_key.get(&chain).map(String::as_str).unwrap_or_default();
        Some((api_key, custom_chain))
    }

    /// Explorer page of a deployed contract.
    pub fn address_url(&self, chain: Chain, address: impl std::fmt::Display) -> Option<String> {
        self.for_chain(chain).map(|(_, custom)| {
            format!(
                "{}/address/{}",
                custom.urls.browser_url.trim_end_matches('/'),
                address
            )
        })
    }
}

impl Default for ExplorerConfig {
    /// Blockscout instances for both Soneium networks. Blockscout ignores the API key.
    fn default() -> Self {
        Self {
            api_key: BTreeMap::from([
                (Chain::SoneiumMinato, " ".to_string()),
                (Chain::Soneium, " ".to_string()),
            ]),
            custom_chains: vec![
                CustomChain {
                    network: Chain::SoneiumMinato,
                    chain_id: 1946,
                    urls: ExplorerUrls {
                        api_url: "https://soneium-minato.blockscout.com/api".to_string(),
                        browser_url: "https://soneium-minato.blockscout.com".to_string(),
                    },
                },
                CustomChain {
                    network: Chain::Soneium,
                    chain_id: 1868,
                    urls: ExplorerUrls {
                        api_url: "https://soneium.blockscout.com/api".to_string(),
                        browser_url: "https://soneium.blockscout.com".to_string(),
                    },
                },
            ],
        }
    }
}
