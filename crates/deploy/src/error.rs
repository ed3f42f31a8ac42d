//! Fatal configuration errors.

use derive_more::{Display, Error};

use crate::Chain;

/// A configuration problem detected before (or instead of) touching the chain.
///
/// These are never retried: the operator has to fix the configuration and run again.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ConfigError {
    #[display("Network {network} not found in config")]
    NetworkNotFound { network: String },

    #[display("Router or RMN Proxy not defined for {network}")]
    MissingRouterOrRmnProxy { network: Chain },

    #[display("confirmations is not defined for {network}")]
    MissingConfirmations { network: Chain },

    #[display("Invalid poolType: {pool_type}")]
    InvalidPoolType { pool_type: String },

    #[display("No signer account configured for {network}, set PRIVATE_KEY")]
    MissingSigner { network: Chain },

    #[display("Invalid RPC URL for {network}: {url}")]
    InvalidRpcUrl { network: Chain, url: String },
}
