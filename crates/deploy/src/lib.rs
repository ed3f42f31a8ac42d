//! astar-ccip-deploy - Deployment library for CCIP cross-chain tokens and token pools.
//!
//! This crate deploys an upgradeable token behind an `ERC1967Proxy`, deploys a CCIP token pool
//! for it, grants the pool the roles it needs and optionally verifies the sources on a block
//! explorer.

mod artifacts;
mod chain;
mod config;
pub mod contracts;
mod deployer;
mod error;
mod rpc;
mod verify;

pub use artifacts::{Artifact, BuildInfo, HardhatArtifacts};
pub use chain::{ChainClient, TxReceipt};
pub use config::{
    CcipTargets, Chain, ChainConfig, ChainConfigs, CustomChain, ExplorerConfig, ExplorerUrls,
    NetworkConfig, NetworkRegistry, SONEIUM_MINATO_RPC_URL, SONEIUM_RPC_URL, Secrets,
};
pub use contracts::{PROXY_CONTRACT_NAME, PoolConfig, PoolType, TokenContract, TokenPoolContract};
pub use deployer::{
    DEFAULT_POOL_TYPE, DeployTaskArgs, Deployer, DeploymentRecord, DeploymentReport, Stage,
    deploy_token_and_pool,
};
pub use error::ConfigError;
pub use rpc::RpcChainClient;
pub use verify::{
    ContractVerifier, EtherscanVerifier, VerificationError, VerificationOutcome, verify_contract,
};
