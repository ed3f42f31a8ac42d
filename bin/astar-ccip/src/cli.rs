use std::path::PathBuf;

use astar_ccip_deploy::{DEFAULT_POOL_TYPE, DeployTaskArgs, Secrets, TokenContract};
use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "astar-ccip")]
#[command(
    author,
    version,
    about = "Deploy the Astar token and its CCIP token pool on Soneium"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "ASTAR_CCIP_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// The network to deploy to (`soneiumMinato` or `soneium`).
    #[arg(short, long, global = true, env = "ASTAR_CCIP_NETWORK")]
    pub network: Option<String>,

    /// Path to a chain configuration file layered over the built-in one.
    ///
    /// `.json` files are read as JSON, anything else as TOML.
    #[arg(long, alias = "conf", global = true, env = "ASTAR_CCIP_CONFIG")]
    pub config: Option<PathBuf>,

    /// The Hardhat artifacts directory holding the compiled contracts.
    #[arg(long, global = true, env = "ASTAR_CCIP_ARTIFACTS", default_value = "artifacts")]
    pub artifacts: PathBuf,

    #[clap(flatten)]
    pub secrets: SecretArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Signer keys and endpoint overrides, only ever read from the environment.
#[derive(Debug, Clone, Args)]
pub struct SecretArgs {
    #[arg(long, env = "PRIVATE_KEY", hide = true, hide_env_values = true)]
    pub private_key: Option<String>,

    #[arg(long, env = "PRIVATE_KEY_2", hide = true, hide_env_values = true)]
    pub private_key_2: Option<String>,

    #[arg(long, env = "SONEIUM_RPC_URL", hide = true, hide_env_values = true)]
    pub soneium_rpc_url: Option<String>,
}

impl From<SecretArgs> for Secrets {
    fn from(args: SecretArgs) -> Self {
        Self {
            private_key: args.private_key,
            private_key_2: args.private_key_2,
            soneium_rpc_url: args.soneium_rpc_url,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Deploy the token, its ERC1967 proxy and a token pool.
    DeployTokenAndPool(DeployTokenAndPoolArgs),

    /// List the configured networks.
    Networks,
}

#[derive(Debug, Clone, Args)]
pub struct DeployTokenAndPoolArgs {
    /// Verify the deployed contracts on the block explorer.
    #[arg(long = "verifycontract", env = "ASTAR_CCIP_VERIFY_CONTRACT", default_value_t = false)]
    pub verify_contract: bool,

    /// The token pool type (`burnMint` or `lockRelease`).
    #[arg(long = "pooltype", env = "ASTAR_CCIP_POOL_TYPE", default_value = DEFAULT_POOL_TYPE)]
    pub pool_type: String,

    /// Whether a lock/release pool accepts liquidity.
    #[arg(long = "acceptliquidity", env = "ASTAR_CCIP_ACCEPT_LIQUIDITY", default_value_t = false)]
    pub accept_liquidity: bool,

    /// The token implementation deployed behind the proxy.
    #[arg(long, env = "ASTAR_CCIP_TOKEN", default_value_t = TokenContract::AstarToken)]
    pub token: TokenContract,
}

impl From<DeployTokenAndPoolArgs> for DeployTaskArgs {
    fn from(args: DeployTokenAndPoolArgs) -> Self {
        Self {
            verify_contract: args.verify_contract,
            pool_type: args.pool_type,
            accept_liquidity: Some(args.accept_liquidity),
            token: args.token,
        }
    }
}
