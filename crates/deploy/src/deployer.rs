//! Token, proxy and token pool deployment.
//!
//! The deployment runs a fixed sequence of stages:
//! resolve -> deploy-token -> deploy-proxy -> deploy-pool -> wire-roles -> verify.
//! Each stage needs the address produced by the previous one, so they run one after the other.
//! Nothing is persisted: a failed run leaves the already confirmed contracts on chain and a new
//! run deploys fresh instances.

use alloy_core::{dyn_abi::DynSolValue, primitives::Address};
use anyhow::{Context, Result};

use crate::{
    CcipTargets, Chain, ChainClient, ConfigError, ContractVerifier, NetworkConfig,
    NetworkRegistry, PROXY_CONTRACT_NAME, PoolConfig, PoolType, TokenContract,
    VerificationOutcome,
    contracts::{encode_grant_mint_and_burn_roles, encode_initialize},
    verify_contract,
};

/// Pool type used when none is given.
pub const DEFAULT_POOL_TYPE: &str = "burnMint";

/// Options of the deployment task, as given by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployTaskArgs {
    /// Verify the deployed contracts on the block explorer.
    pub verify_contract: bool,
    /// `burnMint` or `lockRelease`.
    pub pool_type: String,
    /// Whether a lock/release pool accepts liquidity. Ignored for burn/mint pools.
    pub accept_liquidity: Option<bool>,
    /// Token implementation to deploy behind the proxy.
    pub token: TokenContract,
}

impl Default for DeployTaskArgs {
    fn default() -> Self {
        Self {
            verify_contract: false,
            pool_type: DEFAULT_POOL_TYPE.to_string(),
            accept_liquidity: None,
            token: TokenContract::default(),
        }
    }
}

/// Deployment stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    Resolve,
    DeployToken,
    DeployProxy,
    DeployPool,
    WireRoles,
    Verify,
}

/// A contract deployed during the current run.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRecord {
    /// Artifact name.
    pub contract: String,
    /// Name used in logs.
    pub display_name: String,
    pub address: Address,
    pub constructor_args: Vec<DynSolValue>,
}

/// Everything a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentReport {
    pub network: Chain,
    pub token: Address,
    pub proxy: Address,
    pub pool: Address,
    pub pool_type: PoolType,
    /// Whether the pool was granted the mint and burn roles.
    pub roles_granted: bool,
    /// Token, proxy and pool, in deployment order.
    pub records: Vec<DeploymentRecord>,
    /// One entry per record when verification was requested, empty otherwise.
    pub verification: Vec<VerificationOutcome>,
}

/// Addresses of the contracts deployed by stages 2 to 5.
struct DeployedContracts {
    token: Address,
    proxy: Address,
    pool: Address,
    roles_granted: bool,
    records: Vec<DeploymentRecord>,
}

/// A validated deployment plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployer {
    pub token: TokenContract,
    pub pool: PoolConfig,
    pub verify_contract: bool,
}

impl Deployer {
    /// Validate the task options.
    pub fn from_args(args: &DeployTaskArgs) -> Result<Self, ConfigError> {
        let pool_type = PoolType::parse(&args.pool_type)?;

        Ok(Self {
            token: args.token,
            pool: PoolConfig::new(pool_type, args.accept_liquidity),
            verify_contract: args.verify_contract,
        })
    }

    /// Deploy the token, its proxy and the pool, wire the roles and optionally verify.
    pub async fn deploy<C, V>(
        &self,
        network: &NetworkConfig,
        client: &C,
        verifier: &V,
    ) -> Result<DeploymentReport>
    where
        C: ChainClient,
        V: ContractVerifier,
    {
        let targets = network.ccip_targets()?;

        let deployed = match self.deploy_contracts(network, &targets, client).await {
            Ok(deployed) => deployed,
            Err(err) => {
                tracing::error!(error = ?err, network = %network.chain, "Deployment failed");
                return Err(err.context("Error with deploying contracts"));
            }
        };

        let verification = if self.verify_contract {
            tracing::info!(stage = %Stage::Verify, "Verifying deployed contracts");

            let mut outcomes = Vec::with_capacity(deployed.records.len());
            for record in &deployed.records {
                outcomes.push(verify_contract(verifier, record).await);
            }
            outcomes
        } else {
            tracing::info!("All contracts deployed successfully");
            Vec::new()
        };

        Ok(DeploymentReport {
            network: network.chain,
            token: deployed.token,
            proxy: deployed.proxy,
            pool: deployed.pool,
            pool_type: self.pool.pool_type(),
            roles_granted: deployed.roles_granted,
            records: deployed.records,
            verification,
        })
    }

    async fn deploy_contracts<C: ChainClient>(
        &self,
        network: &NetworkConfig,
        targets: &CcipTargets,
        client: &C,
    ) -> Result<DeployedContracts> {
        let confirmations = targets.confirmations;

        // Token implementation.
        tracing::info!(stage = %Stage::DeployToken, token = %self.token, "Deploying token");
        let token_name = self.token.to_string();
        let token = deploy_and_confirm(client, &token_name, &[], confirmations).await?;
        tracing::info!("Token deployed to: {}", token);

        // Proxy, initialized with the signer as admin.
        tracing::info!(stage = %Stage::DeployProxy, implementation = %token, "Deploying proxy");
        let initialize_data = encode_initialize(client.signer_address());
        let proxy_args = vec![
            DynSolValue::Address(token),
            DynSolValue::Bytes(initialize_data.to_vec()),
        ];
        let proxy = deploy_and_confirm(client, PROXY_CONTRACT_NAME, &proxy_args, confirmations)
            .await?;
        tracing::info!("Proxy deployed to: {}", proxy);

        // Token pool.
        let pool_type = self.pool.pool_type();
        tracing::info!(stage = %Stage::DeployPool, pool_type = %pool_type, "Deploying token pool");
        let pool_args = self
            .pool
            .constructor_args(proxy, targets.rmn_proxy, targets.router);

        let confirmations = pool_confirmations(network)?;

        let pool_contract = pool_type.contract().to_string();
        let pool = deploy_and_confirm(client, &pool_contract, &pool_args, confirmations).await?;
        tracing::info!("Token pool deployed to: {}", pool);

        // Roles.
        let roles_granted = self.pool.needs_mint_and_burn_roles();
        if roles_granted {
            tracing::info!(stage = %Stage::WireRoles, "Granting mint and burn roles to {} on token {}", pool, token);

            let tx_hash = client
                .send(proxy, encode_grant_mint_and_burn_roles(pool))
                .await
                .context("Failed to grant mint and burn roles")?;
            client
                .wait_for_confirmations(tx_hash, confirmations)
                .await
                .context("Failed to confirm the role grant")?;

            tracing::info!("Mint and burn roles granted to {}", pool);
        }

        let records = vec![
            DeploymentRecord {
                contract: token_name.clone(),
                display_name: token_name,
                address: token,
                constructor_args: vec![],
            },
            DeploymentRecord {
                contract: PROXY_CONTRACT_NAME.to_string(),
                display_name: PROXY_CONTRACT_NAME.to_string(),
                address: proxy,
                constructor_args: proxy_args,
            },
            DeploymentRecord {
                contract: pool_contract,
                display_name: pool_type.display_name(),
                address: pool,
                constructor_args: pool_args,
            },
        ];

        Ok(DeployedContracts {
            token,
            proxy,
            pool,
            roles_granted,
            records,
        })
    }
}

/// Confirmations the pool and role transactions wait for, read again from the network.
fn pool_confirmations(network: &NetworkConfig) -> Result<u64, ConfigError> {
    network
        .confirmations
        .ok_or(ConfigError::MissingConfirmations {
            network: network.chain,
        })
}

/// Deploy a contract and wait for the configured number of confirmations.
async fn deploy_and_confirm<C: ChainClient>(
    client: &C,
    contract: &str,
    constructor_args: &[DynSolValue],
    confirmations: u64,
) -> Result<Address> {
    let tx_hash = client
        .deploy(contract, constructor_args)
        .await
        .with_context(|| format!("Failed to deploy {}", contract))?;

    tracing::info!(
        "Waiting {} blocks for transaction {} to be confirmed...",
        confirmations,
        tx_hash
    );

    let receipt = client
        .wait_for_confirmations(tx_hash, confirmations)
        .await
        .with_context(|| format!("Failed to confirm the deployment of {}", contract))?;

    receipt
        .contract_address
        .with_context(|| format!("No contract address in the receipt of {}", tx_hash))
}

/// Run the deployment task against a network of the registry.
///
/// The network is resolved and the options validated before `connect` is called, so a
/// configuration error never submits a transaction.
pub async fn deploy_token_and_pool<C, F, V>(
    registry: &NetworkRegistry,
    network_name: &str,
    args: &DeployTaskArgs,
    connect: F,
    verifier: &V,
) -> Result<DeploymentReport>
where
    C: ChainClient,
    F: FnOnce(&NetworkConfig) -> Result<C>,
    V: ContractVerifier,
{
    tracing::info!(stage = %Stage::Resolve, network = %network_name, "Resolving network configuration");

    let network = registry.resolve(network_name)?;
    let targets = network.ccip_targets()?;
    let deployer = Deployer::from_args(args)?;

    tracing::debug!(
        network = %network.chain,
        router = %targets.router,
        rmn_proxy = %targets.rmn_proxy,
        confirmations = targets.confirmations,
        pool = ?deployer.pool,
        "Network resolved"
    );

    let client = connect(network)?;

    deployer.deploy(network, &client, verifier).await
}
