//! astar-ccip deploys the Astar token, its proxy and a CCIP token pool on Soneium.

mod cli;

use anyhow::{Context, Result};
use astar_ccip_deploy::{
    ChainConfigs, DeployTaskArgs, DeploymentReport, EtherscanVerifier, HardhatArtifacts,
    NetworkRegistry, RpcChainClient, deploy_token_and_pool,
};
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let chains = ChainConfigs::load(cli.config.as_deref())?;
    let registry = NetworkRegistry::new(chains, &cli.secrets.into());

    match cli.command {
        Command::Networks => print_networks(&registry),
        Command::DeployTokenAndPool(args) => {
            let network = cli
                .network
                .context("No network selected, pass --network or set ASTAR_CCIP_NETWORK")?;
            let artifacts = HardhatArtifacts::new(cli.artifacts);

            let report = deploy(&registry, &network, &args.into(), artifacts).await?;
            log_report(&registry, &report);
        }
    }

    Ok(())
}

async fn deploy(
    registry: &NetworkRegistry,
    network: &str,
    args: &DeployTaskArgs,
    artifacts: HardhatArtifacts,
) -> Result<DeploymentReport> {
    let chain = registry.resolve(network)?.chain;
    let verifier = EtherscanVerifier::new(registry.explorer(), chain, artifacts.clone())?;

    tracing::info!(
        network = %chain,
        artifacts = %artifacts.root().display(),
        pool_type = %args.pool_type,
        token = %args.token,
        verify = args.verify_contract,
        "Starting deployment..."
    );

    deploy_token_and_pool(
        registry,
        network,
        args,
        |network| RpcChainClient::connect(network, artifacts),
        &verifier,
    )
    .await
}

fn log_report(registry: &NetworkRegistry, report: &DeploymentReport) {
    for record in &report.records {
        let explorer_url = registry
            .explorer()
            .address_url(report.network, record.address)
            .unwrap_or_default();

        tracing::info!(
            contract = %record.display_name,
            address = %record.address,
            explorer = %explorer_url,
            "Deployed"
        );
    }

    tracing::info!(
        network = %report.network,
        token = %report.token,
        proxy = %report.proxy,
        pool = %report.pool,
        pool_type = %report.pool_type,
        roles_granted = report.roles_granted,
        "Deployment complete"
    );
}

fn print_networks(registry: &NetworkRegistry) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Network",
        "Chain ID",
        "Chain selector",
        "Router",
        "Confirmations",
        "RPC URL",
        "Signers",
    ]);

    let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

    for network in registry.networks() {
        table.add_row(vec![
            network.chain.to_string(),
            or_dash(network.chain_id.map(|id| id.to_string())),
            network.chain_selector.clone(),
            or_dash(network.router.map(|router| router.to_string())),
            or_dash(network.confirmations.map(|c| c.to_string())),
            network.url.to_string(),
            network.accounts.len().to_string(),
        ]);
    }

    println!("{table}");
}
