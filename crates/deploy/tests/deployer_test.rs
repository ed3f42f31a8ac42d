//! Deployment sequence tests against an in-memory chain.
//!
//! The mock chain records every call so the tests can assert on the exact transactions a run
//! submits, in order.

use std::sync::{Arc, Mutex};

use alloy_core::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes, TxHash},
};
use anyhow::Result;
use astar_ccip_deploy::{
    Chain, ChainClient, ChainConfigs, ConfigError, ContractVerifier, DeployTaskArgs,
    DeploymentRecord, NetworkConfig, NetworkRegistry, PoolType, Secrets, TokenContract, TxReceipt,
    VerificationError, VerificationOutcome, contracts::encode_initialize, deploy_token_and_pool,
};

const SIGNER: Address = Address::repeat_byte(0x5e);

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Deploy {
        contract: String,
        args: Vec<DynSolValue>,
    },
    Send {
        to: Address,
        calldata: Bytes,
    },
    Wait {
        tx_hash: TxHash,
        confirmations: u64,
    },
}

#[derive(Default)]
struct ChainState {
    calls: Vec<Call>,
    /// Deployment transactions, mapped to the address they create.
    deployments: Vec<(TxHash, Address)>,
    next_id: u8,
}

/// In-memory chain: every transaction is mined immediately.
#[derive(Clone, Default)]
struct MockChain {
    state: Arc<Mutex<ChainState>>,
    /// Fail the deployment of this artifact.
    fail_deploy: Option<String>,
}

impl MockChain {
    fn failing_deploy(contract: &str) -> Self {
        Self {
            fail_deploy: Some(contract.to_string()),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    fn deployed(&self) -> Vec<(String, Vec<DynSolValue>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Deploy { contract, args } => Some((contract, args)),
                _ => None,
            })
            .collect()
    }

    fn sends(&self) -> Vec<(Address, Bytes)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send { to, calldata } => Some((to, calldata)),
                _ => None,
            })
            .collect()
    }

    fn waits(&self) -> Vec<(TxHash, u64)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Wait {
                    tx_hash,
                    confirmations,
                } => Some((tx_hash, confirmations)),
                _ => None,
            })
            .collect()
    }

    /// Waits on deployment transactions only.
    fn deployment_waits(&self) -> usize {
        let state = self.state.lock().unwrap();
        state
            .calls
            .iter()
            .filter(|call| match call {
                Call::Wait { tx_hash, .. } => {
                    state.deployments.iter().any(|(hash, _)| hash == tx_hash)
                }
                _ => false,
            })
            .count()
    }

    fn next_tx(state: &mut ChainState) -> TxHash {
        state.next_id += 1;
        TxHash::with_last_byte(state.next_id)
    }
}

impl ChainClient for MockChain {
    fn signer_address(&self) -> Address {
        SIGNER
    }

    async fn deploy(&self, contract: &str, constructor_args: &[DynSolValue]) -> Result<TxHash> {
        if self.fail_deploy.as_deref() == Some(contract) {
            anyhow::bail!("insufficient funds for gas");
        }

        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Deploy {
            contract: contract.to_string(),
            args: constructor_args.to_vec(),
        });

        let tx_hash = Self::next_tx(&mut state);
        let address = Address::with_last_byte(0xa0 + state.next_id);
        state.deployments.push((tx_hash, address));
        Ok(tx_hash)
    }

    async fn send(&self, to: Address, calldata: Bytes) -> Result<TxHash> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Send { to, calldata });
        Ok(Self::next_tx(&mut state))
    }

    async fn wait_for_confirmations(&self, tx_hash: TxHash, confirmations: u64) -> Result<TxReceipt> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Wait {
            tx_hash,
            confirmations,
        });

        let contract_address = state
            .deployments
            .iter()
            .find(|(hash, _)| *hash == tx_hash)
            .map(|(_, address)| *address);

        Ok(TxReceipt {
            tx_hash,
            block_number: Some(100),
            contract_address,
        })
    }
}

/// Records every verification request and answers with a fixed outcome.
#[derive(Clone, Default)]
struct MockVerifier {
    verified: Arc<Mutex<Vec<String>>>,
    reject_with: Option<String>,
}

impl MockVerifier {
    fn rejecting(message: &str) -> Self {
        Self {
            reject_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn verified(&self) -> Vec<String> {
        self.verified.lock().unwrap().clone()
    }
}

impl ContractVerifier for MockVerifier {
    async fn verify(&self, record: &DeploymentRecord) -> Result<(), VerificationError> {
        self.verified.lock().unwrap().push(record.display_name.clone());

        match &self.reject_with {
            Some(message) => Err(VerificationError::Rejected {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Initialize tracing for tests (idempotent).
fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Both chains with test CCIP addresses.
const CHAINS: &str = r#"{
    "soneiumMinato": {
        "chainId": 1946,
        "chainSelector": "686603546605904534",
        "router": "0x00000000000000000000000000000000000000b1",
        "rmnProxy": "0x00000000000000000000000000000000000000b2",
        "confirmations": 1,
        "nativeCurrencySymbol": "ETH"
    },
    "soneium": {
        "chainId": 1868,
        "chainSelector": "12505351618335765396",
        "router": "0x00000000000000000000000000000000000000c1",
        "rmnProxy": "0x00000000000000000000000000000000000000c2",
        "confirmations": 2,
        "nativeCurrencySymbol": "ETH"
    }
}"#;

fn secrets() -> Secrets {
    Secrets {
        private_key: Some("0x01".to_string()),
        ..Default::default()
    }
}

fn registry() -> NetworkRegistry {
    NetworkRegistry::new(ChainConfigs::from_json(CHAINS).unwrap(), &secrets())
}

fn soneium() -> NetworkConfig {
    registry().resolve("soneium").unwrap().clone()
}

async fn run(
    network: &str,
    args: &DeployTaskArgs,
    chain: &MockChain,
    verifier: &MockVerifier,
) -> Result<astar_ccip_deploy::DeploymentReport> {
    init_test_tracing();

    let chain = chain.clone();
    deploy_token_and_pool(&registry(), network, args, move |_| Ok(chain), verifier).await
}

#[tokio::test]
async fn test_burn_mint_without_verification() {
    let chain = MockChain::default();
    let verifier = MockVerifier::default();
    let network = soneium();
    let confirmations = network.confirmations.unwrap();

    let report = run("soneium", &DeployTaskArgs::default(), &chain, &verifier)
        .await
        .unwrap();

    let deployed = chain.deployed();
    assert_eq!(
        deployed.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
        vec!["AstarToken", "ERC1967Proxy", "BurnMintTokenPool"]
    );

    // Token has no constructor arguments, the proxy binds the token to the initializer.
    assert!(deployed[0].1.is_empty());
    assert_eq!(
        deployed[1].1,
        vec![
            DynSolValue::Address(report.token),
            DynSolValue::Bytes(encode_initialize(SIGNER).to_vec()),
        ]
    );

    // Burn/mint pool: (token, allowlist, rmnProxy, router).
    assert_eq!(
        deployed[2].1,
        vec![
            DynSolValue::Address(report.proxy),
            DynSolValue::Array(vec![]),
            DynSolValue::Address(network.rmn_proxy.unwrap()),
            DynSolValue::Address(network.router.unwrap()),
        ]
    );

    // Three deployment waits plus the wait on the role grant.
    assert_eq!(chain.deployment_waits(), 3);
    assert_eq!(chain.waits().len(), 4);
    assert!(chain.waits().iter().all(|(_, c)| *c == confirmations));

    // One role grant, sent to the proxy, for the pool.
    let sends = chain.sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].0, report.proxy);
    assert_eq!(&sends[0].1[4..], report.pool.into_word().as_slice());

    assert!(verifier.verified().is_empty());
    assert!(report.verification.is_empty());
    assert!(report.roles_granted);
    assert_eq!(report.pool_type, PoolType::BurnMint);
    assert_eq!(report.network, Chain::Soneium);
}

#[tokio::test]
async fn test_lock_release_with_verification() {
    let chain = MockChain::default();
    let verifier = MockVerifier::default();
    let network = soneium();

    let args = DeployTaskArgs {
        verify_contract: true,
        pool_type: "lockRelease".to_string(),
        accept_liquidity: Some(true),
        ..Default::default()
    };

    let report = run("soneium", &args, &chain, &verifier).await.unwrap();

    let deployed = chain.deployed();
    assert_eq!(deployed[2].0, "LockReleaseTokenPool");
    assert_eq!(
        deployed[2].1,
        vec![
            DynSolValue::Address(report.proxy),
            DynSolValue::Array(vec![]),
            DynSolValue::Address(network.rmn_proxy.unwrap()),
            DynSolValue::Bool(true),
            DynSolValue::Address(network.router.unwrap()),
        ]
    );

    // No role wiring for lock/release pools.
    assert!(chain.sends().is_empty());
    assert_eq!(chain.waits().len(), 3);
    assert!(!report.roles_granted);

    assert_eq!(
        verifier.verified(),
        vec!["AstarToken", "ERC1967Proxy", "lockReleaseTokenPool"]
    );
    assert_eq!(report.verification, vec![VerificationOutcome::Verified; 3]);

    // Records carry what the verifier needs.
    assert_eq!(report.records[2].contract, "LockReleaseTokenPool");
    assert_eq!(report.records[2].constructor_args, deployed[2].1);
    assert_eq!(report.records[1].constructor_args, deployed[1].1);
}

#[tokio::test]
async fn test_lock_release_defaults_to_no_liquidity() {
    let chain = MockChain::default();
    let args = DeployTaskArgs {
        pool_type: "lockRelease".to_string(),
        ..Default::default()
    };

    run("soneium", &args, &chain, &MockVerifier::default())
        .await
        .unwrap();

    let pool_args = &chain.deployed()[2].1;
    assert_eq!(pool_args.len(), 5);
    assert_eq!(pool_args[3], DynSolValue::Bool(false));
}

#[tokio::test]
async fn test_burn_mint_ignores_accept_liquidity() {
    let chain = MockChain::default();
    let args = DeployTaskArgs {
        accept_liquidity: Some(true),
        ..Default::default()
    };

    run("soneium", &args, &chain, &MockVerifier::default())
        .await
        .unwrap();

    let pool_args = &chain.deployed()[2].1;
    assert_eq!(pool_args.len(), 4);
    assert!(!pool_args.contains(&DynSolValue::Bool(true)));
}

#[tokio::test]
async fn test_unknown_network_submits_nothing() {
    let chain = MockChain::default();
    let verifier = MockVerifier::default();

    let err = run("unknownChain", &DeployTaskArgs::default(), &chain, &verifier)
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::NetworkNotFound {
            network: "unknownChain".to_string()
        })
    );
    assert!(chain.calls().is_empty());
    assert!(verifier.verified().is_empty());
}

#[tokio::test]
async fn test_invalid_pool_type_submits_nothing() {
    let chain = MockChain::default();
    let args = DeployTaskArgs {
        pool_type: "burnAndMint".to_string(),
        verify_contract: true,
        ..Default::default()
    };

    let err = run("soneium", &args, &chain, &MockVerifier::default())
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::InvalidPoolType {
            pool_type: "burnAndMint".to_string()
        })
    );
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn test_missing_router_submits_nothing() {
    let chains = ChainConfigs::from_json(
        r#"{
            "soneium": {
                "chainSelector": "12505351618335765396",
                "rmnProxy": "0x0000000000000000000000000000000000000002",
                "tokenAdminRegistry": "0x0000000000000000000000000000000000000003",
                "registryModuleOwnerCustom": "0x0000000000000000000000000000000000000004",
                "link": "0x0000000000000000000000000000000000000005",
                "confirmations": 1,
                "nativeCurrencySymbol": "ETH"
            }
        }"#,
    )
    .unwrap();
    let registry = NetworkRegistry::new(chains, &Secrets::default());

    let chain = MockChain::default();
    let connect_chain = chain.clone();
    let err = deploy_token_and_pool(
        &registry,
        "soneium",
        &DeployTaskArgs::default(),
        move |_| Ok(connect_chain),
        &MockVerifier::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::MissingRouterOrRmnProxy {
            network: Chain::Soneium
        })
    );
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn test_deploy_checks_confirmations_before_any_transaction() {
    let mut network = soneium();
    network.config.confirmations = None;

    let deployer = astar_ccip_deploy::Deployer::from_args(&DeployTaskArgs::default()).unwrap();
    let chain = MockChain::default();

    let err = deployer
        .deploy(&network, &chain, &MockVerifier::default())
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::MissingConfirmations {
            network: Chain::Soneium
        })
    );
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn test_failed_deployment_is_wrapped_and_stops() {
    let chain = MockChain::failing_deploy("BurnMintTokenPool");
    let verifier = MockVerifier::default();
    let args = DeployTaskArgs {
        verify_contract: true,
        ..Default::default()
    };

    let err = run("soneium", &args, &chain, &verifier).await.unwrap_err();

    assert_eq!(err.to_string(), "Error with deploying contracts");
    assert!(format!("{:#}", err).contains("insufficient funds for gas"));

    // Token and proxy stay deployed, nothing after the pool runs.
    assert_eq!(chain.deployed().len(), 2);
    assert!(chain.sends().is_empty());
    assert!(verifier.verified().is_empty());
}

#[tokio::test]
async fn test_verification_failures_do_not_fail_the_run() {
    let chain = MockChain::default();
    let verifier = MockVerifier::rejecting("Fail - Unable to verify");
    let args = DeployTaskArgs {
        verify_contract: true,
        ..Default::default()
    };

    let report = run("soneium", &args, &chain, &verifier).await.unwrap();

    assert_eq!(verifier.verified().len(), 3);
    assert_eq!(report.verification, vec![VerificationOutcome::Failed; 3]);
}

#[tokio::test]
async fn test_already_verified_is_not_a_failure() {
    let chain = MockChain::default();
    let verifier = MockVerifier::rejecting("Already Verified");
    let args = DeployTaskArgs {
        verify_contract: true,
        ..Default::default()
    };

    let report = run("soneium", &args, &chain, &verifier).await.unwrap();

    assert_eq!(
        verifier.verified(),
        vec!["AstarToken", "ERC1967Proxy", "burnMintTokenPool"]
    );
    assert_eq!(report.verification, vec![VerificationOutcome::AlreadyVerified; 3]);
}

#[tokio::test]
async fn test_shibuya_token() {
    let chain = MockChain::default();
    let verifier = MockVerifier::default();
    let args = DeployTaskArgs {
        token: TokenContract::ShibuyaToken,
        verify_contract: true,
        ..Default::default()
    };

    run("soneiumMinato", &args, &chain, &verifier).await.unwrap();

    assert_eq!(chain.deployed()[0].0, "ShibuyaToken");
    assert_eq!(verifier.verified()[0], "ShibuyaToken");
}

#[tokio::test]
async fn test_embedded_chains_submit_nothing_without_ccip_addresses() {
    let registry = NetworkRegistry::new(ChainConfigs::embedded().unwrap(), &secrets());
    let chain = MockChain::default();
    let connect_chain = chain.clone();

    let err = deploy_token_and_pool(
        &registry,
        "soneium",
        &DeployTaskArgs::default(),
        move |_| Ok(connect_chain),
        &MockVerifier::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::MissingRouterOrRmnProxy {
            network: Chain::Soneium
        })
    );
    assert!(chain.calls().is_empty());
}
