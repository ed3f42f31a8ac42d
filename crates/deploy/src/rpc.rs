//! [`ChainClient`] backed by a JSON-RPC endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy::{
    network::{EthereumWallet, ReceiptResponse, TransactionBuilder},
    providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
};
use alloy_core::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes, TxHash},
};
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};

use crate::{
    ChainClient, ConfigError, HardhatArtifacts, NetworkConfig, TxReceipt,
    contracts::encode_constructor_args,
};

/// Signs with the first configured account and sends through the network's RPC URL.
pub struct RpcChainClient {
    provider: DynProvider,
    signer: Address,
    artifacts: HardhatArtifacts,
    gas_price: Option<u128>,
    /// Next nonce to use when the network overrides it.
    next_nonce: Option<AtomicU64>,
}

impl RpcChainClient {
    /// Build a client for a network. No request is made until the first transaction.
    pub fn connect(network: &NetworkConfig, artifacts: HardhatArtifacts) -> Result<Self> {
        let private_key = network
            .accounts
            .first()
            .ok_or(ConfigError::MissingSigner {
                network: network.chain,
            })?;

        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse the signer key for {}", network.chain))?;
        let signer_address = signer.address();

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(network.url.clone())
            .erased();

        tracing::debug!(
            network = %network.chain,
            rpc_url = %network.url,
            signer = %signer_address,
            "Connected chain client"
        );

        Ok(Self {
            provider,
            signer: signer_address,
            artifacts,
            gas_price: network.gas_price,
            next_nonce: network.nonce.map(AtomicU64::new),
        })
    }

    /// Apply the signer and the network's overrides to a transaction.
    fn prepare(&self, tx: TransactionRequest) -> TransactionRequest {
        let mut tx = tx.with_from(self.signer);

        if let Some(gas_price) = self.gas_price {
            tx = tx.with_gas_price(gas_price);
        }

        if let Some(next_nonce) = &self.next_nonce {
            tx = tx.with_nonce(next_nonce.fetch_add(1, Ordering::SeqCst));
        }

        tx
    }

    async fn submit(&self, tx: TransactionRequest) -> Result<TxHash> {
        let pending = self
            .provider
            .send_transaction(self.prepare(tx))
            .await
            .context("Failed to send transaction")?;

        Ok(*pending.tx_hash())
    }
}

impl ChainClient for RpcChainClient {
    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn deploy(&self, contract: &str, constructor_args: &[DynSolValue]) -> Result<TxHash> {
        let artifact = self.artifacts.artifact(contract)?;

        let mut code = artifact.bytecode.to_vec();
        code.extend(encode_constructor_args(constructor_args));

        let tx_hash = self
            .submit(TransactionRequest::default().with_deploy_code(code))
            .await
            .with_context(|| format!("Failed to submit deployment of {}", contract))?;

        tracing::debug!(contract = %contract, tx_hash = %tx_hash, "Deployment transaction sent");

        Ok(tx_hash)
    }

    async fn send(&self, to: Address, calldata: Bytes) -> Result<TxHash> {
        let tx_hash = self
            .submit(TransactionRequest::default().with_to(to).with_input(calldata))
            .await
            .with_context(|| format!("Failed to submit transaction to {}", to))?;

        tracing::debug!(to = %to, tx_hash = %tx_hash, "Transaction sent");

        Ok(tx_hash)
    }

    async fn wait_for_confirmations(&self, tx_hash: TxHash, confirmations: u64) -> Result<TxReceipt> {
        // Zero confirmations still waits for the transaction to be mined.
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_required_confirmations(confirmations.max(1))
            .get_receipt()
            .await
            .with_context(|| format!("Failed to wait for transaction {}", tx_hash))?;

        if !receipt.status() {
            anyhow::bail!("Transaction {} reverted", tx_hash);
        }

        Ok(TxReceipt {
            tx_hash,
            block_number: receipt.block_number(),
            contract_address: receipt.contract_address(),
        })
    }
}
