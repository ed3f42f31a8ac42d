//! The seam between the deployment sequence and the chain it talks to.

use std::future::Future;

use alloy_core::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes, TxHash},
};
use anyhow::Result;

/// What the deployment needs to know about a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// Address of the created contract, for contract-creation transactions.
    pub contract_address: Option<Address>,
}

/// Submits transactions from a single signer and waits for them to be confirmed.
///
/// Implementations assume they are the only writer for their signer account.
pub trait ChainClient: Send + Sync {
    /// Address of the account signing every transaction.
    fn signer_address(&self) -> Address;

    /// Submit a contract-creation transaction for the named artifact.
    fn deploy(
        &self,
        contract: &str,
        constructor_args: &[DynSolValue],
    ) -> impl Future<Output = Result<TxHash>> + Send;

    /// Submit a call transaction.
    fn send(&self, to: Address, calldata: Bytes) -> impl Future<Output = Result<TxHash>> + Send;

    /// Wait until a transaction is `confirmations` blocks deep.
    ///
    /// Fails if the transaction reverted.
    fn wait_for_confirmations(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> impl Future<Output = Result<TxReceipt>> + Send;
}
