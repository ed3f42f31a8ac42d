//! Source verification on Etherscan-compatible block explorers.
//!
//! Verification is best effort: [`verify_contract`] never fails, it only reports what happened.

use std::{future::Future, time::Duration};

use anyhow::Context;
use backon::{ConstantBuilder, Retryable};
use derive_more::{Display, Error};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    Chain, DeploymentRecord, ExplorerConfig, HardhatArtifacts, contracts::encode_constructor_args,
};

/// Default timeout for explorer requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between verification status checks.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default number of status checks before giving up.
const DEFAULT_MAX_POLLS: usize = 20;

/// Status message of a verification job that has not been processed yet.
const PENDING_STATUS: &str = "Pending in queue";

/// Why a verification attempt did not succeed.
#[derive(Debug, Display, Error)]
pub enum VerificationError {
    /// The explorer refused the submission or the verification failed.
    #[display("{message}")]
    Rejected { message: String },

    /// The explorer still had the job queued after the last status check.
    #[display("Verification {guid} is still pending")]
    Pending { guid: String },

    #[display("No block explorer configured for {network}")]
    NoExplorer { network: Chain },

    /// Sources or compiler settings could not be loaded from the artifacts.
    #[display("Failed to prepare verification request: {message}")]
    Artifacts { message: String },

    #[display("Explorer request failed: {_0}")]
    Http(reqwest::Error),
}

impl VerificationError {
    /// Whether the explorer reported the contract as already verified.
    pub fn is_already_verified(&self) -> bool {
        self.to_string()
            .to_ascii_lowercase()
            .contains("already verified")
    }
}

/// Result of one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
    Failed,
}

/// Registers the source of a deployed contract with a block explorer.
pub trait ContractVerifier: Send + Sync {
    fn verify(
        &self,
        record: &DeploymentRecord,
    ) -> impl Future<Output = Result<(), VerificationError>> + Send;
}

/// Verify a deployed contract, logging the outcome instead of failing.
pub async fn verify_contract<V: ContractVerifier>(
    verifier: &V,
    record: &DeploymentRecord,
) -> VerificationOutcome {
    tracing::info!(
        contract = %record.display_name,
        address = %record.address,
        "Verifying contract..."
    );

    match verifier.verify(record).await {
        Ok(()) => {
            tracing::info!(
                "{} contract ({}) deployed and verified",
                record.display_name,
                record.address
            );
            VerificationOutcome::Verified
        }
        Err(err) if err.is_already_verified() => {
            tracing::warn!(
                "{} contract deployed but already verified",
                record.display_name
            );
            VerificationOutcome::AlreadyVerified
        }
        Err(err) => {
            tracing::error!(error = %err, contract = %record.display_name, "Verification failed");
            tracing::warn!(
                "{} contract deployed but not verified. Ensure you are waiting for enough confirmation blocks",
                record.display_name
            );
            VerificationOutcome::Failed
        }
    }
}

/// Response envelope of the Etherscan contract API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

impl ApiResponse {
    fn is_ok(&self) -> bool {
        self.status == "1"
    }

    fn result_text(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            Value::Null => self.message.clone(),
            other => other.to_string(),
        }
    }
}

/// Verifies through the `contract` module of an Etherscan-compatible API (Etherscan, Blockscout).
#[derive(Debug, Clone)]
pub struct EtherscanVerifier {
    client: reqwest::Client,
    network: Chain,
    /// API endpoint and key, if the network has an explorer.
    endpoint: Option<(String, String)>,
    artifacts: HardhatArtifacts,
    poll_interval: Duration,
    max_polls: usize,
}

impl EtherscanVerifier {
    pub fn new(
        explorer: &ExplorerConfig,
        network: Chain,
        artifacts: HardhatArtifacts,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        let endpoint = explorer
            .for_chain(network)
            .map(|(api_key, custom)| (custom.urls.api_url.clone(), api_key.to_string()));

        Ok(Self {
            client,
            network,
            endpoint,
            artifacts,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        })
    }

    /// Change how often and how many times the verification status is polled.
    pub fn with_polling(mut self, interval: Duration, max_polls: usize) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    async fn submit(
        &self,
        api_url: &str,
        api_key: &str,
        record: &DeploymentRecord,
    ) -> Result<String, VerificationError> {
        let artifacts_err = |e: anyhow::Error| VerificationError::Artifacts {
            message: format!("{:#}", e),
        };
        let artifact = self.artifacts.artifact(&record.contract).map_err(artifacts_err)?;
        let build_info = self.artifacts.build_info(&record.contract).map_err(artifacts_err)?;

        let address = record.address.to_string();
        let source_code = build_info.input.to_string();
        let contract_name = artifact.fully_qualified_name();
        let compiler_version = format!("v{}", build_info.solc_long_version);
        let constructor_args = hex::encode(encode_constructor_args(&record.constructor_args));

        let form = [
            ("apikey", api_key),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("contractaddress", address.as_str()),
            ("sourceCode", source_code.as_str()),
            ("codeformat", "solidity-standard-json-input"),
            ("contractname", contract_name.as_str()),
            ("compilerversion", compiler_version.as_str()),
            // Etherscan spelling.
            ("constructorArguements", constructor_args.as_str()),
        ];

        let response: ApiResponse = self
            .client
            .post(api_url)
            .form(&form)
            .send()
            .await
            .map_err(VerificationError::Http)?
            .json()
            .await
            .map_err(VerificationError::Http)?;

        if !response.is_ok() {
            return Err(VerificationError::Rejected {
                message: response.result_text(),
            });
        }

        Ok(response.result_text())
    }

    async fn check_status(
        &self,
        api_url: &str,
        api_key: &str,
        guid: &str,
    ) -> Result<(), VerificationError> {
        let response: ApiResponse = self
            .client
            .get(api_url)
            .query(&[
                ("apikey", api_key),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await
            .map_err(VerificationError::Http)?
            .json()
            .await
            .map_err(VerificationError::Http)?;

        let status = response.result_text();

        if status.contains(PENDING_STATUS) {
            return Err(VerificationError::Pending {
                guid: guid.to_string(),
            });
        }

        let rejected = VerificationError::Rejected { message: status };

        // Some explorers report "Already Verified" with a success status.
        if response.is_ok() && !rejected.is_already_verified() {
            return Ok(());
        }

        Err(rejected)
    }
}

impl ContractVerifier for EtherscanVerifier {
    async fn verify(&self, record: &DeploymentRecord) -> Result<(), VerificationError> {
        let (api_url, api_key) = self.endpoint.as_ref().ok_or(VerificationError::NoExplorer {
            network: self.network,
        })?;

        let guid = self.submit(api_url, api_key, record).await?;
        tracing::debug!(guid = %guid, contract = %record.display_name, "Verification submitted");

        (|| self.check_status(api_url, api_key, &guid))
            .retry(
                ConstantBuilder::default()
                    .with_delay(self.poll_interval)
                    .with_max_times(self.max_polls),
            )
            .when(|e| matches!(e, VerificationError::Pending { .. }))
            .notify(|_, delay| {
                tracing::debug!(guid = %guid, delay = ?delay, "Verification pending, checking again");
            })
            .await
    }
}
