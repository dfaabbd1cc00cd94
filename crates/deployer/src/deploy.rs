use {
    crate::{Artifact, Error},
    alloy::{
        network::{ReceiptResponse, TransactionBuilder},
        primitives::{Address, B256},
        providers::Provider,
        rpc::types::TransactionRequest,
    },
    configs::Secret,
    ethrpc::AlloyProvider,
    std::time::Duration,
};

/// Outcome of one contract creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentResult {
    pub contract_address: Address,
    pub transaction_log: TransactionLog,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionLog {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub deployer: Address,
    pub chain_id: u64,
}

/// Creates contracts on chain.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContractDeployer: Send + Sync {
    /// Sends one contract creation transaction for `artifact` from
    /// `deployer` and waits for it to be confirmed. Every call creates a new
    /// instance.
    async fn deploy(&self, artifact: &Artifact, deployer: Address)
    -> Result<DeploymentResult, Error>;
}

/// [`ContractDeployer`] sending transactions through an alloy provider that
/// holds the deployer's signer.
pub struct AlloyDeployer {
    provider: AlloyProvider,
    expected_chain_id: Option<u64>,
    fork_url: Option<Secret>,
    confirmations: u64,
    timeout: Duration,
}

impl AlloyDeployer {
    pub fn new(provider: AlloyProvider, confirmations: u64, timeout: Duration) -> Self {
        Self {
            provider,
            expected_chain_id: None,
            fork_url: None,
            confirmations,
            timeout,
        }
    }

    /// Refuse to deploy if the node reports a different chain ID.
    pub fn with_expected_chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.expected_chain_id = chain_id;
        self
    }

    /// Restart the local node from a fresh fork of `fork_url` before
    /// deploying.
    pub fn with_fork_reset(mut self, fork_url: Secret) -> Self {
        self.fork_url = Some(fork_url);
        self
    }

    async fn chain_id(&self) -> Result<u64, Error> {
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(|err| Error::rpc("fetching chain id", err))?;
        if let Some(expected) = self.expected_chain_id {
            if expected != chain_id {
                return Err(Error::Configuration(format!(
                    "connected to node with chain id {chain_id} but the network is configured \
                     for {expected}"
                )));
            }
        }
        Ok(chain_id)
    }
}

#[async_trait::async_trait]
impl ContractDeployer for AlloyDeployer {
    async fn deploy(
        &self,
        artifact: &Artifact,
        deployer: Address,
    ) -> Result<DeploymentResult, Error> {
        if let Some(fork_url) = &self.fork_url {
            tracing::info!("resetting local node to a fresh fork");
            ethrpc::alloy::reset_fork(&self.provider, fork_url.expose())
                .await
                .map_err(|err| Error::rpc("resetting fork", err))?;
        }
        let chain_id = self.chain_id().await?;

        let tx = TransactionRequest::default()
            .with_from(deployer)
            .with_deploy_code(artifact.bytecode.clone());
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|err| Error::rpc("sending contract creation", err))?;
        let transaction_hash = *pending.tx_hash();
        tracing::info!(
            contract = %artifact.contract_name,
            tx = %transaction_hash,
            "deploying"
        );

        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .with_timeout(Some(self.timeout))
            .get_receipt()
            .await
            .map_err(Error::confirmation)?;
        let contract_address = created_contract(&receipt, transaction_hash)?;
        tracing::debug!(
            %contract_address,
            gas_used = receipt.gas_used(),
            block = ?receipt.block_number(),
            "contract creation confirmed"
        );

        Ok(DeploymentResult {
            contract_address,
            transaction_log: TransactionLog {
                transaction_hash,
                block_number: receipt.block_number(),
                gas_used: receipt.gas_used(),
                deployer,
                chain_id,
            },
        })
    }
}

/// Address of the contract a mined creation transaction produced.
fn created_contract(
    receipt: &impl ReceiptResponse,
    transaction_hash: B256,
) -> Result<Address, Error> {
    if !receipt.status() {
        return Err(Error::Transaction(format!(
            "contract creation {transaction_hash} reverted"
        )));
    }
    receipt.contract_address().ok_or_else(|| {
        Error::Transaction(format!(
            "receipt of {transaction_hash} has no contract address"
        ))
    })
}
