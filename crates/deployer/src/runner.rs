use {
    crate::{Artifact, ContractDeployer, DeploymentResult, Error},
    configs::{NetworkProfile, Registry},
};

/// Deploys one instance of an artifact on one network.
pub struct Runner<'a, D> {
    registry: &'a Registry,
    deployer: D,
}

impl<'a, D: ContractDeployer> Runner<'a, D> {
    pub fn new(registry: &'a Registry, deployer: D) -> Self {
        Self { registry, deployer }
    }

    /// Resolves the network's deployer account and creates the contract from
    /// it. Account resolution happens before anything is sent to the node, so
    /// configuration mistakes never cost a transaction.
    pub async fn run(
        &self,
        profile: &NetworkProfile,
        artifact: &Artifact,
    ) -> Result<DeploymentResult, Error> {
        let index = self.registry.deployer(profile)?;
        let deployer = ethrpc::alloy::wallet::address(&profile.credentials, index)?;
        tracing::info!("Deployer: {deployer}");

        let result = self.deployer.deploy(artifact, deployer).await?;
        tracing::info!("The contract address is {}.", result.contract_address);
        Ok(result)
    }
}
