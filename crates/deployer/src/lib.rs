//! Deploys the CRWCP contract to a named network and verifies its sources on
//! the network's block explorer.

pub mod arguments;
pub mod artifact;
pub mod deploy;
mod error;
pub mod record;
pub mod run;
pub mod runner;
pub mod verify;

#[cfg(test)]
pub use deploy::MockContractDeployer;
pub use {
    artifact::{Artifact, BuildInfo},
    deploy::{AlloyDeployer, ContractDeployer, DeploymentResult, TransactionLog},
    error::Error,
    record::DeploymentRecord,
    run::start,
    runner::Runner,
};
