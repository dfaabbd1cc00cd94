//! Static description of the networks a contract can be deployed to: their
//! endpoints and signing credentials, which account plays which role on each
//! network and which block explorer verifies sources there.
//!
//! Everything in here is plain data. Values that come from the environment
//! are only looked up when a network is resolved, so a missing variable for
//! one network never prevents working with another.

pub mod accounts;
pub mod network;
pub mod registry;
pub mod setting;
pub mod verification;

pub use {
    accounts::NamedAccounts,
    network::{Credentials, NetworkProfile},
    registry::Registry,
    setting::{Environment, ProcessEnv, Secret, Setting},
    verification::{ChainDescriptor, Explorer, VerificationProfile},
};

use std::path::PathBuf;

/// Everything that can be wrong with the configuration of a network.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown network {0:?}")]
    UnknownNetwork(String),

    #[error("{field} is not set ({origin})")]
    Missing { field: String, origin: String },

    #[error("{field} is invalid: {reason}")]
    Invalid { field: String, reason: String },

    #[error("no {role:?} account configured for network {network:?}")]
    UnresolvedAccount { role: String, network: String },

    #[error(
        "{role:?} account index {index} is out of range on network {network:?} which only has \
         {available} account(s)"
    )]
    AccountOutOfRange {
        role: String,
        network: String,
        index: usize,
        available: usize,
    },

    #[error(
        "no block explorer is known for network {network:?} (chain id {chain_id}), a custom chain \
         descriptor is required"
    )]
    NoExplorer { network: String, chain_id: u64 },

    #[error("I/O error while reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Only the message is kept: the offending snippet could contain a private key.
    #[error("TOML syntax error while reading {path:?}: {message}")]
    Syntax { path: PathBuf, message: String },
}
