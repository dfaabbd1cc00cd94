use {
    alloy::providers::{PendingTransactionError, WatchTxError},
    ethrpc::alloy::errors::TransportErrorExt,
    std::fmt::Display,
};

/// Every failure is fatal. The operator fixes the cause and runs the command
/// again.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid network, account, endpoint, credential or artifact.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The node could not be reached or did not answer in time.
    #[error("network error: {0}")]
    Network(String),
    /// The node refused the transaction or it reverted.
    #[error("transaction error: {0}")]
    Transaction(String),
    /// The block explorer rejected the verification request.
    #[error("verification error: {0}")]
    Verification(String),
}

impl Error {
    pub fn configuration(err: impl Display) -> Self {
        Self::Configuration(err.to_string())
    }

    /// Classifies a failed RPC call into a network or transaction error.
    pub fn rpc(context: &str, err: alloy::transports::TransportError) -> Self {
        if err.is_node_error() {
            Self::Network(format!("{context}: {err}"))
        } else {
            Self::Transaction(format!("{context}: {err}"))
        }
    }

    pub fn confirmation(err: PendingTransactionError) -> Self {
        match err {
            PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
                Self::Network("timed out waiting for the transaction to be confirmed".into())
            }
            PendingTransactionError::TransportError(err) => {
                Self::rpc("waiting for confirmation", err)
            }
            err => Self::Network(format!("waiting for confirmation: {err}")),
        }
    }
}

impl From<configs::Error> for Error {
    fn from(err: configs::Error) -> Self {
        Self::configuration(err)
    }
}

impl From<ethrpc::alloy::wallet::Error> for Error {
    fn from(err: ethrpc::alloy::wallet::Error) -> Self {
        Self::configuration(err)
    }
}
