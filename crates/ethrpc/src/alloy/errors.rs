use alloy::transports::{RpcError, TransportError};

pub trait TransportErrorExt {
    /// Returns whether the node could not be reached or did not answer with
    /// a well-formed JSON-RPC response.
    ///
    /// Everything else is a rejection: the node answered and refused the
    /// request, e.g. because the transaction reverts, is underpriced, reuses a
    /// nonce or the sender cannot pay for it.
    fn is_node_error(&self) -> bool;
}

impl TransportErrorExt for TransportError {
    fn is_node_error(&self) -> bool {
        match self {
            RpcError::ErrorResp(err) => {
                tracing::debug!(?err, "node rejected request");
                false
            }
            _ => true,
        }
    }
}

/// Create an arbitrary transport error that the node answered with.
/// Useful for testing.
#[cfg(test)]
pub fn testing_rejection() -> TransportError {
    TransportError::ErrorResp(alloy::rpc::json_rpc::ErrorPayload::internal_error())
}

/// Create an arbitrary transport error where the node never answered.
/// Useful for testing.
#[cfg(test)]
pub fn testing_node_error() -> TransportError {
    alloy::transports::TransportErrorKind::backend_gone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_error() {
        assert!(!testing_rejection().is_node_error());
        assert!(testing_node_error().is_node_error());
    }
}
