pub mod errors;
mod instrumentation;
pub mod wallet;

use {
    crate::AlloyProvider,
    alloy::{
        network::EthereumWallet,
        providers::{Provider, ProviderBuilder},
        rpc::client::{ClientBuilder, RpcClient},
        transports::{
            TransportResult,
            http::{Http, reqwest},
        },
    },
    instrumentation::{InstrumentationLayer, LabelingLayer},
    serde_json::json,
    std::time::Duration,
    url::Url,
};

/// RPC client whose HTTP requests give up after `timeout`, so a node that
/// accepts connections but never answers cannot stall the caller.
fn rpc_client(url: &Url, label: &str, timeout: Duration) -> Result<RpcClient, reqwest::Error> {
    let http = reqwest::Client::builder().timeout(timeout).build()?;
    let transport = Http::with_client(http, url.clone());
    let is_local = transport.guess_local();
    Ok(ClientBuilder::default()
        .layer(LabelingLayer {
            label: label.into(),
        })
        .layer(InstrumentationLayer)
        .transport(transport, is_local))
}

/// Read-only provider, e.g. for querying the chain ID before any account is
/// needed.
pub fn provider(
    url: &Url,
    label: &str,
    timeout: Duration,
) -> Result<AlloyProvider, reqwest::Error> {
    let rpc = rpc_client(url, label, timeout)?;
    Ok(ProviderBuilder::new().connect_client(rpc).erased())
}

/// Provider that fills nonce, gas and chain ID of outgoing transactions and
/// signs them with the accounts of `wallet`.
pub fn provider_with_wallet(
    url: &Url,
    label: &str,
    timeout: Duration,
    wallet: EthereumWallet,
) -> Result<AlloyProvider, reqwest::Error> {
    let rpc = rpc_client(url, label, timeout)?;
    Ok(ProviderBuilder::new()
        .wallet(wallet)
        .connect_client(rpc)
        .erased())
}

/// Restarts a local development node from a fresh fork of `fork_url`.
///
/// Uses `hardhat_reset` which both hardhat and anvil nodes understand. The
/// result is ignored since hardhat answers `true` and anvil `null`.
pub async fn reset_fork(provider: &AlloyProvider, fork_url: &str) -> TransportResult<()> {
    provider
        .raw_request::<_, serde_json::Value>(
            "hardhat_reset".into(),
            (json!({ "forking": { "jsonRpcUrl": fork_url } }),),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::providers::mock::Asserter};

    fn mocked_provider(asserter: &Asserter) -> AlloyProvider {
        ProviderBuilder::new()
            .connect_mocked_client(asserter.clone())
            .erased()
    }

    #[tokio::test]
    async fn reset_fork_accepts_hardhat_and_anvil_answers() {
        let asserter = Asserter::new();
        let provider = mocked_provider(&asserter);

        asserter.push_success(&true);
        reset_fork(&provider, "https://eth-mainnet.example/v2/key")
            .await
            .unwrap();

        asserter.push_success(&serde_json::Value::Null);
        reset_fork(&provider, "https://eth-mainnet.example/v2/key")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reset_fork_propagates_rejections() {
        let asserter = Asserter::new();
        let provider = mocked_provider(&asserter);

        asserter.push_failure_msg("Method hardhat_reset not found");
        assert!(
            reset_fork(&provider, "https://eth-mainnet.example/v2/key")
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn unresponsive_nodes_time_out() {
        // Accepted into the backlog but never answered.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url: Url = format!("http://{}", listener.local_addr().unwrap())
            .parse()
            .unwrap();
        let provider = provider(&url, "test", Duration::from_millis(100)).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), provider.get_chain_id())
            .await
            .expect("request was not bounded by the client timeout");
        let err = result.unwrap_err();
        assert!(errors::TransportErrorExt::is_node_error(&err));
    }
}
