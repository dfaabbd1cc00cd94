//! Source verification through Etherscan compatible block explorer APIs.

use {
    crate::{Artifact, BuildInfo, Error},
    alloy::primitives::Address,
    configs::{ChainDescriptor, Secret},
    reqwest::Client,
    serde::Deserialize,
    std::time::Duration,
    url::Url,
};

const PASS: &str = "Pass - Verified";
const PENDING: &str = "Pending in queue";
const ALREADY_VERIFIED: &str = "already verified";

/// Everything an explorer needs to recompile and compare a contract.
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationRequest {
    pub address: Address,
    /// `<source>:<contract>`
    pub contract_name: String,
    /// `v<solc long version>`
    pub compiler_version: String,
    /// The compiler's standard JSON input.
    pub source_code: String,
}

impl VerificationRequest {
    pub fn new(address: Address, artifact: &Artifact, build_info: &BuildInfo) -> Self {
        Self {
            address,
            contract_name: artifact.fully_qualified_name(),
            compiler_version: build_info.compiler_version(),
            source_code: build_info.input.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    /// The explorer queued the request under this GUID.
    Queued(String),
    AlreadyVerified,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Verified,
    Pending,
    Failed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Verified,
    AlreadyVerified,
}

/// Abstract explorer verification API. Provides a mockable implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VerificationApi: Send + Sync {
    async fn submit(&self, request: &VerificationRequest) -> Result<Submission, ExplorerError>;

    async fn status(&self, guid: &str) -> Result<Status, ExplorerError>;
}

#[derive(thiserror::Error, Debug)]
pub enum ExplorerError {
    #[error("explorer rejected request: {0}")]
    Rejected(String),

    #[error("Error({0}) for response {1}")]
    Deserialize(serde_json::Error, String),

    // Recovered response but failed reading its body
    #[error(transparent)]
    TextFetch(reqwest::Error),

    // Connectivity or non-response error
    #[error("failed on send: {0}")]
    Send(reqwest::Error),
}

/// Only an explicit rejection is a verdict on the sources. Unreadable answers
/// come from proxies and outages as often as from the explorer itself.
impl From<ExplorerError> for Error {
    fn from(err: ExplorerError) -> Self {
        match err {
            ExplorerError::Rejected(_) => Self::Verification(err.to_string()),
            ExplorerError::Deserialize(..)
            | ExplorerError::TextFetch(_)
            | ExplorerError::Send(_) => Self::Network(err.to_string()),
        }
    }
}

/// Every Etherscan API answer has this shape.
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[allow(dead_code)]
    message: String,
    result: String,
}

impl ExplorerResponse {
    fn submission(self) -> Result<Submission, ExplorerError> {
        if self.status == "1" {
            return Ok(Submission::Queued(self.result));
        }
        if self.result.to_lowercase().contains(ALREADY_VERIFIED) {
            return Ok(Submission::AlreadyVerified);
        }
        Err(ExplorerError::Rejected(self.result))
    }

    fn status(self) -> Status {
        if self.result == PASS || self.result.to_lowercase().contains(ALREADY_VERIFIED) {
            Status::Verified
        } else if self.result == PENDING {
            Status::Pending
        } else {
            Status::Failed(self.result)
        }
    }
}

/// Etherscan API client for one chain.
pub struct Etherscan {
    client: Client,
    api_url: Url,
    api_key: Secret,
}

impl Etherscan {
    pub fn new(client: Client, chain: &ChainDescriptor, api_key: Secret) -> Self {
        Self {
            client,
            api_url: chain.api_url.clone(),
            api_key,
        }
    }

    /// Sends the request and parses the answer. Request URLs carry the API
    /// key, so they are stripped from transport errors.
    async fn read(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<ExplorerResponse, ExplorerError> {
        let text = request
            .send()
            .await
            .map_err(|err| ExplorerError::Send(err.without_url()))?
            .text()
            .await
            .map_err(|err| ExplorerError::TextFetch(err.without_url()))?;
        tracing::debug!(response = %text, "explorer response");
        serde_json::from_str(&text).map_err(|err| ExplorerError::Deserialize(err, text))
    }
}

#[async_trait::async_trait]
impl VerificationApi for Etherscan {
    async fn submit(&self, request: &VerificationRequest) -> Result<Submission, ExplorerError> {
        tracing::debug!(url = %self.api_url, address = %request.address, "submitting sources");
        let address = request.address.to_string();
        let form = [
            ("apikey", self.api_key.expose()),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("contractaddress", address.as_str()),
            ("sourceCode", request.source_code.as_str()),
            ("codeformat", "solidity-standard-json-input"),
            ("contractname", request.contract_name.as_str()),
            ("compilerversion", request.compiler_version.as_str()),
        ];
        self.read(self.client.post(self.api_url.clone()).form(&form))
            .await?
            .submission()
    }

    async fn status(&self, guid: &str) -> Result<Status, ExplorerError> {
        let query = [
            ("apikey", self.api_key.expose()),
            ("module", "contract"),
            ("action", "checkverifystatus"),
            ("guid", guid),
        ];
        Ok(self
            .read(self.client.get(self.api_url.clone()).query(&query))
            .await?
            .status())
    }
}

/// Submits sources and waits for the explorer to check them.
pub struct Verifier<A> {
    api: A,
    poll_interval: Duration,
    timeout: Duration,
}

impl<A: VerificationApi> Verifier<A> {
    pub fn new(api: A, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            api,
            poll_interval,
            timeout,
        }
    }

    pub async fn verify(&self, request: &VerificationRequest) -> Result<Outcome, Error> {
        let guid = match self.api.submit(request).await? {
            Submission::AlreadyVerified => {
                tracing::info!(address = %request.address, "contract is already verified");
                return Ok(Outcome::AlreadyVerified);
            }
            Submission::Queued(guid) => guid,
        };
        tracing::info!(%guid, "sources submitted, waiting for the explorer");

        tokio::time::timeout(self.timeout, self.poll(&guid))
            .await
            .map_err(|_| {
                Error::Network(format!(
                    "explorer did not finish verification {guid} within {:?}",
                    self.timeout
                ))
            })?
    }

    async fn poll(&self, guid: &str) -> Result<Outcome, Error> {
        loop {
            tokio::time::sleep(self.poll_interval).await;
            match self.api.status(guid).await? {
                Status::Verified => return Ok(Outcome::Verified),
                Status::Pending => tracing::debug!(%guid, "verification pending"),
                Status::Failed(reason) => return Err(Error::Verification(reason)),
            }
        }
    }
}

/// Where the verified sources can be looked at.
pub fn explorer_link(chain: &ChainDescriptor, address: Address) -> String {
    format!(
        "{}/address/{address}#code",
        chain.browser_url.as_str().trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::primitives::address,
        mockall::{Sequence, predicate::eq},
    };

    fn request() -> VerificationRequest {
        VerificationRequest {
            address: address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            contract_name: "contracts/CRWCP.sol:CRWCP".into(),
            compiler_version: "v0.8.17+commit.8df45f5f".into(),
            source_code: "{}".into(),
        }
    }

    fn response(status: &str, result: &str) -> ExplorerResponse {
        ExplorerResponse {
            status: status.into(),
            message: if status == "1" { "OK" } else { "NOTOK" }.into(),
            result: result.into(),
        }
    }

    fn verifier(api: MockVerificationApi) -> Verifier<MockVerificationApi> {
        Verifier::new(api, Duration::from_millis(1), Duration::from_secs(5))
    }

    #[test]
    fn classifies_submissions() {
        assert_eq!(
            response("1", "ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn")
                .submission()
                .unwrap(),
            Submission::Queued("ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn".into())
        );
        assert_eq!(
            response("0", "Contract source code already verified")
                .submission()
                .unwrap(),
            Submission::AlreadyVerified
        );
        assert!(matches!(
            response("0", "Invalid API Key").submission(),
            Err(ExplorerError::Rejected(_))
        ));
    }

    #[test]
    fn classifies_statuses() {
        assert_eq!(response("1", PASS).status(), Status::Verified);
        assert_eq!(response("0", PENDING).status(), Status::Pending);
        assert_eq!(
            response("0", "Fail - Unable to verify").status(),
            Status::Failed("Fail - Unable to verify".into())
        );
    }

    #[test]
    fn parses_explorer_json() {
        let response: ExplorerResponse =
            serde_json::from_str(r#"{"status":"0","message":"NOTOK","result":"Pending in queue"}"#)
                .unwrap();
        assert_eq!(response.status(), Status::Pending);
    }

    #[test]
    fn links_to_the_verified_code() {
        let chain = ChainDescriptor {
            chain_id: 420,
            api_url: "https://api-goerli-optimism.etherscan.io/api".parse().unwrap(),
            browser_url: "https://goerli-optimism.etherscan.io".parse().unwrap(),
        };
        assert_eq!(
            explorer_link(&chain, address!("0x5FbDB2315678afecb367f032d93F642f64180aa3")),
            "https://goerli-optimism.etherscan.io/address/\
             0x5FbDB2315678afecb367f032d93F642f64180aa3#code"
        );
    }

    #[test]
    fn unreadable_answers_are_network_errors() {
        let text = "<html>502 Bad Gateway</html>".to_string();
        let parse = serde_json::from_str::<ExplorerResponse>(&text).unwrap_err();
        let err = Error::from(ExplorerError::Deserialize(parse, text));
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn transport_errors_do_not_leak_the_api_key() {
        let chain = ChainDescriptor {
            chain_id: 420,
            // Nothing listens here, so every request fails on send.
            api_url: "http://127.0.0.1:1/api".parse().unwrap(),
            browser_url: "https://goerli-optimism.etherscan.io".parse().unwrap(),
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let etherscan = Etherscan::new(client, &chain, Secret::new("TOPSECRETKEY"));

        let status = etherscan.status("guid").await.unwrap_err();
        assert!(matches!(status, ExplorerError::Send(_)));
        let status = Error::from(status);
        assert!(matches!(status, Error::Network(_)));
        assert!(!status.to_string().contains("TOPSECRETKEY"));
        assert!(!format!("{status:?}").contains("TOPSECRETKEY"));

        let submit = Error::from(etherscan.submit(&request()).await.unwrap_err());
        assert!(!submit.to_string().contains("TOPSECRETKEY"));
        assert!(!format!("{submit:?}").contains("TOPSECRETKEY"));
    }

    #[tokio::test]
    async fn polls_until_verified() {
        let mut api = MockVerificationApi::new();
        let mut seq = Sequence::new();
        api.expect_submit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Submission::Queued("guid".into())));
        api.expect_status()
            .with(eq("guid"))
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Status::Pending));
        api.expect_status()
            .with(eq("guid"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Status::Verified));

        let outcome = verifier(api).verify(&request()).await.unwrap();
        assert_eq!(outcome, Outcome::Verified);
    }

    #[tokio::test]
    async fn already_verified_contracts_are_not_polled() {
        let mut api = MockVerificationApi::new();
        api.expect_submit()
            .returning(|_| Ok(Submission::AlreadyVerified));
        api.expect_status().never();

        let outcome = verifier(api).verify(&request()).await.unwrap();
        assert_eq!(outcome, Outcome::AlreadyVerified);
    }

    #[tokio::test]
    async fn failed_verification() {
        let mut api = MockVerificationApi::new();
        api.expect_submit()
            .returning(|_| Ok(Submission::Queued("guid".into())));
        api.expect_status()
            .returning(|_| Ok(Status::Failed("Fail - Unable to verify".into())));

        let err = verifier(api).verify(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Verification(_)));
    }

    #[tokio::test]
    async fn rejected_submission() {
        let mut api = MockVerificationApi::new();
        api.expect_submit()
            .returning(|_| Err(ExplorerError::Rejected("Invalid API Key".into())));

        let err = verifier(api).verify(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Verification(_)));
    }

    #[tokio::test]
    async fn gives_up_after_timeout() {
        let mut api = MockVerificationApi::new();
        api.expect_submit()
            .returning(|_| Ok(Submission::Queued("guid".into())));
        api.expect_status().returning(|_| Ok(Status::Pending));

        let verifier = Verifier::new(api, Duration::from_millis(5), Duration::from_millis(50));
        let err = verifier.verify(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }
}
