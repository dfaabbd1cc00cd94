//! Deployments are recorded per network so that later commands (like source
//! verification) know where the contract lives:
//!
//! ```text
//! deployments/
//!   mumbai/
//!     .chainId
//!     CRWCP.json
//! ```

use {
    crate::{Artifact, DeploymentResult, Error},
    alloy::{
        json_abi::JsonAbi,
        primitives::{Address, B256},
    },
    serde::{Deserialize, Serialize},
    std::path::{Path, PathBuf},
    tokio::fs,
};

const CHAIN_ID_FILE: &str = ".chainId";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub address: Address,
    pub abi: JsonAbi,
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub deployer: Address,
    pub chain_id: u64,
}

impl DeploymentRecord {
    pub fn new(artifact: &Artifact, result: &DeploymentResult) -> Self {
        let log = &result.transaction_log;
        Self {
            address: result.contract_address,
            abi: artifact.abi.clone(),
            transaction_hash: log.transaction_hash,
            block_number: log.block_number,
            deployer: log.deployer,
            chain_id: log.chain_id,
        }
    }

    fn path(root: &Path, network: &str, contract: &str) -> PathBuf {
        root.join(network).join(format!("{contract}.json"))
    }

    /// Writes the record, replacing an earlier deployment of the same
    /// contract on the same network.
    pub async fn write(
        &self,
        root: &Path,
        network: &str,
        contract: &str,
    ) -> Result<PathBuf, Error> {
        let dir = root.join(network);
        fs::create_dir_all(&dir).await.map_err(|err| {
            Error::Configuration(format!("cannot create directory {dir:?}: {err}"))
        })?;

        let path = Self::path(root, network, contract);
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| Error::Configuration(format!("cannot serialize record: {err}")))?;
        write_file(&path, json).await?;
        write_file(&dir.join(CHAIN_ID_FILE), self.chain_id.to_string()).await?;
        tracing::debug!(?path, "wrote deployment record");
        Ok(path)
    }

    /// The recorded deployment of `contract` on `network`, if there is one.
    pub async fn read(root: &Path, network: &str, contract: &str) -> Result<Option<Self>, Error> {
        let path = Self::path(root, network, contract);
        let data = match fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(Error::Configuration(format!(
                    "I/O error while reading {path:?}: {err}"
                )));
            }
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|err| {
                Error::Configuration(format!("invalid deployment record {path:?}: {err}"))
            })
    }
}

async fn write_file(path: &Path, contents: String) -> Result<(), Error> {
    fs::write(path, contents)
        .await
        .map_err(|err| Error::Configuration(format!("cannot write {path:?}: {err}")))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::primitives::address,
    };

    fn record(address: Address) -> DeploymentRecord {
        DeploymentRecord {
            address,
            abi: JsonAbi::default(),
            transaction_hash: B256::repeat_byte(0x11),
            block_number: Some(17),
            deployer: address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            chain_id: 80001,
        }
    }

    #[tokio::test]
    async fn written_records_can_be_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let record = record(address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"));

        let path = record.write(dir.path(), "mumbai", "CRWCP").await.unwrap();
        assert_eq!(path, dir.path().join("mumbai/CRWCP.json"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("mumbai/.chainId")).unwrap(),
            "80001"
        );

        let read = DeploymentRecord::read(dir.path(), "mumbai", "CRWCP")
            .await
            .unwrap();
        assert_eq!(read, Some(record));
    }

    #[tokio::test]
    async fn later_deployments_replace_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let first = record(address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"));
        let second = record(address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"));
        first.write(dir.path(), "mumbai", "CRWCP").await.unwrap();
        second.write(dir.path(), "mumbai", "CRWCP").await.unwrap();

        let read = DeploymentRecord::read(dir.path(), "mumbai", "CRWCP")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.address, second.address);
    }

    #[tokio::test]
    async fn uses_the_field_names_of_the_deployment_files() {
        let dir = tempfile::tempdir().unwrap();
        record(Address::ZERO)
            .write(dir.path(), "mumbai", "CRWCP")
            .await
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("mumbai/CRWCP.json")).unwrap(),
        )
        .unwrap();
        for field in ["address", "abi", "transactionHash", "blockNumber", "deployer", "chainId"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }

    #[tokio::test]
    async fn missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let read = DeploymentRecord::read(dir.path(), "mumbai", "CRWCP")
            .await
            .unwrap();
        assert!(read.is_none());
    }
}
