//! Compiler output consumed by the deployer. Contracts are compiled by an
//! external toolchain which lays its output out as
//!
//! ```text
//! artifacts/
//!   build-info/<id>.json                 compiler version and standard JSON input
//!   contracts/CRWCP.sol/CRWCP.json       ABI and creation bytecode
//!   contracts/CRWCP.sol/CRWCP.dbg.json   points at the build info
//! ```

use {
    crate::Error,
    alloy::{json_abi::JsonAbi, primitives::Bytes},
    serde::{Deserialize, de::DeserializeOwned},
    std::path::{Path, PathBuf},
    tokio::fs,
    walkdir::WalkDir,
};

const BUILD_INFO_DIR: &str = "build-info";

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
    #[serde(skip)]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: PathBuf,
}

/// What the compiler was run with. Needed to reproduce the bytecode when
/// verifying sources.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub solc_long_version: String,
    pub input: serde_json::Value,
}

impl Artifact {
    /// Finds the artifact of `contract` anywhere below `dir`.
    pub async fn load(dir: &Path, contract: &str) -> Result<Self, Error> {
        let file_name = format!("{contract}.json");
        let mut candidates = find_files(dir, &file_name).await?;
        let path = match candidates.len() {
            0 => {
                return Err(Error::Configuration(format!(
                    "no artifact for contract {contract} below {dir:?}, compile the contracts first"
                )));
            }
            1 => candidates.remove(0),
            _ => {
                return Err(Error::Configuration(format!(
                    "contract name {contract} is ambiguous, found artifacts {candidates:?}"
                )));
            }
        };

        let mut artifact: Self = read_json(&path).await?;
        artifact.path = path;
        artifact.validate(contract)?;
        tracing::debug!(path = ?artifact.path, "loaded artifact");
        Ok(artifact)
    }

    fn validate(&self, contract: &str) -> Result<(), Error> {
        if self.contract_name != contract {
            return Err(Error::Configuration(format!(
                "artifact {:?} describes {} instead of {contract}",
                self.path, self.contract_name
            )));
        }
        if self.bytecode.is_empty() {
            return Err(Error::Configuration(format!(
                "{contract} has no creation bytecode, abstract contracts and interfaces cannot be \
                 deployed"
            )));
        }
        if let Some(constructor) = &self.abi.constructor {
            if !constructor.inputs.is_empty() {
                return Err(Error::Configuration(format!(
                    "the constructor of {contract} takes {} argument(s), only parameterless \
                     constructors are supported",
                    constructor.inputs.len()
                )));
            }
        }
        Ok(())
    }

    /// `<source>:<contract>`, the name explorers expect.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Loads the build info the artifact was produced by.
    pub async fn build_info(&self) -> Result<BuildInfo, Error> {
        let debug_path = self.path.with_extension("dbg.json");
        let debug: DebugFile = read_json(&debug_path).await?;
        let dir = self.path.parent().unwrap_or(Path::new("."));
        BuildInfo::load(&dir.join(debug.build_info)).await
    }
}

impl BuildInfo {
    pub async fn load(path: &Path) -> Result<Self, Error> {
        read_json(path).await
    }

    /// Compiler version in the form explorers expect, e.g.
    /// `v0.8.17+commit.8df45f5f`.
    pub fn compiler_version(&self) -> String {
        format!("v{}", self.solc_long_version.trim_start_matches('v'))
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let data = fs::read_to_string(path)
        .await
        .map_err(|err| Error::Configuration(format!("I/O error while reading {path:?}: {err}")))?;
    serde_json::from_str(&data)
        .map_err(|err| Error::Configuration(format!("invalid JSON in {path:?}: {err}")))
}

/// All files called `file_name` below `dir`, ignoring build info.
async fn find_files(dir: &Path, file_name: &str) -> Result<Vec<PathBuf>, Error> {
    let dir = dir.to_path_buf();
    let file_name = file_name.to_string();
    tokio::task::spawn_blocking(move || {
        let mut found = Vec::new();
        let entries = WalkDir::new(&dir).into_iter().filter_entry(|entry| {
            !(entry.file_type().is_dir() && entry.file_name() == BUILD_INFO_DIR)
        });
        for entry in entries {
            let entry = entry.map_err(|err| {
                Error::Configuration(format!("cannot read directory {dir:?}: {err}"))
            })?;
            let name = entry.file_name().to_str();
            if entry.file_type().is_file() && name == Some(file_name.as_str()) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        Ok::<_, Error>(found)
    })
    .await
    .map_err(|err| Error::Configuration(format!("artifact search failed: {err}")))?
}

#[cfg(test)]
pub mod testing {
    use {
        super::*,
        serde_json::{Value, json},
    };

    /// Creation code of a contract with an empty body and no fallback.
    pub const EMPTY_CONTRACT_BYTECODE: &str = "0x6080604052348015600f57600080fd5b50603f80601d6000396000f3fe6080604052600080fdfea2646970667358221220a0d4f2b9c2f6b1a0f4e7d6a5c8b9e0f1a2b3c4d5e6f708192a3b4c5d6e7f809164736f6c63430008110033";

    pub fn artifact_json(contract: &str, bytecode: &str, abi: Value) -> Value {
        json!({
            "_format": "hh-sol-artifact-1",
            "contractName": contract,
            "sourceName": format!("contracts/{contract}.sol"),
            "abi": abi,
            "bytecode": bytecode,
            "deployedBytecode": "0x",
            "linkReferences": {},
            "deployedLinkReferences": {},
        })
    }

    /// Writes an artifact, its debug file and build info the way the compiler
    /// toolchain does.
    pub fn write_artifacts(dir: &Path, contract: &str, artifact: &Value) {
        let contract_dir = dir.join(format!("contracts/{contract}.sol"));
        std::fs::create_dir_all(&contract_dir).unwrap();
        std::fs::create_dir_all(dir.join(BUILD_INFO_DIR)).unwrap();
        std::fs::write(
            contract_dir.join(format!("{contract}.json")),
            artifact.to_string(),
        )
        .unwrap();
        std::fs::write(
            contract_dir.join(format!("{contract}.dbg.json")),
            json!({
                "_format": "hh-sol-dbg-1",
                "buildInfo": "../../build-info/0123abcd.json",
            })
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.join(BUILD_INFO_DIR).join("0123abcd.json"),
            json!({
                "_format": "hh-sol-build-info-1",
                "solcVersion": "0.8.17",
                "solcLongVersion": "0.8.17+commit.8df45f5f",
                "input": {
                    "language": "Solidity",
                    "sources": { format!("contracts/{contract}.sol"): { "content": "contract C {}" } },
                    "settings": { "optimizer": { "enabled": false, "runs": 200 } },
                },
                "output": {},
            })
            .to_string(),
        )
        .unwrap();
    }
}
