use {
    crate::{Environment, Error, Secret, Setting},
    serde::Deserialize,
    url::Url,
};

/// Development mnemonic shared by hardhat and anvil nodes.
pub const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";

fn default_mnemonic_count() -> usize {
    20
}

/// How a network is configured in the registry file.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct NetworkConfig {
    /// Expected chain ID of the node behind `rpc-url`. Deployments refuse to
    /// run against a node reporting a different one.
    pub chain_id: Option<u64>,

    pub rpc_url: Setting,

    /// Upstream node a local simulation forks its state from.
    pub fork_url: Option<Setting>,

    #[serde(default)]
    pub accounts: AccountsConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum AccountsConfig {
    PrivateKeys(Vec<Setting>),
    Mnemonic {
        mnemonic: Setting,
        #[serde(default = "default_mnemonic_count")]
        count: usize,
    },
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self::PrivateKeys(Vec::new())
    }
}

/// Signing credentials of a network. Account `i` is the `i`th private key,
/// or the `i`th derivation of the mnemonic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    PrivateKeys(Vec<Secret>),
    Mnemonic { phrase: Secret, count: usize },
}

impl Credentials {
    pub fn len(&self) -> usize {
        match self {
            Self::PrivateKeys(keys) => keys.len(),
            Self::Mnemonic { count, .. } => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A network with every setting resolved. Created once at startup and only
/// read afterwards.
#[derive(Clone, Debug)]
pub struct NetworkProfile {
    pub name: String,
    pub rpc_url: Url,
    pub fork_url: Option<Secret>,
    pub credentials: Credentials,
    pub chain_id: Option<u64>,
}

impl NetworkConfig {
    pub fn resolve(&self, name: &str, env: &impl Environment) -> Result<NetworkProfile, Error> {
        let field = |field: &str| format!("networks.{name}.{field}");

        let rpc_url = self.rpc_url.resolve(&field("rpc-url"), env)?;
        let rpc_url = rpc_url.parse::<Url>().map_err(|err| Error::Invalid {
            field: field("rpc-url"),
            reason: err.to_string(),
        })?;
        let fork_url = self
            .fork_url
            .as_ref()
            .map(|setting| setting.resolve_secret(&field("fork-url"), env))
            .transpose()?;

        let credentials = match &self.accounts {
            AccountsConfig::PrivateKeys(keys) => Credentials::PrivateKeys(
                keys.iter()
                    .enumerate()
                    .map(|(i, key)| key.resolve_secret(&field(&format!("accounts[{i}]")), env))
                    .collect::<Result<_, _>>()?,
            ),
            AccountsConfig::Mnemonic { mnemonic, count } => Credentials::Mnemonic {
                phrase: mnemonic.resolve_secret(&field("accounts.mnemonic"), env)?,
                count: *count,
            },
        };

        Ok(NetworkProfile {
            name: name.to_string(),
            rpc_url,
            fork_url,
            credentials,
            chain_id: self.chain_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::collections::HashMap};

    #[test]
    fn resolves_private_key_accounts() {
        let config: NetworkConfig = toml::from_str(
            r#"
            chain-id = 420
            rpc-url = { env = "OP_URL" }
            accounts = [{ env = "PRIVATE_KEY" }, "0x02"]
            "#,
        )
        .unwrap();
        let env = HashMap::from([
            ("OP_URL".to_string(), "https://opt-goerli.example/v2/key".to_string()),
            ("PRIVATE_KEY".to_string(), "0x01".to_string()),
        ]);

        let profile = config.resolve("optimism-goerli", &env).unwrap();
        assert_eq!(profile.name, "optimism-goerli");
        assert_eq!(profile.chain_id, Some(420));
        assert_eq!(profile.rpc_url.host_str(), Some("opt-goerli.example"));
        assert_eq!(
            profile.credentials,
            Credentials::PrivateKeys(vec![Secret::new("0x01"), Secret::new("0x02")])
        );
    }

    #[test]
    fn missing_signing_key_fails() {
        let config: NetworkConfig = toml::from_str(
            r#"
            rpc-url = "http://localhost:8545"
            accounts = [{ env = "PRIVATE_KEY" }]
            "#,
        )
        .unwrap();

        let err = config.resolve("mumbai", &HashMap::new()).unwrap_err();
        assert!(
            matches!(err, Error::Missing { ref field, .. } if field == "networks.mumbai.accounts[0]")
        );
    }

    #[test]
    fn invalid_url_fails() {
        let config: NetworkConfig = toml::from_str(r#"rpc-url = "not a url""#).unwrap();
        let err = config.resolve("local", &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::Invalid { .. }));
    }

    #[test]
    fn mnemonic_accounts_default_count() {
        let config: NetworkConfig = toml::from_str(
            r#"
            rpc-url = "http://127.0.0.1:8545"
            accounts = { mnemonic = "test test test test test test test test test test test junk" }
            "#,
        )
        .unwrap();
        let profile = config.resolve("local", &HashMap::new()).unwrap();
        assert_eq!(profile.credentials.len(), 20);
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = toml::from_str::<NetworkConfig>(
            r#"
            rpc-url = "http://127.0.0.1:8545"
            gas-price = 1
            "#,
        );
        assert!(result.is_err());
    }
}
