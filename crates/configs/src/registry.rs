use {
    crate::{
        Environment,
        Error,
        NamedAccounts,
        NetworkProfile,
        Setting,
        VerificationProfile,
        accounts::{self, RoleAccounts},
        network::{AccountsConfig, NetworkConfig, TEST_MNEMONIC},
        verification::{CustomChain, VerificationConfig},
    },
    serde::Deserialize,
    std::{collections::BTreeMap, path::Path},
    tokio::fs,
};

/// All networks known to the deployer.
///
/// ```toml
/// [networks.mumbai]
/// chain-id = 80001
/// rpc-url = { env = "ALCHEMY_MUMBAI_URL" }
/// accounts = [{ env = "PRIVATE_KEY" }]
///
/// [named-accounts.deployer]
/// default = 0
///
/// [verification.api-keys]
/// polygonMumbai = { env = "POLYGONSCAN_API_KEY" }
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Registry {
    networks: BTreeMap<String, NetworkConfig>,

    #[serde(default)]
    named_accounts: NamedAccounts,

    #[serde(default)]
    verification: VerificationConfig,
}

impl Registry {
    /// The networks the project has always been deployed to: a local node
    /// forking mainnet, Polygon Mumbai and Optimism Goerli.
    pub fn builtin() -> Self {
        let private_key = || AccountsConfig::PrivateKeys(vec![Setting::env("PRIVATE_KEY")]);
        let networks = BTreeMap::from([
            (
                "hardhat".to_string(),
                NetworkConfig {
                    chain_id: Some(31337),
                    rpc_url: Setting::literal("http://127.0.0.1:8545"),
                    fork_url: Some(Setting::env("ALCHEMY_MAINNET_URL")),
                    accounts: AccountsConfig::Mnemonic {
                        mnemonic: Setting::literal(TEST_MNEMONIC),
                        count: 20,
                    },
                },
            ),
            (
                "mumbai".to_string(),
                NetworkConfig {
                    chain_id: Some(80001),
                    rpc_url: Setting::env("ALCHEMY_MUMBAI_URL"),
                    fork_url: None,
                    accounts: private_key(),
                },
            ),
            (
                "optimism-goerli".to_string(),
                NetworkConfig {
                    chain_id: Some(420),
                    rpc_url: Setting::env("ALCHEMY_OPTGOERLI_MUMBAI_URL"),
                    fork_url: None,
                    accounts: private_key(),
                },
            ),
        ]);

        let named_accounts = NamedAccounts::default().with_role(
            accounts::DEPLOYER,
            RoleAccounts::new(Some(0)).with_network(1, 0),
        );

        let verification = VerificationConfig {
            api_keys: BTreeMap::from([
                (
                    "polygonMumbai".to_string(),
                    Setting::env("POLYGONSCAN_API_KEY"),
                ),
                (
                    "optimism-goerli".to_string(),
                    Setting::env("OPTGOERLI_API_KEY"),
                ),
            ]),
            custom_chains: optimism_goerli_explorer().into_iter().collect(),
        };

        Self {
            networks,
            named_accounts,
            verification,
        }
    }

    /// Loads a registry from a TOML file.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let data = fs::read_to_string(path).await.map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_toml(&data).map_err(|message| Error::Syntax {
            path: path.to_path_buf(),
            message,
        })?;
        tracing::debug!(
            ?path,
            networks = ?registry.network_names().collect::<Vec<_>>(),
            "loaded network registry"
        );
        Ok(registry)
    }

    fn from_toml(data: &str) -> Result<Self, String> {
        toml::from_str(data).map_err(|err: toml::de::Error| err.message().to_string())
    }

    pub fn network_names(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }

    pub fn network(&self, name: &str) -> Result<&NetworkConfig, Error> {
        self.networks
            .get(name)
            .ok_or_else(|| Error::UnknownNetwork(name.to_string()))
    }

    /// Resolves every setting of a network. Fails if any of them (endpoint,
    /// credentials) is missing from the environment.
    pub fn profile(&self, name: &str, env: &impl Environment) -> Result<NetworkProfile, Error> {
        self.network(name)?.resolve(name, env)
    }

    /// Index of the account playing `role` on the profile's network. The
    /// index has to point at one of the profile's credentials.
    pub fn named_account(&self, role: &str, profile: &NetworkProfile) -> Result<usize, Error> {
        let index = self
            .named_accounts
            .index(role, &profile.name, profile.chain_id)?;
        let available = profile.credentials.len();
        if index >= available {
            return Err(Error::AccountOutOfRange {
                role: role.to_string(),
                network: profile.name.clone(),
                index,
                available,
            });
        }
        Ok(index)
    }

    pub fn deployer(&self, profile: &NetworkProfile) -> Result<usize, Error> {
        self.named_account(accounts::DEPLOYER, profile)
    }

    pub fn verification(
        &self,
        network: &str,
        chain_id: u64,
        env: &impl Environment,
    ) -> Result<VerificationProfile, Error> {
        self.network(network)?;
        self.verification.resolve(network, chain_id, env)
    }
}

/// Optimism Goerli is not among the explorers the verification client knows.
fn optimism_goerli_explorer() -> Result<CustomChain, url::ParseError> {
    Ok(CustomChain {
        network: "optimism-goerli".to_string(),
        chain_id: 420,
        api_url: "https://api-goerli-optimism.etherscan.io/api".parse()?,
        browser_url: "https://goerli-optimism.etherscan.io".parse()?,
    })
}
