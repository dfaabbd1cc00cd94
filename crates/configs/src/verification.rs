use {
    crate::{Environment, Error, Secret, Setting},
    serde::Deserialize,
    std::collections::BTreeMap,
    url::Url,
};

/// Endpoints of an Etherscan compatible explorer for one chain.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ChainDescriptor {
    pub chain_id: u64,
    pub api_url: Url,
    pub browser_url: Url,
}

/// Explorer for a network that has no entry in [`KNOWN_EXPLORERS`].
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CustomChain {
    pub network: String,
    pub chain_id: u64,
    pub api_url: Url,
    pub browser_url: Url,
}

impl CustomChain {
    fn descriptor(&self) -> ChainDescriptor {
        ChainDescriptor {
            chain_id: self.chain_id,
            api_url: self.api_url.clone(),
            browser_url: self.browser_url.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct VerificationConfig {
    /// API keys by explorer key (see [`KNOWN_EXPLORERS`]) or by the network
    /// name of a custom chain.
    #[serde(default)]
    pub api_keys: BTreeMap<String, Setting>,

    #[serde(default)]
    pub custom_chains: Vec<CustomChain>,
}

pub struct KnownExplorer {
    pub key: &'static str,
    pub chain_id: u64,
    pub api_url: &'static str,
    pub browser_url: &'static str,
}

pub const KNOWN_EXPLORERS: &[KnownExplorer] = &[
    KnownExplorer {
        key: "mainnet",
        chain_id: 1,
        api_url: "https://api.etherscan.io/api",
        browser_url: "https://etherscan.io",
    },
    KnownExplorer {
        key: "goerli",
        chain_id: 5,
        api_url: "https://api-goerli.etherscan.io/api",
        browser_url: "https://goerli.etherscan.io",
    },
    KnownExplorer {
        key: "sepolia",
        chain_id: 11155111,
        api_url: "https://api-sepolia.etherscan.io/api",
        browser_url: "https://sepolia.etherscan.io",
    },
    KnownExplorer {
        key: "optimisticEthereum",
        chain_id: 10,
        api_url: "https://api-optimistic.etherscan.io/api",
        browser_url: "https://optimistic.etherscan.io",
    },
    KnownExplorer {
        key: "polygon",
        chain_id: 137,
        api_url: "https://api.polygonscan.com/api",
        browser_url: "https://polygonscan.com",
    },
    KnownExplorer {
        key: "polygonMumbai",
        chain_id: 80001,
        api_url: "https://api-testnet.polygonscan.com/api",
        browser_url: "https://mumbai.polygonscan.com",
    },
    KnownExplorer {
        key: "arbitrumOne",
        chain_id: 42161,
        api_url: "https://api.arbiscan.io/api",
        browser_url: "https://arbiscan.io",
    },
];

impl KnownExplorer {
    pub fn by_chain_id(chain_id: u64) -> Option<&'static Self> {
        KNOWN_EXPLORERS
            .iter()
            .find(|explorer| explorer.chain_id == chain_id)
    }

    fn descriptor(&self) -> Result<ChainDescriptor, Error> {
        let parse = |url: &str| {
            url.parse::<Url>().map_err(|err| Error::Invalid {
                field: format!("explorer {}", self.key),
                reason: err.to_string(),
            })
        };
        Ok(ChainDescriptor {
            chain_id: self.chain_id,
            api_url: parse(self.api_url)?,
            browser_url: parse(self.browser_url)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Explorer {
    Known {
        key: &'static str,
        chain: ChainDescriptor,
    },
    Custom(ChainDescriptor),
}

impl Explorer {
    pub fn chain(&self) -> &ChainDescriptor {
        match self {
            Self::Known { chain, .. } | Self::Custom(chain) => chain,
        }
    }
}

/// What is needed to verify sources on one network.
#[derive(Clone, Debug)]
pub struct VerificationProfile {
    pub api_key: Secret,
    pub explorer: Explorer,
}

impl VerificationProfile {
    /// The explicit descriptor the profile was configured with, if the chain
    /// is not a known one.
    pub fn custom_chain(&self) -> Option<&ChainDescriptor> {
        match &self.explorer {
            Explorer::Custom(chain) => Some(chain),
            Explorer::Known { .. } => None,
        }
    }
}

impl VerificationConfig {
    /// Finds the explorer for `network` running on `chain_id`. Custom chains
    /// are matched by network name, everything else needs a known explorer
    /// for the chain ID. There is no fallback explorer.
    pub fn resolve(
        &self,
        network: &str,
        chain_id: u64,
        env: &impl Environment,
    ) -> Result<VerificationProfile, Error> {
        let (explorer, key) = match self.custom_chains.iter().find(|c| c.network == network) {
            Some(custom) => {
                if custom.chain_id != chain_id {
                    return Err(Error::Invalid {
                        field: format!("verification.custom-chains.{network}.chain-id"),
                        reason: format!(
                            "configured as {} but the network reports {chain_id}",
                            custom.chain_id
                        ),
                    });
                }
                (Explorer::Custom(custom.descriptor()), network)
            }
            None => {
                let known =
                    KnownExplorer::by_chain_id(chain_id).ok_or_else(|| Error::NoExplorer {
                        network: network.to_string(),
                        chain_id,
                    })?;
                let explorer = Explorer::Known {
                    key: known.key,
                    chain: known.descriptor()?,
                };
                (explorer, known.key)
            }
        };

        let field = format!("verification.api-keys.{key}");
        let api_key = self
            .api_keys
            .get(key)
            .or_else(|| self.api_keys.get(network))
            .ok_or_else(|| Error::Missing {
                field: field.clone(),
                origin: "no entry".to_string(),
            })?
            .resolve_secret(&field, env)?;

        Ok(VerificationProfile { api_key, explorer })
    }
}
