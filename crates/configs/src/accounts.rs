use {
    crate::Error,
    serde::Deserialize,
    std::collections::BTreeMap,
};

/// Role under which the account that creates contracts is registered.
pub const DEPLOYER: &str = "deployer";

/// Maps logical account roles to account indices.
///
/// ```toml
/// [named-accounts.deployer]
/// default = 0
/// 1 = 0           # by chain ID
/// mumbai = 1      # by network name
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct NamedAccounts(BTreeMap<String, RoleAccounts>);

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RoleAccounts {
    #[serde(default)]
    default: Option<usize>,
    /// Keyed by network name or chain ID.
    #[serde(flatten)]
    networks: BTreeMap<String, usize>,
}

impl RoleAccounts {
    pub fn new(default: Option<usize>) -> Self {
        Self {
            default,
            networks: Default::default(),
        }
    }

    pub fn with_network(mut self, key: impl ToString, index: usize) -> Self {
        self.networks.insert(key.to_string(), index);
        self
    }
}

impl NamedAccounts {
    pub fn with_role(mut self, role: impl Into<String>, accounts: RoleAccounts) -> Self {
        self.0.insert(role.into(), accounts);
        self
    }

    /// Index of the account playing `role` on a network. A network name entry
    /// wins over a chain ID entry which wins over the default.
    pub fn index(&self, role: &str, network: &str, chain_id: Option<u64>) -> Result<usize, Error> {
        let unresolved = || Error::UnresolvedAccount {
            role: role.to_string(),
            network: network.to_string(),
        };
        let accounts = self.0.get(role).ok_or_else(unresolved)?;
        accounts
            .networks
            .get(network)
            .or_else(|| chain_id.and_then(|id| accounts.networks.get(&id.to_string())))
            .or(accounts.default.as_ref())
            .copied()
            .ok_or_else(unresolved)
    }
}
