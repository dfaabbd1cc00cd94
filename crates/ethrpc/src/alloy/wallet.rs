use {
    alloy::{
        network::EthereumWallet,
        primitives::Address,
        signers::local::{MnemonicBuilder, PrivateKeySigner, coins_bip39::English},
    },
    configs::Credentials,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("network has no signing accounts configured")]
    NoAccounts,
    #[error("account index {index} is out of range, only {available} account(s) configured")]
    OutOfRange { index: usize, available: usize },
    // The underlying error is dropped on purpose, it may quote key material.
    #[error("private key of account {0} is malformed")]
    InvalidPrivateKey(usize),
    #[error("cannot derive account {0} from the configured mnemonic")]
    InvalidMnemonic(usize),
}

/// Signer of the `index`th account.
pub fn signer(credentials: &Credentials, index: usize) -> Result<PrivateKeySigner, Error> {
    let available = credentials.len();
    if index >= available {
        return Err(Error::OutOfRange { index, available });
    }
    match credentials {
        Credentials::PrivateKeys(keys) => keys[index]
            .expose()
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|_| Error::InvalidPrivateKey(index)),
        Credentials::Mnemonic { phrase, .. } => {
            let derivation_index =
                u32::try_from(index).map_err(|_| Error::InvalidMnemonic(index))?;
            MnemonicBuilder::<English>::default()
                .phrase(phrase.expose())
                .index(derivation_index)
                .and_then(|builder| builder.build())
                .map_err(|_| Error::InvalidMnemonic(index))
        }
    }
}

/// Address of the `index`th account.
pub fn address(credentials: &Credentials, index: usize) -> Result<Address, Error> {
    signer(credentials, index).map(|signer| signer.address())
}

/// Wallet holding every account of the network. The first account is the
/// default signer, any other one is picked by setting `from` on a transaction.
pub fn wallet(credentials: &Credentials) -> Result<EthereumWallet, Error> {
    if credentials.is_empty() {
        return Err(Error::NoAccounts);
    }
    let mut wallet = EthereumWallet::new(signer(credentials, 0)?);
    for index in 1..credentials.len() {
        wallet.register_signer(signer(credentials, index)?);
    }
    Ok(wallet)
}
