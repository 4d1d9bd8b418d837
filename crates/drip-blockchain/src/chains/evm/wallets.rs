use alloy::{
    network::EthereumWallet,
    signers::local::{LocalSignerError, PrivateKeySigner},
};

use crate::BlockchainError;

pub(crate) fn signer_from_private_key(
    private_key: &str,
) -> Result<PrivateKeySigner, BlockchainError> {
    let private_key = private_key.trim();
    private_key
        .parse()
        .map_err(|e: LocalSignerError| BlockchainError::InvalidPrivateKey {
            key_length: private_key.len(),
            source: e,
        })
}

pub(crate) fn wallet_from_signer(signer: PrivateKeySigner) -> EthereumWallet {
    EthereumWallet::from(signer)
}
