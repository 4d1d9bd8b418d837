use std::sync::Arc;

use alloy::{
    primitives::{Address, Bytes, TxHash, U256},
    sol_types::SolCall,
};
use drip_domain::format_token_amount;

use crate::{
    BlockchainError, RpcClient, TokenMetadata, chains::evm::contracts::DripToken,
};

/// The Drip reward token: ERC20 plus the owner-only `setBalance`.
#[derive(Clone)]
pub struct Erc20Contract {
    client: Arc<dyn RpcClient>,
    address: Address,
    metadata: TokenMetadata,
    default_spender: Address,
}

impl Erc20Contract {
    /// `default_spender` is the contract that pulls stakes, used by
    /// [`Self::approve_challenge_transfer`].
    pub fn new(
        client: Arc<dyn RpcClient>,
        address: Address,
        metadata: TokenMetadata,
        default_spender: Address,
    ) -> Self {
        Self {
            client,
            address,
            metadata,
            default_spender,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn default_spender(&self) -> Address {
        self.default_spender
    }

    pub async fn decimals(&self) -> Result<u8, BlockchainError> {
        let calldata = DripToken::decimalsCall {}.abi_encode();
        let raw = self.client.call(self.address, Bytes::from(calldata)).await?;
        DripToken::decimalsCall::abi_decode_returns(&raw)
            .map_err(|e| BlockchainError::decode("decimals return", e))
    }

    pub async fn symbol(&self) -> Result<String, BlockchainError> {
        let calldata = DripToken::symbolCall {}.abi_encode();
        let raw = self.client.call(self.address, Bytes::from(calldata)).await?;
        DripToken::symbolCall::abi_decode_returns(&raw)
            .map_err(|e| BlockchainError::decode("symbol return", e))
    }

    /// Checks the configured metadata against the deployed token.
    ///
    /// Wrong decimals would misstate every amount, so they are an error. A
    /// different symbol is only logged.
    pub async fn verify_metadata(&self) -> Result<(), BlockchainError> {
        let decimals = self.decimals().await?;
        if decimals != self.metadata.decimals {
            return Err(BlockchainError::TokenMetadataMismatch {
                field: "decimals",
                configured: self.metadata.decimals.to_string(),
                actual: decimals.to_string(),
            });
        }

        match self.symbol().await {
            Ok(symbol) if symbol != self.metadata.symbol => tracing::warn!(
                configured = %self.metadata.symbol,
                actual = %symbol,
                "Reward token symbol differs from configuration"
            ),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to read reward token symbol"),
        }

        tracing::debug!(token = %self.address, decimals, "Reward token metadata verified");
        Ok(())
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256, BlockchainError> {
        let calldata = DripToken::balanceOfCall { account }.abi_encode();
        let raw = self.client.call(self.address, Bytes::from(calldata)).await?;
        DripToken::balanceOfCall::abi_decode_returns(&raw)
            .map_err(|e| BlockchainError::decode("balanceOf return", e))
    }

    /// Balance formatted with the token's display precision, or `None` when
    /// it could not be read.
    pub async fn get_balance(&self, account: Address) -> Option<String> {
        let raw = match self.balance_of(account).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(%account, error = %e, "Failed to read token balance");
                return None;
            }
        };

        match format_token_amount(
            raw,
            self.metadata.decimals,
            self.metadata.display_decimal_places,
        ) {
            Ok(formatted) => Some(formatted),
            Err(e) => {
                tracing::warn!(%account, error = %e, "Failed to format token balance");
                None
            }
        }
    }

    pub async fn allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> Result<U256, BlockchainError> {
        let calldata = DripToken::allowanceCall { owner, spender }.abi_encode();
        let raw = self.client.call(self.address, Bytes::from(calldata)).await?;
        DripToken::allowanceCall::abi_decode_returns(&raw)
            .map_err(|e| BlockchainError::decode("allowance return", e))
    }

    /// Approves `spender` for `amount` raw units and waits for confirmation.
    pub async fn approve(&self, spender: Address, amount: U256) -> Result<TxHash, BlockchainError> {
        let calldata = DripToken::approveCall {
            spender,
            value: amount,
        }
        .abi_encode();
        let tx_hash = self
            .client
            .send_transaction(self.address, Bytes::from(calldata))
            .await?;
        tracing::debug!(%tx_hash, %spender, %amount, "Approval submitted");

        self.client.wait_for_receipt(tx_hash).await?;
        tracing::info!(%tx_hash, %spender, %amount, "Approval confirmed");
        Ok(tx_hash)
    }

    /// `true` only if the approval was both submitted and confirmed.
    pub async fn approve_transfer(&self, spender: Address, amount: U256) -> bool {
        match self.approve(spender, amount).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(%spender, %amount, error = %e, "Approval failed");
                false
            }
        }
    }

    pub async fn approve_challenge_transfer(&self, amount: U256) -> bool {
        self.approve_transfer(self.default_spender, amount).await
    }

    /// Submits `setBalance(account, amount)` without waiting for inclusion.
    pub async fn submit_set_balance(
        &self,
        account: Address,
        amount: U256,
    ) -> Result<TxHash, BlockchainError> {
        let calldata = DripToken::setBalanceCall { account, amount }.abi_encode();
        self.client
            .send_transaction(self.address, Bytes::from(calldata))
            .await
    }

    pub async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<(), BlockchainError> {
        self.client.wait_for_receipt(tx_hash).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use alloy::primitives::address;

    use super::*;
    use crate::testing::{MockFailure, MockRpcClient};

    const TOKEN: Address = address!("0x235c36243BD73d65B530a469658FeF591daA2f45");
    const CHALLENGE: Address = address!("0xBef730bae27148884B7E853d0637a948F8700132");
    const ACCOUNT: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    fn metadata() -> TokenMetadata {
        TokenMetadata {
            symbol: "DRP".to_string(),
            icon: "drip-logo-full".to_string(),
            decimals: 18,
            display_decimal_places: 6,
        }
    }

    fn token(mock: &Arc<MockRpcClient>) -> Erc20Contract {
        Erc20Contract::new(mock.clone(), TOKEN, metadata(), CHALLENGE)
    }

    #[tokio::test]
    async fn get_balance_formats_with_display_places() {
        let raw = U256::from(123u64) * U256::from(10u64).pow(U256::from(18u64));
        let mock = Arc::new(MockRpcClient::new(ACCOUNT).with_balance(ACCOUNT, raw));
        let token = token(&mock);

        assert_eq!(token.balance_of(ACCOUNT).await.unwrap(), raw);
        assert_eq!(token.get_balance(ACCOUNT).await.as_deref(), Some("123.000000"));

        let (to, _) = mock.calls().into_iter().next().unwrap();
        assert_eq!(to, TOKEN);
    }

    #[tokio::test]
    async fn get_balance_truncates_extra_digits() {
        // 1.2345678 tokens
        let raw = U256::from(1_234_567_800_000_000_000u64);
        let mock = Arc::new(MockRpcClient::new(ACCOUNT).with_balance(ACCOUNT, raw));

        assert_eq!(token(&mock).get_balance(ACCOUNT).await.as_deref(), Some("1.234567"));
    }

    #[tokio::test]
    async fn get_balance_is_none_on_transport_or_decode_failure() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT));
        let token = token(&mock);

        mock.fail_calls(DripToken::balanceOfCall::SELECTOR, MockFailure::Network);
        assert_eq!(token.get_balance(ACCOUNT).await, None);

        mock.fail_calls(
            DripToken::balanceOfCall::SELECTOR,
            MockFailure::MalformedResponse,
        );
        assert_eq!(token.get_balance(ACCOUNT).await, None);
        let err = token.balance_of(ACCOUNT).await.unwrap_err();
        assert_eq!(err.kind(), crate::FailureKind::Decode);
    }

    #[tokio::test]
    async fn verify_metadata_accepts_matching_token() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT));
        let token = token(&mock);

        assert_eq!(token.decimals().await.unwrap(), 18);
        assert_eq!(token.symbol().await.unwrap(), "DRP");
        token.verify_metadata().await.unwrap();
    }

    #[tokio::test]
    async fn verify_metadata_rejects_wrong_decimals() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT).with_token_metadata(6, "DRP"));

        let err = token(&mock).verify_metadata().await.unwrap_err();
        assert!(matches!(
            err,
            BlockchainError::TokenMetadataMismatch { field: "decimals", .. }
        ));
        assert_eq!(err.kind(), crate::FailureKind::Decode);
    }

    #[tokio::test]
    async fn verify_metadata_tolerates_other_symbol() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT).with_token_metadata(18, "tDRP"));

        token(&mock).verify_metadata().await.unwrap();
    }

    #[tokio::test]
    async fn approve_transfer_is_true_after_confirmation() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT));
        let token = token(&mock);
        let amount = U256::from(50u64);

        assert!(token.approve_challenge_transfer(amount).await);
        assert_eq!(mock.send_count(), 1);
        assert_eq!(mock.receipts().len(), 1);
        assert_eq!(mock.allowance(ACCOUNT, CHALLENGE), amount);
        assert_eq!(token.allowance(ACCOUNT, CHALLENGE).await.unwrap(), amount);
    }

    #[tokio::test]
    async fn failed_allowance_read_leaves_confirmed_approval_intact() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT));
        let token = token(&mock);
        let amount = U256::from(75u64);

        token.approve(CHALLENGE, amount).await.unwrap();
        mock.fail_calls(DripToken::allowanceCall::SELECTOR, MockFailure::Network);

        assert!(token.allowance(ACCOUNT, CHALLENGE).await.is_err());
        assert_eq!(mock.allowance(ACCOUNT, CHALLENGE), amount);
        assert_eq!(mock.send_count(), 1);
    }

    #[tokio::test]
    async fn approve_transfer_is_false_when_submission_fails() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT));
        mock.fail_sends(MockFailure::Revert("ERC20InvalidSpender".to_string()));

        assert!(!token(&mock).approve_transfer(CHALLENGE, U256::from(1u64)).await);
        assert!(mock.receipts().is_empty());
    }

    #[tokio::test]
    async fn approve_transfer_is_false_when_confirmation_fails() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT));
        mock.fail_receipts(MockFailure::Revert("reverted".to_string()));
        let token = token(&mock);

        assert!(!token.approve_transfer(CHALLENGE, U256::from(1u64)).await);
        assert_eq!(mock.send_count(), 1);

        let err = token.approve(CHALLENGE, U256::from(1u64)).await.unwrap_err();
        assert!(matches!(err, BlockchainError::TransactionReverted { .. }));
    }
}
