use std::sync::Arc;

use alloy::{
    primitives::{Address, Bytes},
    sol_types::SolCall,
};
use drip_domain::{EpochInfo, format_token_amount};

use crate::{
    BlockchainError, RpcClient, TokenMetadata, chains::evm::contracts::ChallengeManager,
};

#[derive(Clone)]
pub struct ChallengeManagerContract {
    client: Arc<dyn RpcClient>,
    address: Address,
    token: TokenMetadata,
}

impl ChallengeManagerContract {
    pub fn new(client: Arc<dyn RpcClient>, address: Address, token: TokenMetadata) -> Self {
        Self {
            client,
            address,
            token,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn fetch_epoch_info(&self) -> Result<EpochInfo, BlockchainError> {
        let calldata = ChallengeManager::getEpochInfoCall {}.abi_encode();
        let raw = self.client.call(self.address, Bytes::from(calldata)).await?;
        let info = ChallengeManager::getEpochInfoCall::abi_decode_returns(&raw)
            .map_err(|e| BlockchainError::decode("getEpochInfo return", e))?;

        let epoch =
            u64::try_from(info.epoch).map_err(|e| BlockchainError::decode("epoch number", e))?;
        let total_staked_amount = format_token_amount(
            info.totalStakedAmount,
            self.token.decimals,
            self.token.display_decimal_places,
        )
        .map_err(|e| BlockchainError::decode("epoch total stake", e))?;

        Ok(EpochInfo {
            epoch,
            description: info.description,
            participant_count: info.participantCount.saturating_to(),
            total_staked_amount,
            start_time: info.startTime,
            end_time: info.endTime,
        })
    }

    pub async fn get_epoch_info(&self) -> Option<EpochInfo> {
        match self.fetch_epoch_info().await {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch epoch info");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use alloy::primitives::{U256, address};

    use super::*;
    use crate::testing::{MockFailure, MockRpcClient};

    const MANAGER: Address = address!("0xaE9fd9feaE497c733f53c304fAC2E67bC8148041");
    const ACCOUNT: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    fn token() -> TokenMetadata {
        TokenMetadata {
            symbol: "DRP".to_string(),
            icon: "drip-logo-full".to_string(),
            decimals: 18,
            display_decimal_places: 6,
        }
    }

    fn raw_epoch() -> ChallengeManager::EpochInfo {
        ChallengeManager::EpochInfo {
            epoch: U256::from(7u64),
            description: "Walk 10k steps a day".to_string(),
            participantCount: U256::from(12u64),
            totalStakedAmount: U256::from(1200u64) * U256::from(10u64).pow(U256::from(18u64)),
            startTime: 1_700_000_000,
            endTime: 1_700_604_800,
        }
    }

    #[tokio::test]
    async fn maps_epoch_info() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT).with_epoch_info(raw_epoch()));
        let manager = ChallengeManagerContract::new(mock, MANAGER, token());

        let info = manager.get_epoch_info().await.unwrap();
        assert_eq!(info.epoch, 7);
        assert_eq!(info.description, "Walk 10k steps a day");
        assert_eq!(info.total_staked_amount, "1200.000000");
        assert_eq!(info.displayed_participants(), "12");
        assert_eq!(info.days_remaining(1_700_000_000), 7);
    }

    #[tokio::test]
    async fn epoch_info_is_none_on_failure() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT).with_epoch_info(raw_epoch()));
        let manager = ChallengeManagerContract::new(mock.clone(), MANAGER, token());

        mock.fail_calls(
            ChallengeManager::getEpochInfoCall::SELECTOR,
            MockFailure::Network,
        );
        assert_eq!(manager.get_epoch_info().await, None);

        mock.fail_calls(
            ChallengeManager::getEpochInfoCall::SELECTOR,
            MockFailure::MalformedResponse,
        );
        assert_eq!(manager.get_epoch_info().await, None);
    }

    #[tokio::test]
    async fn epoch_not_started_is_a_revert() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT));
        let manager = ChallengeManagerContract::new(mock, MANAGER, token());

        let err = manager.fetch_epoch_info().await.unwrap_err();
        assert_eq!(err.kind(), crate::FailureKind::Revert);
    }
}
