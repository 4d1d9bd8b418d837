use std::sync::Arc;

use alloy::{
    primitives::{Address, Bytes},
    sol_types::SolCall,
};
use drip_domain::{Challenge, format_token_amount};

use crate::{
    BlockchainError, RpcClient, TokenMetadata, chains::evm::contracts::DripProfile,
};

#[derive(Clone)]
pub struct ProfileContract {
    client: Arc<dyn RpcClient>,
    address: Address,
    token: TokenMetadata,
}

impl ProfileContract {
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

    /// Challenges the profile contract lists for `account`.
    pub async fn fetch_challenges(&self, account: Address) -> Result<Vec<Challenge>, BlockchainError> {
        let calldata = DripProfile::getChallengesCall { account }.abi_encode();
        let raw = self.client.call(self.address, Bytes::from(calldata)).await?;
        let challenges = DripProfile::getChallengesCall::abi_decode_returns(&raw)
            .map_err(|e| BlockchainError::decode("getChallenges return", e))?;

        challenges
            .into_iter()
            .map(|challenge| self.to_domain(challenge))
            .collect()
    }

    pub async fn get_challenges(&self, account: Address) -> Option<Vec<Challenge>> {
        match self.fetch_challenges(account).await {
            Ok(challenges) => Some(challenges),
            Err(e) => {
                tracing::warn!(%account, error = %e, "Failed to fetch challenges");
                None
            }
        }
    }

    fn to_domain(&self, challenge: DripProfile::Challenge) -> Result<Challenge, BlockchainError> {
        let id = u64::try_from(challenge.id)
            .map_err(|e| BlockchainError::decode("challenge id", e))?;
        let stake_amount = format_token_amount(
            challenge.stakeAmount,
            self.token.decimals,
            self.token.display_decimal_places,
        )
        .map_err(|e| BlockchainError::decode("challenge stake amount", e))?;

        Ok(Challenge {
            id,
            creator: challenge.creator,
            description: challenge.description,
            stake_amount,
            start_time: challenge.startTime,
            end_time: challenge.endTime,
            participant_count: challenge.participantCount.saturating_to(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use alloy::primitives::{U256, address};

    use super::*;
    use crate::{
        FailureKind,
        testing::{MockFailure, MockRpcClient},
    };

    const PROFILE: Address = address!("0xbaA1e7FA30539Bc29b28D0553d3c9b13bfD575CA");
    const ACCOUNT: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    fn token() -> TokenMetadata {
        TokenMetadata {
            symbol: "DRP".to_string(),
            icon: "drip-logo-full".to_string(),
            decimals: 18,
            display_decimal_places: 6,
        }
    }

    fn raw_challenge(id: u64) -> DripProfile::Challenge {
        DripProfile::Challenge {
            id: U256::from(id),
            creator: ACCOUNT,
            description: format!("challenge #{id}"),
            stakeAmount: U256::from(5u64) * U256::from(10u64).pow(U256::from(17u64)),
            startTime: 1_700_000_000,
            endTime: 1_700_604_800,
            participantCount: U256::from(3u64),
        }
    }

    #[tokio::test]
    async fn maps_challenges_into_domain_records() {
        let mock = Arc::new(
            MockRpcClient::new(ACCOUNT)
                .with_challenges(ACCOUNT, vec![raw_challenge(1), raw_challenge(2)]),
        );
        let profile = ProfileContract::new(mock.clone(), PROFILE, token());

        let challenges = profile.get_challenges(ACCOUNT).await.unwrap();
        assert_eq!(challenges.len(), 2);
        assert_eq!(challenges[0].id, 1);
        assert_eq!(challenges[1].description, "challenge #2");
        assert_eq!(challenges[0].stake_amount, "0.500000");
        assert_eq!(challenges[0].participant_count, 3);
        assert_eq!(challenges[0].end_time, 1_700_604_800);
    }

    #[tokio::test]
    async fn account_without_challenges_gets_empty_list() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT));
        let profile = ProfileContract::new(mock, PROFILE, token());

        assert_eq!(profile.get_challenges(ACCOUNT).await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn failures_map_to_none_and_typed_errors() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT));
        let profile = ProfileContract::new(mock.clone(), PROFILE, token());

        mock.fail_calls(
            DripProfile::getChallengesCall::SELECTOR,
            MockFailure::Revert("ProfileNotFound".to_string()),
        );
        assert_eq!(profile.get_challenges(ACCOUNT).await, None);
        assert_eq!(
            profile.fetch_challenges(ACCOUNT).await.unwrap_err().kind(),
            FailureKind::Revert
        );

        mock.fail_calls(
            DripProfile::getChallengesCall::SELECTOR,
            MockFailure::MalformedResponse,
        );
        assert_eq!(profile.get_challenges(ACCOUNT).await, None);
    }

    #[tokio::test]
    async fn oversized_challenge_id_is_a_decode_error() {
        let mut challenge = raw_challenge(1);
        challenge.id = U256::MAX;
        let mock = Arc::new(MockRpcClient::new(ACCOUNT).with_challenges(ACCOUNT, vec![challenge]));
        let profile = ProfileContract::new(mock, PROFILE, token());

        let err = profile.fetch_challenges(ACCOUNT).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Decode);
    }
}
