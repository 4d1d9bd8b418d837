//! Observable client state.
//!
//! Every field is a `watch` channel written by exactly one method. Each user
//! action runs as its own task; aborting the returned handle stops the
//! observation but cannot recall a transaction that was already sent.

mod state;

use std::sync::Arc;

use drip_blockchain::{
    Address, BlockchainError, Challenge, ClaimOutcome, ClaimStage, Contracts, EpochInfo,
    RewardClaimer, U256,
};
pub(crate) use state::ClaimStatus;
use tokio::{sync::watch, task::JoinHandle};

#[derive(Clone)]
pub(crate) struct ChallengePool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    account: Address,
    contracts: Contracts,
    claimer: RewardClaimer,
    challenges: watch::Sender<Vec<Challenge>>,
    epoch_info: watch::Sender<Option<EpochInfo>>,
    balance: watch::Sender<Option<String>>,
    claim_status: watch::Sender<ClaimStatus>,
}

impl ChallengePool {
    /// State for `account`, crediting `claim_reward` raw units per claim.
    pub(crate) fn new(contracts: Contracts, account: Address, claim_reward: U256) -> Self {
        let claimer = RewardClaimer::new(contracts.token().clone(), claim_reward);

        Self {
            inner: Arc::new(PoolInner {
                account,
                contracts,
                claimer,
                challenges: watch::Sender::new(Vec::new()),
                epoch_info: watch::Sender::new(None),
                balance: watch::Sender::new(None),
                claim_status: watch::Sender::new(ClaimStatus::Idle),
            }),
        }
    }

    pub(crate) fn account(&self) -> Address {
        self.inner.account
    }

    pub(crate) fn contracts(&self) -> &Contracts {
        &self.inner.contracts
    }

    /// Clears the list, then publishes the fetched challenges. A failed fetch
    /// leaves the list empty.
    pub(crate) fn fetch_challenges(&self) -> JoinHandle<()> {
        self.inner.challenges.send_replace(Vec::new());

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let challenges = inner
                .contracts
                .profile()
                .get_challenges(inner.account)
                .await
                .unwrap_or_default();
            tracing::debug!(count = challenges.len(), "Challenges updated");
            inner.challenges.send_replace(challenges);
        })
    }

    /// Publishes the epoch info on success; keeps the previous value otherwise.
    pub(crate) fn fetch_epoch_info(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Some(info) = inner.contracts.challenge_manager().get_epoch_info().await {
                tracing::debug!(epoch = info.epoch, "Epoch info updated");
                inner.epoch_info.send_replace(Some(info));
            }
        })
    }

    pub(crate) fn refresh_balance(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.publish_balance().await })
    }

    /// Claims the reward for the pool's account.
    ///
    /// Status becomes `Claiming` once the claim starts, then `Claimed` or
    /// `Failed`. A claim rejected as already in flight leaves it untouched.
    /// The balance is re-read after a confirmed claim.
    ///
    /// The returned handle only observes the claim. Aborting it leaves the
    /// claim running to its final status.
    pub(crate) fn claim(&self) -> JoinHandle<ClaimOutcome> {
        let claim = tokio::spawn(Arc::clone(&self.inner).run_claim());
        tokio::spawn(async move {
            claim.await.unwrap_or_else(|error| {
                tracing::error!(%error, "Claim task ended unexpectedly");
                ClaimOutcome::SubmissionFailed(BlockchainError::Custom(format!(
                    "claim task ended unexpectedly: {error}"
                )))
            })
        })
    }

    pub(crate) fn subscribe_challenges(&self) -> watch::Receiver<Vec<Challenge>> {
        self.inner.challenges.subscribe()
    }

    pub(crate) fn subscribe_epoch_info(&self) -> watch::Receiver<Option<EpochInfo>> {
        self.inner.epoch_info.subscribe()
    }

    pub(crate) fn subscribe_balance(&self) -> watch::Receiver<Option<String>> {
        self.inner.balance.subscribe()
    }

    pub(crate) fn subscribe_claim_status(&self) -> watch::Receiver<ClaimStatus> {
        self.inner.claim_status.subscribe()
    }
}

impl PoolInner {
    async fn run_claim(self: Arc<Self>) -> ClaimOutcome {
        let observer = Arc::clone(&self);
        let outcome = self
            .claimer
            .claim_with_progress(self.account, move |stage| {
                if stage == ClaimStage::BalanceRequested {
                    observer.claim_status.send_replace(ClaimStatus::Claiming);
                }
            })
            .await;

        match &outcome {
            ClaimOutcome::Confirmed { .. } => {
                self.claim_status.send_replace(ClaimStatus::Claimed);
                self.publish_balance().await;
            }
            ClaimOutcome::AlreadyInFlight => {}
            failed => {
                if let Some(kind) = failed.failure_kind() {
                    self.claim_status.send_replace(ClaimStatus::Failed(kind));
                }
            }
        }

        outcome
    }

    async fn publish_balance(&self) {
        let balance = self.contracts.token().get_balance(self.account).await;
        self.balance.send_replace(balance);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use alloy::{primitives::address, sol_types::SolCall};
    use drip_blockchain::{
        ChainConfig, ChainConfigRaw, ChallengeManager, ContractAddressSetRaw, DripProfile,
        DripToken, EnvironmentKey, FailureKind, RpcClient, TokenMetadata,
        testing::{MockFailure, MockRpcClient},
    };

    use super::*;

    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ACCOUNT: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    fn chain_config() -> ChainConfig {
        ChainConfigRaw {
            rpc_endpoints: vec!["http://localhost:8545".to_string()],
            chain_id: 31337,
            native_token_symbol: "ETH".to_string(),
            native_token_icon: "token-eth".to_string(),
            contracts: ContractAddressSetRaw {
                profile: Some("0x0000000000000000000000000000000000000001".to_string()),
                challenge: Some("0x0000000000000000000000000000000000000002".to_string()),
                challenge_manager: Some("0x0000000000000000000000000000000000000003".to_string()),
                reward_token: Some("0x0000000000000000000000000000000000000004".to_string()),
            },
            reward_token: TokenMetadata {
                symbol: "DRP".to_string(),
                icon: "drip-logo-full".to_string(),
                decimals: 18,
                display_decimal_places: 6,
            },
            wallet_private_key: Some(DEV_KEY.to_string()),
            wallet_address: None,
            max_rpc_requests_per_second: None,
            tx_confirmations: 1,
            tx_receipt_timeout_ms: 1_000,
        }
        .resolve(EnvironmentKey::Local)
        .unwrap()
    }

    fn tokens(n: u64) -> U256 {
        drip_domain::whole_tokens_to_units(n, 18).unwrap()
    }

    fn pool(mock: &Arc<MockRpcClient>) -> ChallengePool {
        let client: Arc<dyn RpcClient> = mock.clone();
        ChallengePool::new(Contracts::new(client, &chain_config()), ACCOUNT, tokens(100))
    }

    fn raw_challenge(id: u64) -> DripProfile::Challenge {
        DripProfile::Challenge {
            id: U256::from(id),
            creator: ACCOUNT,
            description: format!("challenge #{id}"),
            stakeAmount: tokens(10),
            startTime: 1_700_000_000,
            endTime: 1_700_604_800,
            participantCount: U256::from(4u64),
        }
    }

    fn raw_epoch(epoch: u64) -> ChallengeManager::EpochInfo {
        ChallengeManager::EpochInfo {
            epoch: U256::from(epoch),
            description: "Sleep 8 hours".to_string(),
            participantCount: U256::from(20u64),
            totalStakedAmount: tokens(2_000),
            startTime: 1_700_000_000,
            endTime: 1_700_604_800,
        }
    }

    #[tokio::test]
    async fn fetch_challenges_publishes_list() {
        let mock = Arc::new(
            MockRpcClient::new(ACCOUNT).with_challenges(ACCOUNT, vec![raw_challenge(1), raw_challenge(2)]),
        );
        let pool = pool(&mock);
        let challenges = pool.subscribe_challenges();

        pool.fetch_challenges().await.unwrap();

        let published = challenges.borrow().clone();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].stake_amount, "10.000000");
    }

    #[tokio::test]
    async fn failed_challenge_fetch_leaves_list_empty() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT).with_challenges(ACCOUNT, vec![raw_challenge(1)]));
        let pool = pool(&mock);
        pool.fetch_challenges().await.unwrap();
        assert_eq!(pool.subscribe_challenges().borrow().len(), 1);

        mock.fail_calls(DripProfile::getChallengesCall::SELECTOR, MockFailure::Network);
        pool.fetch_challenges().await.unwrap();
        assert!(pool.subscribe_challenges().borrow().is_empty());
    }

    #[tokio::test]
    async fn epoch_info_is_published_only_on_success() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT).with_epoch_info(raw_epoch(3)));
        let pool = pool(&mock);
        let epoch_info = pool.subscribe_epoch_info();

        pool.fetch_epoch_info().await.unwrap();
        assert_eq!(epoch_info.borrow().as_ref().map(|info| info.epoch), Some(3));

        mock.fail_calls(
            ChallengeManager::getEpochInfoCall::SELECTOR,
            MockFailure::MalformedResponse,
        );
        pool.fetch_epoch_info().await.unwrap();
        assert_eq!(epoch_info.borrow().as_ref().map(|info| info.epoch), Some(3));
    }

    #[tokio::test]
    async fn refresh_balance_publishes_formatted_or_none() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT).with_balance(ACCOUNT, tokens(123)));
        let pool = pool(&mock);
        let balance = pool.subscribe_balance();

        pool.refresh_balance().await.unwrap();
        assert_eq!(balance.borrow().as_deref(), Some("123.000000"));

        mock.fail_calls(DripToken::balanceOfCall::SELECTOR, MockFailure::Network);
        pool.refresh_balance().await.unwrap();
        assert_eq!(*balance.borrow(), None);
    }

    #[tokio::test]
    async fn confirmed_claim_marks_claimed_and_refreshes_balance() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT).with_balance(ACCOUNT, tokens(1)));
        let pool = pool(&mock);

        let outcome = pool.claim().await.unwrap();

        assert!(outcome.is_confirmed());
        assert_eq!(*pool.subscribe_claim_status().borrow(), ClaimStatus::Claimed);
        assert_eq!(pool.subscribe_balance().borrow().as_deref(), Some("101.000000"));
    }

    #[tokio::test]
    async fn failed_submission_never_marks_claimed() {
        let mock = Arc::new(MockRpcClient::new(ACCOUNT));
        mock.fail_sends(MockFailure::Network);
        let pool = pool(&mock);
        let mut status = pool.subscribe_claim_status();

        let watcher = tokio::spawn(async move {
            let mut seen = Vec::new();
            while status.changed().await.is_ok() {
                seen.push(*status.borrow_and_update());
            }
            seen
        });

        let outcome = pool.claim().await.unwrap();
        assert!(matches!(outcome, ClaimOutcome::SubmissionFailed(_)));
        assert_eq!(
            *pool.subscribe_claim_status().borrow(),
            ClaimStatus::Failed(FailureKind::Network)
        );
        assert_eq!(*pool.subscribe_balance().borrow(), None);

        drop(pool);
        let seen = watcher.await.unwrap();
        assert!(!seen.contains(&ClaimStatus::Claimed));
    }

    #[tokio::test]
    async fn concurrent_claims_submit_once() {
        let mock = Arc::new(
            MockRpcClient::new(ACCOUNT).with_send_delay(Duration::from_millis(50)),
        );
        let pool = pool(&mock);

        let first = pool.claim();
        let second = pool.claim();
        let outcomes = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(outcomes.iter().filter(|o| o.is_confirmed()).count(), 1);
        assert!(
            outcomes
                .iter()
                .any(|o| matches!(o, ClaimOutcome::AlreadyInFlight))
        );
        assert_eq!(mock.send_count(), 1);
        assert_eq!(*pool.subscribe_claim_status().borrow(), ClaimStatus::Claimed);
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn aborting_a_claim_does_not_recall_the_transaction() {
        let mock = Arc::new(
            MockRpcClient::new(ACCOUNT).with_send_delay(Duration::from_millis(20)),
        );
        let pool = pool(&mock);

        let handle = pool.claim();
        wait_until(|| mock.send_count() == 1).await;
        handle.abort();

        assert_eq!(mock.send_count(), 1);
        assert_eq!(mock.balance(ACCOUNT), tokens(100));
    }

    #[tokio::test]
    async fn aborted_claim_still_guards_account_and_finishes() {
        let mock = Arc::new(
            MockRpcClient::new(ACCOUNT)
                .with_balance(ACCOUNT, tokens(1))
                .with_receipt_delay(Duration::from_millis(300)),
        );
        let pool = pool(&mock);
        let status = pool.subscribe_claim_status();

        let handle = pool.claim();
        wait_until(|| mock.receipts().len() == 1).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        let second = pool.claim().await.unwrap();
        assert!(matches!(second, ClaimOutcome::AlreadyInFlight));
        assert_eq!(mock.send_count(), 1);

        wait_until(|| *status.borrow() == ClaimStatus::Claimed).await;
        wait_until(|| pool.subscribe_balance().borrow().is_some()).await;
        assert_eq!(pool.subscribe_balance().borrow().as_deref(), Some("101.000000"));
        assert_eq!(mock.send_count(), 1);
    }
}
