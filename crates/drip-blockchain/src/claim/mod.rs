//! Reward claim: read the balance, credit the reward with `setBalance`, and
//! wait for the transaction to land.

use alloy::primitives::{Address, TxHash, U256};

use crate::{BlockchainError, FailureKind, contracts::Erc20Contract};

mod single_flight;

pub use single_flight::{SingleFlight, SingleFlightGuard};

/// Whole tokens credited per claim unless configured otherwise.
pub const DEFAULT_REWARD_TOKENS: u64 = 100;

/// Progress of one claim attempt. Every attempt starts at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimStage {
    Idle,
    BalanceRequested,
    BalanceReceived,
    TransactionSubmitted,
    Confirmed,
    Aborted,
}

/// Result of [`RewardClaimer::claim`].
#[derive(Debug)]
pub enum ClaimOutcome {
    /// The reward landed on-chain.
    Confirmed {
        tx_hash: TxHash,
        previous_balance: U256,
        new_balance: U256,
    },
    /// Another claim for the same account is still running. Nothing was sent.
    AlreadyInFlight,
    /// The current balance could not be determined. Nothing was sent.
    BalanceUnavailable(BlockchainError),
    /// The transaction was never accepted by the node.
    SubmissionFailed(BlockchainError),
    /// The transaction was sent but did not confirm successfully.
    ConfirmationFailed {
        tx_hash: TxHash,
        error: BlockchainError,
    },
}

impl ClaimOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ClaimOutcome::Confirmed { .. })
    }

    /// Class of the failure; `None` for success and concurrency rejection.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ClaimOutcome::Confirmed { .. } | ClaimOutcome::AlreadyInFlight => None,
            ClaimOutcome::BalanceUnavailable(error)
            | ClaimOutcome::SubmissionFailed(error)
            | ClaimOutcome::ConfirmationFailed { error, .. } => Some(error.kind()),
        }
    }

    /// Hash of the submitted transaction, if one was submitted.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            ClaimOutcome::Confirmed { tx_hash, .. }
            | ClaimOutcome::ConfirmationFailed { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }
}

/// Credits a fixed reward to accounts, one claim per account at a time.
#[derive(Clone)]
pub struct RewardClaimer {
    token: Erc20Contract,
    reward: U256,
    in_flight: SingleFlight<Address>,
}

impl RewardClaimer {
    /// `reward` is in raw token units.
    pub fn new(token: Erc20Contract, reward: U256) -> Self {
        Self {
            token,
            reward,
            in_flight: SingleFlight::new(),
        }
    }

    pub fn is_claiming(&self, account: &Address) -> bool {
        self.in_flight.is_in_flight(account)
    }

    pub async fn claim(&self, account: Address) -> ClaimOutcome {
        self.claim_with_progress(account, |_| {}).await
    }

    /// Like [`Self::claim`], reporting every stage transition to `progress`.
    ///
    /// `progress` is never called for a claim rejected as already in flight.
    /// The claim runs on its own task, which holds the account's guard until
    /// the receipt wait ends. Dropping the returned future does not release it.
    pub async fn claim_with_progress<P>(&self, account: Address, progress: P) -> ClaimOutcome
    where
        P: Fn(ClaimStage) + Send + Sync + 'static,
    {
        let Some(guard) = self.in_flight.try_acquire(account) else {
            tracing::debug!(%account, "Claim already in flight; skipping");
            return ClaimOutcome::AlreadyInFlight;
        };

        let claimer = self.clone();
        let task = tokio::spawn(async move {
            let outcome = claimer.run(account, &progress).await;
            drop(guard);
            outcome
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::error!(%account, %error, "Claim task ended unexpectedly");
                ClaimOutcome::SubmissionFailed(BlockchainError::Custom(format!(
                    "claim task ended unexpectedly: {error}"
                )))
            }
        }
    }

    #[tracing::instrument(name = "claim", skip_all, fields(%account))]
    async fn run(&self, account: Address, progress: &(dyn Fn(ClaimStage) + Send + Sync)) -> ClaimOutcome {
        let mut stage = Stage::new(progress);

        stage.advance(ClaimStage::BalanceRequested);
        let previous_balance = match self.token.balance_of(account).await {
            Ok(balance) => balance,
            Err(error) => {
                stage.abort(&error);
                return ClaimOutcome::BalanceUnavailable(error);
            }
        };
        stage.advance(ClaimStage::BalanceReceived);

        let Some(new_balance) = previous_balance.checked_add(self.reward) else {
            let error = BlockchainError::Overflow {
                context: "claimed balance".to_string(),
            };
            stage.abort(&error);
            return ClaimOutcome::BalanceUnavailable(error);
        };

        let tx_hash = match self.token.submit_set_balance(account, new_balance).await {
            Ok(tx_hash) => tx_hash,
            Err(error) => {
                stage.abort(&error);
                return ClaimOutcome::SubmissionFailed(error);
            }
        };
        stage.advance(ClaimStage::TransactionSubmitted);
        tracing::debug!(%tx_hash, %previous_balance, %new_balance, "Claim submitted");

        if let Err(error) = self.token.wait_for_receipt(tx_hash).await {
            stage.abort(&error);
            return ClaimOutcome::ConfirmationFailed { tx_hash, error };
        }
        stage.advance(ClaimStage::Confirmed);

        tracing::info!(%tx_hash, %previous_balance, %new_balance, "Reward claimed");
        ClaimOutcome::Confirmed {
            tx_hash,
            previous_balance,
            new_balance,
        }
    }
}

struct Stage<'a> {
    current: ClaimStage,
    progress: &'a (dyn Fn(ClaimStage) + Send + Sync),
}

impl<'a> Stage<'a> {
    fn new(progress: &'a (dyn Fn(ClaimStage) + Send + Sync)) -> Self {
        progress(ClaimStage::Idle);
        Self {
            current: ClaimStage::Idle,
            progress,
        }
    }

    fn advance(&mut self, next: ClaimStage) {
        tracing::debug!(from = ?self.current, to = ?next, "Claim stage");
        self.current = next;
        (self.progress)(next);
    }

    fn abort(&mut self, error: &BlockchainError) {
        tracing::warn!(stage = ?self.current, kind = %error.kind(), error = %error, "Claim aborted");
        self.current = ClaimStage::Aborted;
        (self.progress)(ClaimStage::Aborted);
    }
}
