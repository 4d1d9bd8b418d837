//! In-memory [`RpcClient`] that answers the Drip contract ABI from a ledger
//! and records every request.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use alloy::{
    primitives::{Address, Bytes, TxHash, U256, keccak256},
    sol_types::{SolCall, SolValue},
    transports::TransportErrorKind,
};
use async_trait::async_trait;

use crate::{
    BlockchainError, RpcClient,
    chains::evm::contracts::{ChallengeManager, DripProfile, DripToken},
};

/// How a mocked request fails.
#[derive(Debug, Clone)]
pub enum MockFailure {
    /// Transport-level failure; the node never answered.
    Network,
    /// The contract reverted with the given reason.
    Revert(String),
    /// The node answered with bytes that do not decode as the expected return.
    MalformedResponse,
}

#[derive(Default)]
struct Ledger {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    challenges: HashMap<Address, Vec<DripProfile::Challenge>>,
    epoch_info: Option<ChallengeManager::EpochInfo>,
    decimals: u8,
    symbol: String,
}

#[derive(Default)]
struct Faults {
    calls: HashMap<[u8; 4], MockFailure>,
    send: Option<MockFailure>,
    receipt: Option<MockFailure>,
}

#[derive(Default)]
struct Journal {
    calls: Vec<(Address, Bytes)>,
    sends: Vec<(Address, Bytes)>,
    receipts: Vec<TxHash>,
}

pub struct MockRpcClient {
    sender: Address,
    send_delay: Option<Duration>,
    receipt_delay: Option<Duration>,
    ledger: Mutex<Ledger>,
    faults: Mutex<Faults>,
    journal: Mutex<Journal>,
    tx_counter: AtomicU64,
}

impl MockRpcClient {
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            send_delay: None,
            receipt_delay: None,
            ledger: Mutex::new(Ledger {
                decimals: 18,
                symbol: "DRP".to_string(),
                ..Ledger::default()
            }),
            faults: Mutex::new(Faults::default()),
            journal: Mutex::new(Journal::default()),
            tx_counter: AtomicU64::new(0),
        }
    }

    /// Holds every `send_transaction` for `delay` before it is accepted.
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    /// Holds every `wait_for_receipt` for `delay` after recording it.
    pub fn with_receipt_delay(mut self, delay: Duration) -> Self {
        self.receipt_delay = Some(delay);
        self
    }

    /// On-chain answers of `decimals()` and `symbol()`.
    pub fn with_token_metadata(self, decimals: u8, symbol: &str) -> Self {
        {
            let mut ledger = lock(&self.ledger);
            ledger.decimals = decimals;
            ledger.symbol = symbol.to_string();
        }
        self
    }

    pub fn with_balance(self, account: Address, balance: U256) -> Self {
        self.set_balance(account, balance);
        self
    }

    pub fn with_challenges(self, account: Address, challenges: Vec<DripProfile::Challenge>) -> Self {
        lock(&self.ledger).challenges.insert(account, challenges);
        self
    }

    pub fn with_epoch_info(self, epoch_info: ChallengeManager::EpochInfo) -> Self {
        lock(&self.ledger).epoch_info = Some(epoch_info);
        self
    }

    pub fn set_balance(&self, account: Address, balance: U256) {
        lock(&self.ledger).balances.insert(account, balance);
    }

    pub fn balance(&self, account: Address) -> U256 {
        lock(&self.ledger)
            .balances
            .get(&account)
            .copied()
            .unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        lock(&self.ledger)
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Makes every `call` whose calldata starts with `selector` fail.
    pub fn fail_calls(&self, selector: [u8; 4], failure: MockFailure) {
        lock(&self.faults).calls.insert(selector, failure);
    }

    pub fn fail_sends(&self, failure: MockFailure) {
        lock(&self.faults).send = Some(failure);
    }

    pub fn fail_receipts(&self, failure: MockFailure) {
        lock(&self.faults).receipt = Some(failure);
    }

    pub fn calls(&self) -> Vec<(Address, Bytes)> {
        lock(&self.journal).calls.clone()
    }

    pub fn sends(&self) -> Vec<(Address, Bytes)> {
        lock(&self.journal).sends.clone()
    }

    pub fn receipts(&self) -> Vec<TxHash> {
        lock(&self.journal).receipts.clone()
    }

    pub fn send_count(&self) -> usize {
        lock(&self.journal).sends.len()
    }

    fn answer(&self, calldata: &[u8]) -> Result<Bytes, BlockchainError> {
        let selector = selector_of(calldata);
        let ledger = lock(&self.ledger);

        let encoded = if selector == DripToken::balanceOfCall::SELECTOR {
            let call = DripToken::balanceOfCall::abi_decode(calldata).map_err(mock_decode)?;
            ledger
                .balances
                .get(&call.account)
                .copied()
                .unwrap_or_default()
                .abi_encode()
        } else if selector == DripToken::allowanceCall::SELECTOR {
            let call = DripToken::allowanceCall::abi_decode(calldata).map_err(mock_decode)?;
            ledger
                .allowances
                .get(&(call.owner, call.spender))
                .copied()
                .unwrap_or_default()
                .abi_encode()
        } else if selector == DripToken::decimalsCall::SELECTOR {
            U256::from(ledger.decimals).abi_encode()
        } else if selector == DripToken::symbolCall::SELECTOR {
            ledger.symbol.abi_encode()
        } else if selector == DripProfile::getChallengesCall::SELECTOR {
            let call = DripProfile::getChallengesCall::abi_decode(calldata).map_err(mock_decode)?;
            ledger
                .challenges
                .get(&call.account)
                .cloned()
                .unwrap_or_default()
                .abi_encode()
        } else if selector == ChallengeManager::getEpochInfoCall::SELECTOR {
            let Some(epoch_info) = &ledger.epoch_info else {
                return Err(BlockchainError::Revert {
                    reason: "ChallengeManager::EpochNotStarted".to_string(),
                });
            };
            epoch_info.abi_encode()
        } else {
            return Err(BlockchainError::Revert {
                reason: format!("mock: unknown selector 0x{}", alloy::hex::encode(selector)),
            });
        };

        Ok(Bytes::from(encoded))
    }

    fn apply(&self, calldata: &[u8]) -> Result<(), BlockchainError> {
        let mut ledger = lock(&self.ledger);
        let selector = selector_of(calldata);
        if selector == DripToken::setBalanceCall::SELECTOR {
            let call = DripToken::setBalanceCall::abi_decode(calldata).map_err(mock_decode)?;
            ledger.balances.insert(call.account, call.amount);
        } else if selector == DripToken::approveCall::SELECTOR {
            let call = DripToken::approveCall::abi_decode(calldata).map_err(mock_decode)?;
            ledger
                .allowances
                .insert((self.sender, call.spender), call.value);
        }
        Ok(())
    }

    fn next_tx_hash(&self) -> TxHash {
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        keccak256(n.to_be_bytes())
    }
}

#[async_trait]
impl RpcClient for MockRpcClient {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, BlockchainError> {
        lock(&self.journal).calls.push((to, calldata.clone()));

        let fault = lock(&self.faults)
            .calls
            .get(&selector_of(&calldata))
            .cloned();
        match fault {
            Some(MockFailure::MalformedResponse) => Ok(Bytes::from_static(&[0xde, 0xad])),
            Some(failure) => Err(failure_to_error(failure, None)),
            None => self.answer(&calldata),
        }
    }

    async fn send_transaction(
        &self,
        to: Address,
        calldata: Bytes,
    ) -> Result<TxHash, BlockchainError> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        lock(&self.journal).sends.push((to, calldata.clone()));

        let fault = lock(&self.faults).send.clone();
        if let Some(failure) = fault {
            return Err(failure_to_error(failure, None));
        }

        self.apply(&calldata)?;
        Ok(self.next_tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<(), BlockchainError> {
        lock(&self.journal).receipts.push(tx_hash);
        if let Some(delay) = self.receipt_delay {
            tokio::time::sleep(delay).await;
        }

        let fault = lock(&self.faults).receipt.clone();
        match fault {
            Some(failure) => Err(failure_to_error(failure, Some(tx_hash))),
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn selector_of(calldata: &[u8]) -> [u8; 4] {
    let mut selector = [0u8; 4];
    let len = calldata.len().min(4);
    selector[..len].copy_from_slice(&calldata[..len]);
    selector
}

fn mock_decode(err: alloy::sol_types::Error) -> BlockchainError {
    BlockchainError::decode("mock calldata", err)
}

fn failure_to_error(failure: MockFailure, tx_hash: Option<TxHash>) -> BlockchainError {
    match (failure, tx_hash) {
        (MockFailure::Network, _) => {
            BlockchainError::Transport(TransportErrorKind::custom_str("mock: connection refused"))
        }
        (MockFailure::Revert(_), Some(tx_hash)) => BlockchainError::TransactionReverted { tx_hash },
        (MockFailure::Revert(reason), None) => BlockchainError::Revert { reason },
        (MockFailure::MalformedResponse, _) => {
            BlockchainError::decode("mock response", "malformed payload")
        }
    }
}
