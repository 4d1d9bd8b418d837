use alloy::{
    network::{Ethereum, EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, TxHash},
    providers::{PendingTransactionBuilder, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
    transports::{RpcError, TransportErrorKind},
};
use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::{
    ChainConfig, RpcClient, RpcRateLimiter,
    chains::evm::provider::{BlockchainProvider, initialize_provider_with_wallet},
    error::BlockchainError,
    error_classification::is_retryable_submission_error,
    rpc_executor::{RetryPolicy, RetryableError, backoff_delay},
};

pub mod contracts;
mod error_decode;
mod provider;
mod wallets;

use error_decode::{decode_revert_data, extract_revert_data};

const GAS_ESTIMATE_MULTIPLIER: f64 = 1.2;

/// JSON-RPC client for one EVM chain, signing with the configured wallet.
pub struct EvmRpcClient {
    config: ChainConfig,
    wallet: EthereumWallet,
    sender: Address,
    provider: RwLock<BlockchainProvider>,

    rpc_rate_limiter: RpcRateLimiter,
    tx_mutex: Mutex<()>,
    provider_refresh_mutex: Mutex<()>,
    rpc_retry_policy: RetryPolicy,
    tx_retry_policy: RetryPolicy,
}

impl EvmRpcClient {
    pub async fn connect(config: ChainConfig) -> Result<Self, BlockchainError> {
        let signer = wallets::signer_from_private_key(config.wallet_private_key())?;
        let sender = signer.address();
        let wallet = wallets::wallet_from_signer(signer);

        let (provider, chain_id) =
            initialize_provider_with_wallet(config.rpc_endpoints(), wallet.clone()).await?;
        if chain_id != config.chain_id() {
            return Err(BlockchainError::ChainIdMismatch {
                expected: config.chain_id(),
                actual: chain_id,
            });
        }

        let rpc_rate_limiter = RpcRateLimiter::new(config.max_rpc_requests_per_second());
        if let Some(rps) = config.max_rpc_requests_per_second() {
            tracing::info!(
                "{}: RPC rate limiting enabled at {} requests/second",
                config.environment(),
                rps
            );
        }

        tracing::info!(
            environment = %config.environment(),
            chain_id,
            %sender,
            "EVM client ready"
        );

        Ok(Self {
            config,
            wallet,
            sender,
            provider: RwLock::new(provider),
            rpc_rate_limiter,
            tx_mutex: Mutex::new(()),
            provider_refresh_mutex: Mutex::new(()),
            rpc_retry_policy: RetryPolicy::rpc_default(),
            tx_retry_policy: RetryPolicy::tx_default(),
        })
    }

    async fn provider(&self) -> BlockchainProvider {
        self.provider.read().await.clone()
    }

    /// Execute an RPC call with rate limiting and retries on transient errors.
    async fn rpc_call<T, E, F, O>(&self, mut operation: F) -> Result<T, E>
    where
        E: RetryableError,
        F: FnMut() -> O,
        O: std::future::IntoFuture<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            self.rpc_rate_limiter.acquire().await;
            match operation().into_future().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.rpc_retry_policy.max_attempts || !err.is_retryable() {
                        return Err(err);
                    }

                    if err.should_refresh_provider()
                        && let Err(refresh_err) = self.refresh_provider().await
                    {
                        tracing::error!(
                            environment = %self.config.environment(),
                            error = %refresh_err,
                            "Failed to refresh provider after backend error"
                        );
                    }

                    let delay = backoff_delay(&self.rpc_retry_policy, attempt, err.backoff_hint());
                    tracing::warn!(
                        attempt,
                        max_attempts = self.rpc_retry_policy.max_attempts,
                        delay_ms = delay.as_millis(),
                        error = %err,
                        "rpc_call failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn refresh_provider(&self) -> Result<(), BlockchainError> {
        let _guard = self.provider_refresh_mutex.lock().await;
        let (provider, _) =
            initialize_provider_with_wallet(self.config.rpc_endpoints(), self.wallet.clone())
                .await?;
        *self.provider.write().await = provider;
        tracing::info!(
            environment = %self.config.environment(),
            "RPC provider refreshed"
        );
        Ok(())
    }

    fn request(&self, to: Address, calldata: Bytes) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.sender)
            .with_to(to)
            .with_input(calldata)
    }

    async fn estimate_gas_limit(&self, request: &TransactionRequest) -> Result<u64, BlockchainError> {
        let estimate = self
            .rpc_call(|| {
                let request = request.clone();
                async move { self.provider().await.estimate_gas(request).await }
            })
            .await
            .map_err(map_rpc_error)?;
        Ok(apply_gas_estimate_multiplier(estimate))
    }
}

#[async_trait]
impl RpcClient for EvmRpcClient {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, BlockchainError> {
        let request = self.request(to, calldata);
        self.rpc_call(|| {
            let request = request.clone();
            async move { self.provider().await.call(request).await }
        })
        .await
        .map_err(map_rpc_error)
    }

    async fn send_transaction(
        &self,
        to: Address,
        calldata: Bytes,
    ) -> Result<TxHash, BlockchainError> {
        // One in-flight submission per wallet keeps nonces ordered.
        let _guard = self.tx_mutex.lock().await;

        let request = self.request(to, calldata);
        let gas_limit = self.estimate_gas_limit(&request).await?;
        let request = request.with_gas_limit(gas_limit);

        let mut attempt = 1;
        loop {
            self.rpc_rate_limiter.acquire().await;
            let provider = self.provider().await;
            match provider.send_transaction(request.clone()).await {
                Ok(pending) => {
                    let tx_hash = *pending.tx_hash();
                    tracing::debug!(%tx_hash, %to, gas_limit, "Transaction submitted");
                    return Ok(tx_hash);
                }
                Err(err) => {
                    if attempt >= self.tx_retry_policy.max_attempts
                        || !is_retryable_submission_error(&err)
                    {
                        return Err(map_rpc_error(err));
                    }

                    if err.should_refresh_provider()
                        && let Err(refresh_err) = self.refresh_provider().await
                    {
                        tracing::error!(
                            environment = %self.config.environment(),
                            error = %refresh_err,
                            "Failed to refresh provider after backend error"
                        );
                    }

                    let delay = backoff_delay(&self.tx_retry_policy, attempt, err.backoff_hint());
                    tracing::warn!(
                        attempt,
                        max_attempts = self.tx_retry_policy.max_attempts,
                        delay_ms = delay.as_millis(),
                        error = %err,
                        "Transaction submission failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<(), BlockchainError> {
        let provider = self.provider().await;
        let pending = PendingTransactionBuilder::<Ethereum>::new(provider.root().clone(), tx_hash)
            .with_required_confirmations(self.config.tx_confirmations())
            .with_timeout(self.config.tx_receipt_timeout());

        let receipt: TransactionReceipt =
            pending
                .get_receipt()
                .await
                .map_err(|e| BlockchainError::ReceiptFailed {
                    reason: e.to_string(),
                })?;

        if !receipt.status() {
            return Err(BlockchainError::TransactionReverted { tx_hash });
        }

        tracing::debug!(
            %tx_hash,
            block_number = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );
        Ok(())
    }
}

/// Surfaces contract reverts as [`BlockchainError::Revert`] with a decoded reason.
fn map_rpc_error(err: RpcError<TransportErrorKind>) -> BlockchainError {
    match extract_revert_data(&err) {
        Some(data) => BlockchainError::Revert {
            reason: decode_revert_data(&data),
        },
        None => BlockchainError::Transport(err),
    }
}

fn apply_gas_estimate_multiplier(estimate: u64) -> u64 {
    let scaled = (estimate as f64 * GAS_ESTIMATE_MULTIPLIER).ceil();
    if scaled.is_finite() && scaled <= u64::MAX as f64 {
        scaled as u64
    } else {
        u64::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_estimate_gets_headroom() {
        assert_eq!(apply_gas_estimate_multiplier(100_000), 120_000);
        assert_eq!(apply_gas_estimate_multiplier(21_001), 25_202);
        assert_eq!(apply_gas_estimate_multiplier(u64::MAX), u64::MAX);
    }

    #[test]
    fn plain_transport_errors_stay_transport() {
        let err = map_rpc_error(TransportErrorKind::custom_str("connection refused"));
        assert!(matches!(err, BlockchainError::Transport(_)));
    }
}
