use alloy::primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;

use crate::BlockchainError;

/// The JSON-RPC capabilities the contract wrappers depend on.
///
/// Implementations own transport concerns (endpoints, signing, retries,
/// timeouts); callers only see encoded calldata in and raw bytes or hashes out.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Address transactions are signed and sent from.
    fn sender(&self) -> Address;

    /// Executes a read-only `eth_call` against `to`.
    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, BlockchainError>;

    /// Signs and broadcasts a transaction calling `to` with `calldata`.
    async fn send_transaction(&self, to: Address, calldata: Bytes)
    -> Result<TxHash, BlockchainError>;

    /// Waits until the transaction is mined with the configured confirmations.
    ///
    /// A mined transaction whose receipt reports failure is an error.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<(), BlockchainError>;
}
