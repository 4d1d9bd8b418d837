use alloy::{
    primitives::TxHash,
    signers::local::LocalSignerError,
    transports::{RpcError, TransportErrorKind},
};

/// Coarse failure taxonomy exposed to callers that only need to react to the
/// class of a failure, not its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The request never produced a usable answer (transport, timeout, node error).
    Network,
    /// The contract rejected the call or the mined transaction reverted.
    Revert,
    /// The node answered but the payload could not be decoded or computed with.
    Decode,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Network => f.write_str("network failure"),
            FailureKind::Revert => f.write_str("contract revert"),
            FailureKind::Decode => f.write_str("decode failure"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BlockchainError {
    #[error("RPC transport error: {0}")]
    Transport(#[from] RpcError<TransportErrorKind>),

    #[error("Execution reverted: {reason}")]
    Revert { reason: String },

    #[error("Failed to decode {context}: {reason}")]
    Decode { context: String, reason: String },

    #[error("Arithmetic overflow computing {context}")]
    Overflow { context: String },

    #[error("Transaction receipt failed: {reason}")]
    ReceiptFailed { reason: String },

    #[error("Transaction {tx_hash} reverted on-chain")]
    TransactionReverted { tx_hash: TxHash },

    #[error("Invalid private key (length: {key_length})")]
    InvalidPrivateKey {
        key_length: usize,
        #[source]
        source: LocalSignerError,
    },

    #[error("RPC connection failed after trying {attempts} endpoint(s)")]
    RpcConnectionFailed { attempts: usize },

    #[error("Chain id mismatch: configured {expected}, node reports {actual}")]
    ChainIdMismatch { expected: u64, actual: u64 },

    #[error("Reward token {field} mismatch: configured {configured}, contract reports {actual}")]
    TokenMetadataMismatch {
        field: &'static str,
        configured: String,
        actual: String,
    },

    #[error("Provider initialization failed: {reason}")]
    ProviderInit { reason: String },

    #[error("{0}")]
    Custom(String),
}

impl BlockchainError {
    pub(crate) fn decode(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            context: context.into(),
            reason: err.to_string(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            BlockchainError::Revert { .. } | BlockchainError::TransactionReverted { .. } => {
                FailureKind::Revert
            }
            BlockchainError::Decode { .. }
            | BlockchainError::Overflow { .. }
            | BlockchainError::TokenMetadataMismatch { .. } => FailureKind::Decode,
            BlockchainError::Transport(err) if err.is_ser_error() || err.is_deser_error() => {
                FailureKind::Decode
            }
            BlockchainError::Transport(_)
            | BlockchainError::ReceiptFailed { .. }
            | BlockchainError::InvalidPrivateKey { .. }
            | BlockchainError::RpcConnectionFailed { .. }
            | BlockchainError::ChainIdMismatch { .. }
            | BlockchainError::ProviderInit { .. }
            | BlockchainError::Custom(_) => FailureKind::Network,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_failures() {
        let transport = BlockchainError::Transport(TransportErrorKind::custom_str("refused"));
        assert_eq!(transport.kind(), FailureKind::Network);

        let revert = BlockchainError::Revert {
            reason: "Ownable: caller is not the owner".to_string(),
        };
        assert_eq!(revert.kind(), FailureKind::Revert);

        let reverted = BlockchainError::TransactionReverted {
            tx_hash: TxHash::ZERO,
        };
        assert_eq!(reverted.kind(), FailureKind::Revert);

        let decode = BlockchainError::decode("balanceOf return", "buffer overrun");
        assert_eq!(decode.kind(), FailureKind::Decode);
        assert!(decode.to_string().contains("balanceOf return"));
    }
}
