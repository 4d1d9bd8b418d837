use drip_blockchain::BlockchainError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub(crate) enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    ActionFailed(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
