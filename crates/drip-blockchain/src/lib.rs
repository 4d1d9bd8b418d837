mod chains;
mod claim;
mod config;
mod config_error;
pub mod contracts;
mod error;
mod error_classification;
mod rpc_client;
mod rpc_executor;
mod rpc_rate_limiter;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use alloy::primitives::{Address, Bytes, TxHash, U256};
pub use chains::evm::{
    EvmRpcClient,
    contracts::{ChallengeManager, DripProfile, DripToken},
};
pub use claim::{
    ClaimOutcome, ClaimStage, DEFAULT_REWARD_TOKENS, RewardClaimer, SingleFlight,
    SingleFlightGuard,
};
pub use config::{
    ChainConfig, ChainConfigRaw, ContractAddressSet, ContractAddressSetRaw, EnvironmentsConfigRaw,
    TokenMetadata, WALLET_PRIVATE_KEY_ENV,
};
pub use config_error::ConfigError;
pub use contracts::{
    ChallengeManagerContract, ContractName, Contracts, Erc20Contract, ProfileContract,
};
pub use drip_domain::{Challenge, EnvironmentKey, EpochInfo};
pub use error::{BlockchainError, FailureKind};
pub use rpc_client::RpcClient;
pub use rpc_rate_limiter::RpcRateLimiter;
