use std::{str::FromStr, sync::Arc};

use crate::{ChainConfig, RpcClient};

mod challenge_manager;
mod erc20;
mod profile;

pub use challenge_manager::ChallengeManagerContract;
pub use erc20::Erc20Contract;
pub use profile::ProfileContract;

/// Logical names of the deployed Drip contracts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContractName {
    Profile,
    Challenge,
    ChallengeManager,
    RewardToken,
}

impl ContractName {
    pub const ALL: [ContractName; 4] = [
        ContractName::Profile,
        ContractName::Challenge,
        ContractName::ChallengeManager,
        ContractName::RewardToken,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractName::Profile => "Profile",
            ContractName::Challenge => "Challenge",
            ContractName::ChallengeManager => "ChallengeManager",
            ContractName::RewardToken => "RewardToken",
        }
    }

    /// Key of the address under `[chains.<env>.contracts]`.
    pub fn config_key(&self) -> &'static str {
        match self {
            ContractName::Profile => "profile",
            ContractName::Challenge => "challenge",
            ContractName::ChallengeManager => "challenge_manager",
            ContractName::RewardToken => "reward_token",
        }
    }
}

impl std::fmt::Display for ContractName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContractName::ALL
            .into_iter()
            .find(|name| name.as_str() == s || name.config_key() == s)
            .ok_or_else(|| format!("'{}' is not a valid contract name", s))
    }
}

/// Wrappers for every contract of one environment, sharing one RPC client.
#[derive(Clone)]
pub struct Contracts {
    token: Erc20Contract,
    profile: ProfileContract,
    challenge_manager: ChallengeManagerContract,
}

impl Contracts {
    pub fn new(client: Arc<dyn RpcClient>, config: &ChainConfig) -> Self {
        let addresses = config.contracts();
        let token_metadata = config.reward_token().clone();

        Self {
            token: Erc20Contract::new(
                Arc::clone(&client),
                addresses.get(&ContractName::RewardToken),
                token_metadata.clone(),
                addresses.get(&ContractName::Challenge),
            ),
            profile: ProfileContract::new(
                Arc::clone(&client),
                addresses.get(&ContractName::Profile),
                token_metadata.clone(),
            ),
            challenge_manager: ChallengeManagerContract::new(
                client,
                addresses.get(&ContractName::ChallengeManager),
                token_metadata,
            ),
        }
    }

    pub fn token(&self) -> &Erc20Contract {
        &self.token
    }

    pub fn profile(&self) -> &ProfileContract {
        &self.profile
    }

    pub fn challenge_manager(&self) -> &ChallengeManagerContract {
        &self.challenge_manager
    }
}
