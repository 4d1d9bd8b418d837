use drip_blockchain::{ChainConfig, EnvironmentKey, EnvironmentsConfigRaw, U256};
use drip_domain::whole_tokens_to_units;
use serde::{Deserialize, Serialize};

use crate::{config::ConfigError, logger::LoggerConfig};

/// Reward settings of the claim flow.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ClaimConfig {
    /// Whole tokens credited per claim, scaled by the token's decimals.
    pub reward_tokens: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigRaw {
    pub environment: EnvironmentKey,
    pub logger: LoggerConfig,
    pub claim: ClaimConfig,
    pub chains: EnvironmentsConfigRaw,
}

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub environment: EnvironmentKey,
    pub logger: LoggerConfig,
    pub chain: ChainConfig,
    /// Raw token units credited per claim.
    pub claim_reward: U256,
}

impl ConfigRaw {
    pub(crate) fn resolve(mut self) -> Result<Config, ConfigError> {
        let environment = self.environment;
        if let Some(chain) = self.chains.get_mut(environment) {
            chain.fill_private_key_from_env();
        }

        let chain = self.chains.resolve(environment)?;
        let claim_reward =
            whole_tokens_to_units(self.claim.reward_tokens, chain.reward_token().decimals)
                .map_err(|e| ConfigError::InvalidConfig(format!("claim.reward_tokens: {}", e)))?;

        Ok(Config {
            environment,
            logger: self.logger,
            chain,
            claim_reward,
        })
    }
}
