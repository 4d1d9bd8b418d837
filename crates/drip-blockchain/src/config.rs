use std::{collections::BTreeMap, time::Duration};

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use drip_domain::EnvironmentKey;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ContractName};

/// Environment variable consulted when no wallet private key is configured.
pub const WALLET_PRIVATE_KEY_ENV: &str = "DRIP_WALLET_PRIVATE_KEY";

/// Metadata of the ERC20 reward token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TokenMetadata {
    /// Ticker shown next to amounts (e.g. "DRP").
    pub symbol: String,
    /// Asset name of the token icon in the client.
    pub icon: String,
    /// Fixed-point decimals of the on-chain integer representation.
    pub decimals: u8,
    /// Fractional digits kept when formatting balances for display.
    pub display_decimal_places: u8,
}

/// Deployed contract addresses of one environment, as written in config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractAddressSetRaw {
    pub profile: Option<String>,
    pub challenge: Option<String>,
    pub challenge_manager: Option<String>,
    pub reward_token: Option<String>,
}

impl ContractAddressSetRaw {
    fn resolve(self) -> Result<ContractAddressSet, ConfigError> {
        Ok(ContractAddressSet {
            profile: required_address(ContractName::Profile, self.profile)?,
            challenge: required_address(ContractName::Challenge, self.challenge)?,
            challenge_manager: required_address(
                ContractName::ChallengeManager,
                self.challenge_manager,
            )?,
            reward_token: required_address(ContractName::RewardToken, self.reward_token)?,
        })
    }
}

/// Resolved contract registry of the active environment.
///
/// Addresses are only checked to be syntactically valid 20-byte hex values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddressSet {
    pub profile: Address,
    pub challenge: Address,
    pub challenge_manager: Address,
    pub reward_token: Address,
}

impl ContractAddressSet {
    pub fn get(&self, contract_name: &ContractName) -> Address {
        match contract_name {
            ContractName::Profile => self.profile,
            ContractName::Challenge => self.challenge,
            ContractName::ChallengeManager => self.challenge_manager,
            ContractName::RewardToken => self.reward_token,
        }
    }
}

/// Configuration of one chain environment before validation.
///
/// **Secret handling**: the wallet private key is read from the config file or,
/// when absent, from the `DRIP_WALLET_PRIVATE_KEY` environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfigRaw {
    /// RPC endpoints for EVM JSON-RPC calls (HTTP and WebSocket).
    /// Later entries are fallbacks for the first.
    #[serde(default)]
    pub rpc_endpoints: Vec<String>,

    /// Chain id the endpoints must report.
    pub chain_id: u64,

    /// Native gas token ticker (e.g. "ETH", "MNT").
    pub native_token_symbol: String,

    /// Asset name of the native token icon in the client.
    pub native_token_icon: String,

    #[serde(default)]
    pub contracts: ContractAddressSetRaw,

    pub reward_token: TokenMetadata,

    /// Private key of the signing wallet (hex, with or without 0x prefix).
    pub wallet_private_key: Option<String>,

    /// Expected wallet address. If set it must match the key's address.
    pub wallet_address: Option<String>,

    /// Maximum RPC requests per second. `None` means unlimited.
    pub max_rpc_requests_per_second: Option<u32>,

    /// Number of confirmations to wait for when fetching transaction receipts.
    pub tx_confirmations: u64,

    /// Timeout for waiting on transaction receipts in milliseconds.
    /// Set to 0 to disable the timeout.
    pub tx_receipt_timeout_ms: u64,
}

impl ChainConfigRaw {
    /// Fills a missing private key from `DRIP_WALLET_PRIVATE_KEY`.
    pub fn fill_private_key_from_env(&mut self) {
        if self.wallet_private_key.is_none() {
            self.wallet_private_key = std::env::var(WALLET_PRIVATE_KEY_ENV)
                .ok()
                .filter(|value| !value.trim().is_empty());
        }
    }

    pub fn ensure_rpc_endpoints(&self) -> Result<(), ConfigError> {
        if self.rpc_endpoints.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "rpc_endpoints must include at least one endpoint".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ensure_max_rpc_requests_per_second(&self) -> Result<(), ConfigError> {
        if self.max_rpc_requests_per_second == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "max_rpc_requests_per_second must be greater than 0 when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ensure_token_metadata(&self) -> Result<(), ConfigError> {
        let token = &self.reward_token;
        if token.display_decimal_places > token.decimals {
            return Err(ConfigError::InvalidConfig(format!(
                "reward_token.display_decimal_places ({}) exceeds decimals ({})",
                token.display_decimal_places, token.decimals
            )));
        }
        Ok(())
    }

    pub fn resolve(self, environment: EnvironmentKey) -> Result<ChainConfig, ConfigError> {
        self.ensure_rpc_endpoints()?;
        self.ensure_max_rpc_requests_per_second()?;
        self.ensure_token_metadata()?;

        let private_key = self.wallet_private_key.ok_or_else(|| {
            ConfigError::MissingSecret(format!(
                "{} env var or wallet_private_key config required",
                WALLET_PRIVATE_KEY_ENV
            ))
        })?;
        let derived_address = derive_evm_address_from_private_key(&private_key)?;

        if let Some(address) = self.wallet_address.as_deref() {
            let parsed = parse_evm_address("wallet_address", address)?;
            if parsed != derived_address {
                return Err(ConfigError::InvalidConfig(format!(
                    "wallet_address does not match derived address: provided={}, derived={}",
                    address, derived_address
                )));
            }
        }

        Ok(ChainConfig {
            environment,
            rpc_endpoints: self.rpc_endpoints,
            chain_id: self.chain_id,
            native_token_symbol: self.native_token_symbol,
            native_token_icon: self.native_token_icon,
            contracts: self.contracts.resolve()?,
            reward_token: self.reward_token,
            wallet_private_key: private_key,
            wallet_address: derived_address,
            max_rpc_requests_per_second: self.max_rpc_requests_per_second,
            tx_confirmations: self.tx_confirmations,
            tx_receipt_timeout_ms: self.tx_receipt_timeout_ms,
        })
    }
}

#[derive(Clone)]
pub struct ChainConfig {
    environment: EnvironmentKey,
    rpc_endpoints: Vec<String>,
    chain_id: u64,
    native_token_symbol: String,
    native_token_icon: String,
    contracts: ContractAddressSet,
    reward_token: TokenMetadata,
    wallet_private_key: String,
    wallet_address: Address,
    max_rpc_requests_per_second: Option<u32>,
    tx_confirmations: u64,
    tx_receipt_timeout_ms: u64,
}

impl std::fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConfig")
            .field("environment", &self.environment)
            .field("rpc_endpoints", &self.rpc_endpoints)
            .field("chain_id", &self.chain_id)
            .field("native_token_symbol", &self.native_token_symbol)
            .field("contracts", &self.contracts)
            .field("reward_token", &self.reward_token)
            .field("wallet_private_key", &"<redacted>")
            .field("wallet_address", &self.wallet_address)
            .field("max_rpc_requests_per_second", &self.max_rpc_requests_per_second)
            .field("tx_confirmations", &self.tx_confirmations)
            .field("tx_receipt_timeout_ms", &self.tx_receipt_timeout_ms)
            .finish()
    }
}

impl ChainConfig {
    pub fn environment(&self) -> EnvironmentKey {
        self.environment
    }

    pub fn rpc_endpoints(&self) -> &[String] {
        &self.rpc_endpoints
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn native_token_symbol(&self) -> &str {
        &self.native_token_symbol
    }

    pub fn native_token_icon(&self) -> &str {
        &self.native_token_icon
    }

    pub fn contracts(&self) -> &ContractAddressSet {
        &self.contracts
    }

    pub fn reward_token(&self) -> &TokenMetadata {
        &self.reward_token
    }

    pub fn wallet_private_key(&self) -> &str {
        &self.wallet_private_key
    }

    pub fn wallet_address(&self) -> Address {
        self.wallet_address
    }

    pub fn max_rpc_requests_per_second(&self) -> Option<u32> {
        self.max_rpc_requests_per_second
    }

    pub fn tx_confirmations(&self) -> u64 {
        self.tx_confirmations
    }

    pub fn tx_receipt_timeout(&self) -> Option<Duration> {
        if self.tx_receipt_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.tx_receipt_timeout_ms))
        }
    }
}

/// All known environments keyed by name.
///
/// Only the environment selected at startup is resolved; the others may stay
/// incomplete (e.g. without contract addresses).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentsConfigRaw(pub BTreeMap<EnvironmentKey, ChainConfigRaw>);

impl EnvironmentsConfigRaw {
    pub fn get_mut(&mut self, environment: EnvironmentKey) -> Option<&mut ChainConfigRaw> {
        self.0.get_mut(&environment)
    }

    pub fn resolve(mut self, environment: EnvironmentKey) -> Result<ChainConfig, ConfigError> {
        let raw = self.0.remove(&environment).ok_or_else(|| {
            ConfigError::UnknownEnvironment(format!(
                "no chain configuration for environment '{}'",
                environment
            ))
        })?;

        let expected_chain_id = environment.expected_chain_id();
        if raw.chain_id != expected_chain_id {
            return Err(ConfigError::InvalidConfig(format!(
                "environment '{}' expects chain_id {}, got {}",
                environment, expected_chain_id, raw.chain_id
            )));
        }

        raw.resolve(environment)
    }
}

fn required_address(
    contract_name: ContractName,
    value: Option<String>,
) -> Result<Address, ConfigError> {
    let field = contract_name.config_key();
    let value = value.ok_or_else(|| {
        ConfigError::InvalidConfig(format!("contracts.{} address must be set", field))
    })?;
    parse_evm_address(&format!("contracts.{}", field), &value)
}

fn parse_evm_address(field: &str, value: &str) -> Result<Address, ConfigError> {
    value.trim().parse::<Address>().map_err(|e| {
        ConfigError::InvalidConfig(format!("invalid EVM address for {} '{}': {}", field, value, e))
    })
}

fn derive_evm_address_from_private_key(private_key: &str) -> Result<Address, ConfigError> {
    let signer: PrivateKeySigner = private_key
        .trim()
        .parse()
        .map_err(|e| ConfigError::InvalidConfig(format!("invalid EVM private key: {}", e)))?;
    Ok(signer.address())
}
