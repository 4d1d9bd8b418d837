//! Typed default configuration for each environment.
//!
//! Every environment is present in [`ConfigRaw::chains`] so a user config
//! only has to override what differs, usually just the wallet key.

use std::collections::BTreeMap;

use drip_blockchain::{
    ChainConfigRaw, ContractAddressSetRaw, DEFAULT_REWARD_TOKENS, EnvironmentKey,
    EnvironmentsConfigRaw, TokenMetadata,
};

use super::{ClaimConfig, ConfigRaw};
use crate::logger::{LogFormat, LoggerConfig};

/// Returns the default [`ConfigRaw`] with `environment` selected.
pub(crate) fn config_for(environment: EnvironmentKey) -> ConfigRaw {
    ConfigRaw {
        environment,
        logger: logger(environment),
        claim: ClaimConfig {
            reward_tokens: DEFAULT_REWARD_TOKENS,
        },
        chains: chains(),
    }
}

// ── Shared defaults ─────────────────────────────────────────────

fn logger(environment: EnvironmentKey) -> LoggerConfig {
    let level = match environment {
        EnvironmentKey::Local => "info,drip_client=debug,drip_blockchain=debug",
        _ => "info",
    };
    LoggerConfig {
        level: level.to_string(),
        format: LogFormat::Pretty,
    }
}

fn drip_token() -> TokenMetadata {
    TokenMetadata {
        symbol: "DRP".to_string(),
        icon: "drip-logo-full".to_string(),
        decimals: 18,
        display_decimal_places: 6,
    }
}

fn chain(
    rpc_endpoint: &str,
    chain_id: u64,
    native_token_symbol: &str,
    native_token_icon: &str,
    contracts: ContractAddressSetRaw,
) -> ChainConfigRaw {
    ChainConfigRaw {
        rpc_endpoints: vec![rpc_endpoint.to_string()],
        chain_id,
        native_token_symbol: native_token_symbol.to_string(),
        native_token_icon: native_token_icon.to_string(),
        contracts,
        reward_token: drip_token(),
        wallet_private_key: None,
        wallet_address: None,
        max_rpc_requests_per_second: None,
        tx_confirmations: 1,
        tx_receipt_timeout_ms: 60_000,
    }
}

// ── Per-environment chains ──────────────────────────────────────

fn chains() -> EnvironmentsConfigRaw {
    EnvironmentsConfigRaw(BTreeMap::from([
        (EnvironmentKey::Local, local()),
        (EnvironmentKey::BaseSepolia, base_sepolia()),
        (EnvironmentKey::MantleSepolia, mantle_sepolia()),
        (EnvironmentKey::PolygonCardona, polygon_cardona()),
    ]))
}

fn local() -> ChainConfigRaw {
    ChainConfigRaw {
        tx_receipt_timeout_ms: 10_000,
        ..chain(
            "http://localhost:8545",
            EnvironmentKey::Local.expected_chain_id(),
            "ETH",
            "token-eth",
            ContractAddressSetRaw::default(),
        )
    }
}

fn base_sepolia() -> ChainConfigRaw {
    chain(
        "https://sepolia.base.org",
        EnvironmentKey::BaseSepolia.expected_chain_id(),
        "ETH",
        "token-eth",
        ContractAddressSetRaw {
            profile: Some("0xbaA1e7FA30539Bc29b28D0553d3c9b13bfD575CA".to_string()),
            challenge: Some("0xBef730bae27148884B7E853d0637a948F8700132".to_string()),
            challenge_manager: Some("0xaE9fd9feaE497c733f53c304fAC2E67bC8148041".to_string()),
            reward_token: Some("0x235c36243BD73d65B530a469658FeF591daA2f45".to_string()),
        },
    )
}

fn mantle_sepolia() -> ChainConfigRaw {
    chain(
        "https://rpc.sepolia.mantle.xyz",
        EnvironmentKey::MantleSepolia.expected_chain_id(),
        "MNT",
        "token-mnt",
        ContractAddressSetRaw::default(),
    )
}

fn polygon_cardona() -> ChainConfigRaw {
    chain(
        "https://rpc.cardona.zkevm-rpc.com",
        EnvironmentKey::PolygonCardona.expected_chain_id(),
        "ETH",
        "token-eth",
        ContractAddressSetRaw::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_environment_has_matching_chain_id() {
        let config = config_for(EnvironmentKey::BaseSepolia);
        for environment in EnvironmentKey::ALL {
            let chain = config.chains.0.get(&environment);
            assert_eq!(
                chain.map(|chain| chain.chain_id),
                Some(environment.expected_chain_id()),
                "{environment}"
            );
        }
    }

    #[test]
    fn base_sepolia_ships_a_complete_address_set() {
        let config = config_for(EnvironmentKey::BaseSepolia);
        let contracts = &config.chains.0[&EnvironmentKey::BaseSepolia].contracts;
        assert!(contracts.profile.is_some());
        assert!(contracts.challenge.is_some());
        assert!(contracts.challenge_manager.is_some());
        assert!(contracts.reward_token.is_some());
        assert_eq!(config.claim.reward_tokens, 100);
    }
}
