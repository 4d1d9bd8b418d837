use serde::{Deserialize, Serialize};

/// Stable key of a deployment environment.
///
/// Exactly one environment is active per running client. The key selects the
/// chain parameters and the contract address set from the keyed configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentKey {
    /// Local anvil/hardhat node.
    Local,
    /// Base Sepolia testnet (chain id 84532).
    BaseSepolia,
    /// Mantle Sepolia testnet (chain id 5003).
    MantleSepolia,
    /// Polygon zkEVM Cardona testnet (chain id 2442).
    PolygonCardona,
}

impl EnvironmentKey {
    pub const ALL: [EnvironmentKey; 4] = [
        EnvironmentKey::Local,
        EnvironmentKey::BaseSepolia,
        EnvironmentKey::MantleSepolia,
        EnvironmentKey::PolygonCardona,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentKey::Local => "local",
            EnvironmentKey::BaseSepolia => "base_sepolia",
            EnvironmentKey::MantleSepolia => "mantle_sepolia",
            EnvironmentKey::PolygonCardona => "polygon_cardona",
        }
    }

    /// Chain id the environment is expected to report.
    pub fn expected_chain_id(&self) -> u64 {
        match self {
            EnvironmentKey::Local => 31337,
            EnvironmentKey::BaseSepolia => 84532,
            EnvironmentKey::MantleSepolia => 5003,
            EnvironmentKey::PolygonCardona => 2442,
        }
    }
}

impl std::fmt::Display for EnvironmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnvironmentKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        EnvironmentKey::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| format!("'{}' is not a known environment", s))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn parses_known_keys_case_and_dash_insensitive() {
        assert_eq!(
            "base_sepolia".parse::<EnvironmentKey>().unwrap(),
            EnvironmentKey::BaseSepolia
        );
        assert_eq!(
            " Mantle-Sepolia ".parse::<EnvironmentKey>().unwrap(),
            EnvironmentKey::MantleSepolia
        );
        assert!("ropsten".parse::<EnvironmentKey>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for key in EnvironmentKey::ALL {
            assert_eq!(key.to_string().parse::<EnvironmentKey>().unwrap(), key);
        }
    }
}
