use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ConfigSource;

#[derive(Debug, Parser)]
#[command(name = "drip", version, about = "Drip challenge and reward client")]
pub(crate) struct Cli {
    /// Custom config file (.toml format), merged over ./config.toml
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Environment to run against (local, base_sepolia, mantle_sepolia, polygon_cardona)
    #[arg(long = "env", value_name = "ENVIRONMENT", global = true)]
    pub environment: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Show the reward token balance of the wallet
    Balance,
    /// List the wallet's challenges
    Challenges,
    /// Show the current reward epoch
    Epoch,
    /// Approve a spender to transfer reward tokens
    Approve {
        /// Amount in whole tokens
        amount: u64,
        /// Spender address; defaults to the challenge contract
        #[arg(long)]
        spender: Option<String>,
    },
    /// Claim the epoch reward
    Claim,
}

impl Cli {
    pub(crate) fn config_source(&self) -> ConfigSource {
        ConfigSource {
            custom_path: self.config.clone(),
            environment: self.environment.clone(),
        }
    }
}
