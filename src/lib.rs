mod cli;
mod config;
mod error;
mod logger;
mod pool;

use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use cli::{Cli, Command};
use drip_blockchain::{
    Address, ClaimOutcome, Contracts, EvmRpcClient, RpcClient, TokenMetadata, U256,
};
use drip_domain::{format_token_amount, whole_tokens_to_units};
use error::AppError;
use pool::ChallengePool;

pub async fn run() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match config::load_configuration(&cli.config_source()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Failed to load configuration: {}", AppError::from(error));
            return ExitCode::FAILURE;
        }
    };

    logger::initialize(&config.logger);
    display_drip_ascii_art(&config);

    match execute(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "Command failed");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Command, config: config::Config) -> Result<(), AppError> {
    let client = Arc::new(EvmRpcClient::connect(config.chain.clone()).await?);
    let account = client.sender();
    let contracts = Contracts::new(client, &config.chain);
    contracts.token().verify_metadata().await?;
    let token = contracts.token().metadata().clone();
    let pool = ChallengePool::new(contracts, account, config.claim_reward);

    match command {
        Command::Balance => show_balance(&pool, &token).await,
        Command::Challenges => show_challenges(&pool, &token).await,
        Command::Epoch => show_epoch(&pool, &token).await,
        Command::Approve { amount, spender } => {
            approve(&pool, &token, amount, spender.as_deref()).await
        }
        Command::Claim => claim(&pool, &token).await,
    }
}

async fn show_balance(pool: &ChallengePool, token: &TokenMetadata) -> Result<(), AppError> {
    pool.refresh_balance().await?;
    match pool.subscribe_balance().borrow().as_deref() {
        Some(balance) => {
            println!("{} {}", balance, token.symbol);
            Ok(())
        }
        None => Err(AppError::ActionFailed(format!(
            "balance of {} unavailable",
            pool.account()
        ))),
    }
}

async fn show_challenges(pool: &ChallengePool, token: &TokenMetadata) -> Result<(), AppError> {
    pool.fetch_challenges().await?;
    let challenges = pool.subscribe_challenges().borrow().clone();
    if challenges.is_empty() {
        println!("No challenges for {}", pool.account());
        return Ok(());
    }

    let now = unix_now();
    for challenge in challenges {
        println!(
            "#{:<4} {:<6} stake {} {:<6} participants {:<4} {}",
            challenge.id,
            if challenge.is_open(now) { "open" } else { "closed" },
            challenge.stake_amount,
            token.symbol,
            challenge.participant_count,
            challenge.description
        );
    }
    Ok(())
}

async fn show_epoch(pool: &ChallengePool, token: &TokenMetadata) -> Result<(), AppError> {
    pool.fetch_epoch_info().await?;
    let Some(info) = pool.subscribe_epoch_info().borrow().clone() else {
        return Err(AppError::ActionFailed("epoch info unavailable".to_string()));
    };

    let now = unix_now();
    println!("Epoch {}: {}", info.epoch, info.description);
    println!("  participants: {}", info.displayed_participants());
    println!("  total staked: {} {}", info.total_staked_amount, token.symbol);
    if info.is_active(now) {
        println!(
            "  ends in {} days ({} hours)",
            info.days_remaining(now),
            info.hours_remaining(now)
        );
    } else {
        println!("  ended");
    }
    Ok(())
}

async fn approve(
    pool: &ChallengePool,
    token: &TokenMetadata,
    amount: u64,
    spender: Option<&str>,
) -> Result<(), AppError> {
    let erc20 = pool.contracts().token();
    let spender = match spender {
        Some(value) => value
            .parse::<Address>()
            .map_err(|e| AppError::InvalidArgument(format!("spender '{}': {}", value, e)))?,
        None => erc20.default_spender(),
    };
    let units = whole_tokens_to_units(amount, token.decimals)
        .map_err(|e| AppError::InvalidArgument(e.to_string()))?;

    let tx_hash = erc20.approve(spender, units).await?;
    println!("Approved {} {} for {} ({})", amount, token.symbol, spender, tx_hash);
    match erc20.allowance(pool.account(), spender).await {
        Ok(allowance) => {
            println!("Allowance now {} {}", display_amount(allowance, token), token.symbol)
        }
        Err(error) => tracing::warn!(%error, %spender, "Failed to read allowance after approval"),
    }
    Ok(())
}

async fn claim(pool: &ChallengePool, token: &TokenMetadata) -> Result<(), AppError> {
    let outcome = pool.claim().await?;
    let status = *pool.subscribe_claim_status().borrow();
    tracing::info!(%status, account = %pool.account(), "Claim finished");

    match outcome {
        ClaimOutcome::Confirmed {
            tx_hash,
            previous_balance,
            new_balance,
        } => {
            println!(
                "Claimed: {} -> {} {} ({})",
                display_amount(previous_balance, token),
                display_amount(new_balance, token),
                token.symbol,
                tx_hash
            );
            Ok(())
        }
        ClaimOutcome::AlreadyInFlight => Err(AppError::ActionFailed(
            "a claim for this wallet is already in flight".to_string(),
        )),
        ClaimOutcome::BalanceUnavailable(error) => Err(AppError::ActionFailed(format!(
            "claim aborted before submission: {error}"
        ))),
        ClaimOutcome::SubmissionFailed(error) => Err(AppError::ActionFailed(format!(
            "claim transaction rejected: {error}"
        ))),
        ClaimOutcome::ConfirmationFailed { tx_hash, error } => Err(AppError::ActionFailed(
            format!("claim transaction {tx_hash} did not confirm: {error}"),
        )),
    }
}

fn display_amount(raw: U256, token: &TokenMetadata) -> String {
    format_token_amount(raw, token.decimals, token.display_decimal_places)
        .unwrap_or_else(|_| raw.to_string())
}

fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

fn display_drip_ascii_art(config: &config::Config) {
    tracing::info!("██████╗ ██████╗ ██╗██████╗ ");
    tracing::info!("██╔══██╗██╔══██╗██║██╔══██╗");
    tracing::info!("██║  ██║██████╔╝██║██████╔╝");
    tracing::info!("██║  ██║██╔══██╗██║██╔═══╝ ");
    tracing::info!("██████╔╝██║  ██║██║██║     ");
    tracing::info!("╚═════╝ ╚═╝  ╚═╝╚═╝╚═╝     ");

    tracing::info!("======================================================");
    tracing::info!("             Drip Client v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("======================================================");
    tracing::info!(
        "Running in {} environment (chain id {}, native token {} [{}])",
        config.environment,
        config.chain.chain_id(),
        config.chain.native_token_symbol(),
        config.chain.native_token_icon()
    );
}
