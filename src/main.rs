//! bets-gateway CLI - query and drive the betting oracle from a terminal

mod cli;

use anyhow::{Context, Result};
use bets_gateway::prelude::*;
use bets_gateway::TxHandle;
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command, CreateArgs};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = GatewayConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration '{}'", cli.config))?;
    info!("Configuration loaded successfully");

    let gateway = Gateway::connect(&config).context("Failed to create gateway")?;

    run(&gateway, cli).await
}

fn init_tracing() {
    // stdout carries the JSON results
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(gateway: &Gateway, cli: Cli) -> Result<()> {
    let wait = !cli.no_wait;

    match cli.command {
        Command::Fee => print_json(&gateway.platform_fee_bps().await),
        Command::Events => {
            let events = gateway.get_all_events().await?;
            print_json(&*events)
        }
        Command::Event { id } => match gateway.get_event_by_id(&id.to_string()).await {
            Some(event) => print_json(&event),
            None => anyhow::bail!("Event {} not found", id),
        },
        Command::Bets { address, ids } => print_json(&gateway.get_multiple_user_bets(&ids, address).await),
        Command::Logs { user } => print_json(&gateway.get_all_logs(user).await),
        Command::Profile { address } => print_json(&gateway.get_profile(address).await),
        Command::Pnl { address } => print_json(&gateway.pnl_history(address).await?),
        Command::Stats { address } => print_json(&gateway.user_stats(address).await?),
        Command::Create(args) => {
            let wallet = wallet(cli.private_key.as_deref())?;
            let created = gateway.create_event(&wallet, new_event(args)).await?;
            print_json(&created)
        }
        Command::Bet { id, outcome, amount } => {
            let wallet = wallet(cli.private_key.as_deref())?;
            let handle = gateway.place_bet(&wallet, id, outcome, &amount).await?;
            finish(gateway, handle, wait).await
        }
        Command::Resolve { id, outcome } => {
            let wallet = wallet(cli.private_key.as_deref())?;
            let handle = gateway.resolve_event(&wallet, id, outcome).await?;
            finish(gateway, handle, wait).await
        }
        Command::Cancel { id } => {
            let wallet = wallet(cli.private_key.as_deref())?;
            let handle = gateway.cancel_event(&wallet, id).await?;
            finish(gateway, handle, wait).await
        }
        Command::Claim { id } => {
            let wallet = wallet(cli.private_key.as_deref())?;
            let handle = gateway.claim(&wallet, id).await?;
            finish(gateway, handle, wait).await
        }
        Command::SetProfile {
            username,
            bio,
            twitter,
            website,
        } => {
            let wallet = wallet(cli.private_key.as_deref())?;
            let profile = UserProfile {
                username,
                bio,
                twitter,
                website,
            };
            let handle = gateway.set_profile(&wallet, &profile).await?;
            finish(gateway, handle, wait).await
        }
        Command::Wait { hash } => print_json(&gateway.wait_for_transaction(hash).await?),
    }
}

/// Signer from `--private-key`; without one, writes fail with a signer error
fn wallet(private_key: Option<&str>) -> Result<WalletHandle> {
    match private_key {
        Some(key) => WalletHandle::from_private_key(key).context("Failed to load signer"),
        None => Ok(WalletHandle::disconnected()),
    }
}

fn new_event(args: CreateArgs) -> NewEvent {
    NewEvent {
        question: args.question,
        description: args.description,
        category: args.category,
        betting_stop_date: args.betting_stop,
        resolution_date: args.resolution,
        min_stake: args.min_stake,
        max_stake: args.max_stake,
        image_url: args.image_url,
    }
}

async fn finish(gateway: &Gateway, handle: TxHandle, wait: bool) -> Result<()> {
    if !wait {
        return print_json(&handle);
    }

    info!("Waiting for {} to be mined...", handle.hash);
    let receipt = gateway
        .wait_for_transaction(handle.hash)
        .await
        .with_context(|| format!("Failed to {}", handle.action.label()))?;
    print_json(&receipt)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
