//! CLI argument parsing

use alloy_primitives::{Address, TxHash, U256};
use bets_gateway::types::parse_event_id;
use bets_gateway::{BetOutcome, GatewayError};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bets-gateway")]
#[command(about = "Read and write a prediction market's betting oracle and profile registry", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file, without extension; `BETS_*` environment variables override it
    #[arg(short, long, env = "BETS_CONFIG", default_value = "bets-gateway")]
    pub config: String,

    /// Private key for signing transactions
    #[arg(short = 'k', long, env = "PRIVATE_KEY", hide_env_values = true, global = true)]
    pub private_key: Option<String>,

    /// Return as soon as a transaction is submitted instead of waiting for its receipt.
    /// `create` always waits, the event id is only known once mined.
    #[arg(long, global = true)]
    pub no_wait: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Platform fee in basis points
    Fee,

    /// All events, latest betting deadline first
    Events,

    /// A single event
    Event {
        #[arg(value_parser = event_id)]
        id: U256,
    },

    /// An address's stakes on the given events
    Bets {
        address: Address,

        #[arg(value_parser = event_id, required = true)]
        ids: Vec<U256>,
    },

    /// Decoded contract history
    Logs {
        /// Only logs of this address (cancellations are always kept)
        #[arg(short, long)]
        user: Option<Address>,
    },

    /// Registry profile of an address
    Profile { address: Address },

    /// Settled profit and loss of an address
    Pnl { address: Address },

    /// Wins, losses and accuracy of an address
    Stats { address: Address },

    /// Create an event and print its id
    Create(CreateArgs),

    /// Stake on an event
    Bet {
        #[arg(value_parser = event_id)]
        id: U256,

        #[arg(value_parser = outcome)]
        outcome: BetOutcome,

        /// Stake in ether, e.g. 0.5
        amount: String,
    },

    /// Declare the winning outcome
    Resolve {
        #[arg(value_parser = event_id)]
        id: U256,

        #[arg(value_parser = outcome)]
        outcome: BetOutcome,
    },

    /// Cancel an event
    Cancel {
        #[arg(value_parser = event_id)]
        id: U256,
    },

    /// Claim winnings or a refund
    Claim {
        #[arg(value_parser = event_id)]
        id: U256,
    },

    /// Update the signer's profile
    SetProfile {
        #[arg(long, default_value = "")]
        username: String,

        #[arg(long, default_value = "")]
        bio: String,

        #[arg(long, default_value = "")]
        twitter: String,

        #[arg(long, default_value = "")]
        website: String,
    },

    /// Wait for a transaction to be mined
    Wait { hash: TxHash },
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub question: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long)]
    pub category: String,

    /// Betting deadline, RFC 3339
    #[arg(long)]
    pub betting_stop: DateTime<Utc>,

    /// Resolution date, RFC 3339
    #[arg(long)]
    pub resolution: DateTime<Utc>,

    /// Minimum stake in ether
    #[arg(long)]
    pub min_stake: String,

    /// Maximum stake in ether
    #[arg(long)]
    pub max_stake: String,

    /// Defaults to the configured placeholder of the category
    #[arg(long)]
    pub image_url: Option<String>,
}

fn event_id(raw: &str) -> Result<U256, GatewayError> {
    parse_event_id(raw)
}

fn outcome(raw: &str) -> Result<BetOutcome, GatewayError> {
    raw.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bet_command() {
        let cli = Cli::try_parse_from(["bets-gateway", "bet", "3", "yes", "0.25"]).unwrap();
        match cli.command {
            Command::Bet { id, outcome, amount } => {
                assert_eq!(id, U256::from(3));
                assert_eq!(outcome, BetOutcome::Yes);
                assert_eq!(amount, "0.25");
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(!cli.no_wait);
    }

    #[test]
    fn test_rejects_malformed_id() {
        assert!(Cli::try_parse_from(["bets-gateway", "event", "0x01"]).is_err());
        assert!(Cli::try_parse_from(["bets-gateway", "resolve", "1", "maybe"]).is_err());
    }

    #[test]
    fn test_parse_create_command() {
        let cli = Cli::try_parse_from([
            "bets-gateway",
            "--no-wait",
            "create",
            "--question",
            "Will it rain?",
            "--category",
            "Weather",
            "--betting-stop",
            "2030-01-01T00:00:00Z",
            "--resolution",
            "2030-01-02T00:00:00Z",
            "--min-stake",
            "0.01",
            "--max-stake",
            "1",
        ])
        .unwrap();

        assert!(cli.no_wait);
        match cli.command {
            Command::Create(args) => {
                assert_eq!(args.category, "Weather");
                assert_eq!(args.betting_stop.timestamp(), 1_893_456_000);
                assert!(args.image_url.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
