//! Presentation-level records produced by the gateway

use alloy::rpc::types::Log;
use alloy_primitives::{Address, TxHash, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{GatewayError, Result};

/// Lifecycle status of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Open,
    Closed,
    Finished,
    Canceled,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventStatus::Open => "open",
            EventStatus::Closed => "closed",
            EventStatus::Finished => "finished",
            EventStatus::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// Side of a binary event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BetOutcome {
    Yes,
    No,
}

impl BetOutcome {
    /// Contract encoding: `true` is YES
    pub fn as_bool(self) -> bool {
        matches!(self, BetOutcome::Yes)
    }

    pub fn from_bool(yes: bool) -> Self {
        if yes {
            BetOutcome::Yes
        } else {
            BetOutcome::No
        }
    }
}

impl fmt::Display for BetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetOutcome::Yes => f.write_str("YES"),
            BetOutcome::No => f.write_str("NO"),
        }
    }
}

impl FromStr for BetOutcome {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" => Ok(BetOutcome::Yes),
            "no" | "n" | "false" => Ok(BetOutcome::No),
            other => Err(GatewayError::InvalidInput(format!("Unknown outcome '{}'", other))),
        }
    }
}

/// Display totals of both pools, in ether
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoolTotals {
    pub yes: f64,
    pub no: f64,
}

/// Exact on-chain amounts in wei, kept alongside the display values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAmounts {
    pub yes_pool: U256,
    pub no_pool: U256,
    pub min_stake: U256,
    pub max_stake: U256,
}

impl RawAmounts {
    pub fn total_pool(&self) -> U256 {
        self.yes_pool.saturating_add(self.no_pool)
    }
}

/// A binary-outcome betting event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub question: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub category: String,
    pub betting_stop_date: Option<DateTime<Utc>>,
    pub resolution_date: Option<DateTime<Utc>>,
    pub min_stake: f64,
    pub max_stake: f64,
    pub status: EventStatus,
    pub outcomes: PoolTotals,
    pub total_pool: f64,
    /// Not populated inline; requires a log index
    pub participants: Vec<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_outcome: Option<BetOutcome>,
    pub raw: RawAmounts,
}

impl Event {
    pub fn numeric_id(&self) -> Result<U256> {
        parse_event_id(&self.id)
    }

    /// Sort key: betting-stop deadline in unix seconds, `0` when unset
    pub(crate) fn deadline_key(&self) -> i64 {
        self.betting_stop_date.map(|d| d.timestamp()).unwrap_or(0)
    }
}

/// Parse a decimal event id
pub fn parse_event_id(id: &str) -> Result<U256> {
    let id = id.trim();
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GatewayError::InvalidInput(format!("Invalid event id '{}'", id)));
    }
    U256::from_str_radix(id, 10)
        .map_err(|e| GatewayError::InvalidInput(format!("Invalid event id '{}': {}", id, e)))
}

/// Stakes of one address on one event, in wei
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBet {
    pub yes_amount: U256,
    pub no_amount: U256,
    pub claimed: bool,
}

impl UserBet {
    pub fn total(&self) -> U256 {
        self.yes_amount.saturating_add(self.no_amount)
    }

    pub fn has_position(&self) -> bool {
        !self.total().is_zero()
    }

    /// Stake on `side`
    pub fn stake_on(&self, side: BetOutcome) -> U256 {
        match side {
            BetOutcome::Yes => self.yes_amount,
            BetOutcome::No => self.no_amount,
        }
    }
}

/// Result of one item of a batched bet lookup.
///
/// A failed read degrades to the zero/unclaimed default and records why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetLookup {
    pub event_id: U256,
    pub bet: UserBet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BetLookup {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Profile registry record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub bio: String,
    pub twitter: String,
    pub website: String,
}

impl UserProfile {
    /// Upper bound on the bio, in characters
    pub const MAX_BIO_CHARS: usize = 256;

    pub fn is_empty(&self) -> bool {
        self.username.is_empty()
            && self.bio.is_empty()
            && self.twitter.is_empty()
            && self.website.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetPlacedLog {
    pub event_id: U256,
    pub user: Address,
    pub outcome: BetOutcome,
    pub amount: U256,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinningsClaimedLog {
    pub event_id: U256,
    pub user: Address,
    pub amount: U256,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCanceledLog {
    pub event_id: U256,
    pub block_number: Option<u64>,
}

/// Decoded contract history, grouped by kind
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllLogs {
    pub bet_placed: Vec<BetPlacedLog>,
    pub winnings_claimed: Vec<WinningsClaimedLog>,
    pub event_canceled: Vec<EventCanceledLog>,
}

impl AllLogs {
    pub fn len(&self) -> usize {
        self.bet_placed.len() + self.winnings_claimed.len() + self.event_canceled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Write operations exposed by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteAction {
    CreateEvent,
    PlaceBet,
    ResolveEvent,
    CancelEvent,
    Claim,
    SetProfile,
}

impl WriteAction {
    /// Human-readable operation name used in errors and notifications
    pub fn label(self) -> &'static str {
        match self {
            WriteAction::CreateEvent => "create event",
            WriteAction::PlaceBet => "place bet",
            WriteAction::ResolveEvent => "declare result",
            WriteAction::CancelEvent => "cancel event",
            WriteAction::Claim => "claim winnings",
            WriteAction::SetProfile => "set profile",
        }
    }

    /// Whether the write can change event data
    pub fn touches_events(self) -> bool {
        !matches!(self, WriteAction::SetProfile)
    }
}

/// Handle of a submitted, not yet confirmed, transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxHandle {
    pub hash: TxHash,
    pub action: WriteAction,
}

/// Confirmed transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub success: bool,
    pub gas_used: u64,
    pub logs: Vec<Log>,
}

/// Parameters of a new event; stakes are decimal ether strings as entered by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub question: String,
    pub description: String,
    pub category: String,
    pub betting_stop_date: DateTime<Utc>,
    pub resolution_date: DateTime<Utc>,
    pub min_stake: String,
    pub max_stake: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Outcome of a confirmed `create_event`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    pub tx_hash: TxHash,
    pub event_id: String,
}
