//! Raw contract tuples to presentation records.
//!
//! Display amounts are `f64` ether and are lossy: anything that is sent back
//! on-chain must be recomputed from the user's decimal input with
//! [`parse_ether_amount`], or taken from [`RawAmounts`](crate::types::RawAmounts).

use alloy::primitives::utils::{format_ether, parse_ether};
use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::abi::EventData;
use crate::error::{GatewayError, Result};
use crate::types::{BetOutcome, Event, EventStatus, PoolTotals, RawAmounts};

/// Separates the plain description from a trailing image URL
pub const DESCRIPTION_IMAGE_DELIMITER: &str = "|||";

/// Map the contract status enum; unknown values read as open
pub fn status_from_raw(raw: u8) -> EventStatus {
    match raw {
        0 => EventStatus::Open,
        1 => EventStatus::Closed,
        2 => EventStatus::Finished,
        3 => EventStatus::Canceled,
        other => {
            warn!("Unknown event status {}, treating as open", other);
            EventStatus::Open
        }
    }
}

/// Status as shown to users: an open event whose betting deadline has passed is closed.
pub fn derive_status(
    raw: u8,
    betting_stop_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> EventStatus {
    match (status_from_raw(raw), betting_stop_date) {
        (EventStatus::Open, Some(deadline)) if deadline < now => EventStatus::Closed,
        (status, _) => status,
    }
}

/// Zero means "no deadline set"
pub fn deadline_from_unix(seconds: U256) -> Result<Option<DateTime<Utc>>> {
    if seconds.is_zero() {
        return Ok(None);
    }
    let secs = i64::try_from(seconds)
        .map_err(|_| GatewayError::Decoding(format!("Timestamp {} out of range", seconds)))?;
    DateTime::from_timestamp(secs, 0)
        .map(Some)
        .ok_or_else(|| GatewayError::Decoding(format!("Timestamp {} out of range", seconds)))
}

/// Unix seconds of `date`, truncated
pub fn unix_seconds(date: DateTime<Utc>) -> Result<U256> {
    u64::try_from(date.timestamp())
        .map(U256::from)
        .map_err(|_| GatewayError::InvalidInput(format!("Date {} precedes the unix epoch", date)))
}

/// 1 is YES, 2 is NO, anything else is unresolved
pub fn winning_outcome(raw: u8) -> Option<BetOutcome> {
    match raw {
        1 => Some(BetOutcome::Yes),
        2 => Some(BetOutcome::No),
        _ => None,
    }
}

/// Split at the first delimiter into description and image URL
pub fn split_description(full: &str) -> (String, Option<String>) {
    match full.split_once(DESCRIPTION_IMAGE_DELIMITER) {
        Some((description, image_url)) => (description.to_string(), Some(image_url.to_string())),
        None => (full.to_string(), None),
    }
}

/// Wei to display ether
pub fn wei_to_ether(wei: U256) -> f64 {
    format_ether(wei).parse().unwrap_or_default()
}

/// Exact wei amount of a decimal ether string
pub fn parse_ether_amount(amount: &str) -> Result<U256> {
    let amount = amount.trim();
    if amount.is_empty() || amount.starts_with('-') {
        return Err(GatewayError::InvalidInput(format!("Invalid amount '{}'", amount)));
    }
    parse_ether(amount)
        .map_err(|e| GatewayError::InvalidInput(format!("Invalid amount '{}': {}", amount, e)))
}

/// Normalize a `getEvent` result
pub fn normalize_event(id: U256, raw: &EventData, now: DateTime<Utc>) -> Result<Event> {
    let betting_stop_date = deadline_from_unix(raw.bettingStopDate)?;
    let resolution_date = deadline_from_unix(raw.resolutionDate)?;

    let (description, parsed_image_url) = split_description(&raw.description);
    let image_url = Some(raw.imageUrl.clone())
        .filter(|url| !url.is_empty())
        .or(parsed_image_url);

    let raw_amounts = RawAmounts {
        yes_pool: raw.yesPool,
        no_pool: raw.noPool,
        min_stake: raw.minStake,
        max_stake: raw.maxStake,
    };
    let outcomes = PoolTotals {
        yes: wei_to_ether(raw.yesPool),
        no: wei_to_ether(raw.noPool),
    };

    Ok(Event {
        id: id.to_string(),
        question: raw.question.clone(),
        description,
        image_url,
        category: raw.category.clone(),
        betting_stop_date,
        resolution_date,
        min_stake: wei_to_ether(raw.minStake),
        max_stake: wei_to_ether(raw.maxStake),
        status: derive_status(raw.status, betting_stop_date, now),
        total_pool: outcomes.yes + outcomes.no,
        outcomes,
        participants: Vec::new(),
        winning_outcome: winning_outcome(raw.winningOutcome),
        raw: raw_amounts,
    })
}
