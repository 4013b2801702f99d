//! Profit and loss of settled positions.
//!
//! Payouts are computed on the exact wei amounts of the event pools, the same
//! way the contract pays out a claim: the winning side shares the total pool
//! minus the platform fee, pro rata to stake.

use alloy_primitives::{I256, U256};
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use crate::normalize::wei_to_ether;
use crate::types::{BetOutcome, Event, EventStatus, UserBet};

const BPS_DENOMINATOR: u64 = 10_000;
const MONTH_FORMAT: &str = "%b %Y";

/// A position on a finished event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettledBet {
    pub event_id: String,
    pub event_question: String,
    pub side: BetOutcome,
    pub staked: U256,
    pub payout: U256,
    pub pnl_wei: I256,
    /// Display value of `pnl_wei`, in ether
    pub pnl: f64,
    pub won: bool,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlPoint {
    pub month: String,
    pub cumulative_pnl: f64,
}

/// Win/loss record over settled bets
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_bets: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percentage of settled bets won; 0 without any
    pub accuracy: f64,
}

impl UserStats {
    pub fn from_settled(bets: &[SettledBet]) -> Self {
        let wins = bets.iter().filter(|bet| bet.won).count();
        let total_bets = bets.len();
        let accuracy = if total_bets == 0 {
            0.0
        } else {
            wins as f64 * 100.0 / total_bets as f64
        };

        Self {
            total_bets,
            wins,
            losses: total_bets - wins,
            accuracy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlHistory {
    pub bets: Vec<SettledBet>,
    pub points: Vec<PnlPoint>,
    pub total_pnl: f64,
    pub stats: UserStats,
}

/// Amount paid to a holder of `stake` on the winning side
pub fn payout(stake: U256, winning_pool: U256, total_pool: U256, fee_bps: u64) -> U256 {
    if winning_pool.is_zero() || stake.is_zero() {
        return U256::ZERO;
    }
    let fee = total_pool.saturating_mul(U256::from(fee_bps)) / U256::from(BPS_DENOMINATOR);
    let distributable = total_pool.saturating_sub(fee);

    stake.saturating_mul(distributable) / winning_pool
}

/// Settle `bet` against `event`; `None` unless the event is finished with a
/// winner and the bet holds a position.
pub fn settle(event: &Event, bet: &UserBet, fee_bps: u64, now: DateTime<Utc>) -> Option<SettledBet> {
    if event.status != EventStatus::Finished || !bet.has_position() {
        return None;
    }
    let winner = event.winning_outcome?;

    let raw = &event.raw;
    let winning_pool = match winner {
        BetOutcome::Yes => raw.yes_pool,
        BetOutcome::No => raw.no_pool,
    };

    let staked = bet.total();
    let stake_on_winner = bet.stake_on(winner);
    let payout = payout(stake_on_winner, winning_pool, raw.total_pool(), fee_bps);
    let pnl_wei = signed(payout) - signed(staked);

    let side = if bet.yes_amount.is_zero() {
        BetOutcome::No
    } else {
        BetOutcome::Yes
    };

    Some(SettledBet {
        event_id: event.id.clone(),
        event_question: event.question.clone(),
        side,
        staked,
        payout,
        pnl_wei,
        pnl: signed_to_ether(pnl_wei),
        won: !stake_on_winner.is_zero(),
        date: event.resolution_date.unwrap_or(now),
    })
}

/// Order settled bets by date and accumulate them per calendar month
pub fn history(mut bets: Vec<SettledBet>) -> PnlHistory {
    bets.sort_by_key(|bet| bet.date);

    let mut points: Vec<PnlPoint> = Vec::new();
    let mut cumulative = 0.0;
    for bet in &bets {
        cumulative += bet.pnl;
        let month = bet.date.format(MONTH_FORMAT).to_string();
        match points.last_mut() {
            Some(last) if last.month == month => last.cumulative_pnl = cumulative,
            _ => points.push(PnlPoint {
                month,
                cumulative_pnl: cumulative,
            }),
        }
    }

    // A single month gets a zero baseline in the month before it
    if let ([only], Some(first)) = (points.as_slice(), bets.first()) {
        let baseline = PnlPoint {
            month: previous_month(first.date).format(MONTH_FORMAT).to_string(),
            cumulative_pnl: 0.0,
        };
        points = vec![baseline, only.clone()];
    }

    PnlHistory {
        stats: UserStats::from_settled(&bets),
        bets,
        points,
        total_pnl: cumulative,
    }
}

fn previous_month(date: DateTime<Utc>) -> DateTime<Utc> {
    let first_of_month = date - Duration::days(i64::from(date.day0()));
    first_of_month - Duration::days(1)
}

fn signed(value: U256) -> I256 {
    I256::try_from(value).unwrap_or(I256::MAX)
}

fn signed_to_ether(value: I256) -> f64 {
    let magnitude = wei_to_ether(value.unsigned_abs());
    if value.is_negative() {
        -magnitude
    } else {
        magnitude
    }
}
