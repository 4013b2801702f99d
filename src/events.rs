//! Decoding of betting oracle logs

use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, U256};
use tracing::trace;

use crate::abi::IBettingOracle::{BetPlaced, EventCanceled, EventCreated, WinningsClaimed};
use crate::types::{AllLogs, BetOutcome, BetPlacedLog, EventCanceledLog, WinningsClaimedLog};

/// A log recognised as one of the oracle's events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedLog {
    EventCreated { id: U256, creator: Address, question: String },
    BetPlaced(BetPlacedLog),
    WinningsClaimed(WinningsClaimedLog),
    EventCanceled(EventCanceledLog),
}

impl DecodedLog {
    /// Account the log belongs to; `None` for logs that carry no user
    pub fn user(&self) -> Option<Address> {
        match self {
            DecodedLog::EventCreated { creator, .. } => Some(*creator),
            DecodedLog::BetPlaced(log) => Some(log.user),
            DecodedLog::WinningsClaimed(log) => Some(log.user),
            DecodedLog::EventCanceled(_) => None,
        }
    }
}

/// Decode `log` against the known signatures. Anything else, including
/// logs whose topic matches but whose data does not, yields `None`.
pub fn decode_log(log: &Log) -> Option<DecodedLog> {
    let signature = *log.topics().first()?;
    let block_number = log.block_number;

    let decoded = if signature == BetPlaced::SIGNATURE_HASH {
        log.log_decode::<BetPlaced>().ok().map(|decoded| {
            let event = decoded.inner.data;
            DecodedLog::BetPlaced(BetPlacedLog {
                event_id: event.eventId,
                user: event.user,
                outcome: BetOutcome::from_bool(event.outcome),
                amount: event.amount,
                block_number,
            })
        })
    } else if signature == WinningsClaimed::SIGNATURE_HASH {
        log.log_decode::<WinningsClaimed>().ok().map(|decoded| {
            let event = decoded.inner.data;
            DecodedLog::WinningsClaimed(WinningsClaimedLog {
                event_id: event.eventId,
                user: event.user,
                amount: event.amount,
                block_number,
            })
        })
    } else if signature == EventCanceled::SIGNATURE_HASH {
        log.log_decode::<EventCanceled>().ok().map(|decoded| {
            DecodedLog::EventCanceled(EventCanceledLog {
                event_id: decoded.inner.data.eventId,
                block_number,
            })
        })
    } else if signature == EventCreated::SIGNATURE_HASH {
        log.log_decode::<EventCreated>().ok().map(|decoded| {
            let event = decoded.inner.data;
            DecodedLog::EventCreated {
                id: event.id,
                creator: event.creator,
                question: event.question,
            }
        })
    } else {
        None
    };

    if decoded.is_none() {
        trace!(topic = %signature, "Skipping unrecognised log");
    }
    decoded
}

/// Group decoded logs by kind, optionally keeping only `user`'s.
/// Logs without a user are never filtered out.
pub fn collect_logs(logs: &[Log], user: Option<Address>) -> AllLogs {
    let mut all = AllLogs::default();

    for decoded in logs.iter().filter_map(decode_log) {
        if let (Some(wanted), Some(owner)) = (user, decoded.user()) {
            if wanted != owner {
                continue;
            }
        }

        match decoded {
            DecodedLog::BetPlaced(log) => all.bet_placed.push(log),
            DecodedLog::WinningsClaimed(log) => all.winnings_claimed.push(log),
            DecodedLog::EventCanceled(log) => all.event_canceled.push(log),
            DecodedLog::EventCreated { .. } => {}
        }
    }

    all
}

/// Id assigned by the first `EventCreated` log in `logs`
pub fn find_created_event_id(logs: &[Log]) -> Option<U256> {
    logs.iter().find_map(|log| match decode_log(log) {
        Some(DecodedLog::EventCreated { id, .. }) => Some(id),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{LogData, B256};

    fn rpc_log(data: LogData, block_number: u64) -> Log {
        Log {
            inner: alloy_primitives::Log {
                address: Address::repeat_byte(0xaa),
                data,
            },
            block_number: Some(block_number),
            ..Default::default()
        }
    }

    fn alice() -> Address {
        Address::repeat_byte(0x11)
    }

    fn bob() -> Address {
        Address::repeat_byte(0x22)
    }

    fn history() -> Vec<Log> {
        vec![
            rpc_log(
                BetPlaced {
                    eventId: U256::from(1),
                    user: alice(),
                    outcome: true,
                    amount: U256::from(100),
                }
                .encode_log_data(),
                10,
            ),
            rpc_log(
                BetPlaced {
                    eventId: U256::from(1),
                    user: bob(),
                    outcome: false,
                    amount: U256::from(50),
                }
                .encode_log_data(),
                11,
            ),
            rpc_log(
                WinningsClaimed {
                    eventId: U256::from(1),
                    user: alice(),
                    amount: U256::from(140),
                }
                .encode_log_data(),
                20,
            ),
            rpc_log(EventCanceled { eventId: U256::from(2) }.encode_log_data(), 21),
            // Foreign event on the same contract
            rpc_log(LogData::new_unchecked(vec![B256::repeat_byte(0x42)], Default::default()), 22),
            // Known topic, truncated data
            rpc_log(
                LogData::new_unchecked(
                    vec![BetPlaced::SIGNATURE_HASH, B256::ZERO, B256::ZERO],
                    vec![1u8, 2, 3].into(),
                ),
                23,
            ),
        ]
    }

    #[test]
    fn test_collect_all_logs() {
        let all = collect_logs(&history(), None);
        assert_eq!(all.bet_placed.len(), 2);
        assert_eq!(all.winnings_claimed.len(), 1);
        assert_eq!(all.event_canceled.len(), 1);

        let first = &all.bet_placed[0];
        assert_eq!(first.user, alice());
        assert_eq!(first.outcome, BetOutcome::Yes);
        assert_eq!(first.block_number, Some(10));
        assert_eq!(all.bet_placed[1].outcome, BetOutcome::No);
    }

    #[test]
    fn test_user_filter_keeps_cancellations() {
        let all = collect_logs(&history(), Some(bob()));
        assert_eq!(all.bet_placed.len(), 1);
        assert_eq!(all.bet_placed[0].amount, U256::from(50));
        assert!(all.winnings_claimed.is_empty());
        assert_eq!(all.event_canceled.len(), 1);
    }

    #[test]
    fn test_find_created_event_id() {
        let mut logs = history();
        logs.push(rpc_log(
            EventCreated {
                id: U256::from(7),
                creator: alice(),
                question: "Will it rain?".to_string(),
            }
            .encode_log_data(),
            30,
        ));

        assert_eq!(find_created_event_id(&logs), Some(U256::from(7)));
        assert_eq!(find_created_event_id(&history()), None);
    }

    #[test]
    fn test_log_without_topics_is_skipped() {
        let log = rpc_log(LogData::new_unchecked(Vec::new(), Default::default()), 1);
        assert_eq!(decode_log(&log), None);
    }
}
