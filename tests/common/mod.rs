//! In-memory chain used to drive the gateway in integration tests

#![allow(dead_code)]

use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use async_trait::async_trait;
use bets_gateway::abi::{BetPosition, EventData, IBettingOracle, IUserProfileRegistry, Profile};
use bets_gateway::{
    ChainBackend, Gateway, GatewayConfig, GatewayError, ManualClock, RecordingNotifier, Result,
    TxReceipt, WalletHandle,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

pub const BETTING_CONTRACT: &str = "0x00000000000000000000000000000000000000b1";
pub const PROFILE_CONTRACT: &str = "0x00000000000000000000000000000000000000b2";

/// First default anvil account
pub const SIGNER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// 2024-01-01T00:00:00Z
pub const NOW: i64 = 1_704_067_200;

pub const ETHER: u64 = 1_000_000_000_000_000_000;

pub fn eth(n: u64) -> U256 {
    U256::from(n) * U256::from(ETHER)
}

#[derive(Default)]
pub struct ChainState {
    pub next_event_id: u64,
    pub events: HashMap<u64, EventData>,
    pub failing_events: HashSet<u64>,
    /// `None` makes `platformFeeBps` fail
    pub fee_bps: Option<U256>,
    pub bets: HashMap<(u64, Address), BetPosition>,
    pub failing_bets: HashSet<u64>,
    pub profiles: HashMap<Address, Profile>,
    /// Every simulated write reverts with this reason
    pub revert_reason: Option<String>,
    pub logs: Vec<Log>,
    pub logs_fail: bool,
    /// Mined transactions revert on-chain
    pub receipts_fail: bool,
    pub unreachable: bool,
    pub receipts: HashMap<TxHash, TxReceipt>,
    pub sent: Vec<TransactionRequest>,
    pub calls: HashMap<[u8; 4], usize>,
}

#[derive(Default)]
pub struct MockChain {
    state: Mutex<ChainState>,
    /// `getEvent` reads wait while a test holds this for writing
    pub event_reads: tokio::sync::RwLock<()>,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap()
    }

    pub fn add_event(&self, id: u64, event: EventData) {
        let mut state = self.state();
        state.events.insert(id, event);
        state.next_event_id = state.next_event_id.max(id + 1);
    }

    pub fn calls_to(&self, selector: [u8; 4]) -> usize {
        self.state().calls.get(&selector).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state().calls.values().sum()
    }

    pub fn sent_count(&self) -> usize {
        self.state().sent.len()
    }
}

fn selector_of(tx: &TransactionRequest) -> ([u8; 4], Bytes) {
    let input = tx.input.input().cloned().unwrap_or_default();
    let mut selector = [0u8; 4];
    if input.len() >= 4 {
        selector.copy_from_slice(&input[..4]);
    }
    (selector, input)
}

fn decode<C: SolCall>(input: &[u8]) -> Result<C> {
    C::abi_decode(input).map_err(|e| GatewayError::Rpc(format!("bad calldata: {}", e)))
}

fn id_of(id: U256) -> u64 {
    u64::try_from(id).unwrap()
}

fn is_write(selector: [u8; 4]) -> bool {
    [
        IBettingOracle::createEventCall::SELECTOR,
        IBettingOracle::placeBetCall::SELECTOR,
        IBettingOracle::resolveEventCall::SELECTOR,
        IBettingOracle::cancelEventCall::SELECTOR,
        IBettingOracle::claimCall::SELECTOR,
        IUserProfileRegistry::setProfileCall::SELECTOR,
    ]
    .contains(&selector)
}

#[async_trait]
impl ChainBackend for MockChain {
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes> {
        let (selector, input) = selector_of(&tx);
        {
            let mut state = self.state();
            if state.unreachable {
                return Err(GatewayError::Connectivity("connection refused".to_string()));
            }
            *state.calls.entry(selector).or_default() += 1;
        }

        if selector == IBettingOracle::getEventCall::SELECTOR {
            drop(self.event_reads.read().await);
        }

        let state = self.state();

        if is_write(selector) {
            return match &state.revert_reason {
                Some(reason) => Err(GatewayError::Revert {
                    context: "simulation".to_string(),
                    reason: reason.clone(),
                }),
                None => Ok(Bytes::new()),
            };
        }

        let output = if selector == IBettingOracle::nextEventIdCall::SELECTOR {
            U256::from(state.next_event_id).abi_encode()
        } else if selector == IBettingOracle::platformFeeBpsCall::SELECTOR {
            match state.fee_bps {
                Some(fee) => fee.abi_encode(),
                None => return Err(GatewayError::Rpc("fee unavailable".to_string())),
            }
        } else if selector == IBettingOracle::getEventCall::SELECTOR {
            let id = id_of(decode::<IBettingOracle::getEventCall>(&input)?.id);
            if state.failing_events.contains(&id) {
                return Err(GatewayError::Rpc(format!("getEvent({}) failed", id)));
            }
            state.events.get(&id).cloned().unwrap_or_default().abi_encode()
        } else if selector == IBettingOracle::getUserBetCall::SELECTOR {
            let call = decode::<IBettingOracle::getUserBetCall>(&input)?;
            let id = id_of(call.id);
            if state.failing_bets.contains(&id) {
                return Err(GatewayError::Rpc(format!("getUserBet({}) failed", id)));
            }
            state.bets.get(&(id, call.user)).cloned().unwrap_or_default().abi_encode()
        } else if selector == IUserProfileRegistry::getProfileCall::SELECTOR {
            let call = decode::<IUserProfileRegistry::getProfileCall>(&input)?;
            state.profiles.get(&call.user).cloned().unwrap_or_default().abi_encode()
        } else {
            return Err(GatewayError::Rpc("unknown selector".to_string()));
        };

        Ok(Bytes::from(output))
    }

    async fn estimate_gas(&self, _tx: TransactionRequest) -> Result<u64> {
        Ok(150_000)
    }

    async fn send_transaction(&self, _wallet: &EthereumWallet, tx: TransactionRequest) -> Result<TxHash> {
        let mut state = self.state();
        state.sent.push(tx.clone());
        let hash = TxHash::with_last_byte(state.sent.len() as u8);
        let block_number = 100 + state.sent.len() as u64;

        let (selector, input) = selector_of(&tx);
        let mut logs = Vec::new();
        if selector == IBettingOracle::createEventCall::SELECTOR {
            let call = decode::<IBettingOracle::createEventCall>(&input)?;
            let id = state.next_event_id;
            state.next_event_id += 1;

            let created = IBettingOracle::EventCreated {
                id: U256::from(id),
                creator: tx.from.unwrap_or_default(),
                question: call.question.clone(),
            };
            logs.push(rpc_log(created.encode_log_data(), block_number));

            state.events.insert(
                id,
                EventData {
                    question: call.question,
                    description: call.description,
                    category: call.category,
                    imageUrl: call.imageUrl,
                    bettingStopDate: call.bettingStopDate,
                    resolutionDate: call.resolutionDate,
                    minStake: call.minStake,
                    maxStake: call.maxStake,
                    ..Default::default()
                },
            );
        }

        let receipt = TxReceipt {
            transaction_hash: hash,
            block_number: Some(block_number),
            success: !state.receipts_fail,
            gas_used: 90_000,
            logs,
        };
        state.receipts.insert(hash, receipt);

        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt> {
        self.state()
            .receipts
            .get(&hash)
            .cloned()
            .ok_or_else(|| GatewayError::Transaction(format!("Unknown transaction {}", hash)))
    }

    async fn get_logs(&self, _filter: &Filter) -> Result<Vec<Log>> {
        let state = self.state();
        if state.logs_fail {
            return Err(GatewayError::Rpc("query returned more than 10000 results".to_string()));
        }
        Ok(state.logs.clone())
    }
}

pub fn rpc_log(data: alloy_primitives::LogData, block_number: u64) -> Log {
    Log {
        inner: alloy_primitives::Log {
            address: BETTING_CONTRACT.parse().unwrap(),
            data,
        },
        block_number: Some(block_number),
        ..Default::default()
    }
}

/// Open event whose betting closes `stop_offset` seconds after [`NOW`]
pub fn open_event(question: &str, stop_offset: i64) -> EventData {
    EventData {
        question: question.to_string(),
        description: format!("About {}", question),
        category: "Sports".to_string(),
        bettingStopDate: U256::from(NOW + stop_offset),
        resolutionDate: U256::from(NOW + stop_offset + 86_400),
        minStake: eth(1) / U256::from(100),
        maxStake: eth(10),
        yesPool: eth(3),
        noPool: eth(1),
        ..Default::default()
    }
}

pub fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(NOW, 0).unwrap()
}

pub fn config() -> GatewayConfig {
    let mut config = GatewayConfig::new("http://localhost:8545");
    config.betting_contract = Some(BETTING_CONTRACT.to_string());
    config.profile_contract = Some(PROFILE_CONTRACT.to_string());
    config
        .category_images
        .insert("Sports".to_string(), "https://img.example/sports.png".to_string());
    config
}

pub fn signer() -> WalletHandle {
    WalletHandle::from_private_key(SIGNER_KEY).unwrap()
}

pub struct Harness {
    pub chain: Arc<MockChain>,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub gateway: Gateway,
}

pub fn harness_with(config: GatewayConfig) -> Harness {
    let chain = MockChain::new();
    chain.state().fee_bps = Some(U256::from(300));

    let clock = Arc::new(ManualClock::new(now()));
    let notifier = Arc::new(RecordingNotifier::new());
    let gateway = Gateway::new(chain.clone(), config)
        .with_clock(clock.clone())
        .with_notifier(notifier.clone());

    Harness {
        chain,
        clock,
        notifier,
        gateway,
    }
}

pub fn harness() -> Harness {
    harness_with(config())
}
