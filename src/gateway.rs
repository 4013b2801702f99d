//! The on-chain data gateway.
//!
//! Sole mediator between callers and the two contracts. Reads degrade to
//! empty or default values when a contract is unconfigured or a single read
//! fails; writes reject loudly with the decoded revert reason.
//!
//! Every write follows the same protocol: check the signer, check the target
//! contract, simulate with `eth_call`, estimate gas, submit, and hand back a
//! [`TxHandle`] without waiting for inclusion. [`Gateway::wait_for_transaction`]
//! awaits confirmation separately.

use alloy::eips::BlockNumberOrTag;
use alloy::rpc::types::Filter;
use alloy_primitives::{Address, TxHash, U256};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::abi::{IBettingOracle, IUserProfileRegistry};
use crate::backend::{ChainBackend, RpcBackend};
use crate::cache::{EventsCache, EventsSnapshot};
use crate::clock::{Clock, SystemClock};
use crate::config::{ContractAddresses, GatewayConfig};
use crate::contract::{BettingOracle, ProfileRegistry, WriteCall};
use crate::error::{GatewayError, Result};
use crate::events::{collect_logs, find_created_event_id};
use crate::normalize::{normalize_event, parse_ether_amount, unix_seconds};
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::pnl::{self, PnlHistory, UserStats};
use crate::types::{
    parse_event_id, AllLogs, BetLookup, BetOutcome, CreatedEvent, Event, NewEvent, TxHandle,
    TxReceipt, UserBet, UserProfile, WriteAction,
};
use crate::wallet::WalletHandle;

const BETTING_NOT_CONFIGURED: &str = "Betting contract address is not configured";
const PROFILE_NOT_CONFIGURED: &str = "Profile registry address is not configured";

/// Upper bound on `nextEventId`; anything above is treated as a corrupt read
pub const MAX_EVENT_COUNT: u64 = 100_000;

pub struct Gateway {
    backend: Arc<dyn ChainBackend>,
    contracts: ContractAddresses,
    config: GatewayConfig,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    cache: EventsCache,
}

impl Gateway {
    pub fn new(backend: Arc<dyn ChainBackend>, config: GatewayConfig) -> Self {
        let contracts = config.contract_addresses();
        let cache = EventsCache::new(config.cache_ttl());

        Self {
            backend,
            contracts,
            config,
            clock: Arc::new(SystemClock),
            notifier: Arc::new(TracingNotifier),
            cache,
        }
    }

    /// Gateway over the configured HTTP endpoint
    pub fn connect(config: &GatewayConfig) -> Result<Self> {
        let backend = RpcBackend::from_config(config)?;
        info!("Connecting gateway to {}", backend.rpc_url());

        Ok(Self::new(Arc::new(backend), config.clone()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn contracts(&self) -> ContractAddresses {
        self.contracts
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn oracle(&self) -> BettingOracle<'_> {
        BettingOracle::new(self.backend.as_ref(), self.contracts.betting)
    }

    fn registry(&self) -> ProfileRegistry<'_> {
        ProfileRegistry::new(self.backend.as_ref(), self.contracts.profile)
    }

    // ---- reads ----

    /// Platform fee in basis points, falling back to the configured default
    pub async fn platform_fee_bps(&self) -> u64 {
        let fallback = self.config.default_platform_fee_bps;
        if !self.contracts.betting_configured() {
            return fallback;
        }

        match self.oracle().platform_fee_bps().await {
            Ok(fee) => u64::try_from(fee).unwrap_or_else(|_| {
                warn!("Platform fee {} out of range, using {}", fee, fallback);
                fallback
            }),
            Err(e) => {
                warn!("Failed to fetch platform fee, using {}: {}", fallback, e);
                fallback
            }
        }
    }

    /// All events, latest betting deadline first.
    ///
    /// Served from the cache while it is fresh; the returned `Arc` is then the
    /// same allocation on every call. Ids whose read fails are left out and
    /// recorded on the snapshot.
    pub async fn get_all_events(&self) -> Result<Arc<Vec<Event>>> {
        let now = self.clock.now();
        if let Some(snapshot) = self.cache.fresh(now).await {
            debug!(generation = snapshot.generation, "Serving events from cache");
            return Ok(snapshot.events);
        }
        // A write landing mid-fetch bumps this and keeps the result out of the cache
        let started = self.cache.generation().await;

        if !self.contracts.betting_configured() {
            return Ok(Arc::new(Vec::new()));
        }

        let oracle = self.oracle();
        let next_id = oracle.next_event_id().await.map_err(|e| {
            error!("Failed to read event counter: {}", e);
            e
        })?;
        let count = u64::try_from(next_id)
            .ok()
            .filter(|count| *count <= MAX_EVENT_COUNT)
            .ok_or_else(|| GatewayError::Decoding(format!("Event counter {} out of range", next_id)))?;

        let reads = (0..count).map(U256::from).map(|id| async move {
            let result = oracle.get_event(id).await;
            (id, result)
        });
        let results = join_all(reads).await;

        let mut events = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();
        for (id, result) in results {
            match result.and_then(|raw| normalize_event(id, &raw, now)) {
                // Never created
                Ok(event) if event.question.is_empty() => {}
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!("Skipping event {}: {}", id, e);
                    skipped.push(id);
                }
            }
        }
        events.sort_by_key(|event| std::cmp::Reverse(event.deadline_key()));

        let snapshot = self.cache.store(started, events, skipped, now).await;
        info!(
            events = snapshot.events.len(),
            skipped = snapshot.skipped.len(),
            "Fetched events"
        );
        Ok(snapshot.events)
    }

    /// Single event; `None` for unknown ids and failed reads
    pub async fn get_event_by_id(&self, id: &str) -> Option<Event> {
        if !self.contracts.betting_configured() {
            return None;
        }
        let numeric_id = match parse_event_id(id) {
            Ok(numeric_id) => numeric_id,
            Err(e) => {
                debug!("{}", e);
                return None;
            }
        };

        let now = self.clock.now();
        if let Some(snapshot) = self.cache.fresh(now).await {
            let key = numeric_id.to_string();
            if let Some(event) = snapshot.events.iter().find(|event| event.id == key) {
                return Some(event.clone());
            }
        }

        let event = self
            .oracle()
            .get_event(numeric_id)
            .await
            .and_then(|raw| normalize_event(numeric_id, &raw, now));

        match event {
            Ok(event) if event.question.is_empty() => None,
            Ok(event) => Some(event),
            Err(e) => {
                debug!("Event {} unavailable: {}", numeric_id, e);
                None
            }
        }
    }

    /// `user`'s stakes on each of `event_ids`, one result per id in input order
    pub async fn get_multiple_user_bets(&self, event_ids: &[U256], user: Address) -> Vec<BetLookup> {
        if !self.contracts.betting_configured() {
            return event_ids
                .iter()
                .map(|&event_id| BetLookup {
                    event_id,
                    bet: UserBet::default(),
                    error: Some(BETTING_NOT_CONFIGURED.to_string()),
                })
                .collect();
        }

        let oracle = self.oracle();
        let reads = event_ids.iter().map(|&event_id| async move {
            match oracle.get_user_bet(event_id, user).await {
                Ok(position) => BetLookup {
                    event_id,
                    bet: UserBet {
                        yes_amount: position.yesAmount,
                        no_amount: position.noAmount,
                        claimed: position.claimed,
                    },
                    error: None,
                },
                Err(e) => {
                    warn!("Failed to fetch bet of {} on event {}: {}", user, event_id, e);
                    BetLookup {
                        event_id,
                        bet: UserBet::default(),
                        error: Some(e.to_string()),
                    }
                }
            }
        });

        join_all(reads).await
    }

    /// Decoded contract history from genesis to the latest block.
    /// Filtering by `user` keeps cancellations, which carry no user.
    pub async fn get_all_logs(&self, user: Option<Address>) -> AllLogs {
        if !self.contracts.betting_configured() {
            return AllLogs::default();
        }

        let filter = Filter::new()
            .address(self.contracts.betting)
            .from_block(BlockNumberOrTag::Earliest)
            .to_block(BlockNumberOrTag::Latest);

        match self.backend.get_logs(&filter).await {
            Ok(logs) => {
                let all = collect_logs(&logs, user);
                debug!(scanned = logs.len(), decoded = all.len(), "Decoded contract logs");
                all
            }
            Err(e) => {
                warn!("Failed to fetch logs: {}", e);
                AllLogs::default()
            }
        }
    }

    /// Profile of `user`; empty when unset, unconfigured or unreadable
    pub async fn get_profile(&self, user: Address) -> UserProfile {
        if !self.contracts.profile_configured() {
            return UserProfile::default();
        }

        match self.registry().get_profile(user).await {
            Ok(profile) => UserProfile {
                username: profile.username,
                bio: profile.bio,
                twitter: profile.twitterHandle,
                website: profile.websiteUrl,
            },
            Err(e) => {
                warn!("Could not fetch profile for {}: {}", user, e);
                UserProfile::default()
            }
        }
    }

    /// Settled profit and loss of `user` across finished events
    pub async fn pnl_history(&self, user: Address) -> Result<PnlHistory> {
        let events = self.get_all_events().await?;
        if events.is_empty() {
            return Ok(PnlHistory::default());
        }

        let fee_bps = self.platform_fee_bps().await;
        let tracked: Vec<(&Event, U256)> = events
            .iter()
            .filter_map(|event| event.numeric_id().ok().map(|id| (event, id)))
            .collect();
        let ids: Vec<U256> = tracked.iter().map(|(_, id)| *id).collect();
        let lookups = self.get_multiple_user_bets(&ids, user).await;

        let now = self.clock.now();
        let settled = tracked
            .iter()
            .zip(&lookups)
            .filter_map(|((event, _), lookup)| pnl::settle(event, &lookup.bet, fee_bps, now))
            .collect();

        Ok(pnl::history(settled))
    }

    /// Wins, losses and accuracy of `user` over settled bets
    pub async fn user_stats(&self, user: Address) -> Result<UserStats> {
        Ok(self.pnl_history(user).await?.stats)
    }

    /// Last stored snapshot, fresh or not
    pub async fn cache_snapshot(&self) -> Option<EventsSnapshot> {
        self.cache.latest().await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    // ---- writes ----

    /// Create an event and wait until it is mined; returns the assigned id
    pub async fn create_event(&self, wallet: &WalletHandle, event: NewEvent) -> Result<CreatedEvent> {
        let result = self.try_create_event(wallet, event).await;
        self.report(WriteAction::CreateEvent, result)
    }

    async fn try_create_event(&self, wallet: &WalletHandle, event: NewEvent) -> Result<CreatedEvent> {
        let handle = self
            .submit(wallet, WriteAction::CreateEvent, |to| {
                let min_stake = parse_ether_amount(&event.min_stake)?;
                let max_stake = parse_ether_amount(&event.max_stake)?;
                let image_url = event
                    .image_url
                    .clone()
                    .filter(|url| !url.is_empty())
                    .or_else(|| self.config.category_image(&event.category).map(str::to_string))
                    .unwrap_or_default();

                Ok(WriteCall::new(
                    to,
                    IBettingOracle::createEventCall {
                        question: event.question.clone(),
                        description: event.description.clone(),
                        category: event.category.clone(),
                        imageUrl: image_url,
                        bettingStopDate: unix_seconds(event.betting_stop_date)?,
                        resolutionDate: unix_seconds(event.resolution_date)?,
                        minStake: min_stake,
                        maxStake: max_stake,
                    },
                ))
            })
            .await?;

        let receipt = self.wait_for_transaction(handle.hash).await?;
        let event_id = find_created_event_id(&receipt.logs).ok_or_else(|| {
            GatewayError::MissingLog(format!(
                "Could not find EventCreated log in receipt of {}",
                handle.hash
            ))
        })?;
        let event_id = event_id.to_string();

        info!(event_id = %event_id, tx = %handle.hash, "Event created");
        self.notifier.notify(
            Notification::success("Event Created Successfully!", "The event is now live.")
                .with_href(format!("/event/{}", event_id)),
        );

        Ok(CreatedEvent {
            tx_hash: handle.hash,
            event_id,
        })
    }

    /// Stake `amount` ether on `outcome`
    pub async fn place_bet(
        &self,
        wallet: &WalletHandle,
        event_id: U256,
        outcome: BetOutcome,
        amount: &str,
    ) -> Result<TxHandle> {
        let result = self
            .submit(wallet, WriteAction::PlaceBet, |to| {
                let value = parse_ether_amount(amount)?;
                let call = IBettingOracle::placeBetCall {
                    id: event_id,
                    outcome: outcome.as_bool(),
                };
                Ok(WriteCall::new(to, call).with_value(value))
            })
            .await;
        self.report(WriteAction::PlaceBet, result)
    }

    pub async fn resolve_event(
        &self,
        wallet: &WalletHandle,
        event_id: U256,
        outcome: BetOutcome,
    ) -> Result<TxHandle> {
        let result = self
            .submit(wallet, WriteAction::ResolveEvent, |to| {
                Ok(WriteCall::new(
                    to,
                    IBettingOracle::resolveEventCall {
                        id: event_id,
                        outcome: outcome.as_bool(),
                    },
                ))
            })
            .await;
        self.report(WriteAction::ResolveEvent, result)
    }

    pub async fn cancel_event(&self, wallet: &WalletHandle, event_id: U256) -> Result<TxHandle> {
        let result = self
            .submit(wallet, WriteAction::CancelEvent, |to| {
                Ok(WriteCall::new(to, IBettingOracle::cancelEventCall { id: event_id }))
            })
            .await;
        self.report(WriteAction::CancelEvent, result)
    }

    pub async fn claim(&self, wallet: &WalletHandle, event_id: U256) -> Result<TxHandle> {
        let result = self
            .submit(wallet, WriteAction::Claim, |to| {
                Ok(WriteCall::new(to, IBettingOracle::claimCall { id: event_id }))
            })
            .await;
        self.report(WriteAction::Claim, result)
    }

    pub async fn set_profile(&self, wallet: &WalletHandle, profile: &UserProfile) -> Result<TxHandle> {
        let result = self
            .submit(wallet, WriteAction::SetProfile, |to| {
                let bio_chars = profile.bio.chars().count();
                if bio_chars > UserProfile::MAX_BIO_CHARS {
                    return Err(GatewayError::InvalidInput(format!(
                        "Bio is {} characters, the limit is {}",
                        bio_chars,
                        UserProfile::MAX_BIO_CHARS
                    )));
                }

                Ok(WriteCall::new(
                    to,
                    IUserProfileRegistry::setProfileCall {
                        username: profile.username.clone(),
                        bio: profile.bio.clone(),
                        twitterHandle: profile.twitter.clone(),
                        websiteUrl: profile.website.clone(),
                    },
                ))
            })
            .await;
        self.report(WriteAction::SetProfile, result)
    }

    /// Wait until `hash` is mined. A reverted transaction is an error;
    /// a successful one invalidates the events cache.
    pub async fn wait_for_transaction(&self, hash: TxHash) -> Result<TxReceipt> {
        let receipt = self.backend.wait_for_receipt(hash).await?;

        if !receipt.success {
            return Err(GatewayError::Transaction(format!(
                "Transaction {} reverted in block {:?}",
                hash, receipt.block_number
            )));
        }

        self.cache.clear().await;
        info!(
            tx = %hash,
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );
        Ok(receipt)
    }

    fn target(&self, action: WriteAction) -> Result<Address> {
        let (address, configured, message) = if action.touches_events() {
            (self.contracts.betting, self.contracts.betting_configured(), BETTING_NOT_CONFIGURED)
        } else {
            (self.contracts.profile, self.contracts.profile_configured(), PROFILE_NOT_CONFIGURED)
        };

        if configured {
            Ok(address)
        } else {
            Err(GatewayError::Configuration(message.to_string()))
        }
    }

    async fn submit<F>(&self, wallet: &WalletHandle, action: WriteAction, build: F) -> Result<TxHandle>
    where
        F: FnOnce(Address) -> Result<WriteCall> + Send,
    {
        let label = action.label();
        let (from, signer) = wallet.signer()?;
        let to = self.target(action)?;
        let tx = build(to)?.request(from);

        self.backend
            .call(tx.clone())
            .await
            .map_err(|e| e.in_context(label))?;
        let gas = self
            .backend
            .estimate_gas(tx.clone())
            .await
            .map_err(|e| e.in_context(label))?;

        let hash = self
            .backend
            .send_transaction(signer, tx.gas_limit(gas))
            .await
            .map_err(|e| e.in_context(label))?;

        if action.touches_events() {
            self.cache.clear().await;
        }
        info!(tx = %hash, from = %from, gas, "Submitted {}", label);
        self.notifier.notify(Notification::pending(
            "Transaction Submitted",
            format!("Waiting for {} to confirm.", label),
        ));

        Ok(TxHandle { hash, action })
    }

    fn report<T>(&self, action: WriteAction, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            error!("Failed to {}: {}", action.label(), e);
            self.notifier
                .notify(Notification::error(format!("Failed to {}", action.label()), e.to_string()));
        }
        result
    }
}
