//! Versioned snapshot of the normalized event list.

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::Event;

/// One full read of the event list
#[derive(Debug, Clone)]
pub struct EventsSnapshot {
    pub events: Arc<Vec<Event>>,
    pub captured_at: DateTime<Utc>,
    /// Increases on every store and clear; readers can tell two snapshots apart without comparing contents
    pub generation: u64,
    /// Ids whose read or normalization failed and were left out
    pub skipped: Vec<U256>,
}

impl EventsSnapshot {
    /// Whether the snapshot is younger than `ttl` at `now`
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(self.captured_at) < ttl,
            Err(_) => true,
        }
    }
}

/// Event list cache shared by all readers of a gateway
#[derive(Debug)]
pub struct EventsCache {
    ttl: Duration,
    state: RwLock<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Option<EventsSnapshot>,
    generation: u64,
}

impl EventsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(CacheState::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current snapshot if it is still within the freshness window
    pub async fn fresh(&self, now: DateTime<Utc>) -> Option<EventsSnapshot> {
        let state = self.state.read().await;
        state
            .snapshot
            .as_ref()
            .filter(|snapshot| snapshot.is_fresh(self.ttl, now))
            .cloned()
    }

    /// Current snapshot regardless of age
    pub async fn latest(&self) -> Option<EventsSnapshot> {
        self.state.read().await.snapshot.clone()
    }

    /// Generation to pass to [`EventsCache::store`] once a fetch started now completes
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Replace the snapshot and return it.
    ///
    /// A fetch that started at `started` is only kept when nothing was stored
    /// or cleared since; otherwise the snapshot is returned without being cached.
    pub async fn store(
        &self,
        started: u64,
        events: Vec<Event>,
        skipped: Vec<U256>,
        now: DateTime<Utc>,
    ) -> EventsSnapshot {
        let mut state = self.state.write().await;
        let current = state.generation == started;
        if current {
            state.generation += 1;
        }

        let snapshot = EventsSnapshot {
            events: Arc::new(events),
            captured_at: now,
            generation: state.generation,
            skipped,
        };
        if !current {
            debug!(
                started,
                generation = state.generation,
                "Cache changed during fetch, not storing events snapshot"
            );
            return snapshot;
        }
        state.snapshot = Some(snapshot.clone());

        debug!(
            generation = snapshot.generation,
            events = snapshot.events.len(),
            "Stored events snapshot"
        );
        snapshot
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.generation += 1;
        if state.snapshot.take().is_some() {
            debug!(generation = state.generation, "Cleared events snapshot");
        }
    }
}
