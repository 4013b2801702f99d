//! On-chain data gateway for a binary-outcome prediction market
//!
//! Reads and writes a betting oracle contract and a user profile registry
//! over a single JSON-RPC endpoint, built on top of Alloy 1.0.38.
//!
//! # Features
//!
//! - Cached, concurrently fetched event list with per-event failure isolation
//! - Batched per-user bet lookups with observable degraded items
//! - Decoding of the full contract log history
//! - Simulate, submit and await writes with decoded revert reasons
//! - Settled profit and loss from exact on-chain amounts
//!
//! # Example
//!
//! ```rust,no_run
//! use bets_gateway::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut config = GatewayConfig::new("http://localhost:8545");
//!     config.betting_contract = Some("0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string());
//!
//!     let gateway = Gateway::connect(&config)?;
//!
//!     for event in gateway.get_all_events().await?.iter() {
//!         println!("{} [{}] {}", event.id, event.status, event.question);
//!     }
//!
//!     let wallet = WalletHandle::from_private_key("0x...")?;
//!     let handle = gateway
//!         .place_bet(&wallet, U256::from(1), BetOutcome::Yes, "0.5")
//!         .await?;
//!     gateway.wait_for_transaction(handle.hash).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod abi;
pub mod backend;
pub mod cache;
pub mod clock;
pub mod config;
pub mod contract;
pub mod error;
pub mod events;
pub mod gateway;
pub mod normalize;
pub mod notify;
pub mod pnl;
pub mod types;
pub mod wallet;

// Re-export commonly used types
pub use backend::{ChainBackend, RpcBackend};
pub use cache::EventsSnapshot;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ContractAddresses, GatewayConfig};
pub use error::{GatewayError, Result};
pub use gateway::Gateway;
pub use notify::{Notification, NotificationKind, Notifier, NoopNotifier, RecordingNotifier, TracingNotifier};
pub use pnl::{PnlHistory, PnlPoint, SettledBet, UserStats};
pub use types::{
    AllLogs, BetLookup, BetOutcome, BetPlacedLog, CreatedEvent, Event, EventCanceledLog,
    EventStatus, NewEvent, PoolTotals, RawAmounts, TxHandle, TxReceipt, UserBet, UserProfile,
    WinningsClaimedLog, WriteAction,
};
pub use wallet::WalletHandle;

// Re-export Alloy types for convenience
pub use alloy_primitives::{Address, TxHash, U256};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::GatewayConfig;
    pub use crate::error::{GatewayError, Result};
    pub use crate::gateway::Gateway;
    pub use crate::types::{BetOutcome, Event, EventStatus, NewEvent, UserProfile};
    pub use crate::wallet::WalletHandle;
    pub use alloy_primitives::{Address, U256};
}
