//! Gateway configuration

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use crate::error::{GatewayError, Result};

/// Gateway configuration, loaded from an optional file and `BETS_*` environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// JSON-RPC HTTP endpoint of the target chain
    pub rpc_url: String,
    /// Chain ID
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Betting oracle contract address
    #[serde(default)]
    pub betting_contract: Option<String>,
    /// Profile registry contract address
    #[serde(default)]
    pub profile_contract: Option<String>,
    /// Freshness window of the events cache
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Fee reported when the contract cannot be read
    #[serde(default = "default_platform_fee_bps")]
    pub default_platform_fee_bps: u64,
    /// Placeholder image per category, used when an event is created without one
    #[serde(default)]
    pub category_images: HashMap<String, String>,
}

fn default_chain_id() -> u64 {
    1
}

fn default_cache_ttl() -> u64 {
    30
}

fn default_platform_fee_bps() -> u64 {
    300
}

impl GatewayConfig {
    /// Configuration with defaults for everything but the endpoint
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            chain_id: default_chain_id(),
            betting_contract: None,
            profile_contract: None,
            cache_ttl_secs: default_cache_ttl(),
            default_platform_fee_bps: default_platform_fee_bps(),
            category_images: HashMap::new(),
        }
    }

    /// Load from `path` (if it exists) and then from `BETS_*` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let config_builder = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("BETS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: GatewayConfig = config_builder.try_deserialize()?;
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Placeholder image for `category`, matched case-insensitively
    pub fn category_image(&self, category: &str) -> Option<&str> {
        self.category_images
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(category))
            .map(|(_, url)| url.as_str())
    }

    /// Resolve both contract addresses, substituting the zero address when unset or malformed
    pub fn contract_addresses(&self) -> ContractAddresses {
        ContractAddresses {
            betting: resolve_address("betting_contract", self.betting_contract.as_deref()),
            profile: resolve_address("profile_contract", self.profile_contract.as_deref()),
        }
    }

    /// Parsed RPC endpoint
    pub fn rpc_endpoint(&self) -> Result<reqwest::Url> {
        self.rpc_url
            .parse()
            .map_err(|e| GatewayError::Configuration(format!("Invalid RPC URL: {}", e)))
    }
}

/// Deployed contract addresses; `Address::ZERO` marks an unconfigured contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContractAddresses {
    pub betting: Address,
    pub profile: Address,
}

impl ContractAddresses {
    pub fn betting_configured(&self) -> bool {
        !self.betting.is_zero()
    }

    pub fn profile_configured(&self) -> bool {
        !self.profile.is_zero()
    }
}

fn resolve_address(field: &str, raw: Option<&str>) -> Address {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => {
            warn!("{} is not configured; dependent features are disabled", field);
            Address::ZERO
        }
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!("{} \"{}\" is not a valid address; using the zero address", field, value);
            Address::ZERO
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::new("http://localhost:8545");
        assert_eq!(config.cache_ttl(), Duration::from_secs(30));
        assert_eq!(config.default_platform_fee_bps, 300);
        assert_eq!(config.chain_id, 1);
    }

    #[test]
    fn test_malformed_address_becomes_zero() {
        let mut config = GatewayConfig::new("http://localhost:8545");
        config.betting_contract = Some("not-an-address".to_string());
        config.profile_contract = Some("0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string());

        let addresses = config.contract_addresses();
        assert!(!addresses.betting_configured());
        assert!(addresses.profile_configured());
    }

    #[test]
    fn test_missing_addresses_are_unconfigured() {
        let addresses = GatewayConfig::new("http://localhost:8545").contract_addresses();
        assert_eq!(addresses, ContractAddresses::default());
    }

    #[test]
    fn test_invalid_rpc_url() {
        let config = GatewayConfig::new("not a url");
        assert!(matches!(config.rpc_endpoint(), Err(GatewayError::Configuration(_))));
    }

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "rpc_url: http://127.0.0.1:8545\nchain_id: 13579\ncache_ttl_secs: 10\ncategory_images:\n  sports: https://img.example/sports.png"
        )
        .unwrap();

        let config = GatewayConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.chain_id, 13579);
        assert_eq!(config.cache_ttl_secs, 10);
        assert_eq!(
            config.category_images.get("sports").map(String::as_str),
            Some("https://img.example/sports.png")
        );
        assert!(config.betting_contract.is_none());
    }
}
