//! JSON-RPC access: the `ChainBackend` seam and its HTTP implementation

use alloy::network::ReceiptResponse;
use alloy::providers::{DynProvider, PendingTransactionBuilder};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use alloy::sol_types::{decode_revert_reason, Revert, SolError};
use alloy::transports::{TransportError, TransportErrorKind};
use alloy_network::EthereumWallet;
use alloy_primitives::{Bytes, TxHash};
use alloy_provider::{Provider, ProviderBuilder};
use async_trait::async_trait;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::types::TxReceipt;

/// Minimal set of chain calls the gateway is built on
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// `eth_call` against the latest block
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes>;

    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64>;

    /// Sign with `wallet` and broadcast; returns without waiting for inclusion
    async fn send_transaction(&self, wallet: &EthereumWallet, tx: TransactionRequest) -> Result<TxHash>;

    /// Wait until `hash` is mined
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt>;

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>>;
}

/// `ChainBackend` over a single HTTP JSON-RPC endpoint, without retries
#[derive(Clone)]
pub struct RpcBackend {
    rpc_url: reqwest::Url,
    provider: DynProvider,
}

impl RpcBackend {
    pub fn new(rpc_url: reqwest::Url) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url.clone()).erased();

        Self { rpc_url, provider }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        Ok(Self::new(config.rpc_endpoint()?))
    }

    pub fn rpc_url(&self) -> &reqwest::Url {
        &self.rpc_url
    }
}

#[async_trait]
impl ChainBackend for RpcBackend {
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes> {
        self.provider.call(tx).await.map_err(classify_rpc_error)
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64> {
        self.provider.estimate_gas(tx).await.map_err(classify_rpc_error)
    }

    async fn send_transaction(&self, wallet: &EthereumWallet, tx: TransactionRequest) -> Result<TxHash> {
        let signing_provider = ProviderBuilder::new()
            .wallet(wallet.clone())
            .connect_http(self.rpc_url.clone());

        let pending_tx = signing_provider
            .send_transaction(tx)
            .await
            .map_err(|e| match classify_rpc_error(e) {
                GatewayError::Rpc(msg) => GatewayError::Transaction(format!("Transaction failed: {}", msg)),
                other => other,
            })?;

        Ok(*pending_tx.tx_hash())
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), hash)
            .get_receipt()
            .await
            .map_err(|e| GatewayError::Transaction(format!("Failed to get receipt: {}", e)))?;

        Ok(TxReceipt {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
            gas_used: receipt.gas_used,
            logs: receipt.inner.logs().to_vec(),
        })
    }

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>> {
        self.provider.get_logs(filter).await.map_err(classify_rpc_error)
    }
}

const REVERT_PREFIX: &str = "execution reverted";

/// Split an RPC failure into connectivity, revert, decoding and other RPC errors.
/// The returned revert carries no operation context yet.
pub fn classify_rpc_error(err: TransportError) -> GatewayError {
    match err {
        TransportError::Transport(kind) => GatewayError::Connectivity(kind.to_string()),
        TransportError::ErrorResp(payload) => {
            let reason = payload
                .as_revert_data()
                .and_then(|data| revert_reason_from_data(&data))
                .or_else(|| revert_reason_from_message(&payload.message));

            match reason {
                Some(reason) => GatewayError::Revert {
                    context: "simulation".to_string(),
                    reason,
                },
                None => GatewayError::Rpc(format!("{} (code {})", payload.message, payload.code)),
            }
        }
        TransportError::DeserError { err, text } => {
            debug!("Undecodable RPC response: {}", text);
            GatewayError::Decoding(format!("Invalid RPC response: {}", err))
        }
        TransportError::NullResp => GatewayError::Rpc("Null response from RPC endpoint".to_string()),
        other => GatewayError::Rpc(other.to_string()),
    }
}

/// `Error(string)` yields its bare reason; panics and custom errors use alloy's rendering
fn revert_reason_from_data(data: &[u8]) -> Option<String> {
    Revert::abi_decode(data)
        .map(|revert| revert.reason)
        .ok()
        .or_else(|| decode_revert_reason(data))
}

fn revert_reason_from_message(message: &str) -> Option<String> {
    let rest = message.trim().strip_prefix(REVERT_PREFIX)?;
    let reason = rest.trim_start_matches(':').trim();
    if reason.is_empty() {
        Some("execution reverted without a reason".to_string())
    } else {
        Some(reason.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::Panic;

    fn error_response(json: &str) -> TransportError {
        TransportError::ErrorResp(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_revert_reason_from_revert_data() {
        let data = Revert { reason: "Betting closed".to_string() }.abi_encode();
        let json = format!(
            r#"{{"code":3,"message":"execution reverted: Betting closed","data":"0x{}"}}"#,
            alloy_primitives::hex::encode(data)
        );

        let err = classify_rpc_error(error_response(&json));
        assert_eq!(err.revert_reason(), Some("Betting closed"));
        assert_eq!(err.to_string(), "Contract error during simulation: Betting closed");
    }

    #[test]
    fn test_revert_reason_from_panic_data() {
        let data = Panic { code: alloy_primitives::U256::from(0x11) }.abi_encode();
        let reason = revert_reason_from_data(&data).unwrap();
        assert!(reason.contains("panic"), "unexpected reason: {}", reason);
        assert!(!reason.starts_with("revert: "));
    }

    #[test]
    fn test_revert_reason_from_message_only() {
        let err = classify_rpc_error(error_response(
            r#"{"code":-32000,"message":"execution reverted: Stake below minimum"}"#,
        ));
        assert_eq!(err.revert_reason(), Some("Stake below minimum"));
    }

    #[test]
    fn test_non_revert_error_response() {
        let err = classify_rpc_error(error_response(
            r#"{"code":-32601,"message":"method not found"}"#,
        ));
        assert!(matches!(err, GatewayError::Rpc(_)));
    }

    #[test]
    fn test_transport_error_is_connectivity() {
        let err = classify_rpc_error(TransportErrorKind::custom_str("connection refused"));
        assert!(err.is_connectivity());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connectivity() {
        let backend = RpcBackend::new("http://127.0.0.1:1".parse().unwrap());
        let err = backend.call(TransactionRequest::default()).await.unwrap_err();
        assert!(err.is_connectivity(), "unexpected error: {:?}", err);
    }
}
