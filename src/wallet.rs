//! Caller-supplied signing handle

use alloy_network::EthereumWallet;
use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;

use crate::error::{GatewayError, Result};

/// Wallet handle passed to every write. Connecting, disconnecting and
/// switching accounts is owned by the caller; the gateway only signs with it.
#[derive(Clone, Default)]
pub struct WalletHandle {
    signer: Option<(Address, EthereumWallet)>,
}

impl WalletHandle {
    /// Handle without a signer; every write through it fails fast
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        let address = signer.address();
        Self {
            signer: Some((address, EthereumWallet::from(signer))),
        }
    }

    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| GatewayError::Signer(format!("Invalid private key: {}", e)))?;

        Ok(Self::from_signer(signer))
    }

    /// Account address, if a signer is attached
    pub fn address(&self) -> Option<Address> {
        self.signer.as_ref().map(|(address, _)| *address)
    }

    pub fn is_connected(&self) -> bool {
        self.signer.is_some()
    }

    pub(crate) fn signer(&self) -> Result<(Address, &EthereumWallet)> {
        self.signer
            .as_ref()
            .map(|(address, wallet)| (*address, wallet))
            .ok_or_else(|| GatewayError::Signer("Wallet client is not connected.".to_string()))
    }
}

impl std::fmt::Debug for WalletHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletHandle")
            .field("address", &self.address())
            .finish()
    }
}
