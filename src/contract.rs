//! Typed per-function access to the two contracts.
//!
//! Every read encodes its call with the `sol!` bindings and decodes the
//! return data against the expected shape, failing with
//! [`GatewayError::Decoding`] on mismatch.

use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::sol_types::SolCall;
use alloy_primitives::{Address, Bytes, U256};

use crate::abi::{BetPosition, EventData, IBettingOracle, IUserProfileRegistry, Profile};
use crate::backend::ChainBackend;
use crate::error::{GatewayError, Result};

/// Call `function` read-only at `to` and decode its return value
async fn read<C: SolCall>(backend: &dyn ChainBackend, to: Address, function: C) -> Result<C::Return> {
    let tx = TransactionRequest::default()
        .to(to)
        .input(TransactionInput::new(Bytes::from(function.abi_encode())));

    let output = backend.call(tx).await?;

    C::abi_decode_returns(&output).map_err(|e| {
        GatewayError::Decoding(format!("Failed to decode {} result: {}", C::SIGNATURE, e))
    })
}

/// Read access to the betting oracle
#[derive(Clone, Copy)]
pub struct BettingOracle<'a> {
    backend: &'a dyn ChainBackend,
    address: Address,
}

impl<'a> BettingOracle<'a> {
    pub fn new(backend: &'a dyn ChainBackend, address: Address) -> Self {
        Self { backend, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn next_event_id(&self) -> Result<U256> {
        read(self.backend, self.address, IBettingOracle::nextEventIdCall {}).await
    }

    pub async fn platform_fee_bps(&self) -> Result<U256> {
        read(self.backend, self.address, IBettingOracle::platformFeeBpsCall {}).await
    }

    pub async fn get_event(&self, id: U256) -> Result<EventData> {
        read(self.backend, self.address, IBettingOracle::getEventCall { id }).await
    }

    pub async fn get_user_bet(&self, id: U256, user: Address) -> Result<BetPosition> {
        read(self.backend, self.address, IBettingOracle::getUserBetCall { id, user }).await
    }
}

/// Read access to the profile registry
#[derive(Clone, Copy)]
pub struct ProfileRegistry<'a> {
    backend: &'a dyn ChainBackend,
    address: Address,
}

impl<'a> ProfileRegistry<'a> {
    pub fn new(backend: &'a dyn ChainBackend, address: Address) -> Self {
        Self { backend, address }
    }

    pub async fn get_profile(&self, user: Address) -> Result<Profile> {
        read(self.backend, self.address, IUserProfileRegistry::getProfileCall { user }).await
    }
}

/// Encoded state-changing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCall {
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
}

impl WriteCall {
    pub fn new<C: SolCall>(to: Address, call: C) -> Self {
        Self {
            to,
            input: Bytes::from(call.abi_encode()),
            value: U256::ZERO,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Transaction request sent from `from`
    pub fn request(&self, from: Address) -> TransactionRequest {
        TransactionRequest::default()
            .from(from)
            .to(self.to)
            .input(TransactionInput::new(self.input.clone()))
            .value(self.value)
    }
}
