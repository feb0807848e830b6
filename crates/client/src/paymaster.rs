//! Paymaster sponsoring prepared user operations

use ethers::types::Address;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use std::sync::Arc;

/// Where paymaster fields of a user operation come from
#[derive(Clone)]
pub enum PaymasterSource {
    /// Fixed paymaster address without paymaster data
    Address(Address),
    /// ERC-7677 paymaster web service
    Rpc {
        client: Arc<HttpClient>,
        /// Paymaster specific context forwarded with every call
        context: Option<serde_json::Value>,
    },
}

impl PaymasterSource {
    /// Paymaster web service at `url`
    pub fn rpc(url: &str, context: Option<serde_json::Value>) -> eyre::Result<Self> {
        let client = HttpClientBuilder::default().build(url)?;
        Ok(Self::Rpc { client: Arc::new(client), context })
    }

    /// Fixed paymaster address, if any
    pub fn address(&self) -> Option<Address> {
        match self {
            Self::Address(address) => Some(*address),
            Self::Rpc { .. } => None,
        }
    }
}
