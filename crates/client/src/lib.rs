//! Account abstraction (ERC-4337) bundler client
//!
//! Prepares user operations of a [SmartAccount](userop_account::SmartAccount) (call data,
//! deployment, fees, nonce, paymaster, gas and EIP-7702 authorization), signs and sends them to a
//! bundler and waits for their receipts.

mod client;
pub mod config;
mod error;
pub mod fees;
pub mod nonce;
mod paymaster;
mod prepare;

pub use client::BundlerClient;
pub use config::{BundlerClientConfig, FeeConfig, ReceiptPollConfig, UserOperationDefaults};
pub use error::ClientError;
pub use fees::{FeeEstimator, Fees, ProviderFeeEstimator};
pub use nonce::{MemoryNonceKeyManager, NonceKeyManager};
pub use paymaster::PaymasterSource;
pub use prepare::PrepareParameter;
