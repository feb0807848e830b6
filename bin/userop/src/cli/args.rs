use crate::utils::{
    parse_address, parse_bytes, parse_entry_point_version, parse_h256, parse_u256,
};
use clap::{Parser, ValueEnum};
use ethers::types::{Address, Bytes, H256, U256};
use expanded_pathbuf::ExpandedPathBuf;
use std::time::Duration;
use userop_client::{BundlerClientConfig, FeeConfig, ReceiptPollConfig};
use userop_primitives::{
    constants::{
        fees::{MIN_MAX_FEE_PER_GAS, MIN_MAX_PRIORITY_FEE_PER_GAS, MULTIPLIER},
        receipt::{POLL_INTERVAL_MS, TIMEOUT_SECS},
    },
    Call, EntryPointVersion,
};

/// Bundler connection args
#[derive(Debug, Clone, Parser)]
pub struct BundlerArgs {
    /// Bundler JSON-RPC endpoint.
    #[clap(long, global = true, default_value = "http://127.0.0.1:3000")]
    pub bundler_url: String,
}

/// Smart account implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AccountKind {
    /// EOA delegated to the Simple7702Account implementation (EIP-7702)
    Simple7702,
    /// Solady ERC-4337 account deployed through its factory
    Solady,
}

/// Smart account args
#[derive(Debug, Clone, Parser)]
pub struct AccountArgs {
    /// Ethereum execution client RPC endpoint.
    #[clap(long, default_value = "http://127.0.0.1:8545")]
    pub eth_client_address: String,

    /// Path to the file with the owner's mnemonic phrase.
    #[clap(long, conflicts_with = "phrase")]
    pub mnemonic_file: Option<ExpandedPathBuf>,

    /// Owner's mnemonic phrase.
    #[clap(long)]
    pub phrase: Option<String>,

    /// Smart account implementation.
    ///
    /// By default, this option is set to `simple7702`.
    #[clap(long, value_enum, default_value_t = AccountKind::Simple7702)]
    pub account: AccountKind,

    /// Entry point version (defaults to 0.8 for simple7702 and 0.7 for solady).
    #[clap(long, value_parser = parse_entry_point_version)]
    pub entry_point_version: Option<EntryPointVersion>,

    /// Entry point address (defaults to the canonical address of the version).
    #[clap(long, value_parser = parse_address)]
    pub entry_point: Option<Address>,

    /// Salt of the Solady account.
    #[clap(long, value_parser = parse_h256)]
    pub salt: Option<H256>,

    /// Fixed paymaster sponsoring the user operation.
    #[clap(long, value_parser = parse_address, conflicts_with = "paymaster_url")]
    pub paymaster: Option<Address>,

    /// ERC-7677 paymaster web service.
    #[clap(long)]
    pub paymaster_url: Option<String>,

    /// Nonce key (192 bits) of the user operation.
    #[clap(long, value_parser = parse_u256)]
    pub nonce_key: Option<U256>,
}

/// Fee args
#[derive(Debug, Clone, Parser)]
pub struct FeeArgs {
    /// Multiplier applied to the network fees.
    #[clap(long, default_value_t = MULTIPLIER)]
    pub fee_multiplier: u64,

    /// Floor of the max fee per gas (wei).
    #[clap(long, default_value_t = MIN_MAX_FEE_PER_GAS)]
    pub min_max_fee_per_gas: u64,

    /// Floor of the max priority fee per gas (wei).
    #[clap(long, default_value_t = MIN_MAX_PRIORITY_FEE_PER_GAS)]
    pub min_max_priority_fee_per_gas: u64,

    /// Explicit max fee per gas (wei), skips fee estimation together with the priority fee.
    #[clap(long, value_parser = parse_u256)]
    pub max_fee_per_gas: Option<U256>,

    /// Explicit max priority fee per gas (wei).
    #[clap(long, value_parser = parse_u256)]
    pub max_priority_fee_per_gas: Option<U256>,
}

impl FeeArgs {
    pub fn config(&self) -> FeeConfig {
        FeeConfig {
            multiplier: self.fee_multiplier,
            min_max_fee_per_gas: self.min_max_fee_per_gas,
            min_max_priority_fee_per_gas: self.min_max_priority_fee_per_gas,
        }
    }
}

/// Call args
#[derive(Debug, Clone, Parser)]
pub struct CallArgs {
    /// Target of the call.
    #[clap(long, value_parser = parse_address)]
    pub to: Address,

    /// Value (wei) sent with the call.
    #[clap(long, default_value = "0", value_parser = parse_u256)]
    pub value: U256,

    /// Call data (hex).
    #[clap(long, default_value = "0x", value_parser = parse_bytes)]
    pub data: Bytes,
}

impl CallArgs {
    pub fn call(&self) -> Call {
        Call::new(self.to).value(self.value).data(self.data.clone())
    }
}

/// Receipt polling args
#[derive(Debug, Clone, Parser)]
pub struct WaitArgs {
    /// Interval between receipt polls (milliseconds).
    #[clap(long, default_value_t = POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// Deadline of the wait (seconds).
    #[clap(long, default_value_t = TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl WaitArgs {
    pub fn config(&self) -> ReceiptPollConfig {
        ReceiptPollConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Some(Duration::from_secs(self.timeout_secs)),
        }
    }
}

/// Client configuration from the fee and receipt args
pub fn client_config(fees: &FeeArgs, wait: &WaitArgs) -> BundlerClientConfig {
    BundlerClientConfig::default().fees(fees.config()).receipt(wait.config())
}
