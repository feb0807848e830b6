//! Client configuration

use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use userop_primitives::constants::{fees, receipt};

/// Safety margin applied to network fee estimates (bundlers reject fees too close to the base
/// fee)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeConfig {
    /// Multiplier applied to the network estimate
    pub multiplier: u64,
    /// Floor of `maxFeePerGas` (wei)
    pub min_max_fee_per_gas: u64,
    /// Floor of `maxPriorityFeePerGas` (wei)
    pub min_max_priority_fee_per_gas: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            multiplier: fees::MULTIPLIER,
            min_max_fee_per_gas: fees::MIN_MAX_FEE_PER_GAS,
            min_max_priority_fee_per_gas: fees::MIN_MAX_PRIORITY_FEE_PER_GAS,
        }
    }
}

/// Polling of user operation receipts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceiptPollConfig {
    /// Interval between two polls
    pub poll_interval: Duration,
    /// Deadline of the wait (None waits forever)
    pub timeout: Option<Duration>,
}

impl Default for ReceiptPollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(receipt::POLL_INTERVAL_MS),
            timeout: Some(Duration::from_secs(receipt::TIMEOUT_SECS)),
        }
    }
}

/// Configuration of the [BundlerClient](crate::BundlerClient)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundlerClientConfig {
    pub fees: FeeConfig,
    pub receipt: ReceiptPollConfig,
    /// Values merged into every request before preparation (request values win)
    pub user_operation_defaults: UserOperationDefaults,
}

/// Defaults for fields of prepared user operations
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserOperationDefaults {
    pub call_gas_limit: Option<U256>,
    pub verification_gas_limit: Option<U256>,
    pub pre_verification_gas: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
}

impl BundlerClientConfig {
    pub fn fees(mut self, fees: FeeConfig) -> Self {
        self.fees = fees;
        self
    }

    pub fn receipt(mut self, receipt: ReceiptPollConfig) -> Self {
        self.receipt = receipt;
        self
    }

    pub fn user_operation_defaults(mut self, defaults: UserOperationDefaults) -> Self {
        self.user_operation_defaults = defaults;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.receipt.poll_interval = poll_interval;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receipt.timeout = timeout;
        self
    }
}
