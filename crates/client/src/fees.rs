//! EIP-1559 fee estimation with the bundler safety margin

use crate::config::FeeConfig;
use async_trait::async_trait;
use ethers::{providers::Middleware, types::U256};
use std::sync::Arc;

/// EIP-1559 fees of a user operation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fees {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

impl Fees {
    /// Multiplies the network estimate and raises it to the configured floors
    pub fn with_margin(self, config: &FeeConfig) -> Self {
        Self {
            max_fee_per_gas: (self.max_fee_per_gas.saturating_mul(config.multiplier.into()))
                .max(config.min_max_fee_per_gas.into()),
            max_priority_fee_per_gas: (self
                .max_priority_fee_per_gas
                .saturating_mul(config.multiplier.into()))
            .max(config.min_max_priority_fee_per_gas.into()),
        }
    }
}

/// Source of network fee estimates
#[async_trait]
pub trait FeeEstimator: Send + Sync {
    /// Current network estimate (without any margin)
    async fn estimate_fees(&self) -> eyre::Result<Fees>;
}

/// Fee estimator backed by an eth client
pub struct ProviderFeeEstimator<M: Middleware + 'static> {
    eth_client: Arc<M>,
}

impl<M: Middleware + 'static> ProviderFeeEstimator<M> {
    pub fn new(eth_client: Arc<M>) -> Self {
        Self { eth_client }
    }
}

#[async_trait]
impl<M: Middleware + 'static> FeeEstimator for ProviderFeeEstimator<M> {
    async fn estimate_fees(&self) -> eyre::Result<Fees> {
        let (max_fee_per_gas, max_priority_fee_per_gas) = self
            .eth_client
            .estimate_eip1559_fees(None)
            .await
            .map_err(|e| eyre::eyre!("fee estimation failed: {e:?}"))?;
        Ok(Fees { max_fee_per_gas, max_priority_fee_per_gas })
    }
}
