use ethers::types::{Address, Bytes, U256, U64};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use serde::{Deserialize, Serialize};
use userop_primitives::{UserOperation, UserOperationRequest};

/// Sponsor information returned with paymaster stub data
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sponsor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Result of `pm_getPaymasterStubData` (paymaster fields used for gas estimation)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymasterStubData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U256>,
    /// Entry point 0.6 layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_and_data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor: Option<Sponsor>,
    /// The stub data is already final, `pm_getPaymasterData` is skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_final: Option<bool>,
}

/// Result of `pm_getPaymasterData` (final paymaster fields)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymasterData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<Bytes>,
    /// Entry point 0.6 layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_and_data: Option<Bytes>,
}

impl PaymasterStubData {
    /// Merges the paymaster fields into the request (returned values win)
    pub fn apply(&self, request: &mut UserOperationRequest) {
        request.paymaster = self.paymaster.or(request.paymaster);
        request.paymaster_data = self.paymaster_data.clone().or(request.paymaster_data.take());
        request.paymaster_verification_gas_limit =
            self.paymaster_verification_gas_limit.or(request.paymaster_verification_gas_limit);
        request.paymaster_post_op_gas_limit =
            self.paymaster_post_op_gas_limit.or(request.paymaster_post_op_gas_limit);
        request.paymaster_and_data =
            self.paymaster_and_data.clone().or(request.paymaster_and_data.take());
    }
}

impl PaymasterData {
    /// Merges the paymaster fields into the request (returned values win)
    pub fn apply(&self, request: &mut UserOperationRequest) {
        request.paymaster = self.paymaster.or(request.paymaster);
        request.paymaster_data = self.paymaster_data.clone().or(request.paymaster_data.take());
        request.paymaster_and_data =
            self.paymaster_and_data.clone().or(request.paymaster_and_data.take());
    }
}

/// The ERC-7677 `pm` namespace RPC methods trait (paymaster web service)
#[rpc(client, server, namespace = "pm")]
pub trait PaymasterApi {
    /// Retrieve stub paymaster values used while estimating gas.
    ///
    /// # Arguments
    /// * `user_operation: UserOperation` - The unsigned [UserOperation](UserOperation).
    /// * `entry_point: Address` - The address of the entry point.
    /// * `chain_id: U64` - The chain ID.
    /// * `paymaster_context: Option<serde_json::Value>` - Paymaster specific context.
    #[method(name = "getPaymasterStubData")]
    async fn get_paymaster_stub_data(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
        chain_id: U64,
        paymaster_context: Option<serde_json::Value>,
    ) -> RpcResult<PaymasterStubData>;

    /// Retrieve the final paymaster values once gas limits are known.
    ///
    /// # Arguments
    /// * `user_operation: UserOperation` - The unsigned [UserOperation](UserOperation).
    /// * `entry_point: Address` - The address of the entry point.
    /// * `chain_id: U64` - The chain ID.
    /// * `paymaster_context: Option<serde_json::Value>` - Paymaster specific context.
    #[method(name = "getPaymasterData")]
    async fn get_paymaster_data(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
        chain_id: U64,
        paymaster_context: Option<serde_json::Value>,
    ) -> RpcResult<PaymasterData>;
}
