use ethers::types::{Address, U64};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use userop_primitives::{
    RawUserOperationReceipt, UserOperation, UserOperationByHash, UserOperationGasEstimation,
    UserOperationHash,
};

/// The ERC-4337 `eth` namespace RPC methods trait (bundler)
#[rpc(client, server, namespace = "eth")]
pub trait BundlerApi {
    /// Retrieve the current [EIP-155](https://eips.ethereum.org/EIPS/eip-155) chain ID.
    ///
    /// # Returns
    /// * `RpcResult<U64>` - The chain ID as a U64.
    #[method(name = "chainId")]
    async fn chain_id(&self) -> RpcResult<U64>;

    /// Get the entry points supported by the bundler.
    ///
    /// # Returns
    /// * `RpcResult<Vec<Address>>` - The entry point addresses.
    #[method(name = "supportedEntryPoints")]
    async fn supported_entry_points(&self) -> RpcResult<Vec<Address>>;

    /// Send a [UserOperation](UserOperation).
    ///
    /// # Arguments
    /// * `user_operation: UserOperation` - The signed [UserOperation](UserOperation).
    /// * `entry_point: Address` - The address of the entry point.
    ///
    /// # Returns
    /// * `RpcResult<UserOperationHash>` - The hash of the sent [UserOperation](UserOperation).
    #[method(name = "sendUserOperation")]
    async fn send_user_operation(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> RpcResult<UserOperationHash>;

    /// Estimate the gas limits of a [UserOperation](UserOperation) (gas fields may be zero and
    /// the signature may be a stub).
    ///
    /// # Arguments
    /// * `user_operation: UserOperation` - The [UserOperation](UserOperation) to estimate.
    /// * `entry_point: Address` - The address of the entry point.
    ///
    /// # Returns
    /// * `RpcResult<UserOperationGasEstimation>` - The estimated gas limits.
    #[method(name = "estimateUserOperationGas")]
    async fn estimate_user_operation_gas(
        &self,
        user_operation: UserOperation,
        entry_point: Address,
    ) -> RpcResult<UserOperationGasEstimation>;

    /// Retrieve the receipt of a [UserOperation](UserOperation) (integers are hex quantities).
    ///
    /// # Arguments
    /// * `user_operation_hash: UserOperationHash` - The hash of a [UserOperation](UserOperation).
    ///
    /// # Returns
    /// * `RpcResult<Option<RawUserOperationReceipt>>` - The receipt, or None if the
    ///   [UserOperation](UserOperation) was not included yet.
    #[method(name = "getUserOperationReceipt")]
    async fn get_user_operation_receipt(
        &self,
        user_operation_hash: UserOperationHash,
    ) -> RpcResult<Option<RawUserOperationReceipt>>;

    /// Retrieve a [UserOperation](UserOperation) by its hash.
    ///
    /// # Arguments
    /// * `user_operation_hash: UserOperationHash` - The hash of the user operation.
    ///
    /// # Returns
    /// * `RpcResult<Option<UserOperationByHash>>` - The [UserOperation](UserOperation) with its
    ///   inclusion data, or None if it does not exist.
    #[method(name = "getUserOperationByHash")]
    async fn get_user_operation_by_hash(
        &self,
        user_operation_hash: UserOperationHash,
    ) -> RpcResult<Option<UserOperationByHash>>;
}
