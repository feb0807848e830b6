use crate::error::AccountError;
use async_trait::async_trait;
use ethers::types::{transaction::eip712::TypedData, Address, Bytes, U256};
use userop_primitives::{
    Authorization, Call, EntryPoint, SignedAuthorization, UserOperation, UserOperationRequest,
};

/// Deployment data of a smart account that does not exist on-chain yet
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FactoryArgs {
    pub factory: Option<Address>,
    pub factory_data: Option<Bytes>,
}

/// Gas limits estimated by the account itself. Unset limits are estimated by the bundler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GasLimits {
    pub call_gas_limit: Option<U256>,
    pub verification_gas_limit: Option<U256>,
    pub pre_verification_gas: Option<U256>,
    pub paymaster_verification_gas_limit: Option<U256>,
    pub paymaster_post_op_gas_limit: Option<U256>,
}

/// The smart account interface.
/// Implementations differ in how they derive their address, deploy themselves (factory or EIP-7702
/// delegation) and sign user operations.
#[async_trait]
pub trait SmartAccount: Send + Sync {
    /// Address of the account (counterfactual if not deployed yet)
    async fn address(&self) -> Result<Address, AccountError>;

    /// Entry point the account is bound to
    fn entry_point(&self) -> EntryPoint;

    /// Reads the nonce from the entry point.
    ///
    /// # Arguments
    /// * `key` - Nonce key (192 bits), `0` if not given
    ///
    /// # Returns
    /// * `U256` - The key in the high 192 bits followed by the 64-bit sequence
    async fn get_nonce(&self, key: Option<U256>) -> Result<U256, AccountError>;

    /// Factory and factory data deploying the account
    async fn get_factory_args(&self) -> Result<FactoryArgs, AccountError>;

    /// Placeholder signature used for gas estimation
    fn get_stub_signature(&self) -> Bytes;

    /// Encodes calls into the account's call data
    fn encode_calls(&self, calls: &[Call]) -> Result<Bytes, AccountError>;

    /// Decodes the account's call data back into calls
    fn decode_calls(&self, data: &Bytes) -> Result<Vec<Call>, AccountError>;

    /// Signs a user operation (whose sender is this account) for the given chain
    async fn sign_user_operation(
        &self,
        uo: &UserOperation,
        chain_id: u64,
    ) -> Result<Bytes, AccountError>;

    /// Signs an arbitrary message (EIP-191)
    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, AccountError>;

    /// Signs EIP-712 typed data
    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Bytes, AccountError>;

    /// Whether the account has code on-chain
    async fn is_deployed(&self) -> Result<bool, AccountError>;

    /// EIP-7702 authorization the account needs before it is deployed, if any
    async fn authorization(&self) -> Result<Option<Authorization>, AccountError> {
        Ok(None)
    }

    /// Signs an EIP-7702 authorization with the owner key
    async fn sign_authorization(
        &self,
        authorization: Authorization,
    ) -> Result<SignedAuthorization, AccountError>;

    /// Account specific adjustments applied to a request before it is prepared
    async fn prepare_user_operation(
        &self,
        request: UserOperationRequest,
    ) -> Result<UserOperationRequest, AccountError> {
        Ok(request)
    }

    /// Account specific gas estimation, consulted before the bundler estimate
    async fn estimate_gas(
        &self,
        _request: &UserOperationRequest,
    ) -> Result<Option<GasLimits>, AccountError> {
        Ok(None)
    }
}
