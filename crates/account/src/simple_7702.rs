//! Simple7702 account: an EOA delegating its code to the `Simple7702Account` implementation

use crate::{
    account::{FactoryArgs, SmartAccount},
    calls,
    error::AccountError,
};
use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{transaction::eip712::TypedData, Address, Bytes, U256},
};
use std::sync::Arc;
use tracing::trace;
use userop_contracts::EntryPoint as EntryPointContract;
use userop_primitives::{
    constants::account::{EIP7702_FACTORY, SIMPLE_7702_IMPLEMENTATION, STUB_SIGNATURE},
    Authorization, Call, EntryPoint, EntryPointVersion, SignedAuthorization, UserOperation,
    UserOperationRequest, Wallet,
};

/// EOA (the owner) delegated to a smart account implementation through EIP-7702
pub struct Simple7702Account<M: Middleware + 'static> {
    owner: Wallet,
    eth_client: Arc<M>,
    entry_point: EntryPoint,
    entry_point_contract: EntryPointContract<M>,
    implementation: Address,
}

impl<M: Middleware + 'static> Simple7702Account<M> {
    /// Creates an account bound to entry point 0.8 and the canonical implementation
    pub fn new(owner: Wallet, eth_client: Arc<M>) -> Self {
        Self::with_entry_point(owner, eth_client, EntryPoint::canonical(EntryPointVersion::V0_8))
    }

    pub fn with_entry_point(owner: Wallet, eth_client: Arc<M>, entry_point: EntryPoint) -> Self {
        let entry_point_contract = EntryPointContract::new(eth_client.clone(), entry_point.address);
        Self {
            owner,
            eth_client,
            entry_point,
            entry_point_contract,
            implementation: SIMPLE_7702_IMPLEMENTATION.parse().unwrap_or_default(),
        }
    }

    /// Delegates to another implementation contract
    pub fn implementation(mut self, implementation: Address) -> Self {
        self.implementation = implementation;
        self
    }

    pub fn owner(&self) -> &Wallet {
        &self.owner
    }
}

#[async_trait]
impl<M: Middleware + 'static> SmartAccount for Simple7702Account<M> {
    async fn address(&self) -> Result<Address, AccountError> {
        Ok(self.owner.address())
    }

    fn entry_point(&self) -> EntryPoint {
        self.entry_point
    }

    async fn get_nonce(&self, key: Option<U256>) -> Result<U256, AccountError> {
        let key = key.unwrap_or_default();
        Ok(self.entry_point_contract.get_nonce(&self.owner.address(), key).await?)
    }

    async fn get_factory_args(&self) -> Result<FactoryArgs, AccountError> {
        Ok(FactoryArgs {
            factory: EIP7702_FACTORY.parse().ok(),
            factory_data: Some(Bytes::default()),
        })
    }

    fn get_stub_signature(&self) -> Bytes {
        STUB_SIGNATURE.parse().unwrap_or_default()
    }

    fn encode_calls(&self, calls: &[Call]) -> Result<Bytes, AccountError> {
        Ok(calls::encode_calls(calls))
    }

    fn decode_calls(&self, data: &Bytes) -> Result<Vec<Call>, AccountError> {
        calls::decode_calls(data)
    }

    async fn sign_user_operation(
        &self,
        uo: &UserOperation,
        chain_id: u64,
    ) -> Result<Bytes, AccountError> {
        // typed data digest for 0.8, signed without any prefix
        let hash = uo.hash(&self.entry_point.address, chain_id)?;
        trace!("Signing user operation {hash:?} with EIP-7702 owner {:?}", self.owner.address());
        let signature = self.owner.sign_hash(hash.into()).map_err(AccountError::signer)?;
        Ok(signature.to_vec().into())
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Bytes, AccountError> {
        let signature = self.owner.sign_message(message).await.map_err(AccountError::signer)?;
        Ok(signature.to_vec().into())
    }

    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Bytes, AccountError> {
        let signature = self.owner.sign_typed_data(payload).await.map_err(AccountError::signer)?;
        Ok(signature.to_vec().into())
    }

    async fn is_deployed(&self) -> Result<bool, AccountError> {
        let code = self
            .eth_client
            .get_code(self.owner.address(), None)
            .await
            .map_err(AccountError::provider)?;
        Ok(!code.is_empty())
    }

    async fn authorization(&self) -> Result<Option<Authorization>, AccountError> {
        let chain_id = self.eth_client.get_chainid().await.map_err(AccountError::provider)?;
        let nonce = self
            .eth_client
            .get_transaction_count(self.owner.address(), None)
            .await
            .map_err(AccountError::provider)?;
        Ok(Some(Authorization {
            chain_id: chain_id.as_u64().into(),
            address: self.implementation,
            nonce: nonce.as_u64().into(),
        }))
    }

    async fn sign_authorization(
        &self,
        authorization: Authorization,
    ) -> Result<SignedAuthorization, AccountError> {
        self.owner.sign_authorization(authorization).map_err(AccountError::signer)
    }

    async fn prepare_user_operation(
        &self,
        request: UserOperationRequest,
    ) -> Result<UserOperationRequest, AccountError> {
        // the owner is the sender whatever the request says
        Ok(request.sender(self.owner.address()))
    }
}
