//! Solady ERC-4337 account deployed through its factory

use crate::{
    account::{FactoryArgs, SmartAccount},
    calls,
    error::AccountError,
};
use async_trait::async_trait;
use ethers::{
    abi::AbiEncode,
    providers::Middleware,
    types::{transaction::eip712::TypedData, Address, Bytes, H256, U256},
};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace};
use userop_contracts::{solady_factory_api, EntryPoint as EntryPointContract, SoladyFactoryAPI};
use userop_primitives::{
    constants::account::{SOLADY_FACTORY, STUB_SIGNATURE},
    Authorization, Call, EntryPoint, EntryPointVersion, SignedAuthorization, UserOperation,
    Wallet,
};

/// Solady smart account owned by a single EOA
pub struct SoladyAccount<M: Middleware + 'static> {
    owner: Wallet,
    eth_client: Arc<M>,
    entry_point: EntryPoint,
    entry_point_contract: EntryPointContract<M>,
    factory: SoladyFactoryAPI<M>,
    salt: H256,
    address: RwLock<Option<Address>>,
}

impl<M: Middleware + 'static> SoladyAccount<M> {
    /// Creates an account bound to entry point 0.7, the canonical factory and salt `0`
    pub fn new(owner: Wallet, eth_client: Arc<M>) -> Self {
        Self::with_entry_point(owner, eth_client, EntryPoint::canonical(EntryPointVersion::V0_7))
    }

    pub fn with_entry_point(owner: Wallet, eth_client: Arc<M>, entry_point: EntryPoint) -> Self {
        let entry_point_contract = EntryPointContract::new(eth_client.clone(), entry_point.address);
        let factory =
            SoladyFactoryAPI::new(SOLADY_FACTORY.parse::<Address>().unwrap_or_default(), eth_client.clone());
        Self {
            owner,
            eth_client,
            entry_point,
            entry_point_contract,
            factory,
            salt: H256::zero(),
            address: RwLock::new(None),
        }
    }

    /// Uses another account factory
    pub fn factory(mut self, factory: Address) -> Self {
        self.factory = SoladyFactoryAPI::new(factory, self.eth_client.clone());
        self
    }

    /// Salt of the counterfactual address (left-padded to 32 bytes)
    pub fn salt(mut self, salt: H256) -> Self {
        self.salt = salt;
        self
    }

    /// Skips the factory `getAddress` lookup
    pub fn with_address(self, address: Address) -> Self {
        *self.address.write() = Some(address);
        self
    }

    pub fn owner(&self) -> &Wallet {
        &self.owner
    }
}

#[async_trait]
impl<M: Middleware + 'static> SmartAccount for SoladyAccount<M> {
    async fn address(&self) -> Result<Address, AccountError> {
        let cached = *self.address.read();
        if let Some(address) = cached {
            return Ok(address);
        }

        let address = self
            .factory
            .get_address(self.salt.into())
            .call()
            .await
            .map_err(AccountError::provider)?;
        debug!("Resolved Solady account address {address:?} (salt {:?})", self.salt);
        *self.address.write() = Some(address);
        Ok(address)
    }

    fn entry_point(&self) -> EntryPoint {
        self.entry_point
    }

    async fn get_nonce(&self, key: Option<U256>) -> Result<U256, AccountError> {
        let address = self.address().await?;
        Ok(self.entry_point_contract.get_nonce(&address, key.unwrap_or_default()).await?)
    }

    async fn get_factory_args(&self) -> Result<FactoryArgs, AccountError> {
        let factory_data = solady_factory_api::CreateAccountCall {
            owner: self.owner.address(),
            salt: self.salt.into(),
        }
        .encode();
        Ok(FactoryArgs {
            factory: Some(self.factory.address()),
            factory_data: Some(factory_data.into()),
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
        let hash = uo.hash(&self.entry_point.address, chain_id)?;
        trace!("Signing user operation {hash:?} as personal message");
        let signature =
            self.owner.sign_message(hash.as_bytes()).await.map_err(AccountError::signer)?;
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
        let address = self.address().await?;
        let code =
            self.eth_client.get_code(address, None).await.map_err(AccountError::provider)?;
        Ok(!code.is_empty())
    }

    async fn sign_authorization(
        &self,
        authorization: Authorization,
    ) -> Result<SignedAuthorization, AccountError> {
        self.owner.sign_authorization(authorization).map_err(AccountError::signer)
    }
}
