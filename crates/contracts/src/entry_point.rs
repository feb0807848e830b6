use super::{
    error::{decode_revert_error, EntryPointError},
    gen::{entry_point_api::EntryPointAPIErrors, EntryPointAPI},
};
use ethers::{
    prelude::ContractError,
    providers::Middleware,
    types::{Address, U256},
};
use std::sync::Arc;
use userop_primitives::constants::nonce::KEY_BITS;

/// Nonce manager of an entry point
#[derive(Clone)]
pub struct EntryPoint<M: Middleware + 'static> {
    address: Address,
    entry_point_api: EntryPointAPI<M>,
}

impl<M: Middleware + 'static> EntryPoint<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        Self { address, entry_point_api: EntryPointAPI::new(address, eth_client) }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn deserialize_error_msg(
        err: ContractError<M>,
    ) -> Result<EntryPointAPIErrors, EntryPointError> {
        match err {
            ContractError::DecodingError(e) => {
                Err(EntryPointError::Decode { inner: e.to_string() })
            }
            ContractError::AbiError(e) => Err(EntryPointError::ABI { inner: e.to_string() }),
            ContractError::MiddlewareError { e } => EntryPointError::from_middleware_error::<M>(e),
            ContractError::ProviderError { e } => EntryPointError::from_provider_error(&e),
            ContractError::Revert(data) => decode_revert_error(data),
            _ => Err(EntryPointError::Other { inner: err.to_string() }),
        }
    }

    fn into_entry_point_error(err: ContractError<M>) -> EntryPointError {
        match Self::deserialize_error_msg(err) {
            Ok(EntryPointAPIErrors::FailedOp(op)) => EntryPointError::FailedOp(op),
            Ok(EntryPointAPIErrors::RevertString(reason)) => {
                EntryPointError::ExecutionReverted(reason)
            }
            Ok(op) => EntryPointError::Other { inner: format!("entry point error: {op:?}") },
            Err(err) => err,
        }
    }

    /// Reads the nonce of `sender` in the channel `key` (the key occupies the high 192 bits of
    /// the returned nonce)
    pub async fn get_nonce(&self, sender: &Address, key: U256) -> Result<U256, EntryPointError> {
        if key.bits() > KEY_BITS {
            return Err(EntryPointError::NonceKeyOverflow(key));
        }

        self.entry_point_api
            .get_nonce(*sender, key)
            .call()
            .await
            .map_err(Self::into_entry_point_error)
    }
}
