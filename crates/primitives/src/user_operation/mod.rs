//! Basic transaction type for account abstraction (ERC-4337)

mod hash;
mod request;
mod v0_6;
mod v0_7;

use crate::{
    authorization::SignedAuthorization, entry_point::EntryPointVersion, utils::as_checksum_addr,
    utils::PackError,
};
use ethers::types::{Address, Bytes, H256, U256, U64};
pub use hash::UserOperationHash;
pub use request::UserOperationRequest;
use serde::{Deserialize, Serialize};
pub use v0_6::UserOperationV0_6;
pub use v0_7::{PackedUserOperation, UserOperationV0_7};

/// User operation tagged with the version of the entry point it targets
///
/// Entry point 0.8 shares the field layout of 0.7 but hashes differently (EIP-712), so both are
/// kept as separate variants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserOperation {
    V0_6(UserOperationV0_6),
    V0_7(UserOperationV0_7),
    V0_8(UserOperationV0_7),
}

impl UserOperation {
    /// Empty user operation of the given version
    pub fn empty(version: EntryPointVersion) -> Self {
        match version {
            EntryPointVersion::V0_6 => Self::V0_6(UserOperationV0_6::default()),
            EntryPointVersion::V0_7 => Self::V0_7(UserOperationV0_7::default()),
            EntryPointVersion::V0_8 => Self::V0_8(UserOperationV0_7::default()),
        }
    }

    pub fn version(&self) -> EntryPointVersion {
        match self {
            Self::V0_6(_) => EntryPointVersion::V0_6,
            Self::V0_7(_) => EntryPointVersion::V0_7,
            Self::V0_8(_) => EntryPointVersion::V0_8,
        }
    }

    /// Re-tags a user operation with another version sharing its layout.
    /// A 0.6 operation never changes layout, so it is returned as is.
    pub fn into_version(self, version: EntryPointVersion) -> Self {
        match (self, version) {
            (Self::V0_7(uo) | Self::V0_8(uo), EntryPointVersion::V0_7) => Self::V0_7(uo),
            (Self::V0_7(uo) | Self::V0_8(uo), EntryPointVersion::V0_8) => Self::V0_8(uo),
            (uo, _) => uo,
        }
    }

    /// Calculates the hash of the user operation for the given entry point and chain
    pub fn hash(
        &self,
        entry_point: &Address,
        chain_id: u64,
    ) -> Result<UserOperationHash, PackError> {
        match self {
            Self::V0_6(uo) => Ok(uo.hash(entry_point, chain_id)),
            Self::V0_7(uo) => uo.hash_v0_7(entry_point, chain_id),
            Self::V0_8(uo) => uo.hash_v0_8(entry_point, chain_id),
        }
    }

    pub fn sender(&self) -> Address {
        match self {
            Self::V0_6(uo) => uo.sender,
            Self::V0_7(uo) | Self::V0_8(uo) => uo.sender,
        }
    }

    pub fn nonce(&self) -> U256 {
        match self {
            Self::V0_6(uo) => uo.nonce,
            Self::V0_7(uo) | Self::V0_8(uo) => uo.nonce,
        }
    }

    pub fn call_data(&self) -> &Bytes {
        match self {
            Self::V0_6(uo) => &uo.call_data,
            Self::V0_7(uo) | Self::V0_8(uo) => &uo.call_data,
        }
    }

    pub fn signature(&self) -> &Bytes {
        match self {
            Self::V0_6(uo) => &uo.signature,
            Self::V0_7(uo) | Self::V0_8(uo) => &uo.signature,
        }
    }

    /// Account factory (decoded from the init code for 0.6)
    pub fn factory(&self) -> Option<Address> {
        match self {
            Self::V0_6(uo) => uo.factory(),
            Self::V0_7(uo) | Self::V0_8(uo) => uo.factory,
        }
    }

    /// Paymaster (decoded from the paymaster and data for 0.6)
    pub fn paymaster(&self) -> Option<Address> {
        match self {
            Self::V0_6(uo) => uo.paymaster(),
            Self::V0_7(uo) | Self::V0_8(uo) => uo.paymaster,
        }
    }

    /// Init code (factory || factory data) in every version
    pub fn init_code(&self) -> Bytes {
        match self {
            Self::V0_6(uo) => uo.init_code.clone(),
            Self::V0_7(uo) | Self::V0_8(uo) => uo.init_code(),
        }
    }

    /// EIP-7702 authorization (never present on 0.6)
    pub fn authorization(&self) -> Option<&SignedAuthorization> {
        match self {
            Self::V0_6(_) => None,
            Self::V0_7(uo) | Self::V0_8(uo) => uo.authorization.as_ref(),
        }
    }

    /// Replaces the signature of the user operation
    pub fn with_signature(self, signature: Bytes) -> Self {
        match self {
            Self::V0_6(uo) => Self::V0_6(uo.signature(signature)),
            Self::V0_7(uo) => Self::V0_7(uo.signature(signature)),
            Self::V0_8(uo) => Self::V0_8(uo.signature(signature)),
        }
    }
}

impl From<UserOperationV0_6> for UserOperation {
    fn from(value: UserOperationV0_6) -> Self {
        Self::V0_6(value)
    }
}

/// Gas estimations for user operation (returned from the RPC endpoint eth_estimateUserOperationGas)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationGasEstimation {
    pub pre_verification_gas: U256,
    pub verification_gas_limit: U256,
    pub call_gas_limit: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U256>,
}

/// Struct that is returned from the RPC endpoint eth_getUserOperationByHash
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationByHash {
    pub user_operation: UserOperation,
    #[serde(serialize_with = "as_checksum_addr")]
    pub entry_point: Address,
    pub transaction_hash: H256,
    pub block_hash: H256,
    pub block_number: U64,
}

impl UserOperationByHash {
    /// Tags the user operation with the version of the entry point it was included by.
    /// Unknown entry points keep the layout recovered from the wire.
    pub fn with_entry_point_version(mut self) -> Self {
        if let Some(version) = EntryPointVersion::from_canonical_address(&self.entry_point) {
            self.user_operation = self.user_operation.into_version(version);
        }
        self
    }
}
