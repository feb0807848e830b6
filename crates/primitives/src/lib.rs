//! Account abstraction (ERC-4337) primitive types
//!
//! This crate contains the version-tagged user operation model (entry point 0.6, 0.7 and 0.8),
//! its packing and hashing, EIP-7702 authorizations, user operation receipts and helper
//! functions.

mod authorization;
mod call;
pub mod constants;
mod entry_point;
pub mod provider;
mod receipt;
mod user_operation;
mod utils;
mod wallet;

pub use authorization::{Authorization, SignedAuthorization};
pub use call::{Call, FunctionCall};
pub use entry_point::{EntryPoint, EntryPointVersion};
pub use receipt::{
    Log, RawLog, RawTransactionReceipt, RawUserOperationReceipt, ReceiptError, ReceiptStatus,
    TransactionReceipt, TransactionType, UserOperationReceipt,
};
pub use user_operation::{
    PackedUserOperation, UserOperation, UserOperationByHash, UserOperationGasEstimation,
    UserOperationHash, UserOperationRequest, UserOperationV0_6, UserOperationV0_7,
};
pub use utils::{
    get_address, pack_factory_data, pack_paymaster_data, pack_uint128, unpack_factory_data,
    unpack_paymaster_data, unpack_uint128, PackError, PaymasterFields,
};
pub use wallet::Wallet;
