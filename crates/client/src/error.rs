use jsonrpsee::core::ClientError as RpcError;
use thiserror::Error;
use userop_account::AccountError;
use userop_primitives::{PackError, ReceiptError, UserOperationHash};
use userop_rpc::BundlerError;

/// Bundler client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Operation needs a smart account but none is bound to the client
    #[error("Could not find an Account to execute with this Action. Bind an account to the client.")]
    AccountNotFound,

    /// Classified failure of a bundler call
    #[error(transparent)]
    Bundler(#[from] BundlerError),

    /// JSON-RPC failure of a call that is not classified
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Account(#[from] AccountError),

    /// No receipt within the deadline
    #[error("Timed out while waiting for User Operation with hash {hash}.")]
    Timeout { hash: UserOperationHash },

    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    #[error(transparent)]
    Pack(#[from] PackError),

    /// Function call arguments do not match the function
    #[error("call encoding error: {0}")]
    Abi(#[from] ethers::abi::Error),

    /// Paymaster web service failure
    #[error("paymaster error: {0}")]
    Paymaster(RpcError),
}
