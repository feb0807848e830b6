use crate::gen::{EntryPointAPIErrors, FailedOp};
use ethers::{
    abi::AbiDecode,
    providers::{JsonRpcError, Middleware, MiddlewareError, ProviderError},
    types::{Bytes, U256},
};
use regex::Regex;
use std::str::FromStr;
use thiserror::Error;

/// Entry point errors
#[derive(Debug, Error, Clone)]
pub enum EntryPointError {
    /// Failed user operation error
    #[error("{0}")]
    FailedOp(FailedOp),

    /// execution reverted
    #[error("execution reverted: {0}")]
    ExecutionReverted(String),

    /// Nonce key wider than 192 bits
    #[error("nonce key {0} does not fit into 192 bits")]
    NonceKeyOverflow(U256),

    /// Provider error
    #[error("provider error: {inner}")]
    Provider {
        /// The inner error message
        inner: String,
    },

    /// ABI error
    #[error("abi error: {inner}")]
    ABI {
        /// The inner error message
        inner: String,
    },

    /// Data decoding error
    #[error("decode error: {inner}")]
    Decode {
        /// The inner error message
        inner: String,
    },

    /// Any other error
    #[error("other error: {inner}")]
    Other {
        /// The inner error message
        inner: String,
    },
}

impl EntryPointError {
    pub fn from_provider_error(err: &ProviderError) -> Result<EntryPointAPIErrors, Self> {
        match err {
            ProviderError::JsonRpcClientError(err) => err
                .as_error_response()
                .map(Self::from_json_rpc_error)
                .unwrap_or(Err(EntryPointError::Provider {
                    inner: format!("unknown json-rpc client error: {err:?}"),
                })),
            ProviderError::HTTPError(err) => {
                Err(EntryPointError::Provider { inner: format!("HTTP error: {err:?}") })
            }
            _ => {
                Err(EntryPointError::Provider { inner: format!("unknown provider error: {err:?}") })
            }
        }
    }

    pub fn from_json_rpc_error(err: &JsonRpcError) -> Result<EntryPointAPIErrors, Self> {
        match err.data {
            Some(serde_json::Value::String(ref data)) => {
                let bytes = revert_data_from_str(data)?;
                decode_revert_error(bytes)
            }
            Some(ref other) => Err(Self::Decode {
                inner: format!("json-rpc return data is not a string: {other:?}"),
            }),
            None => Err(Self::Provider {
                inner: format!("json-rpc error doesn't contain data field: {err:?}"),
            }),
        }
    }

    pub fn from_middleware_error<M: Middleware>(
        err: M::Error,
    ) -> Result<EntryPointAPIErrors, Self> {
        if let Some(err) = err.as_error_response() {
            return Self::from_json_rpc_error(err);
        }

        if let Some(err) = err.as_provider_error() {
            return Self::from_provider_error(err);
        }

        Err(Self::Provider { inner: format!("middleware error: {err:?}") })
    }
}

/// Extracts the first hex blob from an error data string (some nodes wrap it in text)
pub fn revert_data_from_str(data: &str) -> Result<Bytes, EntryPointError> {
    let re = Regex::new(r"0x[0-9a-fA-F]*").map_err(|e| EntryPointError::Other {
        inner: format!("invalid revert data pattern: {e:?}"),
    })?;

    let hex = re.find(data).ok_or_else(|| EntryPointError::Decode {
        inner: format!("hex string not found in {data:?}"),
    })?;

    Bytes::from_str(hex.as_str()).map_err(|e| EntryPointError::Decode {
        inner: format!("string {data:?} could not be converted to bytes: {e:?}"),
    })
}

// ethers-rs could not handle `require (true, "reason")` or `revert("test failed")` well in this
// case revert with `require` error would ends up with error event signature `0x08c379a0`
// we need to handle it manually
pub fn decode_revert_string(data: Bytes) -> Option<String> {
    if data.len() < 4 {
        return None;
    }
    let (error_sig, reason) = data.split_at(4);
    if error_sig == [0x08, 0xc3, 0x79, 0xa0] {
        <String as AbiDecode>::decode(reason).ok()
    } else {
        None
    }
}

pub fn decode_revert_error(data: Bytes) -> Result<EntryPointAPIErrors, EntryPointError> {
    let decoded = EntryPointAPIErrors::decode(data.as_ref());
    match decoded {
        Ok(res) => Ok(res),
        Err(e) => {
            if let Some(error_str) = decode_revert_string(data) {
                return Ok(EntryPointAPIErrors::RevertString(error_str));
            };

            Err(EntryPointError::Decode {
                inner: format!(
                    "data field can't be deserialized to EntryPointAPIErrors error: {e:?}",
                ),
            })
        }
    }
}

/// Human readable reason of revert data (`FailedOp` reason or `Error(string)`), if any
pub fn decode_revert_reason(data: Bytes) -> Option<String> {
    match decode_revert_error(data).ok()? {
        EntryPointAPIErrors::FailedOp(op) => Some(op.reason),
        EntryPointAPIErrors::FailedOpWithRevert(op) => Some(op.reason),
        EntryPointAPIErrors::RevertString(reason) => Some(reason),
        _ => None,
    }
}
