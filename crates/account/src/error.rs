use ethers::types::Selector;
use thiserror::Error;
use userop_contracts::{EntryPointError, SELECTORS_NAMES};
use userop_primitives::PackError;

/// Smart account errors
#[derive(Debug, Error)]
pub enum AccountError {
    /// Call data does not start with `execute` or `executeBatch`
    #[error("unable to decode calls for selector 0x{} ({})", hex(.selector), selector_name(.selector))]
    UnsupportedSelector { selector: Selector },

    /// Call data could not be decoded
    #[error("decode error: {inner}")]
    Decode { inner: String },

    /// Entry point call failed
    #[error(transparent)]
    EntryPoint(#[from] EntryPointError),

    /// User operation could not be packed for hashing
    #[error(transparent)]
    Pack(#[from] PackError),

    /// Provider (eth client) error
    #[error("provider error: {inner}")]
    Provider { inner: String },

    /// Signer error
    #[error("signer error: {inner}")]
    Signer { inner: String },
}

impl AccountError {
    pub(crate) fn provider(err: impl ToString) -> Self {
        Self::Provider { inner: err.to_string() }
    }

    pub(crate) fn signer(err: impl ToString) -> Self {
        Self::Signer { inner: err.to_string() }
    }
}

fn hex(selector: &Selector) -> String {
    selector.iter().map(|b| format!("{b:02x}")).collect()
}

fn selector_name(selector: &Selector) -> String {
    SELECTORS_NAMES.get(selector).cloned().unwrap_or_else(|| "unknown function".into())
}
