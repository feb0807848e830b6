//! Smart contract bindings: entry point nonce manager, smart account call ABI and account factory

pub mod entry_point;
mod error;
mod gen;

pub use entry_point::EntryPoint;
pub use error::{
    decode_revert_error, decode_revert_reason, decode_revert_string, revert_data_from_str,
    EntryPointError,
};
pub use gen::{
    entry_point_api, smart_account_api, solady_factory_api, EntryPointAPI, FailedOp,
    SmartAccountAPI, SmartAccountAPICalls, SoladyFactoryAPI, SELECTORS_NAMES,
};
