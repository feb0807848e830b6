//! ERC-4337 bundler (`eth`) and ERC-7677 paymaster (`pm`) JSON-RPC interfaces

mod bundler_api;
pub mod error;
mod paymaster_api;

pub use bundler_api::{BundlerApiClient, BundlerApiServer};
pub use error::{BundlerError, ErrorContext};
pub use paymaster_api::{
    PaymasterApiClient, PaymasterApiServer, PaymasterData, PaymasterStubData, Sponsor,
};
