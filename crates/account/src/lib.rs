//! Smart accounts: address derivation, deployment data, call encoding and signing of user
//! operations

mod account;
mod calls;
mod error;
mod simple_7702;
mod solady;

pub use account::{FactoryArgs, GasLimits, SmartAccount};
pub use calls::{decode_calls, encode_calls};
pub use error::AccountError;
pub use simple_7702::Simple7702Account;
pub use solady::SoladyAccount;
