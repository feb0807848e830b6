use dirs::home_dir;
use ethers::types::{Address, Bytes, H256, U256};
use expanded_pathbuf::ExpandedPathBuf;
use pin_utils::pin_mut;
use std::{future::Future, str::FromStr};
use tracing::info;
use userop_primitives::{EntryPointVersion, UserOperationHash};

/// Unwrap path or returns home directory
pub fn unwrap_path_or_home(path: Option<ExpandedPathBuf>) -> eyre::Result<ExpandedPathBuf> {
    if let Some(path) = path {
        Ok(path)
    } else {
        home_dir()
            .map(|h| h.join(".userop"))
            .ok_or_else(|| eyre::eyre!("Get Home directory error"))
            .map(ExpandedPathBuf)
    }
}

/// Parses address from string
pub fn parse_address(s: &str) -> Result<Address, String> {
    Address::from_str(s).map_err(|_| format!("String {s} is not a valid address"))
}

/// Parses U256 from string (decimal)
pub fn parse_u256(s: &str) -> Result<U256, String> {
    U256::from_dec_str(s).map_err(|_| format!("String {s} is not a valid U256"))
}

/// Parses hex encoded bytes
pub fn parse_bytes(s: &str) -> Result<Bytes, String> {
    Bytes::from_str(s).map_err(|_| format!("String {s} is not valid hex data"))
}

/// Parses a 32-byte value, left-padding shorter hex strings
pub fn parse_h256(s: &str) -> Result<H256, String> {
    let value = U256::from_str(s).map_err(|_| format!("String {s} is not a valid bytes32"))?;
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    Ok(H256::from(bytes))
}

pub fn parse_user_operation_hash(s: &str) -> Result<UserOperationHash, String> {
    UserOperationHash::from_str(s)
        .map_err(|_| format!("String {s} is not a valid user operation hash"))
}

pub fn parse_entry_point_version(s: &str) -> Result<EntryPointVersion, String> {
    EntryPointVersion::from_str(s)
        .map_err(|_| format!("String {s} is not a valid entry point version (0.6, 0.7 or 0.8)"))
}

/// Runs the future to completion or until:
/// - `ctrl-c` is received.
/// - `SIGTERM` is received (unix only).
pub async fn run_until_ctrl_c<F, E>(fut: F) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
    E: Send + Sync + 'static + From<std::io::Error>,
{
    let ctrl_c = tokio::signal::ctrl_c();

    let mut stream = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let sigterm = stream.recv();
    pin_mut!(sigterm, ctrl_c, fut);

    tokio::select! {
        _ = ctrl_c => {
            info!("Received ctrl-c signal.");
        },
        _ = sigterm => {
            info!("Received SIGTERM signal.");
        },
        res = fut => res?,
    }

    Ok(())
}
