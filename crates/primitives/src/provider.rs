//! Eth client connections used by smart accounts (deployment checks, nonces, fee history)

use ethers::{
    providers::{Http, Middleware, Provider, Ws},
    types::Chain,
};
use std::time::Duration;

/// Polling interval of the eth client on a chain: local dev nodes mine instantly
fn polling_interval(chain_id: u64) -> Duration {
    match Chain::try_from(chain_id) {
        Ok(Chain::Dev | Chain::AnvilHardhat) => Duration::from_millis(5),
        _ => Duration::from_millis(500),
    }
}

/// Connects to an eth client over HTTP
pub async fn create_http_provider(addr: &str) -> eyre::Result<Provider<Http>> {
    let provider = Provider::<Http>::try_from(addr)?;
    let chain_id = provider.get_chainid().await?;
    Ok(provider.interval(polling_interval(chain_id.as_u64())))
}

/// Connects to an eth client over WebSockets, reconnecting on drops
pub async fn create_ws_provider(addr: &str) -> eyre::Result<Provider<Ws>> {
    let provider = Provider::<Ws>::connect_with_reconnects(addr, usize::MAX).await?;
    let chain_id = provider.get_chainid().await?;
    Ok(provider.interval(polling_interval(chain_id.as_u64())))
}
