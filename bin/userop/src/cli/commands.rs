use super::args::{
    client_config, AccountArgs, AccountKind, BundlerArgs, CallArgs, FeeArgs, WaitArgs,
};
use crate::utils::{parse_u256, parse_user_operation_hash, unwrap_path_or_home};
use clap::Parser;
use ethers::{providers::Middleware, types::U256};
use expanded_pathbuf::ExpandedPathBuf;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use userop_account::{Simple7702Account, SmartAccount, SoladyAccount};
use userop_client::{BundlerClient, FeeEstimator, PaymasterSource, ProviderFeeEstimator};
use userop_primitives::{
    provider::{create_http_provider, create_ws_provider},
    EntryPoint, EntryPointVersion, UserOperationHash, UserOperationRequest, Wallet,
};

fn print_json<T: Serialize>(value: &T) -> eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the chain ID reported by the bundler
#[derive(Debug, Parser)]
pub struct ChainIdCommand {}

impl ChainIdCommand {
    pub async fn execute(self, bundler: BundlerArgs) -> eyre::Result<()> {
        let client = BundlerClient::http(&bundler.bundler_url)?;
        println!("{}", client.chain_id().await?);
        Ok(())
    }
}

/// Print the entry points supported by the bundler
#[derive(Debug, Parser)]
pub struct SupportedEntryPointsCommand {}

impl SupportedEntryPointsCommand {
    pub async fn execute(self, bundler: BundlerArgs) -> eyre::Result<()> {
        let client = BundlerClient::http(&bundler.bundler_url)?;
        print_json(&client.supported_entry_points().await?)
    }
}

/// Print a user operation by its hash
#[derive(Debug, Parser)]
pub struct UserOperationCommand {
    /// Hash of the user operation.
    #[clap(value_parser = parse_user_operation_hash)]
    hash: UserOperationHash,
}

impl UserOperationCommand {
    pub async fn execute(self, bundler: BundlerArgs) -> eyre::Result<()> {
        let client = BundlerClient::http(&bundler.bundler_url)?;
        match client.get_user_operation(self.hash).await? {
            Some(uo) => print_json(&uo),
            None => Err(eyre::eyre!("User operation {} not found", self.hash)),
        }
    }
}

/// Print the receipt of a user operation
#[derive(Debug, Parser)]
pub struct ReceiptCommand {
    /// Hash of the user operation.
    #[clap(value_parser = parse_user_operation_hash)]
    hash: UserOperationHash,
}

impl ReceiptCommand {
    pub async fn execute(self, bundler: BundlerArgs) -> eyre::Result<()> {
        let client = BundlerClient::http(&bundler.bundler_url)?;
        match client.get_user_operation_receipt(self.hash).await? {
            Some(receipt) => print_json(&receipt),
            None => Err(eyre::eyre!("User operation {} is not included yet", self.hash)),
        }
    }
}

/// Wait until a user operation is included and print its receipt
#[derive(Debug, Parser)]
pub struct WaitCommand {
    /// Hash of the user operation.
    #[clap(value_parser = parse_user_operation_hash)]
    hash: UserOperationHash,

    #[clap(flatten)]
    wait: WaitArgs,
}

impl WaitCommand {
    pub async fn execute(self, bundler: BundlerArgs) -> eyre::Result<()> {
        let config = self.wait.config();
        let client = BundlerClient::http(&bundler.bundler_url)?;
        let receipt = client
            .wait_for_user_operation_receipt(
                self.hash,
                Some(config.poll_interval),
                config.timeout,
            )
            .await?;
        print_json(&receipt)
    }
}

/// Estimate the gas limits of a call from the smart account
#[derive(Debug, Parser)]
pub struct EstimateCommand {
    #[clap(flatten)]
    account: AccountArgs,

    #[clap(flatten)]
    call: CallArgs,
}

impl EstimateCommand {
    pub async fn execute(self, bundler: BundlerArgs) -> eyre::Result<()> {
        let (account, _) = create_account(&self.account).await?;
        let client = BundlerClient::http(&bundler.bundler_url)?.with_account(account);
        let client = with_paymaster(client, &self.account)?;

        let gas = client.estimate_user_operation_gas(request(&self.account, &self.call)).await?;
        print_json(&gas)
    }
}

/// Send a call from the smart account and wait for its receipt
#[derive(Debug, Parser)]
pub struct SendCommand {
    #[clap(flatten)]
    account: AccountArgs,

    #[clap(flatten)]
    call: CallArgs,

    #[clap(flatten)]
    fees: FeeArgs,

    #[clap(flatten)]
    wait: WaitArgs,

    /// Return right after the bundler accepted the user operation.
    #[clap(long)]
    no_wait: bool,
}

impl SendCommand {
    pub async fn execute(self, bundler: BundlerArgs) -> eyre::Result<()> {
        let (account, fee_estimator) = create_account(&self.account).await?;
        let client = BundlerClient::http(&bundler.bundler_url)?
            .with_account(account)
            .with_fee_estimator(fee_estimator)
            .with_config(client_config(&self.fees, &self.wait));
        let client = with_paymaster(client, &self.account)?;

        let mut request = request(&self.account, &self.call);
        request.max_fee_per_gas = self.fees.max_fee_per_gas;
        request.max_priority_fee_per_gas = self.fees.max_priority_fee_per_gas;

        let hash = client.send_user_operation(request).await?;
        println!("{hash}");
        if self.no_wait {
            return Ok(());
        }

        let receipt = client.wait_for_user_operation_receipt(hash, None, None).await?;
        print_json(&receipt)
    }
}

/// Create a mnemonic for the owner of a smart account
#[derive(Debug, Parser)]
pub struct CreateWalletCommand {
    /// Directory the mnemonic phrase is written to (defaults to `~/.userop`).
    #[clap(long)]
    output_path: Option<ExpandedPathBuf>,

    /// Chain ID of the wallet.
    #[clap(long, value_parser = parse_u256, default_value = "1")]
    chain_id: U256,
}

impl CreateWalletCommand {
    pub fn execute(self) -> eyre::Result<()> {
        let path = unwrap_path_or_home(self.output_path)?;
        let wallet = Wallet::build_random(path, self.chain_id.as_u64())?;
        info!("Owner {:?}", wallet.address());
        Ok(())
    }
}

fn request(account: &AccountArgs, call: &CallArgs) -> UserOperationRequest {
    let request = UserOperationRequest::default().call(call.call());
    match account.nonce_key {
        Some(key) => request.nonce_key(key),
        None => request,
    }
}

fn with_paymaster(client: BundlerClient, args: &AccountArgs) -> eyre::Result<BundlerClient> {
    if let Some(paymaster) = args.paymaster {
        return Ok(client.with_paymaster(PaymasterSource::Address(paymaster)));
    }
    match &args.paymaster_url {
        Some(url) => Ok(client.with_paymaster(PaymasterSource::rpc(url, None)?)),
        None => Ok(client),
    }
}

/// Connection to the eth client, picked from the scheme of its address
#[derive(Debug, PartialEq, Eq)]
enum Transport {
    Http,
    Ws,
}

impl Transport {
    fn of(addr: &str) -> Self {
        if addr.starts_with("http") {
            Self::Http
        } else {
            Self::Ws
        }
    }
}

/// Smart account and fee estimator sharing one eth client connection
type AccountWithFees = (Arc<dyn SmartAccount>, Arc<dyn FeeEstimator>);

async fn create_account(args: &AccountArgs) -> eyre::Result<AccountWithFees> {
    match Transport::of(&args.eth_client_address) {
        Transport::Http => {
            let eth_client = Arc::new(create_http_provider(&args.eth_client_address).await?);
            build_account(args, eth_client).await
        }
        Transport::Ws => {
            let eth_client = Arc::new(create_ws_provider(&args.eth_client_address).await?);
            build_account(args, eth_client).await
        }
    }
}

async fn build_account<M: Middleware + 'static>(
    args: &AccountArgs,
    eth_client: Arc<M>,
) -> eyre::Result<AccountWithFees> {
    let fee_estimator: Arc<dyn FeeEstimator> =
        Arc::new(ProviderFeeEstimator::new(eth_client.clone()));
    let chain_id = eth_client.get_chainid().await.map_err(|err| eyre::eyre!(err.to_string()))?;
    let owner = match (&args.mnemonic_file, &args.phrase) {
        (Some(path), _) => Wallet::from_file(path.clone(), chain_id.as_u64())?,
        (None, Some(phrase)) => Wallet::from_phrase(phrase, chain_id.as_u64())?,
        (None, None) => return Err(eyre::eyre!("Either --mnemonic-file or --phrase is required")),
    };

    let account: Arc<dyn SmartAccount> = match args.account {
        AccountKind::Simple7702 => {
            let entry_point = entry_point(args, EntryPointVersion::V0_8);
            Arc::new(Simple7702Account::with_entry_point(owner, eth_client, entry_point))
        }
        AccountKind::Solady => {
            let entry_point = entry_point(args, EntryPointVersion::V0_7);
            let account = SoladyAccount::with_entry_point(owner, eth_client, entry_point);
            match args.salt {
                Some(salt) => Arc::new(account.salt(salt)),
                None => Arc::new(account),
            }
        }
    };
    info!(
        "Using {:?} account {:?} with entry point {:?}",
        args.account,
        account.address().await?,
        account.entry_point()
    );
    Ok((account, fee_estimator))
}

fn entry_point(args: &AccountArgs, default_version: EntryPointVersion) -> EntryPoint {
    let version = args.entry_point_version.unwrap_or(default_version);
    match args.entry_point {
        Some(address) => EntryPoint::new(address, version),
        None => EntryPoint::canonical(version),
    }
}
