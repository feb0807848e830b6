use crate::utils::run_until_ctrl_c;
use clap::{value_parser, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub mod args;
pub mod commands;

/// The userop CLI interface
#[derive(Debug, Parser)]
#[command(author, version, about = "userop", long_about = None)]
pub struct Cli {
    /// The command to execute
    #[clap(subcommand)]
    command: Commands,

    /// Bundler connection
    #[clap(flatten)]
    bundler: args::BundlerArgs,

    /// The verbosity level
    #[clap(
        long,
        short,
        global = true,
        default_value_t = 2,
        value_parser = value_parser!(u8).range(..=4)
    )]
    verbosity: u8,
}

impl Cli {
    /// Get the log level based on the verbosity level
    pub fn get_log_level(&self) -> String {
        match self.verbosity {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
        .into()
    }
}

/// Commands to be executed
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the chain ID of the bundler
    #[command(name = "chain-id")]
    ChainId(commands::ChainIdCommand),

    /// Print the entry points supported by the bundler
    #[command(name = "supported-entry-points")]
    SupportedEntryPoints(commands::SupportedEntryPointsCommand),

    /// Print a user operation by its hash
    #[command(name = "user-operation")]
    UserOperation(commands::UserOperationCommand),

    /// Print the receipt of a user operation
    #[command(name = "receipt")]
    Receipt(commands::ReceiptCommand),

    /// Wait for the receipt of a user operation
    #[command(name = "wait")]
    Wait(commands::WaitCommand),

    /// Estimate the gas limits of a call from the smart account
    #[command(name = "estimate")]
    Estimate(Box<commands::EstimateCommand>),

    /// Send a call from the smart account
    #[command(name = "send")]
    Send(Box<commands::SendCommand>),

    /// Create a mnemonic for the owner of a smart account
    #[command(name = "create-wallet")]
    CreateWallet(commands::CreateWalletCommand),
}

pub fn run() -> eyre::Result<()> {
    let cli = Cli::parse();

    let rust_log = match std::env::var("RUST_LOG") {
        Ok(val) => format!("{val},userop={}", cli.get_log_level()),
        Err(_) => format!("userop={}", cli.get_log_level()),
    };
    std::env::set_var("RUST_LOG", rust_log);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    let task = async move {
        let bundler = cli.bundler;
        match cli.command {
            Commands::ChainId(command) => command.execute(bundler).await,
            Commands::SupportedEntryPoints(command) => command.execute(bundler).await,
            Commands::UserOperation(command) => command.execute(bundler).await,
            Commands::Receipt(command) => command.execute(bundler).await,
            Commands::Wait(command) => command.execute(bundler).await,
            Commands::Estimate(command) => command.execute(bundler).await,
            Commands::Send(command) => command.execute(bundler).await,
            Commands::CreateWallet(command) => command.execute(),
        }
    };

    rt.block_on(run_until_ctrl_c(task))
}
