use anyhow::{bail, Context, Result};
use clap::Parser;
use effort_gateway::AlgodClient;
use effort_miner::{
    clock::SystemClock,
    config::{MinerConfig, Settings},
    preflight, Rate, Scheduler,
};
use effort_state::snapshot;
use effort_types::Network;
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "effort-miner", about = "Mine the effort token", version)]
struct Cli {
    /// Network to mine on: `testnet` or `mainnet`.
    network: Network,
    /// Transactions per minute.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    tpm: u64,
    /// Fee per transaction in micro-units.
    #[arg(long, default_value_t = 2000)]
    fee: u64,
    /// Path to the configuration file.
    #[arg(long, short, env = "EFFORT_CONFIG")]
    config: Option<PathBuf>,
    /// Start mining without asking for confirmation.
    #[arg(long, short)]
    yes: bool,
    /// Log debug output.
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = MinerConfig::load(cli.config.as_deref())
        .and_then(|config| config.resolve(cli.network))
        .context("invalid configuration")?;
    let rate = Rate {
        tpm: cli.tpm,
        fee: cli.fee,
    };
    tracing::info!(network = %settings.network, miner = %settings.miner.address(), deposit = %settings.deposit.address(), "effort miner");

    let gateway = AlgodClient::new(&settings.endpoint)?;
    preflight(&gateway, &settings, rate).await?;
    if !cli.yes && !confirm("Do you want to continue?")? {
        bail!("aborted");
    }

    Scheduler::new(gateway, SystemClock, Arc::new(settings), rate)
        .run()
        .await
        .context("mining stopped")
}

async fn preflight(gateway: &AlgodClient, settings: &Settings, rate: Rate) -> Result<()> {
    preflight::check_node(gateway)
        .await
        .context("node unreachable")?;
    let snapshot = snapshot::fetch(gateway, settings.app_id)
        .await
        .with_context(|| format!("failed to read application {}", settings.app_id))?;
    preflight::ensure_deposit_opted_in(gateway, settings, &snapshot).await?;
    preflight::check_miner(gateway, settings, rate).await?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn confirm(prompt: &str) -> io::Result<bool> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt} [y/N] ")?;
    stderr.flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
