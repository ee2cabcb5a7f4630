//! # Split-Sealer Node
//!
//! ```bash
//! # Attested executor
//! ss-node executor --config node.toml
//!
//! # One block from a JSON file of signed transactions
//! ss-node seal --config node.toml --txs txs.json
//! ```

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::{Parser, Subcommand};
use shared_types::Address;
use ss_node::config::{parse_address, NodeConfig};
use ss_node::roles::{self, SealOptions};
use ss_telemetry::{init_tracing, TelemetryConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ss-node")]
#[command(about = "Block sealer with optional attested remote execution", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the attested executor
    Executor,

    /// Seal one block on top of genesis and print its summary as JSON
    Seal {
        /// JSON array of signed transactions
        #[arg(short, long)]
        txs: PathBuf,

        /// Block timestamp (defaults to now)
        #[arg(long)]
        timestamp: Option<u64>,

        /// Fee recipient
        #[arg(long, value_parser = parse_address, default_value = "0x0000000000000000000000000000000000000000")]
        coinbase: Address,

        /// Treat the transactions as locals
        #[arg(long)]
        local: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(&TelemetryConfig::from_env()).context("initializing tracing")?;
    let config = NodeConfig::load(args.config.as_deref()).context("loading configuration")?;
    info!("Split-Sealer node v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Executor => roles::serve_executor(&config).await,
        Command::Seal {
            txs,
            timestamp,
            coinbase,
            local,
        } => {
            let options = SealOptions {
                timestamp: match timestamp {
                    Some(ts) => ts,
                    None => SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs(),
                },
                coinbase,
                local,
            };
            let summary = roles::seal_block(&config, roles::load_transactions(&txs)?, &options).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}
