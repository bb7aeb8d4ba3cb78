use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use atomic_transfer::config::loader::load_or_default;
use atomic_transfer::ledger::{await_confirmation, Address, NodeClient, TxId};
use atomic_transfer::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "ledger-cli")]
#[command(about = "Query a ledger node", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults and ALGOD_* overrides apply.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show suggested transaction parameters
    Params,
    /// Show the node's last round
    Status,
    /// Show the pending status of a transaction
    Pending { txid: String },
    /// Show balance and asset holdings of an account
    Account { address: String },
    /// Wait up to ROUNDS rounds for a transaction to confirm
    Wait {
        txid: String,
        #[arg(default_value_t = 4)]
        rounds: u64,
    },
}

#[derive(Serialize)]
struct ParamsView {
    fee: u64,
    min_fee: u64,
    flat_fee: bool,
    last_round: u64,
    first_valid: u64,
    last_valid: u64,
    genesis_id: String,
    consensus_version: String,
}

#[derive(Serialize)]
struct WaitView {
    txid: String,
    confirmed: bool,
    round: Option<u64>,
    asset_index: Option<u64>,
    detail: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;
    init_logging(&config.observability);
    let client = NodeClient::new(config.node)?;

    match cli.command {
        Commands::Params => {
            let params = client.suggested_params().await?;
            print_json(&ParamsView {
                fee: params.fee_per_byte,
                min_fee: params.min_fee,
                flat_fee: params.flat_fee,
                last_round: params.last_round,
                first_valid: params.first_valid(),
                last_valid: params.last_valid(),
                genesis_id: params.genesis_id.clone(),
                consensus_version: params.consensus_version.clone(),
            })?;
        }
        Commands::Status => {
            print_json(&client.status().await?)?;
        }
        Commands::Pending { txid } => {
            print_json(&client.pending_status(&TxId(txid)).await?)?;
        }
        Commands::Account { address } => {
            let address: Address = address.parse()?;
            print_json(&client.account_information(&address).await?)?;
        }
        Commands::Wait { txid, rounds } => {
            let result = await_confirmation(&client, &TxId(txid), rounds).await;
            print_json(&WaitView {
                txid: result.txid.to_string(),
                confirmed: result.is_confirmed(),
                round: result.confirmed_round(),
                asset_index: result.asset_index(),
                detail: result.to_string(),
            })?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
