//! Ledger-tx CLI Application
//!
//! A command-line interface for building, signing and cancelling
//! transactions.

use clap::{Parser, Subcommand};
use ledger_tx::cli;
use ledger_tx::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ledger-tx")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Transaction construction for a UTXO ledger", long_about = None)]
struct Cli {
    /// JSON configuration file (fee policy, stack limits)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the fee for a payload size
    PayloadFee {
        /// Payload size in bytes
        #[arg(short, long, allow_negative_numbers = true)]
        size: i64,
    },

    /// Generate a new key pair
    Keygen,

    /// Show the balance of a UTXO file
    Balance {
        /// JSON file with unspent outputs
        #[arg(short, long)]
        utxos: PathBuf,

        /// Current block height
        #[arg(long)]
        height: Option<u64>,
    },

    /// Build and sign a payment
    Send {
        /// Sender's private key (hex)
        #[arg(short, long)]
        key: String,

        /// JSON file with the sender's unspent outputs
        #[arg(short, long)]
        utxos: PathBuf,

        /// Recipient's public key (hex)
        #[arg(short, long)]
        to: String,

        /// Amount to send
        #[arg(short, long)]
        amount: u64,

        /// Current block height
        #[arg(long)]
        height: Option<u64>,

        /// Payload data (hex)
        #[arg(short, long)]
        payload: Option<String>,
    },

    /// Verify a transaction's unlocks against the outputs it spends
    Verify {
        /// JSON file with the transaction
        #[arg(short, long)]
        tx: PathBuf,

        /// JSON file with the outputs it spends
        #[arg(short, long)]
        utxos: PathBuf,
    },

    /// Cancel a pending transaction by replace-by-fee
    Cancel {
        /// JSON file with the pending transaction
        #[arg(short, long)]
        tx: PathBuf,

        /// JSON file with the outputs it spends
        #[arg(short, long)]
        utxos: PathBuf,

        /// Comma-separated private keys (hex) owning those outputs
        #[arg(short, long)]
        keys: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::PayloadFee { size } => {
            cli::cmd_payload_fee(size)?;
        }

        Commands::Keygen => {
            cli::cmd_keygen()?;
        }

        Commands::Balance { utxos, height } => {
            cli::cmd_balance(&utxos, height)?;
        }

        Commands::Send {
            key,
            utxos,
            to,
            amount,
            height,
            payload,
        } => {
            cli::cmd_send(
                &config,
                &key,
                &utxos,
                &to,
                amount,
                height,
                payload.as_deref(),
            )?;
        }

        Commands::Verify { tx, utxos } => {
            cli::cmd_verify(&config, &tx, &utxos)?;
        }

        Commands::Cancel { tx, utxos, keys } => {
            cli::cmd_cancel(&config, &tx, &utxos, &keys)?;
        }
    }

    Ok(())
}
