//! CLI commands for ledger-tx
//!
//! Implements all command handlers for the CLI interface. Unspent outputs
//! and pending transactions are read from JSON files in wire form.

use crate::config::Config;
use crate::core::{payload_fee, Transaction, TxCanceller, UnspentOutput};
use crate::crypto::{public_key_from_hex, KeyPair};
use crate::script::Lock;
use crate::wallet::{UtxoManager, Wallet};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::BufReader;
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn read_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let file = fs::File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Read a JSON array of unspent outputs
pub fn load_utxos(path: &Path) -> CliResult<Vec<UnspentOutput>> {
    let utxos: Vec<UnspentOutput> = read_json(path)?;
    log::debug!("read {} utxos from {:?}", utxos.len(), path);
    Ok(utxos)
}

/// Read one transaction
pub fn load_transaction(path: &Path) -> CliResult<Transaction> {
    read_json(path)
}

/// Parse a comma-separated list of hex private keys
pub fn parse_key_pairs(keys: &str) -> CliResult<Vec<KeyPair>> {
    keys.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| KeyPair::from_private_key_hex(key).map_err(Into::into))
        .collect()
}

/// Print the fee for a payload of `size` bytes
pub fn cmd_payload_fee(size: i64) -> CliResult<()> {
    let fee = payload_fee(size)?;
    println!("💸 Payload fee for {} bytes: {}", size, fee);
    Ok(())
}

/// Generate a fresh key pair
pub fn cmd_keygen() -> CliResult<()> {
    let key_pair = KeyPair::generate();

    println!("🔐 New key pair created!");
    println!("   📍 Address: {}", key_pair.address());
    println!("   🔑 Public Key: {}", key_pair.public_key_hex());
    println!("   🗝️  Private Key: {}", key_pair.private_key_hex());
    println!("\n   ⚠️  IMPORTANT: The private key is not stored anywhere.");
    println!("   Copy it now to keep access to outputs locked to this key!");

    Ok(())
}

/// Show spendable, frozen and locked totals of a UTXO file
pub fn cmd_balance(utxos: &Path, height: Option<u64>) -> CliResult<()> {
    let manager = UtxoManager::with_utxos(load_utxos(utxos)?);
    let sum = manager.get_sum(height)?;

    match height {
        Some(h) => println!("💰 Balance at height {}", h),
        None => println!("💰 Balance"),
    }
    println!("   ├─ Spendable: {}", sum.spendable);
    println!("   ├─ Frozen: {}", sum.frozen);
    println!("   ├─ Locked: {}", sum.locked);
    println!("   └─ UTXOs: {}", manager.len());

    Ok(())
}

/// Pay `amount` to the key `to` and print the signed transaction
pub fn cmd_send(
    config: &Config,
    key: &str,
    utxos: &Path,
    to: &str,
    amount: u64,
    height: Option<u64>,
    payload: Option<&str>,
) -> CliResult<()> {
    let wallet = Wallet::from_private_key(key)?;
    let destination = Lock::from_public_key(&public_key_from_hex(to)?);
    let payload = match payload {
        Some(data) => hex::decode(data.trim_start_matches("0x"))?,
        None => Vec::new(),
    };

    let mut manager = UtxoManager::with_utxos(load_utxos(utxos)?);
    let tx = wallet.send(
        &mut manager,
        destination,
        amount,
        height,
        payload,
        &config.fees,
    )?;

    println!("📤 Transaction created:");
    println!("   ID: {}", tx.hash());
    println!("   From: {}", wallet.address());
    println!("   Amount: {}", amount);
    println!("{}", serde_json::to_string_pretty(&tx)?);

    Ok(())
}

/// Check every input of a transaction against the outputs it spends
///
/// Unlocks are evaluated on a stack bounded by the configured limits.
/// Returns the number of inputs that verified.
pub fn cmd_verify(config: &Config, tx: &Path, utxos: &Path) -> CliResult<usize> {
    let tx = load_transaction(tx)?;
    let manager = UtxoManager::with_utxos(load_utxos(utxos)?);

    println!("🔍 Verifying {}", tx.hash());
    let mut valid = 0;
    for (index, input) in tx.inputs.iter().enumerate() {
        let spent = manager.iter().find(|u| u.utxo == input.utxo);
        let verdict = match spent {
            None => "❌ spent output not found".to_string(),
            Some(utxo) => match tx.evaluate_input(index, &utxo.lock, config.stack) {
                Ok(true) => {
                    valid += 1;
                    "✅ valid".to_string()
                }
                Ok(false) => "❌ invalid unlock".to_string(),
                Err(e) => format!("❌ {}", e),
            },
        };
        println!("   └─ input {}: {}", index, verdict);
    }
    println!("   {}/{} inputs verified", valid, tx.inputs.len());

    Ok(valid)
}

/// Build a replace-by-fee cancellation for a pending transaction
pub fn cmd_cancel(config: &Config, tx: &Path, utxos: &Path, keys: &str) -> CliResult<()> {
    let tx = load_transaction(tx)?;
    let utxos = load_utxos(utxos)?;
    let key_pairs = parse_key_pairs(keys)?;

    match TxCanceller::new(&tx, &utxos, &key_pairs, config.fees).build() {
        Ok(cancellation) => {
            println!("🚫 Cancellation for {}", tx.hash());
            println!("   ├─ ID: {}", cancellation.tx.hash());
            println!("   ├─ Fee: {}", cancellation.fee);
            println!("   └─ Fee per output: {}", cancellation.fee_per_output);
            println!("{}", serde_json::to_string_pretty(&cancellation.tx)?);
            Ok(())
        }
        Err(rejection) => {
            println!("❌ Cancellation rejected: {}", rejection);
            Err(format!("cannot cancel transaction: {}", rejection).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OutputType;
    use crate::crypto::hash_full;

    #[test]
    fn test_load_utxos_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("utxos.json");
        let owner = KeyPair::generate();
        let utxos = vec![
            UnspentOutput::new(
                hash_full(&1u64),
                OutputType::Payment,
                0,
                1_000,
                Lock::from_public_key(&owner.public_key),
            ),
            UnspentOutput::new(
                hash_full(&2u64),
                OutputType::Freeze,
                5,
                2_000,
                Lock::from_public_key(&owner.public_key),
            ),
        ];
        fs::write(&path, serde_json::to_string(&utxos).unwrap()).unwrap();

        assert_eq!(load_utxos(&path).unwrap(), utxos);
        assert!(cmd_balance(&path, Some(3)).is_ok());
    }

    #[test]
    fn test_parse_key_pairs() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let list = format!("{}, {},", a.private_key_hex(), b.private_key_hex());

        let parsed = parse_key_pairs(&list).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].public_key, a.public_key);
        assert_eq!(parsed[1].public_key, b.public_key);
        assert!(parse_key_pairs("not-a-key").is_err());
    }

    #[test]
    fn test_verify_uses_configured_stack_limits() {
        let temp_dir = tempfile::tempdir().unwrap();
        let tx_path = temp_dir.path().join("tx.json");
        let utxos_path = temp_dir.path().join("utxos.json");

        let wallet = Wallet::new();
        let utxos = vec![UnspentOutput::new(
            hash_full(&1u64),
            OutputType::Payment,
            0,
            10_000_000,
            wallet.lock(),
        )];
        let mut manager = UtxoManager::with_utxos(utxos.clone());
        let tx = wallet
            .send(
                &mut manager,
                Wallet::new().lock(),
                1_000_000,
                None,
                vec![],
                &Config::default().fees,
            )
            .unwrap();
        fs::write(&tx_path, serde_json::to_string(&tx).unwrap()).unwrap();
        fs::write(&utxos_path, serde_json::to_string(&utxos).unwrap()).unwrap();

        let config = Config::default();
        assert_eq!(cmd_verify(&config, &tx_path, &utxos_path).unwrap(), 1);

        // A 64-byte signature does not fit a 32-byte item limit
        let mut tight = Config::default();
        tight.stack.max_item_bytes = 32;
        assert_eq!(cmd_verify(&tight, &tx_path, &utxos_path).unwrap(), 0);
    }

    #[test]
    fn test_payload_fee_bounds() {
        assert!(cmd_payload_fee(10).is_ok());
        assert!(cmd_payload_fee(-1).is_err());
    }
}
