//! Ledger-tx: client-side transaction construction for a UTXO ledger
//!
//! This crate provides:
//! - A canonical hashing protocol (BLAKE2b-512 digests, UTXO keys)
//! - ECDSA signing of transaction digests (secp256k1)
//! - The byte-bounded script stack and IF / ELSE / ENDIF scope tracking
//! - The payload fee schedule and a per-byte fee policy
//! - A UTXO working set with deterministic coin selection
//! - A transaction builder with change handling
//! - A replace-by-fee transaction canceller
//!
//! # Example
//!
//! ```rust
//! use ledger_tx::core::{FeePolicy, OutputType, UnspentOutput};
//! use ledger_tx::crypto::hash_full;
//! use ledger_tx::wallet::{UtxoManager, Wallet};
//!
//! let wallet = Wallet::new();
//! let mut manager = UtxoManager::with_utxos(vec![UnspentOutput::new(
//!     hash_full(&1u64),
//!     OutputType::Payment,
//!     0,
//!     10_000_000,
//!     wallet.lock(),
//! )]);
//!
//! let recipient = Wallet::new();
//! let tx = wallet
//!     .send(
//!         &mut manager,
//!         recipient.lock(),
//!         1_000_000,
//!         None,
//!         vec![],
//!         &FeePolicy::default(),
//!     )
//!     .unwrap();
//! println!("Transaction: {}", tx.hash());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod script;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use crate::core::{
    payload_fee, Cancellation, CancelResultCode, FeePolicy, OutputType, Transaction, TxBuilder,
    TxCanceller, UnspentOutput,
};
pub use crypto::{Digest, KeyPair};
pub use script::{Lock, ScopeCondition, Stack};
pub use wallet::{SharedUtxoManager, UtxoManager, Wallet};
