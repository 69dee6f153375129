//! Wallet module for coin selection and spending

pub mod utxo_manager;
pub mod wallet;

pub use utxo_manager::{SharedUtxoManager, UtxoManager, UtxoSum};
pub use wallet::{Wallet, WalletError};
