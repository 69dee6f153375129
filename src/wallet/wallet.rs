//! Wallet implementation
//!
//! Ties coin selection to the transaction builder for one key pair.

use super::utxo_manager::UtxoManager;
use crate::core::amount::{checked_add, AmountError};
use crate::core::{
    payload_fee_for, BuilderError, FeeError, FeePolicy, OutputType, Transaction, TxBuilder,
};
use crate::crypto::{KeyError, KeyPair};
use crate::script::Lock;
use thiserror::Error;

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Insufficient funds: need {need} including fees")]
    InsufficientFunds { need: u64 },
    #[error("Builder error: {0}")]
    Builder(#[from] BuilderError),
    #[error(transparent)]
    Fee(#[from] FeeError),
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error("Crypto error: {0}")]
    Crypto(#[from] KeyError),
}

/// A key pair able to spend the outputs locked to it
pub struct Wallet {
    key_pair: KeyPair,
}

impl Wallet {
    /// Create a new wallet with a fresh key pair
    pub fn new() -> Self {
        Self::from_key_pair(KeyPair::generate())
    }

    pub fn from_key_pair(key_pair: KeyPair) -> Self {
        Self { key_pair }
    }

    /// Import a wallet from a private key
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, WalletError> {
        Ok(Self::from_key_pair(KeyPair::from_private_key_hex(
            private_key_hex,
        )?))
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn address(&self) -> String {
        self.key_pair.address()
    }

    /// Single-key lock paying this wallet
    pub fn lock(&self) -> Lock {
        Lock::from_public_key(&self.key_pair.public_key)
    }

    /// Pay `amount` to `destination` from the wallet's working set
    ///
    /// Coins are taken in order until they cover the amount plus the fee
    /// of a transaction with that many inputs, two outputs and the payload.
    /// The working set only changes once the transaction is signed.
    pub fn send(
        &self,
        manager: &mut UtxoManager,
        destination: Lock,
        amount: u64,
        height: Option<u64>,
        payload: Vec<u8>,
        policy: &FeePolicy,
    ) -> Result<Transaction, WalletError> {
        if amount == 0 {
            return Err(BuilderError::InvalidAmount(amount).into());
        }
        let payload_fee = payload_fee_for(&payload)?;
        let payload_size = payload.len();
        let tx_fee = |inputs: usize| {
            policy.standard_fee(FeePolicy::estimated_size(inputs, 2, payload_size))
        };
        let need = |inputs: usize| {
            checked_add(checked_add(amount, payload_fee)?, tx_fee(inputs)?)
        };

        let mut working = manager.clone();
        let selected = working.get_utxo_with(height, &need)?;
        if selected.is_empty() {
            return Err(WalletError::InsufficientFunds { need: need(1)? });
        }
        log::info!(
            "{} selected {} utxos to send {}",
            self.address(),
            selected.len(),
            amount
        );

        let mut builder = TxBuilder::new(self.key_pair.clone());
        for utxo in &selected {
            builder.add_input(utxo.utxo, utxo.amount)?;
        }
        builder.add_output(destination, amount)?;
        builder.assign_payload(payload);
        let tx = builder.sign(OutputType::Payment, tx_fee(selected.len())?, payload_fee)?;

        *manager = working;
        Ok(tx)
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}
