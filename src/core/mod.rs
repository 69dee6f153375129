//! Core transaction components
//!
//! This module contains:
//! - Transactions, inputs, outputs and unspent outputs
//! - Checked amount arithmetic
//! - The payload fee schedule and per-byte fee policy
//! - The transaction builder
//! - The replace-by-fee transaction canceller

pub mod amount;
pub mod builder;
pub mod canceller;
pub mod fee;
pub mod transaction;

pub use amount::AmountError;
pub use builder::{BuilderError, TxBuilder};
pub use canceller::{CancelRejection, CancelResultCode, Cancellation, TxCanceller};
pub use fee::{
    payload_fee, payload_fee_for, FeeError, FeePolicy, MAX_PAYLOAD_SIZE, PAYLOAD_FEE_UNIT,
};
pub use transaction::{
    OutputType, Transaction, TransactionError, TxInput, TxOutput, UnspentOutput,
};
