//! Fees
//!
//! Two independent, additive parts make up a transaction's fee:
//! - the base fee, charged per estimated byte with an absolute floor
//! - the payload fee, a fixed schedule over the size of attached data

use super::amount::{checked_add, checked_mul, AmountError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Largest payload a transaction may carry, in bytes
pub const MAX_PAYLOAD_SIZE: i64 = 1024;

/// Every payload fee is a multiple of this unit
pub const PAYLOAD_FEE_UNIT: u64 = 100_000;

/// Payload schedule breakpoints as (size, fee in units)
const PAYLOAD_FEE_BREAKPOINTS: [(u64, u64); 4] = [(0, 0), (10, 5), (100, 65), (500, 1118)];

/// Fixed bytes of a transaction (lock height)
pub const TX_BASE_SIZE: usize = 8;

/// Bytes of one input: UTXO key, compact signature, unlock age
pub const TX_INPUT_SIZE: usize = 64 + 64 + 4;

/// Bytes of one output: type, value, lock type, compressed public key
pub const TX_OUTPUT_SIZE: usize = 1 + 8 + 1 + 33;

/// Default fee per estimated byte
pub const DEFAULT_FEE_PER_BYTE: u64 = 200;

/// Default absolute fee floor
pub const DEFAULT_MINIMUM_FEE: u64 = 100_000;

/// Default fee-rate premium for replacing a pending transaction
pub const DEFAULT_DOUBLE_SPENT_THRESHOLD_PCT: u64 = 20;

// =============================================================================
// Errors
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Amount(#[from] AmountError),
}

// =============================================================================
// Payload fee schedule
// =============================================================================

/// Fee for attaching `size` bytes of payload
pub fn payload_fee(size: i64) -> Result<u64, FeeError> {
    if size < 0 {
        return Err(FeeError::InvalidArgument(
            "Data size cannot be negative.".to_string(),
        ));
    }
    if size > MAX_PAYLOAD_SIZE {
        return Err(FeeError::InvalidArgument(format!(
            "Data size cannot be greater than {}.",
            MAX_PAYLOAD_SIZE
        )));
    }

    let size = size as u64;
    Ok(payload_fee_units(size) * PAYLOAD_FEE_UNIT)
}

/// Fee for attaching `payload`
pub fn payload_fee_for(payload: &[u8]) -> Result<u64, FeeError> {
    let size = i64::try_from(payload.len()).unwrap_or(i64::MAX);
    payload_fee(size)
}

fn payload_fee_units(size: u64) -> u64 {
    for pair in PAYLOAD_FEE_BREAKPOINTS.windows(2) {
        let (lo, lo_fee) = pair[0];
        let (hi, hi_fee) = pair[1];
        if size <= hi {
            return lo_fee + (size - lo) * (hi_fee - lo_fee) / (hi - lo);
        }
    }
    // Past the last breakpoint the curve grows as size^1.5 / 10
    isqrt(size * size * size / 100)
}

fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

// =============================================================================
// Fee policy
// =============================================================================

/// Per-byte fee policy shared by the builder and the canceller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeePolicy {
    pub fee_per_byte: u64,
    pub minimum_fee: u64,
    pub double_spent_threshold_pct: u64,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            fee_per_byte: DEFAULT_FEE_PER_BYTE,
            minimum_fee: DEFAULT_MINIMUM_FEE,
            double_spent_threshold_pct: DEFAULT_DOUBLE_SPENT_THRESHOLD_PCT,
        }
    }
}

impl FeePolicy {
    /// Estimated serialized size of a transaction
    pub fn estimated_size(num_inputs: usize, num_outputs: usize, payload_size: usize) -> usize {
        TX_BASE_SIZE + num_inputs * TX_INPUT_SIZE + num_outputs * TX_OUTPUT_SIZE + payload_size
    }

    /// Base fee for a transaction of `size` bytes
    pub fn standard_fee(&self, size: usize) -> Result<u64, AmountError> {
        let fee = checked_mul(size as u64, self.fee_per_byte)?;
        Ok(fee.max(self.minimum_fee))
    }

    /// Effective per-byte rate once the fee floor is applied, rounded up
    pub fn adjusted_fee_rate(&self, size: usize) -> Result<u64, AmountError> {
        let fee = self.standard_fee(size)?;
        let size = (size as u64).max(1);
        Ok(fee / size + u64::from(fee % size != 0))
    }

    /// Per-byte rate a replacement must pay to outbid a pending transaction
    pub fn cancel_fee_rate(&self, size: usize) -> Result<u64, AmountError> {
        let rate = self.adjusted_fee_rate(size)?;
        let pct = checked_add(100, self.double_spent_threshold_pct)?;
        Ok(checked_mul(rate, pct)? / 100)
    }
}

// =============================================================================
// Tests
// =============================================================================
