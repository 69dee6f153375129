//! Checked amount arithmetic
//!
//! Amounts are plain `u64`. Sums and differences never wrap: they fail
//! with an [`AmountError`] instead.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount overflow")]
    Overflow,
    #[error("Amount underflow: {0} - {1}")]
    Underflow(u64, u64),
}

pub fn checked_add(a: u64, b: u64) -> Result<u64, AmountError> {
    a.checked_add(b).ok_or(AmountError::Overflow)
}

pub fn checked_sub(a: u64, b: u64) -> Result<u64, AmountError> {
    a.checked_sub(b).ok_or(AmountError::Underflow(a, b))
}

pub fn checked_mul(a: u64, b: u64) -> Result<u64, AmountError> {
    a.checked_mul(b).ok_or(AmountError::Overflow)
}

pub fn checked_sum<I: IntoIterator<Item = u64>>(amounts: I) -> Result<u64, AmountError> {
    amounts.into_iter().try_fold(0u64, checked_add)
}

/// Decimal-string wire form for amounts and heights
pub(crate) mod u64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
