//! Transaction cancellation by replace-by-fee
//!
//! A cancellation spends the same outputs as a pending transaction, pays
//! every coin back to the lock it came from and outbids the original's fee
//! rate by `double_spent_threshold_pct` percent. Rejection is an ordinary
//! outcome, reported as a [`CancelRejection`] rather than an error.

use super::amount::{checked_mul, AmountError};
use super::fee::FeePolicy;
use super::transaction::{OutputType, Transaction, TxInput, TxOutput, UnspentOutput};
use crate::crypto::KeyPair;
use crate::script::Unlock;
use std::fmt;

/// Outcome code of a cancellation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelResultCode {
    Success,
    UnsupportedUnfreezing,
    NotFoundUTXO,
    UnsupportedLockType,
    NotFoundKey,
    NotEnoughFee,
}

/// Why a transaction could not be cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelRejection {
    /// A spent output is frozen stake
    UnsupportedUnfreezing,
    /// An input has no matching unspent output
    NotFoundUTXO,
    /// A spent output is not locked to a single key
    UnsupportedLockType,
    /// No key pair owns a spent output
    NotFoundKey,
    /// The fee share would consume a whole output
    NotEnoughFee,
}

impl CancelRejection {
    pub fn code(&self) -> CancelResultCode {
        match self {
            CancelRejection::UnsupportedUnfreezing => CancelResultCode::UnsupportedUnfreezing,
            CancelRejection::NotFoundUTXO => CancelResultCode::NotFoundUTXO,
            CancelRejection::UnsupportedLockType => CancelResultCode::UnsupportedLockType,
            CancelRejection::NotFoundKey => CancelResultCode::NotFoundKey,
            CancelRejection::NotEnoughFee => CancelResultCode::NotEnoughFee,
        }
    }
}

impl fmt::Display for CancelRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.code(), f)
    }
}

/// A signed cancellation transaction and the fee it pays
#[derive(Debug, Clone)]
pub struct Cancellation {
    pub tx: Transaction,
    /// Total fee: inputs minus outputs
    pub fee: u64,
    /// Base fee share per refunded output; the first `fee % outputs`
    /// outputs pay one unit more
    pub fee_per_output: u64,
}

impl Cancellation {
    pub fn code(&self) -> CancelResultCode {
        CancelResultCode::Success
    }
}

/// Single-use builder of a cancellation for one pending transaction
pub struct TxCanceller<'a> {
    tx: &'a Transaction,
    utxos: &'a [UnspentOutput],
    key_pairs: &'a [KeyPair],
    policy: FeePolicy,
}

impl<'a> TxCanceller<'a> {
    pub fn new(
        tx: &'a Transaction,
        utxos: &'a [UnspentOutput],
        key_pairs: &'a [KeyPair],
        policy: FeePolicy,
    ) -> Self {
        Self {
            tx,
            utxos,
            key_pairs,
            policy,
        }
    }

    pub fn build(self) -> Result<Cancellation, CancelRejection> {
        let result = self.try_build();
        if let Err(rejection) = &result {
            log::warn!("cannot cancel {}: {}", self.tx.hash(), rejection);
        }
        result
    }

    fn try_build(&self) -> Result<Cancellation, CancelRejection> {
        let matched: Vec<Option<&UnspentOutput>> = self
            .tx
            .inputs
            .iter()
            .map(|input| self.utxos.iter().find(|u| u.utxo == input.utxo))
            .collect();

        if matched
            .iter()
            .flatten()
            .any(|u| u.output_type == OutputType::Freeze)
        {
            return Err(CancelRejection::UnsupportedUnfreezing);
        }

        let spent: Vec<&UnspentOutput> = matched
            .into_iter()
            .collect::<Option<_>>()
            .ok_or(CancelRejection::NotFoundUTXO)?;

        if spent.iter().any(|u| !u.lock.is_single_key()) {
            return Err(CancelRejection::UnsupportedLockType);
        }

        let signers: Vec<&KeyPair> = spent
            .iter()
            .map(|u| {
                self.key_pairs
                    .iter()
                    .find(|kp| kp.public_key_bytes().as_slice() == u.lock.bytes.as_slice())
            })
            .collect::<Option<_>>()
            .ok_or(CancelRejection::NotFoundKey)?;

        let fee = self
            .cancellation_fee()
            .map_err(|_| CancelRejection::NotEnoughFee)?;
        let charges = split_fee(fee, spent.len());
        if spent
            .iter()
            .zip(&charges)
            .any(|(u, &charge)| u.amount <= charge)
        {
            return Err(CancelRejection::NotEnoughFee);
        }

        let inputs = spent.iter().map(|u| TxInput::new(u.utxo)).collect();
        let outputs = spent
            .iter()
            .zip(&charges)
            .map(|(u, &charge)| TxOutput::new(OutputType::Payment, u.amount - charge, u.lock.clone()))
            .collect();
        let mut tx = Transaction::new(inputs, outputs, Vec::new());

        let digest = tx.hash();
        for (input, signer) in tx.inputs.iter_mut().zip(&signers) {
            let signature = signer
                .sign(digest.as_bytes())
                .map_err(|_| CancelRejection::NotFoundKey)?;
            input.unlock = Unlock::new(signature);
        }

        let fee_per_output = fee / spent.len().max(1) as u64;
        log::info!(
            "cancellation {} replaces {} paying {} ({} per output)",
            digest,
            self.tx.hash(),
            fee,
            fee_per_output
        );

        Ok(Cancellation {
            tx,
            fee,
            fee_per_output,
        })
    }

    /// `cancel_fee_rate(original_size) * cancel_size`
    fn cancellation_fee(&self) -> Result<u64, AmountError> {
        let original_size = FeePolicy::estimated_size(
            self.tx.inputs.len(),
            self.tx.outputs.len(),
            self.tx.payload.len(),
        );
        let cancel_size =
            FeePolicy::estimated_size(self.tx.inputs.len(), self.tx.outputs.len(), 0);

        let rate = self.policy.cancel_fee_rate(original_size)?;
        checked_mul(rate, cancel_size as u64)
    }
}

/// Split `fee` into `n` near-equal charges summing to exactly `fee`
///
/// The remainder goes one unit at a time to the first charges.
fn split_fee(fee: u64, n: usize) -> Vec<u64> {
    let count = (n as u64).max(1);
    let share = fee / count;
    let remainder = (fee % count) as usize;
    (0..n)
        .map(|i| if i < remainder { share + 1 } else { share })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
