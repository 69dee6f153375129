//! Transactions and unspent outputs
//!
//! A transaction's identity is the digest of its structural hash. Inputs
//! contribute their UTXO key and unlock age but not their unlock proof, so
//! signing a transaction does not change its ID.

use super::amount::{checked_sum, u64_string, AmountError};
use crate::crypto::{hash_full, utxo_key, Digest, Hashable, KeyError};
use crate::script::lock::hex_bytes;
use crate::script::{Lock, ScriptError, StackLimits, Unlock};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Unknown output type: {0}")]
    UnknownOutputType(u32),
    #[error("Input index {0} out of range")]
    InputOutOfRange(usize),
    #[error("Expected {expected} locks, got {actual}")]
    LockCountMismatch { expected: usize, actual: usize },
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Amount(#[from] AmountError),
}

// =============================================================================
// Output Type
// =============================================================================

/// Kind of value an output carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum OutputType {
    /// Ordinary spendable value
    Payment,
    /// Frozen stake; never spent through coin selection
    Freeze,
}

impl From<OutputType> for u32 {
    fn from(t: OutputType) -> u32 {
        match t {
            OutputType::Payment => 0,
            OutputType::Freeze => 1,
        }
    }
}

impl TryFrom<u32> for OutputType {
    type Error = TransactionError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OutputType::Payment),
            1 => Ok(OutputType::Freeze),
            other => Err(TransactionError::UnknownOutputType(other)),
        }
    }
}

impl Hashable for OutputType {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        u32::from(*self).compute_hash(buf);
    }
}

// =============================================================================
// Transaction Input
// =============================================================================

/// Reference to a spent output plus the proof that unlocks it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Key of the output being spent
    pub utxo: Digest,
    pub unlock: Unlock,
    /// Relative lock requirement; 0 means none
    #[serde(default)]
    pub unlock_age: u32,
}

impl TxInput {
    pub fn new(utxo: Digest) -> Self {
        Self {
            utxo,
            unlock: Unlock::default(),
            unlock_age: 0,
        }
    }
}

impl Hashable for TxInput {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        self.utxo.compute_hash(buf);
        self.unlock_age.compute_hash(buf);
    }
}

// =============================================================================
// Transaction Output
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    #[serde(rename = "type")]
    pub output_type: OutputType,
    #[serde(with = "u64_string")]
    pub value: u64,
    pub lock: Lock,
}

impl TxOutput {
    pub fn new(output_type: OutputType, value: u64, lock: Lock) -> Self {
        Self {
            output_type,
            value,
            lock,
        }
    }
}

impl Hashable for TxOutput {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        self.output_type.compute_hash(buf);
        self.value.compute_hash(buf);
        self.lock.compute_hash(buf);
    }
}

// =============================================================================
// Transaction
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    #[serde(default, with = "hex_bytes")]
    pub payload: Vec<u8>,
    #[serde(default, with = "u64_string")]
    pub lock_height: u64,
}

impl Transaction {
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>, payload: Vec<u8>) -> Self {
        Self {
            inputs,
            outputs,
            payload,
            lock_height: 0,
        }
    }

    /// Transaction ID
    pub fn hash(&self) -> Digest {
        hash_full(self)
    }

    /// Key of this transaction's output `index`
    pub fn utxo_key(&self, index: u64) -> Digest {
        utxo_key(&self.hash(), index)
    }

    pub fn total_output(&self) -> Result<u64, AmountError> {
        checked_sum(self.outputs.iter().map(|o| o.value))
    }

    /// Verify the unlock of input `index` against the lock it spends
    pub fn verify_input(&self, index: usize, lock: &Lock) -> Result<bool, TransactionError> {
        let input = self
            .inputs
            .get(index)
            .ok_or(TransactionError::InputOutOfRange(index))?;
        Ok(lock.verify(&input.unlock, &self.hash())?)
    }

    /// Evaluate the unlock of input `index` on a stack bounded by `limits`
    pub fn evaluate_input(
        &self,
        index: usize,
        lock: &Lock,
        limits: StackLimits,
    ) -> Result<bool, TransactionError> {
        let input = self
            .inputs
            .get(index)
            .ok_or(TransactionError::InputOutOfRange(index))?;
        Ok(lock.evaluate(&input.unlock, &self.hash(), limits)?)
    }

    /// Verify every input, given the locks of the outputs they spend in order
    pub fn verify_signatures(&self, locks: &[Lock]) -> Result<bool, TransactionError> {
        if locks.len() != self.inputs.len() {
            return Err(TransactionError::LockCountMismatch {
                expected: self.inputs.len(),
                actual: locks.len(),
            });
        }
        let digest = self.hash();
        for (input, lock) in self.inputs.iter().zip(locks) {
            if !lock.verify(&input.unlock, &digest)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Hashable for Transaction {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        self.inputs.compute_hash(buf);
        self.outputs.compute_hash(buf);
        self.payload.compute_hash(buf);
        self.lock_height.compute_hash(buf);
    }
}

// =============================================================================
// Unspent Output
// =============================================================================

/// Snapshot of a spendable output as reported by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    pub utxo: Digest,
    #[serde(rename = "type")]
    pub output_type: OutputType,
    /// First height at which the output can be spent
    #[serde(with = "u64_string")]
    pub unlock_height: u64,
    #[serde(with = "u64_string")]
    pub amount: u64,
    pub lock: Lock,
}

impl UnspentOutput {
    pub fn new(
        utxo: Digest,
        output_type: OutputType,
        unlock_height: u64,
        amount: u64,
        lock: Lock,
    ) -> Self {
        Self {
            utxo,
            output_type,
            unlock_height,
            amount,
            lock,
        }
    }

    /// Whether the output has matured at `height` (always, when no height is given)
    pub fn is_mature_at(&self, height: Option<u64>) -> bool {
        match height {
            None => true,
            Some(h) => self.unlock_height <= h.saturating_add(1),
        }
    }

    /// Payment output that has matured at `height`
    pub fn is_spendable_at(&self, height: Option<u64>) -> bool {
        self.output_type == OutputType::Payment && self.is_mature_at(height)
    }
}

impl Hashable for UnspentOutput {
    fn compute_hash(&self, buf: &mut Vec<u8>) {
        self.utxo.compute_hash(buf);
        self.output_type.compute_hash(buf);
        self.unlock_height.compute_hash(buf);
        self.amount.compute_hash(buf);
        self.lock.compute_hash(buf);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::script::LockType;

    fn sample_tx() -> Transaction {
        let lock = Lock::new(LockType::Key, vec![2; 33]);
        Transaction::new(
            vec![TxInput::new(hash_full("utxo-0")), TxInput::new(hash_full("utxo-1"))],
            vec![
                TxOutput::new(OutputType::Payment, 1_000, lock.clone()),
                TxOutput::new(OutputType::Freeze, 40_000, lock),
            ],
            vec![0xde, 0xad],
        )
    }

    #[test]
    fn test_hash_is_structural() {
        let a = sample_tx();
        let b = sample_tx();
        assert_eq!(a.hash(), b.hash());

        let mut c = sample_tx();
        c.lock_height = 1;
        assert_ne!(a.hash(), c.hash());

        let mut d = sample_tx();
        d.outputs.swap(0, 1);
        assert_ne!(a.hash(), d.hash());
    }

    #[test]
    fn test_unlock_does_not_change_id() {
        let a = sample_tx();
        let mut b = sample_tx();
        b.inputs[0].unlock = Unlock::new(vec![7; 64]);
        assert_eq!(a.hash(), b.hash());

        b.inputs[0].unlock_age = 3;
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_field_order() {
        let tx = sample_tx();
        let mut buf = Vec::new();
        for input in &tx.inputs {
            buf.extend_from_slice(input.utxo.as_bytes());
            buf.extend_from_slice(&0u32.to_le_bytes());
        }
        for output in &tx.outputs {
            buf.extend_from_slice(&u32::from(output.output_type).to_le_bytes());
            buf.extend_from_slice(&output.value.to_le_bytes());
            buf.push(0);
            buf.extend_from_slice(&output.lock.bytes);
        }
        buf.extend_from_slice(&tx.payload);
        buf.extend_from_slice(&0u64.to_le_bytes());
        assert_eq!(tx.hash(), crate::crypto::blake2b_512(&buf));
    }

    #[test]
    fn test_utxo_key() {
        let tx = sample_tx();
        assert_eq!(tx.utxo_key(1), utxo_key(&tx.hash(), 1));
        assert_ne!(tx.utxo_key(0), tx.utxo_key(1));
    }

    #[test]
    fn test_json_shape() {
        let tx = sample_tx();
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["outputs"][0]["value"], "1000");
        assert_eq!(json["outputs"][1]["type"], 1);
        assert_eq!(json["outputs"][0]["lock"]["type"], 0);
        assert_eq!(json["lock_height"], "0");
        assert_eq!(json["payload"], "dead");
        assert_eq!(json["inputs"][0]["unlock_age"], 0);
        assert!(json["inputs"][0]["utxo"]
            .as_str()
            .unwrap()
            .starts_with("0x"));

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_verify_signatures() {
        let kp = KeyPair::generate();
        let lock = Lock::from_public_key(&kp.public_key);
        let mut tx = sample_tx();
        let digest = tx.hash();
        for input in &mut tx.inputs {
            input.unlock = Unlock::new(kp.sign(digest.as_bytes()).unwrap());
        }

        assert!(tx.verify_input(0, &lock).unwrap());
        assert!(tx
            .verify_signatures(&[lock.clone(), lock.clone()])
            .unwrap());
        assert!(matches!(
            tx.verify_input(5, &lock),
            Err(TransactionError::InputOutOfRange(5))
        ));
        assert!(tx.verify_signatures(&[lock]).is_err());

        let stranger = Lock::from_public_key(&KeyPair::generate().public_key);
        assert!(!tx.verify_input(1, &stranger).unwrap());
    }

    #[test]
    fn test_maturity() {
        let utxo = UnspentOutput::new(
            hash_full("u"),
            OutputType::Payment,
            5,
            10,
            Lock::new(LockType::Key, vec![]),
        );
        assert!(utxo.is_mature_at(None));
        assert!(!utxo.is_mature_at(Some(3)));
        assert!(utxo.is_mature_at(Some(4)));
        assert!(utxo.is_spendable_at(Some(10)));

        let frozen = UnspentOutput {
            output_type: OutputType::Freeze,
            ..utxo
        };
        assert!(!frozen.is_spendable_at(None));
    }

    #[test]
    fn test_unspent_output_json() {
        let json = serde_json::json!({
            "utxo": hash_full("u").to_hex(),
            "type": 0,
            "unlock_height": "12",
            "amount": "500000000",
            "lock": { "type": 0, "bytes": "02" }
        });
        let utxo: UnspentOutput = serde_json::from_value(json).unwrap();
        assert_eq!(utxo.unlock_height, 12);
        assert_eq!(utxo.amount, 500_000_000);
        assert_eq!(utxo.output_type, OutputType::Payment);
    }
}
