//! Transaction builder
//!
//! Collects inputs and outputs for one owner, keeps outputs covered by
//! inputs as they are added, and on `sign` puts any remaining value in a
//! change output ahead of the explicit outputs.

use super::amount::{checked_add, checked_sum, AmountError};
use super::fee::{payload_fee_for, FeeError, FeePolicy};
use super::transaction::{OutputType, Transaction, TxInput, TxOutput};
use crate::crypto::{KeyError, KeyPair};
use crate::script::{Lock, Unlock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("Positive amount expected, not {0}")]
    InvalidAmount(u64),
    #[error("Insufficient amount. {outputs}:{inputs}")]
    InsufficientFunds { outputs: u64, inputs: u64 },
    #[error("No output for transaction.")]
    NoOutput,
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error(transparent)]
    Fee(#[from] FeeError),
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
}

/// Single-use builder for a transaction spending one owner's outputs
#[derive(Debug)]
pub struct TxBuilder {
    owner: KeyPair,
    inputs: Vec<(TxInput, u64)>,
    outputs: Vec<TxOutput>,
    payload: Vec<u8>,
    lock_height: u64,
    total_inputs: u64,
    total_outputs: u64,
}

impl TxBuilder {
    pub fn new(owner: KeyPair) -> Self {
        Self {
            owner,
            inputs: Vec::new(),
            outputs: Vec::new(),
            payload: Vec::new(),
            lock_height: 0,
            total_inputs: 0,
            total_outputs: 0,
        }
    }

    /// Spend the output `utxo` worth `amount`
    pub fn add_input(
        &mut self,
        utxo: crate::crypto::Digest,
        amount: u64,
    ) -> Result<&mut Self, BuilderError> {
        self.total_inputs = checked_add(self.total_inputs, amount)?;
        self.inputs.push((TxInput::new(utxo), amount));
        Ok(self)
    }

    /// Pay `amount` to `destination`
    ///
    /// Fails as soon as the outputs would exceed the inputs added so far.
    pub fn add_output(&mut self, destination: Lock, amount: u64) -> Result<&mut Self, BuilderError> {
        if amount == 0 {
            return Err(BuilderError::InvalidAmount(amount));
        }
        let total_outputs = checked_add(self.total_outputs, amount)?;
        if total_outputs > self.total_inputs {
            return Err(BuilderError::InsufficientFunds {
                outputs: total_outputs,
                inputs: self.total_inputs,
            });
        }
        self.total_outputs = total_outputs;
        self.outputs
            .push(TxOutput::new(OutputType::Payment, amount, destination));
        Ok(self)
    }

    /// Attach payload data, replacing any earlier payload
    pub fn assign_payload(&mut self, payload: Vec<u8>) -> &mut Self {
        self.payload = payload;
        self
    }

    pub fn lock_height(&mut self, lock_height: u64) -> &mut Self {
        self.lock_height = lock_height;
        self
    }

    pub fn total_inputs(&self) -> u64 {
        self.total_inputs
    }

    pub fn total_outputs(&self) -> u64 {
        self.total_outputs
    }

    /// Build and sign, paying `tx_fee + payload_fee`
    ///
    /// Explicit outputs take `output_type`; the change output is always a
    /// payment back to the owner.
    pub fn sign(
        self,
        output_type: OutputType,
        tx_fee: u64,
        payload_fee: u64,
    ) -> Result<Transaction, BuilderError> {
        let spent = checked_sum([self.total_outputs, tx_fee, payload_fee])?;
        let change = self.total_inputs.saturating_sub(spent);
        if self.total_inputs < spent {
            log::warn!(
                "inputs {} do not cover outputs and fees {}; no change output",
                self.total_inputs,
                spent
            );
        }

        let mut outputs = Vec::with_capacity(self.outputs.len() + 1);
        if change > 0 {
            log::debug!("adding change output of {}", change);
            outputs.push(TxOutput::new(
                OutputType::Payment,
                change,
                Lock::from_public_key(&self.owner.public_key),
            ));
        }
        outputs.extend(self.outputs.into_iter().map(|mut output| {
            output.output_type = output_type;
            output
        }));

        if outputs.is_empty() {
            return Err(BuilderError::NoOutput);
        }

        let inputs = self.inputs.into_iter().map(|(input, _)| input).collect();
        let mut tx = Transaction::new(inputs, outputs, self.payload);
        tx.lock_height = self.lock_height;

        let digest = tx.hash();
        for input in &mut tx.inputs {
            input.unlock = Unlock::new(self.owner.sign(digest.as_bytes())?);
        }

        log::info!(
            "signed transaction {} with {} inputs and {} outputs",
            digest,
            tx.inputs.len(),
            tx.outputs.len()
        );
        Ok(tx)
    }

    /// Fee for the transaction as it would be signed now under `policy`
    ///
    /// Returns `(tx_fee, payload_fee)`. A change output is counted only when
    /// the inputs leave something over after that fee.
    pub fn estimate_fees(&self, policy: &FeePolicy) -> Result<(u64, u64), BuilderError> {
        let payload_fee = payload_fee_for(&self.payload)?;
        let size = |outputs: usize| {
            FeePolicy::estimated_size(self.inputs.len(), outputs, self.payload.len())
        };

        let with_change = policy.standard_fee(size(self.outputs.len() + 1))?;
        let spent = checked_sum([self.total_outputs, with_change, payload_fee])?;
        if self.total_inputs > spent {
            return Ok((with_change, payload_fee));
        }
        Ok((policy.standard_fee(size(self.outputs.len()))?, payload_fee))
    }

    /// Sign with fees taken from `policy` and the payload schedule
    pub fn sign_with_policy(
        self,
        output_type: OutputType,
        policy: &FeePolicy,
    ) -> Result<Transaction, BuilderError> {
        let (tx_fee, payload_fee) = self.estimate_fees(policy)?;
        self.sign(output_type, tx_fee, payload_fee)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{hash_full, Digest};
    use crate::core::fee::payload_fee;

    fn utxo(n: u64) -> Digest {
        hash_full(&n)
    }

    fn destination() -> Lock {
        Lock::from_public_key(&KeyPair::generate().public_key)
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut builder = TxBuilder::new(KeyPair::generate());
        builder.add_input(utxo(0), 100).unwrap();
        let err = builder.add_output(destination(), 0).unwrap_err();
        assert_eq!(err.to_string(), "Positive amount expected, not 0");
    }

    #[test]
    fn test_debug_hides_secret_key() {
        let owner = KeyPair::generate();
        let secret = owner.private_key_hex();
        let mut builder = TxBuilder::new(owner);
        builder.add_input(utxo(0), 100).unwrap();

        let debug = format!("{:?}", builder);
        assert!(debug.contains("TxBuilder"));
        assert!(!debug.contains(&secret));
    }

    #[test]
    fn test_outputs_checked_against_inputs() {
        let mut builder = TxBuilder::new(KeyPair::generate());
        builder.add_input(utxo(0), 100).unwrap();
        builder.add_output(destination(), 60).unwrap();
        let err = builder.add_output(destination(), 50).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient amount. 110:100");

        // The rejected output was not recorded
        assert_eq!(builder.total_outputs(), 60);
        builder.add_output(destination(), 40).unwrap();
    }

    #[test]
    fn test_output_without_inputs() {
        let mut builder = TxBuilder::new(KeyPair::generate());
        let err = builder.add_output(destination(), 1).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient amount. 1:0");
    }

    #[test]
    fn test_no_output() {
        let mut builder = TxBuilder::new(KeyPair::generate());
        builder.add_input(utxo(0), 100).unwrap();
        let err = builder.sign(OutputType::Payment, 100, 0).unwrap_err();
        assert!(matches!(err, BuilderError::NoOutput));
        assert_eq!(err.to_string(), "No output for transaction.");
    }

    #[test]
    fn test_change_output_comes_first() {
        let owner = KeyPair::generate();
        let owner_lock = Lock::from_public_key(&owner.public_key);
        let dest = destination();

        let mut builder = TxBuilder::new(owner.clone());
        builder.add_input(utxo(0), 1_000_000).unwrap();
        builder.add_input(utxo(1), 500_000).unwrap();
        builder.add_output(dest.clone(), 700_000).unwrap();
        builder.assign_payload(vec![1; 10]);

        let fee = payload_fee(10).unwrap();
        let tx = builder.sign(OutputType::Payment, 100_000, fee).unwrap();

        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.outputs[0].lock, owner_lock);
        assert_eq!(tx.outputs[0].value, 1_500_000 - 700_000 - 100_000 - fee);
        assert_eq!(tx.outputs[1].lock, dest);
        assert_eq!(tx.outputs[1].value, 700_000);
        assert_eq!(tx.payload, vec![1; 10]);

        for input in &tx.inputs {
            assert_eq!(input.unlock_age, 0);
        }
        assert!(tx
            .verify_signatures(&[owner_lock.clone(), owner_lock])
            .unwrap());
    }

    #[test]
    fn test_change_only_transaction() {
        let owner = KeyPair::generate();
        let mut builder = TxBuilder::new(owner.clone());
        builder.add_input(utxo(0), 1_000).unwrap();
        let tx = builder.sign(OutputType::Payment, 100, 0).unwrap();
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].value, 900);
        assert_eq!(tx.outputs[0].lock, Lock::from_public_key(&owner.public_key));
    }

    #[test]
    fn test_exact_spend_has_no_change() {
        let mut builder = TxBuilder::new(KeyPair::generate());
        builder.add_input(utxo(0), 1_000).unwrap();
        builder.add_output(destination(), 900).unwrap();
        let tx = builder.sign(OutputType::Freeze, 100, 0).unwrap();
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].output_type, OutputType::Freeze);
        assert_eq!(tx.outputs[0].value, 900);
    }

    #[test]
    fn test_each_input_gets_its_own_signature() {
        let owner = KeyPair::generate();
        let mut builder = TxBuilder::new(owner);
        builder.add_input(utxo(0), 10).unwrap();
        builder.add_input(utxo(1), 10).unwrap();
        builder.add_output(destination(), 20).unwrap();
        let tx = builder.sign(OutputType::Payment, 0, 0).unwrap();
        assert_ne!(tx.inputs[0].unlock, tx.inputs[1].unlock);
    }

    #[test]
    fn test_lock_height() {
        let mut builder = TxBuilder::new(KeyPair::generate());
        builder.add_input(utxo(0), 10).unwrap();
        builder.lock_height(42);
        let tx = builder.sign(OutputType::Payment, 0, 0).unwrap();
        assert_eq!(tx.lock_height, 42);
    }

    #[test]
    fn test_sign_with_policy() {
        let policy = FeePolicy::default();
        let mut builder = TxBuilder::new(KeyPair::generate());
        builder.add_input(utxo(0), 10_000_000).unwrap();
        builder.add_output(destination(), 1_000_000).unwrap();

        let (tx_fee, payload_fee) = builder.estimate_fees(&policy).unwrap();
        assert_eq!(payload_fee, 0);
        assert_eq!(
            tx_fee,
            policy
                .standard_fee(FeePolicy::estimated_size(1, 2, 0))
                .unwrap()
        );

        let tx = builder
            .sign_with_policy(OutputType::Payment, &policy)
            .unwrap();
        let paid = 10_000_000 - tx.total_output().unwrap();
        assert_eq!(paid, tx_fee);
    }
}
