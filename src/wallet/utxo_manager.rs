//! Unspent output working set and coin selection
//!
//! Entries keep the order in which they were added. Selection walks that
//! order, not amounts, so the same working set always yields the same
//! coins. A successful selection removes the chosen entries; a failed one
//! leaves the set untouched.

use crate::core::amount::{checked_add, AmountError};
use crate::core::{OutputType, UnspentOutput};
use crate::crypto::Digest;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Balance of a working set split by spendability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UtxoSum {
    /// Matured payment outputs
    pub spendable: u64,
    /// Freeze outputs
    pub frozen: u64,
    /// Payment outputs not yet matured
    pub locked: u64,
}

#[derive(Debug, Default, Clone)]
pub struct UtxoManager {
    items: Vec<UnspentOutput>,
    keys: HashSet<Digest>,
}

impl UtxoManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_utxos<I: IntoIterator<Item = UnspentOutput>>(utxos: I) -> Self {
        let mut manager = Self::new();
        manager.add(utxos);
        manager
    }

    /// Merge entries; keys already present are skipped
    pub fn add<I: IntoIterator<Item = UnspentOutput>>(&mut self, utxos: I) {
        for utxo in utxos {
            if self.keys.insert(utxo.utxo) {
                self.items.push(utxo);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, key: &Digest) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnspentOutput> {
        self.items.iter()
    }

    /// Spendable, frozen and locked totals at `height`
    pub fn get_sum(&self, height: Option<u64>) -> Result<UtxoSum, AmountError> {
        let mut sum = UtxoSum::default();
        for utxo in &self.items {
            let bucket = match utxo.output_type {
                OutputType::Freeze => &mut sum.frozen,
                OutputType::Payment if utxo.is_mature_at(height) => &mut sum.spendable,
                OutputType::Payment => &mut sum.locked,
            };
            *bucket = checked_add(*bucket, utxo.amount)?;
        }
        Ok(sum)
    }

    /// Take spendable entries, in order, until they cover `amount`
    ///
    /// Returns an empty vector, and takes nothing, when the spendable
    /// total falls short.
    pub fn get_utxo(
        &mut self,
        amount: u64,
        height: Option<u64>,
    ) -> Result<Vec<UnspentOutput>, AmountError> {
        self.get_utxo_with(height, |_| Ok(amount))
    }

    /// Like [`get_utxo`](Self::get_utxo), with a target that depends on how
    /// many entries have been selected so far
    pub fn get_utxo_with<F>(
        &mut self,
        height: Option<u64>,
        target: F,
    ) -> Result<Vec<UnspentOutput>, AmountError>
    where
        F: Fn(usize) -> Result<u64, AmountError>,
    {
        let mut selected = Vec::new();
        let mut sum = 0u64;
        let mut covered = false;

        for (index, utxo) in self.items.iter().enumerate() {
            if !utxo.is_spendable_at(height) {
                continue;
            }
            selected.push(index);
            sum = checked_add(sum, utxo.amount)?;
            if sum >= target(selected.len())? {
                covered = true;
                break;
            }
        }

        if covered {
            return Ok(self.take(&selected));
        }
        log::debug!(
            "coin selection failed: {} spendable across {} entries",
            sum,
            selected.len()
        );
        Ok(Vec::new())
    }

    /// Remove entries at ascending `indices`, keeping the rest in order
    fn take(&mut self, indices: &[usize]) -> Vec<UnspentOutput> {
        let mut taken = Vec::with_capacity(indices.len());
        let mut remaining = Vec::with_capacity(self.items.len() - indices.len());
        let mut next = indices.iter().peekable();

        for (index, utxo) in std::mem::take(&mut self.items).into_iter().enumerate() {
            if next.peek() == Some(&&index) {
                next.next();
                self.keys.remove(&utxo.utxo);
                taken.push(utxo);
            } else {
                remaining.push(utxo);
            }
        }

        self.items = remaining;
        log::debug!("selected {} utxos", taken.len());
        taken
    }
}

/// Cloneable handle that serializes access to one working set
///
/// Every call holds the lock for its whole duration, so two concurrent
/// selections can never take the same entry.
#[derive(Debug, Clone, Default)]
pub struct SharedUtxoManager {
    inner: Arc<Mutex<UtxoManager>>,
}

impl SharedUtxoManager {
    pub fn new(manager: UtxoManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, UtxoManager> {
        // A panic elsewhere cannot leave the set half-updated: `take`
        // swaps the whole vector in at the end.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add<I: IntoIterator<Item = UnspentOutput>>(&self, utxos: I) {
        self.lock().add(utxos);
    }

    pub fn get_sum(&self, height: Option<u64>) -> Result<UtxoSum, AmountError> {
        self.lock().get_sum(height)
    }

    pub fn get_utxo(
        &self,
        amount: u64,
        height: Option<u64>,
    ) -> Result<Vec<UnspentOutput>, AmountError> {
        self.lock().get_utxo(amount, height)
    }

    pub fn get_utxo_with<F>(
        &self,
        height: Option<u64>,
        target: F,
    ) -> Result<Vec<UnspentOutput>, AmountError>
    where
        F: Fn(usize) -> Result<u64, AmountError>,
    {
        self.lock().get_utxo_with(height, target)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run `f` with exclusive access to the working set
    pub fn with<R>(&self, f: impl FnOnce(&mut UtxoManager) -> R) -> R {
        f(&mut self.lock())
    }
}

// =============================================================================
// Tests
// =============================================================================
