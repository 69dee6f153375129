//! Script execution stack
//!
//! Bounded by bytes rather than item count: a single item may not exceed
//! `max_item_bytes` and the sum of all items may not exceed
//! `max_total_bytes`. The running total is kept alongside the items.

use super::ScriptError;
use serde::{Deserialize, Serialize};

/// Default limit on the total bytes held by a stack
pub const DEFAULT_MAX_TOTAL_BYTES: usize = 16_384;

/// Default limit on a single stack item
pub const DEFAULT_MAX_ITEM_BYTES: usize = 512;

/// Stack size limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackLimits {
    pub max_total_bytes: usize,
    pub max_item_bytes: usize,
}

impl Default for StackLimits {
    fn default() -> Self {
        Self {
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            max_item_bytes: DEFAULT_MAX_ITEM_BYTES,
        }
    }
}

/// Operand stack for unlock script evaluation (top = last)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    items: Vec<Vec<u8>>,
    limits: StackLimits,
    used_bytes: usize,
}

impl Stack {
    /// Create an empty stack with the given limits
    pub fn new(max_total_bytes: usize, max_item_bytes: usize) -> Self {
        Self::with_limits(StackLimits {
            max_total_bytes,
            max_item_bytes,
        })
    }

    /// Create an empty stack from a [`StackLimits`]
    pub fn with_limits(limits: StackLimits) -> Self {
        Self {
            items: Vec::new(),
            limits,
            used_bytes: 0,
        }
    }

    pub fn limits(&self) -> StackLimits {
        self.limits
    }

    /// Bytes currently held
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Whether `item` fits under both limits
    pub fn can_push(&self, item: &[u8]) -> bool {
        item.len() <= self.limits.max_item_bytes
            && self
                .used_bytes
                .checked_add(item.len())
                .map_or(false, |total| total <= self.limits.max_total_bytes)
    }

    /// Push an item on top
    ///
    /// Fails with [`ScriptError::StackOverflow`] and leaves the stack
    /// unchanged when the item does not fit.
    pub fn push(&mut self, item: Vec<u8>) -> Result<(), ScriptError> {
        if !self.can_push(&item) {
            return Err(ScriptError::StackOverflow {
                item: item.len(),
                used: self.used_bytes,
                max_total: self.limits.max_total_bytes,
                max_item: self.limits.max_item_bytes,
            });
        }
        self.used_bytes += item.len();
        self.items.push(item);
        Ok(())
    }

    /// Remove and return the top item
    pub fn pop(&mut self) -> Result<Vec<u8>, ScriptError> {
        let item = self.items.pop().ok_or(ScriptError::StackUnderflow)?;
        self.used_bytes -= item.len();
        Ok(item)
    }

    /// Top item without removing it
    pub fn peek(&self) -> Result<&[u8], ScriptError> {
        self.items
            .last()
            .map(Vec::as_slice)
            .ok_or(ScriptError::StackUnderflow)
    }

    /// Number of items
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items from bottom to top
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.items.iter().map(Vec::as_slice)
    }

    /// An independent copy with the same limits and contents
    pub fn copy(&self) -> Stack {
        self.clone()
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::with_limits(StackLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_peek() {
        let mut s = Stack::new(16, 8);
        s.push(vec![1, 2, 3]).unwrap();
        s.push(vec![4, 5]).unwrap();
        assert_eq!(s.count(), 2);
        assert_eq!(s.used_bytes(), 5);
        assert_eq!(s.peek().unwrap(), &[4, 5]);
        assert_eq!(s.count(), 2);

        assert_eq!(s.pop().unwrap(), vec![4, 5]);
        assert_eq!(s.used_bytes(), 3);
        assert_eq!(s.pop().unwrap(), vec![1, 2, 3]);
        assert_eq!(s.used_bytes(), 0);
        assert!(s.is_empty());
    }

    #[test]
    fn test_underflow_does_not_mutate() {
        let mut s = Stack::default();
        assert_eq!(s.pop(), Err(ScriptError::StackUnderflow));
        assert_eq!(s.peek(), Err(ScriptError::StackUnderflow));
        assert_eq!(s.used_bytes(), 0);
        assert!(s.is_empty());
    }

    #[test]
    fn test_item_limit() {
        let mut s = Stack::new(100, 4);
        assert!(s.can_push(&[0; 4]));
        assert!(!s.can_push(&[0; 5]));
        assert!(matches!(
            s.push(vec![0; 5]),
            Err(ScriptError::StackOverflow { item: 5, .. })
        ));
        assert_eq!(s.count(), 0);
        assert_eq!(s.used_bytes(), 0);
    }

    #[test]
    fn test_total_limit_leaves_stack_unchanged() {
        let mut s = Stack::new(10, 8);
        s.push(vec![1; 6]).unwrap();
        s.push(vec![2; 4]).unwrap();
        assert_eq!(s.used_bytes(), 10);

        assert!(!s.can_push(&[3]));
        assert!(s.push(vec![3]).is_err());
        assert_eq!(s.count(), 2);
        assert_eq!(s.used_bytes(), 10);
        assert_eq!(s.peek().unwrap(), &[2; 4]);

        // Empty items always fit
        assert!(s.can_push(&[]));
    }

    #[test]
    fn test_copy_is_independent() {
        let mut original = Stack::new(64, 8);
        original.push(vec![1]).unwrap();
        original.push(vec![2, 2]).unwrap();

        let copy = original.copy();
        original.pop().unwrap();
        original.push(vec![9; 8]).unwrap();
        original.push(vec![7]).unwrap();

        assert_eq!(copy.count(), 2);
        assert_eq!(copy.used_bytes(), 3);
        assert_eq!(copy.limits(), original.limits());
        let items: Vec<&[u8]> = copy.iter().collect();
        assert_eq!(items, vec![&[1u8][..], &[2u8, 2][..]]);
    }
}
