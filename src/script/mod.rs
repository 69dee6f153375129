//! Script primitives
//!
//! - Locking conditions on outputs and the unlock proofs that satisfy them
//! - The byte-bounded operand stack used while evaluating unlock scripts
//! - The scope tracker for nested IF / ELSE / ENDIF execution

pub mod lock;
pub mod scope;
pub mod stack;

use thiserror::Error;

pub use lock::{Lock, LockType, Unlock};
pub use scope::ScopeCondition;
pub use stack::{Stack, StackLimits, DEFAULT_MAX_ITEM_BYTES, DEFAULT_MAX_TOTAL_BYTES};

/// Script evaluation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Stack overflow: cannot push {item} bytes ({used}/{max_total} used, item limit {max_item})")]
    StackOverflow {
        item: usize,
        used: usize,
        max_total: usize,
        max_item: usize,
    },
    #[error("Stack underflow")]
    StackUnderflow,
    #[error("Unbalanced conditional: {0} without a matching IF")]
    UnbalancedConditional(&'static str),
    #[error("Unknown lock type: {0}")]
    UnknownLockType(u8),
}
