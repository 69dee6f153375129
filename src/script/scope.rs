//! Conditional scope tracking for IF / ELSE / ENDIF
//!
//! Each entry is the condition of one open IF. Code executes only while
//! every open condition is true.

use super::ScriptError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeCondition {
    scopes: Vec<bool>,
}

impl ScopeCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// True when all open scopes are true (vacuously true when none are open)
    pub fn is_true(&self) -> bool {
        self.scopes.iter().all(|&cond| cond)
    }

    /// Enter a new scope (IF)
    pub fn push(&mut self, cond: bool) {
        self.scopes.push(cond);
    }

    /// Leave the innermost scope (ENDIF)
    pub fn pop(&mut self) -> Result<(), ScriptError> {
        self.scopes
            .pop()
            .map(|_| ())
            .ok_or(ScriptError::UnbalancedConditional("ENDIF"))
    }

    /// Switch the innermost scope to its other branch (ELSE)
    ///
    /// When an enclosing scope is false the toggle cannot change
    /// `is_true`, so it is applied unconditionally.
    pub fn try_toggle(&mut self) -> Result<(), ScriptError> {
        let top = self
            .scopes
            .last_mut()
            .ok_or(ScriptError::UnbalancedConditional("ELSE"))?;
        *top = !*top;
        Ok(())
    }
}
