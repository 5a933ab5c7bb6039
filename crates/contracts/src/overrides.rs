//! Override<T> - coach decision layered over an automated value.
//!
//! The original is set once from the first normalized response and is never
//! mutated afterward; the override is reversible and clears itself when the
//! coach picks the original value again.

use serde::{Deserialize, Serialize};

/// An automated value plus an optional coach override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Override<T> {
    /// Value as returned by the scoring collaborator (audit trail)
    pub original: T,

    /// Explicit coach decision, None when no override is in effect
    #[serde(rename = "override")]
    pub value: Option<T>,
}

impl<T: Clone + PartialEq> Override<T> {
    pub fn new(original: T) -> Self {
        Self {
            original,
            value: None,
        }
    }

    /// The value everything downstream must use.
    pub fn effective(&self) -> &T {
        self.value.as_ref().unwrap_or(&self.original)
    }

    /// Apply a coach decision. Choosing the original value clears the
    /// override instead of recording a redundant one.
    pub fn set(&mut self, value: T) {
        if value == self.original {
            self.value = None;
        } else {
            self.value = Some(value);
        }
    }

    /// Drop the override, restoring the original.
    pub fn clear(&mut self) {
        self.value = None;
    }

    pub fn is_overridden(&self) -> bool {
        self.value.is_some()
    }
}
