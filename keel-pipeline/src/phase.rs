//! Hook phases.

use std::fmt;

use serde::Serialize;

/// When a plugin handler runs relative to an event's base producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Runs before the base producer; the only phase that may skip it.
    Before,
    /// Runs after the base producer (or its replacement).
    After,
    /// Runs instead of the base producer. At most one per event.
    Replace,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Replace => "replace",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
