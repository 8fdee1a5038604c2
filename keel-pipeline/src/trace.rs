//! Run trace: every dispatch step, in the order it happened.

use std::fmt;

use serde::Serialize;

use crate::EventId;

/// One dispatch step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum TraceStep {
    Started,
    Before { plugin: String },
    Producer,
    Replace { plugin: String },
    Skipped,
    After { plugin: String },
    Completed,
    Failed,
    Aborted,
    Cancelled,
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => f.write_str("started"),
            Self::Before { plugin } => write!(f, "before:{plugin}"),
            Self::Producer => f.write_str("producer"),
            Self::Replace { plugin } => write!(f, "replace:{plugin}"),
            Self::Skipped => f.write_str("skipped"),
            Self::After { plugin } => write!(f, "after:{plugin}"),
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
            Self::Aborted => f.write_str("aborted"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub event: EventId,
    #[serde(flatten)]
    pub step: TraceStep,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.event, self.step)
    }
}
