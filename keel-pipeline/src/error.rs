//! Error taxonomy of the generation pipeline.

use thiserror::Error;

use crate::{EventId, Origin};

/// Result type for pipeline operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while building the event registry. Fatal: they abort before
/// any run starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("event '{0}' is already registered")]
    DuplicateEvent(EventId),

    #[error("unknown event '{0}'")]
    UnknownEvent(EventId),

    #[error("event '{event}' names parent '{parent}', which is not registered")]
    DanglingParent { event: EventId, parent: EventId },

    #[error("registering '{event}' under '{parent}' would create a cycle")]
    Cycle { event: EventId, parent: EventId },

    #[error("root '{root}' is already dispatched as part of root '{covering}'")]
    OverlappingRoot { root: EventId, covering: EventId },
}

/// Errors raised while plugins subscribe. Fatal at subscribe time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscribeError {
    #[error(
        "plugin '{second}' cannot replace '{event}': plugin '{first}' already replaces it"
    )]
    ConflictingReplace {
        event: EventId,
        first: String,
        second: String,
    },

    #[error("plugin '{plugin}' subscribed to unknown event '{event}'")]
    UnknownEvent { plugin: String, event: EventId },
}

/// Misuse of the execution context by a hook or producer.
///
/// These are programming errors in a plugin and are never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("no payload set for event '{0}'")]
    PayloadNotSet(EventId),

    #[error("cannot skip '{0}': its producer stage has already started")]
    LateSkip(EventId),

    #[error("'{event}' can only be skipped from its own before-hooks (active: {active})")]
    SkipOutsideBeforeHooks { event: EventId, active: String },

    #[error("cannot emit '{path}': no hook or producer is running")]
    NoActiveInvocation { path: String },

    #[error("payload of '{event}' does not have the expected shape: {message}")]
    InvalidPayload { event: EventId, message: String },
}

/// A hook or producer failed. Recorded in the run report; the originating
/// event's subtree is abandoned while sibling events continue.
#[derive(Debug, Error)]
#[error("{origin} failed on '{event}': {error}")]
pub struct HookExecutionError {
    pub event: EventId,
    pub origin: Origin,
    pub error: eyre::Report,
}

impl HookExecutionError {
    /// The context misuse behind this failure, if that is what it was.
    pub fn context_error(&self) -> Option<&ContextError> {
        self.error.downcast_ref::<ContextError>()
    }
}

/// Internal invariant violations found while merging candidates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("ambiguous artifact candidates for: {}", paths.join(", "))]
    AmbiguousArtifact { paths: Vec<String> },
}

/// Any error surfaced by the pipeline API.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Subscribe(#[from] SubscribeError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Merge(#[from] MergeError),
}
