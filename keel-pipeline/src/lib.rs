//! Plugin event pipeline for the keel application generator.
//!
//! A run fires a tree of named events. Each event has an optional base
//! producer and any number of plugin hooks:
//!
//! - before-hooks run first and may [`skip`](ExecutionContext::skip) the
//!   producer
//! - a replace hook runs instead of the producer
//! - after-hooks run last, then the event's children, depth-first
//!
//! Every hook and producer writes artifact candidates into one shared
//! [`ExecutionContext`]. When dispatch ends, the [`ArtifactMerger`] picks one
//! artifact per path.
//!
//! # Example
//!
//! ```ignore
//! use keel_pipeline::{Pipeline, RunRequest, catalog, handler_fn};
//!
//! let pipeline = Pipeline::new(catalog::standard()?).producer(
//!     catalog::CREATE_ENTITY_SERVICE,
//!     handler_fn(|ctx| {
//!         ctx.emit("src/task/task.service.ts", "export class TaskService {}")?;
//!         Ok(())
//!     }),
//! )?;
//!
//! let outcome = pipeline.run(RunRequest::new()).await?;
//! assert!(outcome.report.is_clean());
//! ```

mod artifact;
pub mod catalog;
mod context;
mod dispatcher;
pub mod error;
mod event;
mod handler;
mod host;
mod merger;
mod phase;
mod plugin;
mod registry;
mod runner;
mod snapshot;
mod trace;

pub use artifact::{Artifact, ArtifactSet, Origin};
pub use context::{EventState, ExecutionContext, Invocation};
pub use error::{Error, Result};
pub use event::{EventDefinition, EventId};
pub use handler::{FnHandler, Handler, handler_fn};
pub use host::{PluginHost, Registration, SubscriptionHandle};
pub use merger::ArtifactMerger;
pub use phase::Phase;
pub use plugin::{Hooks, Plugin};
pub use registry::{EventRegistry, TreeDisplay};
pub use runner::{CancelHandle, Pipeline, RunOutcome, RunReport, RunRequest};
pub use snapshot::{EventSnapshot, SnapshotPlugin};
pub use trace::{TraceEntry, TraceStep};
