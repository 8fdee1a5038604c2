//! Pipeline orchestrator.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    ArtifactMerger, ArtifactSet, EventId, EventRegistry, EventState, ExecutionContext, Handler,
    Plugin, PluginHost, TraceEntry,
    dispatcher::Dispatcher,
    error::{HookExecutionError, RegistryError, Result, SubscribeError},
};

/// Cooperative cancellation for a run.
///
/// Checked before each event starts. Events already finished keep their
/// artifacts; events not yet started end up [`EventState::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Inputs of a single run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    roots: Vec<EventId>,
    payloads: IndexMap<EventId, Value>,
    cancel: CancelHandle,
}

impl RunRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root to dispatch. Without any, every registry root runs in
    /// registration order.
    pub fn root(mut self, event: impl Into<EventId>) -> Self {
        self.roots.push(event.into());
        self
    }

    /// Seed an event's payload before dispatch starts.
    pub fn payload(mut self, event: impl Into<EventId>, value: Value) -> Self {
        self.payloads.insert(event.into(), value);
        self
    }

    pub fn cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }
}

/// What happened during a run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Final state of every event the run touched.
    pub states: IndexMap<EventId, EventState>,
    pub failures: Vec<HookExecutionError>,
    pub trace: Vec<TraceEntry>,
    pub cancelled: bool,
}

impl RunReport {
    /// True when nothing failed and the run was not cancelled.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    pub fn state(&self, event: &str) -> EventState {
        self.states.get(event).copied().unwrap_or_default()
    }

    pub fn count(&self, state: EventState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }
}

/// Result of a run that reached the merge stage.
#[derive(Debug)]
pub struct RunOutcome {
    pub artifacts: ArtifactSet,
    pub report: RunReport,
}

/// The generation pipeline: an event registry, the base producers, and the
/// installed plugins.
///
/// # Example
///
/// ```ignore
/// let pipeline = Pipeline::new(catalog::standard()?)
///     .producer(CREATE_ENTITY_SERVICE, ServiceProducer)?
///     .plugin(&GraphqlOnly)?;
///
/// let outcome = pipeline.run(RunRequest::new()).await?;
/// for artifact in &outcome.artifacts {
///     println!("{}", artifact.path);
/// }
/// ```
pub struct Pipeline {
    registry: Arc<EventRegistry>,
    host: PluginHost,
    producers: HashMap<EventId, Arc<dyn Handler>>,
}

impl Pipeline {
    /// Freeze `registry` and build an empty pipeline over it.
    pub fn new(registry: EventRegistry) -> Self {
        let registry = Arc::new(registry);
        Self {
            host: PluginHost::new(registry.clone()),
            registry,
            producers: HashMap::new(),
        }
    }

    /// Set the base producer of an event, replacing any previous one.
    pub fn producer(
        mut self,
        event: impl Into<EventId>,
        handler: impl Handler + 'static,
    ) -> Result<Self, RegistryError> {
        self.set_producer(event, Arc::new(handler))?;
        Ok(self)
    }

    pub fn set_producer(
        &mut self,
        event: impl Into<EventId>,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RegistryError> {
        let event = event.into();
        if !self.registry.contains(event.as_str()) {
            return Err(RegistryError::UnknownEvent(event));
        }
        self.producers.insert(event, handler);
        Ok(())
    }

    /// Install a plugin. Plugins installed earlier run first within a phase.
    pub fn install(&mut self, plugin: &dyn Plugin) -> Result<(), SubscribeError> {
        self.host.install(plugin)
    }

    pub fn plugin(mut self, plugin: &dyn Plugin) -> Result<Self, SubscribeError> {
        self.install(plugin)?;
        Ok(self)
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn host(&self) -> &PluginHost {
        &self.host
    }

    pub fn has_producer(&self, event: &str) -> bool {
        self.producers.contains_key(event)
    }

    /// Dispatch the requested roots and merge the candidates.
    ///
    /// Hook failures do not fail the run; they are collected in the
    /// report.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnknownEvent`] for an unknown root or payload event
    /// - [`RegistryError::OverlappingRoot`] if a root repeats or lies inside
    ///   another root's subtree
    /// - [`MergeError::AmbiguousArtifact`](crate::error::MergeError) if two
    ///   candidates cannot be ordered
    pub async fn run(&self, request: RunRequest) -> Result<RunOutcome> {
        let RunRequest {
            roots,
            payloads,
            cancel,
        } = request;

        let roots: Vec<EventId> = if roots.is_empty() {
            self.registry.roots().into_iter().cloned().collect()
        } else {
            roots
        };
        for event in roots.iter().chain(payloads.keys()) {
            if !self.registry.contains(event.as_str()) {
                return Err(RegistryError::UnknownEvent(event.clone()).into());
            }
        }
        for (i, root) in roots.iter().enumerate() {
            for earlier in &roots[..i] {
                let overlap = if self.registry.is_ancestor_or_self(earlier.as_str(), root.as_str())
                {
                    Some((root, earlier))
                } else if self.registry.is_ancestor(root.as_str(), earlier.as_str()) {
                    Some((earlier, root))
                } else {
                    None
                };
                if let Some((root, covering)) = overlap {
                    return Err(RegistryError::OverlappingRoot {
                        root: root.clone(),
                        covering: covering.clone(),
                    }
                    .into());
                }
            }
        }

        let mut ctx = ExecutionContext::new(self.registry.clone());
        for (event, value) in payloads {
            ctx.set_payload(event, value);
        }

        info!(
            roots = roots.len(),
            plugins = self.host.plugins().len(),
            "run started"
        );

        let dispatcher = Dispatcher {
            registry: &self.registry,
            host: &self.host,
            producers: &self.producers,
            cancel: &cancel,
        };
        let summary = dispatcher.dispatch(&mut ctx, &roots).await;

        let (candidates, states, trace) = ctx.into_parts();
        let candidate_count = candidates.len();
        let artifacts = ArtifactMerger::new(&self.registry).merge(candidates)?;

        let report = RunReport {
            states,
            failures: summary.failures,
            trace,
            cancelled: summary.cancelled,
        };

        if report.is_clean() {
            info!(
                artifacts = artifacts.len(),
                candidates = candidate_count,
                "run finished"
            );
        } else {
            warn!(
                artifacts = artifacts.len(),
                failures = report.failures.len(),
                aborted = report.count(EventState::Aborted),
                cancelled = report.cancelled,
                "run finished with problems"
            );
        }

        Ok(RunOutcome { artifacts, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler_fn;

    fn registry() -> EventRegistry {
        let mut registry = EventRegistry::new();
        registry.root("server").unwrap().child("service", "server").unwrap();
        registry
    }

    #[tokio::test]
    async fn test_unknown_root() {
        let pipeline = Pipeline::new(registry());
        let err = pipeline
            .run(RunRequest::new().root("nowhere"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Registry(RegistryError::UnknownEvent(_))
        ));
    }

    #[test]
    fn test_producer_for_unknown_event() {
        let result = Pipeline::new(registry()).producer("nowhere", handler_fn(|_| Ok(())));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_seed_payload_is_visible() {
        let pipeline = Pipeline::new(registry())
            .producer(
                "service",
                handler_fn(|ctx| {
                    let name = ctx.inherited_payload("service").cloned().unwrap_or_default();
                    ctx.emit("name.txt", name.to_string())?;
                    Ok(())
                }),
            )
            .unwrap();

        let outcome = pipeline
            .run(RunRequest::new().payload("server", serde_json::json!("tasks")))
            .await
            .unwrap();
        assert!(outcome.report.is_clean());
        assert_eq!(outcome.artifacts.content("name.txt"), Some("\"tasks\""));
    }

    #[test]
    fn test_cancel_handle_is_shared() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        clone.cancel();
        assert!(handle.is_cancelled());
    }
}
