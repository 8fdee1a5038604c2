//! Execution context carried through one pipeline run.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    Artifact, EventId, EventRegistry, Origin, TraceEntry, TraceStep, error::ContextError,
};

/// Dispatch state of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    #[default]
    Pending,
    BeforeHooksRunning,
    ProducerRunning,
    ProducerSkipped,
    AfterHooksRunning,
    ChildrenRunning,
    Complete,
    /// A hook or the producer of this event failed.
    Failed,
    /// An ancestor failed before this event started.
    Aborted,
    /// The run was cancelled before this event started.
    Cancelled,
}

impl EventState {
    /// True once the event can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Complete | Self::Failed | Self::Aborted | Self::Cancelled
        )
    }

    /// True once the producer stage has begun or been passed over.
    fn producer_stage_reached(&self) -> bool {
        matches!(
            self,
            Self::ProducerRunning
                | Self::ProducerSkipped
                | Self::AfterHooksRunning
                | Self::ChildrenRunning
                | Self::Complete
                | Self::Failed
        )
    }
}

/// The hook or producer currently running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub event: EventId,
    pub origin: Origin,
}

/// Mutable state of a single run.
///
/// One context exists per run. The dispatcher owns it and lends it to each
/// handler in turn, so every write is visible to all later handlers.
pub struct ExecutionContext {
    registry: Arc<EventRegistry>,
    payloads: IndexMap<EventId, Value>,
    skipped: IndexSet<EventId>,
    states: IndexMap<EventId, EventState>,
    candidates: Vec<Artifact>,
    next_seq: u64,
    active: Option<Invocation>,
    trace: Vec<TraceEntry>,
}

impl ExecutionContext {
    pub fn new(registry: Arc<EventRegistry>) -> Self {
        Self {
            registry,
            payloads: IndexMap::new(),
            skipped: IndexSet::new(),
            states: IndexMap::new(),
            candidates: Vec::new(),
            next_seq: 0,
            active: None,
            trace: Vec::new(),
        }
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    // Payloads

    /// Set the input payload of an event, replacing any previous value.
    pub fn set_payload(&mut self, event: impl Into<EventId>, value: Value) {
        self.payloads.insert(event.into(), value);
    }

    /// Serialize `value` into an event's payload.
    pub fn set_payload_from<T: Serialize>(
        &mut self,
        event: impl Into<EventId>,
        value: &T,
    ) -> Result<(), ContextError> {
        let event = event.into();
        let value = serde_json::to_value(value).map_err(|e| ContextError::InvalidPayload {
            event: event.clone(),
            message: e.to_string(),
        })?;
        self.payloads.insert(event, value);
        Ok(())
    }

    /// The payload set on exactly this event.
    pub fn get_payload(&self, event: &str) -> Result<&Value, ContextError> {
        self.payloads
            .get(event)
            .ok_or_else(|| ContextError::PayloadNotSet(event.into()))
    }

    pub fn payload_or<'a>(&'a self, event: &str, default: &'a Value) -> &'a Value {
        self.payloads.get(event).unwrap_or(default)
    }

    pub fn payload_mut(&mut self, event: &str) -> Option<&mut Value> {
        self.payloads.get_mut(event)
    }

    /// The nearest payload on the event or one of its ancestors.
    pub fn inherited_payload(&self, event: &str) -> Option<&Value> {
        if let Some(value) = self.payloads.get(event) {
            return Some(value);
        }
        self.registry
            .ancestors(event)
            .ok()?
            .into_iter()
            .find_map(|ancestor| self.payloads.get(ancestor))
    }

    /// Deserialize the payload set on exactly this event.
    pub fn payload_as<T: DeserializeOwned>(&self, event: &str) -> Result<T, ContextError> {
        let value = self.get_payload(event)?;
        T::deserialize(value).map_err(|e| ContextError::InvalidPayload {
            event: event.into(),
            message: e.to_string(),
        })
    }

    /// Deserialize the nearest payload on the event or one of its ancestors.
    pub fn inherited_payload_as<T: DeserializeOwned>(
        &self,
        event: &str,
    ) -> Result<T, ContextError> {
        let value = self
            .inherited_payload(event)
            .ok_or_else(|| ContextError::PayloadNotSet(event.into()))?;
        T::deserialize(value).map_err(|e| ContextError::InvalidPayload {
            event: event.into(),
            message: e.to_string(),
        })
    }

    // Skips

    /// Request that an event's producer does not run.
    ///
    /// Only valid from the event's own before-hooks. Calling it again from
    /// the same stage is a no-op.
    pub fn skip(&mut self, event: impl Into<EventId>) -> Result<(), ContextError> {
        let event = event.into();
        let state = self.state(event.as_str());

        if state.producer_stage_reached() {
            return Err(ContextError::LateSkip(event));
        }

        let is_active = self
            .active
            .as_ref()
            .is_some_and(|inv| inv.event == event);
        if state != EventState::BeforeHooksRunning || !is_active {
            let active = self
                .active
                .as_ref()
                .map(|inv| inv.event.to_string())
                .unwrap_or_else(|| "none".to_string());
            return Err(ContextError::SkipOutsideBeforeHooks { event, active });
        }

        self.skipped.insert(event);
        Ok(())
    }

    pub fn is_skipped(&self, event: &str) -> bool {
        self.skipped.contains(event)
    }

    // Artifacts

    /// Add an artifact candidate attributed to the running hook or producer.
    ///
    /// Returns the candidate's sequence number.
    pub fn emit(
        &mut self,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<u64, ContextError> {
        let path = path.into();
        let origin = match &self.active {
            Some(inv) => inv.origin.clone(),
            None => return Err(ContextError::NoActiveInvocation { path }),
        };
        self.emit_with_origin(path, content, origin)
    }

    /// Add a candidate with an explicit origin.
    pub fn emit_with_origin(
        &mut self,
        path: impl Into<String>,
        content: impl Into<String>,
        origin: Origin,
    ) -> Result<u64, ContextError> {
        let path = path.into();
        let Some(event) = self.active.as_ref().map(|inv| inv.event.clone()) else {
            return Err(ContextError::NoActiveInvocation { path });
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.candidates.push(Artifact {
            path,
            content: content.into(),
            origin,
            event,
            seq,
        });
        Ok(seq)
    }

    /// All candidates in emission order.
    pub fn candidates(&self) -> &[Artifact] {
        &self.candidates
    }

    pub fn candidates_for<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Artifact> {
        self.candidates.iter().filter(move |a| a.path == path)
    }

    /// The most recently emitted candidate for `path`.
    pub fn latest(&self, path: &str) -> Option<&Artifact> {
        self.candidates.iter().rev().find(|a| a.path == path)
    }

    // Dispatch state

    pub fn state(&self, event: &str) -> EventState {
        self.states.get(event).copied().unwrap_or_default()
    }

    pub fn states(&self) -> &IndexMap<EventId, EventState> {
        &self.states
    }

    pub fn active_event(&self) -> Option<&EventId> {
        self.active.as_ref().map(|inv| &inv.event)
    }

    pub fn active(&self) -> Option<&Invocation> {
        self.active.as_ref()
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    pub(crate) fn set_state(&mut self, event: &EventId, state: EventState) {
        self.states.insert(event.clone(), state);
    }

    pub(crate) fn record(&mut self, event: &EventId, step: TraceStep) {
        self.trace.push(TraceEntry {
            event: event.clone(),
            step,
        });
    }

    pub(crate) fn begin_invocation(&mut self, event: &EventId, origin: Origin) {
        self.active = Some(Invocation {
            event: event.clone(),
            origin,
        });
    }

    pub(crate) fn end_invocation(&mut self) {
        self.active = None;
    }

    pub(crate) fn into_parts(
        self,
    ) -> (Vec<Artifact>, IndexMap<EventId, EventState>, Vec<TraceEntry>) {
        (self.candidates, self.states, self.trace)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Phase;

    fn context() -> ExecutionContext {
        let mut registry = EventRegistry::new();
        registry
            .root("server")
            .unwrap()
            .child("service", "server")
            .unwrap()
            .child("service-base", "service")
            .unwrap();
        ExecutionContext::new(Arc::new(registry))
    }

    #[test]
    fn test_payload_not_set() {
        let ctx = context();
        assert_eq!(
            ctx.get_payload("service"),
            Err(ContextError::PayloadNotSet("service".into()))
        );
        let fallback = json!({});
        assert_eq!(ctx.payload_or("service", &fallback), &fallback);
    }

    #[test]
    fn test_inherited_payload_walks_ancestors() {
        let mut ctx = context();
        ctx.set_payload("server", json!({ "name": "tasks" }));
        assert_eq!(
            ctx.inherited_payload("service-base"),
            Some(&json!({ "name": "tasks" }))
        );

        ctx.set_payload("service", json!({ "name": "override" }));
        assert_eq!(
            ctx.inherited_payload("service-base"),
            Some(&json!({ "name": "override" }))
        );
    }

    #[test]
    fn test_typed_payloads() {
        #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
        struct Input {
            dir: String,
        }

        let mut ctx = context();
        ctx.set_payload_from("service", &Input { dir: "src".into() })
            .unwrap();
        assert_eq!(
            ctx.payload_as::<Input>("service").unwrap(),
            Input { dir: "src".into() }
        );

        ctx.set_payload("server", json!(42));
        assert!(matches!(
            ctx.payload_as::<Input>("server"),
            Err(ContextError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_emit_requires_active_invocation() {
        let mut ctx = context();
        assert!(matches!(
            ctx.emit("a.ts", ""),
            Err(ContextError::NoActiveInvocation { .. })
        ));
    }

    #[test]
    fn test_emit_assigns_increasing_sequence() {
        let mut ctx = context();
        let event = EventId::from("service");
        ctx.begin_invocation(&event, Origin::Base);
        assert_eq!(ctx.emit("a.ts", "one").unwrap(), 0);
        ctx.begin_invocation(&event, Origin::plugin("p", Phase::After));
        assert_eq!(ctx.emit("a.ts", "two").unwrap(), 1);

        assert_eq!(ctx.candidates_for("a.ts").count(), 2);
        let latest = ctx.latest("a.ts").unwrap();
        assert_eq!(latest.content, "two");
        assert_eq!(latest.origin, Origin::plugin("p", Phase::After));
    }

    #[test]
    fn test_skip_rules() {
        let mut ctx = context();
        let service = EventId::from("service");

        // still pending
        assert!(matches!(
            ctx.skip("service"),
            Err(ContextError::SkipOutsideBeforeHooks { .. })
        ));

        ctx.set_state(&service, EventState::BeforeHooksRunning);
        ctx.begin_invocation(&service, Origin::plugin("p", Phase::Before));
        ctx.skip("service").unwrap();
        ctx.skip("service").unwrap();
        assert!(ctx.is_skipped("service"));

        ctx.set_state(&service, EventState::ProducerSkipped);
        assert_eq!(
            ctx.skip("service"),
            Err(ContextError::LateSkip("service".into()))
        );
    }
}
