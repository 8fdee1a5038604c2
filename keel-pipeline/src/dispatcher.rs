//! Depth-first event dispatch.

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, error, warn};

use crate::{
    CancelHandle, EventId, EventRegistry, EventState, ExecutionContext, Handler, Origin, Phase,
    PluginHost, TraceStep, error::HookExecutionError,
};

enum Work {
    Enter(EventId),
    Finish(EventId),
}

/// What a dispatch pass observed.
#[derive(Debug, Default)]
pub(crate) struct DispatchSummary {
    pub failures: Vec<HookExecutionError>,
    pub cancelled: bool,
}

/// Walks the event tree, running each event's hooks and producer.
///
/// For every event: before-hooks, then the replacement or base producer
/// unless a before-hook skipped it, then after-hooks, then each child's
/// subtree in declared order. Handlers run one at a time.
pub(crate) struct Dispatcher<'a> {
    pub registry: &'a EventRegistry,
    pub host: &'a PluginHost,
    pub producers: &'a HashMap<EventId, Arc<dyn Handler>>,
    pub cancel: &'a CancelHandle,
}

impl Dispatcher<'_> {
    pub async fn dispatch(
        &self,
        ctx: &mut ExecutionContext,
        roots: &[EventId],
    ) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let mut stack: Vec<Work> = roots.iter().rev().cloned().map(Work::Enter).collect();

        while let Some(work) = stack.pop() {
            match work {
                Work::Enter(event) => {
                    if self.cancel.is_cancelled() {
                        if !summary.cancelled {
                            warn!(%event, "run cancelled");
                            summary.cancelled = true;
                        }
                        self.mark_subtree(
                            ctx,
                            &event,
                            EventState::Cancelled,
                            TraceStep::Cancelled,
                        );
                        continue;
                    }

                    match self.run_event(ctx, &event).await {
                        Ok(()) => {
                            ctx.set_state(&event, EventState::ChildrenRunning);
                            stack.push(Work::Finish(event.clone()));
                            if let Ok(children) = self.registry.children_of(event.as_str()) {
                                stack.extend(children.iter().rev().cloned().map(Work::Enter));
                            }
                        }
                        Err(err) => {
                            error!(
                                event = %err.event,
                                origin = %err.origin,
                                error = %err.error,
                                "hook failed"
                            );
                            ctx.set_state(&event, EventState::Failed);
                            ctx.record(&event, TraceStep::Failed);
                            if let Ok(descendants) = self.registry.descendants(event.as_str()) {
                                for descendant in descendants {
                                    ctx.set_state(descendant, EventState::Aborted);
                                    ctx.record(descendant, TraceStep::Aborted);
                                }
                            }
                            summary.failures.push(err);
                        }
                    }
                }
                Work::Finish(event) => {
                    ctx.set_state(&event, EventState::Complete);
                    ctx.record(&event, TraceStep::Completed);
                    debug!(%event, "event finished");
                }
            }
        }

        summary
    }

    async fn run_event(
        &self,
        ctx: &mut ExecutionContext,
        event: &EventId,
    ) -> Result<(), HookExecutionError> {
        debug!(%event, "event started");
        ctx.set_state(event, EventState::BeforeHooksRunning);
        ctx.record(event, TraceStep::Started);

        for reg in self.host.handlers_for(event.as_str(), Phase::Before) {
            ctx.record(event, TraceStep::Before { plugin: reg.plugin.clone() });
            let origin = Origin::plugin(&reg.plugin, Phase::Before);
            invoke(ctx, event, origin, reg.handler.as_ref()).await?;
        }

        if ctx.is_skipped(event.as_str()) {
            debug!(%event, "producer skipped");
            ctx.set_state(event, EventState::ProducerSkipped);
            ctx.record(event, TraceStep::Skipped);
        } else if let Some(reg) = self.host.replacement_for(event.as_str()) {
            debug!(%event, plugin = %reg.plugin, "producer replaced");
            ctx.set_state(event, EventState::ProducerRunning);
            ctx.record(event, TraceStep::Replace { plugin: reg.plugin.clone() });
            let origin = Origin::plugin(&reg.plugin, Phase::Replace);
            invoke(ctx, event, origin, reg.handler.as_ref()).await?;
        } else {
            ctx.set_state(event, EventState::ProducerRunning);
            if let Some(producer) = self.producers.get(event) {
                ctx.record(event, TraceStep::Producer);
                invoke(ctx, event, Origin::Base, producer.as_ref()).await?;
            }
        }

        ctx.set_state(event, EventState::AfterHooksRunning);
        for reg in self.host.handlers_for(event.as_str(), Phase::After) {
            ctx.record(event, TraceStep::After { plugin: reg.plugin.clone() });
            let origin = Origin::plugin(&reg.plugin, Phase::After);
            invoke(ctx, event, origin, reg.handler.as_ref()).await?;
        }

        Ok(())
    }

    fn mark_subtree(
        &self,
        ctx: &mut ExecutionContext,
        event: &EventId,
        state: EventState,
        step: TraceStep,
    ) {
        ctx.set_state(event, state);
        ctx.record(event, step.clone());
        if let Ok(descendants) = self.registry.descendants(event.as_str()) {
            for descendant in descendants {
                ctx.set_state(descendant, state);
                ctx.record(descendant, step.clone());
            }
        }
    }
}

async fn invoke(
    ctx: &mut ExecutionContext,
    event: &EventId,
    origin: Origin,
    handler: &dyn Handler,
) -> Result<(), HookExecutionError> {
    ctx.begin_invocation(event, origin.clone());
    let result = handler.invoke(ctx).await;
    ctx.end_invocation();
    result.map_err(|error| HookExecutionError {
        event: event.clone(),
        origin,
        error,
    })
}
