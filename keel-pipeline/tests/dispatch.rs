//! Dispatch order, skip and replace semantics, failure handling.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use keel_pipeline::{
    CancelHandle, EventRegistry, EventState, ExecutionContext, Handler, Hooks, Origin, Phase,
    Pipeline, Plugin, RunRequest, TraceStep, catalog,
    error::{ContextError, RegistryError, SubscribeError},
    handler_fn,
};
use parking_lot::Mutex;
use serde_json::json;

fn registry() -> EventRegistry {
    let mut registry = EventRegistry::new();
    registry
        .root("server")
        .unwrap()
        .child("service", "server")
        .unwrap()
        .child("service-base", "service")
        .unwrap()
        .child("controller", "server")
        .unwrap()
        .child("controller-base", "controller")
        .unwrap()
        .child("resolver", "server")
        .unwrap();
    registry
}

/// A producer that emits `<event>.ts` containing the event name.
fn emit_self() -> impl Handler {
    handler_fn(|ctx| {
        let event = ctx.active_event().cloned().unwrap();
        ctx.emit(format!("{event}.ts"), event.to_string())?;
        Ok(())
    })
}

fn pipeline_with_producers() -> Pipeline {
    let registry = registry();
    let events: Vec<String> = registry.iter().map(|d| d.id().to_string()).collect();
    let mut pipeline = Pipeline::new(registry);
    for event in events {
        pipeline.set_producer(event, Arc::new(emit_self())).unwrap();
    }
    pipeline
}

/// A plugin assembled from closures over `Hooks`.
struct TestPlugin<F> {
    name: &'static str,
    subscribe: F,
}

impl<F> Plugin for TestPlugin<F>
where
    F: Fn(&mut Hooks<'_>) -> Result<(), SubscribeError> + Send + Sync,
{
    fn name(&self) -> &str {
        self.name
    }

    fn subscribe(&self, hooks: &mut Hooks<'_>) -> Result<(), SubscribeError> {
        (self.subscribe)(hooks)
    }
}

fn plugin<F>(name: &'static str, subscribe: F) -> TestPlugin<F>
where
    F: Fn(&mut Hooks<'_>) -> Result<(), SubscribeError> + Send + Sync,
{
    TestPlugin { name, subscribe }
}

fn started(trace: &[keel_pipeline::TraceEntry]) -> Vec<&str> {
    trace
        .iter()
        .filter(|e| e.step == TraceStep::Started)
        .map(|e| e.event.as_str())
        .collect()
}

#[tokio::test]
async fn test_trace_is_depth_first() {
    let pipeline = pipeline_with_producers();
    let outcome = pipeline.run(RunRequest::new()).await.unwrap();

    assert_eq!(
        started(&outcome.report.trace),
        vec![
            "server",
            "service",
            "service-base",
            "controller",
            "controller-base",
            "resolver"
        ]
    );

    // each subtree finishes before the next sibling starts
    let position = |event: &str, step: TraceStep| {
        outcome
            .report
            .trace
            .iter()
            .position(|e| e.event == event && e.step == step)
            .unwrap()
    };
    assert!(
        position("service", TraceStep::Completed) < position("controller", TraceStep::Started)
    );
    assert!(
        position("service-base", TraceStep::Completed) < position("service", TraceStep::Completed)
    );
    assert!(position("resolver", TraceStep::Completed) < position("server", TraceStep::Completed));
}

#[tokio::test]
async fn test_stages_within_an_event() {
    let pipeline = pipeline_with_producers()
        .plugin(&plugin("p", |hooks| {
            hooks.after("service", handler_fn(|_| Ok(())))?;
            hooks.before("service", handler_fn(|_| Ok(())))?;
            Ok(())
        }))
        .unwrap();
    let outcome = pipeline.run(RunRequest::new().root("service")).await.unwrap();

    let steps: Vec<String> = outcome
        .report
        .trace
        .iter()
        .filter(|e| e.event == "service")
        .map(|e| e.step.to_string())
        .collect();
    assert_eq!(
        steps,
        vec!["started", "before:p", "producer", "after:p", "completed"]
    );
}

#[tokio::test]
async fn test_after_hooks_finish_before_first_child() {
    let pipeline = pipeline_with_producers()
        .plugin(&plugin("p", |hooks| {
            hooks.after("service", handler_fn(|_| Ok(())))?;
            Ok(())
        }))
        .unwrap();
    let outcome = pipeline.run(RunRequest::new()).await.unwrap();

    let trace = &outcome.report.trace;
    let after = trace
        .iter()
        .position(|e| e.event == "service" && e.step == TraceStep::After { plugin: "p".into() })
        .unwrap();
    let child = trace
        .iter()
        .position(|e| e.event == "service-base" && e.step == TraceStep::Started)
        .unwrap();
    assert!(after < child);
}

#[tokio::test]
async fn test_overlapping_roots_are_rejected() {
    let runs = Arc::new(Mutex::new(0));
    let counter = runs.clone();
    let pipeline = Pipeline::new(registry())
        .producer(
            "service",
            handler_fn(move |_| {
                *counter.lock() += 1;
                Ok(())
            }),
        )
        .unwrap();

    let nested = pipeline
        .run(RunRequest::new().root("server").root("service"))
        .await
        .unwrap_err();
    assert!(matches!(
        nested,
        keel_pipeline::Error::Registry(RegistryError::OverlappingRoot { ref root, ref covering })
            if root == "service" && covering == "server"
    ));

    let parent_second = pipeline
        .run(RunRequest::new().root("service-base").root("service"))
        .await
        .unwrap_err();
    assert!(matches!(
        parent_second,
        keel_pipeline::Error::Registry(RegistryError::OverlappingRoot { ref root, ref covering })
            if root == "service-base" && covering == "service"
    ));

    let repeated = pipeline
        .run(RunRequest::new().root("server").root("server"))
        .await
        .unwrap_err();
    assert!(matches!(
        repeated,
        keel_pipeline::Error::Registry(RegistryError::OverlappingRoot { ref root, .. })
            if root == "server"
    ));
    assert_eq!(*runs.lock(), 0);

    let outcome = pipeline
        .run(RunRequest::new().root("service").root("controller"))
        .await
        .unwrap();
    assert_eq!(
        started(&outcome.report.trace),
        vec!["service", "service-base", "controller", "controller-base"]
    );
    assert_eq!(*runs.lock(), 1);
}

#[tokio::test]
async fn test_roots_run_in_caller_order() {
    let mut registry = EventRegistry::new();
    registry.root("a").unwrap().root("b").unwrap();
    let pipeline = Pipeline::new(registry);

    let outcome = pipeline
        .run(RunRequest::new().root("b").root("a"))
        .await
        .unwrap();
    assert_eq!(started(&outcome.report.trace), vec!["b", "a"]);
}

#[tokio::test]
async fn test_runs_are_deterministic() {
    let pipeline = pipeline_with_producers()
        .plugin(&plugin("extra", |hooks| {
            hooks.after(
                "service",
                handler_fn(|ctx| {
                    ctx.emit("service.ts", "patched")?;
                    ctx.emit("extra.ts", "extra")?;
                    Ok(())
                }),
            )?;
            Ok(())
        }))
        .unwrap();

    let first = pipeline.run(RunRequest::new()).await.unwrap();
    let second = pipeline.run(RunRequest::new()).await.unwrap();

    assert_eq!(first.artifacts, second.artifacts);
    assert_eq!(first.report.trace, second.report.trace);
    assert_eq!(first.artifacts.content("service.ts"), Some("patched"));
}

#[tokio::test]
async fn test_before_hook_writes_are_visible_to_the_producer() {
    let pipeline = Pipeline::new(registry())
        .producer(
            "service",
            handler_fn(|ctx| {
                let name = ctx.get_payload("service")?["name"].as_str().unwrap_or("?").to_string();
                ctx.emit(format!("{name}.service.ts"), "")?;
                Ok(())
            }),
        )
        .unwrap()
        .plugin(&plugin("rename", |hooks| {
            hooks.before(
                "service",
                handler_fn(|ctx| {
                    ctx.set_payload("service", json!({ "name": "task" }));
                    Ok(())
                }),
            )?;
            Ok(())
        }))
        .unwrap();

    let outcome = pipeline.run(RunRequest::new()).await.unwrap();
    assert!(outcome.artifacts.contains("task.service.ts"));
}

#[tokio::test]
async fn test_skip_suppresses_producer_and_replacement() {
    let pipeline = pipeline_with_producers()
        .plugin(&plugin("skipper", |hooks| {
            hooks.before(
                "service",
                handler_fn(|ctx| {
                    ctx.skip("service")?;
                    assert!(ctx.is_skipped("service"));
                    Ok(())
                }),
            )?;
            Ok(())
        }))
        .unwrap()
        .plugin(&plugin("replacer", |hooks| {
            hooks.replace(
                "service",
                handler_fn(|ctx| {
                    ctx.emit("service.ts", "replaced")?;
                    Ok(())
                }),
            )?;
            Ok(())
        }))
        .unwrap();

    let outcome = pipeline.run(RunRequest::new()).await.unwrap();
    assert!(outcome.report.is_clean());
    assert!(!outcome.artifacts.contains("service.ts"));
    // children still run
    assert!(outcome.artifacts.contains("service-base.ts"));
    assert!(
        outcome
            .report
            .trace
            .iter()
            .any(|e| e.event == "service" && e.step == TraceStep::Skipped)
    );
}

#[tokio::test]
async fn test_skip_after_producer_is_late() {
    let pipeline = pipeline_with_producers()
        .plugin(&plugin("late", |hooks| {
            hooks.after(
                "service",
                handler_fn(|ctx| {
                    ctx.skip("service")?;
                    Ok(())
                }),
            )?;
            Ok(())
        }))
        .unwrap();

    let outcome = pipeline.run(RunRequest::new()).await.unwrap();
    let failure = &outcome.report.failures[0];
    assert_eq!(
        failure.context_error(),
        Some(&ContextError::LateSkip("service".into()))
    );
    assert_eq!(failure.origin, Origin::plugin("late", Phase::After));
    // the producer already ran and its output is kept
    assert!(outcome.artifacts.contains("service.ts"));
}

#[tokio::test]
async fn test_skip_of_another_event_is_rejected() {
    let pipeline = pipeline_with_producers()
        .plugin(&plugin("eager", |hooks| {
            hooks.before(
                "service",
                handler_fn(|ctx| {
                    ctx.skip("controller")?;
                    Ok(())
                }),
            )?;
            Ok(())
        }))
        .unwrap();

    let outcome = pipeline.run(RunRequest::new()).await.unwrap();
    assert!(matches!(
        outcome.report.failures[0].context_error(),
        Some(ContextError::SkipOutsideBeforeHooks { .. })
    ));
    assert!(outcome.artifacts.contains("controller.ts"));
}

#[test]
fn test_conflicting_replace() {
    let replacer = |name| {
        plugin(name, |hooks| {
            hooks.replace("service", handler_fn(|_| Ok(())))?;
            Ok(())
        })
    };

    let mut pipeline = Pipeline::new(registry());
    pipeline.install(&replacer("first")).unwrap();
    let err = pipeline.install(&replacer("second")).unwrap_err();
    assert_eq!(
        err,
        SubscribeError::ConflictingReplace {
            event: "service".into(),
            first: "first".into(),
            second: "second".into(),
        }
    );
}

#[tokio::test]
async fn test_ancestor_replace_outranks_descendant_base() {
    let pipeline = Pipeline::new(registry())
        .producer(
            "service-base",
            handler_fn(|ctx| {
                ctx.emit("service.ts", "base")?;
                Ok(())
            }),
        )
        .unwrap()
        .plugin(&plugin("replacer", |hooks| {
            hooks.replace(
                "service",
                handler_fn(|ctx| {
                    ctx.emit("service.ts", "replaced")?;
                    Ok(())
                }),
            )?;
            Ok(())
        }))
        .unwrap();

    let outcome = pipeline.run(RunRequest::new()).await.unwrap();
    let artifact = outcome.artifacts.get("service.ts").unwrap();
    assert_eq!(artifact.content, "replaced");
    assert_eq!(artifact.origin, Origin::plugin("replacer", Phase::Replace));
}

#[tokio::test]
async fn test_failure_aborts_subtree_only() {
    let pipeline = pipeline_with_producers()
        .producer(
            "service",
            handler_fn(|ctx| {
                ctx.emit("partial.ts", "kept")?;
                eyre::bail!("template exploded")
            }),
        )
        .unwrap();

    let outcome = pipeline.run(RunRequest::new()).await.unwrap();
    let report = &outcome.report;

    assert!(!report.is_clean());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].origin, Origin::Base);
    assert_eq!(report.state("service"), EventState::Failed);
    assert_eq!(report.state("service-base"), EventState::Aborted);
    assert_eq!(report.state("controller"), EventState::Complete);
    assert_eq!(report.state("server"), EventState::Complete);

    assert!(outcome.artifacts.contains("partial.ts"));
    assert!(!outcome.artifacts.contains("service-base.ts"));
    assert!(outcome.artifacts.contains("resolver.ts"));
}

#[tokio::test]
async fn test_cancellation_stops_pending_events() {
    let cancel = CancelHandle::new();
    let trigger = cancel.clone();
    let pipeline = pipeline_with_producers()
        .plugin(&plugin("cancel", move |hooks| {
            let trigger = trigger.clone();
            hooks.after(
                "service",
                handler_fn(move |_| {
                    trigger.cancel();
                    Ok(())
                }),
            )?;
            Ok(())
        }))
        .unwrap();

    let outcome = pipeline
        .run(RunRequest::new().cancel_handle(cancel))
        .await
        .unwrap();
    let report = &outcome.report;

    assert!(report.cancelled);
    assert!(!report.is_clean());
    assert_eq!(report.state("service-base"), EventState::Cancelled);
    assert_eq!(report.state("controller"), EventState::Cancelled);
    assert_eq!(report.state("resolver"), EventState::Cancelled);

    let paths: Vec<_> = outcome.artifacts.paths().collect();
    assert_eq!(paths, vec!["server.ts", "service.ts"]);
}

struct Slow {
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Handler for Slow {
    async fn invoke(&self, ctx: &mut ExecutionContext) -> eyre::Result<()> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.log.lock().push("slow");
        ctx.emit("slow.ts", "")?;
        Ok(())
    }
}

#[tokio::test]
async fn test_async_hooks_are_serialised() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let slow_log = log.clone();
    let fast_log = log.clone();

    let pipeline = Pipeline::new(registry())
        .plugin(&plugin("ordering", move |hooks| {
            hooks.after(
                "service",
                Slow {
                    log: slow_log.clone(),
                },
            )?;
            let fast_log = fast_log.clone();
            hooks.after(
                "service",
                handler_fn(move |ctx| {
                    assert!(ctx.latest("slow.ts").is_some());
                    fast_log.lock().push("fast");
                    Ok(())
                }),
            )?;
            Ok(())
        }))
        .unwrap();

    let outcome = pipeline.run(RunRequest::new()).await.unwrap();
    assert!(outcome.report.is_clean());
    assert_eq!(*log.lock(), vec!["slow", "fast"]);
}

#[tokio::test]
async fn test_events_without_producers_are_noops() {
    let pipeline = Pipeline::new(catalog::standard().unwrap());
    let outcome = pipeline.run(RunRequest::new()).await.unwrap();
    assert!(outcome.artifacts.is_empty());
    assert_eq!(
        outcome.report.count(EventState::Complete),
        pipeline.registry().len()
    );
}
