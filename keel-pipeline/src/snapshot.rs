//! Snapshot plugin for visualization and debugging.
//!
//! Captures an event's input payload and the paths it emitted once the
//! event's own stages have run.

use std::{fs, path::Path, sync::Arc};

use eyre::Result;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use crate::{EventId, ExecutionContext, Hooks, Plugin, error::SubscribeError, handler_fn};

/// State of one event after its after-hooks.
#[derive(Debug, Clone, Serialize)]
pub struct EventSnapshot {
    pub event: EventId,
    /// The payload the event saw, inherited from its ancestors if needed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Paths emitted by this event's hooks and producer, in order.
    pub artifact_paths: Vec<String>,
}

/// Records an [`EventSnapshot`] for every event.
///
/// Install it last so its after-hooks observe every other plugin's output.
///
/// ```ignore
/// let snapshots = SnapshotPlugin::new();
/// pipeline.install(&snapshots)?;
/// pipeline.run(request).await?;
/// snapshots.write_to_dir(".keel/debug")?;
/// ```
#[derive(Clone, Default)]
pub struct SnapshotPlugin {
    snapshots: Arc<RwLock<Vec<EventSnapshot>>>,
}

impl SnapshotPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<EventSnapshot> {
        self.snapshots.read().clone()
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }

    /// Write one `NN-<event>.json` file per snapshot.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let snapshots = self.snapshots.read();
        for (i, snapshot) in snapshots.iter().enumerate() {
            let path = dir.join(format!("{:02}-{}.json", i, snapshot.event));
            let json = serde_json::to_string_pretty(snapshot)?;
            fs::write(&path, json)?;
        }

        Ok(snapshots.len())
    }

    fn capture(snapshots: &RwLock<Vec<EventSnapshot>>, ctx: &ExecutionContext) {
        let Some(event) = ctx.active_event().cloned() else {
            return;
        };
        let artifact_paths = ctx
            .candidates()
            .iter()
            .filter(|a| a.event == event)
            .map(|a| a.path.clone())
            .collect();
        let snapshot = EventSnapshot {
            payload: ctx.inherited_payload(event.as_str()).cloned(),
            event,
            artifact_paths,
        };
        snapshots.write().push(snapshot);
    }
}

impl Plugin for SnapshotPlugin {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn subscribe(&self, hooks: &mut Hooks<'_>) -> Result<(), SubscribeError> {
        let events: Vec<EventId> = hooks.events().iter().map(|d| d.id().clone()).collect();
        for event in events {
            let snapshots = self.snapshots.clone();
            hooks.after(
                event,
                handler_fn(move |ctx| {
                    Self::capture(&snapshots, ctx);
                    Ok(())
                }),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_plugin_creation() {
        let plugin = SnapshotPlugin::new();
        assert!(plugin.is_empty());
    }
}
