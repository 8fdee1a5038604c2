//! The plugin host: an ordered handler table keyed by (event, phase).

use std::{collections::HashMap, fmt, sync::Arc};

use tracing::debug;

use crate::{EventId, EventRegistry, Handler, Hooks, Phase, Plugin, error::SubscribeError};

/// One handler subscribed by a plugin.
#[derive(Clone)]
pub struct Registration {
    pub plugin: String,
    pub event: EventId,
    pub phase: Phase,
    pub handler: Arc<dyn Handler>,
    /// Global subscription order across all plugins.
    pub order: usize,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("plugin", &self.plugin)
            .field("event", &self.event)
            .field("phase", &self.phase)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// Returned by a successful subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    pub event: EventId,
    pub phase: Phase,
    pub order: usize,
}

/// Holds every installed handler.
///
/// Handlers for one (event, phase) pair run in subscription order. Each
/// event accepts any number of before and after handlers but at most one
/// replacement.
pub struct PluginHost {
    registry: Arc<EventRegistry>,
    table: HashMap<(EventId, Phase), Vec<Registration>>,
    plugins: Vec<String>,
    next_order: usize,
}

impl PluginHost {
    pub fn new(registry: Arc<EventRegistry>) -> Self {
        Self {
            registry,
            table: HashMap::new(),
            plugins: Vec::new(),
            next_order: 0,
        }
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// Subscribe a handler.
    ///
    /// # Errors
    ///
    /// - [`SubscribeError::UnknownEvent`] if the registry has no such event
    /// - [`SubscribeError::ConflictingReplace`] for a second replacement
    pub fn subscribe(
        &mut self,
        plugin: impl Into<String>,
        event: impl Into<EventId>,
        phase: Phase,
        handler: impl Handler + 'static,
    ) -> Result<SubscriptionHandle, SubscribeError> {
        self.subscribe_arc(plugin.into(), event.into(), phase, Arc::new(handler))
    }

    pub fn subscribe_arc(
        &mut self,
        plugin: String,
        event: EventId,
        phase: Phase,
        handler: Arc<dyn Handler>,
    ) -> Result<SubscriptionHandle, SubscribeError> {
        if !self.registry.contains(event.as_str()) {
            return Err(SubscribeError::UnknownEvent { plugin, event });
        }
        if phase == Phase::Replace {
            if let Some(existing) = self.replacement_for(event.as_str()) {
                return Err(SubscribeError::ConflictingReplace {
                    first: existing.plugin.clone(),
                    second: plugin,
                    event,
                });
            }
        }

        let order = self.next_order;
        self.next_order += 1;
        debug!(%plugin, %event, %phase, order, "subscribed");

        self.table
            .entry((event.clone(), phase))
            .or_default()
            .push(Registration {
                plugin,
                event: event.clone(),
                phase,
                handler,
                order,
            });

        Ok(SubscriptionHandle {
            event,
            phase,
            order,
        })
    }

    /// Install a plugin by letting it subscribe through a scoped [`Hooks`].
    ///
    /// A plugin whose subscription fails leaves no handlers behind.
    pub fn install(&mut self, plugin: &dyn Plugin) -> Result<(), SubscribeError> {
        let first_order = self.next_order;
        let name = plugin.name().to_string();

        let result = plugin.subscribe(&mut Hooks::new(self, name.clone()));
        if let Err(err) = result {
            self.discard_since(first_order);
            return Err(err);
        }

        self.plugins.push(name);
        Ok(())
    }

    fn discard_since(&mut self, order: usize) {
        for regs in self.table.values_mut() {
            regs.retain(|r| r.order < order);
        }
        self.table.retain(|_, regs| !regs.is_empty());
    }

    /// Handlers for (event, phase) in subscription order.
    pub fn handlers_for(&self, event: &str, phase: Phase) -> &[Registration] {
        self.table
            .get(&(EventId::from(event), phase))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The replacement handler for an event, if one is subscribed.
    pub fn replacement_for(&self, event: &str) -> Option<&Registration> {
        self.handlers_for(event, Phase::Replace).first()
    }

    /// Names of installed plugins, in install order.
    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    /// Total number of subscriptions.
    pub fn len(&self) -> usize {
        self.table.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler_fn;

    fn host() -> PluginHost {
        let mut registry = EventRegistry::new();
        registry.root("server").unwrap().child("service", "server").unwrap();
        PluginHost::new(Arc::new(registry))
    }

    fn noop() -> impl Handler {
        handler_fn(|_| Ok(()))
    }

    #[test]
    fn test_handlers_keep_subscription_order() {
        let mut host = host();
        host.subscribe("a", "service", Phase::Before, noop()).unwrap();
        host.subscribe("b", "server", Phase::Before, noop()).unwrap();
        host.subscribe("c", "service", Phase::Before, noop()).unwrap();

        let plugins: Vec<_> = host
            .handlers_for("service", Phase::Before)
            .iter()
            .map(|r| (r.plugin.as_str(), r.order))
            .collect();
        assert_eq!(plugins, vec![("a", 0), ("c", 2)]);
        assert!(host.handlers_for("service", Phase::After).is_empty());
    }

    #[test]
    fn test_second_replace_conflicts() {
        let mut host = host();
        host.subscribe("first", "service", Phase::Replace, noop())
            .unwrap();
        let err = host
            .subscribe("second", "service", Phase::Replace, noop())
            .unwrap_err();
        assert_eq!(
            err,
            SubscribeError::ConflictingReplace {
                event: "service".into(),
                first: "first".into(),
                second: "second".into(),
            }
        );
        assert_eq!(host.replacement_for("service").unwrap().plugin, "first");
    }

    #[test]
    fn test_unlimited_before_and_after() {
        let mut host = host();
        for i in 0..5 {
            host.subscribe(format!("p{i}"), "service", Phase::Before, noop())
                .unwrap();
            host.subscribe(format!("p{i}"), "service", Phase::After, noop())
                .unwrap();
        }
        assert_eq!(host.len(), 10);
    }

    #[test]
    fn test_unknown_event() {
        let mut host = host();
        let err = host
            .subscribe("p", "resolver", Phase::After, noop())
            .unwrap_err();
        assert!(matches!(err, SubscribeError::UnknownEvent { .. }));
    }

    struct Broken;

    impl Plugin for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn subscribe(&self, hooks: &mut Hooks<'_>) -> Result<(), SubscribeError> {
            hooks.before("service", handler_fn(|_| Ok(())))?;
            hooks.after("nowhere", handler_fn(|_| Ok(())))?;
            Ok(())
        }
    }

    #[test]
    fn test_failed_install_leaves_no_handlers() {
        let mut host = host();
        assert!(host.install(&Broken).is_err());
        assert!(host.is_empty());
        assert!(host.plugins().is_empty());
    }
}
