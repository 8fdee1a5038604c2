//! Plugin trait and the subscription view handed to plugins.

use crate::{
    EventId, EventRegistry, Handler, Phase, PluginHost, SubscriptionHandle,
    error::SubscribeError,
};

/// A bundle of hooks registered under one name.
///
/// Plugins declare their hooks in [`Plugin::subscribe`]; no handler runs at
/// subscribe time.
///
/// # Example
///
/// ```ignore
/// struct GraphqlOnly;
///
/// impl Plugin for GraphqlOnly {
///     fn name(&self) -> &str { "graphql-only" }
///
///     fn subscribe(&self, hooks: &mut Hooks<'_>) -> Result<(), SubscribeError> {
///         hooks.before(CREATE_ENTITY_CONTROLLER, handler_fn(|ctx| {
///             ctx.skip(CREATE_ENTITY_CONTROLLER)?;
///             Ok(())
///         }))?;
///         Ok(())
///     }
/// }
/// ```
pub trait Plugin: Send + Sync {
    /// The plugin identifier, recorded as the origin of its artifacts.
    fn name(&self) -> &str;

    /// Register handlers.
    ///
    /// # Errors
    ///
    /// Returns the first subscription the host rejects.
    fn subscribe(&self, hooks: &mut Hooks<'_>) -> Result<(), SubscribeError>;
}

/// Subscription API scoped to a single plugin.
pub struct Hooks<'a> {
    host: &'a mut PluginHost,
    plugin: String,
}

impl<'a> Hooks<'a> {
    pub(crate) fn new(host: &'a mut PluginHost, plugin: impl Into<String>) -> Self {
        Self {
            host,
            plugin: plugin.into(),
        }
    }

    /// Run `handler` before the event's producer.
    pub fn before(
        &mut self,
        event: impl Into<EventId>,
        handler: impl Handler + 'static,
    ) -> Result<SubscriptionHandle, SubscribeError> {
        self.on(event, Phase::Before, handler)
    }

    /// Run `handler` after the event's producer.
    pub fn after(
        &mut self,
        event: impl Into<EventId>,
        handler: impl Handler + 'static,
    ) -> Result<SubscriptionHandle, SubscribeError> {
        self.on(event, Phase::After, handler)
    }

    /// Run `handler` instead of the event's producer.
    pub fn replace(
        &mut self,
        event: impl Into<EventId>,
        handler: impl Handler + 'static,
    ) -> Result<SubscriptionHandle, SubscribeError> {
        self.on(event, Phase::Replace, handler)
    }

    pub fn on(
        &mut self,
        event: impl Into<EventId>,
        phase: Phase,
        handler: impl Handler + 'static,
    ) -> Result<SubscriptionHandle, SubscribeError> {
        self.host
            .subscribe(self.plugin.clone(), event, phase, handler)
    }

    /// The registry the plugin is being installed against.
    pub fn events(&self) -> &EventRegistry {
        self.host.registry()
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }
}
