//! The event registry: a validated tree of named events.

use std::fmt;

use indexmap::IndexMap;

use crate::{EventDefinition, EventId, error::RegistryError};

/// Static catalog of events and their parent/child relationships.
///
/// Registration validates that parents exist and that the graph stays a
/// tree. Once a registry is handed to a [`Pipeline`](crate::Pipeline) it is
/// frozen behind an `Arc`, so dispatch can traverse it without locking.
#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    events: IndexMap<EventId, EventDefinition>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DanglingParent`] if the parent is not registered
    /// - [`RegistryError::Cycle`] if the event is its parent or one of the
    ///   parent's ancestors
    /// - [`RegistryError::DuplicateEvent`] if the id is already taken
    pub fn register(&mut self, definition: EventDefinition) -> Result<(), RegistryError> {
        let id = definition.id().clone();

        if let Some(parent) = definition.parent() {
            if !self.events.contains_key(parent) {
                return Err(RegistryError::DanglingParent {
                    event: id,
                    parent: parent.clone(),
                });
            }
            if *parent == id || self.is_ancestor(id.as_str(), parent.as_str()) {
                return Err(RegistryError::Cycle {
                    event: id,
                    parent: parent.clone(),
                });
            }
        }

        if self.events.contains_key(&id) {
            return Err(RegistryError::DuplicateEvent(id));
        }

        if let Some(parent) = definition.parent().cloned() {
            if let Some(parent_def) = self.events.get_mut(&parent) {
                parent_def.push_child(id.clone());
            }
        }
        self.events.insert(id, definition);
        Ok(())
    }

    /// Register a root event.
    pub fn root(&mut self, id: impl Into<EventId>) -> Result<&mut Self, RegistryError> {
        self.register(EventDefinition::root(id))?;
        Ok(self)
    }

    /// Register a child event.
    pub fn child(
        &mut self,
        id: impl Into<EventId>,
        parent: impl Into<EventId>,
    ) -> Result<&mut Self, RegistryError> {
        self.register(EventDefinition::child(id, parent))?;
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&EventDefinition> {
        self.events.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.events.contains_key(id)
    }

    fn definition(&self, id: &str) -> Result<&EventDefinition, RegistryError> {
        self.events
            .get(id)
            .ok_or_else(|| RegistryError::UnknownEvent(id.into()))
    }

    /// Ordered children of an event.
    pub fn children_of(&self, id: &str) -> Result<&[EventId], RegistryError> {
        Ok(self.definition(id)?.children())
    }

    /// Parent of an event, `None` for a root.
    pub fn parent_of(&self, id: &str) -> Result<Option<&EventId>, RegistryError> {
        Ok(self.definition(id)?.parent())
    }

    /// Ancestors of an event, nearest first.
    pub fn ancestors(&self, id: &str) -> Result<Vec<&EventId>, RegistryError> {
        let mut chain = Vec::new();
        let mut current = self.definition(id)?.parent();
        while let Some(parent) = current {
            chain.push(parent);
            current = self.events.get(parent).and_then(EventDefinition::parent);
        }
        Ok(chain)
    }

    /// True if `ancestor` is a strict ancestor of `descendant`.
    pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        self.ancestors(descendant)
            .map(|chain| chain.iter().any(|id| *id == ancestor))
            .unwrap_or(false)
    }

    /// True if `ancestor` is `descendant` itself or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: &str, descendant: &str) -> bool {
        ancestor == descendant || self.is_ancestor(ancestor, descendant)
    }

    /// All descendants of an event in depth-first order.
    pub fn descendants(&self, id: &str) -> Result<Vec<&EventId>, RegistryError> {
        let mut out = Vec::new();
        let mut stack: Vec<&EventId> = self.children_of(id)?.iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(def) = self.events.get(next) {
                stack.extend(def.children().iter().rev());
            }
        }
        Ok(out)
    }

    /// Root events in registration order.
    pub fn roots(&self) -> Vec<&EventId> {
        self.events
            .values()
            .filter(|def| def.is_root())
            .map(EventDefinition::id)
            .collect()
    }

    /// Definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &EventDefinition> {
        self.events.values()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Display the hierarchy with box-drawing characters.
    pub fn tree(&self) -> TreeDisplay<'_> {
        TreeDisplay { registry: self }
    }
}

/// Box-drawing rendering of an [`EventRegistry`].
///
/// ```text
/// create-server
/// ├─ create-entity-service
/// │  └─ create-entity-service-base
/// └─ create-prisma-schema
/// ```
pub struct TreeDisplay<'a> {
    registry: &'a EventRegistry,
}

impl TreeDisplay<'_> {
    fn render_children(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: &EventId,
        prefix: &str,
    ) -> fmt::Result {
        let Some(def) = self.registry.get(id.as_str()) else {
            return Ok(());
        };
        let count = def.children().len();
        for (i, child) in def.children().iter().enumerate() {
            let last = i + 1 == count;
            let (branch, extension) = if last {
                ("└─ ", "   ")
            } else {
                ("├─ ", "│  ")
            };
            writeln!(f, "{prefix}{branch}{child}")?;
            self.render_children(f, child, &format!("{prefix}{extension}"))?;
        }
        Ok(())
    }
}

impl fmt::Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for root in self.registry.roots() {
            writeln!(f, "{root}")?;
            self.render_children(f, root, "")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EventRegistry {
        let mut registry = EventRegistry::new();
        registry
            .root("server")
            .unwrap()
            .child("service", "server")
            .unwrap()
            .child("service-base", "service")
            .unwrap()
            .child("controller", "server")
            .unwrap();
        registry
    }

    #[test]
    fn test_children_in_registration_order() {
        let registry = sample();
        let children: Vec<_> = registry
            .children_of("server")
            .unwrap()
            .iter()
            .map(EventId::as_str)
            .collect();
        assert_eq!(children, vec!["service", "controller"]);
    }

    #[test]
    fn test_parent_of() {
        let registry = sample();
        assert_eq!(registry.parent_of("server").unwrap(), None);
        assert_eq!(
            registry.parent_of("service-base").unwrap().map(EventId::as_str),
            Some("service")
        );
        assert_eq!(
            registry.parent_of("missing"),
            Err(RegistryError::UnknownEvent("missing".into()))
        );
    }

    #[test]
    fn test_children_of_unknown() {
        let registry = sample();
        assert!(matches!(
            registry.children_of("nope"),
            Err(RegistryError::UnknownEvent(_))
        ));
    }

    #[test]
    fn test_duplicate_event() {
        let mut registry = sample();
        let err = registry
            .register(EventDefinition::child("service", "controller"))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateEvent("service".into()));
    }

    #[test]
    fn test_dangling_parent() {
        let mut registry = sample();
        let err = registry
            .register(EventDefinition::child("resolver", "graphql"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DanglingParent { .. }));
    }

    #[test]
    fn test_cycle_through_ancestor_chain() {
        let mut registry = sample();
        // "server" is an ancestor of "service-base"
        let err = registry
            .register(EventDefinition::child("server", "service-base"))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::Cycle {
                event: "server".into(),
                parent: "service-base".into()
            }
        );
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let mut registry = sample();
        let err = registry
            .register(EventDefinition::child("service", "service"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Cycle { .. }));
    }

    #[test]
    fn test_failed_registration_leaves_registry_unchanged() {
        let mut registry = sample();
        let _ = registry.register(EventDefinition::child("server", "service-base"));
        assert_eq!(registry.len(), 4);
        assert!(registry.children_of("service-base").unwrap().is_empty());
    }

    #[test]
    fn test_ancestry() {
        let registry = sample();
        let chain: Vec<_> = registry
            .ancestors("service-base")
            .unwrap()
            .into_iter()
            .map(EventId::as_str)
            .collect();
        assert_eq!(chain, vec!["service", "server"]);
        assert!(registry.is_ancestor("server", "service-base"));
        assert!(!registry.is_ancestor("controller", "service-base"));
        assert!(!registry.is_ancestor("service", "service"));
        assert!(registry.is_ancestor_or_self("service", "service"));
    }

    #[test]
    fn test_descendants_depth_first() {
        let registry = sample();
        let all: Vec<_> = registry
            .descendants("server")
            .unwrap()
            .into_iter()
            .map(EventId::as_str)
            .collect();
        assert_eq!(all, vec!["service", "service-base", "controller"]);
    }

    #[test]
    fn test_tree_display() {
        let registry = sample();
        insta::assert_snapshot!(registry.tree().to_string(), @r"
        server
        ├─ service
        │  └─ service-base
        └─ controller
        ");
    }
}
