//! Event identifiers and definitions.

use std::{borrow::Borrow, fmt};

use serde::Serialize;

/// Unique name of an event, e.g. `create-entity-service`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EventId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&EventId> for EventId {
    fn from(id: &EventId) -> Self {
        id.clone()
    }
}

impl PartialEq<str> for EventId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EventId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A named point in the generation hierarchy.
///
/// Definitions are created by the caller with [`EventDefinition::root`] or
/// [`EventDefinition::child`]; the registry fills in the ordered child list
/// as children are registered under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDefinition {
    id: EventId,
    parent: Option<EventId>,
    children: Vec<EventId>,
}

impl EventDefinition {
    /// A root event (no parent).
    pub fn root(id: impl Into<EventId>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// An event nested under `parent`.
    pub fn child(id: impl Into<EventId>, parent: impl Into<EventId>) -> Self {
        Self {
            id: id.into(),
            parent: Some(parent.into()),
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn parent(&self) -> Option<&EventId> {
        self.parent.as_ref()
    }

    /// Children in declaration order.
    pub fn children(&self) -> &[EventId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn push_child(&mut self, child: EventId) {
        self.children.push(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_comparisons() {
        let id = EventId::from("create-server");
        assert_eq!(id, "create-server");
        assert_eq!(id.as_str(), "create-server");
        assert_eq!(id.to_string(), "create-server");
    }

    #[test]
    fn test_definition_constructors() {
        let root = EventDefinition::root("create-server");
        assert!(root.is_root());
        assert!(root.children().is_empty());

        let child = EventDefinition::child("create-entity-service", "create-server");
        assert_eq!(child.parent().map(EventId::as_str), Some("create-server"));
    }
}
