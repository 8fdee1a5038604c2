//! Artifact candidates and the merged artifact set.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::{EventId, Phase};

/// Who produced an artifact candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Origin {
    /// The event's default producer.
    Base,
    /// A plugin handler.
    Plugin { plugin: String, phase: Phase },
}

impl Origin {
    pub fn plugin(plugin: impl Into<String>, phase: Phase) -> Self {
        Self::Plugin {
            plugin: plugin.into(),
            phase,
        }
    }

    pub fn is_replace(&self) -> bool {
        matches!(
            self,
            Self::Plugin {
                phase: Phase::Replace,
                ..
            }
        )
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => f.write_str("base producer"),
            Self::Plugin { plugin, phase } => write!(f, "plugin '{plugin}' ({phase})"),
        }
    }
}

/// A generated file, or a candidate for one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Logical path relative to the output root.
    pub path: String,
    pub content: String,
    pub origin: Origin,
    /// The event whose hook or producer emitted this.
    pub event: EventId,
    /// Position in the run's emission order.
    pub seq: u64,
}

/// The merged output of a run: one artifact per logical path, in order of
/// each path's first emission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArtifactSet(IndexMap<String, Artifact>);

impl ArtifactSet {
    pub(crate) fn from_map(map: IndexMap<String, Artifact>) -> Self {
        Self(map)
    }

    pub fn get(&self, path: &str) -> Option<&Artifact> {
        self.0.get(path)
    }

    /// Content of the artifact at `path`.
    pub fn content(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(|a| a.content.as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.0.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `(path, content)` pairs, ready for the writer.
    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .values()
            .map(|a| (a.path.as_str(), a.content.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a ArtifactSet {
    type Item = &'a Artifact;
    type IntoIter = indexmap::map::Values<'a, String, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.values()
    }
}
