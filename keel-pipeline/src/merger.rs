//! Reconciles competing artifact candidates.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::{Artifact, ArtifactSet, EventRegistry, error::MergeError};

/// Picks one artifact per logical path.
///
/// Rules, per path:
/// 1. A lone candidate wins.
/// 2. If any candidate came from a replace handler, only replace candidates
///    compete. One whose event is a strict ancestor of another's event
///    outranks it.
/// 3. Remaining ties go to the highest sequence number, so the last
///    emission wins.
///
/// Two candidates for one path with the same sequence number cannot be
/// ordered and fail the merge.
pub struct ArtifactMerger<'a> {
    registry: &'a EventRegistry,
}

impl<'a> ArtifactMerger<'a> {
    pub fn new(registry: &'a EventRegistry) -> Self {
        Self { registry }
    }

    pub fn merge(&self, candidates: Vec<Artifact>) -> Result<ArtifactSet, MergeError> {
        let mut by_path: IndexMap<String, Vec<Artifact>> = IndexMap::new();
        for candidate in candidates {
            by_path
                .entry(candidate.path.clone())
                .or_default()
                .push(candidate);
        }

        let ambiguous: Vec<String> = by_path
            .iter()
            .filter(|(_, group)| {
                let mut seen = HashSet::new();
                !group.iter().all(|a| seen.insert(a.seq))
            })
            .map(|(path, _)| path.clone())
            .collect();
        if !ambiguous.is_empty() {
            return Err(MergeError::AmbiguousArtifact { paths: ambiguous });
        }

        let mut merged = IndexMap::with_capacity(by_path.len());
        for (path, group) in by_path {
            let count = group.len();
            let Some(winner) = self.pick(group) else {
                continue;
            };
            if count > 1 {
                debug!(
                    %path,
                    origin = %winner.origin,
                    seq = winner.seq,
                    count,
                    "merged candidates"
                );
            }
            merged.insert(path, winner);
        }
        Ok(ArtifactSet::from_map(merged))
    }

    fn pick(&self, group: Vec<Artifact>) -> Option<Artifact> {
        let has_replace = group.iter().any(|a| a.origin.is_replace());
        let contenders: Vec<Artifact> = if has_replace {
            let replaces: Vec<Artifact> = group
                .into_iter()
                .filter(|a| a.origin.is_replace())
                .collect();
            let outranked: Vec<bool> = replaces
                .iter()
                .map(|a| {
                    replaces.iter().any(|b| {
                        self.registry
                            .is_ancestor(b.event.as_str(), a.event.as_str())
                    })
                })
                .collect();
            replaces
                .into_iter()
                .zip(outranked)
                .filter_map(|(a, out)| (!out).then_some(a))
                .collect()
        } else {
            group
        };

        contenders.into_iter().max_by_key(|a| a.seq)
    }
}
