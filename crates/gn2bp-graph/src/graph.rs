// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Finalized, read-only target graph.
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::ResolveError;
use crate::label::label_without_toolchain;
use crate::target::{Target, TargetId, TargetKind};

/// Every target of a finished resolution run, finalized.
///
/// Produced by [`Resolver::finish`](crate::Resolver::finish). Iteration is in
/// target-name order.
#[derive(Debug, Clone, Serialize)]
pub struct TargetGraph {
    #[serde(serialize_with = "serialize_by_name")]
    targets: Vec<Target>,
    #[serde(skip)]
    index: BTreeMap<String, TargetId>,
    java_sources: BTreeSet<String>,
}

impl TargetGraph {
    pub(crate) fn new(
        targets: Vec<Target>,
        index: BTreeMap<String, TargetId>,
        java_sources: BTreeSet<String>,
    ) -> Self {
        Self {
            targets,
            index,
            java_sources,
        }
    }

    /// The target named by `label` (toolchain suffix ignored).
    pub fn get(&self, label: &str) -> Result<&Target, ResolveError> {
        self.id_of(label)
            .map(|id| self.target(id))
            .ok_or_else(|| ResolveError::lookup(label))
    }

    /// Registry id of the target named by `label`.
    pub fn id_of(&self, label: &str) -> Option<TargetId> {
        self.index.get(label_without_toolchain(label)).copied()
    }

    /// The target behind `id`.
    pub fn target(&self, id: TargetId) -> &Target {
        &self.targets[id.0]
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// All targets, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Target> + '_ {
        self.index.values().map(|id| &self.targets[id.0])
    }

    /// Executables, shared and static libraries.
    pub fn linker_units(&self) -> impl Iterator<Item = &Target> + '_ {
        self.iter().filter(|t| t.kind.is_linker_unit())
    }

    /// source_set targets.
    pub fn source_sets(&self) -> impl Iterator<Item = &Target> + '_ {
        self.iter().filter(|t| t.kind == TargetKind::SourceSet)
    }

    /// action, action_foreach and copy targets.
    pub fn actions(&self) -> impl Iterator<Item = &Target> + '_ {
        self.iter()
            .filter(|t| t.kind.is_action() || t.kind == TargetKind::Copy)
    }

    /// Protobuf libraries.
    pub fn proto_libs(&self) -> impl Iterator<Item = &Target> + '_ {
        self.iter().filter(|t| t.kind.is_proto_library())
    }

    /// Java sources collected from `__compile_java` deps of `__dex` targets.
    pub fn java_sources(&self) -> &BTreeSet<String> {
        &self.java_sources
    }
}

fn serialize_by_name<S>(targets: &[Target], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let by_name: BTreeMap<&str, &Target> = targets.iter().map(|t| (t.name.as_str(), t)).collect();
    by_name.serialize(serializer)
}
