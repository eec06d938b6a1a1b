// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resolved target model.
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::arch::Arch;
use crate::error::Violation;

/// Index of a target inside a resolver's registry.
///
/// Two resolutions of the same label within one run yield the same id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TargetId(pub(crate) usize);

impl TargetId {
    /// Position in the registry.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Kind of a resolved target.
///
/// Decided once, the first time a label is visited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetKind {
    /// `static_library` linker unit.
    StaticLibrary,
    /// `shared_library` linker unit.
    SharedLibrary,
    /// `executable` linker unit.
    Executable,
    /// Transparent aggregation.
    Group,
    /// `action`, keyed per architecture.
    Action,
    /// `action_foreach`, keyed per architecture.
    ActionForeach,
    /// Non-linkable compilation unit whose flags bubble up.
    SourceSet,
    /// `copy` rule.
    Copy,
    /// Protobuf library compiled with `plugin` (`proto`, `protozero`,
    /// `descriptor`, ...).
    ProtoLibrary {
        /// protoc plugin name without the `_plugin` suffix.
        plugin: String,
    },
    /// Group produced by a `java_library`-style template. Never a dependency.
    JavaGroup,
}

impl TargetKind {
    /// Parses a raw GN `type`. Returns `None` for types the resolver does not
    /// model.
    pub fn from_raw(raw: &str) -> Option<Self> {
        Some(match raw {
            "static_library" => Self::StaticLibrary,
            "shared_library" => Self::SharedLibrary,
            "executable" => Self::Executable,
            "group" => Self::Group,
            "action" => Self::Action,
            "action_foreach" => Self::ActionForeach,
            "source_set" => Self::SourceSet,
            "copy" => Self::Copy,
            "proto_library" => Self::ProtoLibrary {
                plugin: "proto".to_owned(),
            },
            _ => return None,
        })
    }

    /// GN-style name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StaticLibrary => "static_library",
            Self::SharedLibrary => "shared_library",
            Self::Executable => "executable",
            Self::Group => "group",
            Self::Action => "action",
            Self::ActionForeach => "action_foreach",
            Self::SourceSet => "source_set",
            Self::Copy => "copy",
            Self::ProtoLibrary { .. } => "proto_library",
            Self::JavaGroup => "java_group",
        }
    }

    /// Executable, shared or static library.
    pub fn is_linker_unit(&self) -> bool {
        matches!(
            self,
            Self::StaticLibrary | Self::SharedLibrary | Self::Executable
        )
    }

    /// `action` or `action_foreach`.
    pub fn is_action(&self) -> bool {
        matches!(self, Self::Action | Self::ActionForeach)
    }

    /// Protobuf library of any plugin.
    pub fn is_proto_library(&self) -> bool {
        matches!(self, Self::ProtoLibrary { .. })
    }

    /// The protoc plugin, for protobuf libraries.
    pub fn proto_plugin(&self) -> Option<&str> {
        match self {
            Self::ProtoLibrary { plugin } => Some(plugin),
            _ => None,
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Architecture-specific view of a target.
///
/// Before finalization this holds everything seen for the architecture; after
/// it, only what differs from the other architectures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchAttrs {
    /// Source files.
    pub sources: BTreeSet<String>,
    /// cflags and cflags_cc.
    pub cflags: BTreeSet<String>,
    /// Preprocessor defines.
    pub defines: BTreeSet<String>,
    /// Header search paths.
    pub include_dirs: BTreeSet<String>,
    /// Linker-unit dependencies.
    pub deps: BTreeSet<String>,
    /// Transitive closure of source_set dependencies.
    pub source_set_deps: BTreeSet<String>,
    /// Static libraries reachable through linker-unit edges.
    pub transitive_static_libs_deps: BTreeSet<String>,
}

impl ArchAttrs {
    /// Whether every set is empty.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
            && self.cflags.is_empty()
            && self.defines.is_empty()
            && self.include_dirs.is_empty()
            && self.deps.is_empty()
            && self.source_set_deps.is_empty()
            && self.transitive_static_libs_deps.is_empty()
    }
}

/// A resolved GN target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Label without toolchain; actions carry an `__<arch>` suffix.
    pub name: String,
    /// Target kind.
    #[serde(flatten)]
    pub kind: TargetKind,
    /// Test-only target.
    pub testonly: bool,
    /// Toolchain of the first variant seen.
    pub toolchain: Option<String>,
    /// Opaque build-tooling target; never expanded.
    pub is_third_party: bool,
    /// Built with `-frtti` on some architecture.
    pub rtti: bool,

    /// Headers listed in `public`.
    pub public_headers: BTreeSet<String>,

    /// Action inputs.
    pub inputs: BTreeSet<String>,
    /// Action outputs, relative to the gen directory.
    pub outputs: BTreeSet<String>,
    /// Action script.
    pub script: Option<String>,
    /// Action arguments.
    pub args: Vec<String>,
    /// Action response file, re-quoted and space-joined.
    pub response_file_contents: Option<String>,

    /// Proto import directories.
    pub proto_paths: BTreeSet<String>,
    /// Proto exports.
    pub proto_exports: BTreeSet<String>,
    /// Directory passed as `--proto-in-dir`.
    pub proto_in_dir: String,

    /// Sources common to every architecture.
    pub sources: BTreeSet<String>,
    /// cflags common to every architecture.
    pub cflags: BTreeSet<String>,
    /// Defines common to every architecture.
    pub defines: BTreeSet<String>,
    /// Include dirs common to every architecture.
    pub include_dirs: BTreeSet<String>,
    /// Direct dependencies (plus the linker deps common to every architecture).
    pub deps: BTreeSet<String>,
    /// Libraries to link.
    pub libs: BTreeSet<String>,
    /// Linker flags.
    pub ldflags: BTreeSet<String>,
    /// source_set deps common to every architecture.
    pub source_set_deps: BTreeSet<String>,
    /// Direct protobuf library deps (including those bubbled up).
    pub proto_deps: BTreeSet<String>,
    /// Transitive closure of protobuf library deps.
    pub transitive_proto_deps: BTreeSet<String>,

    /// Per-architecture records.
    pub arch: BTreeMap<Arch, ArchAttrs>,

    #[serde(skip)]
    finalized: bool,
}

impl Target {
    /// Creates an empty target from a raw GN type.
    pub fn new(name: impl Into<String>, raw_type: &str) -> Result<Self, Violation> {
        let kind = TargetKind::from_raw(raw_type)
            .ok_or_else(|| Violation::UnknownTargetType(raw_type.to_owned()))?;
        Ok(Self::with_kind(name, kind))
    }

    pub(crate) fn with_kind(name: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            testonly: false,
            toolchain: None,
            is_third_party: false,
            rtti: false,
            public_headers: BTreeSet::new(),
            inputs: BTreeSet::new(),
            outputs: BTreeSet::new(),
            script: None,
            args: Vec::new(),
            response_file_contents: None,
            proto_paths: BTreeSet::new(),
            proto_exports: BTreeSet::new(),
            proto_in_dir: String::new(),
            sources: BTreeSet::new(),
            cflags: BTreeSet::new(),
            defines: BTreeSet::new(),
            include_dirs: BTreeSet::new(),
            deps: BTreeSet::new(),
            libs: BTreeSet::new(),
            ldflags: BTreeSet::new(),
            source_set_deps: BTreeSet::new(),
            proto_deps: BTreeSet::new(),
            transitive_proto_deps: BTreeSet::new(),
            arch: BTreeMap::new(),
            finalized: false,
        }
    }

    /// Built for the host.
    pub fn host_supported(&self) -> bool {
        self.arch.contains_key(&Arch::Host)
    }

    /// Built for at least one Android architecture.
    pub fn device_supported(&self) -> bool {
        self.arch.keys().any(|a| a.is_device())
    }

    /// Whether [`finalize`](Target::finalize) already ran.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Moves the attributes shared by every architecture up to the target.
    ///
    /// For each per-architecture attribute, the intersection over all
    /// architectures is added to the target-level set and then removed from
    /// every architecture record, so no value is represented in both places.
    /// Calling it again is a no-op.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        let Target {
            arch,
            sources,
            cflags,
            defines,
            include_dirs,
            deps,
            source_set_deps,
            ..
        } = self;
        hoist(sources, arch, |a| &mut a.sources);
        hoist(cflags, arch, |a| &mut a.cflags);
        hoist(defines, arch, |a| &mut a.defines);
        hoist(include_dirs, arch, |a| &mut a.include_dirs);
        hoist(deps, arch, |a| &mut a.deps);
        hoist(source_set_deps, arch, |a| &mut a.source_set_deps);
    }
}

fn hoist(
    common: &mut BTreeSet<String>,
    arch: &mut BTreeMap<Arch, ArchAttrs>,
    field: fn(&mut ArchAttrs) -> &mut BTreeSet<String>,
) {
    let mut variants = arch.values_mut();
    let Some(first) = variants.next() else {
        return;
    };
    let mut shared = field(first).clone();
    for variant in variants {
        let set = field(variant);
        shared.retain(|v| set.contains(v));
    }
    common.extend(shared);

    for variant in arch.values_mut() {
        field(variant).retain(|v| !common.contains(v));
    }
}
