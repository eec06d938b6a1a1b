// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Phase 1: memoized depth-first resolution of a `gn desc` graph.
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::arch::Arch;
use crate::classify::{classify, is_compile_java_stage, is_dex_stage, probe_proto, ProtoMatch};
use crate::config::ResolverConfig;
use crate::descriptor::{Descriptor, GnDesc};
use crate::error::{ResolveError, Violation};
use crate::graph::TargetGraph;
use crate::label::label_without_toolchain;
use crate::target::{ArchAttrs, Target, TargetId, TargetKind};

#[allow(clippy::expect_used)]
static GEN_DIR_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^//out/.+?/gen/").expect("valid regex"));

/// Resolves labels of one project description into [`Target`]s.
///
/// A resolver owns the registry of every target it has visited and the set of
/// harvested java sources. Build a fresh one per run; independent runs share
/// nothing.
///
/// Attributes accumulate into per-architecture records while resolving; call
/// [`finish`](Resolver::finish) to finalize them.
pub struct Resolver<'d> {
    desc: &'d GnDesc,
    config: ResolverConfig,
    targets: Vec<Target>,
    index: BTreeMap<String, TargetId>,
    java_sources: BTreeSet<String>,
}

impl<'d> Resolver<'d> {
    /// Creates a resolver over `desc`.
    pub fn new(desc: &'d GnDesc, config: ResolverConfig) -> Self {
        Self {
            desc,
            config,
            targets: Vec::new(),
            index: BTreeMap::new(),
            java_sources: BTreeSet::new(),
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves `label` and, transitively, all of its dependencies.
    ///
    /// Memoized per (target, architecture): resolving a label again returns the
    /// same [`TargetId`] without revisiting its dependencies.
    pub fn resolve(&mut self, label: &str) -> Result<TargetId, ResolveError> {
        self.resolve_arch(label).map(|(id, _)| id)
    }

    /// Like [`resolve`](Self::resolve), also returning the architecture the
    /// label's toolchain maps to.
    fn resolve_arch(&mut self, label: &str) -> Result<(TargetId, Arch), ResolveError> {
        let gn = self.desc;
        let desc = gn.get(label).ok_or_else(|| ResolveError::lookup(label))?;
        let arch = self.config.arch_for_toolchain(desc.toolchain.as_deref());

        // genrules cannot vary their command per arch, so every arch gets its
        // own action target.
        let mut name = label_without_toolchain(label).to_owned();
        if desc.kind.starts_with("action") {
            name = format!("{name}__{arch}");
        }

        let third_party = self.config.is_third_party(&name);
        let proto = if third_party {
            None
        } else {
            probe_proto(gn, label, desc, &self.config)
        };

        let id = match self.index.get(&name) {
            Some(&id) => {
                if self.targets[id.0].arch.contains_key(&arch) {
                    trace!(name = %name, %arch, "already resolved");
                    return Ok((id, arch));
                }
                id
            }
            None => {
                let kind = classify(&name, desc, proto.as_ref())?;
                debug!(name = %name, kind = %kind, "new target");
                let id = TargetId(self.targets.len());
                let mut target = Target::with_kind(name.clone(), kind);
                target.is_third_party = third_party;
                target.toolchain.clone_from(&desc.toolchain);
                self.targets.push(target);
                self.index.insert(name, id);
                id
            }
        };

        // Registered before recursing so a cyclic description still terminates.
        self.targets[id.0].arch.insert(arch, ArchAttrs::default());

        if third_party {
            return Ok((id, arch));
        }

        let kind = self.targets[id.0].kind.clone();
        self.populate(id, arch, desc, &kind, proto.as_ref())?;

        if let Some(proto) = proto.as_ref().filter(|p| p.via_companion) {
            for dep_label in &proto.desc.deps {
                let dep_id = self.resolve(dep_label)?;
                let dep_name = self.targets[dep_id.0].name.clone();
                self.targets[id.0].deps.insert(dep_name);
            }
        }

        for dep_label in &desc.deps {
            let (dep_id, dep_arch) = self.resolve_arch(dep_label)?;
            self.link(id, arch, dep_id, dep_arch);
        }

        Ok((id, arch))
    }

    /// A target resolved so far (not yet finalized).
    pub fn target(&self, id: TargetId) -> &Target {
        &self.targets[id.0]
    }

    /// Looks up a target resolved so far by its registry name.
    pub fn get(&self, name: &str) -> Option<&Target> {
        self.index.get(name).map(|id| &self.targets[id.0])
    }

    /// Number of distinct targets resolved so far.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether nothing was resolved yet.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Java sources harvested so far.
    pub fn java_sources(&self) -> &BTreeSet<String> {
        &self.java_sources
    }

    /// Phase 2: finalizes every target and freezes the registry.
    pub fn finish(self) -> TargetGraph {
        let mut targets = self.targets;
        for target in &mut targets {
            target.finalize();
        }
        TargetGraph::new(targets, self.index, self.java_sources)
    }

    fn populate(
        &mut self,
        id: TargetId,
        arch: Arch,
        desc: &Descriptor,
        kind: &TargetKind,
        proto: Option<&ProtoMatch<'_>>,
    ) -> Result<(), ResolveError> {
        let target = &mut self.targets[id.0];
        target.testonly |= desc.testonly;

        if kind.is_proto_library() {
            let source_desc = proto.map_or(desc, |p| p.desc);
            if let Some(bad) = source_desc.sources.iter().find(|s| !s.ends_with(".proto")) {
                return Err(ResolveError::invariant(
                    &target.name,
                    Violation::NonProtoSource(bad.clone()),
                ));
            }
            debug!(name = %target.name, plugin = ?kind.proto_plugin(), "proto library");
            target.proto_paths.extend(source_desc.metadata_strings("import_dirs"));
            target.proto_exports.extend(source_desc.metadata_strings("exports"));
            target.proto_in_dir = proto_in_dir(source_desc);
            arch_record(target, arch)
                .sources
                .extend(source_desc.sources.iter().cloned());
        } else {
            match kind {
                TargetKind::SourceSet
                | TargetKind::StaticLibrary
                | TargetKind::SharedLibrary
                | TargetKind::Executable => {
                    arch_record(target, arch)
                        .sources
                        .extend(desc.sources.iter().cloned());
                }
                TargetKind::Action | TargetKind::ActionForeach => {
                    target.inputs.extend(desc.inputs.iter().cloned());
                    arch_record(target, arch)
                        .sources
                        .extend(desc.sources.iter().cloned());
                    target
                        .outputs
                        .extend(desc.outputs.iter().map(|o| strip_gen_dir(o)));
                    target.script.clone_from(&desc.script);
                    target.args.clone_from(&desc.args);
                    target.response_file_contents =
                        Some(format_response_file(&desc.response_file_contents));
                }
                TargetKind::JavaGroup => debug!(name = %target.name, "java group"),
                TargetKind::Copy | TargetKind::Group | TargetKind::ProtoLibrary { .. } => {}
            }
        }

        target
            .public_headers
            .extend(desc.public.iter().filter(|h| *h != "*").cloned());
        target.libs.extend(desc.libs.iter().cloned());
        target.ldflags.extend(desc.ldflags.iter().cloned());

        let record = arch_record(target, arch);
        record
            .cflags
            .extend(desc.cflags.iter().chain(&desc.cflags_cc).cloned());
        record.defines.extend(desc.defines.iter().cloned());
        record.include_dirs.extend(desc.include_dirs.iter().cloned());
        if record.cflags.contains("-frtti") {
            target.rtti = true;
        }
        Ok(())
    }

    /// Records the edge `id -> dep_id` according to the dependency's kind.
    ///
    /// Propagated attributes are read from the dependency's `dep_arch` record
    /// and written into the dependent's `arch` record; the two differ when a
    /// dependency is pinned to another toolchain.
    fn link(&mut self, id: TargetId, arch: Arch, dep_id: TargetId, dep_arch: Arch) {
        let Self {
            targets,
            java_sources,
            config,
            ..
        } = self;
        let Some((target, dep)) = pair_mut(targets, id, dep_id) else {
            return;
        };

        if dep.is_third_party {
            target.deps.insert(dep.name.clone());
            return;
        }

        match &dep.kind {
            TargetKind::ProtoLibrary { .. } => {
                target.proto_deps.insert(dep.name.clone());
                target.transitive_proto_deps.insert(dep.name.clone());
                target
                    .transitive_proto_deps
                    .extend(dep.transitive_proto_deps.iter().cloned());
                target.proto_paths.extend(dep.proto_paths.iter().cloned());
            }
            TargetKind::SourceSet => {
                arch_record(target, arch)
                    .source_set_deps
                    .insert(dep.name.clone());
                bubble_up(target, arch, dep, dep_arch);
            }
            TargetKind::Group => bubble_up(target, arch, dep, dep_arch),
            TargetKind::Action | TargetKind::ActionForeach | TargetKind::Copy => {
                // proto scaffolding actions are implied by the proto library
                if !target.kind.is_proto_library() {
                    target.deps.insert(dep.name.clone());
                }
            }
            TargetKind::StaticLibrary | TargetKind::SharedLibrary | TargetKind::Executable => {
                arch_record(target, arch).deps.insert(dep.name.clone());
            }
            // java sources are compiled as one library; no native edge
            TargetKind::JavaGroup => return,
        }

        // Soong does not propagate static_libs, so they bubble up the tree.
        let record = arch_record(target, arch);
        if dep.kind == TargetKind::StaticLibrary {
            record.transitive_static_libs_deps.insert(dep.name.clone());
        }
        if let Some(dep_record) = dep.arch.get(&dep_arch) {
            record
                .transitive_static_libs_deps
                .extend(dep_record.transitive_static_libs_deps.iter().cloned());
        }
        let static_libs = record.transitive_static_libs_deps.clone();
        record.deps.extend(static_libs);

        // __compile_java feeds both host and device builds; only sources reaching
        // a __dex target are destined for the device.
        if is_dex_stage(&target.name) && is_compile_java_stage(&dep.name) {
            debug!(dex = %target.name, compile = %dep.name, "harvesting java sources");
            java_sources.extend(
                dep.inputs
                    .iter()
                    .filter(|src| is_java_source(src, &config.java_gen_exclude_prefix))
                    .cloned(),
            );
        }
    }
}

/// Copies the propagated attributes of a source_set or group into `target`.
fn bubble_up(target: &mut Target, arch: Arch, dep: &Target, dep_arch: Arch) {
    target.deps.extend(dep.deps.iter().cloned());
    target.ldflags.extend(dep.ldflags.iter().cloned());
    target.libs.extend(dep.libs.iter().cloned());
    target.proto_deps.extend(dep.proto_deps.iter().cloned());
    target
        .transitive_proto_deps
        .extend(dep.transitive_proto_deps.iter().cloned());
    target.proto_paths.extend(dep.proto_paths.iter().cloned());

    let Some(from) = dep.arch.get(&dep_arch) else {
        return;
    };
    let into = arch_record(target, arch);
    into.cflags.extend(from.cflags.iter().cloned());
    into.defines.extend(from.defines.iter().cloned());
    into.include_dirs.extend(from.include_dirs.iter().cloned());
    into.deps.extend(from.deps.iter().cloned());
    into.source_set_deps
        .extend(from.source_set_deps.iter().cloned());
}

fn arch_record(target: &mut Target, arch: Arch) -> &mut ArchAttrs {
    target.arch.entry(arch).or_default()
}

/// Splits the registry into the dependent (mutable) and its dependency.
fn pair_mut(targets: &mut [Target], a: TargetId, b: TargetId) -> Option<(&mut Target, &Target)> {
    use std::cmp::Ordering;

    match a.0.cmp(&b.0) {
        Ordering::Equal => None,
        Ordering::Less => {
            let (lo, hi) = targets.split_at_mut(b.0);
            Some((lo.get_mut(a.0)?, hi.first()?))
        }
        Ordering::Greater => {
            let (lo, hi) = targets.split_at_mut(a.0);
            Some((hi.first_mut()?, lo.get(b.0)?))
        }
    }
}

fn proto_in_dir(desc: &Descriptor) -> String {
    desc.arg_after("--proto-in-dir")
        .map(|dir| dir.strip_prefix("../../").unwrap_or(dir).to_owned())
        .unwrap_or_default()
}

fn strip_gen_dir(output: &str) -> String {
    GEN_DIR_PREFIX.replace(output, "").into_owned()
}

/// Re-quotes `key=value` lines as `key="value"` and joins them with spaces.
///
/// Only the first `=` splits; the value is kept verbatim inside the quotes.
fn format_response_file(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| match line.split_once('=') {
            Some((key, value)) => format!("{key}=\"{value}\""),
            None => line.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_java_source(src: &str, exclude_prefix: &str) -> bool {
    let is_java = Path::new(src)
        .extension()
        .is_some_and(|ext| ext == "java");
    is_java && (exclude_prefix.is_empty() || !src.starts_with(exclude_prefix))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn response_file_requotes_values() {
        assert_eq!(
            format_response_file(&lines(&["--flags", "--flag=true && false"])),
            "--flags --flag=\"true && false\""
        );
        assert_eq!(
            format_response_file(&lines(&["--define=A=B"])),
            "--define=\"A=B\""
        );
        assert_eq!(format_response_file(&[]), "");
    }

    #[test]
    fn outputs_lose_gen_dir() {
        assert_eq!(
            strip_gen_dir("//out/android_arm64/gen/net/version.h"),
            "net/version.h"
        );
        assert_eq!(strip_gen_dir("//out/x/y/gen/a/gen/b.h"), "a/gen/b.h");
        assert_eq!(strip_gen_dir("//net/static.h"), "//net/static.h");
    }

    #[test]
    fn proto_in_dir_strips_parent_prefix() {
        let desc = Descriptor {
            args: lines(&["--proto-in-dir", "../../third_party/cronet", "--cpp-out", "gen"]),
            ..Descriptor::default()
        };
        assert_eq!(proto_in_dir(&desc), "third_party/cronet");
        assert_eq!(proto_in_dir(&Descriptor::default()), "");
    }

    #[test]
    fn java_source_filter() {
        assert!(is_java_source("//net/A.java", "//out/test/gen/"));
        assert!(!is_java_source("//net/A.kt", "//out/test/gen/"));
        assert!(!is_java_source("//out/test/gen/B.java", "//out/test/gen/"));
        assert!(!is_java_source("//net/java", "//out/test/gen/"));
    }

    #[test]
    fn pair_mut_handles_both_orders() {
        let mut targets = vec![
            Target::new("//a:0", "group").unwrap(),
            Target::new("//a:1", "group").unwrap(),
        ];
        let (t, d) = pair_mut(&mut targets, TargetId(1), TargetId(0)).unwrap();
        assert_eq!((t.name.as_str(), d.name.as_str()), ("//a:1", "//a:0"));
        let (t, d) = pair_mut(&mut targets, TargetId(0), TargetId(1)).unwrap();
        assert_eq!((t.name.as_str(), d.name.as_str()), ("//a:0", "//a:1"));
        assert!(pair_mut(&mut targets, TargetId(0), TargetId(0)).is_none());
    }
}
