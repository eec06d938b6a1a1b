// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pure target classification, run before any attribute is populated.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ResolverConfig;
use crate::descriptor::{Descriptor, GnDesc};
use crate::error::{ResolveError, Violation};
use crate::label::split_toolchain;
use crate::target::TargetKind;

const ARCH_ALTERNATION: &str = "(android_x86_64|android_x86|android_arm64|android_arm|host)";

#[allow(clippy::expect_used)]
static DEX_STAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("__dex__{ARCH_ALTERNATION}$")).expect("valid regex"));

#[allow(clippy::expect_used)]
static COMPILE_JAVA_STAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("__compile_java__{ARCH_ALTERNATION}$")).expect("valid regex")
});

/// A target detected to be a protobuf library.
#[derive(Debug)]
pub(crate) struct ProtoMatch<'d> {
    pub(crate) plugin: String,
    /// Descriptor carrying the `.proto` sources: the target's own, or its
    /// `_gen` companion action.
    pub(crate) desc: &'d Descriptor,
    pub(crate) via_companion: bool,
}

/// Checks whether `label` is a protobuf library and which plugin compiles it.
///
/// Probed in order: a descriptor-set flag in the target's own args, inline
/// `proto_library_sources` metadata, then a `<name>_gen` action running the
/// protoc wrapper.
pub(crate) fn probe_proto<'d>(
    gn: &'d GnDesc,
    label: &str,
    desc: &'d Descriptor,
    config: &ResolverConfig,
) -> Option<ProtoMatch<'d>> {
    if desc.args.iter().any(|a| a == "--descriptor_set_out") {
        return Some(ProtoMatch {
            plugin: "descriptor".to_owned(),
            desc,
            via_companion: false,
        });
    }

    if desc.has_metadata("proto_library_sources") {
        return Some(ProtoMatch {
            plugin: "source_set".to_owned(),
            desc,
            via_companion: false,
        });
    }

    let (name, toolchain) = split_toolchain(label);
    let companion = match toolchain {
        Some(tc) => format!("{name}_gen({tc})"),
        None => format!("{name}_gen"),
    };
    let gen = gn.get(&companion)?;
    if gen.kind != "action" || gen.script.as_deref() != Some(config.proto_wrapper_script.as_str())
    {
        return None;
    }

    Some(ProtoMatch {
        plugin: plugin_from_args(&gen.args),
        desc: gen,
        via_companion: true,
    })
}

/// Extracts the protoc plugin from `--plugin=` arguments.
///
/// `--plugin=protoc-gen-plugin=gcc_like_host/protozero_plugin` and
/// `--plugin=protoc-gen-plugin=protozero_plugin` both yield `protozero`.
/// Without such an argument the plugin is `proto`.
pub(crate) fn plugin_from_args(args: &[String]) -> String {
    args.iter()
        .rfind(|a| a.starts_with("--plugin="))
        .and_then(|arg| arg.rsplit('=').next())
        .and_then(|path| path.rsplit('/').next())
        .map_or_else(
            || "proto".to_owned(),
            |file| file.strip_suffix("_plugin").unwrap_or(file).to_owned(),
        )
}

/// Decides the kind of a target on its first visit.
pub(crate) fn classify(
    name: &str,
    desc: &Descriptor,
    proto: Option<&ProtoMatch<'_>>,
) -> Result<TargetKind, ResolveError> {
    let raw = TargetKind::from_raw(&desc.kind).ok_or_else(|| {
        ResolveError::invariant(name, Violation::UnknownTargetType(desc.kind.clone()))
    })?;

    if let Some(proto) = proto {
        return Ok(TargetKind::ProtoLibrary {
            plugin: proto.plugin.clone(),
        });
    }

    // java_library-style templates name their top-level group `*_java`.
    if raw == TargetKind::Group && name.ends_with("_java") {
        return Ok(TargetKind::JavaGroup);
    }

    Ok(raw)
}

/// Name of a per-arch `__dex` action.
pub(crate) fn is_dex_stage(name: &str) -> bool {
    DEX_STAGE.is_match(name)
}

/// Name of a per-arch `__compile_java` action.
pub(crate) fn is_compile_java_stage(name: &str) -> bool {
    COMPILE_JAVA_STAGE.is_match(name)
}
