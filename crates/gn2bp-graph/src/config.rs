// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resolver configuration.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::arch::Arch;

/// Namespace of build-tooling targets that are never expanded.
pub const DEFAULT_THIRD_PARTY_PREFIX: &str = "//gn";

/// Script run by the `_gen` action of every protoc-generated library.
pub const DEFAULT_PROTO_WRAPPER_SCRIPT: &str = "//tools/protoc_wrapper/protoc_wrapper.py";

const DEFAULT_JAVA_GEN_EXCLUDE_PREFIX: &str = "//out/test/gen/";

/// Knobs for a resolution run.
///
/// Every field has a default, so a partial JSON document (or `{}`) is a valid
/// config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Labels starting with this prefix become opaque leaves.
    pub third_party_prefix: String,
    /// Script path identifying protoc wrapper actions.
    pub proto_wrapper_script: String,
    /// Toolchain label to architecture. Unlisted toolchains are [`Arch::Host`].
    pub arch_toolchains: BTreeMap<String, Arch>,
    /// Generated java files under this prefix are not harvested.
    pub java_gen_exclude_prefix: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        let arch_toolchains = [
            ("//build/toolchain/android:android_clang_x86", Arch::AndroidX86),
            ("//build/toolchain/android:android_clang_x64", Arch::AndroidX86_64),
            ("//build/toolchain/android:android_clang_arm", Arch::AndroidArm),
            ("//build/toolchain/android:android_clang_arm64", Arch::AndroidArm64),
        ]
        .into_iter()
        .map(|(toolchain, arch)| (toolchain.to_owned(), arch))
        .collect();

        Self {
            third_party_prefix: DEFAULT_THIRD_PARTY_PREFIX.to_owned(),
            proto_wrapper_script: DEFAULT_PROTO_WRAPPER_SCRIPT.to_owned(),
            arch_toolchains,
            java_gen_exclude_prefix: DEFAULT_JAVA_GEN_EXCLUDE_PREFIX.to_owned(),
        }
    }
}

impl ResolverConfig {
    /// Maps a toolchain label to its architecture.
    pub fn arch_for_toolchain(&self, toolchain: Option<&str>) -> Arch {
        toolchain
            .and_then(|tc| self.arch_toolchains.get(tc))
            .copied()
            .unwrap_or(Arch::Host)
    }

    /// Whether `label` lives in the build-tooling namespace.
    ///
    /// The prefix must end on a path boundary: with `//gn`, `//gn:x` and
    /// `//gn/base:x` match but `//gnss:hal` does not.
    pub fn is_third_party(&self, label: &str) -> bool {
        let prefix = self.third_party_prefix.as_str();
        if prefix.is_empty() {
            return false;
        }
        label.strip_prefix(prefix).is_some_and(|rest| {
            rest.is_empty() || prefix.ends_with(['/', ':']) || rest.starts_with(['/', ':', '('])
        })
    }
}
