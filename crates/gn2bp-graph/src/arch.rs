// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Target architectures.
use serde::{Deserialize, Serialize};

/// Architecture a target variant is built for.
///
/// Derived from the toolchain of a `gn desc` entry via
/// [`ResolverConfig::arch_for_toolchain`](crate::ResolverConfig::arch_for_toolchain).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
    /// Host toolchain (the default for any unknown toolchain).
    Host,
    /// 32-bit x86 Android.
    AndroidX86,
    /// 64-bit x86 Android.
    #[serde(rename = "android_x86_64")]
    AndroidX86_64,
    /// 32-bit ARM Android.
    AndroidArm,
    /// 64-bit ARM Android.
    AndroidArm64,
}

impl Arch {
    /// Every architecture, in declaration order.
    pub const ALL: [Arch; 5] = [
        Arch::Host,
        Arch::AndroidX86,
        Arch::AndroidX86_64,
        Arch::AndroidArm,
        Arch::AndroidArm64,
    ];

    /// Name used in target-name suffixes (`__dex__android_arm64`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Arch::Host => "host",
            Arch::AndroidX86 => "android_x86",
            Arch::AndroidX86_64 => "android_x86_64",
            Arch::AndroidArm => "android_arm",
            Arch::AndroidArm64 => "android_arm64",
        }
    }

    /// Whether this is a device (Android) architecture.
    pub const fn is_device(self) -> bool {
        !matches!(self, Arch::Host)
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
