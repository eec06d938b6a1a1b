// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! GN label helpers.
//!
//! A GN label looks like `//dir:name(//toolchain/dir:toolchain_name)`; the
//! parenthesized toolchain is present for targets built outside the default
//! toolchain.
use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::expect_used)]
static LEADING_ROOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^//:?").expect("valid regex"));

#[allow(clippy::expect_used)]
static NON_IDENT_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_]").expect("valid regex"));

/// Strips the parenthesized toolchain from a label.
///
/// `//buildtools:protobuf(//gn/standalone/toolchain:gcc_like_host)` becomes
/// `//buildtools:protobuf`.
pub fn label_without_toolchain(label: &str) -> &str {
    split_toolchain(label).0
}

/// Splits a label into its name and its toolchain (without parentheses).
pub fn split_toolchain(label: &str) -> (&str, Option<&str>) {
    match label.split_once('(') {
        Some((name, rest)) => (name, Some(rest.strip_suffix(')').unwrap_or(rest))),
        None => (label, None),
    }
}

/// Turns a GN output label (e.g. `//some_dir/file.cc`) into a path.
///
/// Returns `None` for strings that are not source-absolute labels.
pub fn label_to_path(label: &str) -> Option<&str> {
    let path = label.strip_prefix("//")?;
    Some(if path.is_empty() { "./" } else { path })
}

/// Turns a label into a target name involving the full path.
///
/// `//src/perfetto:tests` becomes `src_perfetto_tests`.
pub fn label_to_target_name_with_path(label: &str) -> String {
    let name = LEADING_ROOT.replace(label, "");
    NON_IDENT_CHAR.replace_all(&name, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_toolchain() {
        assert_eq!(
            label_without_toolchain("//buildtools:protobuf(//gn/standalone/toolchain:gcc_like_host)"),
            "//buildtools:protobuf"
        );
        assert_eq!(label_without_toolchain("//a:b"), "//a:b");
    }

    #[test]
    fn splits_toolchain() {
        assert_eq!(
            split_toolchain("//a:b(//tc:x)"),
            ("//a:b", Some("//tc:x"))
        );
        assert_eq!(split_toolchain("//a:b"), ("//a:b", None));
    }

    #[test]
    fn path_of_label() {
        assert_eq!(label_to_path("//some_dir/file.cc"), Some("some_dir/file.cc"));
        assert_eq!(label_to_path("//"), Some("./"));
        assert_eq!(label_to_path("relative/file.cc"), None);
    }

    #[test]
    fn target_name_with_path() {
        assert_eq!(
            label_to_target_name_with_path("//src/perfetto:tests"),
            "src_perfetto_tests"
        );
        assert_eq!(label_to_target_name_with_path("//:root-lib"), "root_lib");
    }
}
