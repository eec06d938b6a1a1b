// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `gn desc --format=json` models.
//!
//! Only the fields the resolver reads are modelled; anything else in the dump
//! is ignored. Every field is optional.
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::label::label_without_toolchain;

/// One target entry of a GN project description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Descriptor {
    /// Raw GN target type (`source_set`, `action`, ...). Validated when the
    /// resolver builds a target from it.
    #[serde(rename = "type")]
    pub kind: String,
    /// Toolchain label the target is built with.
    pub toolchain: Option<String>,
    /// Source files.
    pub sources: Vec<String>,
    /// Dependency labels.
    pub deps: Vec<String>,
    /// C compiler flags.
    pub cflags: Vec<String>,
    /// C++-only compiler flags.
    pub cflags_cc: Vec<String>,
    /// Preprocessor defines.
    pub defines: Vec<String>,
    /// Header search paths.
    pub include_dirs: Vec<String>,
    /// Libraries to link.
    pub libs: Vec<String>,
    /// Linker flags.
    pub ldflags: Vec<String>,
    /// Whether the target is test-only.
    pub testonly: bool,
    /// Public headers. GN emits the bare string `"*"` for "all sources".
    #[serde(deserialize_with = "string_or_seq")]
    pub public: Vec<String>,
    /// Action inputs.
    pub inputs: Vec<String>,
    /// Action outputs.
    pub outputs: Vec<String>,
    /// Action script.
    pub script: Option<String>,
    /// Action arguments.
    pub args: Vec<String>,
    /// Action response-file lines.
    pub response_file_contents: Vec<String>,
    /// Free-form metadata (`import_dirs`, `exports`, `proto_library_sources`).
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Descriptor {
    /// Whether `key` is declared in the metadata (even with an empty list).
    pub fn has_metadata(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }

    /// String entries of a metadata list; non-string entries are skipped.
    pub fn metadata_strings(&self, key: &str) -> Vec<String> {
        match self.metadata.get(key) {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect(),
            Some(serde_json::Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// The argument following `flag` in `args`, if any.
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        let pos = self.args.iter().position(|a| a == flag)?;
        self.args.get(pos + 1).map(String::as_str)
    }
}

fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// Errors while loading a project description.
#[derive(Debug, Error)]
pub enum DescError {
    /// The description file could not be read.
    #[error("[GN_DESC_IO] {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The description is not valid `gn desc` JSON.
    #[error("[GN_DESC_JSON] {0}")]
    Json(#[from] serde_json::Error),
}

/// A whole-project description: label to [`Descriptor`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GnDesc {
    targets: BTreeMap<String, Descriptor>,
}

impl GnDesc {
    /// Parses a JSON dump.
    pub fn from_json_str(json: &str) -> Result<Self, DescError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses a JSON dump from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DescError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Reads and parses a JSON dump from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DescError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| DescError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, label: impl Into<String>, desc: Descriptor) {
        self.targets.insert(label.into(), desc);
    }

    /// Looks up `label`, falling back to the label without its toolchain.
    pub fn get(&self, label: &str) -> Option<&Descriptor> {
        self.targets
            .get(label)
            .or_else(|| self.targets.get(label_without_toolchain(label)))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the description has no entries.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// All labels, sorted.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Descriptor)> for GnDesc {
    fn from_iter<I: IntoIterator<Item = (String, Descriptor)>>(iter: I) -> Self {
        Self {
            targets: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn public_accepts_star_string_and_list() {
        let desc = GnDesc::from_json_str(
            r#"{
                "//a:star": { "type": "source_set", "public": "*" },
                "//a:list": { "type": "source_set", "public": ["a.h", "b.h"] },
                "//a:none": { "type": "source_set" }
            }"#,
        )
        .unwrap();
        assert_eq!(desc.get("//a:star").unwrap().public, vec!["*"]);
        assert_eq!(desc.get("//a:list").unwrap().public, vec!["a.h", "b.h"]);
        assert!(desc.get("//a:none").unwrap().public.is_empty());
    }

    #[test]
    fn lookup_falls_back_to_default_toolchain_entry() {
        let desc = GnDesc::from_json_str(r#"{ "//a:b": { "type": "group" } }"#).unwrap();
        assert!(desc.get("//a:b(//tc:host)").is_some());
        assert!(desc.get("//a:c").is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let desc = GnDesc::from_json_str(
            r#"{ "//a:b": { "type": "executable", "visibility": ["*"], "all_dependent_configs": [] } }"#,
        )
        .unwrap();
        assert_eq!(desc.get("//a:b").unwrap().kind, "executable");
    }

    #[test]
    fn metadata_helpers() {
        let desc = GnDesc::from_json_str(
            r#"{ "//p:p": { "type": "source_set", "metadata": {
                "import_dirs": ["src", 3], "proto_library_sources": [] } } }"#,
        )
        .unwrap();
        let p = desc.get("//p:p").unwrap();
        assert!(p.has_metadata("proto_library_sources"));
        assert!(!p.has_metadata("exports"));
        assert_eq!(p.metadata_strings("import_dirs"), vec!["src"]);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            GnDesc::from_json_str("{ not json"),
            Err(DescError::Json(_))
        ));
    }
}
