// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resolution errors.
use thiserror::Error;

/// A descriptor the resolver cannot make sense of.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// The raw `type` is not one the resolver knows how to model.
    #[error("unsupported target type `{0}`")]
    UnknownTargetType(String),
    /// A protobuf library lists a source that is not a `.proto` file.
    #[error("proto library source `{0}` does not end in .proto")]
    NonProtoSource(String),
}

/// Fatal resolution failure. No partial graph is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A referenced label is absent from the project description.
    #[error("[GN_LOOKUP_FAILURE] label not in project description: {label}")]
    LookupFailure {
        /// The missing label.
        label: String,
    },
    /// Malformed or unsupported input.
    #[error("[GN_INVARIANT] {label}: {violation}")]
    InvariantViolation {
        /// Target being resolved.
        label: String,
        /// What was wrong with it.
        violation: Violation,
    },
}

impl ResolveError {
    pub(crate) fn lookup(label: &str) -> Self {
        Self::LookupFailure {
            label: label.to_owned(),
        }
    }

    pub(crate) fn invariant(label: &str, violation: Violation) -> Self {
        Self::InvariantViolation {
            label: label.to_owned(),
            violation,
        }
    }
}
