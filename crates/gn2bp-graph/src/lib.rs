// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! gn2bp-graph: resolves GN project descriptions into build targets.
//!
//! GN `source_set`s have no equivalent in Soong: their cflags, defines and
//! dependencies are expected to propagate to whatever linker unit consumes
//! them. The [`Resolver`] simulates that propagation while walking the
//! `gn desc` graph, detects protobuf libraries and the protoc plugin they use,
//! and keeps per-architecture attributes apart until [`Resolver::finish`]
//! hoists the part shared by every architecture onto the target itself.
//!
//! Resolution is a two-phase protocol:
//! 1. [`Resolver::resolve`] (repeatable, memoized) accumulates attributes into
//!    per-architecture records.
//! 2. [`Resolver::finish`] finalizes every target and returns the immutable
//!    [`TargetGraph`].
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod arch;
mod classify;
mod config;
mod descriptor;
mod error;
mod graph;
pub mod label;
mod resolver;
mod target;

pub use arch::Arch;
pub use config::{ResolverConfig, DEFAULT_PROTO_WRAPPER_SCRIPT, DEFAULT_THIRD_PARTY_PREFIX};
pub use descriptor::{DescError, Descriptor, GnDesc};
pub use error::{ResolveError, Violation};
pub use graph::TargetGraph;
pub use resolver::Resolver;
pub use target::{ArchAttrs, Target, TargetId, TargetKind};
