// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Loading the project description.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use gn2bp_graph::GnDesc;
use tracing::debug;

/// Parse a saved `gn desc --format=json` dump.
pub fn from_file(path: &Path) -> Result<GnDesc> {
    GnDesc::from_path(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Run `gn desc <out_dir> //* --format=json --all-toolchains` and parse its stdout.
pub fn from_gn(gn: &Path, out_dir: &Path) -> Result<GnDesc> {
    debug!(gn = %gn.display(), out_dir = %out_dir.display(), "running gn desc");
    let output = Command::new(gn)
        .arg("desc")
        .arg(out_dir)
        .args(["//*", "--format=json", "--all-toolchains"])
        .output()
        .with_context(|| format!("failed to spawn `{}` (is gn installed?)", gn.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "gn desc failed (exit status: {}): {}",
            output.status,
            stderr.trim()
        );
    }

    GnDesc::from_reader(output.stdout.as_slice()).context("gn desc produced invalid JSON")
}
