// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Output renderers.

use std::io::Write;

use anyhow::Result;
use gn2bp_graph::{Arch, Target, TargetGraph};

/// Pretty JSON, one entry per target name.
pub fn json(out: &mut impl Write, graph: &TargetGraph) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, graph)?;
    writeln!(out)?;
    Ok(())
}

/// Tab-separated line per target, followed by the harvested java source count.
pub fn summary(out: &mut impl Write, graph: &TargetGraph) -> Result<()> {
    for target in graph.iter() {
        writeln!(out, "{}", summary_line(target))?;
    }
    writeln!(out, "java_sources\t{}", graph.java_sources().len())?;
    Ok(())
}

fn summary_line(target: &Target) -> String {
    let arches: Vec<&str> = target.arch.keys().copied().map(Arch::as_str).collect();
    let mut flags = Vec::new();
    if target.testonly {
        flags.push("testonly");
    }
    if target.is_third_party {
        flags.push("third_party");
    }
    if target.rtti {
        flags.push("rtti");
    }
    format!(
        "{}\t{}\tarch={}\tsources={}\tdeps={}\t{}",
        target.name,
        target.kind,
        arches.join(","),
        target.sources.len(),
        target.deps.len(),
        flags.join(",")
    )
    .trim_end()
    .to_owned()
}
