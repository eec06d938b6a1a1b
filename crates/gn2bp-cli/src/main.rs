// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! `gn2bp`: resolve GN targets into a finalized, per-arch target graph.
//!
//! Invariants:
//! - Resolution is all-or-nothing; any error exits non-zero with nothing on stdout.
//! - stdout carries only the rendered graph; logs go to stderr.

mod desc;
mod render;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gn2bp_config::{ConfigService, ConfigStore, FsConfigStore};
use gn2bp_graph::{Resolver, ResolverConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Key the resolver config is stored under (`resolver.json`).
const CONFIG_KEY: &str = "resolver";

#[derive(Parser)]
#[command(
    name = "gn2bp",
    version,
    about = "Resolve GN desc output into a finalized target graph",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one or more root targets and print the resulting graph.
    Resolve(ResolveArgs),
    /// Write the default resolver config.
    InitConfig(InitConfigArgs),
}

#[derive(Args)]
struct ResolveArgs {
    /// Read the project description from a `gn desc --format=json` dump.
    #[arg(long, value_name = "FILE", required_unless_present = "gn_out")]
    desc: Option<PathBuf>,

    /// Run `gn desc` against this output directory instead of reading a dump.
    #[arg(long, value_name = "DIR", conflicts_with = "desc")]
    gn_out: Option<PathBuf>,

    /// The `gn` executable used with `--gn-out`.
    #[arg(long, value_name = "PATH", default_value = "gn", requires = "gn_out")]
    gn: PathBuf,

    /// Directory holding `resolver.json` (defaults to the platform config dir).
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Root labels to resolve, e.g. `//net:net`.
    #[arg(required = true, value_name = "TARGET")]
    targets: Vec<String>,
}

#[derive(Args)]
struct InitConfigArgs {
    /// Directory to write `resolver.json` into (defaults to the platform config dir).
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Overwrite an existing config.
    #[arg(long)]
    force: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Pretty JSON object keyed by target name.
    Json,
    /// One line per target.
    Summary,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve(args) => run_resolve(args),
        Commands::InitConfig(args) => run_init_config(args),
    }
}

fn config_service(dir: Option<PathBuf>) -> Result<ConfigService<FsConfigStore>> {
    let store = match dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new().context("failed to locate the user config directory")?,
    };
    Ok(ConfigService::new(store))
}

fn run_resolve(args: ResolveArgs) -> Result<()> {
    let service = config_service(args.config_dir)?;
    let config: ResolverConfig = service
        .load_or_default(CONFIG_KEY)
        .with_context(|| {
            format!(
                "failed to load {}",
                service.store().path_for(CONFIG_KEY).display()
            )
        })?;

    let gn_desc = match (args.desc, args.gn_out) {
        (Some(path), _) => desc::from_file(&path)?,
        (None, Some(out_dir)) => desc::from_gn(&args.gn, &out_dir)?,
        (None, None) => bail!("either --desc or --gn-out is required"),
    };
    info!(targets = gn_desc.len(), "loaded project description");

    let mut resolver = Resolver::new(&gn_desc, config);
    for label in &args.targets {
        resolver
            .resolve(label)
            .with_context(|| format!("failed to resolve {label}"))?;
    }
    let graph = resolver.finish();
    info!(
        resolved = graph.len(),
        java_sources = graph.java_sources().len(),
        "resolution complete"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.format {
        Format::Json => render::json(&mut out, &graph)?,
        Format::Summary => render::summary(&mut out, &graph)?,
    }
    out.flush()?;
    Ok(())
}

fn run_init_config(args: InitConfigArgs) -> Result<()> {
    let service = config_service(args.config_dir)?;
    let path = service.store().path_for(CONFIG_KEY);
    if service.store().exists(CONFIG_KEY) && !args.force {
        bail!(
            "{} already exists (pass --force to overwrite)",
            path.display()
        );
    }
    service
        .save(CONFIG_KEY, &ResolverConfig::default())
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote default resolver config");
    Ok(())
}
