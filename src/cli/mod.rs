//! VG-007: CLI subcommands: init, check, update, status.

use crate::core::config::{Config, Overrides};
use crate::core::types::{Baseline, Classification, InitReport, UpdateReport, VerifyReport};
use crate::tripwire::hasher::HashAlgorithm;
use crate::tripwire::reconcile::Engine;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Options shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Baseline store file (default: vigil.lock.yaml)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Config file (default: vigil.yaml, if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Hash algorithm for new baselines
    #[arg(long, value_enum, global = true)]
    pub algorithm: Option<HashAlgorithm>,

    /// Hashing worker threads
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a fresh baseline for a file or directory, replacing any prior one
    Init {
        /// File or directory to snapshot
        path: PathBuf,
    },

    /// Compare files against the baseline (read-only)
    Check {
        /// File or directory to verify
        path: PathBuf,

        /// Exit non-zero on any modified or new file (for CI/cron)
        #[arg(long)]
        tripwire: bool,

        /// Like --tripwire, and also fail on unreadable or missing files
        #[arg(long)]
        strict: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Accept the current content of one file as known good
    Update {
        /// File whose record to replace
        path: PathBuf,
    },

    /// Show the stored baseline
    Status {
        /// Print the baseline as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(global: &GlobalArgs, cmd: Commands) -> Result<(), String> {
    let config = Config::resolve(
        global.config.as_deref(),
        Overrides {
            store: global.store.clone(),
            algorithm: global.algorithm,
            jobs: global.jobs,
        },
    )
    .map_err(|e| e.to_string())?;
    let engine = Engine::new(config);

    match cmd {
        Commands::Init { path } => cmd_init(&engine, &path),
        Commands::Check {
            path,
            tripwire,
            strict,
            json,
        } => cmd_check(&engine, &path, tripwire || strict, strict, json),
        Commands::Update { path } => cmd_update(&engine, &path),
        Commands::Status { json } => cmd_status(&engine, json),
    }
}

fn cmd_init(engine: &Engine, path: &Path) -> Result<(), String> {
    let report = engine.initialize(path).map_err(|e| e.to_string())?;
    write_init(&mut std::io::stdout().lock(), &report).map_err(|e| e.to_string())
}

fn cmd_check(
    engine: &Engine,
    path: &Path,
    tripwire: bool,
    strict: bool,
    json: bool,
) -> Result<(), String> {
    let report = engine.verify(path).map_err(|e| e.to_string())?;

    let mut out = std::io::stdout().lock();
    if json {
        write_json(&mut out, &report).map_err(|e| e.to_string())?;
    } else {
        write_verify(&mut out, &report).map_err(|e| e.to_string())?;
    }

    if tripwire && !report.verdict.is_clean() {
        let n = report.count(Classification::is_deviation);
        return Err(format!("{} deviation(s) from baseline", n));
    }
    if strict && report.has_blind_spots() {
        return Err(format!(
            "{} unreadable, {} missing",
            report.unreadable_count(),
            report.missing.len()
        ));
    }
    Ok(())
}

fn cmd_update(engine: &Engine, path: &Path) -> Result<(), String> {
    let report = engine.update_one(path).map_err(|e| e.to_string())?;
    write_update(&mut std::io::stdout().lock(), &report).map_err(|e| e.to_string())
}

fn cmd_status(engine: &Engine, json: bool) -> Result<(), String> {
    let baseline = engine.status().map_err(|e| e.to_string())?;
    let mut out = std::io::stdout().lock();
    if json {
        write_json(&mut out, &baseline.records()).map_err(|e| e.to_string())
    } else {
        write_status(&mut out, engine.store().path(), &baseline).map_err(|e| e.to_string())
    }
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

fn write_init(out: &mut impl Write, report: &InitReport) -> std::io::Result<()> {
    for u in &report.unreadable {
        writeln!(out, "  UNREADABLE  {} ({})", u.path.display(), u.reason)?;
    }
    for s in &report.skipped {
        writeln!(out, "  SKIPPED     {} ({})", s.path, s.reason)?;
    }
    writeln!(
        out,
        "Baseline initialized: {} file(s) under {} [{}] -> {}",
        report.recorded.len(),
        report.root,
        report.algorithm,
        report.store.display()
    )?;
    if !report.unreadable.is_empty() {
        writeln!(
            out,
            "  {} unreadable file(s) not recorded",
            report.unreadable.len()
        )?;
    }
    Ok(())
}

fn write_verify(out: &mut impl Write, report: &VerifyReport) -> std::io::Result<()> {
    writeln!(
        out,
        "Checking {} ({} files, {})...",
        report.root,
        report.outcomes.len(),
        report.algorithm
    )?;

    for o in &report.outcomes {
        match &o.classification {
            Classification::Unmodified => writeln!(out, "  UNMODIFIED  {}", o.path)?,
            Classification::Modified { expected, actual } => {
                writeln!(out, "  MODIFIED    {}", o.path)?;
                writeln!(out, "    Expected: {}", expected)?;
                writeln!(out, "    Actual:   {}", actual)?;
            }
            Classification::New { .. } => writeln!(out, "  NEW         {}", o.path)?,
            Classification::Unreadable { reason } => {
                writeln!(out, "  UNREADABLE  {} ({})", o.path, reason)?
            }
        }
    }
    for p in &report.missing {
        writeln!(out, "  MISSING     {}", p)?;
    }
    for s in &report.skipped {
        writeln!(out, "  SKIPPED     {} ({})", s.path, s.reason)?;
    }

    let unmodified = report.count(|c| matches!(c, Classification::Unmodified));
    let modified = report.count(|c| matches!(c, Classification::Modified { .. }));
    let new = report.count(|c| matches!(c, Classification::New { .. }));

    writeln!(out)?;
    writeln!(
        out,
        "Verdict: {} ({} unmodified, {} modified, {} new, {} unreadable, {} missing)",
        report.verdict,
        unmodified,
        modified,
        new,
        report.unreadable_count(),
        report.missing.len()
    )
}

fn write_update(out: &mut impl Write, report: &UpdateReport) -> std::io::Result<()> {
    let action = match &report.previous {
        Some(prev) if *prev == report.record.digest => "Unchanged",
        Some(_) => "Replaced",
        None => "Added",
    };
    writeln!(out, "{}: {}", action, report.record.path)?;
    if let Some(prev) = &report.previous {
        writeln!(out, "  Previous: {}", prev)?;
    }
    writeln!(out, "  Current:  {}", report.record.digest)
}

fn write_status(out: &mut impl Write, store: &Path, baseline: &Baseline) -> std::io::Result<()> {
    writeln!(out, "Baseline: {}", store.display())?;
    writeln!(out, "  Algorithm: {}", baseline.algorithm())?;
    writeln!(out, "  Records:   {}", baseline.len())?;
    for (path, digest) in baseline.iter() {
        writeln!(out, "    {}  {}", digest, path)?;
    }
    Ok(())
}
