//! One check run: load baseline, hash the listed files, compare, save, report.
//!
//! The new baseline is saved even when files were flagged. By default it is
//! the observation of this run, so a corruption is reported once; with
//! [`FlaggedPolicy::KeepLastGood`] it keeps being reported.

use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::baseline;
use crate::compare::{self, FlaggedPolicy};
use crate::config::BitrotConfig;
use crate::hasher::{ChangeTimeSource, FsChangeTime, HashStats, Hasher};
use crate::input::read_path_list;

/// Settings for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    pub baseline_path: PathBuf,
    pub chunk_size: usize,
    pub jobs: usize,
    pub policy: FlaggedPolicy,
}

impl CheckOptions {
    pub fn from_config(baseline_path: PathBuf, cfg: &BitrotConfig) -> Self {
        Self {
            baseline_path,
            chunk_size: cfg.chunk_size,
            jobs: cfg.jobs,
            policy: cfg.flagged_policy(),
        }
    }
}

/// What a run found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub listed: usize,
    pub compared: usize,
    pub flagged: Vec<PathBuf>,
    pub hash: HashStats,
    pub skipped_rows: usize,
}

impl CheckSummary {
    pub fn has_flagged(&self) -> bool {
        !self.flagged.is_empty()
    }
}

/// Run a check with the real filesystem change-time source.
///
/// `input` supplies the NUL-delimited path list, `out` receives the report and
/// `err` receives per-file read failures.
pub fn run_check<R, W, E>(
    opts: &CheckOptions,
    input: R,
    out: &mut W,
    err: &mut E,
) -> Result<CheckSummary>
where
    R: Read,
    W: Write,
    E: Write,
{
    let hasher = Hasher::with_clock(opts.chunk_size, FsChangeTime);
    run_check_with(opts, &hasher, input, out, err)
}

/// Same as [`run_check`] with a caller-supplied hasher.
pub fn run_check_with<C, R, W, E>(
    opts: &CheckOptions,
    hasher: &Hasher<C>,
    input: R,
    out: &mut W,
    err: &mut E,
) -> Result<CheckSummary>
where
    C: ChangeTimeSource,
    R: Read,
    W: Write,
    E: Write,
{
    let (stored, load_report) = baseline::load(&opts.baseline_path)?;

    let paths = read_path_list(input).context("read path list from input")?;
    let listed = paths.len();
    tracing::info!(listed, jobs = opts.jobs, "hashing listed files");

    let outcome = hasher.compute_all(paths, opts.jobs);
    for failure in &outcome.failures {
        writeln!(err, "Failed read: {}", failure.path().display())?;
    }

    let comparison = compare::compare(&stored, &outcome.observation);
    for path in &comparison.flagged {
        tracing::error!(path = %path.display(), "content changed without change time update");
        writeln!(out, "Difference in {}", path.display())?;
    }

    let next = compare::next_baseline(&stored, outcome.observation, &comparison, opts.policy);
    baseline::save(&next, &opts.baseline_path)?;

    writeln!(out, "{} files compared", comparison.compared)?;
    if comparison.has_flagged() {
        writeln!(out, "{} FILE ERRORS!!!", comparison.flagged.len())?;
    }
    out.flush()?;

    tracing::info!(
        compared = comparison.compared,
        verified = comparison.verified,
        modified = comparison.modified,
        new = comparison.new,
        flagged = comparison.flagged.len(),
        failed = outcome.stats.failed,
        vanished = outcome.stats.vanished,
        "check finished"
    );

    Ok(CheckSummary {
        listed,
        compared: comparison.compared,
        flagged: comparison.flagged,
        hash: outcome.stats,
        skipped_rows: load_report.skipped_rows,
    })
}
