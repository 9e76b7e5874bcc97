//! CLI for the bitrot corruption detector.

mod commands;

use anyhow::Result;
use bitrot_core::check::CheckOptions;
use bitrot_core::config::{self, BitrotConfig};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use commands::run_check_command;

/// Exit status when `--fail-on-flagged` is set and at least one file was flagged.
pub const EXIT_FLAGGED: u8 = 2;

/// Exit status for usage errors and fatal failures.
pub const EXIT_FAILURE: u8 = 1;

/// Top-level CLI: one positional argument, the baseline file.
#[derive(Debug, Parser)]
#[command(name = "bitrot")]
#[command(about = "Detect silent file corruption by comparing MD5 sums against a saved baseline")]
#[command(long_about = "Compute MD5 sums of a list of files, compare them against a stored \
    list of sums, report any differences if the file change time (ctime) hasn't \
    changed, and update the stored list of sums. The list of files to check must \
    be provided on stdin, NUL-terminated.")]
#[command(after_help = "Example:\n  find / /home -xdev -type f -print0 | bitrot md5sum_savefile")]
pub struct Cli {
    /// Baseline file holding the stored sums (created on first run).
    pub savefile: PathBuf,

    /// Hash up to N files concurrently.
    #[arg(long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Read files in chunks of this many bytes.
    #[arg(long, value_name = "BYTES")]
    pub chunk_size: Option<usize>,

    /// Keep the last-known-good sum for flagged files so they are reported again next run.
    #[arg(long, overrides_with = "no_keep_last_good")]
    pub keep_last_good: bool,

    /// Store the observed sum for flagged files (overrides `keep_last_good` in the config).
    #[arg(long, overrides_with = "keep_last_good")]
    pub no_keep_last_good: bool,

    /// Exit with status 2 if any file is flagged.
    #[arg(long, overrides_with = "no_fail_on_flagged")]
    pub fail_on_flagged: bool,

    /// Exit with status 0 even if files are flagged (overrides `fail_on_flagged` in the config).
    #[arg(long, overrides_with = "fail_on_flagged")]
    pub no_fail_on_flagged: bool,

    /// Read configuration from this file instead of ~/.config/bitrot/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config.
    pub fn merge_config(&self, mut cfg: BitrotConfig) -> BitrotConfig {
        if let Some(jobs) = self.jobs {
            cfg.jobs = jobs;
        }
        if let Some(chunk_size) = self.chunk_size {
            cfg.chunk_size = chunk_size;
        }
        if self.keep_last_good {
            cfg.keep_last_good = true;
        } else if self.no_keep_last_good {
            cfg.keep_last_good = false;
        }
        if self.fail_on_flagged {
            cfg.fail_on_flagged = true;
        } else if self.no_fail_on_flagged {
            cfg.fail_on_flagged = false;
        }
        cfg
    }

    fn load_config(&self) -> Result<BitrotConfig> {
        match &self.config {
            Some(path) => config::load_from_path(path),
            None => config::load_or_init(),
        }
    }
}

/// Parse arguments, run one check and map the outcome to an exit status.
/// Usage errors (including `--help`) print to stderr and exit with status 1.
pub fn run_from_args() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprint!("{}", err.render());
            return Ok(ExitCode::from(EXIT_FAILURE));
        }
    };

    let cfg = cli.merge_config(cli.load_config()?);
    tracing::debug!("loaded config: {:?}", cfg);

    let opts = CheckOptions::from_config(cli.savefile.clone(), &cfg);
    let summary = run_check_command(&opts)?;

    if cfg.fail_on_flagged && summary.has_flagged() {
        return Ok(ExitCode::from(EXIT_FLAGGED));
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests;
