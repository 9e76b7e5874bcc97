//! Check command: hash the paths on stdin and compare against the baseline.

use anyhow::Result;
use bitrot_core::check::{run_check, CheckOptions, CheckSummary};
use std::io;

/// Read the NUL-delimited path list from stdin and run one check, reporting
/// to stdout and per-file read failures to stderr.
pub fn run_check_command(opts: &CheckOptions) -> Result<CheckSummary> {
    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    run_check(opts, stdin, &mut stdout, &mut stderr)
}
