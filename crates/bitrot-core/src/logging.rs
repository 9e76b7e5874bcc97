//! Logging init: file under XDG state dir, or graceful fallback to stderr.
//!
//! Operator-facing output (flagged files, summary) goes to stdout directly;
//! tracing carries the diagnostic detail.

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,bitrot=debug,bitrot_core=debug";

/// Path of the log file: `~/.local/state/bitrot/bitrot.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("bitrot")?;
    Ok(xdg_dirs.get_state_home().join("bitrot").join("bitrot.log"))
}

/// Append structured logs to [`log_file_path`]. Errors (no home, unwritable
/// state dir, subscriber already set) are returned so `main` can fall back
/// to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let log_file_path = log_file_path()?;
    if let Some(log_dir) = log_file_path.parent() {
        fs::create_dir_all(log_dir)?;
    }

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {e}"))?;

    tracing::info!("bitrot logging initialized at {}", log_file_path.display());

    Ok(())
}

/// Stderr-only logging, warnings and up unless `RUST_LOG` says otherwise.
pub fn init_logging_stderr() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn log_file_lives_under_bitrot_state_dir() {
        let path = log_file_path().unwrap();
        assert!(path.ends_with(Path::new("bitrot").join("bitrot.log")));
    }
}
