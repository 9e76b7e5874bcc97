use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::compare::FlaggedPolicy;
use crate::hasher::DEFAULT_CHUNK_SIZE;

/// Global configuration loaded from `~/.config/bitrot/config.toml`.
/// Missing keys fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BitrotConfig {
    /// Read chunk size in bytes when hashing. Any value works; it only bounds memory.
    pub chunk_size: usize,
    /// Number of files hashed concurrently (1 = sequential).
    pub jobs: usize,
    /// Keep the last-known-good record for flagged files instead of advancing
    /// the baseline to the corrupted content.
    pub keep_last_good: bool,
    /// Exit with status 2 when any file is flagged.
    pub fail_on_flagged: bool,
}

impl Default for BitrotConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            jobs: 1,
            keep_last_good: false,
            fail_on_flagged: false,
        }
    }
}

impl BitrotConfig {
    pub fn flagged_policy(&self) -> FlaggedPolicy {
        if self.keep_last_good {
            FlaggedPolicy::KeepLastGood
        } else {
            FlaggedPolicy::Advance
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("bitrot")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BitrotConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BitrotConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path. The file must exist.
pub fn load_from_path(path: &Path) -> Result<BitrotConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: BitrotConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
