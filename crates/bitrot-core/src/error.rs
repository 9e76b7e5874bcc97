//! Typed errors for per-file hashing and baseline row parsing.
//!
//! Both are recoverable: a failed file is skipped and a malformed row is
//! dropped, so callers classify them here before deciding what to report.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure while hashing a single file. Never aborts the batch.
#[derive(Debug, Error)]
pub enum HashError {
    /// The path was listed but no longer exists (deleted between listing and hashing).
    #[error("vanished before read: {}", .path.display())]
    Vanished { path: PathBuf },

    /// The path exists but could not be opened (permissions, special file, ...).
    #[error("failed to open {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file opened but its change time could not be read.
    #[error("failed to read change time of {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the content failed part-way.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HashError {
    pub fn path(&self) -> &Path {
        match self {
            HashError::Vanished { path }
            | HashError::Unreadable { path, .. }
            | HashError::Metadata { path, .. }
            | HashError::Read { path, .. } => path,
        }
    }

    /// Vanished files are an expected race and are not reported to the operator.
    pub fn is_vanished(&self) -> bool {
        matches!(self, HashError::Vanished { .. })
    }
}

/// Error parsing a hex-encoded digest.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DigestParseError {
    #[error("digest must be {expected} hex chars, got {got}")]
    Length { expected: usize, got: usize },
    #[error("invalid hex in digest: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Reason a baseline row was skipped on load.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RowError {
    #[error("expected 3 fields, got {0}")]
    FieldCount(usize),
    #[error("change time is not an integer")]
    ChangeTime,
    #[error("digest is not ASCII hex")]
    DigestEncoding,
    #[error(transparent)]
    Digest(#[from] DigestParseError),
    #[error("empty path")]
    EmptyPath,
}
