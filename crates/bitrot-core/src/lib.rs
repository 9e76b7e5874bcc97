//! Silent-corruption detection for a caller-supplied list of files.
//!
//! Each run hashes the listed files, compares them against the stored
//! baseline and flags any file whose content changed while its change time
//! did not. The observed state then becomes the next baseline.

pub mod config;
pub mod logging;

pub mod baseline;
pub mod check;
pub mod compare;
pub mod error;
pub mod hasher;
pub mod input;
pub mod record;

pub use check::{run_check, run_check_with, CheckOptions, CheckSummary};
pub use compare::{compare, next_baseline, Comparison, FlaggedPolicy, Verdict};
pub use error::HashError;
pub use hasher::{ChangeTimeSource, FsChangeTime, Hasher};
pub use record::{Baseline, Digest, FileRecord, Observation};
