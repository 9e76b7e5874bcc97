//! Streaming MD5 of listed files, paired with their change time.
//!
//! Files are read in chunks so memory use is bounded regardless of file size.
//! The change time is taken from the opened handle before hashing starts and
//! is never re-read afterwards; a file modified mid-read can therefore yield
//! a (change time, digest) pair that does not match any single state of the
//! file. That window is accepted.

use std::collections::VecDeque;
use std::fs::{File, Metadata, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;

use md5::{Digest as _, Md5};

use crate::error::HashError;
use crate::record::{Digest, FileRecord, Observation, DIGEST_LEN};

/// Default read chunk size (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Largest accepted chunk size (64 MiB); larger values are clamped.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Source of a file's change time. Swapped out in tests to simulate races
/// and fixed timestamps without depending on filesystem timing.
pub trait ChangeTimeSource: Send + Sync {
    /// Change time of the opened `file` in whole seconds since the Unix epoch.
    fn change_time(&self, file: &File, path: &Path) -> io::Result<i64>;
}

/// Reads `st_ctime` from the open handle (mtime on platforms without ctime).
#[derive(Debug, Clone, Copy, Default)]
pub struct FsChangeTime;

impl ChangeTimeSource for FsChangeTime {
    fn change_time(&self, file: &File, _path: &Path) -> io::Result<i64> {
        metadata_change_time(&file.metadata()?)
    }
}

#[cfg(unix)]
fn metadata_change_time(meta: &Metadata) -> io::Result<i64> {
    use std::os::unix::fs::MetadataExt;
    Ok(meta.ctime())
}

#[cfg(not(unix))]
fn metadata_change_time(meta: &Metadata) -> io::Result<i64> {
    use std::time::UNIX_EPOCH;
    let modified = meta.modified()?;
    Ok(match modified.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    })
}

/// Counters for one `compute_all` batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashStats {
    pub hashed: usize,
    pub vanished: usize,
    pub failed: usize,
}

/// Result of hashing a batch: the observation plus per-file failures worth
/// reporting (vanished files are counted but not listed).
#[derive(Debug, Default)]
pub struct HashOutcome {
    pub observation: Observation,
    pub stats: HashStats,
    pub failures: Vec<HashError>,
}

impl HashOutcome {
    fn record(&mut self, path: PathBuf, result: Result<FileRecord, HashError>) {
        match result {
            Ok(rec) => {
                self.stats.hashed += 1;
                self.observation.insert(path, rec);
            }
            Err(err) if err.is_vanished() => {
                self.stats.vanished += 1;
                tracing::debug!(path = %path.display(), "skipping vanished file");
            }
            Err(err) => {
                self.stats.failed += 1;
                tracing::warn!(error = %err, "skipping unreadable file");
                self.failures.push(err);
            }
        }
    }
}

/// Streams files through MD5 with a configurable chunk size.
#[derive(Debug, Clone)]
pub struct Hasher<C = FsChangeTime> {
    chunk_size: usize,
    clock: C,
}

impl Hasher<FsChangeTime> {
    pub fn new(chunk_size: usize) -> Self {
        Self::with_clock(chunk_size, FsChangeTime)
    }
}

impl<C: ChangeTimeSource> Hasher<C> {
    /// Build a hasher with a custom change-time source. The chunk size is
    /// clamped to `1..=MAX_CHUNK_SIZE`.
    pub fn with_clock(chunk_size: usize, clock: C) -> Self {
        Self {
            chunk_size: chunk_size.clamp(1, MAX_CHUNK_SIZE),
            clock,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Hash one file. The handle is closed before returning on every path.
    /// Anything but a regular file (directory, FIFO, device) is rejected as
    /// unreadable without reading from it.
    pub fn compute_one(&self, path: &Path) -> Result<FileRecord, HashError> {
        let mut file = open_regular(path)?;
        let change_time = self
            .clock
            .change_time(&file, path)
            .map_err(|source| HashError::Metadata {
                path: path.to_path_buf(),
                source,
            })?;
        let digest = self
            .stream_digest(&mut file)
            .map_err(|source| HashError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(FileRecord {
            change_time,
            digest,
        })
    }

    /// Hash every path. With `jobs > 1` a bounded pool of worker threads is
    /// used; the observation is the same either way since results are keyed
    /// by path and applied in input order.
    pub fn compute_all(&self, paths: Vec<PathBuf>, jobs: usize) -> HashOutcome {
        let results: Vec<(PathBuf, Result<FileRecord, HashError>)> = if jobs <= 1 || paths.len() <= 1 {
            paths
                .into_iter()
                .map(|path| {
                    let result = self.compute_one(&path);
                    (path, result)
                })
                .collect()
        } else {
            self.compute_pooled(paths, jobs)
        };

        let mut outcome = HashOutcome::default();
        for (path, result) in results {
            outcome.record(path, result);
        }
        outcome
    }

    fn compute_pooled(
        &self,
        paths: Vec<PathBuf>,
        jobs: usize,
    ) -> Vec<(PathBuf, Result<FileRecord, HashError>)> {
        let num_workers = jobs.min(paths.len());
        let work: Mutex<VecDeque<(usize, PathBuf)>> =
            Mutex::new(paths.into_iter().enumerate().collect());
        let (tx, rx) = mpsc::channel();

        thread::scope(|scope| {
            for _ in 0..num_workers {
                let tx = tx.clone();
                let work = &work;
                scope.spawn(move || loop {
                    let next = work
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .pop_front();
                    let Some((index, path)) = next else {
                        break;
                    };
                    let result = self.compute_one(&path);
                    if tx.send((index, path, result)).is_err() {
                        break;
                    }
                });
            }
        });
        drop(tx);

        let mut results: Vec<_> = rx.into_iter().collect();
        results.sort_by_key(|(index, _, _)| *index);
        results
            .into_iter()
            .map(|(_, path, result)| (path, result))
            .collect()
    }

    fn stream_digest(&self, reader: &mut impl Read) -> io::Result<Digest> {
        let mut hasher = Md5::new();
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
        }
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(&hasher.finalize());
        Ok(Digest::from_bytes(bytes))
    }
}

/// Open `path` for reading without blocking on FIFOs, then make sure the
/// handle refers to a regular file.
fn open_regular(path: &Path) -> Result<File, HashError> {
    let mut options = OpenOptions::new();
    options.read(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NONBLOCK);
    }
    let file = options
        .open(path)
        .map_err(|source| open_failure(path, source))?;
    let is_file = file
        .metadata()
        .map_err(|source| HashError::Metadata {
            path: path.to_path_buf(),
            source,
        })?
        .is_file();
    if !is_file {
        return Err(HashError::Unreadable {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        });
    }
    Ok(file)
}

/// A path that fails to open and no longer exists was deleted after listing.
fn open_failure(path: &Path, source: io::Error) -> HashError {
    if path.exists() {
        HashError::Unreadable {
            path: path.to_path_buf(),
            source,
        }
    } else {
        HashError::Vanished {
            path: path.to_path_buf(),
        }
    }
}
