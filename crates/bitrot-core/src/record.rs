//! Per-file records and the path-keyed tables built from them.
//!
//! A [`FileRecord`] keeps the change time and the digest computed from the
//! same read together; the two tables ([`Baseline`] and [`Observation`]) are
//! distinct types so a freshly observed table only becomes the next baseline
//! through an explicit conversion.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::error::DigestParseError;

/// Length of an MD5 digest in bytes.
pub const DIGEST_LEN: usize = 16;

/// 128-bit content digest (MD5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex, as written to the baseline file.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 32-char hex string (either case).
    pub fn from_hex(s: &str) -> Result<Self, DigestParseError> {
        if s.len() != DIGEST_LEN * 2 {
            return Err(DigestParseError::Length {
                expected: DIGEST_LEN * 2,
                got: s.len(),
            });
        }
        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// What was observed for one path: change time (whole seconds) and content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRecord {
    pub change_time: i64,
    pub digest: Digest,
}

/// Marker for a table loaded from the baseline file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stored;

/// Marker for a table computed during the current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Observed;

/// Ordered mapping path → record. Iteration is always in path order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTable<K> {
    records: BTreeMap<PathBuf, FileRecord>,
    _kind: PhantomData<K>,
}

/// What we last observed and trusted.
pub type Baseline = RecordTable<Stored>;

/// What we see right now.
pub type Observation = RecordTable<Observed>;

impl<K> Default for RecordTable<K> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            _kind: PhantomData,
        }
    }
}

impl<K> RecordTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record; a later insert for the same path replaces the earlier one.
    pub fn insert(&mut self, path: PathBuf, record: FileRecord) -> Option<FileRecord> {
        self.records.insert(path, record)
    }

    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.records.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.records.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &FileRecord)> {
        self.records.iter().map(|(p, r)| (p.as_path(), r))
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.records.keys().map(PathBuf::as_path)
    }
}

impl<K> FromIterator<(PathBuf, FileRecord)> for RecordTable<K> {
    fn from_iter<I: IntoIterator<Item = (PathBuf, FileRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
            _kind: PhantomData,
        }
    }
}

impl<K> IntoIterator for RecordTable<K> {
    type Item = (PathBuf, FileRecord);
    type IntoIter = btree_map::IntoIter<PathBuf, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl From<Observation> for Baseline {
    fn from(observation: Observation) -> Self {
        Self {
            records: observation.records,
            _kind: PhantomData,
        }
    }
}
