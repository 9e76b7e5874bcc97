//! Timestamp-gated comparison of stored and freshly observed records.
//!
//! A digest mismatch only counts when the change time is identical: an edit
//! through the filesystem always bumps ctime, so content that changed under
//! an unchanged ctime points at corruption below the filesystem.

use std::path::{Path, PathBuf};

use crate::record::{Baseline, FileRecord, Observation};

/// Verdict for one observed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Not in the baseline; nothing to compare against.
    New,
    /// Same change time, same digest.
    Verified,
    /// Change time moved; the file was legitimately modified.
    Modified,
    /// Same change time, different digest: silent corruption.
    Flagged,
}

/// Classify one observed record against its stored counterpart.
pub fn classify(stored: Option<&FileRecord>, current: &FileRecord) -> Verdict {
    match stored {
        None => Verdict::New,
        Some(stored) if stored.change_time != current.change_time => Verdict::Modified,
        Some(stored) if stored.digest != current.digest => Verdict::Flagged,
        Some(_) => Verdict::Verified,
    }
}

/// Outcome of comparing a baseline with an observation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Paths present in both tables.
    pub compared: usize,
    pub verified: usize,
    pub modified: usize,
    /// Paths only in the observation.
    pub new: usize,
    /// Flagged paths, in path order.
    pub flagged: Vec<PathBuf>,
}

impl Comparison {
    pub fn has_flagged(&self) -> bool {
        !self.flagged.is_empty()
    }

    pub fn is_flagged(&self, path: &Path) -> bool {
        self.flagged.binary_search_by(|p| p.as_path().cmp(path)).is_ok()
    }
}

/// Compare every observed path that also appears in the baseline. Paths only
/// in the baseline (deleted or no longer listed) are ignored here; they drop
/// out when the observation replaces the baseline.
pub fn compare(baseline: &Baseline, observation: &Observation) -> Comparison {
    let mut out = Comparison::default();
    for (path, current) in observation.iter() {
        match classify(baseline.get(path), current) {
            Verdict::New => out.new += 1,
            Verdict::Verified => {
                out.compared += 1;
                out.verified += 1;
            }
            Verdict::Modified => {
                out.compared += 1;
                out.modified += 1;
            }
            Verdict::Flagged => {
                out.compared += 1;
                out.flagged.push(path.to_path_buf());
            }
        }
    }
    out
}

/// What the next baseline records for a flagged path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlaggedPolicy {
    /// Store the corrupted content as the new baseline; it is reported once.
    #[default]
    Advance,
    /// Keep the last-known-good record so the file is reported on every run
    /// until its change time moves.
    KeepLastGood,
}

/// Build the baseline to persist. Under `Advance` it is the observation
/// verbatim; under `KeepLastGood` flagged paths keep their stored record.
pub fn next_baseline(
    baseline: &Baseline,
    observation: Observation,
    comparison: &Comparison,
    policy: FlaggedPolicy,
) -> Baseline {
    let mut next = Baseline::from(observation);
    if policy == FlaggedPolicy::KeepLastGood {
        for path in &comparison.flagged {
            if let Some(stored) = baseline.get(path) {
                next.insert(path.clone(), *stored);
            }
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Digest, DIGEST_LEN};

    fn rec(change_time: i64, byte: u8) -> FileRecord {
        FileRecord {
            change_time,
            digest: Digest::from_bytes([byte; DIGEST_LEN]),
        }
    }

    fn table<K>(rows: &[(&str, FileRecord)]) -> crate::record::RecordTable<K> {
        rows.iter()
            .map(|(p, r)| (PathBuf::from(p), *r))
            .collect()
    }

    #[test]
    fn classify_covers_every_case() {
        let stored = rec(1000, 0xab);
        assert_eq!(classify(None, &stored), Verdict::New);
        assert_eq!(classify(Some(&stored), &rec(1000, 0xab)), Verdict::Verified);
        assert_eq!(classify(Some(&stored), &rec(1000, 0xde)), Verdict::Flagged);
        assert_eq!(classify(Some(&stored), &rec(2000, 0xde)), Verdict::Modified);
        assert_eq!(classify(Some(&stored), &rec(2000, 0xab)), Verdict::Modified);
    }

    #[test]
    fn first_run_compares_nothing() {
        let baseline = Baseline::new();
        let obs: Observation = table(&[("/a", rec(1, 1)), ("/b", rec(1, 2))]);
        let cmp = compare(&baseline, &obs);
        assert_eq!(cmp.compared, 0);
        assert_eq!(cmp.new, 2);
        assert!(cmp.flagged.is_empty());
    }

    #[test]
    fn same_time_different_digest_is_flagged() {
        let baseline: Baseline = table(&[("/a", rec(1000, 0xab))]);
        let obs: Observation = table(&[("/a", rec(1000, 0xde))]);
        let cmp = compare(&baseline, &obs);
        assert_eq!(cmp.compared, 1);
        assert_eq!(cmp.flagged, vec![PathBuf::from("/a")]);
        assert!(cmp.is_flagged(Path::new("/a")));
    }

    #[test]
    fn different_time_is_never_flagged() {
        let baseline: Baseline = table(&[("/a", rec(1000, 0xab))]);
        let obs: Observation = table(&[("/a", rec(2000, 0xde))]);
        let cmp = compare(&baseline, &obs);
        assert_eq!(cmp.compared, 1);
        assert_eq!(cmp.modified, 1);
        assert!(cmp.flagged.is_empty());
    }

    #[test]
    fn compared_is_size_of_intersection() {
        let baseline: Baseline = table(&[
            ("/only-old", rec(1, 1)),
            ("/both-1", rec(1, 1)),
            ("/both-2", rec(5, 1)),
            ("/both-3", rec(9, 1)),
        ]);
        let obs: Observation = table(&[
            ("/both-1", rec(1, 1)),
            ("/both-2", rec(6, 2)),
            ("/both-3", rec(9, 3)),
            ("/only-new", rec(1, 1)),
        ]);
        let cmp = compare(&baseline, &obs);
        assert_eq!(cmp.compared, 3);
        assert_eq!(cmp.verified, 1);
        assert_eq!(cmp.modified, 1);
        assert_eq!(cmp.new, 1);
        assert_eq!(cmp.flagged, vec![PathBuf::from("/both-3")]);
        assert_eq!(
            cmp.compared,
            cmp.verified + cmp.modified + cmp.flagged.len()
        );
    }

    #[test]
    fn flagged_paths_come_out_sorted() {
        let baseline: Baseline = table(&[("/z", rec(1, 1)), ("/a", rec(1, 1)), ("/m", rec(1, 1))]);
        let obs: Observation = table(&[("/m", rec(1, 2)), ("/z", rec(1, 2)), ("/a", rec(1, 2))]);
        let cmp = compare(&baseline, &obs);
        assert_eq!(
            cmp.flagged,
            vec![PathBuf::from("/a"), PathBuf::from("/m"), PathBuf::from("/z")]
        );
    }

    #[test]
    fn advance_replaces_baseline_with_observation() {
        let baseline: Baseline = table(&[("/a", rec(1, 1)), ("/deleted", rec(1, 1))]);
        let obs: Observation = table(&[("/a", rec(1, 2)), ("/new", rec(3, 3))]);
        let cmp = compare(&baseline, &obs);
        let next = next_baseline(&baseline, obs.clone(), &cmp, FlaggedPolicy::Advance);
        assert_eq!(next, Baseline::from(obs));
        assert!(!next.contains(Path::new("/deleted")));
    }

    #[test]
    fn keep_last_good_retains_stored_record_for_flagged() {
        let baseline: Baseline = table(&[("/a", rec(1, 1)), ("/b", rec(1, 1))]);
        let obs: Observation = table(&[("/a", rec(1, 2)), ("/b", rec(4, 2))]);
        let cmp = compare(&baseline, &obs);
        let next = next_baseline(&baseline, obs, &cmp, FlaggedPolicy::KeepLastGood);
        assert_eq!(next.get(Path::new("/a")), Some(&rec(1, 1)));
        assert_eq!(next.get(Path::new("/b")), Some(&rec(4, 2)));
    }
}
