//! Persist the baseline as CSV rows `ctime,md5hex,path`.
//!
//! Saving writes a `.part` file next to the destination, syncs it and renames
//! it over the old baseline, so a failed save never leaves a truncated copy.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::RowError;
use crate::input::{path_from_bytes, path_to_bytes};
use crate::record::{Baseline, Digest, FileRecord};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Counters from loading a baseline file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    pub skipped_rows: usize,
}

/// Load the baseline from `path`. A missing file is a first run and yields an
/// empty baseline; a file that exists but cannot be read is an error.
/// Malformed rows are skipped and counted.
pub fn load(path: &Path) -> Result<(Baseline, LoadReport)> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!("no baseline at {}, starting fresh", path.display());
            return Ok((Baseline::new(), LoadReport::default()));
        }
        Err(e) => return Err(e).with_context(|| format!("open baseline: {}", path.display())),
    };
    let loaded = read_baseline(file).with_context(|| format!("read baseline: {}", path.display()))?;
    tracing::debug!(
        rows = loaded.1.rows,
        skipped = loaded.1.skipped_rows,
        "loaded baseline from {}",
        path.display()
    );
    Ok(loaded)
}

/// Parse baseline rows from any reader. Row order does not matter; for a
/// repeated path the last row wins.
pub fn read_baseline<R: Read>(reader: R) -> Result<(Baseline, LoadReport)> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut baseline = Baseline::new();
    let mut report = LoadReport::default();
    let mut row = csv::ByteRecord::new();

    loop {
        match rdr.read_byte_record(&mut row) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_io_error() => return Err(e).context("csv read"),
            Err(e) => {
                report.skipped_rows += 1;
                tracing::warn!(error = %e, "skipping unparsable baseline row");
                continue;
            }
        }
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        match parse_row(&row) {
            Ok((path, rec)) => {
                report.rows += 1;
                baseline.insert(path, rec);
            }
            Err(reason) => {
                report.skipped_rows += 1;
                tracing::warn!(line, %reason, "skipping malformed baseline row");
            }
        }
    }
    Ok((baseline, report))
}

fn parse_row(row: &csv::ByteRecord) -> Result<(PathBuf, FileRecord), RowError> {
    if row.len() != 3 {
        return Err(RowError::FieldCount(row.len()));
    }
    let change_time = std::str::from_utf8(&row[0])
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(RowError::ChangeTime)?;
    let digest_hex = std::str::from_utf8(&row[1]).map_err(|_| RowError::DigestEncoding)?;
    let digest = Digest::from_hex(digest_hex)?;
    if row[2].is_empty() {
        return Err(RowError::EmptyPath);
    }
    Ok((
        path_from_bytes(&row[2]),
        FileRecord {
            change_time,
            digest,
        },
    ))
}

/// Write `baseline` to `path`, sorted by path, replacing any previous file
/// atomically. Creates the parent directory if needed. On failure the
/// previous baseline is left untouched and the temp file is removed.
pub fn save(baseline: &Baseline, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create dir: {}", parent.display()))?;
    }
    let temp = temp_path(path);
    let result = write_rows(baseline, &temp)
        .and_then(|()| copy_permissions(path, &temp))
        .and_then(|()| {
            fs::rename(&temp, path).with_context(|| {
                format!("failed to rename {} to {}", temp.display(), path.display())
            })
        });
    if result.is_err() && temp.is_file() {
        let _ = fs::remove_file(&temp);
    }
    result?;
    tracing::debug!(rows = baseline.len(), "saved baseline to {}", path.display());
    Ok(())
}

fn write_rows(baseline: &Baseline, temp: &Path) -> Result<()> {
    let file = File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp)
        .with_context(|| format!("failed to create temp file: {}", temp.display()))?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    for (p, rec) in baseline.iter() {
        let change_time = rec.change_time.to_string();
        let digest = rec.digest.to_hex();
        let path_bytes = path_to_bytes(p);
        wtr.write_record([change_time.as_bytes(), digest.as_bytes(), &path_bytes[..]])
            .with_context(|| format!("write baseline row: {}", temp.display()))?;
    }
    let file = wtr
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("flush baseline: {}", temp.display()))?;
    file.sync_all().context("baseline sync failed")?;
    Ok(())
}

/// Give the temp file the mode of the baseline it replaces. The file lists
/// every checked path, so a restrictive mode must survive the rename.
fn copy_permissions(path: &Path, temp: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) => fs::set_permissions(temp, meta.permissions())
            .with_context(|| format!("set permissions on {}", temp.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("stat baseline: {}", path.display())),
    }
}

/// Path for the temp file: appends `.part` to the baseline path.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}
