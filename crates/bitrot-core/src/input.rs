//! Null-delimited path list input, plus raw byte conversions for paths.
//!
//! Paths are carried as raw bytes on Unix so names that are not valid UTF-8
//! survive the trip from `find -print0` to the baseline file and back.

use std::borrow::Cow;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Read the whole stream and split it on NUL bytes. Empty entries (e.g. a
/// trailing separator) are dropped; order and duplicates are preserved.
pub fn read_path_list<R: Read>(mut reader: R) -> io::Result<Vec<PathBuf>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf
        .split(|b| *b == 0)
        .filter(|entry| !entry.is_empty())
        .map(path_from_bytes)
        .collect())
}

#[cfg(unix)]
pub(crate) fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
pub(crate) fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(unix)]
pub(crate) fn path_to_bytes(path: &Path) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
pub(crate) fn path_to_bytes(path: &Path) -> Cow<'_, [u8]> {
    match path.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}
