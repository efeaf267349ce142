use std::fs;
use std::path::Path;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name:   String,
    pub is_dir: bool,
}

/// Lists the entries of a single directory.
///
/// `Ok(None)` means the enumerator cannot list directories at all, which
/// callers treat as "nothing to report" rather than a failure.
pub trait DirEnumerator {
    fn read_dir(&self, dir: &Path) -> Result<Option<Vec<DirEntry>>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdDirEnumerator;

impl DirEnumerator for StdDirEnumerator {
    fn read_dir(&self, dir: &Path) -> Result<Option<Vec<DirEntry>>> {
        let read_err = |e| Error::ReadDir {
            path:   dir.to_path_buf(),
            source: e,
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                tracing::warn!(dir = %dir.display(), name = ?entry.file_name(), "skipping non UTF-8 file name");
                continue;
            };
            if name == "." || name == ".." {
                continue;
            }
            // follow symlinks; entries that vanished or can't be stat'd are skipped
            let Ok(meta) = fs::metadata(entry.path()) else {
                continue;
            };
            entries.push(DirEntry {
                name,
                is_dir: meta.is_dir(),
            });
        }
        Ok(Some(entries))
    }
}

/// An enumerator for targets without directory listing support.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl DirEnumerator for Unsupported {
    fn read_dir(&self, _dir: &Path) -> Result<Option<Vec<DirEntry>>> { Ok(None) }
}
