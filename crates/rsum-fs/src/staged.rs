use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{Error, Result};

/// A sibling temporary file that atomically replaces `dest` on commit.
///
/// Dropping a `StagedFile` without committing removes the temporary file and
/// leaves `dest` untouched.
pub struct StagedFile {
    dest:   PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl StagedFile {
    pub fn new(dest: impl AsRef<Path>) -> Result<Self> {
        let dest = dest.as_ref();
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let prefix = format!(".{name}.");

        let tmp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".new")
            .tempfile_in(parent)
            .map_err(|e| Error::Write {
                path:   parent.to_path_buf(),
                source: e,
            })?;

        if let Ok(meta) = fs::metadata(dest) {
            let _ = fs::set_permissions(tmp.path(), meta.permissions());
        }

        Ok(Self {
            dest:   dest.to_path_buf(),
            writer: BufWriter::new(tmp),
        })
    }

    pub fn temp_path(&self) -> &Path { self.writer.get_ref().path() }

    pub fn dest(&self) -> &Path { &self.dest }

    /// Flush, sync and move the temporary file over the destination.
    pub fn commit(self) -> Result<()> {
        let tmp_path = self.temp_path().to_path_buf();
        let tmp = self.writer.into_inner().map_err(|e| Error::Write {
            path:   tmp_path.clone(),
            source: e.into_error(),
        })?;
        tmp.as_file().sync_all().map_err(|e| Error::Write {
            path:   tmp_path,
            source: e,
        })?;

        tmp.persist(&self.dest).map_err(|e| Error::Replace {
            path:   self.dest.clone(),
            source: e.error,
        })?;
        tracing::debug!(path = %self.dest.display(), "replaced file");
        Ok(())
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.writer.write(buf) }

    fn flush(&mut self) -> io::Result<()> { self.writer.flush() }
}
