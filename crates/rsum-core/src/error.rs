//! Error types for rsum-core.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("file is binary: {}", path.display())]
    Format { path: PathBuf },

    #[error("{}: is a directory", path.display())]
    IsDirectory { path: PathBuf },

    #[error("file name doesn't contain a CRC32: {}", path.display())]
    NoEmbeddedCrc { path: PathBuf },

    #[error("file name is not valid UTF-8: {}", path.display())]
    NonUtf8Name { path: PathBuf },

    #[error("standard input can't be used as {0}")]
    UnsupportedSource(&'static str),

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),

    #[error(transparent)]
    Fs(#[from] rsum_fs::Error),
}

impl Error {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Io { source, .. } => Some(source.kind()),
            Error::Fs(e) => Some(e.io_error().kind()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool { self.io_kind() == Some(io::ErrorKind::NotFound) }

    /// Access conflicts (another process holds the file exclusively) are
    /// skipped without being reported as failures.
    pub fn is_permission_denied(&self) -> bool {
        self.io_kind() == Some(io::ErrorKind::PermissionDenied)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
