use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("can't move '{from}' to '{to}': {source}")]
    Rename {
        from:   PathBuf,
        to:     PathBuf,
        source: io::Error,
    },

    #[error("failed to replace '{path}': {source}")]
    Replace { path: PathBuf, source: io::Error },

    #[error("failed to read directory '{path}': {source}")]
    ReadDir { path: PathBuf, source: io::Error },
}

impl Error {
    pub fn io_error(&self) -> &io::Error {
        match self {
            Error::Write { source, .. }
            | Error::Rename { source, .. }
            | Error::Replace { source, .. }
            | Error::ReadDir { source, .. } => source,
        }
    }

    pub fn is_not_found(&self) -> bool { self.io_error().kind() == io::ErrorKind::NotFound }
}

pub type Result<T> = std::result::Result<T, Error>;
