//! Filesystem primitives used when rewriting manifests and renaming hashed files.
//!
//! - [`StagedFile`]: write a sibling temporary file, then atomically replace
//!   the target. Platform differences live here and nowhere else.
//! - [`rename_file`]: rename that never clobbers an existing file.
//! - [`DirEnumerator`]: optional single-directory listing.

mod dir;
mod error;
mod staged;

pub use dir::{DirEntry, DirEnumerator, StdDirEnumerator, Unsupported};
pub use error::{Error, Result};
pub use staged::StagedFile;

use std::io;
use std::path::Path;

pub fn rename_file(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    let from = from.as_ref();
    let to = to.as_ref();
    let rename_err = |source| Error::Rename {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if to.exists() {
        return Err(rename_err(io::Error::from(io::ErrorKind::AlreadyExists)));
    }
    std::fs::rename(from, to).map_err(rename_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rename_file() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("a.bin");
        let to = dir.path().join("b.bin");
        std::fs::write(&from, "data").unwrap();

        rename_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read(&to).unwrap(), b"data");
    }

    #[test]
    fn test_rename_refuses_to_clobber() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("a.bin");
        let to = dir.path().join("b.bin");
        std::fs::write(&from, "a").unwrap();
        std::fs::write(&to, "b").unwrap();

        let err = rename_file(&from, &to).unwrap_err();
        assert!(matches!(err, Error::Rename { .. }));
        assert_eq!(std::fs::read(&to).unwrap(), b"b");
        assert!(from.exists());
    }
}
