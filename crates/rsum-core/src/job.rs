use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use once_cell::unsync::OnceCell;
use rsum_codec::ChecksumRecord;
use rsum_hash::HashMask;

use crate::{Error, Progress, Result, RunContext};

const STDIN_PATH: &str = "-";
const STDIN_DISPLAY: &str = "(stdin)";

pub fn is_stdin_path(path: &Path) -> bool { path.as_os_str() == STDIN_PATH }

/// State for one file while it is hashed and checked.
#[derive(Debug)]
pub struct FileJob {
    full_path:    PathBuf,
    display_path: PathBuf,
    separator:    Option<char>,
    utf8_display: OnceCell<String>,
    mask:         HashMask,
    size:         u64,
    elapsed:      Duration,
    record:       Option<ChecksumRecord>,
}

impl FileJob {
    pub fn new(full_path: impl Into<PathBuf>, display_path: impl Into<PathBuf>) -> Self {
        Self {
            full_path:    full_path.into(),
            display_path: display_path.into(),
            separator:    None,
            utf8_display: OnceCell::new(),
            mask:         HashMask::empty(),
            size:         0,
            elapsed:      Duration::ZERO,
            record:       None,
        }
    }

    pub fn stdin() -> Self { Self::new(STDIN_PATH, STDIN_DISPLAY) }

    /// Show paths with `separator` instead of the platform's.
    pub fn with_separator(mut self, separator: Option<char>) -> Self {
        self.separator = separator;
        self.utf8_display = OnceCell::new();
        self
    }

    pub fn with_mask(mut self, mask: HashMask) -> Self {
        self.mask = mask;
        self
    }

    pub fn is_stdin(&self) -> bool { is_stdin_path(&self.full_path) }

    pub fn full_path(&self) -> &Path { &self.full_path }

    pub fn display_path(&self) -> &Path { &self.display_path }

    /// Display path as UTF-8 with the configured separator, computed once.
    pub fn utf8_display_path(&self) -> &str {
        self.utf8_display.get_or_init(|| {
            let lossy = self.display_path.to_string_lossy();
            match self.separator {
                Some(sep) => {
                    let wrong = if sep == '/' { '\\' } else { '/' };
                    lossy.replace(wrong, &sep.to_string())
                }
                None => lossy.into_owned(),
            }
        })
    }

    pub fn mask(&self) -> HashMask { self.mask }

    pub fn size(&self) -> u64 { self.size }

    pub fn elapsed(&self) -> Duration { self.elapsed }

    pub fn record(&self) -> Option<&ChecksumRecord> { self.record.as_ref() }

    pub fn set_record(&mut self, record: ChecksumRecord) {
        self.mask = record.required_mask();
        self.record = Some(record);
    }

    pub(crate) fn record_mut(&mut self) -> Option<&mut ChecksumRecord> { self.record.as_mut() }

    pub(crate) fn rename_to(&mut self, full_path: PathBuf, display_path: PathBuf) {
        self.full_path = full_path;
        self.display_path = display_path;
        self.utf8_display = OnceCell::new();
    }
}

/// Result of processing one file, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Ok,
    Mismatch,
    Missing,
    Failed(String),
    Skipped,
}

impl fmt::Display for EntryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryOutcome::Ok => write!(f, "OK"),
            EntryOutcome::Mismatch => write!(f, "ERR"),
            EntryOutcome::Missing => write!(f, "No such file or directory"),
            EntryOutcome::Failed(reason) => write!(f, "{reason}"),
            EntryOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// Hash `job` with the run's digest session.
///
/// Refuses directories when `verifying`. An empty mask only stats the file.
/// Outside batch mode, or when `last_of_batch` is set, the digests are
/// finalized before returning.
pub(crate) fn calc_sums(
    ctx: &mut RunContext,
    job: &mut FileJob,
    verifying: bool,
    last_of_batch: bool,
) -> Result<()> {
    let started = Instant::now();
    let reader: Box<dyn Read> = if job.is_stdin() {
        Box::new(io::stdin().lock())
    } else {
        let path = &job.full_path;
        let meta = fs::metadata(path).map_err(|e| Error::io(path, e))?;
        if verifying && meta.is_dir() {
            return Err(Error::IsDirectory {
                path: path.to_path_buf(),
            });
        }
        job.size = meta.len();
        if job.mask.is_empty() {
            return Ok(());
        }
        Box::new(File::open(path).map_err(|e| Error::io(path, e))?)
    };

    let total = job.size;
    let hash_ctx = ctx
        .session
        .start(job.mask, job.utf8_display_path(), total);
    let initial = hash_ctx.msg_size();
    if let Some(on_progress) = ctx.on_progress.clone() {
        hash_ctx.set_callback(move |msg_size| {
            on_progress(&Progress {
                bytes_done:  msg_size - initial,
                total_bytes: total,
            })
        });
    }

    let fed = ctx.session.feed(reader, &mut ctx.stats, &ctx.interrupt);
    if let Some(hash_ctx) = ctx.session.context_mut() {
        hash_ctx.clear_callback();
    }
    let fed = fed.map_err(|e| Error::io(&job.full_path, e))?;
    ctx.session.finish(last_of_batch);

    job.size = fed;
    job.elapsed = started.elapsed();
    tracing::debug!(path = %job.utf8_display_path(), bytes = fed, "hashed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RunOptions;
    use rsum_hash::HashKind;
    use tempfile::tempdir;

    #[test]
    fn test_display_path_normalizes_separator() {
        let job = FileJob::new("a/b\\c", "a/b\\c").with_separator(Some('\\'));
        assert_eq!(job.utf8_display_path(), "a\\b\\c");
        let job = FileJob::new("a/b\\c", "a/b\\c").with_separator(Some('/'));
        assert_eq!(job.utf8_display_path(), "a/b/c");
        assert_eq!(FileJob::stdin().utf8_display_path(), "(stdin)");
    }

    #[test]
    fn test_calc_sums_hashes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        fs::write(&path, "abc").unwrap();

        let mut ctx = RunContext::new(RunOptions::default());
        let mut job = FileJob::new(&path, "abc.txt").with_mask(HashKind::Crc32.into());
        calc_sums(&mut ctx, &mut job, true, true).unwrap();

        assert_eq!(job.size(), 3);
        assert_eq!(ctx.stats.total_bytes, 3);
        assert_eq!(ctx.session().context().unwrap().crc32(), Some(0x352441C2));
    }

    #[test]
    fn test_calc_sums_rejects_directory_when_verifying() {
        let dir = tempdir().unwrap();
        let mut ctx = RunContext::new(RunOptions::default());
        let mut job = FileJob::new(dir.path(), "dir").with_mask(HashKind::Crc32.into());
        let err = calc_sums(&mut ctx, &mut job, true, true).unwrap_err();
        assert!(matches!(err, Error::IsDirectory { .. }));
    }

    #[test]
    fn test_calc_sums_missing_file() {
        let dir = tempdir().unwrap();
        let mut ctx = RunContext::new(RunOptions::default());
        let mut job =
            FileJob::new(dir.path().join("gone"), "gone").with_mask(HashKind::Crc32.into());
        let err = calc_sums(&mut ctx, &mut job, true, true).unwrap_err();
        assert!(err.is_not_found());
    }
}
