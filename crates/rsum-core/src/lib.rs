//! Checksum manifest engine.
//!
//! Verifies files against a manifest, appends files a manifest doesn't list
//! yet, and hashes loose files, all through one [`RunContext`] that carries
//! the options, statistics, digest session and interruption flag of a run.
//!
//! ```no_run
//! use std::path::Path;
//! use rsum_core::{RunContext, RunOptions, check_manifest};
//!
//! let mut ctx = RunContext::new(RunOptions::default());
//! let report = check_manifest(&mut ctx, Path::new("release.sfv"))?;
//! println!("{}", ctx.stats);
//! std::process::exit(report.status().code());
//! # Ok::<(), rsum_core::Error>(())
//! ```

pub use self::compute::{ComputeReport, hash_files};
pub use self::context::{
    InterruptHandle, NullObserver, Progress, ProgressFn, RunContext, RunObserver, RunStatus,
};
pub use self::embedded::{
    EmbedOutcome, embed_crc32, find_embedded_crc32, find_embedded_crc32_range, verify_or_embed,
};
pub use self::error::{Error, Result};
pub use self::file_set::FileNameSet;
pub use self::job::{EntryOutcome, FileJob, is_stdin_path};
pub use self::options::{NameFilter, RunOptions};
pub use self::scanner::{ManifestScanner, ScannedRecord};
pub use self::session::{DigestSession, SessionState};
pub use self::stats::RunStatistics;
pub use self::update::{
    UpdateReport, fix_header, load_file_names, sfv_banner, sfv_header_line, update_manifest,
};
pub use self::verify::{VerifyReport, check_embedded, check_manifest};

mod compute;
mod context;
mod embedded;
mod error;
mod file_set;
mod job;
mod options;
mod scanner;
mod session;
mod stats;
mod update;
mod verify;
