use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rsum_codec::{ChecksumRecord, LineCodec, ManifestCodec};

use crate::embedded::find_embedded_crc32;
use crate::job::{calc_sums, is_stdin_path};
use crate::scanner::{ManifestScanner, ScannedRecord};
use crate::{EntryOutcome, Error, FileJob, Result, RunContext, RunStatus};

/// Counters of one verification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub processed:   u32,
    pub ok:          u32,
    pub miss:        u32,
    pub interrupted: bool,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool { self.processed == self.ok }

    pub fn status(&self) -> RunStatus {
        if self.is_ok() { RunStatus::Success } else { RunStatus::Mismatch }
    }
}

fn is_absolute(path: &Path) -> bool { path.is_absolute() || path.has_root() }

/// Name used for a record that carries no path: the manifest minus its
/// extension, e.g. `disc.iso` for `disc.iso.sha256`.
fn derived_target(manifest: &Path) -> Option<(PathBuf, PathBuf)> {
    if is_stdin_path(manifest) || manifest.extension().is_none() {
        return None;
    }
    let full = manifest.with_extension("");
    let display = PathBuf::from(full.file_name()?);
    Some((full, display))
}

fn resolve_target(
    record: &ChecksumRecord,
    manifest: &Path,
    base_dir: Option<&Path>,
) -> Option<(PathBuf, PathBuf)> {
    let Some(path) = record.path() else {
        return derived_target(manifest);
    };
    let display = PathBuf::from(path);
    let full = match base_dir {
        Some(dir) if !is_absolute(&display) => dir.join(&display),
        _ => display.clone(),
    };
    Some((full, display))
}

/// Hash `job` and compare against its record.
fn verify_job(ctx: &mut RunContext, job: &mut FileJob, codec: &ManifestCodec) -> EntryOutcome {
    ctx.observer.file_started(job);

    if let Err(e) = calc_sums(ctx, job, true, true) {
        tracing::error!("{e}");
        return if e.is_not_found() {
            EntryOutcome::Missing
        } else {
            EntryOutcome::Failed(e.to_string())
        };
    }

    let matched = match (job.record(), ctx.session.context()) {
        (Some(record), Some(hashed)) => codec.verify(record, hashed),
        _ => false,
    };
    if matched {
        tracing::debug!(path = %job.utf8_display_path(), "OK");
        EntryOutcome::Ok
    } else {
        tracing::debug!(path = %job.utf8_display_path(), "mismatch");
        EntryOutcome::Mismatch
    }
}

fn count(ctx: &mut RunContext, job: &FileJob, outcome: &EntryOutcome) {
    ctx.stats.processed += 1;
    match outcome {
        EntryOutcome::Ok => ctx.stats.ok += 1,
        EntryOutcome::Missing => ctx.stats.miss += 1,
        _ => {}
    }
    ctx.observer.file_finished(job, outcome);
}

fn log_speed(ctx: &RunContext, elapsed: Duration) {
    if !ctx.options.speed || ctx.stats.processed == 0 {
        return;
    }
    if let Some(rate) = ctx.stats.throughput(elapsed) {
        tracing::info!(
            bytes = ctx.stats.total_bytes,
            seconds = elapsed.as_secs_f64(),
            "{:.3} MiB/s",
            rate / (1024.0 * 1024.0)
        );
    }
}

/// Verify every record of `manifest` (`-` reads standard input).
///
/// Missing files are counted as `miss`, other per-file problems as failed
/// entries; neither stops the run. Failing to open or read the manifest
/// itself, or finding binary content in it, aborts with an error.
///
/// When interrupted, the entry in flight is neither counted nor reported.
pub fn check_manifest(ctx: &mut RunContext, manifest: &Path) -> Result<VerifyReport> {
    ctx.begin_run(false);
    let result = scan_and_verify(ctx, manifest);
    if result.as_ref().map_or(true, |report| !report.is_ok()) {
        ctx.stats.error_flag = true;
    }
    result
}

fn scan_and_verify(ctx: &mut RunContext, manifest: &Path) -> Result<VerifyReport> {
    let started = Instant::now();
    let codec = ctx.options.codec_for(manifest);
    let mut scanner = ManifestScanner::open(manifest, codec)?;

    let name = if is_stdin_path(manifest) {
        "<stdin>".to_string()
    } else {
        manifest.display().to_string()
    };
    tracing::info!(manifest = %name, "verifying");
    ctx.observer.manifest_started(&name);

    let base_dir = match manifest.parent() {
        Some(dir) if ctx.options.emulate_chdir && !is_stdin_path(manifest) => Some(dir),
        _ => None,
    };

    let mut interrupted = false;
    while let Some(ScannedRecord { line_num, mut record }) = scanner.next_record()? {
        if ctx.is_interrupted() {
            interrupted = true;
            break;
        }
        let Some((full, display)) = resolve_target(&record, manifest, base_dir) else {
            tracing::debug!(line = line_num, "record without a usable path");
            continue;
        };

        if ctx.options.check_embedded {
            if let Some(crc) = display.to_str().and_then(find_embedded_crc32) {
                record.set_embedded_crc32(crc);
            }
        }

        let mut job = FileJob::new(full, display).with_separator(ctx.options.path_separator);
        job.set_record(record);
        let outcome = verify_job(ctx, &mut job, &codec);

        if ctx.is_interrupted() {
            interrupted = true;
            break;
        }
        count(ctx, &job, &outcome);
    }

    let elapsed = started.elapsed();
    if interrupted {
        tracing::warn!("interrupted by user");
        ctx.observer.interrupted();
    } else {
        tracing::info!("{}", ctx.stats);
        ctx.observer.summary(&ctx.stats, elapsed);
        log_speed(ctx, elapsed);
    }

    Ok(VerifyReport {
        processed: ctx.stats.processed,
        ok: ctx.stats.ok,
        miss: ctx.stats.miss,
        interrupted,
    })
}

/// Verify a file against the CRC32 embedded in its own name.
///
/// Counts into the current statistics without resetting them, so several
/// files can be checked in one run.
pub fn check_embedded(ctx: &mut RunContext, path: &Path) -> Result<EntryOutcome> {
    let shown = path.to_string_lossy().into_owned();
    let Some(crc) = find_embedded_crc32(&shown) else {
        tracing::warn!("file name doesn't contain a CRC32: {shown}");
        ctx.stats.error_flag = true;
        return Err(Error::NoEmbeddedCrc {
            path: path.to_path_buf(),
        });
    };

    let mut record = ChecksumRecord::new(Some(shown.clone()));
    record.set_embedded_crc32(crc);
    let mut job = FileJob::new(path, shown).with_separator(ctx.options.path_separator);
    job.set_record(record);

    ctx.session.reset(false);
    let outcome = verify_job(ctx, &mut job, &ManifestCodec::default());
    if !ctx.is_interrupted() {
        count(ctx, &job, &outcome);
        if outcome != EntryOutcome::Ok {
            ctx.stats.error_flag = true;
        }
    }
    Ok(outcome)
}
