use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::{Instant, SystemTime};

use chrono::{DateTime, Local};
use rsum_codec::{LineCodec, ManifestCodec, ManifestFormat};
use rsum_fs::{DirEnumerator, StagedFile};

use crate::embedded::verify_or_embed;
use crate::job::{calc_sums, is_stdin_path};
use crate::scanner::ManifestScanner;
use crate::{EntryOutcome, Error, FileJob, FileNameSet, Result, RunContext, RunStatus};

const GENERATOR: &str = concat!("rsum v", env!("CARGO_PKG_VERSION"));
const SFV_COMMENT: u8 = b';';

/// What an update run did to the manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Entries appended.
    pub added:        u32,
    /// Files that could not be hashed, plus files whose CRC32 rename
    /// failed. Only the former are left out.
    pub failed:       u32,
    pub header_fixed: bool,
    pub interrupted:  bool,
}

impl UpdateReport {
    pub fn status(&self) -> RunStatus {
        if self.failed == 0 { RunStatus::Success } else { RunStatus::Failure }
    }
}

/// Base names of every file `manifest` references. A missing manifest
/// references nothing.
pub fn load_file_names(manifest: &Path, codec: ManifestCodec) -> Result<FileNameSet> {
    let mut names = FileNameSet::new();
    let Some(scanner) = ManifestScanner::open_existing(manifest, codec)? else {
        return Ok(names);
    };
    for scanned in scanner {
        if let Some(path) = scanned?.record.path() {
            names.add(path);
        }
    }
    Ok(names)
}

fn local_time(time: SystemTime) -> DateTime<Local> { DateTime::<Local>::from(time) }

pub fn sfv_banner(now: DateTime<Local>) -> String {
    format!(
        "; Generated by {GENERATOR} on {} at {}\n;\n",
        now.format("%Y-%m-%d"),
        now.format("%H:%M.%S")
    )
}

/// `; <size>  <mtime> <path>` comment describing one file of an SFV manifest.
pub fn sfv_header_line(size: u64, mtime: DateTime<Local>, path: &str) -> String {
    let path = path.strip_prefix("./").unwrap_or(path);
    format!("; {size:>12}  {} {path}\n", mtime.format("%H:%M.%S %Y-%m-%d"))
}

/// Append hashes of files in the manifest's directory that it doesn't list
/// yet.
///
/// Entries are added in name order. For formats with a banner the comment
/// lines are moved back to the head of the file afterwards, unless the run
/// was interrupted. When `dirs` can't list directories nothing happens.
pub fn update_manifest(
    ctx: &mut RunContext,
    manifest: &Path,
    dirs: &dyn DirEnumerator,
) -> Result<UpdateReport> {
    if is_stdin_path(manifest) {
        return Err(Error::UnsupportedSource("a manifest to update"));
    }
    ctx.begin_run(false);
    let result = update_inner(ctx, manifest, dirs);
    match &result {
        Ok(report) if report.failed == 0 => {}
        _ => ctx.stats.error_flag = true,
    }
    result
}

fn update_inner(
    ctx: &mut RunContext,
    manifest: &Path,
    dirs: &dyn DirEnumerator,
) -> Result<UpdateReport> {
    let started = Instant::now();
    let codec = ctx.options.codec_for(manifest);
    let format = codec.format();
    if ctx.options.verbose {
        tracing::info!("Updating: {}", manifest.display());
    }

    let mut known = load_file_names(manifest, codec)?;
    if let Some(own) = manifest.file_name().and_then(|n| n.to_str()) {
        known.add(own);
    }
    known.sort();

    let dir = match manifest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let Some(entries) = dirs.read_dir(dir)? else {
        tracing::debug!(dir = %dir.display(), "directory listing unavailable, nothing to update");
        return Ok(UpdateReport::default());
    };

    let mut candidates = FileNameSet::new();
    for entry in entries {
        if !entry.is_dir && ctx.options.accept.matches(&entry.name) && !known.contains(&entry.name) {
            candidates.add(&entry.name);
        }
    }
    if candidates.is_empty() {
        tracing::debug!(manifest = %manifest.display(), "no new files");
        return Ok(UpdateReport::default());
    }
    candidates.sort_by_full_path();

    let mut report = append_entries(ctx, manifest, dir, &candidates, codec)?;

    if format.has_banner() && !report.interrupted {
        fix_header(manifest)?;
        report.header_fixed = true;
    }

    if report.interrupted {
        tracing::warn!("interrupted by user");
        ctx.observer.interrupted();
    } else {
        tracing::info!("Updated: {}", manifest.display());
        let elapsed = started.elapsed();
        ctx.observer.summary(&ctx.stats, elapsed);
        if ctx.options.speed && ctx.stats.processed > 0 {
            if let Some(rate) = ctx.stats.throughput(elapsed) {
                tracing::info!(bytes = ctx.stats.total_bytes, "{:.3} MiB/s", rate / (1024.0 * 1024.0));
            }
        }
    }
    Ok(report)
}

fn ends_with_eol(file: &mut File) -> io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(matches!(last[0], b'\n' | b'\r'))
}

fn append_entries(
    ctx: &mut RunContext,
    manifest: &Path,
    dir: &Path,
    candidates: &FileNameSet,
    codec: ManifestCodec,
) -> Result<UpdateReport> {
    let format = codec.format();
    let mask = ctx.options.mask_for(manifest, format);
    let io_err = |e| Error::io(manifest, e);

    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(manifest)
        .map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();
    let needs_eol = len > 0 && !ends_with_eol(&mut file).map_err(io_err)?;
    let mut out = BufWriter::new(file);
    if needs_eol {
        out.write_all(b"\n").map_err(io_err)?;
    }
    let mut banner_pending = len == 0 && format.has_banner();

    let mut report = UpdateReport::default();
    for name in candidates.iter() {
        if ctx.is_interrupted() {
            report.interrupted = true;
            break;
        }
        let mut job = FileJob::new(dir.join(name), name)
            .with_separator(ctx.options.path_separator)
            .with_mask(mask);
        ctx.observer.file_started(&job);

        if banner_pending {
            out.write_all(sfv_banner(Local::now()).as_bytes())
                .map_err(io_err)?;
            banner_pending = false;
        }

        if let Err(e) = calc_sums(ctx, &mut job, false, true) {
            if ctx.is_interrupted() {
                report.interrupted = true;
                break;
            }
            ctx.stats.processed += 1;
            let outcome = if e.is_permission_denied() {
                tracing::debug!(path = %job.utf8_display_path(), "skipping locked file");
                EntryOutcome::Skipped
            } else {
                tracing::error!("{e}");
                report.failed += 1;
                EntryOutcome::Failed(e.to_string())
            };
            ctx.observer.file_finished(&job, &outcome);
            continue;
        }
        if ctx.is_interrupted() {
            report.interrupted = true;
            break;
        }

        let mut outcome = EntryOutcome::Ok;
        if ctx.options.embed_crc {
            if let Some(crc) = ctx.session.context().and_then(|h| h.crc32()) {
                // the entry is still written, under its old name
                if let Err(e) = verify_or_embed(&mut job, crc, ctx.options.embed_delimiter) {
                    report.failed += 1;
                    outcome = EntryOutcome::Failed(e.to_string());
                }
            }
        }

        let Some(hashed) = ctx.session.context() else {
            continue;
        };
        let mut text = String::new();
        if format == ManifestFormat::Sfv {
            let meta = fs::metadata(job.full_path()).ok();
            let size = meta.as_ref().map_or(job.size(), |m| m.len());
            let mtime = meta
                .and_then(|m| m.modified().ok())
                .map_or_else(Local::now, local_time);
            text.push_str(&sfv_header_line(size, mtime, job.utf8_display_path()));
        }
        text.push_str(&codec.encode(job.utf8_display_path(), hashed, mask));
        text.push('\n');
        out.write_all(text.as_bytes()).map_err(io_err)?;
        if ctx.options.verbose {
            tracing::info!("{}", text.trim_end());
        }

        ctx.stats.processed += 1;
        if outcome == EntryOutcome::Ok {
            ctx.stats.ok += 1;
        }
        report.added += 1;
        ctx.observer.file_finished(&job, &outcome);
    }
    out.flush().map_err(io_err)?;
    Ok(report)
}

/// Rewrite `manifest` with every `;` line first, both groups in their
/// original order. The manifest is replaced only if the whole copy succeeds.
pub fn fix_header(manifest: &Path) -> Result<()> {
    let file = File::open(manifest).map_err(|e| Error::io(manifest, e))?;
    rewrite_header(BufReader::new(file), manifest)
}

fn rewrite_header<R: BufRead + Seek>(mut reader: R, manifest: &Path) -> Result<()> {
    let read_err = |e| Error::io(manifest, e);
    let mut staged = StagedFile::new(manifest)?;
    let write_err = |path: &Path, source| rsum_fs::Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut line = Vec::with_capacity(256);
    for comments in [true, false] {
        reader.rewind().map_err(read_err)?;
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line).map_err(read_err)? == 0 {
                break;
            }
            if (line.first() == Some(&SFV_COMMENT)) != comments {
                continue;
            }
            if !line.ends_with(b"\n") {
                line.push(b'\n');
            }
            staged
                .write_all(&line)
                .map_err(|e| write_err(staged.temp_path(), e))?;
        }
    }
    staged.commit()?;
    tracing::debug!(manifest = %manifest.display(), "moved comment lines to the head");
    Ok(())
}
