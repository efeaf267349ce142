use std::io::Write;
use std::path::Path;

use chrono::Local;
use rsum_codec::{LineCodec, ManifestCodec};

use crate::embedded::verify_or_embed;
use crate::job::{calc_sums, is_stdin_path};
use crate::update::sfv_banner;
use crate::{EntryOutcome, Error, FileJob, Result, RunContext, RunStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputeReport {
    pub processed:   u32,
    pub failed:      u32,
    pub interrupted: bool,
}

impl ComputeReport {
    pub fn status(&self) -> RunStatus {
        if self.failed == 0 { RunStatus::Success } else { RunStatus::Failure }
    }
}

/// Hash `paths` and write one manifest line per file to `out`.
///
/// Directories are skipped. With a batch label every file feeds the same
/// context and a single line, named after the label, is written once the
/// last file is done.
pub fn hash_files<P: AsRef<Path>>(
    ctx: &mut RunContext,
    paths: &[P],
    out: &mut dyn Write,
) -> Result<ComputeReport> {
    let batch = ctx.options.batch.clone();
    ctx.begin_run(batch.is_some());

    let format = ctx.options.format.unwrap_or_default();
    let codec = ManifestCodec::new(format).with_preferred(ctx.options.hash_mask);
    let mask = ctx.options.effective_mask(format);

    let files: Vec<&Path> = paths
        .iter()
        .map(|p| p.as_ref())
        .filter(|path| {
            let is_dir = !is_stdin_path(path) && path.is_dir();
            if is_dir {
                tracing::debug!(path = %path.display(), "skipping directory");
            }
            !is_dir
        })
        .collect();

    if format.has_banner() && batch.is_none() && !files.is_empty() {
        out.write_all(sfv_banner(Local::now()).as_bytes())
            .map_err(Error::Output)?;
    }

    let mut report = ComputeReport::default();
    for (i, &path) in files.iter().enumerate() {
        if ctx.is_interrupted() {
            report.interrupted = true;
            break;
        }
        let job = if is_stdin_path(path) {
            FileJob::stdin()
        } else {
            FileJob::new(path, path)
        };
        let mut job = job
            .with_separator(ctx.options.path_separator)
            .with_mask(mask);
        ctx.observer.file_started(&job);

        let hashed = calc_sums(ctx, &mut job, false, i + 1 == files.len());
        if ctx.is_interrupted() {
            report.interrupted = true;
            break;
        }
        report.processed += 1;
        if let Err(e) = hashed {
            let outcome = if e.is_permission_denied() {
                EntryOutcome::Skipped
            } else {
                tracing::error!("{e}");
                report.failed += 1;
                EntryOutcome::Failed(e.to_string())
            };
            ctx.observer.file_finished(&job, &outcome);
            continue;
        }

        let mut outcome = EntryOutcome::Ok;
        if batch.is_none() {
            if ctx.options.embed_crc && !job.is_stdin() {
                if let Some(crc) = ctx.session.context().and_then(|h| h.crc32()) {
                    if let Err(e) = verify_or_embed(&mut job, crc, ctx.options.embed_delimiter) {
                        report.failed += 1;
                        outcome = EntryOutcome::Failed(e.to_string());
                    }
                }
            }
            if let Some(hashed) = ctx.session.context() {
                writeln!(out, "{}", codec.encode(job.utf8_display_path(), hashed, mask))
                    .map_err(Error::Output)?;
            }
        }
        ctx.stats.processed += 1;
        if outcome == EntryOutcome::Ok {
            ctx.stats.ok += 1;
        }
        ctx.observer.file_finished(&job, &outcome);
    }

    if let Some(label) = batch.filter(|_| !report.interrupted) {
        ctx.session.finish(true);
        if let Some(hashed) = ctx.session.context() {
            tracing::debug!(files = hashed.batch_files().len(), "batch finished");
            writeln!(out, "{}", codec.encode(&label, hashed, mask)).map_err(Error::Output)?;
        }
    }
    out.flush().map_err(Error::Output)?;

    if report.interrupted {
        ctx.observer.interrupted();
    }
    if report.failed > 0 {
        ctx.stats.error_flag = true;
    }
    Ok(report)
}
