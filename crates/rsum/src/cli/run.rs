use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use rsum_codec::ManifestFormat;
use rsum_core::{
    InterruptHandle, NameFilter, RunContext, RunOptions, RunStatus, check_embedded,
    check_manifest, hash_files, update_manifest,
};
use rsum_fs::StdDirEnumerator;
use rsum_hash::{HashKind, HashMask};

use crate::cli::app::{App, Mode};
use crate::env::Config;
use crate::ui::{ConsoleObserver, ProgressTracker};

/// Merge command-line flags over the configuration file.
pub fn run_options(app: &App, config: &Config) -> Result<RunOptions> {
    let format = match (app.format, &config.format) {
        (Some(arg), _) => Some(ManifestFormat::from(arg)),
        (None, Some(name)) => Some(
            name.parse::<ManifestFormat>()
                .with_context(|| format!("Invalid format `{name}` in config"))?,
        ),
        (None, None) => None,
    };

    let mask: HashMask = if app.algorithms.is_empty() {
        config
            .algorithms
            .iter()
            .map(|name| {
                name.parse::<HashKind>()
                    .with_context(|| format!("Invalid algorithm `{name}` in config"))
            })
            .collect::<Result<_>>()?
    } else {
        app.algorithms.iter().copied().collect()
    };

    let patterns = if app.accept.is_empty() { &config.accept } else { &app.accept };
    let accept = NameFilter::new(patterns).context("Invalid --accept pattern")?;

    let mut options = RunOptions::default()
        .hash_mask(mask)
        .check_embedded(app.check && app.embed_crc)
        .embed_crc(app.embed_crc && !app.check)
        .embed_delimiter(app.embed_crc_delimiter.or(config.embed_crc_delimiter))
        .path_separator(app.path_separator.or(config.path_separator))
        .emulate_chdir(!app.no_chdir)
        .accept(accept)
        .speed(app.speed || config.speed)
        .verbose(app.verbose);
    options.format = format;
    if let Some(label) = &app.batch {
        options = options.batch(label.clone());
    }
    Ok(options)
}

fn install_interrupt_handler(handle: InterruptHandle) -> Result<()> {
    ctrlc::set_handler(move || handle.interrupt()).context("Failed to install Ctrl-C handler")
}

pub fn run(app: App) -> Result<RunStatus> {
    let config = Config::load(app.config.as_deref()).context("Failed to load configuration")?;
    let options = run_options(&app, &config)?;
    let mode = app.mode();

    let interrupt = InterruptHandle::new();
    install_interrupt_handler(interrupt.clone())?;

    let tracker = (app.percents || config.percents).then(ProgressTracker::new);
    let report = matches!(mode, Mode::Check | Mode::CheckEmbedded);
    let mut ctx = RunContext::new(options)
        .with_interrupt(interrupt)
        .with_observer(ConsoleObserver::new(report, tracker.clone()));
    if let Some(tracker) = tracker {
        ctx = ctx.with_progress(move |progress| tracker.update(progress));
    }

    let status = match mode {
        Mode::Compute => compute(&mut ctx, &app)?,
        Mode::Check => check(&mut ctx, &app.files)?,
        Mode::CheckEmbedded => embedded(&mut ctx, &app.files)?,
        Mode::Update => update(&mut ctx, &app.files)?,
    };

    if ctx.is_interrupted() {
        return Ok(RunStatus::Failure);
    }
    Ok(status)
}

fn compute(ctx: &mut RunContext, app: &App) -> Result<RunStatus> {
    let files = if app.files.is_empty() {
        vec![PathBuf::from("-")]
    } else {
        app.files.clone()
    };

    let report = match &app.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            hash_files(ctx, files.as_slice(), &mut out)?
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let report = hash_files(ctx, files.as_slice(), &mut out)?;
            out.flush()?;
            report
        }
    };
    Ok(report.status())
}

fn check(ctx: &mut RunContext, manifests: &[PathBuf]) -> Result<RunStatus> {
    if manifests.is_empty() {
        bail!("No manifest given to check");
    }
    let mut status = RunStatus::Success;
    for manifest in manifests {
        match check_manifest(ctx, manifest) {
            Ok(report) => {
                status = status.worst(report.status());
                if report.interrupted {
                    break;
                }
            }
            Err(e) => {
                tracing::error!("{e}");
                status = status.worst(RunStatus::Failure);
            }
        }
    }
    Ok(status)
}

fn embedded(ctx: &mut RunContext, files: &[PathBuf]) -> Result<RunStatus> {
    if files.is_empty() {
        bail!("No files given to check");
    }
    ctx.stats.reset();
    let mut failed = false;
    for file in files {
        if ctx.is_interrupted() {
            break;
        }
        if check_embedded(ctx, file).is_err() {
            failed = true;
        }
    }
    println!("{}", ctx.stats);

    let status = if ctx.stats.all_ok() { RunStatus::Success } else { RunStatus::Mismatch };
    Ok(if failed { status.worst(RunStatus::Failure) } else { status })
}

fn update(ctx: &mut RunContext, manifests: &[PathBuf]) -> Result<RunStatus> {
    if manifests.is_empty() {
        bail!("No manifest given to update");
    }
    let mut status = RunStatus::Success;
    for manifest in manifests {
        match update_manifest(ctx, manifest, &StdDirEnumerator) {
            Ok(report) => {
                tracing::info!(
                    manifest = %manifest.display(),
                    added = report.added,
                    "manifest updated"
                );
                status = status.worst(report.status());
                if report.interrupted {
                    break;
                }
            }
            Err(e) => {
                tracing::error!("{e}");
                status = status.worst(RunStatus::Failure);
            }
        }
    }
    Ok(status)
}
