use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use rsum_codec::ManifestFormat;
use rsum_core::{
    EntryOutcome, FileJob, InterruptHandle, NameFilter, RunContext, RunObserver, RunOptions,
    RunStatus, check_manifest, find_embedded_crc32, update_manifest,
};
use rsum_fs::StdDirEnumerator;
use tempfile::{TempDir, tempdir};

/// Raises the interrupt flag once `limit` files have finished.
struct StopAfter {
    limit:    usize,
    finished: usize,
    handle:   InterruptHandle,
}

impl RunObserver for StopAfter {
    fn file_finished(&mut self, _job: &FileJob, _outcome: &EntryOutcome) {
        self.finished += 1;
        if self.finished == self.limit {
            self.handle.interrupt();
        }
    }
}

fn stop_after(options: RunOptions, limit: usize) -> RunContext {
    let handle = InterruptHandle::new();
    RunContext::new(options)
        .with_interrupt(handle.clone())
        .with_observer(StopAfter {
            limit,
            finished: 0,
            handle,
        })
}

fn populate(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    for (name, data) in files {
        fs::write(dir.path().join(name), data).unwrap();
    }
    dir
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect()
}

fn data_lines(path: &Path) -> Vec<String> {
    read_lines(path)
        .into_iter()
        .filter(|l| !l.starts_with(';'))
        .collect()
}

fn sfv(dir: &TempDir) -> PathBuf { dir.path().join("check.sfv") }

#[test]
fn update_then_verify_round_trip() {
    let dir = populate(&[("a.bin", "abc"), ("b.bin", "hello world"), ("c.bin", "")]);
    let manifest = sfv(&dir);

    let mut ctx = RunContext::new(RunOptions::default());
    let report = update_manifest(&mut ctx, &manifest, &StdDirEnumerator).unwrap();
    assert_eq!(report.added, 3);
    assert!(report.header_fixed);

    let lines = read_lines(&manifest);
    assert!(lines[0].starts_with("; Generated by rsum v"));
    assert_eq!(lines[1], ";");
    assert_eq!(
        data_lines(&manifest),
        ["a.bin 352441C2", "b.bin 0D4A1185", "c.bin 00000000"]
    );

    let report = check_manifest(&mut ctx, &manifest).unwrap();
    assert_eq!((report.processed, report.ok, report.miss), (3, 3, 0));
    assert_eq!(report.status(), RunStatus::Success);
}

#[test]
fn second_update_adds_nothing() {
    let dir = populate(&[("a.bin", "abc"), ("b.bin", "abc")]);
    let manifest = sfv(&dir);

    let mut ctx = RunContext::new(RunOptions::default());
    update_manifest(&mut ctx, &manifest, &StdDirEnumerator).unwrap();
    let before = fs::read_to_string(&manifest).unwrap();

    let report = update_manifest(&mut ctx, &manifest, &StdDirEnumerator).unwrap();
    assert_eq!(report.added, 0);
    assert_eq!(fs::read_to_string(&manifest).unwrap(), before);
}

#[test]
fn appended_entry_starts_on_its_own_line() {
    let dir = populate(&[("a.bin", "abc"), ("b.bin", "abc")]);
    let manifest = sfv(&dir);
    fs::write(&manifest, "a.bin 352441C2").unwrap();

    let mut ctx = RunContext::new(RunOptions::default());
    let report = update_manifest(&mut ctx, &manifest, &StdDirEnumerator).unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(data_lines(&manifest), ["a.bin 352441C2", "b.bin 352441C2"]);
}

#[test]
fn header_fix_moves_new_comments_above_existing_data() {
    let dir = populate(&[("a.bin", "abc"), ("b.bin", "abc")]);
    let manifest = sfv(&dir);
    fs::write(&manifest, "; old banner\na.bin 352441C2\n").unwrap();

    let mut ctx = RunContext::new(RunOptions::default());
    update_manifest(&mut ctx, &manifest, &StdDirEnumerator).unwrap();

    let lines = read_lines(&manifest);
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "; old banner");
    assert!(lines[1].starts_with(&format!("; {:>12}  ", 3)));
    assert!(lines[1].ends_with(" b.bin"));
    assert_eq!(&lines[2..], ["a.bin 352441C2", "b.bin 352441C2"]);
}

#[test]
fn accept_filter_limits_candidates() {
    let dir = populate(&[("a.mkv", "abc"), ("b.srt", "abc")]);
    let manifest = sfv(&dir);

    let options = RunOptions::default().accept(NameFilter::new(["*.mkv"]).unwrap());
    let mut ctx = RunContext::new(options);
    update_manifest(&mut ctx, &manifest, &StdDirEnumerator).unwrap();
    assert_eq!(data_lines(&manifest), ["a.mkv 352441C2"]);
}

#[test]
fn interrupted_update_keeps_finished_entries_only() {
    let dir = populate(&[("a.bin", "abc"), ("b.bin", "abc"), ("c.bin", "abc")]);
    let manifest = dir.path().join("sums.sha1");

    let options = RunOptions::default().format(ManifestFormat::Bsd);
    let mut ctx = stop_after(options, 2);
    let report = update_manifest(&mut ctx, &manifest, &StdDirEnumerator).unwrap();

    assert!(report.interrupted);
    assert_eq!(report.added, 2);
    assert_eq!(ctx.stats.processed, 2);
    let lines = read_lines(&manifest);
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("SHA1 (b.bin) = "));
}

#[test]
fn interrupted_verify_counts_finished_entries_only() {
    let dir = populate(&[("a.bin", "abc"), ("b.bin", "abc"), ("c.bin", "abc")]);
    let manifest = sfv(&dir);
    fs::write(&manifest, "a.bin 352441C2\nb.bin 352441C2\nc.bin 352441C2\n").unwrap();

    let mut ctx = stop_after(RunOptions::default(), 1);
    let report = check_manifest(&mut ctx, &manifest).unwrap();
    assert!(report.interrupted);
    assert_eq!((report.processed, report.ok), (1, 1));
}

#[test]
fn update_can_embed_crc_into_new_names() {
    let dir = populate(&[("episode.mkv", "abc")]);
    let manifest = sfv(&dir);

    let options = RunOptions::default()
        .embed_crc(true)
        .embed_delimiter(Some('_'));
    let mut ctx = RunContext::new(options);
    update_manifest(&mut ctx, &manifest, &StdDirEnumerator).unwrap();

    let renamed = dir.path().join("episode_[352441C2].mkv");
    assert!(renamed.exists());
    assert_eq!(data_lines(&manifest), ["episode_[352441C2].mkv 352441C2"]);
    assert_eq!(
        find_embedded_crc32("episode_[352441C2].mkv"),
        Some(0x352441C2)
    );

    let report = check_manifest(&mut ctx, &manifest).unwrap();
    assert_eq!((report.processed, report.ok), (1, 1));
}

#[test]
fn missing_files_are_counted_as_miss() {
    let dir = populate(&[("a.bin", "abc")]);
    let manifest = sfv(&dir);
    fs::write(&manifest, "a.bin 352441C2\nlost.bin 352441C2\n").unwrap();

    let mut ctx = RunContext::new(RunOptions::default());
    let report = check_manifest(&mut ctx, &manifest).unwrap();
    assert_eq!((report.processed, report.ok, report.miss), (2, 1, 1));
    assert_eq!(report.status(), RunStatus::Mismatch);
    assert_eq!(
        ctx.stats.to_string(),
        "Errors Occurred: Errors:0   Miss:1   Success:1   Total:2  "
    );
}

#[test]
fn binary_manifest_is_rejected() {
    let dir = populate(&[("a.bin", "abc")]);
    let manifest = sfv(&dir);
    fs::write(&manifest, b"a.bin 352441C2\n\x00\x01\x02\n").unwrap();

    let mut ctx = RunContext::new(RunOptions::default());
    assert!(matches!(
        check_manifest(&mut ctx, &manifest),
        Err(rsum_core::Error::Format { .. })
    ));
    assert!(ctx.stats.error_flag);

    let before = fs::read(&manifest).unwrap();
    assert!(update_manifest(&mut ctx, &manifest, &StdDirEnumerator).is_err());
    assert_eq!(fs::read(&manifest).unwrap(), before);
}
