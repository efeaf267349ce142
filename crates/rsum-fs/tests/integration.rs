use std::io::Write;

use rsum_fs::{DirEnumerator, StagedFile, StdDirEnumerator, rename_file};
use tempfile::tempdir;

#[test]
fn test_staged_rewrite_is_invisible_until_commit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sums.sfv");
    std::fs::write(&path, "; old\nfile 00000000\n").unwrap();

    let mut staged = StagedFile::new(&path).unwrap();
    writeln!(staged, "; new").unwrap();
    staged.flush().unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "; old\nfile 00000000\n");

    staged.commit().unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "; new\n");
}

#[test]
fn test_staged_file_does_not_show_up_after_commit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sums.sfv");

    let mut staged = StagedFile::new(&path).unwrap();
    staged.write_all(b"x").unwrap();
    staged.commit().unwrap();

    let entries = StdDirEnumerator.read_dir(dir.path()).unwrap().unwrap();
    let names: Vec<_> = entries.into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["sums.sfv".to_string()]);
}

#[test]
fn test_rename_into_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let from = dir.path().join("a");
    std::fs::write(&from, "a").unwrap();

    let err = rename_file(&from, dir.path().join("missing/a")).unwrap_err();
    assert!(err.is_not_found());
    assert!(from.exists());
}
