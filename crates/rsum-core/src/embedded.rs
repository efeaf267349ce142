//! CRC32 values embedded in file names, as in `episode_[1A2B3C4D].mkv`.

use std::fmt::Write;
use std::ops::Range;
use std::path::PathBuf;

use crate::{Error, FileJob, Result};

const TAG_LEN: usize = 10;

fn is_separator(b: u8) -> bool { b == b'/' || (cfg!(windows) && b == b'\\') }

/// Offset of the first byte after the last path separator.
fn basename_start(path: &str) -> usize {
    path.bytes()
        .rposition(is_separator)
        .map_or(0, |i| i + 1)
}

/// Locate the rightmost `[XXXXXXXX]` or `(XXXXXXXX)` tag in the last path
/// component. Returns the byte range of the whole tag and its value.
pub fn find_embedded_crc32_range(path: &str) -> Option<(Range<usize>, u32)> {
    let bytes = path.as_bytes();
    let floor = basename_start(path);
    if bytes.len() < floor + TAG_LEN {
        return None;
    }

    let mut start = bytes.len() - TAG_LEN;
    loop {
        let (open, close) = (bytes[start], bytes[start + TAG_LEN - 1]);
        if matches!((open, close), (b'[', b']') | (b'(', b')')) {
            let digits = &bytes[start + 1..start + TAG_LEN - 1];
            if digits.iter().all(u8::is_ascii_hexdigit) {
                // all ASCII, so these are char boundaries
                let value = u32::from_str_radix(&path[start + 1..start + TAG_LEN - 1], 16).ok()?;
                return Some((start..start + TAG_LEN, value));
            }
        }
        if start == floor {
            return None;
        }
        start -= 1;
    }
}

pub fn find_embedded_crc32(path: &str) -> Option<u32> {
    find_embedded_crc32_range(path).map(|(_, crc)| crc)
}

/// Insert `[XXXXXXXX]`, optionally preceded by `delimiter`, before the
/// extension of the last path component (or at the end when there is none).
pub fn embed_crc32(path: &str, crc32: u32, delimiter: Option<char>) -> String {
    let base = basename_start(path);
    let insert_at = path[base..].rfind('.').map_or(path.len(), |i| base + i);

    let mut out = String::with_capacity(path.len() + TAG_LEN + 1);
    out.push_str(&path[..insert_at]);
    if let Some(delimiter) = delimiter {
        out.push(delimiter);
    }
    let _ = write!(out, "[{crc32:08X}]");
    out.push_str(&path[insert_at..]);
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedOutcome {
    /// The name already carries the right value.
    AlreadyEmbedded,
    /// The name carries a different value. Nothing was renamed.
    WrongEmbedded { found: u32, actual: u32 },
    Renamed { from: PathBuf, to: PathBuf },
}

/// Make sure the name of `job` carries `crc32`, renaming the file if needed.
///
/// On rename failure the file and `job` keep their old paths.
pub fn verify_or_embed(job: &mut FileJob, crc32: u32, delimiter: Option<char>) -> Result<EmbedOutcome> {
    if let Some(found) = find_embedded_crc32(job.utf8_display_path()) {
        if found == crc32 {
            return Ok(EmbedOutcome::AlreadyEmbedded);
        }
        tracing::warn!(
            path = %job.utf8_display_path(),
            "wrong embedded CRC32, should be {crc32:08X}"
        );
        return Ok(EmbedOutcome::WrongEmbedded {
            found,
            actual: crc32,
        });
    }

    let from = job.full_path().to_path_buf();
    let name = from
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::NonUtf8Name { path: from.clone() })?;
    let new_name = embed_crc32(name, crc32, delimiter);
    let to = from.with_file_name(&new_name);

    if let Err(e) = rsum_fs::rename_file(&from, &to) {
        tracing::error!("{e}");
        return Err(e.into());
    }

    let display = job.display_path().with_file_name(&new_name);
    job.rename_to(to.clone(), display);
    Ok(EmbedOutcome::Renamed { from, to })
}
