use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use rsum_codec::{ChecksumRecord, LineCodec, ManifestCodec};
use rsum_codec::{is_blank_line, is_comment_line, strip_bom, text_line};

use crate::job::is_stdin_path;
use crate::{Error, Result};

/// A decoded manifest line and its 0-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRecord {
    pub line_num: usize,
    pub record:   ChecksumRecord,
}

/// Reads checksum records out of a manifest, one line at a time.
///
/// A UTF-8 BOM is skipped on the first line. Empty, comment and blank lines
/// are skipped, as are lines the codec can't turn into a record with at
/// least one digest. A line that looks binary ends the scan with
/// [`Error::Format`].
pub struct ManifestScanner<R> {
    reader:   R,
    codec:    ManifestCodec,
    source:   PathBuf,
    line_num: usize,
    buf:      Vec<u8>,
    done:     bool,
}

impl ManifestScanner<Box<dyn BufRead>> {
    /// Open `path`, or standard input when it is `-`.
    pub fn open(path: &Path, codec: ManifestCodec) -> Result<Self> {
        let reader: Box<dyn BufRead> = if is_stdin_path(path) {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(path).map_err(|e| Error::io(path, e))?;
            Box::new(BufReader::new(file))
        };
        Ok(Self::new(reader, codec, path))
    }

    /// Like [`open`](Self::open), but a missing file yields `None`.
    pub fn open_existing(path: &Path, codec: ManifestCodec) -> Result<Option<Self>> {
        match Self::open(path, codec) {
            Ok(scanner) => Ok(Some(scanner)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<R: BufRead> ManifestScanner<R> {
    pub fn new(reader: R, codec: ManifestCodec, source: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            codec,
            source: source.into(),
            line_num: 0,
            buf: Vec::with_capacity(256),
            done: false,
        }
    }

    pub fn source(&self) -> &Path { &self.source }

    pub fn next_record(&mut self) -> Result<Option<ScannedRecord>> {
        while !self.done {
            self.buf.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .map_err(|e| Error::io(&self.source, e))?;
            if read == 0 {
                self.done = true;
                break;
            }

            let line_num = self.line_num;
            self.line_num += 1;

            let mut line = self.buf.as_slice();
            if line_num == 0 {
                line = strip_bom(line);
            }
            if line.is_empty() {
                continue;
            }
            let Some(text) = text_line(line) else {
                self.done = true;
                tracing::error!(path = %self.source.display(), line = line_num, "file is binary");
                return Err(Error::Format {
                    path: self.source.clone(),
                });
            };
            if is_comment_line(line) || is_blank_line(line) {
                continue;
            }

            let more = !self
                .reader
                .fill_buf()
                .map_err(|e| Error::io(&self.source, e))?
                .is_empty();

            match self.codec.decode(text, more) {
                Some(record) if !record.mask().is_empty() => {
                    return Ok(Some(ScannedRecord { line_num, record }));
                }
                _ => tracing::trace!(line = line_num, "skipping undecodable line"),
            }
        }
        Ok(None)
    }
}

impl<R: BufRead> Iterator for ManifestScanner<R> {
    type Item = Result<ScannedRecord>;

    fn next(&mut self) -> Option<Self::Item> { self.next_record().transpose() }
}
