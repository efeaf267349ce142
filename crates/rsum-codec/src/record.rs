use rsum_hash::{HashKind, HashMask};

/// One decoded manifest line.
///
/// The digest mask is derived from the stored digests, so a kind is only
/// ever reported as expected when its bytes are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumRecord {
    path:           Option<String>,
    expected:       Vec<(HashKind, Vec<u8>)>,
    embedded_crc32: Option<u32>,
}

impl ChecksumRecord {
    pub fn new(path: Option<String>) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    pub fn path(&self) -> Option<&str> { self.path.as_deref() }

    pub fn set_path(&mut self, path: impl Into<String>) { self.path = Some(path.into()); }

    /// Record the expected digest for `kind`, replacing an earlier one.
    pub fn expect(&mut self, kind: HashKind, digest: Vec<u8>) {
        match self.expected.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, slot)) => *slot = digest,
            None => self.expected.push((kind, digest)),
        }
    }

    pub fn expected(&self, kind: HashKind) -> Option<&[u8]> {
        self.expected
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, d)| d.as_slice())
    }

    pub fn mask(&self) -> HashMask { self.expected.iter().map(|(k, _)| *k).collect() }

    pub fn embedded_crc32(&self) -> Option<u32> { self.embedded_crc32 }

    pub fn set_embedded_crc32(&mut self, crc32_be: u32) { self.embedded_crc32 = Some(crc32_be); }

    /// Kinds that must be computed to check this record, CRC32 included when
    /// an embedded value is expected.
    pub fn required_mask(&self) -> HashMask {
        match self.embedded_crc32 {
            Some(_) => self.mask() | HashKind::Crc32,
            None => self.mask(),
        }
    }
}
