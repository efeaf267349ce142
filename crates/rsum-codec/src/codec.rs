use std::fmt;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rsum_hash::{HashContext, HashKind, HashMask};

use crate::{ChecksumRecord, CodecError};

static BSD_LINE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9_-]*) ?\((.*)\) ?= ?([0-9A-Fa-f]+)$").ok());

/// Turns manifest lines into [`ChecksumRecord`]s and back.
pub trait LineCodec {
    /// Decode one line. `more_input_follows` tells the codec whether this is
    /// the final line of the stream.
    fn decode(&self, line: &str, more_input_follows: bool) -> Option<ChecksumRecord>;

    /// Render the digests in `mask` for `path`. Multi-line output is joined by `\n`.
    fn encode(&self, path: &str, ctx: &HashContext, mask: HashMask) -> String;

    /// Compare every expected digest (and the embedded CRC32, if any)
    /// against a finalized context.
    fn verify(&self, record: &ChecksumRecord, ctx: &HashContext) -> bool {
        let digests_match = record
            .mask()
            .iter()
            .all(|kind| ctx.digest(kind).is_some() && ctx.digest(kind) == record.expected(kind));
        let embedded_match = match record.embedded_crc32() {
            Some(expected) => ctx.crc32() == Some(expected),
            None => true,
        };
        digests_match && embedded_match
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestFormat {
    /// `path CRC32`, `;` comments and a generator banner.
    Sfv,
    /// `hex  path`, as written by the coreutils `*sum` tools.
    #[default]
    Simple,
    /// `KIND (path) = hex`.
    Bsd,
}

impl ManifestFormat {
    pub fn has_banner(self) -> bool { self == ManifestFormat::Sfv }

    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("sfv") => ManifestFormat::Sfv,
            _ => ManifestFormat::Simple,
        }
    }

    /// Kinds the format can carry out of `requested`; SFV only knows CRC32.
    pub fn effective_mask(self, requested: HashMask) -> HashMask {
        match self {
            ManifestFormat::Sfv => HashKind::Crc32.into(),
            _ if requested.is_empty() => HashKind::Sha256.into(),
            _ => requested,
        }
    }
}

/// Digest kind named by a manifest's extension, e.g. `.sha1` or `.b3`.
pub fn implied_kind(path: &Path) -> Option<HashKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "sfv" | "crc32" => Some(HashKind::Crc32),
        "sha1" => Some(HashKind::Sha1),
        "sha256" => Some(HashKind::Sha256),
        "sha512" => Some(HashKind::Sha512),
        "b3" | "blake3" => Some(HashKind::Blake3),
        _ => None,
    }
}

impl FromStr for ManifestFormat {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sfv" => Ok(ManifestFormat::Sfv),
            "simple" => Ok(ManifestFormat::Simple),
            "bsd" => Ok(ManifestFormat::Bsd),
            _ => Err(CodecError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestFormat::Sfv => write!(f, "sfv"),
            ManifestFormat::Simple => write!(f, "simple"),
            ManifestFormat::Bsd => write!(f, "bsd"),
        }
    }
}

/// The codec for all three grammars.
///
/// Decoding accepts any of them; `format` decides what `encode` writes and
/// which grammar wins when a line is ambiguous. `preferred` picks between
/// kinds with equally long digests (SHA256 vs BLAKE3).
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestCodec {
    format:    ManifestFormat,
    preferred: HashMask,
}

impl ManifestCodec {
    pub fn new(format: ManifestFormat) -> Self {
        Self {
            format,
            preferred: HashMask::empty(),
        }
    }

    pub fn with_preferred(mut self, preferred: HashMask) -> Self {
        self.preferred = preferred;
        self
    }

    pub fn format(&self) -> ManifestFormat { self.format }

    fn kind_for_hex(&self, token: &str) -> Option<HashKind> {
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut candidates = HashKind::by_hex_len(token.len()).peekable();
        let first = *candidates.peek()?;
        Some(
            candidates
                .find(|kind| self.preferred.contains(*kind))
                .unwrap_or(first),
        )
    }

    fn decode_bsd(&self, text: &str) -> Option<ChecksumRecord> {
        let caps = BSD_LINE.as_ref()?.captures(text)?;
        let kind: HashKind = caps[1].parse().ok()?;
        let digest = &caps[3];
        if digest.len() != kind.digest_len() * 2 {
            return None;
        }
        let mut record = ChecksumRecord::new(Some(caps[2].to_string()));
        record.expect(kind, hex::decode(digest).ok()?);
        Some(record)
    }

    fn decode_sfv(&self, text: &str) -> Option<ChecksumRecord> {
        let text = text.trim_end();
        let split = text.rfind([' ', '\t'])?;
        let (path, token) = (text[..split].trim(), &text[split + 1..]);
        if path.is_empty() || token.len() != 8 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut record = ChecksumRecord::new(Some(path.to_string()));
        record.expect(HashKind::Crc32, hex::decode(token).ok()?);
        Some(record)
    }

    fn decode_simple(&self, text: &str) -> Option<ChecksumRecord> {
        let mut record = ChecksumRecord::default();
        let mut rest = text.trim_start();
        loop {
            let end = rest.find([' ', '\t']).unwrap_or(rest.len());
            let token = &rest[..end];
            let Some(kind) = self
                .kind_for_hex(token)
                .filter(|kind| !record.mask().contains(*kind))
            else {
                break;
            };
            record.expect(kind, hex::decode(token).ok()?);
            rest = &rest[end..];
            let Some(after) = rest.strip_prefix([' ', '\t']) else {
                break;
            };
            rest = after;
            // a second space or a `*` binary marker introduces the path
            if let Some(path) = rest.strip_prefix([' ', '*']) {
                rest = path;
                break;
            }
        }
        if record.mask().is_empty() {
            return None;
        }
        if !rest.is_empty() {
            record.set_path(rest);
        }
        Some(record)
    }
}

impl LineCodec for ManifestCodec {
    fn decode(&self, line: &str, more_input_follows: bool) -> Option<ChecksumRecord> {
        if more_input_follows && !line.ends_with('\n') {
            return None;
        }
        let text = line.trim_end_matches(['\r', '\n']);
        if text.trim().is_empty() {
            return None;
        }
        if let Some(record) = self.decode_bsd(text) {
            return Some(record);
        }
        match self.format {
            ManifestFormat::Sfv => self.decode_sfv(text).or_else(|| self.decode_simple(text)),
            _ => self.decode_simple(text).or_else(|| self.decode_sfv(text)),
        }
    }

    fn encode(&self, path: &str, ctx: &HashContext, mask: HashMask) -> String {
        match self.format {
            ManifestFormat::Sfv => {
                let crc = ctx
                    .digest(HashKind::Crc32)
                    .map(hex::encode_upper)
                    .unwrap_or_default();
                format!("{path} {crc}")
            }
            ManifestFormat::Simple => {
                let digests: Vec<String> = mask.iter().filter_map(|k| ctx.hex_digest(k)).collect();
                format!("{}  {path}", digests.join(" "))
            }
            ManifestFormat::Bsd => mask
                .iter()
                .filter_map(|k| ctx.hex_digest(k).map(|hex| format!("{k} ({path}) = {hex}")))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SHA256_ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    fn finalized(mask: HashMask, data: &[u8]) -> HashContext {
        let mut ctx = HashContext::new(mask);
        ctx.update(data);
        ctx.finalize();
        ctx
    }

    #[test]
    fn test_decode_sfv_line() {
        let codec = ManifestCodec::new(ManifestFormat::Sfv);
        let record = codec.decode("my file.txt 1A2B3C4D\r\n", true).unwrap();
        assert_eq!(record.path(), Some("my file.txt"));
        assert_eq!(record.expected(HashKind::Crc32), Some(&[0x1A, 0x2B, 0x3C, 0x4D][..]));
    }

    #[test]
    fn test_decode_simple_line_with_binary_marker() {
        let codec = ManifestCodec::default();
        let record = codec.decode(&format!("{SHA256_ABC} *abc.txt\n"), false).unwrap();
        assert_eq!(record.path(), Some("abc.txt"));
        assert_eq!(record.mask(), HashMask::from(HashKind::Sha256));
    }

    #[test]
    fn test_decode_simple_multiple_digests() {
        let codec = ManifestCodec::default();
        let line = format!("352441c2 {SHA256_ABC}  a b.txt\n");
        let record = codec.decode(&line, false).unwrap();
        assert_eq!(record.path(), Some("a b.txt"));
        assert_eq!(record.mask(), HashMask::from(HashKind::Crc32) | HashKind::Sha256);
    }

    #[test]
    fn test_decode_lone_digest_has_no_path() {
        let codec = ManifestCodec::default();
        let record = codec.decode(SHA256_ABC, false).unwrap();
        assert_eq!(record.path(), None);
        assert!(record.mask().contains(HashKind::Sha256));
    }

    #[test]
    fn test_preferred_kind_disambiguates() {
        let codec = ManifestCodec::default().with_preferred(HashKind::Blake3.into());
        let record = codec.decode(&format!("{SHA256_ABC}  abc\n"), false).unwrap();
        assert_eq!(record.mask(), HashMask::from(HashKind::Blake3));
    }

    #[test]
    fn test_decode_bsd_line() {
        let codec = ManifestCodec::new(ManifestFormat::Sfv);
        let record = codec.decode(&format!("SHA256 (abc) = {SHA256_ABC}\n"), true).unwrap();
        assert_eq!(record.path(), Some("abc"));
        assert_eq!(record.mask(), HashMask::from(HashKind::Sha256));
        assert!(codec.decode("SHA256 (abc) = 1234\n", true).is_none());
    }

    #[test]
    fn test_rejects_unterminated_line_when_more_follows() {
        let codec = ManifestCodec::new(ManifestFormat::Sfv);
        assert!(codec.decode("file 1A2B3C4D", true).is_none());
        assert!(codec.decode("file 1A2B3C4D", false).is_some());
    }

    #[test]
    fn test_rejects_garbage() {
        let codec = ManifestCodec::default();
        assert!(codec.decode("hello world\n", false).is_none());
        assert!(codec.decode("   \n", false).is_none());
    }

    #[test]
    fn test_verify_against_context() {
        let codec = ManifestCodec::default();
        let ctx = finalized(HashKind::Sha256.into(), b"abc");
        let good = codec.decode(&format!("{SHA256_ABC}  abc\n"), false).unwrap();
        assert!(codec.verify(&good, &ctx));

        let mut bad = good.clone();
        bad.expect(HashKind::Sha256, vec![0; 32]);
        assert!(!codec.verify(&bad, &ctx));

        let mut embedded = good;
        embedded.set_embedded_crc32(0xDEADBEEF);
        let ctx = finalized(HashMask::from(HashKind::Sha256) | HashKind::Crc32, b"abc");
        assert!(!codec.verify(&embedded, &ctx));
    }

    #[test]
    fn test_encode_each_format() {
        let mask = HashMask::from(HashKind::Crc32) | HashKind::Sha256;
        let ctx = finalized(mask, b"abc");

        let sfv = ManifestCodec::new(ManifestFormat::Sfv).encode("abc", &ctx, HashKind::Crc32.into());
        assert_eq!(sfv, "abc 352441C2");

        let simple = ManifestCodec::new(ManifestFormat::Simple).encode("abc", &ctx, mask);
        assert_eq!(simple, format!("352441c2 {SHA256_ABC}  abc"));

        let bsd = ManifestCodec::new(ManifestFormat::Bsd).encode("abc", &ctx, mask);
        assert_eq!(bsd, format!("CRC32 (abc) = 352441c2\nSHA256 (abc) = {SHA256_ABC}"));
    }

    #[test]
    fn test_encoded_lines_decode_back() {
        let ctx = finalized(HashKind::Crc32.into(), b"abc");
        let codec = ManifestCodec::new(ManifestFormat::Sfv);
        let line = codec.encode("dir/abc.bin", &ctx, HashKind::Crc32.into());
        let record = codec.decode(&line, false).unwrap();
        assert_eq!(record.path(), Some("dir/abc.bin"));
        assert!(codec.verify(&record, &ctx));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ManifestFormat::from_path(Path::new("x/Y.SFV")), ManifestFormat::Sfv);
        assert_eq!(ManifestFormat::from_path(Path::new("x/y.sha256")), ManifestFormat::Simple);
        assert!("yaml".parse::<ManifestFormat>().is_err());
    }

    #[test]
    fn test_implied_kind() {
        assert_eq!(implied_kind(Path::new("sums.SHA1")), Some(HashKind::Sha1));
        assert_eq!(implied_kind(Path::new("a/sums.b3")), Some(HashKind::Blake3));
        assert_eq!(implied_kind(Path::new("sums.blake3")), Some(HashKind::Blake3));
        assert_eq!(implied_kind(Path::new("sums.txt")), None);
        assert_eq!(implied_kind(Path::new("sums")), None);
    }
}
