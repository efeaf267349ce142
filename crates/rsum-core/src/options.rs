use std::path::Path;

use glob::{MatchOptions, Pattern};
use rsum_codec::{ManifestCodec, ManifestFormat, implied_kind};
use rsum_hash::{HashKind, HashMask};

use crate::Result;

/// Accepts file names matching any of a set of glob patterns.
///
/// An empty filter accepts every name.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    patterns: Vec<Pattern>,
}

impl NameFilter {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool { self.patterns.is_empty() }

    pub fn matches(&self, name: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: !cfg!(windows),
            ..MatchOptions::new()
        };
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches_with(name, options))
    }
}

/// Settings for one verify, update or compute run.
///
/// # Examples
///
/// ```
/// use rsum_core::RunOptions;
/// use rsum_codec::ManifestFormat;
///
/// let options = RunOptions::default()
///     .format(ManifestFormat::Sfv)
///     .embed_crc(true)
///     .embed_delimiter(Some('_'));
/// ```
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Output grammar. `None` picks one from the manifest's extension.
    pub format:          Option<ManifestFormat>,
    /// Digests to compute when writing. Empty means the format's default.
    pub hash_mask:       HashMask,
    /// Also compare CRC32 values embedded in file names while verifying.
    pub check_embedded:  bool,
    /// Rename hashed files so their names carry their CRC32.
    pub embed_crc:       bool,
    /// Character inserted before the `[XXXXXXXX]` tag when embedding.
    pub embed_delimiter: Option<char>,
    /// Separator used in displayed and written paths.
    pub path_separator:  Option<char>,
    /// Resolve relative manifest entries against the manifest's directory.
    pub emulate_chdir:   bool,
    /// Names considered when updating a manifest from its directory.
    pub accept:          NameFilter,
    /// Hash all inputs into one aggregate digest under this label.
    pub batch:           Option<String>,
    /// Log throughput after each run.
    pub speed:           bool,
    /// Log every line appended to a manifest.
    pub verbose:         bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            format:          None,
            hash_mask:       HashMask::empty(),
            check_embedded:  false,
            embed_crc:       false,
            embed_delimiter: None,
            path_separator:  None,
            emulate_chdir:   true,
            accept:          NameFilter::default(),
            batch:           None,
            speed:           false,
            verbose:         false,
        }
    }
}

impl RunOptions {
    pub fn format(mut self, format: ManifestFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn hash_mask(mut self, mask: HashMask) -> Self {
        self.hash_mask = mask;
        self
    }

    pub fn check_embedded(mut self, check: bool) -> Self {
        self.check_embedded = check;
        self
    }

    pub fn embed_crc(mut self, embed: bool) -> Self {
        self.embed_crc = embed;
        self
    }

    pub fn embed_delimiter(mut self, delimiter: Option<char>) -> Self {
        self.embed_delimiter = delimiter;
        self
    }

    pub fn path_separator(mut self, separator: Option<char>) -> Self {
        self.path_separator = separator;
        self
    }

    pub fn emulate_chdir(mut self, emulate: bool) -> Self {
        self.emulate_chdir = emulate;
        self
    }

    pub fn accept(mut self, filter: NameFilter) -> Self {
        self.accept = filter;
        self
    }

    pub fn batch(mut self, label: impl Into<String>) -> Self {
        self.batch = Some(label.into());
        self
    }

    pub fn speed(mut self, speed: bool) -> Self {
        self.speed = speed;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn format_for(&self, manifest: &Path) -> ManifestFormat {
        self.format.unwrap_or_else(|| ManifestFormat::from_path(manifest))
    }

    /// Kinds asked for explicitly, else the one the manifest's extension names.
    pub fn requested_mask(&self, manifest: &Path) -> HashMask {
        if !self.hash_mask.is_empty() {
            return self.hash_mask;
        }
        implied_kind(manifest).map(HashMask::from).unwrap_or_default()
    }

    pub fn codec_for(&self, manifest: &Path) -> ManifestCodec {
        ManifestCodec::new(self.format_for(manifest)).with_preferred(self.requested_mask(manifest))
    }

    /// Kinds to compute when writing lines in `format`.
    pub fn effective_mask(&self, format: ManifestFormat) -> HashMask {
        self.mask_with(format, self.hash_mask)
    }

    /// Kinds to compute when appending to `manifest`.
    pub fn mask_for(&self, manifest: &Path, format: ManifestFormat) -> HashMask {
        self.mask_with(format, self.requested_mask(manifest))
    }

    fn mask_with(&self, format: ManifestFormat, requested: HashMask) -> HashMask {
        let mask = format.effective_mask(requested);
        if self.embed_crc { mask | HashKind::Crc32 } else { mask }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_accepts_everything() {
        let filter = NameFilter::default();
        assert!(filter.matches("anything.bin"));
    }

    #[test]
    fn test_filter_patterns() {
        let filter = NameFilter::new(["*.mkv", "*.avi"]).unwrap();
        assert!(filter.matches("movie.mkv"));
        assert!(!filter.matches("movie.srt"));
        assert!(NameFilter::new(["[unclosed"]).is_err());
    }

    #[test]
    fn test_effective_mask() {
        let options = RunOptions::default().hash_mask(HashKind::Sha1.into());
        assert_eq!(options.effective_mask(ManifestFormat::Sfv), HashKind::Crc32.into());
        assert_eq!(options.effective_mask(ManifestFormat::Simple), HashKind::Sha1.into());

        let options = options.embed_crc(true);
        assert_eq!(
            options.effective_mask(ManifestFormat::Bsd),
            HashMask::from(HashKind::Sha1) | HashKind::Crc32
        );
    }

    #[test]
    fn test_extension_names_the_digest() {
        let options = RunOptions::default();
        let manifest = Path::new("sums.sha1");
        assert_eq!(
            options.mask_for(manifest, ManifestFormat::Simple),
            HashKind::Sha1.into()
        );
        assert_eq!(
            options.requested_mask(Path::new("sums.b3")),
            HashKind::Blake3.into()
        );

        let options = options.hash_mask(HashKind::Sha512.into());
        assert_eq!(
            options.mask_for(manifest, ManifestFormat::Simple),
            HashKind::Sha512.into()
        );
    }

    #[test]
    fn test_format_for_uses_extension() {
        let options = RunOptions::default();
        assert_eq!(options.format_for(Path::new("a/b.sfv")), ManifestFormat::Sfv);
        let options = options.format(ManifestFormat::Bsd);
        assert_eq!(options.format_for(Path::new("a/b.sfv")), ManifestFormat::Bsd);
    }
}
