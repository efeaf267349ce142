use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};
use rsum_codec::ManifestFormat;
use rsum_hash::HashKind;

#[derive(Clone, Debug, Parser)]
#[command(name = "rsum", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
#[command(group(ArgGroup::new("mode").args(["check", "update", "check_embedded"])))]
pub struct App {
    /// Files to hash, or manifests to check or update. `-` reads stdin.
    pub files: Vec<PathBuf>,

    /// Verify files listed in the given manifests
    #[arg(short, long)]
    pub check: bool,

    /// Append files missing from the given manifests
    #[arg(short, long)]
    pub update: bool,

    /// Verify files against the CRC32 embedded in their names
    #[arg(long = "check-embedded")]
    pub check_embedded: bool,

    /// Manifest format; guessed from the extension when omitted
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Digests to compute (crc32, sha1, sha256, sha512, blake3)
    #[arg(short, long = "algo", value_delimiter = ',')]
    pub algorithms: Vec<HashKind>,

    /// Rename hashed files to carry their CRC32, e.g. `name[1A2B3C4D].ext`.
    /// With --check, also compare CRC32 values embedded in listed names
    #[arg(short, long)]
    pub embed_crc: bool,

    /// Character inserted before an embedded CRC32
    #[arg(long, value_name = "CHAR")]
    pub embed_crc_delimiter: Option<char>,

    /// Hash all files into one aggregate digest with this label
    #[arg(long, value_name = "LABEL", conflicts_with_all = ["check", "update"])]
    pub batch: Option<String>,

    /// Only add files matching these glob patterns when updating
    #[arg(long, value_name = "GLOB", value_delimiter = ',')]
    pub accept: Vec<String>,

    /// Separator for printed paths
    #[arg(long, value_name = "CHAR")]
    pub path_separator: Option<char>,

    /// Resolve manifest entries against the current directory instead of the manifest's
    #[arg(long)]
    pub no_chdir: bool,

    /// Report hashing speed
    #[arg(long)]
    pub speed: bool,

    /// Show a progress bar for each file
    #[arg(short = 'P', long)]
    pub percents: bool,

    /// Log every line appended to a manifest
    #[arg(short, long)]
    pub verbose: bool,

    /// Write computed lines to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Configuration file
    #[arg(long, env = "RSUM_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Sfv,
    Simple,
    Bsd,
}

impl From<FormatArg> for ManifestFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Sfv => ManifestFormat::Sfv,
            FormatArg::Simple => ManifestFormat::Simple,
            FormatArg::Bsd => ManifestFormat::Bsd,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Compute,
    Check,
    CheckEmbedded,
    Update,
}

impl App {
    pub fn mode(&self) -> Mode {
        if self.check {
            Mode::Check
        } else if self.update {
            Mode::Update
        } else if self.check_embedded {
            Mode::CheckEmbedded
        } else {
            Mode::Compute
        }
    }
}
