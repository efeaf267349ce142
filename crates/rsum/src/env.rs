use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use home::home_dir;
use serde::Deserialize;

/// Defaults read from `config.toml`. Command-line flags take precedence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub format:              Option<String>,
    pub algorithms:          Vec<String>,
    pub embed_crc_delimiter: Option<char>,
    pub path_separator:      Option<char>,
    pub accept:              Vec<String>,
    pub speed:               bool,
    pub percents:            bool,
}

impl Config {
    /// `<config dir>/rsum/config.toml`, honouring `XDG_CONFIG_HOME`.
    pub fn default_path() -> Option<PathBuf> {
        let base = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .or_else(|| home_dir().map(|home| home.join(".config")))?;
        Some(base.join("rsum").join("config.toml"))
    }

    /// Load `explicit`, or the default file when it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> { Ok(toml::from_str(text)?) }
}
