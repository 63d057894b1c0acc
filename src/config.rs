//! TOML configuration.
//!
//! Every field has a default, so an empty file (or no file at all, see
//! [`Config::minimal`]) is a valid configuration.

use anyhow::{bail, Context, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub time: TimeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            prefix: default_prefix(),
            extension: default_extension(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./out")
}
fn default_prefix() -> String {
    "travelogue-".to_string()
}
fn default_extension() -> String {
    "geojson".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimeConfig {
    /// Fixed reference timezone, `±HH:MM`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
        }
    }
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

impl Config {
    /// Configuration used when no file is given on the command line.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// The reference offset used for day keys and naive EXIF times.
    pub fn reference_offset(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.time.utc_offset)
    }
}

impl OutputConfig {
    /// File name for one day's document: `<prefix><date>.<extension>`.
    pub fn file_name(&self, date: &str) -> String {
        format!("{}{}.{}", self.prefix, date, self.extension)
    }
}

/// Parse `Z`, `+HH:MM`, `-HH:MM` or `+HHMM` into a fixed offset.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).context("invalid UTC offset");
    }

    let (sign, rest) = match s.chars().next() {
        Some('+') => (1, &s[1..]),
        Some('-') => (-1, &s[1..]),
        _ => bail!("utc_offset must start with '+' or '-': '{}'", s),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        bail!("utc_offset must look like +HH:MM: '{}'", s);
    }
    let hours: i32 = digits[..2].parse()?;
    let minutes: i32 = digits[2..].parse()?;
    if minutes >= 60 {
        bail!("utc_offset minutes out of range: '{}'", s);
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .with_context(|| format!("utc_offset out of range: '{}'", s))
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    config
        .reference_offset()
        .with_context(|| "time.utc_offset is invalid")?;

    if config.output.extension.is_empty() {
        bail!("output.extension must not be empty");
    }
    for (field, value) in [
        ("output.prefix", &config.output.prefix),
        ("output.extension", &config.output.extension),
    ] {
        if value.contains('/') || value.contains('\\') {
            bail!("{} must not contain path separators: '{}'", field, value);
        }
    }

    Ok(())
}
