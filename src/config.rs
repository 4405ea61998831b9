//! Configuration for the converter.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags
//! 2. Config file (`--config <path>`, or `.csv2saf/config.yaml` discovered
//!    in the current directory or one of its parents)
//! 3. Defaults
//!
//! Only file paths come from the caller; no environment variables are read.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory searched for `config.yaml` during discovery
pub const CONFIG_DIR: &str = ".csv2saf";

/// Invalid configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Delimiter must be a single ASCII character other than a quote or newline, got {0:?}")]
    InvalidDelimiter(char),

    #[error("Item prefix must not contain path separators: {0:?}")]
    InvalidItemPrefix(String),
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputConfig {
    /// Field delimiter
    pub delimiter: Option<char>,
    /// Marker that truncates a line; empty disables comments
    pub comment_marker: Option<String>,
    /// Separator for several values in one cell; empty disables splitting
    pub value_separator: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Prefix of every item directory name
    pub item_prefix: Option<String>,
    /// Zero-padded width of the item number
    pub index_width: Option<usize>,
    /// Line termination of the `contents` and `collections` manifests
    pub manifest_newline: Option<ManifestNewline>,
}

/// How manifest lines are terminated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestNewline {
    /// Newline after every line, including the last
    #[default]
    Terminated,

    /// Newline between lines only; the last line has none
    Separated,
}

/// Settings used while reading the input sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSettings {
    pub delimiter: u8,
    pub comment_marker: Option<String>,
    pub value_separator: Option<String>,
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self {
            delimiter: b';',
            comment_marker: Some("#".to_string()),
            value_separator: Some("||".to_string()),
        }
    }
}

impl ParseSettings {
    /// Replace the delimiter, validating it
    pub fn set_delimiter(&mut self, delimiter: char) -> Result<(), ConfigError> {
        self.delimiter = delimiter_byte(delimiter)?;
        Ok(())
    }

    /// Replace the comment marker; an empty marker disables comments
    pub fn set_comment_marker(&mut self, marker: &str) {
        self.comment_marker = non_empty(marker);
    }
}

/// Settings that shape the output tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSettings {
    pub item_prefix: String,
    pub index_width: usize,
    pub manifest_newline: ManifestNewline,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            item_prefix: "item_".to_string(),
            index_width: 3,
            manifest_newline: ManifestNewline::default(),
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub parse: ParseSettings,
    pub layout: LayoutSettings,
    /// Path to config file (if one was used)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Merge a parsed config file over the defaults
    pub fn from_file(file: ConfigFile, path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut parse = ParseSettings::default();
        if let Some(delimiter) = file.input.delimiter {
            parse.set_delimiter(delimiter)?;
        }
        if let Some(marker) = file.input.comment_marker {
            parse.set_comment_marker(&marker);
        }
        if let Some(separator) = file.input.value_separator {
            parse.value_separator = non_empty(&separator);
        }

        let mut layout = LayoutSettings::default();
        if let Some(prefix) = file.output.item_prefix {
            if prefix.contains(['/', '\\']) {
                return Err(ConfigError::InvalidItemPrefix(prefix));
            }
            layout.item_prefix = prefix;
        }
        if let Some(width) = file.output.index_width {
            layout.index_width = width;
        }
        if let Some(newline) = file.output.manifest_newline {
            layout.manifest_newline = newline;
        }

        Ok(Self {
            parse,
            layout,
            config_file: path,
        })
    }
}

fn delimiter_byte(delimiter: char) -> Result<u8, ConfigError> {
    match delimiter {
        '"' | '\n' | '\r' => Err(ConfigError::InvalidDelimiter(delimiter)),
        c if c.is_ascii() => Ok(c as u8),
        c => Err(ConfigError::InvalidDelimiter(c)),
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Find config file by searching `start` and its parents
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from an explicit path, or by discovery from the
/// current directory
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let config_path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => std::env::current_dir()
            .ok()
            .and_then(|dir| find_config_file(&dir)),
    };

    match config_path {
        Some(path) => {
            let file = load_config_file(&path)?;
            ResolvedConfig::from_file(file, Some(path.clone()))
                .with_context(|| format!("Invalid config file: {}", path.display()))
        }
        None => Ok(ResolvedConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ResolvedConfig::default();

        assert_eq!(config.parse.delimiter, b';');
        assert_eq!(config.parse.comment_marker.as_deref(), Some("#"));
        assert_eq!(config.parse.value_separator.as_deref(), Some("||"));
        assert_eq!(config.layout.item_prefix, "item_");
        assert_eq!(config.layout.index_width, 3);
        assert_eq!(config.layout.manifest_newline, ManifestNewline::Terminated);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1"
input:
  delimiter: ","
  comment_marker: ""
  value_separator: "|"
output:
  item_prefix: "record_"
  index_width: 5
  manifest_newline: separated
"#
        )
        .unwrap();

        let raw = load_config_file(&config_path).unwrap();
        assert_eq!(raw.version, "1");

        let config = ResolvedConfig::from_file(raw, Some(config_path.clone())).unwrap();
        assert_eq!(config.parse.delimiter, b',');
        assert_eq!(config.parse.comment_marker, None);
        assert_eq!(config.parse.value_separator.as_deref(), Some("|"));
        assert_eq!(config.layout.item_prefix, "record_");
        assert_eq!(config.layout.index_width, 5);
        assert_eq!(config.layout.manifest_newline, ManifestNewline::Separated);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let raw: ConfigFile = serde_yaml::from_str("version: \"1\"\noutput:\n  index_width: 4\n").unwrap();
        let config = ResolvedConfig::from_file(raw, None).unwrap();

        assert_eq!(config.parse, ParseSettings::default());
        assert_eq!(config.layout.index_width, 4);
        assert_eq!(config.layout.item_prefix, "item_");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let raw: ConfigFile = serde_yaml::from_str("version: \"1\"\ninput:\n  delimiter: \"§\"\n").unwrap();
        assert_eq!(
            ResolvedConfig::from_file(raw, None).unwrap_err(),
            ConfigError::InvalidDelimiter('§')
        );

        let raw: ConfigFile = serde_yaml::from_str("version: \"1\"\noutput:\n  item_prefix: \"a/b\"\n").unwrap();
        assert!(matches!(
            ResolvedConfig::from_file(raw, None),
            Err(ConfigError::InvalidItemPrefix(_))
        ));

        let mut parse = ParseSettings::default();
        assert!(parse.set_delimiter('"').is_err());
        assert!(parse.set_delimiter('\t').is_ok());
        assert_eq!(parse.delimiter, b'\t');
    }

    #[test]
    fn test_find_config_file_in_parent() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("config.yaml"), "version: \"1\"\n").unwrap();

        let nested = temp.path().join("batch").join("2024");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            find_config_file(&nested),
            Some(config_dir.join("config.yaml"))
        );
    }

    #[test]
    fn test_load_explicit_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.yaml");
        std::fs::write(&path, "version: \"1\"\ninput:\n  delimiter: \"\\t\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.parse.delimiter, b'\t');
        assert_eq!(config.config_file, Some(path));

        assert!(load_config(Some(&temp.path().join("missing.yaml"))).is_err());
    }
}
