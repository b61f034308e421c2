//! Configuration for source scanning.
//!
//! Settings are read from a JSON or YAML file; every field is optional and
//! falls back to its default.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::parser::SourceLanguage;

/// Default size limit for a single scanned file (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file: {0}")]
    IoError(#[from] io::Error),

    /// Failed to parse the configuration JSON.
    #[error("Failed to parse config: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Failed to parse the configuration YAML.
    #[error("Failed to parse config: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Controls which files a directory scan reads.
///
/// # Example
///
/// ```
/// use metagraph::config::ScanConfig;
/// use metagraph::parser::SourceLanguage;
///
/// let config = ScanConfig::from_json_str(r#"{"languages": ["c"]}"#).unwrap();
/// assert_eq!(config.languages, vec![SourceLanguage::C]);
/// assert!(config.is_excluded_dir(".git"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Languages to parse; files of other languages are skipped
    pub languages: Vec<SourceLanguage>,
    /// Directory names never descended into
    pub excluded_directories: Vec<String>,
    /// Files larger than this are skipped
    pub max_file_size_bytes: u64,
    /// Fail a file on its first malformed dependency list instead of
    /// skipping just that block
    pub strict: bool,
    /// Parse files on a worker pool
    pub parallel_processing: bool,
    /// Worker threads for parallel parsing; `None` uses one per CPU
    pub max_workers: Option<usize>,
    /// Reuse records of files unchanged since they were last parsed
    pub cache_enabled: bool,
    /// Where cached records are persisted; `None` keeps them in memory only
    pub cache_directory: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            languages: SourceLanguage::ALL.to_vec(),
            excluded_directories: [".git", "__pycache__", "venv", ".venv", "node_modules", "target"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            strict: false,
            parallel_processing: true,
            max_workers: None,
            cache_enabled: false,
            cache_directory: None,
        }
    }
}

impl ScanConfig {
    /// Parses configuration from a JSON string.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Loads configuration from a file.
    ///
    /// Files ending in `.yaml` or `.yml` are read as YAML, anything else as
    /// JSON. A missing file yields the default configuration.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );

        match fs::read_to_string(path) {
            Ok(content) if is_yaml => Self::from_yaml_str(&content),
            Ok(content) => Self::from_json_str(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns true if files of `language` should be parsed.
    pub fn accepts(&self, language: SourceLanguage) -> bool {
        self.languages.contains(&language)
    }

    /// Returns true if a directory with this name should be skipped.
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_directories.iter().any(|d| d == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.languages.len(), 4);
        assert!(config.is_excluded_dir("__pycache__"));
        assert!(!config.is_excluded_dir("src"));
        assert_eq!(config.max_file_size_bytes, DEFAULT_MAX_FILE_SIZE_BYTES);
        assert!(!config.strict);
        assert!(config.parallel_processing);
        assert!(!config.cache_enabled);
        assert_eq!(config.cache_directory, None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ScanConfig::from_json_str(r#"{"max_file_size_bytes": 512}"#).unwrap();
        assert_eq!(config.max_file_size_bytes, 512);
        assert_eq!(config.languages, SourceLanguage::ALL.to_vec());
    }

    #[test]
    fn test_invalid_json() {
        let result = ScanConfig::from_json_str(r#"{"languages": ["cobol"]}"#);
        assert!(matches!(result, Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::load(&dir.path().join("missing.json")).unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metagraph.json");
        fs::write(&path, r#"{"excluded_directories": ["build"]}"#).unwrap();

        let config = ScanConfig::load(&path).unwrap();
        assert!(config.is_excluded_dir("build"));
        assert!(!config.is_excluded_dir(".git"));
        assert!(config.accepts(SourceLanguage::Python));
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metagraph.yaml");
        fs::write(
            &path,
            "languages: [python, cpp]\nparallel_processing: false\nmax_workers: 2\ncache_enabled: true\ncache_directory: .cache\n",
        )
        .unwrap();

        let config = ScanConfig::load(&path).unwrap();
        assert_eq!(
            config.languages,
            vec![SourceLanguage::Python, SourceLanguage::Cpp]
        );
        assert!(!config.parallel_processing);
        assert_eq!(config.max_workers, Some(2));
        assert!(config.cache_enabled);
        assert_eq!(config.cache_directory, Some(PathBuf::from(".cache")));
        assert!(config.is_excluded_dir("node_modules"));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = ScanConfig::from_yaml_str("max_workers: many");
        assert!(matches!(result, Err(ConfigError::YamlError(_))));
    }

    #[test]
    fn test_yml_extension_is_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metagraph.yml");
        fs::write(&path, "strict: true\n").unwrap();

        assert!(ScanConfig::load(&path).unwrap().strict);
    }
}
