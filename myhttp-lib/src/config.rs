//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `MYHTTP_*`
//! environment variables, and merging them with proper precedence rules.

use crate::error::FetchHashError;
use crate::types::{HashAlgorithm, ProcessorConfig, MAX_CONCURRENCY};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Number of parallel workers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<usize>,

    /// Request timeout (as string, e.g., "5s", "30s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Hash algorithm name ("md5", "sha256", "sha512")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
}

impl FileConfig {
    /// Overlay these file settings onto `config`.
    ///
    /// Values are validated by [`ConfigManager::load_file`], so anything
    /// unparsable here is skipped.
    pub fn apply_to(&self, mut config: ProcessorConfig) -> ProcessorConfig {
        if let Some(defaults) = &self.defaults {
            if let Some(parallel) = defaults.parallel {
                config = config.with_concurrency(parallel);
            }
            if let Some(secs) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
                config = config.with_timeout(Duration::from_secs(secs));
            }
            if let Some(algorithm) = defaults
                .algorithm
                .as_deref()
                .and_then(|name| name.parse::<HashAlgorithm>().ok())
            {
                config = config.with_algorithm(algorithm);
            }
        }
        config
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a manager; `verbose` logs every file that gets loaded.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, FetchHashError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(FetchHashError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            FetchHashError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            FetchHashError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config < home directory config < current directory config.
    pub fn discover_and_load(&self) -> Result<FileConfig, FetchHashError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
                }
            }
        }

        if self.verbose {
            for path in &loaded_files {
                tracing::info!(path = %path.display(), "loaded config file");
            }
        }

        Ok(merged_config)
    }

    /// Look for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./myhttp.toml", "./.myhttp.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Look for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".myhttp.toml", "myhttp.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("myhttp").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.parallel.is_some() {
                        lower_defaults.parallel = higher_defaults.parallel;
                    }
                    if higher_defaults.timeout.is_some() {
                        lower_defaults.timeout = higher_defaults.timeout;
                    }
                    if higher_defaults.algorithm.is_some() {
                        lower_defaults.algorithm = higher_defaults.algorithm;
                    }
                    Some(lower_defaults)
                }
                (None, Some(higher_defaults)) => Some(higher_defaults),
                (Some(lower_defaults), None) => Some(lower_defaults),
                (None, None) => None,
            },
        }
    }

    fn validate_config(&self, config: &FileConfig) -> Result<(), FetchHashError> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if let Some(parallel) = defaults.parallel {
            if parallel == 0 || parallel > MAX_CONCURRENCY {
                return Err(FetchHashError::config(format!(
                    "parallel must be between 1 and {}",
                    MAX_CONCURRENCY
                )));
            }
        }

        if let Some(timeout_str) = &defaults.timeout {
            if parse_timeout_string(timeout_str).is_none() {
                return Err(FetchHashError::config(format!(
                    "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                    timeout_str
                )));
            }
        }

        if let Some(algorithm) = &defaults.algorithm {
            algorithm.parse::<HashAlgorithm>()?;
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// Populated from `MYHTTP_*` variables by [`load_env_config`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub parallel: Option<usize>,
    pub timeout: Option<Duration>,
    pub algorithm: Option<HashAlgorithm>,
    pub file: Option<String>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Overlay environment settings onto `config`.
    pub fn apply_to(&self, mut config: ProcessorConfig) -> ProcessorConfig {
        if let Some(parallel) = self.parallel {
            config = config.with_concurrency(parallel);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(algorithm) = self.algorithm {
            config = config.with_algorithm(algorithm);
        }
        config
    }
}

/// Load configuration from the process environment.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    env_config_from(|key| env::var(key).ok())
}

/// Build an [`EnvConfig`] from an arbitrary variable lookup.
pub(crate) fn env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    if let Some(val) = lookup("MYHTTP_PARALLEL") {
        match val.trim().parse::<usize>() {
            Ok(parallel) if parallel > 0 && parallel <= MAX_CONCURRENCY => {
                env_config.parallel = Some(parallel);
            }
            _ => tracing::warn!(
                "Invalid MYHTTP_PARALLEL='{}', must be 1-{}",
                val,
                MAX_CONCURRENCY
            ),
        }
    }

    if let Some(val) = lookup("MYHTTP_TIMEOUT") {
        match parse_timeout_string(&val) {
            Some(secs) => env_config.timeout = Some(Duration::from_secs(secs)),
            None => tracing::warn!(
                "Invalid MYHTTP_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                val
            ),
        }
    }

    if let Some(val) = lookup("MYHTTP_ALGORITHM") {
        match val.parse::<HashAlgorithm>() {
            Ok(algorithm) => env_config.algorithm = Some(algorithm),
            Err(e) => tracing::warn!("Invalid MYHTTP_ALGORITHM: {}", e),
        }
    }

    if let Some(path) = lookup("MYHTTP_FILE").filter(|p| !p.trim().is_empty()) {
        env_config.file = Some(path);
    }

    if let Some(path) = lookup("MYHTTP_CONFIG").filter(|p| !p.trim().is_empty()) {
        env_config.config = Some(path);
    }

    env_config
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is taken as seconds. Zero is rejected.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let secs = if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    };

    secs.filter(|&s| s > 0)
}
