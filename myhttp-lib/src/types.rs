//! Core data types for fetch-and-hash batches.
//!
//! This module defines the result pair written to the sink, the processor
//! configuration, the hash algorithm selector and the diagnostic failure
//! record.

use crate::error::{FailureStage, FetchHashError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for the worker count.
pub const MAX_CONCURRENCY: usize = 1000;

/// A normalized URL paired with the hex digest of its response body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FetchResult {
    /// URL with an explicit http or https scheme
    pub url: String,

    /// Lowercase hex digest of the full body
    pub digest: String,
}

impl FetchResult {
    /// Pair a normalized URL with its hex digest.
    pub fn new(url: String, digest: String) -> Self {
        Self { url, digest }
    }

    /// The sink line for this result, newline included.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl std::fmt::Display for FetchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.url, self.digest)
    }
}

/// Hash algorithm applied to each response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Digest length in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Every supported algorithm, default first.
    pub fn all() -> &'static [HashAlgorithm] {
        &[
            HashAlgorithm::Md5,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha512,
        ]
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Md5 => write!(f, "md5"),
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Sha512 => write!(f, "sha512"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = FetchHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "").as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            _ => Err(FetchHashError::config(format!(
                "Unknown hash algorithm '{}'. Use one of: md5, sha256, sha512",
                s
            ))),
        }
    }
}

/// Construction-time settings for a [`Processor`](crate::Processor).
///
/// Both the worker count and the algorithm are fixed for the lifetime of
/// the processor.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    /// Number of parallel workers
    /// Default: 10, Range: 1-1000
    pub concurrency: usize,

    /// Per-request timeout for the default reqwest transport
    /// Default: 5 seconds
    pub timeout: Duration,

    /// Digest applied to every body
    /// Default: MD5
    pub algorithm: HashAlgorithm,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout: Duration::from_secs(5),
            algorithm: HashAlgorithm::Md5,
        }
    }
}

impl ProcessorConfig {
    /// Set the worker count, clamped to `1..=MAX_CONCURRENCY`.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Set the per-request timeout used by the default transport.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the digest applied to every body.
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// A job that was dropped, as reported on the optional failure channel.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    /// The raw input string as it was submitted
    pub url: String,
    pub stage: FailureStage,
    pub error: FetchHashError,
}

impl FetchFailure {
    /// Record a dropped job; the stage is derived from `error`.
    pub fn new(url: String, error: FetchHashError) -> Self {
        Self {
            url,
            stage: error.stage(),
            error,
        }
    }
}

/// Counts for one call to `run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Inputs placed on the job queue
    pub submitted: usize,
    /// Lines successfully written to the sink
    pub written: usize,
    /// Jobs dropped by validation, transport or stream failures
    pub dropped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_line_format() {
        let result = FetchResult::new(
            "http://www.google.com".to_string(),
            "d20a5df8f659a0af0f08de8da34fe8bc".to_string(),
        );
        assert_eq!(
            result.to_line(),
            "http://www.google.com d20a5df8f659a0af0f08de8da34fe8bc\n"
        );
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("md5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
        assert_eq!(
            "SHA-256".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Sha256
        );
        assert_eq!(
            "sha512".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Sha512
        );
        assert!("crc32".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_algorithm_display_round_trips() {
        for algorithm in HashAlgorithm::all() {
            let parsed: HashAlgorithm = algorithm.to_string().parse().unwrap();
            assert_eq!(&parsed, algorithm);
        }
    }

    #[test]
    fn test_config_defaults_and_clamping() {
        let config = ProcessorConfig::default();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.algorithm, HashAlgorithm::Md5);

        assert_eq!(ProcessorConfig::default().with_concurrency(0).concurrency, 1);
        assert_eq!(
            ProcessorConfig::default()
                .with_concurrency(50_000)
                .concurrency,
            MAX_CONCURRENCY
        );
    }

    #[test]
    fn test_failure_records_stage() {
        let failure = FetchFailure::new(
            "ftp://host".to_string(),
            FetchHashError::invalid_url("ftp://host", "invalid URL"),
        );
        assert_eq!(failure.stage, FailureStage::Validation);
    }
}
