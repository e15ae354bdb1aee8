//! # myhttp Library
//!
//! Fetches a batch of URLs concurrently, hashes every response body as it
//! streams in, and writes `"<url> <digest>"` lines to an output sink.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use myhttp_lib::{HashAlgorithm, Processor, ProcessorConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProcessorConfig::default()
//!         .with_concurrency(10)
//!         .with_algorithm(HashAlgorithm::Md5);
//!     let processor = Processor::with_config(config)?;
//!
//!     let urls = vec!["example.com".to_string(), "https://www.rust-lang.org".to_string()];
//!     let mut output = Vec::new();
//!     processor.run(&CancellationToken::new(), &urls, &mut output).await;
//!
//!     print!("{}", String::from_utf8_lossy(&output));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Bounded worker pool**: a fixed number of workers share one job queue
//! - **Streaming digests**: bodies are never buffered whole
//! - **Swappable transport**: anything implementing [`Transport`]
//! - **Batch robustness**: a bad URL is dropped, never fatal
//! - **Cancellation**: one token stops every in-flight fetch

pub use config::{load_env_config, ConfigManager, DefaultsConfig, EnvConfig, FileConfig};
pub use config::parse_timeout_string;
pub use error::{FailureStage, FetchHashError};
pub use hashing::{digest_bytes, hash_stream, DigestAccumulator, DigestHasher};
pub use processor::Processor;
pub use transport::{BodyStream, FetchRequest, ReqwestTransport, Transport};
pub use types::{FetchFailure, FetchResult, HashAlgorithm, ProcessorConfig, RunSummary};
pub use types::MAX_CONCURRENCY;
pub use utils::{parse_url_list, validate_url};

// Internal modules - these are not part of the public API
mod concurrent;
mod config;
mod error;
mod hashing;
mod processor;
mod transport;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, FetchHashError>;
