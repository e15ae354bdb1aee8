//! Batch processor.
//!
//! This module provides the `Processor` that seeds the job queue, runs the
//! worker pool and drains finished results into an output sink.

use crate::concurrent::{spawn_feeder, WorkerContext, WorkerPool};
use crate::error::FetchHashError;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{FetchFailure, ProcessorConfig, RunSummary};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Fetches a batch of URLs with a fixed number of workers and writes one
/// `"<url> <digest>\n"` line per successfully hashed body.
///
/// The processor keeps no state between runs apart from its configuration
/// and transport, so a single instance can serve many calls to [`run`].
///
/// # Example
///
/// ```rust,no_run
/// use myhttp_lib::{Processor, ProcessorConfig};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let processor = Processor::with_config(ProcessorConfig::default().with_concurrency(4))?;
///     let urls = vec!["example.com".to_string(), "https://www.rust-lang.org".to_string()];
///
///     let mut stdout = tokio::io::stdout();
///     processor.run(&CancellationToken::new(), &urls, &mut stdout).await;
///     Ok(())
/// }
/// ```
///
/// [`run`]: Processor::run
#[derive(Clone)]
pub struct Processor {
    config: ProcessorConfig,
    transport: Arc<dyn Transport>,
}

impl Processor {
    /// Create a processor over a caller-supplied transport.
    pub fn new<T: Transport + 'static>(transport: T, config: ProcessorConfig) -> Self {
        Self::with_shared_transport(Arc::new(transport), config)
    }

    /// Create a processor over a transport that is shared with other owners.
    pub fn with_shared_transport(transport: Arc<dyn Transport>, config: ProcessorConfig) -> Self {
        let config = ProcessorConfig {
            concurrency: config.concurrency.max(1),
            ..config
        };
        Self { config, transport }
    }

    /// Create a processor using the default reqwest transport.
    ///
    /// The transport's request timeout comes from `config.timeout`.
    pub fn with_config(config: ProcessorConfig) -> Result<Self, FetchHashError> {
        let transport = ReqwestTransport::with_timeout(config.timeout)?;
        Ok(Self::new(transport, config))
    }

    /// Get the configuration for this processor.
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Process every URL and write each result to `sink`.
    ///
    /// Returns once every input has either produced a line or been dropped.
    /// Individual failures never abort the batch and never surface here;
    /// lines arrive in completion order, not input order. Cancelling
    /// `cancel` makes in-flight and pending fetches fail fast so the call
    /// returns in bounded time.
    pub async fn run<W>(&self, cancel: &CancellationToken, urls: &[String], sink: &mut W) -> RunSummary
    where
        W: AsyncWrite + Unpin,
    {
        self.run_inner(cancel, urls, sink, None).await
    }

    /// Same as [`run`](Processor::run), additionally reporting every dropped
    /// job on `failures`.
    pub async fn run_reporting<W>(
        &self,
        cancel: &CancellationToken,
        urls: &[String],
        sink: &mut W,
        failures: mpsc::UnboundedSender<FetchFailure>,
    ) -> RunSummary
    where
        W: AsyncWrite + Unpin,
    {
        self.run_inner(cancel, urls, sink, Some(failures)).await
    }

    async fn run_inner<W>(
        &self,
        cancel: &CancellationToken,
        urls: &[String],
        sink: &mut W,
        failures: Option<mpsc::UnboundedSender<FetchFailure>>,
    ) -> RunSummary
    where
        W: AsyncWrite + Unpin,
    {
        let mut summary = RunSummary {
            submitted: urls.len(),
            ..RunSummary::default()
        };
        if urls.is_empty() {
            return summary;
        }

        tracing::debug!(
            urls = urls.len(),
            workers = self.config.concurrency,
            algorithm = %self.config.algorithm,
            "starting run"
        );

        // Both queues hold the whole batch, so neither side waits on the other.
        let capacity = urls.len();
        let (job_tx, job_rx) = mpsc::channel::<String>(capacity);
        let (result_tx, mut result_rx) = mpsc::channel(capacity);

        let context = WorkerContext {
            transport: Arc::clone(&self.transport),
            algorithm: self.config.algorithm,
            cancel: cancel.clone(),
            jobs: Arc::new(Mutex::new(job_rx)),
            failures,
        };

        let pool = WorkerPool::spawn(self.config.concurrency, context, &result_tx);
        let feeder = spawn_feeder(urls.to_vec(), job_tx);
        let supervisor = pool.supervise(result_tx);

        let mut received = 0;
        while let Some(result) = result_rx.recv().await {
            received += 1;
            match sink.write_all(result.to_line().as_bytes()).await {
                Ok(()) => summary.written += 1,
                Err(e) => {
                    tracing::warn!(url = %result.url, error = %e, "failed to write result line");
                }
            }
        }

        if let Err(e) = sink.flush().await {
            tracing::warn!(error = %e, "failed to flush output sink");
        }
        if let Err(e) = feeder.await {
            tracing::warn!(error = %e, "job feeder task failed");
        }
        if let Err(e) = supervisor.await {
            tracing::warn!(error = %e, "worker supervisor task failed");
        }

        summary.dropped = summary.submitted.saturating_sub(received);
        tracing::debug!(
            written = summary.written,
            dropped = summary.dropped,
            cancelled = cancel.is_cancelled(),
            "run finished"
        );
        summary
    }
}
