//! Fixed-size worker pool for fetch-and-hash jobs.
//!
//! Topology:
//!
//! ```text
//! feeder ──> job queue ──> N workers ──> result queue ──> collector
//!                                  \
//!                                   └─> failure channel (optional)
//! ```
//!
//! The job queue is a bounded `mpsc` channel whose receiver is shared
//! behind a mutex so that every worker pulls from it. The result queue is a
//! bounded `mpsc` channel with one sender clone per worker plus the one held
//! by the supervisor. The supervisor drops its sender only after joining
//! every worker, so the collector observes the close strictly after the last
//! worker has exited.

use crate::error::FetchHashError;
use crate::hashing::hash_stream;
use crate::transport::{FetchRequest, Transport};
use crate::types::{FetchFailure, FetchResult, HashAlgorithm};
use crate::utils::validate_url;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

/// Receiving end of the job queue, shared by all workers.
pub(crate) type SharedJobs = Arc<Mutex<mpsc::Receiver<String>>>;

/// Per-worker view of everything it needs to process jobs.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub transport: Arc<dyn Transport>,
    pub algorithm: HashAlgorithm,
    pub cancel: CancellationToken,
    pub jobs: SharedJobs,
    pub failures: Option<mpsc::UnboundedSender<FetchFailure>>,
}

/// Manages the lifecycle of one batch of workers.
pub(crate) struct WorkerPool {
    workers: JoinSet<usize>,
}

impl WorkerPool {
    /// Start `size` workers, each holding its own clone of `results`.
    pub(crate) fn spawn(
        size: usize,
        context: WorkerContext,
        results: &mpsc::Sender<FetchResult>,
    ) -> Self {
        let mut workers = JoinSet::new();
        for id in 0..size.max(1) {
            let context = context.clone();
            let results = results.clone();
            workers.spawn(worker_loop(id, context, results));
        }
        Self { workers }
    }

    /// Wait for every worker, then close the result queue by dropping the
    /// last non-worker sender.
    ///
    /// Returns the supervisor task; its output is the number of jobs the
    /// workers took off the queue.
    pub(crate) fn supervise(mut self, results: mpsc::Sender<FetchResult>) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let mut taken = 0;
            while let Some(joined) = self.workers.join_next().await {
                match joined {
                    Ok(count) => taken += count,
                    Err(e) => tracing::warn!(error = %e, "worker task failed"),
                }
            }
            drop(results);
            tracing::trace!(taken, "all workers exited, result queue closed");
            taken
        })
    }
}

/// Put every input on the job queue in order, then close it.
pub(crate) fn spawn_feeder(urls: Vec<String>, jobs: mpsc::Sender<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        for url in urls {
            if jobs.send(url).await.is_err() {
                tracing::warn!("job queue closed before all inputs were enqueued");
                break;
            }
        }
        drop(jobs);
    })
}

/// Pull jobs until the queue is closed and empty. Returns how many jobs
/// this worker handled.
async fn worker_loop(
    id: usize,
    context: WorkerContext,
    results: mpsc::Sender<FetchResult>,
) -> usize {
    tracing::trace!(worker = id, "worker started");
    let mut handled = 0;

    loop {
        let job = {
            let mut jobs = context.jobs.lock().await;
            jobs.recv().await
        };
        let Some(raw) = job else { break };
        handled += 1;

        match process_job(&context, &raw).await {
            Ok(result) => {
                if results.send(result).await.is_err() {
                    tracing::warn!(worker = id, "result queue closed early");
                    break;
                }
            }
            Err(error) => {
                tracing::debug!(worker = id, url = %raw, stage = %error.stage(), error = %error, "dropping job");
                if let Some(failures) = &context.failures {
                    let _ = failures.send(FetchFailure::new(raw, error));
                }
            }
        }
    }

    tracing::trace!(worker = id, handled, "worker exited");
    handled
}

/// Validate, fetch and hash one job.
pub(crate) async fn process_job(
    context: &WorkerContext,
    raw: &str,
) -> Result<FetchResult, FetchHashError> {
    let url = validate_url(raw)?;

    let request = FetchRequest::get(url.as_str(), context.cancel.clone());
    let body = tokio::select! {
        biased;
        _ = context.cancel.cancelled() => return Err(FetchHashError::cancelled(url)),
        response = context.transport.issue(request) => response?,
    };

    // Losing the race drops the hashing future and with it the body stream.
    let digest = tokio::select! {
        biased;
        _ = context.cancel.cancelled() => return Err(FetchHashError::cancelled(url)),
        digest = hash_stream(body, context.algorithm.accumulator()) => digest?,
    };

    Ok(FetchResult::new(url, digest))
}
