//! Worker pool draining the channel queue.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Barrier;
use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::types::{ChannelStats, ExportSummary};

use super::ExportContext;
use super::paginator::ChannelPaginator;
use super::queue::WorkQueue;

/// What one worker did before it ran out of work
#[derive(Debug, Default)]
struct WorkerReport {
    channels: usize,
    stats: ChannelStats,
}

/// Fixed-size pool of export workers
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Pool with `workers` concurrent workers
    pub fn new(workers: usize) -> Self {
        Self { workers }
    }

    /// Run every worker until the queue is drained.
    ///
    /// All workers are spawned before any of them pulls from the queue. Returns
    /// once every worker has exited. A fatal error from any worker (a sink
    /// failure or a panic) aborts the remaining workers and is returned.
    pub async fn run(
        &self,
        queue: Arc<WorkQueue>,
        ctx: Arc<ExportContext>,
    ) -> Result<ExportSummary> {
        if self.workers == 0 {
            return Err(Error::config(
                "worker count must be a positive integer",
                "concurrentChannels",
            ));
        }

        let started = Instant::now();
        let barrier = Arc::new(Barrier::new(self.workers));
        let mut set = JoinSet::new();

        tracing::info!(
            workers = self.workers,
            channels = queue.capacity(),
            "Starting worker pool"
        );

        for id in 0..self.workers {
            let queue = Arc::clone(&queue);
            let ctx = Arc::clone(&ctx);
            let barrier = Arc::clone(&barrier);
            set.spawn(async move {
                barrier.wait().await;
                run_worker(id, &queue, &ctx).await
            });
        }

        let mut summary = ExportSummary::default();
        while let Some(joined) = set.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => Err(Error::Worker(format!("worker panicked: {e}"))),
                Err(e) => Err(Error::Worker(format!("worker cancelled: {e}"))),
            };

            match outcome {
                Ok(report) => {
                    summary.workers += 1;
                    summary.channels += report.channels;
                    summary.totals += report.stats;
                }
                Err(e) => {
                    set.abort_all();
                    // Sink batches already on the blocking pool are not cancelled
                    while set.join_next().await.is_some() {}

                    let unstarted = queue.remaining().await;
                    tracing::error!(error = %e, unstarted, "Fatal worker error, aborting export");
                    ctx.reporter.log(format!(
                        "Export aborted, {unstarted} of {} channels never started",
                        queue.capacity()
                    ));
                    return Err(e);
                }
            }
        }

        summary.elapsed = started.elapsed();
        tracing::info!(
            workers = summary.workers,
            channels = summary.channels,
            exported = summary.totals.exported,
            elapsed_ms = summary.elapsed.as_millis(),
            "Worker pool finished"
        );
        Ok(summary)
    }
}

/// Pull channels until the queue is drained, exporting each one
async fn run_worker(id: usize, queue: &WorkQueue, ctx: &ExportContext) -> Result<WorkerReport> {
    let mut report = WorkerReport::default();
    let paginator = ChannelPaginator::new(id, ctx);

    while let Some(channel) = queue.next().await {
        let stats = paginator.export(&channel).await?;
        report.channels += 1;
        report.stats += stats;
    }

    tracing::debug!(worker_id = id, channels = report.channels, "Worker finished");
    Ok(report)
}
