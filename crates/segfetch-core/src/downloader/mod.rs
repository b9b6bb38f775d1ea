//! Core segmented downloader engine.
//!
//! One run: validate the configuration, probe the size, plan the segments,
//! create the output file, let `connection_count` worker threads drain the
//! work queue with ranged GETs, wait for every segment to report, close the
//! file. Any failure aborts the whole run; nothing is retried.

mod worker;

use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::config::FetchConfig;
use crate::error::{FetchError, TransferError};
use crate::events::{DownloadEvent, DownloadObserver};
use crate::fetch_head::probe_size;
use crate::scheduler::{CompletionTracker, WorkQueue};
use crate::segmenter::SegmentPlan;
use crate::storage::{OutputSink, OutputSinkBuilder};
use crate::transport::Transport;

use self::worker::SegmentWorker;

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    pub url: String,
    pub output_path: PathBuf,
    pub total_size: u64,
    pub segment_count: usize,
    pub connection_count: usize,
    pub elapsed_secs: f64,
    /// Average throughput over the whole run (0 if elapsed is 0).
    pub bytes_per_sec: f64,
}

/// Runs one download to completion on the current thread plus
/// `config.connection_count` scoped worker threads.
pub fn fetch<T, O>(
    config: &FetchConfig,
    transport: &T,
    observer: &O,
) -> Result<DownloadReport, FetchError>
where
    T: Transport + ?Sized,
    O: DownloadObserver + ?Sized,
{
    config.validate()?;
    let started = Instant::now();

    let total_size = probe_size(transport, &config.url)?;
    observer.on_event(&DownloadEvent::Probed { total_size });

    let plan = SegmentPlan::new(total_size, config.segment_count, config.connection_count)?;
    tracing::info!(
        url = %config.url,
        total_size,
        segments = plan.len(),
        connections = config.connection_count,
        segment_size = plan.segment_size(),
        "segment plan ready"
    );
    for seg in plan.segments() {
        tracing::trace!(index = seg.index, start = seg.start, end = seg.end, "planned segment");
    }
    observer.on_event(&DownloadEvent::Planned {
        segment_count: plan.len(),
        connection_count: config.connection_count,
        segment_size: plan.segment_size(),
    });

    let sink = open_output(config, total_size)?;
    let queue = WorkQueue::new(plan.len());
    let tracker = CompletionTracker::new(plan.len());

    let outcome = if plan.is_empty() {
        tracing::info!("zero-length resource, nothing to transfer");
        Ok(())
    } else {
        run_workers(config, &plan, &queue, &tracker, &sink, transport, observer)
    };

    let path = sink.path().to_path_buf();
    if let Err(e) = outcome {
        if let Err(close_err) = sink.close() {
            tracing::warn!(path = %path.display(), "closing output after failure: {}", close_err);
        }
        return Err(e.into());
    }
    sink.close()
        .map_err(|source| FetchError::Output { path, source })?;

    let elapsed = started.elapsed();
    let elapsed_secs = elapsed.as_secs_f64();
    let bytes_per_sec = if elapsed_secs > 0.0 {
        total_size as f64 / elapsed_secs
    } else {
        0.0
    };
    tracing::info!(total_size, elapsed_secs, bytes_per_sec, "download finished");
    observer.on_event(&DownloadEvent::Finished { total_size, elapsed });

    Ok(DownloadReport {
        url: config.url.clone(),
        output_path: config.output_path.clone(),
        total_size,
        segment_count: plan.len(),
        connection_count: config.connection_count,
        elapsed_secs,
        bytes_per_sec,
    })
}

/// Runs `fetch` on tokio's blocking pool.
pub async fn fetch_async<T, O>(
    config: FetchConfig,
    transport: Arc<T>,
    observer: O,
) -> Result<DownloadReport, FetchError>
where
    T: Transport + Send + ?Sized + 'static,
    O: DownloadObserver + Send + 'static,
{
    tokio::task::spawn_blocking(move || fetch(&config, transport.as_ref(), &observer)).await?
}

fn open_output(config: &FetchConfig, total_size: u64) -> Result<OutputSink, FetchError> {
    let path = &config.output_path;
    let output_err = |source: io::Error| FetchError::Output {
        path: path.clone(),
        source,
    };
    let mut builder = OutputSinkBuilder::create(path).map_err(output_err)?;
    if config.preallocate {
        builder.preallocate(total_size).map_err(output_err)?;
    }
    tracing::debug!(path = %path.display(), total_size, "output file created");
    Ok(builder.build())
}

/// Spawns the workers, waits on the tracker and, on failure, drains the queue
/// so idle workers stop. Returns once every worker thread has exited.
fn run_workers<T, O>(
    config: &FetchConfig,
    plan: &SegmentPlan,
    queue: &WorkQueue,
    tracker: &CompletionTracker,
    sink: &OutputSink,
    transport: &T,
    observer: &O,
) -> Result<(), TransferError>
where
    T: Transport + ?Sized,
    O: DownloadObserver + ?Sized,
{
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(config.connection_count);
        for id in 0..config.connection_count {
            let worker = SegmentWorker {
                id,
                url: &config.url,
                chunk_size: config.chunk_size,
                plan,
                queue,
                tracker,
                sink,
                transport,
                observer,
            };
            let spawned = thread::Builder::new()
                .name(format!("segfetch-worker-{}", id))
                .spawn_scoped(scope, move || {
                    let _watch = tracker.watch(id);
                    worker.run();
                });
            match spawned {
                Ok(handle) => handles.push((id, handle)),
                Err(source) => {
                    tracker.fail(TransferError::Spawn { worker: id, source });
                    break;
                }
            }
        }

        let outcome = tracker.await_all();
        if outcome.is_err() {
            let dropped = queue.drain();
            tracing::debug!(
                dropped,
                completed = tracker.completed(),
                segments = plan.len(),
                "unclaimed segments dropped after failure"
            );
        }
        // Joined explicitly so a panicked worker does not re-panic the scope;
        // its WorkerWatch has already failed the run.
        for (id, handle) in handles {
            if handle.join().is_err() {
                tracing::error!(worker = id, "worker thread panicked");
            }
        }
        outcome
    })
}
