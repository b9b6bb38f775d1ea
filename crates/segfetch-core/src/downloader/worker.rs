//! Segment worker: claim, ranged GET, positional writes, report.

use std::io;

use crate::error::TransferError;
use crate::events::{DownloadEvent, DownloadObserver};
use crate::scheduler::{CompletionTracker, WorkQueue};
use crate::segmenter::{Segment, SegmentPlan};
use crate::storage::OutputSink;
use crate::transport::{RangeRequest, Transport, TransportError};

/// One connection's worth of work. Borrows everything from the orchestrator,
/// which outlives every worker thread.
pub(super) struct SegmentWorker<'a, T: ?Sized, O: ?Sized> {
    pub(super) id: usize,
    pub(super) url: &'a str,
    pub(super) chunk_size: usize,
    pub(super) plan: &'a SegmentPlan,
    pub(super) queue: &'a WorkQueue,
    pub(super) tracker: &'a CompletionTracker,
    pub(super) sink: &'a OutputSink,
    pub(super) transport: &'a T,
    pub(super) observer: &'a O,
}

impl<T, O> SegmentWorker<'_, T, O>
where
    T: Transport + ?Sized,
    O: DownloadObserver + ?Sized,
{
    /// Claims segments until the queue is exhausted or the run is aborted.
    /// The first failure is handed to the tracker and ends this worker.
    pub(super) fn run(&self) {
        let mut finished = 0usize;
        while let Some(index) = self.queue.claim() {
            if self.tracker.is_aborted() {
                break;
            }
            let segment = match self.plan.get(index) {
                Some(s) => *s,
                None => {
                    tracing::error!(worker = self.id, index, "claimed index outside the plan");
                    break;
                }
            };

            tracing::debug!(
                worker = self.id,
                index,
                start = segment.start,
                end = segment.end,
                "segment claimed"
            );
            self.observer.on_event(&DownloadEvent::SegmentStarted {
                index,
                worker: self.id,
                start: segment.start,
                end: segment.end,
            });

            match self.fetch(&segment) {
                Ok(bytes) => {
                    tracing::debug!(worker = self.id, index, bytes, "segment finished");
                    self.observer.on_event(&DownloadEvent::SegmentFinished {
                        index,
                        worker: self.id,
                        bytes,
                    });
                    self.tracker.report(index);
                    finished += 1;
                }
                Err(e) => {
                    self.tracker.fail(e);
                    break;
                }
            }
        }
        tracing::debug!(worker = self.id, segments = finished, "worker exiting");
    }

    /// Downloads one segment into the sink; returns the bytes written.
    fn fetch(&self, segment: &Segment) -> Result<u64, TransferError> {
        let index = segment.index;
        let expected = segment.len();
        let last = match segment.last_byte() {
            Some(last) => last,
            // Empty segments (resource smaller than the segment count) need no request.
            None => return Ok(0),
        };

        let request = RangeRequest {
            url: self.url,
            first: segment.start,
            last,
            chunk_size: self.chunk_size,
        };
        let mut cursor = segment.start;
        let mut failure: Option<TransferError> = None;

        let mut on_chunk = |chunk: &[u8]| {
            if self.tracker.is_aborted() {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "download aborted"));
            }
            if cursor + chunk.len() as u64 > segment.end {
                failure = Some(TransferError::Overrun { index, expected });
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "body overruns the segment",
                ));
            }
            if let Err(source) = self.sink.write_all_at(cursor, chunk) {
                let kind = source.kind();
                failure = Some(TransferError::Write {
                    index,
                    offset: cursor,
                    source,
                });
                return Err(io::Error::new(kind, "output write failed"));
            }
            cursor += chunk.len() as u64;
            Ok(())
        };
        let cancelled = || self.tracker.is_aborted();
        let result = self.transport.get_range(&request, &mut on_chunk, &cancelled);

        if let Some(f) = failure {
            return Err(f);
        }
        let status = match result {
            Ok(status) => status,
            Err(TransportError::Status(status)) => {
                return Err(TransferError::Status { index, status })
            }
            Err(source) => return Err(TransferError::Request { index, source }),
        };
        if !(200..300).contains(&status) {
            return Err(TransferError::Status { index, status });
        }

        let received = cursor - segment.start;
        if received != expected {
            return Err(TransferError::ShortBody {
                index,
                expected,
                received,
            });
        }
        Ok(received)
    }
}
