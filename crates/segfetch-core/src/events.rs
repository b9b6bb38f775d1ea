//! Observable hooks for the core triggers of a run.
//!
//! The engine emits an event when the size is known, when the plan is built,
//! when a worker claims a segment, when a segment completes and when the whole
//! run completes. Console notices and progress output are built on these.

use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Probed {
        total_size: u64,
    },
    Planned {
        segment_count: usize,
        connection_count: usize,
        segment_size: u64,
    },
    /// A worker claimed segment `index` covering `[start, end)`.
    SegmentStarted {
        index: usize,
        worker: usize,
        start: u64,
        end: u64,
    },
    SegmentFinished {
        index: usize,
        worker: usize,
        bytes: u64,
    },
    /// Every segment reported done; emitted once, after the output file is closed.
    Finished {
        total_size: u64,
        elapsed: Duration,
    },
}

/// Receives events from the orchestrator and from every worker thread.
pub trait DownloadObserver: Sync {
    fn on_event(&self, event: &DownloadEvent);
}

/// Discards events.
impl DownloadObserver for () {
    fn on_event(&self, _event: &DownloadEvent) {}
}

/// Forwards events to an async consumer; a closed receiver is ignored.
impl DownloadObserver for tokio::sync::mpsc::UnboundedSender<DownloadEvent> {
    fn on_event(&self, event: &DownloadEvent) {
        let _ = self.send(event.clone());
    }
}

/// Records events in arrival order.
impl DownloadObserver for Mutex<Vec<DownloadEvent>> {
    fn on_event(&self, event: &DownloadEvent) {
        self.lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_keeps_order() {
        let rec = Mutex::new(Vec::new());
        rec.on_event(&DownloadEvent::Probed { total_size: 5 });
        rec.on_event(&DownloadEvent::SegmentFinished {
            index: 0,
            worker: 0,
            bytes: 5,
        });
        let events = rec.into_inner().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], DownloadEvent::Probed { total_size: 5 });
    }

    #[test]
    fn channel_forwards_and_ignores_closed_receiver() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.on_event(&DownloadEvent::Probed { total_size: 1 });
        assert_eq!(
            rx.try_recv().unwrap(),
            DownloadEvent::Probed { total_size: 1 }
        );
        drop(rx);
        tx.on_event(&DownloadEvent::Probed { total_size: 2 });
    }
}
