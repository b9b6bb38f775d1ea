//! Progress reporting for a run (bytes done, ETA, rate).
//!
//! Built from `DownloadEvent`s; consumers can compute
//! rate = bytes_done / elapsed_secs and ETA = (total_bytes - bytes_done) / rate.

use crate::events::DownloadEvent;

/// Snapshot of download progress (CLI-friendly).
#[derive(Debug, Clone, Default)]
pub struct ProgressStats {
    /// Bytes in completed segments.
    pub bytes_done: u64,
    /// Total file size in bytes.
    pub total_bytes: u64,
    /// Elapsed time since download start (seconds).
    pub elapsed_secs: f64,
    /// Number of segments completed.
    pub segments_done: usize,
    /// Total number of segments.
    pub segment_count: usize,
}

impl ProgressStats {
    /// Folds one event into the snapshot. Elapsed time is left to the caller.
    pub fn apply(&mut self, event: &DownloadEvent) {
        match event {
            DownloadEvent::Probed { total_size } => self.total_bytes = *total_size,
            DownloadEvent::Planned { segment_count, .. } => self.segment_count = *segment_count,
            DownloadEvent::SegmentStarted { .. } => {}
            DownloadEvent::SegmentFinished { bytes, .. } => {
                self.bytes_done += bytes;
                self.segments_done += 1;
            }
            DownloadEvent::Finished { total_size, elapsed } => {
                self.bytes_done = *total_size;
                self.segments_done = self.segment_count;
                self.elapsed_secs = elapsed.as_secs_f64();
            }
        }
    }

    /// Total download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if rate is 0 and work remains).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_done as f64 / self.total_bytes as f64).min(1.0)
    }
}
