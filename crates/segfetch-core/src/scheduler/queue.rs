//! Closed, pre-populated queue of segment indices.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Queue of unclaimed segment indices shared by all workers.
///
/// Populated once at construction; there is no way to add indices afterwards.
/// `claim` is atomic across threads, so each index is handed out exactly once.
#[derive(Debug)]
pub struct WorkQueue {
    pending: Mutex<VecDeque<usize>>,
}

impl WorkQueue {
    /// Queue holding `0..segment_count`, claimed in ascending order.
    pub fn new(segment_count: usize) -> Self {
        Self {
            pending: Mutex::new((0..segment_count).collect()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<usize>> {
        // A panic while holding the lock cannot leave the deque half-updated.
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Next unclaimed index, or `None` once the queue is exhausted.
    pub fn claim(&self) -> Option<usize> {
        self.lock().pop_front()
    }

    /// Drops every unclaimed index; returns how many were dropped.
    pub fn drain(&self) -> usize {
        let mut q = self.lock();
        let n = q.len();
        q.clear();
        n
    }
}
