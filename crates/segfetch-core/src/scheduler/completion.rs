//! Completion tracking: wait until every segment has reported done.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::TransferError;
use crate::segmenter::SegmentBitmap;

#[derive(Debug)]
struct State {
    done: SegmentBitmap,
    failure: Option<TransferError>,
}

/// Collects one completion report per segment and wakes the orchestrator when
/// all of them are in, or as soon as any worker records a fatal failure.
#[derive(Debug)]
pub struct CompletionTracker {
    total: usize,
    state: Mutex<State>,
    changed: Condvar,
    aborted: AtomicBool,
}

impl CompletionTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            state: Mutex::new(State {
                done: SegmentBitmap::new(total),
                failure: None,
            }),
            changed: Condvar::new(),
            aborted: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of distinct segments reported so far.
    pub fn completed(&self) -> usize {
        self.lock().done.completed_count()
    }

    /// Records segment `index` as done. Duplicate or out-of-range reports are
    /// ignored and return false.
    pub fn report(&self, index: usize) -> bool {
        if index >= self.total {
            tracing::warn!(index, total = self.total, "completion report for unknown segment");
            return false;
        }
        let newly = {
            let mut st = self.lock();
            st.done.set_completed(index)
        };
        if newly {
            self.changed.notify_all();
        } else {
            tracing::warn!(index, "duplicate completion report ignored");
        }
        newly
    }

    /// Records a fatal failure and wakes the waiter. Only the first failure is
    /// kept; returns false for later ones.
    pub fn fail(&self, error: TransferError) -> bool {
        if self.aborted.swap(true, Ordering::SeqCst) {
            tracing::debug!(error = %error, "run already aborted; failure not recorded");
            return false;
        }
        tracing::error!(error = %error, segment = ?error.segment_index(), "aborting run");
        self.lock().failure = Some(error);
        self.changed.notify_all();
        true
    }

    /// True once any failure has been recorded.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Blocks until every segment has been reported, or returns the first
    /// recorded failure. Meant for a single waiter: the failure is handed out once.
    pub fn await_all(&self) -> Result<(), TransferError> {
        match self.wait_until(None) {
            Some(res) => res,
            None => unreachable!("wait without deadline cannot time out"),
        }
    }

    /// Like `await_all`, but gives up after `timeout` and returns `None` if the
    /// run is still in progress.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<(), TransferError>> {
        self.wait_until(Some(Instant::now() + timeout))
    }

    fn wait_until(&self, deadline: Option<Instant>) -> Option<Result<(), TransferError>> {
        let mut st = self.lock();
        loop {
            if let Some(e) = st.failure.take() {
                return Some(Err(e));
            }
            if st.done.all_completed(self.total) {
                return Some(Ok(()));
            }
            st = match deadline {
                None => self.changed.wait(st).unwrap_or_else(|e| e.into_inner()),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    self.changed
                        .wait_timeout(st, deadline - now)
                        .unwrap_or_else(|e| e.into_inner())
                        .0
                }
            };
        }
    }

    /// Guard for a worker thread: if the thread unwinds while the guard is
    /// alive, the run is failed instead of leaving `await_all` blocked.
    pub fn watch(&self, worker: usize) -> WorkerWatch<'_> {
        WorkerWatch {
            tracker: self,
            worker,
        }
    }
}

/// Returned by [`CompletionTracker::watch`].
pub struct WorkerWatch<'a> {
    tracker: &'a CompletionTracker,
    worker: usize,
}

impl Drop for WorkerWatch<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.tracker
                .fail(TransferError::WorkerPanicked { worker: self.worker });
        }
    }
}
