//! Work distribution and completion synchronization for one download run.
//!
//! `WorkQueue` hands each segment index to exactly one worker;
//! `CompletionTracker` tells the orchestrator when every segment is done
//! (or when the run has failed).

mod completion;
mod queue;

pub use completion::{CompletionTracker, WorkerWatch};
pub use queue::WorkQueue;
