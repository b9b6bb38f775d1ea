//! Output file lifecycle and positional writes.
//!
//! The orchestrator creates (truncating) and optionally preallocates the
//! output file, shares the resulting `OutputSink` by reference with every
//! worker for concurrent `write_at` calls, and closes it exactly once.

mod builder;
mod writer;

pub use builder::OutputSinkBuilder;
pub use writer::OutputSink;
