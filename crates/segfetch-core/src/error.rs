//! Error taxonomy for a download run.
//!
//! Every error here is fatal to the run: there is no retry and no per-segment
//! isolation. `FetchError` names the stage that failed.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::transport::TransportError;

/// Bad run configuration. Raised before any network activity.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("URL must not be empty")]
    EmptyUrl,
    #[error("invalid URL {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported URL scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),
    #[error("connection count must be at least 1, got {0}")]
    ConnectionCount(i64),
    #[error("segment count must not be negative, got {0}")]
    SegmentCount(i64),
    #[error("at most {max} connections are supported, got {got}")]
    TooManyConnections { got: usize, max: usize },
    #[error("at most {max} segments are supported, got {got}")]
    TooManySegments { got: usize, max: usize },
    #[error("output path must not be empty")]
    EmptyOutputPath,
    #[error("chunk size must be between {min} and {max} bytes, got {got}")]
    ChunkSize { got: usize, min: usize, max: usize },
}

/// Size discovery failed. No output file has been created yet.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("HEAD {url} failed")]
    Request {
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("HEAD {url} returned no Content-Length")]
    MissingContentLength { url: String },
    #[error("HEAD {url} returned an invalid Content-Length {value:?}")]
    InvalidContentLength { url: String, value: String },
}

/// A worker failed after segmentation began. The output file is left partially written.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("segment {index}: range request failed")]
    Request {
        index: usize,
        #[source]
        source: TransportError,
    },
    #[error("segment {index}: server answered HTTP {status} to the range request")]
    Status { index: usize, status: u32 },
    #[error("segment {index}: write at offset {offset} failed")]
    Write {
        index: usize,
        offset: u64,
        #[source]
        source: io::Error,
    },
    #[error("segment {index}: body overruns the segment ({expected} bytes expected)")]
    Overrun { index: usize, expected: u64 },
    #[error("segment {index}: body ended early, expected {expected} bytes, got {received}")]
    ShortBody {
        index: usize,
        expected: u64,
        received: u64,
    },
    #[error("could not start worker {worker}")]
    Spawn {
        worker: usize,
        #[source]
        source: io::Error,
    },
    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}

impl TransferError {
    /// Segment the error belongs to, if it is tied to one.
    pub fn segment_index(&self) -> Option<usize> {
        match self {
            TransferError::Request { index, .. }
            | TransferError::Status { index, .. }
            | TransferError::Write { index, .. }
            | TransferError::Overrun { index, .. }
            | TransferError::ShortBody { index, .. } => Some(*index),
            TransferError::Spawn { .. } | TransferError::WorkerPanicked { .. } => None,
        }
    }
}

/// Top-level error of a run, tagged with the failing stage.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid configuration")]
    Validation(#[from] ValidationError),
    #[error("size probe failed")]
    Probe(#[from] ProbeError),
    #[error("could not prepare output file {}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("transfer failed")]
    Transfer(#[from] TransferError),
    #[error("download task did not complete")]
    Task(#[from] tokio::task::JoinError),
}
