//! HTTP transport seam.
//!
//! The engine needs exactly two capabilities: a HEAD request yielding the
//! resource's headers, and a GET restricted to an inclusive byte range whose
//! body is handed over chunk by chunk. `CurlTransport` provides both over
//! libcurl; tests swap in an in-memory implementation.

mod easy;
#[cfg(test)]
pub(crate) mod memory;

pub use easy::{CurlOptions, CurlTransport};

use std::io;

use thiserror::Error;

use crate::fetch_head::HeadInfo;

/// Failure reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Curl(#[from] curl::Error),
    #[error("HTTP {0}")]
    Status(u32),
    /// The body callback refused a chunk; the transfer was abandoned.
    #[error("response body rejected")]
    Body(#[source] io::Error),
    /// The caller's cancellation check fired before the body ended.
    #[error("transfer cancelled")]
    Cancelled,
}

/// A ranged GET: bytes `first..=last` of `url`, delivered in chunks of at most
/// `chunk_size` bytes.
#[derive(Debug, Clone, Copy)]
pub struct RangeRequest<'a> {
    pub url: &'a str,
    pub first: u64,
    pub last: u64,
    pub chunk_size: usize,
}

/// HEAD and ranged-GET capability shared by all workers of a run.
pub trait Transport: Sync {
    /// Metadata-only request for `url`. Non-2xx answers are errors.
    fn head(&self, url: &str) -> Result<HeadInfo, TransportError>;

    /// Streams the body of a ranged GET into `body`, returning the final HTTP
    /// status once the body has ended. If `body` returns an error the transfer
    /// stops and `TransportError::Body` carries that error.
    ///
    /// `cancelled` is polled while the transfer is in flight, including while
    /// no data arrives; once it returns true the transfer ends with
    /// `TransportError::Cancelled` within about a second.
    fn get_range(
        &self,
        request: &RangeRequest<'_>,
        body: &mut dyn FnMut(&[u8]) -> io::Result<()>,
        cancelled: &dyn Fn() -> bool,
    ) -> Result<u32, TransportError>;
}
