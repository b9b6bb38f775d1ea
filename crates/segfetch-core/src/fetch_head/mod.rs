//! Size probe: HEAD request and `Content-Length` extraction.
//!
//! The size is the only thing the engine needs before planning. A missing or
//! malformed length is fatal; a server that does not advertise
//! `Accept-Ranges: bytes` only gets a warning, since the range GETs will
//! fail loudly if ranges really are unsupported.

mod parse;

pub(crate) use parse::parse_headers;

use crate::error::ProbeError;
use crate::transport::Transport;

/// Headers of a HEAD response that matter for a segmented download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadInfo {
    /// Raw `Content-Length` value, if present.
    pub content_length: Option<String>,
    /// True if the server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
}

/// Issues the HEAD request through `transport` and returns the resource size.
pub fn probe_size<T: Transport + ?Sized>(transport: &T, url: &str) -> Result<u64, ProbeError> {
    tracing::debug!(url, "probing size");
    let info = transport.head(url).map_err(|source| ProbeError::Request {
        url: url.to_string(),
        source,
    })?;

    let raw = info
        .content_length
        .as_deref()
        .ok_or_else(|| ProbeError::MissingContentLength {
            url: url.to_string(),
        })?;
    let size = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| ProbeError::InvalidContentLength {
            url: url.to_string(),
            value: raw.to_string(),
        })?;

    if !info.accept_ranges {
        tracing::warn!(url, "server does not advertise Accept-Ranges: bytes");
    }
    tracing::info!(url, size, "probed resource size");
    Ok(size)
}
