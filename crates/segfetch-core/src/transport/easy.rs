//! libcurl transport: one Easy handle per request.

use std::io;
use std::str;
use std::time::Duration;

use curl::easy::Easy;

use super::{RangeRequest, Transport, TransportError};
use crate::config::SegfetchConfig;
use crate::fetch_head::{parse_headers, HeadInfo};

/// Per-handle curl settings.
#[derive(Debug, Clone, Copy)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Hard limit for the HEAD request.
    pub head_timeout: Duration,
    /// Abort a range GET whose throughput stays below this many bytes/s ...
    pub low_speed_limit: u32,
    /// ... for this long.
    pub low_speed_time: Duration,
    pub max_redirections: u32,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            head_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            max_redirections: 10,
        }
    }
}

impl CurlOptions {
    pub fn from_config(cfg: &SegfetchConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            low_speed_limit: cfg.low_speed_limit,
            low_speed_time: Duration::from_secs(cfg.low_speed_time_secs),
            ..Self::default()
        }
    }
}

/// Transport backed by libcurl. Each request gets its own handle, so a
/// response body never outlives the segment it belongs to.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    opts: CurlOptions,
}

impl CurlTransport {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }

    fn easy(&self, url: &str) -> Result<Easy, curl::Error> {
        let mut easy = Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(self.opts.max_redirections)?;
        easy.connect_timeout(self.opts.connect_timeout)?;
        easy.useragent(concat!("segfetch/", env!("CARGO_PKG_VERSION")))?;
        Ok(easy)
    }
}

impl Transport for CurlTransport {
    fn head(&self, url: &str) -> Result<HeadInfo, TransportError> {
        let mut lines: Vec<String> = Vec::new();

        let mut easy = self.easy(url)?;
        easy.nobody(true)?; // HEAD request
        easy.timeout(self.opts.head_timeout)?;

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(TransportError::Status(code));
        }
        Ok(parse_headers(&lines))
    }

    fn get_range(
        &self,
        request: &RangeRequest<'_>,
        body: &mut dyn FnMut(&[u8]) -> io::Result<()>,
        cancelled: &dyn Fn() -> bool,
    ) -> Result<u32, TransportError> {
        let mut easy = self.easy(request.url)?;
        // libcurl calls the progress function about once a second even on a
        // silent connection, so a stalled transfer still sees cancellation.
        easy.progress(true)?;
        // 4xx/5xx end the transfer before any error page reaches the body callback.
        easy.fail_on_error(true)?;
        easy.low_speed_limit(self.opts.low_speed_limit)?;
        easy.low_speed_time(self.opts.low_speed_time)?;
        easy.buffer_size(request.chunk_size)?;
        // curl takes "start-end" (inclusive), not "bytes=start-end"
        easy.range(&format!("{}-{}", request.first, request.last))?;

        let mut body_error: Option<io::Error> = None;
        let performed = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match body(data) {
                Ok(()) => Ok(data.len()),
                Err(e) => {
                    body_error = Some(e);
                    // Short count makes curl abort with a write error.
                    Ok(0)
                }
            })?;
            transfer.progress_function(|_, _, _, _| !cancelled())?;
            transfer.perform()
        };

        if let Some(e) = body_error {
            return Err(TransportError::Body(e));
        }
        if let Err(e) = performed {
            if e.is_aborted_by_callback() {
                return Err(TransportError::Cancelled);
            }
            if e.is_http_returned_error() {
                return Err(TransportError::Status(easy.response_code()?));
            }
            return Err(e.into());
        }
        Ok(easy.response_code()?)
    }
}
