//! In-memory transport for unit tests.

use std::collections::HashMap;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{RangeRequest, Transport, TransportError};
use crate::fetch_head::HeadInfo;

/// Misbehaviour injected for the range starting at a given offset.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Fault {
    /// Answer with this HTTP status and no body.
    Status(u32),
    /// Deliver this many bytes, then fail with a connection reset.
    ResetAfter(usize),
    /// Deliver only this many bytes, then end the body cleanly.
    Truncate(usize),
    /// Ignore the Range header and send the whole resource with 200.
    IgnoreRange,
    /// Send nothing for this long (or until cancelled), then the range.
    Stall(Duration),
}

pub(crate) struct MemoryTransport {
    body: Vec<u8>,
    head: Result<HeadInfo, u32>,
    faults: HashMap<u64, Fault>,
    delay: Option<Duration>,
    requests: Mutex<Vec<(u64, u64)>>,
}

impl MemoryTransport {
    pub(crate) fn new(body: Vec<u8>) -> Self {
        let head = Ok(HeadInfo {
            content_length: Some(body.len().to_string()),
            accept_ranges: true,
        });
        Self {
            body,
            head,
            faults: HashMap::new(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_head(mut self, info: HeadInfo) -> Self {
        self.head = Ok(info);
        self
    }

    pub(crate) fn with_head_status(mut self, status: u32) -> Self {
        self.head = Err(status);
        self
    }

    pub(crate) fn with_fault(mut self, range_start: u64, fault: Fault) -> Self {
        self.faults.insert(range_start, fault);
        self
    }

    /// Sleep before answering each range request. Cancellation cuts the sleep short.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Ranges requested so far, as `(first, last)`.
    pub(crate) fn requests(&self) -> Vec<(u64, u64)> {
        self.requests.lock().unwrap().clone()
    }

    /// Sleeps up to `total`, returning `Cancelled` as soon as `cancelled` fires.
    fn idle(total: Duration, cancelled: &dyn Fn() -> bool) -> Result<(), TransportError> {
        const TICK: Duration = Duration::from_millis(5);
        let deadline = Instant::now() + total;
        loop {
            if cancelled() {
                return Err(TransportError::Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::sleep(TICK.min(deadline - now));
        }
    }

    fn deliver(
        data: &[u8],
        chunk_size: usize,
        body: &mut dyn FnMut(&[u8]) -> io::Result<()>,
    ) -> Result<(), TransportError> {
        for chunk in data.chunks(chunk_size.max(1)) {
            body(chunk).map_err(TransportError::Body)?;
        }
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn head(&self, _url: &str) -> Result<HeadInfo, TransportError> {
        match &self.head {
            Ok(info) => Ok(info.clone()),
            Err(status) => Err(TransportError::Status(*status)),
        }
    }

    fn get_range(
        &self,
        request: &RangeRequest<'_>,
        body: &mut dyn FnMut(&[u8]) -> io::Result<()>,
        cancelled: &dyn Fn() -> bool,
    ) -> Result<u32, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((request.first, request.last));
        if let Some(d) = self.delay {
            Self::idle(d, cancelled)?;
        }

        let total = self.body.len() as u64;
        let first = request.first.min(total) as usize;
        let end = (request.last + 1).min(total) as usize;
        let slice = &self.body[first..end.max(first)];

        match self.faults.get(&request.first).copied() {
            None => {
                Self::deliver(slice, request.chunk_size, body)?;
                Ok(206)
            }
            Some(Fault::Status(code)) => Err(TransportError::Status(code)),
            Some(Fault::ResetAfter(n)) => {
                Self::deliver(&slice[..n.min(slice.len())], request.chunk_size, body)?;
                // CURLE_RECV_ERROR, as libcurl reports a reset mid-body.
                Err(TransportError::Curl(curl::Error::new(56)))
            }
            Some(Fault::Truncate(n)) => {
                Self::deliver(&slice[..n.min(slice.len())], request.chunk_size, body)?;
                Ok(206)
            }
            Some(Fault::IgnoreRange) => {
                Self::deliver(&self.body, request.chunk_size, body)?;
                Ok(200)
            }
            Some(Fault::Stall(d)) => {
                Self::idle(d, cancelled)?;
                Self::deliver(slice, request.chunk_size, body)?;
                Ok(206)
            }
        }
    }
}
