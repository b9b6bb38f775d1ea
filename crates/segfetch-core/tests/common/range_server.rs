//! Small HTTP/1.1 server answering HEAD and `Range: bytes=a-b` GETs for one
//! static body. Each connection serves a single request and is then closed.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, HEAD returns 405.
    pub head_allowed: bool,
    /// If true, HEAD responses carry no Content-Length.
    pub omit_content_length: bool,
    /// Range GETs starting at this offset get a 500.
    pub fail_range_start: Option<u64>,
    /// If true, range GETs get `200 OK` with the whole body.
    pub ignore_range: bool,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            head_allowed: true,
            omit_content_length: false,
            fail_range_start: None,
            ignore_range: false,
        }
    }
}

/// Handle to a running server. The listener thread lives until the test
/// process exits.
pub struct RangeServer {
    pub url: String,
    ranges: Arc<Mutex<Vec<(u64, u64)>>>,
}

impl RangeServer {
    /// Ranges requested so far, sorted by start.
    pub fn ranges(&self) -> Vec<(u64, u64)> {
        let mut r = self.ranges.lock().unwrap().clone();
        r.sort();
        r
    }
}

pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let ranges = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&ranges);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let seen = Arc::clone(&seen);
            thread::spawn(move || handle(stream, &body, opts, &seen));
        }
    });
    RangeServer {
        url: format!("http://127.0.0.1:{}/file.bin", port),
        ranges,
    }
}

fn handle(
    mut stream: TcpStream,
    body: &[u8],
    opts: RangeServerOptions,
    seen: &Mutex<Vec<(u64, u64)>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let request = match read_head(&mut stream) {
        Some(r) => r,
        None => return,
    };
    let (method, range) = parse_request(&request);
    let total = body.len() as u64;

    if method.eq_ignore_ascii_case("HEAD") {
        if !opts.head_allowed {
            let _ = stream.write_all(
                b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
            return;
        }
        let length = if opts.omit_content_length {
            String::new()
        } else {
            format!("Content-Length: {}\r\n", total)
        };
        let response = format!(
            "HTTP/1.1 200 OK\r\n{}Accept-Ranges: bytes\r\nConnection: close\r\n\r\n",
            length
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    let (start, end_incl) = match range {
        Some(r) if !opts.ignore_range => r,
        Some(r) => {
            seen.lock().unwrap().push(r);
            write_full(&mut stream, body);
            return;
        }
        None => {
            write_full(&mut stream, body);
            return;
        }
    };
    seen.lock().unwrap().push((start, end_incl));

    if opts.fail_range_start == Some(start) {
        let _ = stream.write_all(
            b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    let end_incl = end_incl.min(total.saturating_sub(1));
    if total == 0 || start > end_incl {
        let header = format!(
            "HTTP/1.1 416 Range Not Satisfiable\r\nContent-Range: bytes */{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            total
        );
        let _ = stream.write_all(header.as_bytes());
        return;
    }
    let slice = &body[start as usize..=end_incl as usize];
    let header = format!(
        "HTTP/1.1 206 Partial Content\r\nContent-Length: {}\r\nContent-Range: bytes {}-{}/{}\r\nConnection: close\r\n\r\n",
        slice.len(),
        start,
        end_incl,
        total
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(slice);
}

fn write_full(stream: &mut TcpStream, body: &[u8]) {
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
}

/// Reads until the blank line ending the request head.
fn read_head(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 1024];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
        if data.len() > 64 * 1024 {
            return None;
        }
    }
    String::from_utf8(data).ok()
}

/// Returns (method, optional (start, end_inclusive) for `Range: bytes=X-Y`).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut lines = request.lines();
    let method = lines
        .next()
        .and_then(|l| l.split_whitespace().next())
        .unwrap_or("");
    let mut range = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("range") {
            continue;
        }
        let value = value.trim();
        if let Some(part) = value.strip_prefix("bytes=") {
            if let Some((a, b)) = part.split_once('-') {
                let start = a.trim().parse::<u64>().unwrap_or(0);
                let end = b.trim().parse::<u64>().unwrap_or(u64::MAX);
                range = Some((start, end));
            }
        }
    }
    (method, range)
}
