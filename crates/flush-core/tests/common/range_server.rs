//! Minimal HTTP/1.1 server that supports HEAD and Range GET for integration tests.
//!
//! Serves a single static body at `/files/<name>`. Responds to HEAD with
//! Content-Length and Accept-Ranges: bytes; responds to GET with Range with
//! 206 Partial Content. Requests under `/old/<name>` get a 302 to
//! `/files/<name>`. Every request is recorded for assertions.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, omit `Accept-Ranges: bytes` and ignore Range headers (200 + full body).
    pub support_ranges: bool,
    /// If false, HEAD responses carry no Content-Length.
    pub head_content_length: bool,
    /// Delay each ranged GET so that earlier ranges finish last.
    pub reverse_completion: bool,
    /// Answer 500 to the ranged GET starting at this offset.
    pub fail_range_start: Option<u64>,
    /// Delay each ranged GET by a pseudo-random 0..80 ms derived from this seed
    /// and the range start, so sections finish in a seed-dependent order.
    pub delay_seed: Option<u64>,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            head_content_length: true,
            reverse_completion: false,
            fail_range_start: None,
            delay_seed: None,
        }
    }
}

/// One request as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub range: Option<String>,
}

pub struct RangeServer {
    base: String,
    log: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl RangeServer {
    /// URL of the served file (e.g. "http://127.0.0.1:12345/files/data.bin").
    pub fn url(&self, name: &str) -> String {
        format!("{}/files/{}", self.base, name)
    }

    /// URL that redirects once to [`RangeServer::url`].
    pub fn redirecting_url(&self, name: &str) -> String {
        format!("{}/old/{}", self.base, name)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn gets(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "GET")
            .collect()
    }
}

/// Starts a server in a background thread serving `body`. The server runs until the process exits.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

/// Like `start` but allows customizing server behavior (ranges missing, delays, failures).
pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let log = Arc::new(Mutex::new(Vec::new()));
    let server_log = Arc::clone(&log);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let log = Arc::clone(&server_log);
            thread::spawn(move || handle(stream, &body, opts, &log));
        }
    });
    RangeServer {
        base: format!("http://127.0.0.1:{}", port),
        log,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    body: &[u8],
    opts: RangeServerOptions,
    log: &Mutex<Vec<RecordedRequest>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let parsed = parse_request(request);
    log.lock().unwrap().push(RecordedRequest {
        method: parsed.method.to_string(),
        path: parsed.path.to_string(),
        range: parsed.raw_range.clone(),
    });
    let total = body.len() as u64;

    if let Some(name) = parsed.path.strip_prefix("/old/") {
        let response = format!(
            "HTTP/1.1 302 Found\r\nLocation: /files/{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            name
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }
    if !parsed.path.starts_with("/files/") {
        let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    }

    let accept_ranges = if opts.support_ranges {
        "Accept-Ranges: bytes\r\n"
    } else {
        ""
    };

    if parsed.method.eq_ignore_ascii_case("HEAD") {
        let length = if opts.head_content_length {
            format!("Content-Length: {}\r\n", total)
        } else {
            String::new()
        };
        let response = format!(
            "HTTP/1.1 200 OK\r\n{}{}Connection: close\r\n\r\n",
            length, accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if parsed.method.eq_ignore_ascii_case("GET") {
        let ranged = if opts.support_ranges { parsed.range } else { None };
        let (status, content_range, slice) = match ranged {
            Some((start, end_incl)) => {
                if opts.fail_range_start == Some(start) {
                    let _ = stream.write_all(
                        b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    );
                    return;
                }
                if opts.reverse_completion && total > 0 {
                    let wait = (total - start.min(total)) * 300 / total;
                    thread::sleep(Duration::from_millis(wait));
                }
                if let Some(seed) = opts.delay_seed {
                    thread::sleep(Duration::from_millis(mix(seed ^ start) % 80));
                }
                let end_incl = end_incl.min(total.saturating_sub(1));
                if start > end_incl {
                    (
                        "416 Range Not Satisfiable",
                        format!("Content-Range: bytes */{}\r\n", total),
                        &body[0..0],
                    )
                } else {
                    let slice = &body[start as usize..=end_incl as usize];
                    (
                        "206 Partial Content",
                        format!("Content-Range: bytes {}-{}/{}\r\n", start, end_incl, total),
                        slice,
                    )
                }
            }
            None => ("200 OK", String::new(), body),
        };
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}{}Connection: close\r\n\r\n",
            status,
            slice.len(),
            content_range,
            accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.write_all(slice);
        return;
    }
    let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
}

/// splitmix64 finalizer; spreads nearby range starts over the delay window.
fn mix(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

struct ParsedRequest<'a> {
    method: &'a str,
    path: &'a str,
    raw_range: Option<String>,
    /// (start, end_inclusive) for Range: bytes=X-Y.
    range: Option<(u64, u64)>,
}

fn parse_request(request: &str) -> ParsedRequest<'_> {
    let mut parsed = ParsedRequest {
        method: "",
        path: "",
        raw_range: None,
        range: None,
    };
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if parsed.method.is_empty() {
            let mut parts = line.split_whitespace();
            parsed.method = parts.next().unwrap_or("");
            parsed.path = parts.next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                parsed.raw_range = Some(value.to_string());
                if value.to_lowercase().starts_with("bytes=") {
                    let part = value[6..].trim();
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim();
                        let end_incl = if end.is_empty() {
                            u64::MAX
                        } else {
                            end.parse::<u64>().unwrap_or(0)
                        };
                        parsed.range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    parsed
}
