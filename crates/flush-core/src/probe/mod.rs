//! HTTP HEAD / metadata probing.
//!
//! Uses the curl crate (libcurl) to fetch response headers and read
//! `Content-Length`, `Accept-Ranges` and, for redirects, `Location`.
//! Redirects are not followed here; the planner decides what to do with them.

mod parse;

use std::str;

use crate::http::HttpOptions;

pub(crate) use parse::parse_headers;

/// Headers of one HEAD response that the planner cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResult {
    /// HTTP status code of the response.
    pub status: u32,
    /// Total size in bytes, if `Content-Length` is present and parses.
    pub content_length: Option<u64>,
    /// True if server sent `Accept-Ranges: bytes`. Absent or `none` is false.
    pub accept_ranges: bool,
    /// `Location` value if present (redirect target, possibly relative).
    pub location: Option<String>,
}

/// Performs a HEAD request without following redirects and returns parsed metadata.
///
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn probe(url: &str, opts: HttpOptions) -> Result<ProbeResult, curl::Error> {
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.nobody(true)?; // HEAD request
    easy.follow_location(false)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.probe_timeout)?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                let line = s.trim_end();
                // A new status line starts a new header block (e.g. after 100 Continue).
                if line.starts_with("HTTP/") {
                    headers.clear();
                }
                headers.push(line.to_string());
            }
            true
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    let mut result = parse_headers(&headers);
    result.status = status;
    tracing::debug!(
        url,
        status,
        content_length = ?result.content_length,
        accept_ranges = result.accept_ranges,
        location = ?result.location,
        "probe response"
    );
    Ok(result)
}
