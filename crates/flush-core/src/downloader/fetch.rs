//! Single-section HTTP GET, buffered in memory and written to the section's temp file.

use std::path::PathBuf;

use tokio::sync::mpsc;
use url::Url;

use crate::error::FetchError;
use crate::http::HttpOptions;
use crate::planner::{ByteRange, Section};

/// Completion signal of one section: which section, where its bytes are, how many.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDone {
    pub index: usize,
    pub temp_path: PathBuf,
    pub bytes: u64,
}

/// Fetches one section and persists it.
#[derive(Debug, Clone)]
pub struct SectionFetcher {
    url: Url,
    http: HttpOptions,
    section: Section,
}

impl SectionFetcher {
    pub fn new(url: Url, http: HttpOptions, section: Section) -> Self {
        Self { url, http, section }
    }

    /// GET the section (with `Range` when bounded), write the whole body to the
    /// temp file (truncating), then send the completion signal.
    pub async fn fetch(
        self,
        completions: mpsc::UnboundedSender<SectionDone>,
    ) -> Result<SectionDone, FetchError> {
        let index = self.section.index;
        let url = self.url.to_string();
        let range = self.section.range;
        let http = self.http;
        let body = tokio::task::spawn_blocking(move || fetch_body(&url, index, range, http))
            .await
            .map_err(|e| FetchError::Join(format!("section {}: {}", index, e)))??;

        let temp_path = self.section.temp_path;
        tokio::fs::write(&temp_path, &body)
            .await
            .map_err(|source| FetchError::Write {
                index,
                path: temp_path.clone(),
                source,
            })?;

        let done = SectionDone {
            index,
            temp_path,
            bytes: body.len() as u64,
        };
        tracing::debug!(index, bytes = done.bytes, "section fetched");
        // The assembler may already be gone after a sibling failure; nothing to do then.
        let _ = completions.send(done.clone());
        Ok(done)
    }
}

/// Blocking GET returning the full response body.
///
/// A bounded range must come back as 206; a 200 means the server sent the
/// whole resource instead of the requested slice.
fn fetch_body(
    url: &str,
    index: usize,
    range: Option<ByteRange>,
    http: HttpOptions,
) -> Result<Vec<u8>, FetchError> {
    let request = |source| FetchError::Request { index, source };
    let mut body: Vec<u8> = Vec::with_capacity(
        range
            .map(|r| usize::try_from(r.len()).unwrap_or(0))
            .unwrap_or(0),
    );

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(request)?;
    easy.follow_location(true).map_err(request)?;
    easy.max_redirections(10).map_err(request)?;
    easy.connect_timeout(http.connect_timeout).map_err(request)?;
    easy.timeout(http.transfer_timeout).map_err(request)?;
    if let Some(r) = range {
        easy.range(&r.curl_value()).map_err(request)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(request)?;
        transfer.perform().map_err(request)?;
    }

    let status = easy.response_code().map_err(request)?;
    match range {
        Some(r) if status == 200 => {
            return Err(FetchError::RangeIgnored {
                index,
                range: r.header_value(),
                status,
            })
        }
        Some(_) if status != 206 => return Err(FetchError::Status { index, status }),
        None if !(200..300).contains(&status) => {
            return Err(FetchError::Status { index, status })
        }
        _ => {}
    }
    Ok(body)
}
