//! Probe the remote resource and plan its sections.
//!
//! One HEAD probe (two after a redirect hop) decides the final URL, whether
//! ranges are usable, and the size. The result is a [`Downloader`] ready to run.

mod sections;

pub use sections::{
    effective_connections, plan_sections, temp_path, ByteRange, Section, MAX_CONNECTIONS,
    SECTION_INDEX_WIDTH,
};

use std::path::PathBuf;

use url::Url;

use crate::downloader::Downloader;
use crate::error::PlanError;
use crate::http::{is_redirect, HttpOptions};
use crate::probe::{self, ProbeResult};
use crate::url_model;

/// Inputs to planning besides the URL.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Requested connection count before clipping.
    pub connections: usize,
    /// Folder the output file is placed in.
    pub destination: PathBuf,
    pub http: HttpOptions,
    /// End the final section at `content_length` (historical partition).
    pub legacy_final_section_end: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            connections: 8,
            destination: PathBuf::from("."),
            http: HttpOptions::default(),
            legacy_final_section_end: false,
        }
    }
}

/// Probes `url` and returns a planned downloader.
pub async fn plan(url: &str, opts: &PlanOptions) -> Result<Downloader, PlanError> {
    let url = Url::parse(url).map_err(|source| PlanError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    let mut head = probe_async(&url, opts.http).await?;
    let mut target = url;
    if is_redirect(head.status) {
        target = redirect_target(&target, &head)?;
        tracing::info!(status = head.status, to = %target, "following redirect");
        // One hop: the target's response is used as-is, even if it redirects again.
        head = probe_async(&target, opts.http).await?;
    }

    plan_from_probe(target, &head, opts)
}

/// Builds the downloader from an already probed resource.
pub fn plan_from_probe(
    url: Url,
    head: &ProbeResult,
    opts: &PlanOptions,
) -> Result<Downloader, PlanError> {
    if !head.accept_ranges {
        tracing::debug!(url = %url, "server does not advertise byte ranges");
    }
    if head.content_length.is_none() {
        tracing::debug!(url = %url, "content length unknown");
    }
    if opts.connections > MAX_CONNECTIONS {
        tracing::warn!(
            requested = opts.connections,
            max = MAX_CONNECTIONS,
            "connection count clipped"
        );
    }

    let connections = effective_connections(opts.connections, head.accept_ranges, head.content_length);
    let output_path = url_model::output_path(&opts.destination, &url).map_err(|source| {
        PlanError::OutputPath {
            path: opts.destination.clone(),
            source,
        }
    })?;
    let sections = plan_sections(
        &output_path,
        head.content_length,
        connections,
        opts.legacy_final_section_end,
    );

    tracing::info!(
        url = %url,
        output = %output_path.display(),
        connections,
        content_length = ?head.content_length,
        "download planned"
    );

    Ok(Downloader::new(
        url,
        sections,
        head.content_length,
        output_path,
        opts.http,
    ))
}

/// Resolves a redirect's `Location` (absolute or relative to `from`).
fn redirect_target(from: &Url, head: &ProbeResult) -> Result<Url, PlanError> {
    let location = head
        .location
        .as_deref()
        .ok_or_else(|| PlanError::MissingLocation {
            url: from.to_string(),
            status: head.status,
        })?;
    from.join(location).map_err(|source| PlanError::BadLocation {
        url: from.to_string(),
        location: location.to_string(),
        source,
    })
}

async fn probe_async(url: &Url, http: HttpOptions) -> Result<ProbeResult, PlanError> {
    let target = url.to_string();
    let joined = tokio::task::spawn_blocking({
        let target = target.clone();
        move || probe::probe(&target, http)
    })
    .await;
    match joined {
        Ok(result) => result.map_err(|source| PlanError::Probe { url: target, source }),
        Err(e) => Err(PlanError::ProbeTask {
            url: target,
            reason: e.to_string(),
        }),
    }
}
