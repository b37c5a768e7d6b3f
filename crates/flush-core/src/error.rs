//! Error types for each download phase.
//!
//! Every error is fatal to the run: the facade stops at the first one and
//! returns it. Variants name the failing operation and carry the cause.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while probing the resource and planning sections.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("probe request to {url} failed: {source}")]
    Probe {
        url: String,
        #[source]
        source: curl::Error,
    },
    #[error("probe task for {url} ended abnormally: {reason}")]
    ProbeTask { url: String, reason: String },
    #[error("redirect from {url} (HTTP {status}) has no Location header")]
    MissingLocation { url: String, status: u32 },
    #[error("redirect from {url} has malformed Location {location:?}: {source}")]
    BadLocation {
        url: String,
        location: String,
        #[source]
        source: url::ParseError,
    },
    #[error("cannot resolve output path {path}: {source}")]
    OutputPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while fetching one section.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("section {index}: request failed: {source}")]
    Request {
        index: usize,
        #[source]
        source: curl::Error,
    },
    #[error("section {index}: server answered HTTP {status}")]
    Status { index: usize, status: u32 },
    #[error("section {index}: server ignored Range {range} and answered HTTP {status}")]
    RangeIgnored {
        index: usize,
        range: String,
        status: u32,
    },
    #[error("section {index}: cannot write {}: {source}", .path.display())]
    Write {
        index: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("fetch task ended abnormally: {0}")]
    Join(String),
}

/// Failure while merging section files into the output.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("cannot open output {}: {source}", .path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot open section file {}: {source}", .path.display())]
    OpenSection {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot append section file {} to output: {source}", .path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("expected {expected} completed sections, got {received}")]
    MissingSections { expected: usize, received: usize },
    #[error("finish signal dropped before all sections completed")]
    FinishSignalLost,
    #[error("assembler stopped without reporting completion")]
    CompletionSignalLost,
}

/// Any error that ends a download run.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("planning failed: {0}")]
    Plan(#[from] PlanError),
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("assembly failed: {0}")]
    Assemble(#[from] AssembleError),
}
