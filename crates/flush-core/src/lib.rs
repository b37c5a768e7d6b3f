//! flush: accelerate a single HTTP download by fetching byte ranges in parallel.
//!
//! [`planner::plan`] probes the resource and splits it into sections;
//! [`Downloader::start`] fetches them concurrently and assembles the output in
//! section order.

pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod logging;
pub mod planner;
pub mod probe;
pub mod progress;
pub mod url_model;

pub use downloader::{DownloadReport, DownloadState, Downloader, RunOptions};
pub use error::{AssembleError, DownloadError, FetchError, PlanError};
pub use planner::{plan, PlanOptions};

/// Plans and runs a download in one call.
pub async fn download(
    url: &str,
    opts: &PlanOptions,
    run: RunOptions,
) -> Result<DownloadReport, DownloadError> {
    let downloader = plan(url, opts).await?;
    downloader.start_with(run).await
}
