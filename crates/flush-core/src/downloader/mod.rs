//! Segmented downloader facade.
//!
//! A [`Downloader`] comes out of the planner with its final URL, sections and
//! output path. [`Downloader::start`] runs the coordinator (one concurrent GET
//! per section, each into its own temp file) and the assembler (ordered merge
//! into the output), and returns once the assembler reports completion. Any
//! error ends the run; there is no retry and no resume.

mod assembler;
mod coordinator;
mod fetch;
mod state;

pub use assembler::{Assembler, AssemblyReport, CleanupFailure};
pub use coordinator::Coordinator;
pub use fetch::{SectionDone, SectionFetcher};
pub use state::DownloadState;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, watch};
use url::Url;

use crate::error::{AssembleError, DownloadError};
use crate::http::HttpOptions;
use crate::planner::Section;
use crate::progress::{format_size, ProgressOptions};

/// Per-run knobs that do not affect the plan.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub progress: ProgressOptions,
    /// Receives every state transition of the run.
    pub state_tx: Option<watch::Sender<DownloadState>>,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub url: Url,
    pub output_path: PathBuf,
    pub bytes_written: u64,
    pub section_count: usize,
    pub elapsed: Duration,
    /// Temp files that could not be removed. The download itself succeeded.
    pub cleanup_failures: Vec<CleanupFailure>,
}

/// One planned download. Run it once with [`Downloader::start`].
#[derive(Debug)]
pub struct Downloader {
    url: Url,
    sections: Vec<Section>,
    content_length: Option<u64>,
    output_path: PathBuf,
    http: HttpOptions,
    state: DownloadState,
}

impl Downloader {
    pub(crate) fn new(
        url: Url,
        sections: Vec<Section>,
        content_length: Option<u64>,
        output_path: PathBuf,
        http: HttpOptions,
    ) -> Self {
        Self {
            url,
            sections,
            content_length,
            output_path,
            http,
            state: DownloadState::Planned,
        }
    }

    /// Final URL every section is fetched from (after a redirect hop, if any).
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Effective connection count; always equals the number of sections.
    pub fn connection_count(&self) -> usize {
        self.sections.len()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn state(&self) -> DownloadState {
        self.state
    }

    /// Runs with default options (1 s progress tick, no listeners).
    pub async fn start(self) -> Result<DownloadReport, DownloadError> {
        self.start_with(RunOptions::default()).await
    }

    /// Fetches every section concurrently, assembles them, and waits for completion.
    pub async fn start_with(mut self, opts: RunOptions) -> Result<DownloadReport, DownloadError> {
        let started = Instant::now();
        let name = self
            .output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = self
            .content_length
            .map(format_size)
            .unwrap_or_else(|| "unknown size".to_string());
        tracing::info!("starting download [{}] {}", name, size);

        let result = self.run(&opts).await;
        match &result {
            Ok(_) => self.advance(DownloadState::Completed, &opts),
            Err(e) => {
                tracing::error!(output = %self.output_path.display(), "download failed: {}", e);
                self.advance(DownloadState::Failed, &opts);
            }
        }
        let report = result?;

        for failure in &report.cleanup_failures {
            tracing::warn!(path = %failure.path.display(), "left behind: {}", failure.error);
        }
        tracing::info!(
            "download complete: {} ({} in {:.2}s)",
            self.output_path.display(),
            format_size(report.bytes_written),
            started.elapsed().as_secs_f64()
        );

        Ok(DownloadReport {
            url: self.url,
            output_path: self.output_path,
            bytes_written: report.bytes_written,
            section_count: report.sections_merged,
            elapsed: started.elapsed(),
            cleanup_failures: report.cleanup_failures,
        })
    }

    async fn run(&mut self, opts: &RunOptions) -> Result<AssemblyReport, DownloadError> {
        self.advance(DownloadState::Fetching, opts);

        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (finish_tx, finish_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();

        let assembler =
            Assembler::open(&self.output_path, self.sections.len(), self.content_length).await?;
        let assembler_task = tokio::spawn(assembler.run(
            completion_rx,
            finish_rx,
            done_tx,
            opts.progress.clone(),
        ));

        let coordinator = Coordinator::new(self.url.clone(), self.http, self.sections.clone());
        if let Err(e) = coordinator.run(completion_tx, finish_tx).await {
            assembler_task.abort();
            return Err(e.into());
        }

        self.advance(DownloadState::Assembling, opts);
        let report = done_rx
            .await
            .map_err(|_| AssembleError::CompletionSignalLost)??;
        Ok(report)
    }

    fn advance(&mut self, next: DownloadState, opts: &RunOptions) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "download state");
        self.state = next;
        if let Some(tx) = opts.state_tx.as_ref() {
            let _ = tx.send(next);
        }
    }
}
