//! Ordered merge of section temp files into the output file.
//!
//! The assembler owns the output file. It collects per-section completion
//! signals while fetchers run, ticks progress once per interval, and on the
//! finish signal appends every temp file in lexical (= index) order, then
//! removes them.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use crate::error::AssembleError;
use crate::progress::{ProgressOptions, ProgressStats};

use super::fetch::SectionDone;

/// A temp file that could not be removed after assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyReport {
    /// Bytes appended to the output by this run.
    pub bytes_written: u64,
    pub sections_merged: usize,
    /// Removal failures; assembly still succeeded.
    pub cleanup_failures: Vec<CleanupFailure>,
}

pub struct Assembler {
    output: File,
    output_path: PathBuf,
    section_count: usize,
    total_bytes: Option<u64>,
    completed: Vec<SectionDone>,
}

impl Assembler {
    /// Opens (creating if absent) the output for appending.
    pub async fn open(
        output_path: &Path,
        section_count: usize,
        total_bytes: Option<u64>,
    ) -> Result<Self, AssembleError> {
        let output = OpenOptions::new()
            .create(true)
            .append(true)
            .open(output_path)
            .await
            .map_err(|source| AssembleError::OpenOutput {
                path: output_path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            output,
            output_path: output_path.to_path_buf(),
            section_count,
            total_bytes,
            completed: Vec::with_capacity(section_count),
        })
    }

    /// Waits for `finish`, merges, cleans up, and reports through `done` exactly once.
    pub async fn run(
        self,
        completions: mpsc::UnboundedReceiver<SectionDone>,
        finish: oneshot::Receiver<()>,
        done: oneshot::Sender<Result<AssemblyReport, AssembleError>>,
        progress: ProgressOptions,
    ) {
        let result = self.wait_and_merge(completions, finish, progress).await;
        if done.send(result).is_err() {
            tracing::debug!("assembly finished after the caller stopped waiting");
        }
    }

    async fn wait_and_merge(
        mut self,
        mut completions: mpsc::UnboundedReceiver<SectionDone>,
        mut finish: oneshot::Receiver<()>,
        progress: ProgressOptions,
    ) -> Result<AssemblyReport, AssembleError> {
        let started = Instant::now();
        let mut tick = tokio::time::interval(progress.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        tick.tick().await;

        loop {
            tokio::select! {
                Some(section) = completions.recv() => {
                    tracing::debug!(index = section.index, path = %section.temp_path.display(), "section ready");
                    self.completed.push(section);
                }
                signal = &mut finish => {
                    signal.map_err(|_| AssembleError::FinishSignalLost)?;
                    break;
                }
                _ = tick.tick() => {
                    let stats = self.stats(started);
                    tracing::debug!(
                        sections_done = stats.sections_done,
                        section_count = stats.section_count,
                        bytes_done = stats.bytes_done,
                        "progress"
                    );
                    if let Some(tx) = progress.tx.as_ref() {
                        let _ = tx.try_send(stats);
                    }
                }
            }
        }

        // Fetchers signal before their task ends and the finish signal is sent
        // after every task joined, so whatever is still queued is already here.
        while let Ok(section) = completions.try_recv() {
            self.completed.push(section);
        }
        if self.completed.len() != self.section_count {
            return Err(AssembleError::MissingSections {
                expected: self.section_count,
                received: self.completed.len(),
            });
        }

        let mut paths: Vec<PathBuf> = self
            .completed
            .iter()
            .map(|s| s.temp_path.clone())
            .collect();
        paths.sort();

        let bytes_written = self.append_all(&paths).await?;
        let cleanup_failures = remove_all(&paths).await;
        tracing::info!(
            output = %self.output_path.display(),
            bytes = bytes_written,
            sections = paths.len(),
            "assembly complete"
        );

        Ok(AssemblyReport {
            bytes_written,
            sections_merged: paths.len(),
            cleanup_failures,
        })
    }

    /// Appends each file in order, one at a time.
    async fn append_all(&mut self, paths: &[PathBuf]) -> Result<u64, AssembleError> {
        let mut total = 0u64;
        for path in paths {
            let mut section = File::open(path)
                .await
                .map_err(|source| AssembleError::OpenSection {
                    path: path.clone(),
                    source,
                })?;
            let copied = tokio::io::copy(&mut section, &mut self.output)
                .await
                .map_err(|source| AssembleError::Copy {
                    path: path.clone(),
                    source,
                })?;
            total += copied;
        }
        self.output
            .flush()
            .await
            .map_err(|source| AssembleError::Copy {
                path: self.output_path.clone(),
                source,
            })?;
        Ok(total)
    }

    fn stats(&self, started: Instant) -> ProgressStats {
        ProgressStats {
            bytes_done: self.completed.iter().map(|s| s.bytes).sum(),
            total_bytes: self.total_bytes,
            elapsed_secs: started.elapsed().as_secs_f64(),
            sections_done: self.completed.len(),
            section_count: self.section_count,
        }
    }
}

/// Attempts every removal; failures are logged and returned, never raised.
pub(crate) async fn remove_all(paths: &[PathBuf]) -> Vec<CleanupFailure> {
    let mut failures = Vec::new();
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), "failed to remove section file: {}", e);
            failures.push(CleanupFailure {
                path: path.clone(),
                error: e.to_string(),
            });
        }
    }
    failures
}
