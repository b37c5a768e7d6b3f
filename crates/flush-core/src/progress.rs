//! Progress snapshots emitted on the assembler's periodic tick.
//!
//! Consumers can compute rate = bytes_done / elapsed_secs. Only finished
//! sections count towards `bytes_done`; a section's bytes arrive all at once.

use std::time::Duration;

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * KB;
const GB: f64 = 1024.0 * MB;

/// Snapshot of download progress (CLI-friendly).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    /// Bytes of sections whose temp files are complete.
    pub bytes_done: u64,
    /// Total resource size, if known.
    pub total_bytes: Option<u64>,
    /// Elapsed time since fetching started (seconds).
    pub elapsed_secs: f64,
    /// Number of sections fetched so far.
    pub sections_done: usize,
    /// Total number of sections.
    pub section_count: usize,
}

impl ProgressStats {
    /// Download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Fraction of sections complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.section_count == 0 {
            return 1.0;
        }
        (self.sections_done as f64 / self.section_count as f64).min(1.0)
    }
}

/// How the assembler reports progress while it waits for the fetchers.
#[derive(Debug, Clone)]
pub struct ProgressOptions {
    /// Tick period; one snapshot per tick.
    pub interval: Duration,
    /// Optional receiver of snapshots (e.g. a CLI printer). Full channels drop snapshots.
    pub tx: Option<tokio::sync::mpsc::Sender<ProgressStats>>,
}

impl Default for ProgressOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            tx: None,
        }
    }
}

/// Human-readable size: `512 B`, `1.50 KB`, `3.25 MB`, `1.00 GB`.
pub fn format_size(bytes: u64) -> String {
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < MB {
        format!("{:.2} KB", b / KB)
    } else if b < GB {
        format!("{:.2} MB", b / MB)
    } else {
        format!("{:.2} GB", b / GB)
    }
}
