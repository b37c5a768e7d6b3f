//! Lifecycle of one download run.

use std::fmt;

/// `Planned -> Fetching -> Assembling -> Completed`, with `Failed` reachable from
/// any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Planned,
    Fetching,
    Assembling,
    Completed,
    Failed,
}

impl DownloadState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DownloadState::Completed | DownloadState::Failed)
    }

    /// True if `self -> next` is a legal step (no skipping, nothing after a terminal state).
    pub fn can_advance_to(self, next: DownloadState) -> bool {
        use DownloadState::*;
        match (self, next) {
            (Planned, Fetching) | (Fetching, Assembling) | (Assembling, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DownloadState::Planned => "planned",
            DownloadState::Fetching => "fetching",
            DownloadState::Assembling => "assembling",
            DownloadState::Completed => "completed",
            DownloadState::Failed => "failed",
        };
        f.write_str(s)
    }
}
