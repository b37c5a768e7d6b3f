//! Runs every section fetch concurrently and signals the assembler once all joined.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::Instrument;
use url::Url;

use crate::error::FetchError;
use crate::http::HttpOptions;
use crate::planner::Section;

use super::fetch::{SectionDone, SectionFetcher};

/// One task per section, no throttling beyond the planned connection count.
#[derive(Debug)]
pub struct Coordinator {
    url: Url,
    http: HttpOptions,
    sections: Vec<Section>,
}

impl Coordinator {
    pub fn new(url: Url, http: HttpOptions, sections: Vec<Section>) -> Self {
        Self {
            url,
            http,
            sections,
        }
    }

    /// Starts all fetches, joins them, then fires `finish`.
    ///
    /// The first failure aborts the remaining tasks and is returned; `finish` is
    /// dropped unsent in that case. Returns the number of sections fetched.
    pub async fn run(
        self,
        completions: mpsc::UnboundedSender<SectionDone>,
        finish: oneshot::Sender<()>,
    ) -> Result<usize, FetchError> {
        let count = self.sections.len();
        let mut tasks = JoinSet::new();
        for section in self.sections {
            let index = section.index;
            let fetcher = SectionFetcher::new(self.url.clone(), self.http, section);
            tasks.spawn(
                fetcher
                    .fetch(completions.clone())
                    .instrument(tracing::debug_span!("section", index)),
            );
        }
        drop(completions);
        tracing::debug!(sections = count, "all section fetches started");

        let mut joined = 0usize;
        while let Some(res) = tasks.join_next().await {
            match res {
                Ok(Ok(_)) => joined += 1,
                Ok(Err(e)) => {
                    tracing::error!("{}", e);
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(FetchError::Join(e.to_string()));
                }
            }
        }

        tracing::debug!(joined, "all section fetches joined");
        // A dropped receiver means the assembler already failed; the facade reports that.
        let _ = finish.send(());
        Ok(joined)
    }
}
