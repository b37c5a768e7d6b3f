//! CLI for the flush downloader.

mod download;

use anyhow::Result;
use clap::Parser;
use flush_core::config;
use std::path::PathBuf;

/// Download one HTTP resource over several parallel connections.
#[derive(Debug, Parser)]
#[command(name = "flush")]
#[command(about = "flush: segmented parallel HTTP downloader", long_about = None)]
pub struct Cli {
    /// Direct HTTP/HTTPS URL to download.
    pub url: String,

    /// Number of parallel connections (clipped to 1000; default from config).
    #[arg(short, long, value_name = "N")]
    pub connections: Option<usize>,

    /// Destination folder (default from config, else the current directory).
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// End the last section at the content length, like older releases did.
    #[arg(long)]
    pub legacy_final_end: bool,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        download::run_download(&cli, &cfg).await
    }
}
