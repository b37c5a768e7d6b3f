//! `flush <url>`: plan, print the plan, download with a progress line per tick.

use anyhow::{Context, Result};
use flush_core::config::FlushConfig;
use flush_core::planner::{self, PlanOptions};
use flush_core::progress::{format_size, ProgressOptions, ProgressStats};
use flush_core::RunOptions;
use std::io::Write;

use super::Cli;

/// Merges command-line flags over config values.
pub(super) fn plan_options(cli: &Cli, cfg: &FlushConfig) -> Result<PlanOptions> {
    let destination = match cli.dir.clone().or_else(|| cfg.download_dir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    Ok(PlanOptions {
        connections: cli.connections.unwrap_or(cfg.connections),
        destination,
        http: cfg.http_options(),
        legacy_final_section_end: cli.legacy_final_end || cfg.legacy_final_section_end,
    })
}

/// One tick of the progress display: sections, percent of sections done, and rate.
pub(super) fn progress_line(stats: &ProgressStats) -> String {
    format!(
        "{}/{} sections ({:.0}%) {}/s",
        stats.sections_done,
        stats.section_count,
        stats.fraction() * 100.0,
        format_size(stats.bytes_per_sec() as u64)
    )
}

pub(super) async fn run_download(cli: &Cli, cfg: &FlushConfig) -> Result<()> {
    let opts = plan_options(cli, cfg)?;
    let downloader = planner::plan(&cli.url, &opts)
        .await
        .with_context(|| format!("cannot plan download of {}", cli.url))?;

    let size = downloader
        .content_length()
        .map(format_size)
        .unwrap_or_else(|| "unknown size".to_string());
    println!(
        "Downloading {} ({}) with {} connection(s)",
        downloader.output_path().display(),
        size,
        downloader.connection_count()
    );

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressStats>(16);
    let printer = tokio::spawn(async move {
        while let Some(stats) = progress_rx.recv().await {
            print!("\r{}", progress_line(&stats));
            let _ = std::io::stdout().flush();
        }
    });

    let run = RunOptions {
        progress: ProgressOptions {
            tx: Some(progress_tx),
            ..ProgressOptions::default()
        },
        ..RunOptions::default()
    };
    let result = downloader.start_with(run).await;
    let _ = printer.await;
    println!();

    let report = result.context("download failed")?;
    for failure in &report.cleanup_failures {
        eprintln!(
            "warning: could not remove {}: {}",
            failure.path.display(),
            failure.error
        );
    }
    println!(
        "Done: {} ({} in {:.1}s)",
        report.output_path.display(),
        format_size(report.bytes_written),
        report.elapsed.as_secs_f64()
    );
    Ok(())
}
