//! `segfetch fetch -u <url>` – run one segmented download.

use anyhow::Result;
use segfetch_core::config::{self, checked_counts, FetchConfig, SegfetchConfig};
use segfetch_core::events::DownloadEvent;
use segfetch_core::progress::ProgressStats;
use segfetch_core::transport::{CurlOptions, CurlTransport};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

const PROGRESS_INTERVAL_MS: u128 = 500;

/// Flags of the fetch subcommand; `None` falls back to the config file.
#[derive(Debug, Clone)]
pub struct FetchArgs {
    pub url: String,
    pub segments: Option<i64>,
    pub connections: Option<i64>,
    pub output: Option<PathBuf>,
    pub json: bool,
}

/// Merges command-line flags over config-file defaults.
pub(crate) fn build_fetch_config(cfg: &SegfetchConfig, args: &FetchArgs) -> Result<FetchConfig> {
    let (segments, connections) = checked_counts(
        args.segments.unwrap_or(cfg.segments as i64),
        args.connections.unwrap_or(cfg.connections as i64),
    )?;
    let mut fc = cfg.fetch_config(args.url.clone());
    fc.segment_count = segments;
    fc.connection_count = connections;
    if let Some(out) = &args.output {
        fc.output_path = out.clone();
    }
    fc.validate()?;
    Ok(fc)
}

fn print_progress(stats: &ProgressStats) {
    let done_mib = stats.bytes_done as f64 / 1_048_576.0;
    let total_mib = stats.total_bytes as f64 / 1_048_576.0;
    let rate_mib = stats.bytes_per_sec() / 1_048_576.0;
    let eta = stats
        .eta_secs()
        .map(|s| format!("{:.0}s", s))
        .unwrap_or_else(|| "?".to_string());
    println!(
        "  {:.1} / {:.1} MiB ({:.1}%)  {}/{} segments  {:.2} MiB/s  ETA {}",
        done_mib,
        total_mib,
        stats.fraction() * 100.0,
        stats.segments_done,
        stats.segment_count,
        rate_mib,
        eta
    );
}

pub async fn run_fetch(args: FetchArgs) -> Result<()> {
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);
    let fetch_cfg = build_fetch_config(&cfg, &args)?;
    let transport = Arc::new(CurlTransport::new(CurlOptions::from_config(&cfg)));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<DownloadEvent>();
    let quiet = args.json;
    let printer = tokio::spawn(async move {
        let started = Instant::now();
        let mut last_print = Instant::now();
        let mut stats = ProgressStats::default();
        while let Some(event) = rx.recv().await {
            stats.apply(&event);
            if quiet {
                continue;
            }
            match &event {
                DownloadEvent::SegmentStarted { index, .. } => {
                    println!("Segment {} starting", index);
                }
                DownloadEvent::SegmentFinished { index, .. } => {
                    println!("Segment {} finished", index);
                    stats.elapsed_secs = started.elapsed().as_secs_f64();
                    if last_print.elapsed().as_millis() >= PROGRESS_INTERVAL_MS {
                        print_progress(&stats);
                        last_print = Instant::now();
                    }
                }
                DownloadEvent::Finished { .. } => print_progress(&stats),
                _ => {}
            }
        }
    });

    let result = segfetch_core::fetch_async(fetch_cfg, transport, tx).await;
    // The sender was dropped with the engine task, so the printer drains and exits.
    if let Err(e) = printer.await {
        tracing::warn!("progress printer failed: {}", e);
    }

    let report = result?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Download finished!");
    }
    Ok(())
}
