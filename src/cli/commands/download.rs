//! Batch download command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::api::OceanClient;
use crate::config::Config;
use crate::input;
use crate::models::BatchSummary;
use crate::services::{DownloadConfig, DownloadEvent, DownloadService};

/// Download the letter for every reference in `input_path`.
pub async fn cmd_download(
    config: &Config,
    input_path: &Path,
    output_dir: Option<PathBuf>,
    delay_ms: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let references = input::read_references(input_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", input_path.display(), e))?;

    if references.is_empty() {
        println!(
            "{} No references found in {}",
            style("!").yellow(),
            input_path.display()
        );
        return Ok(());
    }

    let mut settings = config.settings();
    if let Some(dir) = output_dir {
        settings.output_dir = dir;
    }
    if let Some(ms) = delay_ms {
        settings.request_delay = Duration::from_millis(ms);
    }

    let total = references.len();
    if !json {
        println!(
            "{} Downloading {} letter{} to {}",
            style("→").cyan(),
            total,
            if total == 1 { "" } else { "s" },
            settings.output_dir.display()
        );
    }

    let client = OceanClient::new(settings.ocean_host.clone(), settings.request_timeout);
    let service = DownloadService::new(
        client,
        DownloadConfig {
            output_dir: settings.output_dir.clone(),
            request_delay: settings.request_delay,
        },
    );

    // Event channel for progress updates
    let (event_tx, mut event_rx) = mpsc::channel::<DownloadEvent>(100);

    // Spawn event handler task (UI layer)
    let show_bar = !json;
    let event_handler = tokio::spawn(async move {
        let pb = if show_bar {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap()
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        while let Some(event) = event_rx.recv().await {
            let Some(ref pb) = pb else { continue };
            match event {
                DownloadEvent::Fetched { reference } => pb.set_message(reference),
                DownloadEvent::Skipped { reference } => {
                    pb.set_message(format!("{} (already present)", reference))
                }
                DownloadEvent::Failed { reference, error } => {
                    pb.println(format!("  {} {}: {}", style("✗").red(), reference, error))
                }
                DownloadEvent::Progress { completed, .. } => pb.set_position(completed as u64),
            }
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
    });

    // Run the batch (business logic); the sender is dropped when the run
    // returns, which ends the event handler.
    let run_result = service
        .run(config.credentials(), &references, event_tx)
        .await;
    let _ = event_handler.await;
    let result = run_result?;

    let summary = BatchSummary {
        total,
        completed: total,
        successful: result.successful.len(),
        skipped: result.skipped,
        failed: result.failed.clone(),
        output_dir: settings.output_dir.clone(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let downloaded = summary.successful - summary.skipped;
    println!(
        "{} Downloaded {} letter{}",
        style("✓").green(),
        downloaded,
        if downloaded == 1 { "" } else { "s" }
    );

    if result.skipped > 0 {
        println!(
            "  {} {} already present, skipped",
            style("→").dim(),
            result.skipped
        );
    }

    if !result.failed.is_empty() {
        println!(
            "{} {} download{} failed:",
            style("✗").red(),
            result.failed.len(),
            if result.failed.len() == 1 { "" } else { "s" }
        );
        for failure in &result.failed {
            println!("  - {}: {}", failure.reference, failure.error);
        }
    }

    println!(
        "  {} Output directory: {}",
        style("→").dim(),
        settings.output_dir.display()
    );

    Ok(())
}
