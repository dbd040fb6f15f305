//! One-shot command-line runner for the segmentation pipeline.
//!
//! Shares configuration with the HTTP server. `segment` blocks until the run finishes;
//! Ctrl-C cancels it, including a poll that is mid-wait.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vidseg::{config, logging, pipeline::SegmentationService};

#[derive(Parser)]
#[command(
    name = "vidseg-cli",
    about = "Index a video and split it into topic segments"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a video, wait for it, and print its segments as JSON.
    Segment {
        #[arg(long)]
        url: String,
        /// Override the wait ceiling for this run.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Submit a video for indexing and print the task id.
    Submit {
        #[arg(long)]
        url: String,
    },
    /// Print the status of an indexing task.
    Status {
        #[arg(long)]
        task_id: String,
    },
    /// Check the service and the configured index.
    Verify,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    config::load_dotenv();
    logging::init_tracing();
    let mut config = config::init_config().context("failed to load configuration")?;

    if let Command::Segment {
        timeout_secs: Some(secs),
        ..
    } = &cli.command
    {
        config.poll_timeout = Duration::from_secs(*secs);
    }

    let service = SegmentationService::from_config(&config)
        .context("failed to construct video service client")?;

    match cli.command {
        Command::Segment { url, .. } => {
            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received; cancelling run");
                    trigger.cancel();
                }
            });

            tracing::info!(
                interval = ?config.poll_interval,
                timeout = ?config.poll_timeout,
                "Segmenting video"
            );
            let result = service.index_and_segment(&url, &cancel).await;
            print_json(&result)
        }
        Command::Submit { url } => {
            let task = service
                .start_indexing(&url)
                .await
                .context("failed to submit video")?;
            println!("{}", task.task_id);
            Ok(())
        }
        Command::Status { task_id } => {
            let report = service
                .task_status(&task_id)
                .await
                .with_context(|| format!("failed to retrieve task {task_id}"))?;
            print_json(&report)
        }
        Command::Verify => print_json(&service.verify_index().await),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}
