//! Analyze a directory of frames and print the report as JSON.
//!
//! Usage: `emo-analyze <frames_dir> <landmarks.json> [report.json]`
//!
//! Frames are read in file-name order at `EMO_FPS` (default 30). Landmarks
//! come from the external model's JSON output keyed by frame index.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use emo_media::{ImageSequenceSource, PrecomputedExtractor};
use emo_models::format_seconds;
use emo_vision_client::GeminiVisionClient;
use emo_worker::{AnalysisSession, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();
    init_tracing()?;

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        anyhow::bail!("usage: {} <frames_dir> <landmarks.json> [report.json]", args[0]);
    }
    let frames_dir = &args[1];
    let landmarks_path = &args[2];
    let output_path = args.get(3);

    let fps: f64 = std::env::var("EMO_FPS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30.0);

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let client = GeminiVisionClient::from_env().context("Failed to create vision client")?;
    let source = ImageSequenceSource::open(frames_dir, fps)
        .with_context(|| format!("Failed to open frames in {}", frames_dir))?;
    let extractor = PrecomputedExtractor::from_json_file(landmarks_path)
        .with_context(|| format!("Failed to load landmarks from {}", landmarks_path))?;

    let session = AnalysisSession::new(config, Arc::new(client))?;
    let handle = session.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, cancelling session");
            handle.cancel();
        }
    });

    let report = match session.run(source, extractor).await {
        Ok(report) => report,
        Err(e) => {
            error!("Analysis failed: {}", e);
            return Err(e.into());
        }
    };

    for entry in &report.timeline.entries {
        info!(
            at = %format_seconds(entry.timestamp),
            significance = %entry.significance,
            labels = %entry.labels.join(", "),
            "Timeline entry"
        );
    }

    let json = serde_json::to_string_pretty(&report)?;
    match output_path {
        Some(path) => {
            tokio::fs::write(path, json).await?;
            info!("Wrote report to {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Colored output for dev, JSON when `LOG_FORMAT=json`.
fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("emo=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}
