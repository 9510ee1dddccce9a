//! Command-line consumer: submit an audio file, watch the job through to a
//! merged transcript + summary, and export the final artifact.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use transcript_watch::config::TrackerConfig;
use transcript_watch::services::api::{HttpJobService, MediaUpload};
use transcript_watch::services::export::{self, ExportFormat};
use transcript_watch::tracker::{JobEvent, JobTracker};

#[derive(Parser)]
#[command(
    name = "transcript-watch",
    about = "Track a remote transcription job until its artifacts are available"
)]
struct Cli {
    /// Audio file to submit for transcription
    file: PathBuf,

    /// Export format for the final artifact
    #[arg(long, default_value = "txt")]
    format: ExportFormat,
}

/// Best-effort MIME type from the file extension; the service only needs a
/// coarse audio/video hint.
fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/x-m4a",
        Some("mp4") => "video/mp4",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = TrackerConfig::from_env().expect("Failed to load configuration");

    let api = Arc::new(
        HttpJobService::new(&config.api_base_url, config.request_timeout())
            .expect("Failed to initialize service client"),
    );

    let bytes = std::fs::read(&cli.file).expect("Failed to read input file");
    let file_name = cli
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();

    let upload = MediaUpload {
        file_name: file_name.clone(),
        content_type: content_type_for(&cli.file).to_string(),
        bytes,
    };

    let tracker = JobTracker::new(api.clone(), config);

    let mut job = tracker
        .submit_and_track(upload)
        .await
        .expect("Submission failed");

    tracing::info!(job_id = %job.job_id(), file = %file_name, "tracking job");

    while let Some(event) = job.next_event().await {
        match event {
            JobEvent::Phase(phase) => {
                tracing::info!(job_id = %job.job_id(), phase = %phase, "phase advanced");
            }
            JobEvent::TranscriptReady(transcript) => {
                println!("\n--- transcript ---\n{}", transcript.text);
            }
            JobEvent::Completed(completion) => {
                if let Some(summary) = &completion.results.summary {
                    println!("\n--- summary ---\n{}", summary.short_summary);
                    for point in &summary.key_points {
                        println!("- {point}");
                    }
                    if !summary.action_items.is_empty() {
                        println!("\naction items:");
                        for item in &summary.action_items {
                            println!("- {item}");
                        }
                    }
                }

                let (filename, bytes) =
                    export::download_artifact(&*api, job.job_id(), Some(&file_name), cli.format)
                        .await
                        .expect("Failed to export artifact");
                std::fs::write(&filename, bytes).expect("Failed to write artifact");
                tracing::info!(file = %filename, "artifact exported");
                break;
            }
            JobEvent::Failed { reason } => {
                tracing::error!(job_id = %job.job_id(), reason = %reason, "transcription failed");
                std::process::exit(1);
            }
        }
    }
}
