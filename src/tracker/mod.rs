//! Job tracking engine.
//!
//! One worker task owns each tracked job: it polls status on a fast cadence,
//! switches to a slow cadence once the transcript is visible, and hands over
//! to history reconciliation when the live status channel stops answering.
//! The consumer observes the job purely through the event stream on
//! [`TrackedJob`].

pub mod consolidate;
pub mod poller;
pub mod reconcile;

pub use consolidate::{Completion, CompletionSource};

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::TrackerConfig;
use crate::models::job::JobPhase;
use crate::models::result::TranscriptArtifact;
use crate::services::api::{ApiError, JobService, MediaUpload};
use poller::PollWorker;

/// Events delivered to the consumer while a job is tracked.
///
/// At most one of `Completed`/`Failed` is ever delivered per job, and
/// `TranscriptReady` always precedes `Completed` when both occur.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// The job advanced to a new phase
    Phase(JobPhase),
    /// The transcript exists and was retrieved, ahead of the summary
    TranscriptReady(TranscriptArtifact),
    /// Terminal success with the merged artifacts
    Completed(Completion),
    /// Terminal failure reported by the remote system
    Failed { reason: String },
}

/// Tracks transcription jobs against a remote service.
pub struct JobTracker {
    api: Arc<dyn JobService>,
    config: TrackerConfig,
}

impl JobTracker {
    pub fn new(api: Arc<dyn JobService>, config: TrackerConfig) -> Self {
        Self { api, config }
    }

    /// Submit a media file and return the assigned job id.
    pub async fn submit(&self, upload: MediaUpload) -> Result<String, ApiError> {
        let job_id = self.api.submit(upload).await?;
        metrics::counter!("transcript_watch_submissions").increment(1);
        tracing::info!(job_id = %job_id, "transcription job submitted");
        Ok(job_id)
    }

    /// Submit a media file and immediately begin tracking it.
    pub async fn submit_and_track(&self, upload: MediaUpload) -> Result<TrackedJob, ApiError> {
        let job_id = self.submit(upload).await?;
        Ok(self.track(job_id))
    }

    /// Begin tracking an already-submitted job.
    ///
    /// Spawns the single worker task that owns this job's tracking state.
    pub fn track(&self, job_id: impl Into<String>) -> TrackedJob {
        let job_id = job_id.into();
        let (events, receiver) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let worker = PollWorker::new(
            Arc::clone(&self.api),
            self.config.clone(),
            job_id.clone(),
            events,
            cancel.clone(),
        );
        tokio::spawn(worker.run());

        TrackedJob {
            job_id,
            events: receiver,
            cancel,
        }
    }
}

/// Consumer handle for one tracked job.
///
/// Dropping the handle cancels tracking: all timers for the job stop and any
/// in-flight response is discarded without touching observable state.
pub struct TrackedJob {
    job_id: String,
    events: mpsc::Receiver<JobEvent>,
    cancel: CancellationToken,
}

impl TrackedJob {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Next event, or `None` once the job reached a terminal state or
    /// tracking was cancelled.
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        self.events.recv().await
    }

    /// Stop tracking this job. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TrackedJob {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
