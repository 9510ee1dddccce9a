//! Status polling loop: phase classification, the fast→slow cadence switch,
//! and the consecutive-failure guard.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::TrackerConfig;
use crate::models::job::JobPhase;
use crate::models::result::TranscriptArtifact;
use crate::services::api::{ApiError, JobService, ResultsResponse};
use crate::tracker::consolidate::{merge_results, CompletionSource, Consolidator};
use crate::tracker::JobEvent;

/// Which polling cadence currently owns the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cadence {
    /// Tight interval while the transcript is still pending
    Fast,
    /// Relaxed interval once the transcript is visible and only the summary
    /// remains
    Slow,
}

/// Why the primary polling loop stopped.
pub(super) enum PollExit {
    /// A terminal event was delivered to the consumer
    Settled,
    /// Polling is written off; the history store decides from here
    Reconcile,
    /// The caller cancelled, or the consumer went away
    Abandoned,
}

/// The single task that owns one job's tracking state.
pub(crate) struct PollWorker {
    pub(super) api: Arc<dyn JobService>,
    pub(super) config: TrackerConfig,
    pub(super) job_id: String,
    pub(super) events: mpsc::Sender<JobEvent>,
    pub(super) cancel: CancellationToken,
    pub(super) consolidator: Consolidator,
    /// Transcript captured mid-flight, held for the final merge
    pub(super) partial: Option<TranscriptArtifact>,
}

impl PollWorker {
    pub(crate) fn new(
        api: Arc<dyn JobService>,
        config: TrackerConfig,
        job_id: String,
        events: mpsc::Sender<JobEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            config,
            job_id,
            events,
            cancel,
            consolidator: Consolidator::new(),
            partial: None,
        }
    }

    pub(crate) async fn run(mut self) {
        match self.poll().await {
            PollExit::Settled | PollExit::Abandoned => {}
            PollExit::Reconcile => self.reconcile().await,
        }
    }

    /// Primary polling loop. One `Interval` handle exists at a time; the
    /// fast→slow switch drops it and creates the replacement, so two cadences
    /// can never poll the same job concurrently.
    async fn poll(&mut self) -> PollExit {
        let mut cadence = Cadence::Fast;
        let mut ticker = Self::ticker(self.config.fast_poll_interval());
        let mut last_phase = JobPhase::Submitted;
        let mut failures: u32 = 0;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return PollExit::Abandoned,
                _ = ticker.tick() => {}
            }

            let polled = self.request(self.api.get_status(&self.job_id)).await;
            let status = match polled {
                None => return PollExit::Abandoned,
                Some(Err(err)) => {
                    failures += 1;
                    metrics::counter!("transcript_watch_poll_failures").increment(1);
                    tracing::warn!(
                        job_id = %self.job_id,
                        error = %err,
                        failures,
                        "status poll failed"
                    );
                    if failures >= self.config.max_consecutive_failures {
                        tracing::warn!(
                            job_id = %self.job_id,
                            threshold = self.config.max_consecutive_failures,
                            "failure threshold reached, suspending polling"
                        );
                        return PollExit::Reconcile;
                    }
                    continue;
                }
                Some(Ok(status)) => {
                    failures = 0;
                    status
                }
            };

            metrics::counter!("transcript_watch_polls").increment(1);

            let Some(phase) = JobPhase::parse(&status.status) else {
                // forward compatibility: a phase this client does not know is
                // skipped, not treated as a failure
                tracing::debug!(
                    job_id = %self.job_id,
                    raw = %status.status,
                    "skipping unrecognized phase"
                );
                continue;
            };

            if phase == JobPhase::Error {
                let reason = status
                    .error
                    .unwrap_or_else(|| "job failed without detail".to_string());
                tracing::error!(job_id = %self.job_id, reason = %reason, "job reported failed");
                self.emit(JobEvent::Failed { reason }).await;
                return PollExit::Settled;
            }

            // duplicate or out-of-order responses never regress visible state
            if !phase.advances_from(last_phase) {
                continue;
            }
            last_phase = phase;
            if !self.emit(JobEvent::Phase(phase)).await {
                return PollExit::Abandoned;
            }

            if phase == JobPhase::Completed {
                let fetched = self.request(self.api.get_result(&self.job_id)).await;
                return match fetched {
                    None => PollExit::Abandoned,
                    Some(Ok(results)) => {
                        if self.settle(CompletionSource::Poller, results).await {
                            PollExit::Settled
                        } else {
                            PollExit::Reconcile
                        }
                    }
                    Some(Err(err)) => {
                        tracing::warn!(
                            job_id = %self.job_id,
                            error = %err,
                            "final artifact not retrievable, deferring to history"
                        );
                        PollExit::Reconcile
                    }
                };
            }

            if phase.transcript_available() && self.partial.is_none() {
                let fetched = self.request(self.api.get_result(&self.job_id)).await;
                match fetched {
                    None => return PollExit::Abandoned,
                    Some(Ok(results)) => {
                        if let Some(transcript) = results.into_transcript() {
                            self.partial = Some(transcript.clone());
                            if !self.emit(JobEvent::TranscriptReady(transcript)).await {
                                return PollExit::Abandoned;
                            }
                        } else {
                            tracing::debug!(
                                job_id = %self.job_id,
                                "results do not carry the transcript yet"
                            );
                        }
                    }
                    // the artifact can lag the phase flip; retry next tick
                    Some(Err(err)) => {
                        tracing::debug!(
                            job_id = %self.job_id,
                            error = %err,
                            "transcript not yet retrievable"
                        );
                    }
                }
            }

            if cadence == Cadence::Fast && phase.transcript_available() {
                cadence = Cadence::Slow;
                ticker = Self::ticker(self.config.slow_poll_interval());
                tracing::debug!(job_id = %self.job_id, "switched to slow poll cadence");
            }
        }
    }

    /// Race a service call against cancellation and the per-request deadline.
    ///
    /// `None` means the caller cancelled while the call was in flight; the
    /// response, if one ever arrives, is dropped unobserved. The deadline is
    /// independent of the poll cadence so a hung request cannot starve the
    /// next tick.
    pub(super) async fn request<T>(
        &self,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Option<Result<T, ApiError>> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            outcome = tokio::time::timeout(self.config.request_timeout(), call) => {
                Some(match outcome {
                    Ok(result) => result,
                    Err(_) => Err(ApiError::Timeout),
                })
            }
        }
    }

    /// Apply a completion signal and deliver the terminal event if it won the
    /// consolidator slot. Returns false when the results were unusable.
    pub(super) async fn settle(
        &mut self,
        source: CompletionSource,
        results: ResultsResponse,
    ) -> bool {
        let Some(results) = merge_results(self.partial.take(), results) else {
            tracing::warn!(job_id = %self.job_id, "completion results carried no transcript");
            return false;
        };
        if let Some(completion) = self.consolidator.apply(source, results) {
            metrics::counter!("transcript_watch_completions", "source" => source.as_str())
                .increment(1);
            tracing::info!(
                job_id = %self.job_id,
                source = source.as_str(),
                "job completed"
            );
            self.emit(JobEvent::Completed(completion)).await;
        }
        true
    }

    pub(super) async fn emit(&self, event: JobEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    /// First tick fires one full period after (re)start, never immediately.
    pub(super) fn ticker(period: Duration) -> Interval {
        let mut ticker =
            tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}
