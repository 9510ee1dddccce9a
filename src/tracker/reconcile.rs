//! History reconciliation: the fallback observer once live polling is
//! written off.
//!
//! The historical record store is served from persistent storage, so it stays
//! answerable while the status channel is unhealthy. A completed record there
//! is authoritative: a job that actually finished is reported complete even
//! if every status poll failed.

use crate::models::history::HistoryStatus;
use crate::tracker::consolidate::CompletionSource;
use crate::tracker::poller::PollWorker;
use crate::tracker::JobEvent;

impl PollWorker {
    /// Query the history store on a coarse cadence until the job settles or
    /// the caller cancels. Primary polling never resumes once this runs.
    pub(super) async fn reconcile(&mut self) {
        tracing::info!(job_id = %self.job_id, "reconciling against history store");
        let mut ticker = Self::ticker(self.config.reconciliation_interval());

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            metrics::counter!("transcript_watch_reconciliation_attempts").increment(1);

            let queried = self
                .request(self.api.list_history(&self.config.owner_scope))
                .await;
            let records = match queried {
                None => return,
                Some(Err(err)) => {
                    tracing::warn!(job_id = %self.job_id, error = %err, "history query failed");
                    continue;
                }
                Some(Ok(records)) => records,
            };

            let Some(record) = records
                .into_iter()
                .find(|record| record.job_id == self.job_id)
            else {
                tracing::debug!(job_id = %self.job_id, "job not present in history yet");
                continue;
            };

            match record.status {
                HistoryStatus::Completed => {
                    // the record's result reference retrieves the artifacts
                    // without any further status polling
                    let result_ref = record.result_ref.unwrap_or_else(|| self.job_id.clone());
                    let fetched = self.request(self.api.get_result(&result_ref)).await;
                    match fetched {
                        None => return,
                        Some(Err(err)) => {
                            tracing::warn!(
                                job_id = %self.job_id,
                                result_ref = %result_ref,
                                error = %err,
                                "completed record found but artifacts not retrievable"
                            );
                        }
                        Some(Ok(results)) => {
                            if self.settle(CompletionSource::Reconciliation, results).await {
                                return;
                            }
                        }
                    }
                }
                HistoryStatus::Failed => {
                    tracing::error!(job_id = %self.job_id, "history records the job as failed");
                    self.emit(JobEvent::Failed {
                        reason: "job recorded as failed in history".to_string(),
                    })
                    .await;
                    return;
                }
                HistoryStatus::InProgress | HistoryStatus::Unknown => {
                    tracing::debug!(
                        job_id = %self.job_id,
                        status = ?record.status,
                        "history record inconclusive"
                    );
                }
            }
        }
    }
}
