//! At-most-one completion delivery.
//!
//! Two independent observers can find out that a job finished: the status
//! poller seeing the `completed` phase, and the reconciliation engine finding
//! a completed record in the history store. The consolidator is a write-once
//! slot; whichever signal arrives first wins and every later signal is
//! ignored, so the consumer sees exactly one completion per job.

use chrono::{DateTime, Utc};
use std::sync::OnceLock;

use crate::models::result::{JobResults, TranscriptArtifact};
use crate::services::api::ResultsResponse;

/// Which observer delivered the winning completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSource {
    Poller,
    Reconciliation,
}

impl CompletionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poller => "poller",
            Self::Reconciliation => "reconciliation",
        }
    }
}

/// The terminal artifact handed to the consumer.
#[derive(Debug, Clone)]
pub struct Completion {
    pub source: CompletionSource,
    pub results: JobResults,
    /// Stamped exactly once, inside the winning write
    pub completed_at: DateTime<Utc>,
}

/// Write-once completion slot for one job.
#[derive(Debug, Default)]
pub struct Consolidator {
    slot: OnceLock<Completion>,
}

impl Consolidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a completion signal. Returns the completion when this call won
    /// the slot; `None` when a completion was already applied, which callers
    /// ignore rather than treat as an error.
    pub fn apply(&self, source: CompletionSource, results: JobResults) -> Option<Completion> {
        let mut won = false;
        let completion = self.slot.get_or_init(|| {
            won = true;
            Completion {
                source,
                results,
                completed_at: Utc::now(),
            }
        });
        won.then(|| completion.clone())
    }

    pub fn completed(&self) -> Option<&Completion> {
        self.slot.get()
    }
}

/// Merge the transcript captured mid-flight with the final results.
///
/// The partial artifact, when one was held, is preferred over re-deriving the
/// transcript from the final response; when no partial was ever captured the
/// full response supplies it. `None` means the response carried no transcript
/// at all and cannot settle the job.
pub fn merge_results(
    partial: Option<TranscriptArtifact>,
    results: ResultsResponse,
) -> Option<JobResults> {
    let summary = results.summary();
    let transcript = match partial {
        Some(transcript) => transcript,
        None => results.into_transcript()?,
    };
    Some(JobResults {
        transcript,
        summary,
    })
}
