use serde::{Deserialize, Serialize};

/// Coarse-grained stage of a remote transcription job.
///
/// Phases advance strictly forward in declaration order, except `Error`,
/// which is reachable from any non-terminal phase and carries no position in
/// the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobPhase {
    Submitted,
    ProcessingMedia,
    Transcribing,
    TranscriptReady,
    Summarizing,
    Completed,
    Error,
}

impl JobPhase {
    /// Map a phase string from the remote service onto the enum.
    ///
    /// The backend has renamed phases over time; every name it has ever
    /// emitted is accepted. Unrecognized strings return `None` so that new
    /// server-side phases are skipped rather than treated as failures.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "uploaded" | "submitted" => Some(Self::Submitted),
            "processing_audio" | "processing_media" => Some(Self::ProcessingMedia),
            "transcribing" => Some(Self::Transcribing),
            "transcription_complete" | "transcript_ready" => Some(Self::TranscriptReady),
            "summarizing" => Some(Self::Summarizing),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Position in the forward phase order. `Error` has none.
    pub fn ordinal(self) -> Option<u8> {
        match self {
            Self::Submitted => Some(0),
            Self::ProcessingMedia => Some(1),
            Self::Transcribing => Some(2),
            Self::TranscriptReady => Some(3),
            Self::Summarizing => Some(4),
            Self::Completed => Some(5),
            Self::Error => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Whether the transcript artifact is expected to exist at this phase.
    pub fn transcript_available(self) -> bool {
        matches!(self, Self::TranscriptReady | Self::Summarizing | Self::Completed)
    }

    /// True when observing `self` after `last` is a genuine forward step.
    ///
    /// Duplicate and out-of-order status responses compare equal-or-earlier
    /// and are dropped by the caller. `Error` counts as an advance from any
    /// non-terminal phase.
    pub fn advances_from(self, last: JobPhase) -> bool {
        match (self.ordinal(), last.ordinal()) {
            (Some(new), Some(old)) => new > old,
            (None, Some(_)) => !last.is_terminal(),
            // a job already in error never advances
            (_, None) => false,
        }
    }
}
