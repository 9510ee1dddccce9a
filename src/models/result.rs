use serde::{Deserialize, Serialize};

/// One diarized utterance within a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    #[serde(default)]
    pub speaker: Option<String>,
    /// Start offset in seconds
    #[serde(default)]
    pub start: Option<f64>,
    /// End offset in seconds
    #[serde(default)]
    pub end: Option<f64>,
}

/// Transcript artifact, available before the job reaches terminal success.
///
/// The service delivers transcripts in two shapes depending on the processing
/// path: a bare text body, or text plus structured utterances. Both normalize
/// here; `segments` is empty when the service supplied none. Once captured,
/// the artifact is never retracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptArtifact {
    pub text: String,
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
}

/// Summary derived from the transcript, available only at terminal success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryArtifact {
    pub short_summary: String,
    pub key_points: Vec<String>,
    pub action_items: Vec<String>,
}

/// Merged terminal artifact delivered to the consumer exactly once.
///
/// `summary` is absent when the job ran on the transcription-only path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResults {
    pub transcript: TranscriptArtifact,
    pub summary: Option<SummaryArtifact>,
}
