use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status recorded for a job in the historical record store.
///
/// Only `Completed` is authoritative for reconciliation. Anything the store
/// reports that this client does not recognize deserializes as `Unknown` and
/// is treated as inconclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    Completed,
    InProgress,
    Failed,
    #[serde(other)]
    Unknown,
}

/// A read from the historical record store, keyed by job id.
///
/// When `status` is `Completed`, `result_ref` identifies the final artifacts
/// without any further status polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(alias = "process_id")]
    pub job_id: String,

    pub status: HistoryStatus,

    #[serde(default)]
    pub result_ref: Option<String>,

    /// Name of the originally uploaded media file, when the store kept it
    #[serde(default)]
    pub original_filename: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
