//! Remote transcription service contract and its HTTP implementation.
//!
//! The tracking engine only ever talks to the service through [`JobService`],
//! so tests can script the remote side and the engine can be reused against
//! any deployment that honors the same operations. [`HttpJobService`] is the
//! production implementation.

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::models::history::HistoryRecord;
use crate::models::result::{SummaryArtifact, TranscriptArtifact, TranscriptSegment};
use crate::services::export::ExportFormat;

/// Field paths a job id has historically appeared under, in priority order.
/// New legacy names go here, not into control flow.
const JOB_ID_FIELDS: &[&[&str]] = &[
    &["job_id"],
    &["process_id"],
    &["data", "job_id"],
    &["data", "process_id"],
];

/// Extract a job id from a submission response body.
///
/// Tries each known field location in order and returns the first non-empty
/// string. `None` means the submission cannot be tracked and must be
/// surfaced as [`ApiError::MissingJobId`], never silently ignored.
pub fn extract_job_id(body: &Value) -> Option<String> {
    JOB_ID_FIELDS.iter().find_map(|path| {
        let mut node = body;
        for key in *path {
            node = node.get(key)?;
        }
        match node.as_str() {
            Some(id) if !id.is_empty() => Some(id.to_string()),
            _ => None,
        }
    })
}

/// Descriptor for a media submission.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// One status query response.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    /// Raw phase string; mapped onto [`crate::models::job::JobPhase`] by the
    /// poller so unknown values stay observable
    pub status: String,

    #[serde(default, alias = "detail")]
    pub error: Option<String>,
}

/// A list of strings that the service sometimes delivers as one
/// newline-joined string instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    List(Vec<String>),
    Text(String),
}

impl StringOrList {
    pub fn into_items(self) -> Vec<String> {
        match self {
            Self::List(items) => items,
            Self::Text(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// A value the service delivers either as a list or as a single bare object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// Results payload as the service returns it. Any field may be absent;
/// summary fields are expected to be absent or empty while summarization is
/// still running.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultsResponse {
    #[serde(default, alias = "text")]
    pub transcription: Option<String>,

    #[serde(default)]
    pub utterances_json: Option<OneOrMany<TranscriptSegment>>,

    /// "pending" while the summary is still being generated
    #[serde(default)]
    pub summary_status: Option<String>,

    #[serde(default)]
    pub short_summary: Option<String>,

    #[serde(default)]
    pub key_points: Option<StringOrList>,

    #[serde(default)]
    pub action_items: Option<StringOrList>,
}

impl ResultsResponse {
    /// Normalize the transcript portion, if the response carried one.
    pub fn into_transcript(self) -> Option<TranscriptArtifact> {
        let text = self.transcription?;
        let segments = self
            .utterances_json
            .map(OneOrMany::into_vec)
            .unwrap_or_default();
        Some(TranscriptArtifact { text, segments })
    }

    /// Normalize the summary portion. `None` while the summary is pending or
    /// when the job ran on the transcription-only path.
    pub fn summary(&self) -> Option<SummaryArtifact> {
        if self.summary_status.as_deref() == Some("pending") {
            return None;
        }
        let short_summary = self.short_summary.clone().unwrap_or_default();
        let key_points = self
            .key_points
            .clone()
            .map(StringOrList::into_items)
            .unwrap_or_default();
        let action_items = self
            .action_items
            .clone()
            .map(StringOrList::into_items)
            .unwrap_or_default();
        if short_summary.is_empty() && key_points.is_empty() && action_items.is_empty() {
            return None;
        }
        Some(SummaryArtifact {
            short_summary,
            key_points,
            action_items,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned HTTP {status}: {detail}")]
    Service { status: u16, detail: String },

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("submission response carried no job id")]
    MissingJobId,

    #[error("artifact for job {job_id} is not yet retrievable")]
    ResultUnavailable { job_id: String },

    #[error("request did not complete within the configured deadline")]
    Timeout,
}

/// Operations the transcription service exposes to this client.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Submit a media file for transcription and return the assigned job id.
    async fn submit(&self, upload: MediaUpload) -> Result<String, ApiError>;

    /// Query the current phase of a job.
    async fn get_status(&self, job_id: &str) -> Result<StatusResponse, ApiError>;

    /// Retrieve whatever results exist for a job. Partial results are valid
    /// responses; [`ApiError::ResultUnavailable`] means nothing is
    /// retrievable yet even though the phase suggested otherwise.
    async fn get_result(&self, job_id: &str) -> Result<ResultsResponse, ApiError>;

    /// List the historical record store for an owner scope. Served from
    /// persistent storage, so it stays answerable while the live status
    /// channel is unhealthy.
    async fn list_history(&self, owner_scope: &str) -> Result<Vec<HistoryRecord>, ApiError>;

    /// Export the final artifact of a completed job in the requested format.
    async fn download(&self, job_id: &str, format: ExportFormat) -> Result<Vec<u8>, ApiError>;
}

/// HTTP client for the transcription service.
pub struct HttpJobService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpJobService {
    /// The request timeout is enforced at the client level, so every call
    /// made through this service carries its own deadline.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("transcript-watch/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn read_success(response: reqwest::Response) -> Result<String, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ApiError::Service {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl JobService for HttpJobService {
    async fn submit(&self, upload: MediaUpload) -> Result<String, ApiError> {
        let part = multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/upload-file", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let body: Value = serde_json::from_str(&Self::read_success(response).await?)?;
        extract_job_id(&body).ok_or(ApiError::MissingJobId)
    }

    async fn get_status(&self, job_id: &str) -> Result<StatusResponse, ApiError> {
        let response = self
            .http
            .get(format!("{}/status/{}", self.base_url, job_id))
            .send()
            .await?;

        Ok(serde_json::from_str(&Self::read_success(response).await?)?)
    }

    async fn get_result(&self, job_id: &str) -> Result<ResultsResponse, ApiError> {
        let response = self
            .http
            .get(format!("{}/results/{}", self.base_url, job_id))
            .send()
            .await?;

        // The service answers 400 between the phase flip and the artifact
        // write; that is "not yet", not a hard failure.
        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            return Err(ApiError::ResultUnavailable {
                job_id: job_id.to_string(),
            });
        }

        Ok(serde_json::from_str(&Self::read_success(response).await?)?)
    }

    async fn list_history(&self, owner_scope: &str) -> Result<Vec<HistoryRecord>, ApiError> {
        let response = self
            .http
            .get(format!("{}/transcriptions", self.base_url))
            .query(&[("owner", owner_scope)])
            .send()
            .await?;

        Ok(serde_json::from_str(&Self::read_success(response).await?)?)
    }

    async fn download(&self, job_id: &str, format: ExportFormat) -> Result<Vec<u8>, ApiError> {
        let response = self
            .http
            .get(format!("{}/download/{}", self.base_url, job_id))
            .query(&[("format", format.to_string())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ApiError::Service {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_id_primary_field_wins() {
        let body = json!({"job_id": "a", "process_id": "b"});
        assert_eq!(extract_job_id(&body), Some("a".to_string()));
    }

    #[test]
    fn job_id_falls_back_to_legacy_field() {
        let body = json!({"status": "processing", "process_id": "b"});
        assert_eq!(extract_job_id(&body), Some("b".to_string()));
    }

    #[test]
    fn job_id_falls_back_to_wrapped_fields() {
        let body = json!({"data": {"job_id": "c"}});
        assert_eq!(extract_job_id(&body), Some("c".to_string()));
        let body = json!({"data": {"process_id": "d"}});
        assert_eq!(extract_job_id(&body), Some("d".to_string()));
    }

    #[test]
    fn empty_job_id_is_missing() {
        let body = json!({"job_id": "", "process_id": "b"});
        assert_eq!(extract_job_id(&body), Some("b".to_string()));
        let body = json!({"job_id": ""});
        assert_eq!(extract_job_id(&body), None);
    }

    #[test]
    fn job_id_absent() {
        let body = json!({"status": "processing"});
        assert_eq!(extract_job_id(&body), None);
        let body = json!({"job_id": 42});
        assert_eq!(extract_job_id(&body), None);
    }

    #[test]
    fn results_accepts_text_alias() {
        let response: ResultsResponse =
            serde_json::from_value(json!({"text": "hello"})).unwrap();
        let transcript = response.into_transcript().unwrap();
        assert_eq!(transcript.text, "hello");
        assert!(transcript.segments.is_empty());
    }

    #[test]
    fn results_accepts_single_utterance_object() {
        let response: ResultsResponse = serde_json::from_value(json!({
            "transcription": "hello",
            "utterances_json": {"text": "hello", "speaker": "A"}
        }))
        .unwrap();
        let transcript = response.into_transcript().unwrap();
        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(transcript.segments[0].speaker.as_deref(), Some("A"));
    }

    #[test]
    fn key_points_as_newline_string_normalize() {
        let response: ResultsResponse = serde_json::from_value(json!({
            "transcription": "hello",
            "short_summary": "s",
            "key_points": "first\n\n  second  \n",
            "action_items": ["do it"]
        }))
        .unwrap();
        let summary = response.summary().unwrap();
        assert_eq!(summary.key_points, vec!["first", "second"]);
        assert_eq!(summary.action_items, vec!["do it"]);
    }

    #[test]
    fn pending_summary_is_none() {
        let response: ResultsResponse = serde_json::from_value(json!({
            "transcription": "hello",
            "summary_status": "pending",
            "short_summary": "",
            "key_points": [],
            "action_items": []
        }))
        .unwrap();
        assert!(response.summary().is_none());
    }

    #[test]
    fn absent_summary_fields_are_none() {
        let response: ResultsResponse =
            serde_json::from_value(json!({"transcription": "hello"})).unwrap();
        assert!(response.summary().is_none());
    }

    #[test]
    fn transcript_absent_is_none() {
        let response: ResultsResponse =
            serde_json::from_value(json!({"short_summary": "s"})).unwrap();
        assert!(response.into_transcript().is_none());
    }
}
