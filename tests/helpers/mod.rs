//! Test doubles and fixtures for driving the tracking engine without a live
//! transcription service.

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use transcript_watch::config::TrackerConfig;
use transcript_watch::models::history::{HistoryRecord, HistoryStatus};
use transcript_watch::services::api::{
    ApiError, JobService, MediaUpload, ResultsResponse, StatusResponse,
};
use transcript_watch::services::export::ExportFormat;
use transcript_watch::tracker::{JobEvent, TrackedJob};

/// One scripted reply to a status poll.
#[derive(Debug, Clone)]
pub enum StatusStep {
    Phase(&'static str),
    PhaseWithError(&'static str, &'static str),
    /// Transient failure (network/5xx)
    Fail,
}

/// Scripted in-memory stand-in for the remote service.
///
/// Status and result replies are consumed in script order; once a script is
/// exhausted its last reply repeats, the way a live server keeps answering
/// its current state. Call counters are public so tests can assert on load.
pub struct ScriptedService {
    statuses: Mutex<VecDeque<StatusStep>>,
    last_status: Mutex<Option<StatusStep>>,
    results: Mutex<VecDeque<Result<serde_json::Value, ()>>>,
    last_result: Mutex<Option<Result<serde_json::Value, ()>>>,
    history: Mutex<Vec<HistoryRecord>>,
    status_delay: Option<Duration>,
    pub status_calls: AtomicUsize,
    pub result_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
    /// Ids passed to `get_result`, in call order
    pub result_ids: Mutex<Vec<String>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self {
            statuses: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(None),
            results: Mutex::new(VecDeque::new()),
            last_result: Mutex::new(None),
            history: Mutex::new(Vec::new()),
            status_delay: None,
            status_calls: AtomicUsize::new(0),
            result_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
            result_ids: Mutex::new(Vec::new()),
        }
    }

    pub fn with_statuses(self, steps: impl IntoIterator<Item = StatusStep>) -> Self {
        self.statuses.lock().unwrap().extend(steps);
        self
    }

    pub fn with_results(
        self,
        replies: impl IntoIterator<Item = Result<serde_json::Value, ()>>,
    ) -> Self {
        self.results.lock().unwrap().extend(replies);
        self
    }

    pub fn with_history(self, records: Vec<HistoryRecord>) -> Self {
        *self.history.lock().unwrap() = records;
        self
    }

    /// Make every status request hang for `delay` before answering, to model
    /// an in-flight response.
    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    fn next_status(&self) -> StatusStep {
        let mut script = self.statuses.lock().unwrap();
        match script.pop_front() {
            Some(step) => {
                *self.last_status.lock().unwrap() = Some(step.clone());
                step
            }
            None => self
                .last_status
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(StatusStep::Fail),
        }
    }

    fn next_result(&self) -> Result<serde_json::Value, ()> {
        let mut script = self.results.lock().unwrap();
        match script.pop_front() {
            Some(reply) => {
                *self.last_result.lock().unwrap() = Some(reply.clone());
                reply
            }
            None => self.last_result.lock().unwrap().clone().unwrap_or(Err(())),
        }
    }
}

#[async_trait]
impl JobService for ScriptedService {
    async fn submit(&self, _upload: MediaUpload) -> Result<String, ApiError> {
        Ok("job-1".to_string())
    }

    async fn get_status(&self, _job_id: &str) -> Result<StatusResponse, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        match self.next_status() {
            StatusStep::Phase(phase) => Ok(StatusResponse {
                status: phase.to_string(),
                error: None,
            }),
            StatusStep::PhaseWithError(phase, error) => Ok(StatusResponse {
                status: phase.to_string(),
                error: Some(error.to_string()),
            }),
            StatusStep::Fail => Err(ApiError::Service {
                status: 502,
                detail: "scripted outage".to_string(),
            }),
        }
    }

    async fn get_result(&self, job_id: &str) -> Result<ResultsResponse, ApiError> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        self.result_ids.lock().unwrap().push(job_id.to_string());
        match self.next_result() {
            Ok(body) => Ok(serde_json::from_value(body).expect("scripted results must parse")),
            Err(()) => Err(ApiError::ResultUnavailable {
                job_id: job_id.to_string(),
            }),
        }
    }

    async fn list_history(&self, _owner_scope: &str) -> Result<Vec<HistoryRecord>, ApiError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.history.lock().unwrap().clone())
    }

    async fn download(&self, _job_id: &str, _format: ExportFormat) -> Result<Vec<u8>, ApiError> {
        Ok(b"exported".to_vec())
    }
}

/// Results body while the summary is still pending.
pub fn partial_results() -> serde_json::Value {
    json!({
        "transcription": "hello",
        "summary_status": "pending",
        "short_summary": "",
        "key_points": [],
        "action_items": []
    })
}

/// Results body after summarization finished.
pub fn final_results() -> serde_json::Value {
    json!({
        "transcription": "hello",
        "utterances_json": [{"text": "hello", "speaker": "A"}],
        "summary_status": "complete",
        "short_summary": "a quick standup",
        "key_points": ["one decision"],
        "action_items": ["ship it"]
    })
}

pub fn completed_record(job_id: &str, result_ref: Option<&str>) -> HistoryRecord {
    HistoryRecord {
        job_id: job_id.to_string(),
        status: HistoryStatus::Completed,
        result_ref: result_ref.map(str::to_string),
        original_filename: Some("standup.mp3".to_string()),
        created_at: None,
    }
}

/// An unrelated completed job belonging to the same owner scope.
pub fn noise_record() -> HistoryRecord {
    let id = Uuid::new_v4().to_string();
    HistoryRecord {
        job_id: id.clone(),
        status: HistoryStatus::Completed,
        result_ref: Some(id),
        original_filename: None,
        created_at: None,
    }
}

pub fn test_config() -> TrackerConfig {
    TrackerConfig {
        api_base_url: "http://scripted.invalid".to_string(),
        owner_scope: "tester".to_string(),
        fast_poll_interval_ms: 1_000,
        slow_poll_interval_ms: 5_000,
        max_consecutive_failures: 3,
        request_timeout_ms: 10_000,
        reconciliation_interval_ms: 10_000,
    }
}

/// Drain events until the worker finishes and closes the channel. Only valid
/// for scripts that settle or cancel the job.
pub async fn drain_events(job: &mut TrackedJob) -> Vec<JobEvent> {
    let mut events = Vec::new();
    while let Some(event) = job.next_event().await {
        events.push(event);
    }
    events
}

pub fn phases_of(events: &[JobEvent]) -> Vec<transcript_watch::models::job::JobPhase> {
    events
        .iter()
        .filter_map(|event| match event {
            JobEvent::Phase(phase) => Some(*phase),
            _ => None,
        })
        .collect()
}
