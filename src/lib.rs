//! transcript-watch
//!
//! Client-side engine for tracking long-running audio transcription jobs
//! against a remote transcription/summarization service. A consumer submits a
//! media file, receives a job id, and observes a stream of events: phase
//! transitions, the transcript as soon as it exists, and exactly one terminal
//! completion or failure. The engine polls job status at an adaptive cadence
//! and reconciles against the service's history store when the live status
//! channel goes dark, so a job that actually finished is never reported lost.

pub mod config;
pub mod models;
pub mod services;
pub mod tracker;
