//! Exporting the final artifact of a completed job.

use chrono::Utc;
use std::path::Path;

use crate::services::api::{ApiError, JobService};

/// Textual formats the final artifact can be exported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    Txt,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Pdf => "pdf",
        }
    }
}

/// Derive the filename for an exported artifact.
///
/// Uses the stem of the originally uploaded file when it is known, otherwise
/// a timestamp-based default.
pub fn export_filename(original_name: Option<&str>, format: ExportFormat) -> String {
    if let Some(name) = original_name {
        let stem = Path::new(name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(name);
        if !stem.is_empty() {
            return format!("{}.{}", stem, format.extension());
        }
    }
    format!(
        "transcription_{}.{}",
        Utc::now().format("%Y-%m-%d"),
        format.extension()
    )
}

/// Download the final artifact and pair it with its derived filename.
pub async fn download_artifact(
    api: &(impl JobService + ?Sized),
    job_id: &str,
    original_name: Option<&str>,
    format: ExportFormat,
) -> Result<(String, Vec<u8>), ApiError> {
    let bytes = api.download(job_id, format).await?;
    Ok((export_filename(original_name, format), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn filename_uses_original_stem() {
        assert_eq!(
            export_filename(Some("standup recording.mp3"), ExportFormat::Txt),
            "standup recording.txt"
        );
        assert_eq!(
            export_filename(Some("notes.v2.m4a"), ExportFormat::Pdf),
            "notes.v2.pdf"
        );
    }

    #[test]
    fn filename_without_original_is_timestamped() {
        let name = export_filename(None, ExportFormat::Txt);
        assert!(name.starts_with("transcription_"));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn format_round_trips_through_strings() {
        assert_eq!(ExportFormat::Txt.to_string(), "txt");
        assert_eq!(ExportFormat::from_str("pdf").unwrap(), ExportFormat::Pdf);
        assert!(ExportFormat::from_str("docx").is_err());
    }
}
