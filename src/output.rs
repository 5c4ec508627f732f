//! Result types returned by the summariser.

use crate::error::{ErrorKind, SummaryError};
use crate::locale::Language;
use crate::media::MediaKind;
use serde::{Deserialize, Serialize};

/// A generated summary plus what the pipeline learned along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutput {
    /// Cleaned Markdown summary.
    pub text: String,
    pub language: Language,
    /// MIME type sent with the upload; empty when it could not be resolved.
    pub media_type: String,
    pub media_kind: MediaKind,
    /// Resource name of the uploaded file, e.g. `files/abc123`.
    pub remote_file: String,
    /// Status re-fetches performed while the file was processing.
    pub status_checks: u32,
    /// Required section numbers (1–3) with no heading in `text`.
    pub missing_sections: Vec<u8>,
    pub stats: SummaryStats,
}

impl SummaryOutput {
    /// `true` when all three requested sections are present.
    pub fn is_complete(&self) -> bool {
        self.missing_sections.is_empty()
    }
}

/// Timings for one request, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Size of the uploaded file.
    pub bytes: u64,
    pub stage_ms: u64,
    pub upload_ms: u64,
    /// Time spent waiting for the service to finish processing.
    pub poll_ms: u64,
    pub generate_ms: u64,
    pub total_ms: u64,
}

/// What the presentation layer renders: one success or one error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryResponse {
    Success {
        /// Localised confirmation line.
        message: String,
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        missing_sections: Vec<u8>,
    },
    Error {
        kind: ErrorKind,
        /// Localised, human-readable message.
        message: String,
    },
}

impl SummaryResponse {
    /// Render a pipeline outcome in `language`.
    pub fn from_result(result: &Result<SummaryOutput, SummaryError>, language: Language) -> Self {
        match result {
            Ok(out) => SummaryResponse::Success {
                message: language.labels().success.to_string(),
                text: out.text.clone(),
                missing_sections: out.missing_sections.clone(),
            },
            Err(e) => SummaryResponse::Error {
                kind: e.kind(),
                message: e.user_message(language),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SummaryResponse::Success { .. })
    }
}
