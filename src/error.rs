//! Error types for the unishare-summarizer library.
//!
//! Every stage of the pipeline reports failure through [`SummaryError`]. The
//! orchestrator catches the first one, releases the staged upload, and hands
//! it back as the single outcome of the request. Callers that need to branch
//! on the cause use [`SummaryError::kind`]; callers that only need something
//! to show the user use [`SummaryError::user_message`], which is localised.
//!
//! None of these errors is retried by the library.

use crate::locale::Language;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the unishare-summarizer library.
#[derive(Debug, Error)]
pub enum SummaryError {
    // ── Pre-pipeline ──────────────────────────────────────────────────────
    /// No service credential is configured. Raised before anything is staged.
    #[error("Inference service credential is missing.\nSet GOOGLE_API_KEY (or GEMINI_API_KEY) or pass --api-key.")]
    MissingCredential,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Local staging ─────────────────────────────────────────────────────
    /// The upload could not be written to (or read from) the staging area.
    #[error("Failed to stage upload '{filename}': {source}")]
    StageFailed {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    /// A local input file could not be read.
    #[error("Failed to read input file '{path}': {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Remote service ────────────────────────────────────────────────────
    /// Network or protocol failure while uploading the file or polling it.
    #[error("Transfer to inference service failed: {0}")]
    TransferFailed(String),

    /// The service reported a terminal failure instead of readiness.
    #[error("Remote processing of '{name}' failed: {reason}")]
    RemoteProcessingFailed { name: String, reason: String },

    /// The poll bound was exhausted while the file was still processing.
    #[error("File '{name}' was still processing after {polls} status checks")]
    Timeout { name: String, polls: u32 },

    /// The generation call failed (quota, malformed input, network fault, …).
    #[error("Summary generation failed: {0}")]
    GenerationFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Unexpected(String),
}

/// Coarse failure category carried in the UI-facing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingCredential,
    StageFailure,
    TransferFailure,
    RemoteProcessingFailure,
    Timeout,
    GenerationFailure,
    Unexpected,
}

impl SummaryError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SummaryError::MissingCredential => ErrorKind::MissingCredential,
            SummaryError::StageFailed { .. } | SummaryError::InputUnreadable { .. } => {
                ErrorKind::StageFailure
            }
            SummaryError::TransferFailed(_) => ErrorKind::TransferFailure,
            SummaryError::RemoteProcessingFailed { .. } => ErrorKind::RemoteProcessingFailure,
            SummaryError::Timeout { .. } => ErrorKind::Timeout,
            SummaryError::GenerationFailed(_) => ErrorKind::GenerationFailure,
            SummaryError::InvalidConfig(_) | SummaryError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// A single human-readable message for the end user.
    ///
    /// The localised headline comes from the language's label table; the
    /// technical detail is appended except for a missing credential, whose
    /// message is shown verbatim.
    pub fn user_message(&self, language: Language) -> String {
        let labels = language.labels();
        let headline = match self.kind() {
            ErrorKind::MissingCredential => return labels.error_credential.to_string(),
            ErrorKind::StageFailure => labels.error_stage,
            ErrorKind::TransferFailure => labels.error_transfer,
            ErrorKind::RemoteProcessingFailure => labels.error_remote,
            ErrorKind::Timeout => labels.error_timeout,
            ErrorKind::GenerationFailure => labels.error_generation,
            ErrorKind::Unexpected => labels.error_unexpected,
        };
        format!("{headline} ({self})")
    }
}
