//! Media classification: filename / declared content type → MIME string.
//!
//! The remote service needs a MIME type with every upload. A browser or HTTP
//! client usually declares one; when it does, that value wins untouched. When
//! it does not, the file extension is looked up in a small fixed table. An
//! unknown extension yields an empty string rather than an error: the remote
//! service is the authority on what it accepts.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions the upload form offers. Informational only; [`classify`]
/// never rejects a file.
pub const SUPPORTED_EXTENSIONS: &[&str] =
    &["pdf", "png", "jpg", "jpeg", "mp4", "mp3", "wav", "m4a"];

/// Broad media category of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Pdf,
    Image,
    Audio,
    Video,
    Unknown,
}

impl MediaKind {
    /// Derive the kind from a MIME string.
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_ascii_lowercase();
        if mime == "application/pdf" {
            MediaKind::Pdf
        } else if mime.starts_with("image/") {
            MediaKind::Image
        } else if mime.starts_with("audio/") {
            MediaKind::Audio
        } else if mime.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Unknown
        }
    }

    /// Audio and video normally need server-side processing before use.
    pub fn is_time_based(self) -> bool {
        matches!(self, MediaKind::Audio | MediaKind::Video)
    }
}

/// Resolve the MIME type to send for `filename`.
///
/// A non-blank `declared` type is returned unchanged. Otherwise the
/// extension is mapped through the fixed table; anything else gives `""`.
pub fn classify(filename: &str, declared: Option<&str>) -> String {
    if let Some(declared) = declared {
        if !declared.trim().is_empty() {
            return declared.to_string();
        }
    }
    mime_for_extension(&extension_of(filename)).to_string()
}

/// Lowercased extension of `filename` without the dot, or `""`.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" | "png" => "image/jpeg",
        "mp4" => "video/mp4",
        "mp3" | "wav" | "m4a" => "audio/mp3",
        _ => "",
    }
}
