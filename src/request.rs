//! Per-request inputs supplied by the UI collaborator.

use crate::locale::Language;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An uploaded file held in memory for the duration of one request.
#[derive(Clone)]
pub struct UploadedBlob {
    pub bytes: Vec<u8>,
    /// Original filename as declared by the uploader.
    pub filename: String,
    /// Declared content type; `None` or blank when the uploader gave none.
    pub content_type: Option<String>,
}

impl UploadedBlob {
    pub fn new(bytes: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: filename.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for UploadedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedBlob")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// What the user told us about the document, plus the output language.
///
/// `major` and `category` are free text. The UI draws them from
/// [`Language::majors`] and [`Language::categories`] but nothing here
/// enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub language: Language,
    pub major: String,
    pub category: String,
}

impl RequestContext {
    pub fn new(language: Language, major: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            language,
            major: major.into(),
            category: category.into(),
        }
    }
}

impl Default for RequestContext {
    /// First major and first category of the primary language.
    fn default() -> Self {
        let language = Language::default();
        Self::new(language, language.majors()[0], language.categories()[0])
    }
}
