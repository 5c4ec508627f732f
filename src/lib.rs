//! # unishare-summarizer
//!
//! Turn an uploaded study document, image, or recording into a structured,
//! three-section summary using Google Gemini, in English or Arabic.
//!
//! ## Pipeline Overview
//!
//! ```text
//! UploadedBlob
//!  │
//!  ├─ 1. Stage      write bytes to a unique temp file (spawn_blocking)
//!  ├─ 2. Classify   declared content type, else extension → MIME
//!  ├─ 3. Submit     resumable upload to the Gemini File API
//!  ├─ 4. Poll       re-fetch status every 2 s until ACTIVE / FAILED / bound
//!  ├─ 5. Generate   one generateContent call with the localised prompt
//!  ├─ 6. Polish     fence stripping, whitespace, section check
//!  └─ 7. Release    temp file removed on every path, then Done / Errored
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use unishare_summarizer::{summarize_file, Language, RequestContext, SummaryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential from GOOGLE_API_KEY / GEMINI_API_KEY
//!     let config = SummaryConfig::from_env()?;
//!     let ctx = RequestContext::new(Language::Arabic, "Medicine", "Past Exam");
//!     let output = summarize_file("exam.pdf", None, &ctx, &config).await?;
//!     println!("{}", output.text);
//!     eprintln!("{} status checks, {}ms", output.status_checks, output.stats.total_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `summarize` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! unishare-summarizer = { version = "0.1", default-features = false }
//! ```
//!
//! ## Supported Media
//!
//! | Extension | MIME sent | Typical processing time |
//! |-----------|-----------|-------------------------|
//! | `pdf` | `application/pdf` | ready on upload |
//! | `png` `jpg` `jpeg` | `image/jpeg` | ready on upload |
//! | `mp3` `wav` `m4a` | `audio/mp3` | seconds |
//! | `mp4` | `video/mp4` | seconds to minutes |
//!
//! Any other file is uploaded with no MIME type and the service decides.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod locale;
pub mod media;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod request;
pub mod summarize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ApiKey, SummaryConfig, SummaryConfigBuilder};
pub use error::{ErrorKind, SummaryError};
pub use locale::{Labels, Language};
pub use media::{classify, MediaKind};
pub use output::{SummaryOutput, SummaryResponse, SummaryStats};
pub use pipeline::gemini::GeminiClient;
pub use pipeline::remote::{FileState, InferenceService, PollPolicy, ReadyFile, RemoteFile};
pub use progress::{NoopObserver, ObserverHandle, PipelineObserver, PipelineState};
pub use prompts::{compose, Prompt};
pub use request::{RequestContext, UploadedBlob};
pub use summarize::{respond, summarize, summarize_file, summarize_sync, summarize_with};
