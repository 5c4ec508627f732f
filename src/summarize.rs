//! Summarisation entry points and the pipeline orchestrator.
//!
//! One request runs strictly in sequence:
//!
//! ```text
//! Idle → Staged → Classified → Submitted → (Polling) → Ready → Generating → Done
//!                         any failure ─────────────────────────────────────▶ Errored
//! ```
//!
//! The first error from any stage ends the request. Whatever the outcome,
//! the staged file is released before `Done` or `Errored` is reported, and
//! the error is logged once here with its [`crate::ErrorKind`].

use crate::config::SummaryConfig;
use crate::error::SummaryError;
use crate::media::{self, MediaKind};
use crate::output::{SummaryOutput, SummaryResponse, SummaryStats};
use crate::pipeline::gemini::GeminiClient;
use crate::pipeline::remote::{self, FileState, InferenceService, Readiness};
use crate::pipeline::staging::{self, StagedFile};
use crate::pipeline::{generate, postprocess};
use crate::progress::{NoopObserver, PipelineObserver, PipelineState};
use crate::prompts;
use crate::request::{RequestContext, UploadedBlob};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Summarise an uploaded file with the Gemini service described by `config`.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns [`SummaryError::MissingCredential`] before touching the disk when
/// no key is configured; otherwise the first error raised by any stage.
///
/// # Example
/// ```rust,no_run
/// use unishare_summarizer::{summarize, Language, RequestContext, SummaryConfig, UploadedBlob};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SummaryConfig::from_env()?;
/// let blob = UploadedBlob::new(std::fs::read("lecture.pdf")?, "lecture.pdf");
/// let ctx = RequestContext::new(Language::English, "Computer Science", "Lecture Notes");
/// let out = summarize(blob, &ctx, &config).await?;
/// println!("{}", out.text);
/// # Ok(())
/// # }
/// ```
pub async fn summarize(
    blob: UploadedBlob,
    ctx: &RequestContext,
    config: &SummaryConfig,
) -> Result<SummaryOutput, SummaryError> {
    let client = match GeminiClient::new(config) {
        Ok(c) => c,
        Err(e) => return Err(fail(observer_of(config), e)),
    };
    summarize_with(&client, blob, ctx, config).await
}

/// Run the pipeline against any [`InferenceService`].
pub async fn summarize_with(
    service: &dyn InferenceService,
    blob: UploadedBlob,
    ctx: &RequestContext,
    config: &SummaryConfig,
) -> Result<SummaryOutput, SummaryError> {
    let observer = observer_of(config);
    let total_start = Instant::now();

    if let Err(e) = config.require_api_key() {
        return Err(fail(observer, e));
    }

    info!(
        "Summarising {} ({} bytes, {})",
        blob.filename,
        blob.len(),
        ctx.language.code()
    );

    // ── Step 1: Stage ────────────────────────────────────────────────────
    let stage_start = Instant::now();
    let mut staged = match staging::stage(blob, config.staging_dir.as_deref()).await {
        Ok(s) => s,
        Err(e) => return Err(fail(observer, e)),
    };
    let stage_ms = stage_start.elapsed().as_millis() as u64;
    transition(observer, PipelineState::Staged);

    // ── Steps 2–6: Remote work ───────────────────────────────────────────
    let result = run_remote(service, &staged, ctx, config, observer).await;

    // ── Step 7: Release, before any terminal state ───────────────────────
    staged.release();

    match result {
        Ok(mut output) => {
            output.stats.stage_ms = stage_ms;
            output.stats.total_ms = total_start.elapsed().as_millis() as u64;
            info!(
                "Summary complete: {} chars, {} status checks, {}ms total",
                output.text.chars().count(),
                output.status_checks,
                output.stats.total_ms
            );
            transition(observer, PipelineState::Done);
            Ok(output)
        }
        Err(e) => Err(fail(observer, e)),
    }
}

/// Read a local file and summarise it.
///
/// `content_type` is the declared MIME type, if known; otherwise it is
/// resolved from the extension.
pub async fn summarize_file(
    path: impl AsRef<Path>,
    content_type: Option<&str>,
    ctx: &RequestContext,
    config: &SummaryConfig,
) -> Result<SummaryOutput, SummaryError> {
    let path = path.as_ref();
    if let Err(e) = config.require_api_key() {
        return Err(fail(observer_of(config), e));
    }

    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(source) => {
            let e = SummaryError::InputUnreadable {
                path: path.to_path_buf(),
                source,
            };
            return Err(fail(observer_of(config), e));
        }
    };
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let mut blob = UploadedBlob::new(bytes, filename);
    if let Some(ct) = content_type.filter(|c| !c.trim().is_empty()) {
        blob = blob.with_content_type(ct);
    }
    summarize(blob, ctx, config).await
}

/// Synchronous wrapper around [`summarize`].
///
/// Creates a temporary tokio runtime internally.
pub fn summarize_sync(
    blob: UploadedBlob,
    ctx: &RequestContext,
    config: &SummaryConfig,
) -> Result<SummaryOutput, SummaryError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SummaryError::Unexpected(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(summarize(blob, ctx, config))
}

/// Summarise and render the outcome for the presentation layer.
pub async fn respond(
    blob: UploadedBlob,
    ctx: &RequestContext,
    config: &SummaryConfig,
) -> SummaryResponse {
    let result = summarize(blob, ctx, config).await;
    SummaryResponse::from_result(&result, ctx.language)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn observer_of(config: &SummaryConfig) -> &dyn PipelineObserver {
    match config.observer.as_deref() {
        Some(obs) => obs,
        None => &NoopObserver,
    }
}

fn transition(observer: &dyn PipelineObserver, state: PipelineState) {
    debug!("Pipeline → {}", state);
    observer.on_state(state);
}

fn fail(observer: &dyn PipelineObserver, e: SummaryError) -> SummaryError {
    warn!("Summary failed ({:?}): {}", e.kind(), e);
    transition(observer, PipelineState::Errored);
    e
}

/// Classify, upload, wait, generate and clean up the text.
async fn run_remote(
    service: &dyn InferenceService,
    staged: &StagedFile,
    ctx: &RequestContext,
    config: &SummaryConfig,
    observer: &dyn PipelineObserver,
) -> Result<SummaryOutput, SummaryError> {
    let mut stats = SummaryStats {
        bytes: staged.size(),
        ..SummaryStats::default()
    };

    // ── Step 2: Classify ─────────────────────────────────────────────────
    let media_type = media::classify(staged.original_name(), staged.declared_type());
    if media_type.is_empty() {
        debug!(
            "No MIME type for {}; the service will infer it",
            staged.original_name()
        );
    }
    let declared_kind = MediaKind::from_mime(&media_type);
    transition(observer, PipelineState::Classified);

    // ── Step 3: Submit ───────────────────────────────────────────────────
    let upload_start = Instant::now();
    let handle =
        remote::submit(service, staged.path(), &media_type, staged.original_name()).await?;
    stats.upload_ms = upload_start.elapsed().as_millis() as u64;
    transition(observer, PipelineState::Submitted);

    // ── Step 4: Wait for readiness ───────────────────────────────────────
    let poll_start = Instant::now();
    if handle.state == FileState::Processing {
        if declared_kind.is_time_based() {
            info!(
                "Waiting for {} to finish processing {:?} media",
                handle.name, declared_kind
            );
        }
        transition(observer, PipelineState::Polling);
    }
    let Readiness { file, polls } =
        remote::await_ready(service, handle, &config.poll, observer).await?;
    stats.poll_ms = poll_start.elapsed().as_millis() as u64;
    transition(observer, PipelineState::Ready);

    // ── Step 5: Generate ─────────────────────────────────────────────────
    let prompt = prompts::compose(ctx);
    transition(observer, PipelineState::Generating);
    let generate_start = Instant::now();
    let raw = generate::generate(service, &file, &prompt).await?;
    stats.generate_ms = generate_start.elapsed().as_millis() as u64;

    // ── Step 6: Post-process ─────────────────────────────────────────────
    let text = postprocess::clean_summary(&raw);
    let missing_sections = postprocess::missing_sections(&text);
    if !missing_sections.is_empty() {
        warn!(
            "Summary for {} lacks section(s) {:?}",
            staged.original_name(),
            missing_sections
        );
    }

    let media_kind = if media_type.is_empty() {
        MediaKind::from_mime(file.mime_type())
    } else {
        declared_kind
    };

    Ok(SummaryOutput {
        text,
        language: ctx.language,
        media_type,
        media_kind,
        remote_file: file.name().to_string(),
        status_checks: polls,
        missing_sections,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Language;

    #[tokio::test]
    async fn missing_credential_stages_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = SummaryConfig::builder()
            .staging_dir(dir.path())
            .build()
            .unwrap();
        let blob = UploadedBlob::new(b"%PDF".to_vec(), "notes.pdf");
        let err = summarize(blob, &RequestContext::default(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::MissingCredential));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn respond_renders_missing_credential_in_arabic() {
        let config = SummaryConfig::default();
        let ctx = RequestContext::new(Language::Arabic, "الطب", "امتحان سابق");
        let r = respond(UploadedBlob::new(b"x".to_vec(), "x.pdf"), &ctx, &config).await;
        match r {
            SummaryResponse::Error { kind, message } => {
                assert_eq!(kind, crate::error::ErrorKind::MissingCredential);
                assert_eq!(message, Language::Arabic.labels().error_credential);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreadable_input_is_stage_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = SummaryConfig::builder().api_key("k").build().unwrap();
        let err = summarize_file(
            dir.path().join("nope.pdf"),
            None,
            &RequestContext::default(),
            &config,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SummaryError::InputUnreadable { .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::StageFailure);
    }

    #[derive(Default)]
    struct States(std::sync::Mutex<Vec<PipelineState>>);

    impl PipelineObserver for States {
        fn on_state(&self, state: PipelineState) {
            self.0.lock().unwrap().push(state);
        }
    }

    #[tokio::test]
    async fn unreadable_input_reports_errored() {
        let dir = tempfile::tempdir().unwrap();
        let states = std::sync::Arc::new(States::default());
        let config = SummaryConfig::builder()
            .api_key("k")
            .observer(states.clone())
            .build()
            .unwrap();
        summarize_file(
            dir.path().join("missing.mp4"),
            None,
            &RequestContext::default(),
            &config,
        )
        .await
        .unwrap_err();
        assert_eq!(*states.0.lock().unwrap(), vec![PipelineState::Errored]);
    }

    #[test]
    fn sync_wrapper_reports_missing_credential() {
        let err = summarize_sync(
            UploadedBlob::new(b"x".to_vec(), "x.png"),
            &RequestContext::default(),
            &SummaryConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SummaryError::MissingCredential));
    }
}
