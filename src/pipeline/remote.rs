//! Remote file handles and the readiness poll loop.
//!
//! After upload the inference service keeps processing the file (video and
//! audio in particular) and only accepts it for generation once its state is
//! ready. The service does not push that transition; the client has to
//! re-fetch the handle until it settles. [`await_ready`] does this with a
//! fixed delay between checks, yielding to the runtime while it waits.
//!
//! [`ReadyFile`] can only be obtained from a handle observed in the ready
//! state, and generation takes a `&ReadyFile`: a processing handle cannot
//! reach the generator.

use crate::error::SummaryError;
use crate::progress::PipelineObserver;
use crate::prompts::Prompt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Server-side processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Processing,
    Ready,
    Failed,
}

impl FileState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, FileState::Processing)
    }
}

/// Handle to a file held by the inference service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Resource name, e.g. `files/abc123`.
    pub name: String,
    /// URI used to reference the file in generation requests.
    pub uri: String,
    /// MIME type as recorded by the service.
    pub mime_type: String,
    pub state: FileState,
    /// Service-provided reason when `state` is `Failed`.
    pub error: Option<String>,
}

/// A [`RemoteFile`] known to be ready for generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyFile(RemoteFile);

impl ReadyFile {
    /// Accept `file` only if it is already ready; otherwise hand it back.
    pub fn try_from_handle(file: RemoteFile) -> Result<Self, RemoteFile> {
        if file.state == FileState::Ready {
            Ok(Self(file))
        } else {
            Err(file)
        }
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn uri(&self) -> &str {
        &self.0.uri
    }

    pub fn mime_type(&self) -> &str {
        &self.0.mime_type
    }
}

/// The remote multimodal inference service.
///
/// [`crate::pipeline::gemini::GeminiClient`] speaks the Gemini REST API;
/// tests script their own implementations.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Upload the file at `path` and return its initial handle.
    ///
    /// `mime_type` may be empty, in which case the service infers it.
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> Result<RemoteFile, SummaryError>;

    /// Re-fetch the current handle for `name`.
    async fn get_file(&self, name: &str) -> Result<RemoteFile, SummaryError>;

    /// Generate text from a ready file and an instruction.
    async fn generate(&self, file: &ReadyFile, prompt: &Prompt) -> Result<String, SummaryError>;
}

/// How [`await_ready`] paces and bounds its status checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before each status re-fetch.
    pub interval: Duration,
    /// Maximum number of re-fetches; `None` waits indefinitely.
    pub max_polls: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_polls: Some(300),
        }
    }
}

/// Result of a successful wait.
#[derive(Debug, Clone)]
pub struct Readiness {
    pub file: ReadyFile,
    /// Number of status re-fetches performed.
    pub polls: u32,
}

/// Upload the staged file. A single logical transfer; no retries.
pub async fn submit(
    service: &dyn InferenceService,
    path: &Path,
    mime_type: &str,
    display_name: &str,
) -> Result<RemoteFile, SummaryError> {
    let file = service.upload_file(path, mime_type, display_name).await?;
    info!(
        "Uploaded {} as {} (state: {:?})",
        display_name, file.name, file.state
    );
    Ok(file)
}

/// Poll `handle` until it leaves the processing state.
///
/// Returns immediately, without any re-fetch, for a handle that is already
/// ready. A `Failed` observation ends the wait with
/// [`SummaryError::RemoteProcessingFailed`]; exhausting
/// [`PollPolicy::max_polls`] ends it with [`SummaryError::Timeout`].
pub async fn await_ready(
    service: &dyn InferenceService,
    handle: RemoteFile,
    policy: &PollPolicy,
    observer: &dyn PipelineObserver,
) -> Result<Readiness, SummaryError> {
    let mut file = handle;
    let mut polls: u32 = 0;

    loop {
        match file.state {
            FileState::Ready => {
                debug!("{} ready after {} status checks", file.name, polls);
                return Ok(Readiness {
                    file: ReadyFile(file),
                    polls,
                });
            }
            FileState::Failed => {
                let reason = file
                    .error
                    .clone()
                    .unwrap_or_else(|| "service reported FAILED".to_string());
                warn!("{} failed remote processing: {}", file.name, reason);
                return Err(SummaryError::RemoteProcessingFailed {
                    name: file.name,
                    reason,
                });
            }
            FileState::Processing => {}
        }

        if let Some(max) = policy.max_polls {
            if polls >= max {
                warn!("{} still processing after {} status checks", file.name, polls);
                return Err(SummaryError::Timeout {
                    name: file.name,
                    polls,
                });
            }
        }

        sleep(policy.interval).await;
        let name = file.name.clone();
        file = service.get_file(&name).await?;
        polls += 1;
        debug!("Status check {} for {}: {:?}", polls, name, file.state);
        observer.on_poll(polls, file.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopObserver;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed sequence of states on `get_file`.
    struct Scripted {
        states: Mutex<VecDeque<FileState>>,
        fetches: AtomicU32,
    }

    impl Scripted {
        fn new(states: &[FileState]) -> Self {
            Self {
                states: Mutex::new(states.iter().copied().collect()),
                fetches: AtomicU32::new(0),
            }
        }
    }

    fn handle(state: FileState) -> RemoteFile {
        RemoteFile {
            name: "files/test".into(),
            uri: "https://example.test/files/test".into(),
            mime_type: "video/mp4".into(),
            state,
            error: (state == FileState::Failed).then(|| "unsupported codec".to_string()),
        }
    }

    #[async_trait]
    impl InferenceService for Scripted {
        async fn upload_file(&self, _: &Path, _: &str, _: &str) -> Result<RemoteFile, SummaryError> {
            unreachable!("not used")
        }

        async fn get_file(&self, _name: &str) -> Result<RemoteFile, SummaryError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let state = self
                .states
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(FileState::Processing);
            Ok(handle(state))
        }

        async fn generate(&self, _: &ReadyFile, _: &Prompt) -> Result<String, SummaryError> {
            unreachable!("not used")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ready_handle_needs_no_fetch() {
        let svc = Scripted::new(&[]);
        let r = await_ready(&svc, handle(FileState::Ready), &PollPolicy::default(), &NoopObserver)
            .await
            .unwrap();
        assert_eq!(r.polls, 0);
        assert_eq!(svc.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn processing_processing_ready() {
        let svc = Scripted::new(&[FileState::Processing, FileState::Ready]);
        let start = tokio::time::Instant::now();
        let r = await_ready(
            &svc,
            handle(FileState::Processing),
            &PollPolicy::default(),
            &NoopObserver,
        )
        .await
        .unwrap();
        assert_eq!(r.polls, 2);
        assert_eq!(svc.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(r.file.name(), "files/test");
        // Two fixed delays of 2 s each.
        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_state_is_remote_processing_failure() {
        let svc = Scripted::new(&[FileState::Failed]);
        let err = await_ready(
            &svc,
            handle(FileState::Processing),
            &PollPolicy::default(),
            &NoopObserver,
        )
        .await
        .unwrap_err();
        match err {
            SummaryError::RemoteProcessingFailed { name, reason } => {
                assert_eq!(name, "files/test");
                assert_eq!(reason, "unsupported codec");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(svc.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_on_submit_needs_no_fetch() {
        let svc = Scripted::new(&[]);
        let err = await_ready(&svc, handle(FileState::Failed), &PollPolicy::default(), &NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::RemoteProcessingFailed { .. }));
        assert_eq!(svc.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn bound_exhausted_is_timeout() {
        let svc = Scripted::new(&[]);
        let policy = PollPolicy {
            interval: Duration::from_secs(2),
            max_polls: Some(3),
        };
        let err = await_ready(&svc, handle(FileState::Processing), &policy, &NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::Timeout { polls: 3, .. }));
        assert_eq!(svc.fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_policy_keeps_polling() {
        let mut states = vec![FileState::Processing; 500];
        states.push(FileState::Ready);
        let svc = Scripted::new(&states);
        let policy = PollPolicy {
            interval: Duration::from_secs(2),
            max_polls: None,
        };
        let r = await_ready(&svc, handle(FileState::Processing), &policy, &NoopObserver)
            .await
            .unwrap();
        assert_eq!(r.polls, 501);
    }

    #[test]
    fn ready_file_rejects_processing_handle() {
        let back = ReadyFile::try_from_handle(handle(FileState::Processing)).unwrap_err();
        assert_eq!(back.state, FileState::Processing);
        assert!(ReadyFile::try_from_handle(handle(FileState::Ready)).is_ok());
    }
}
