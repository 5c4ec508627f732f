//! Observer hooks for pipeline state transitions and readiness polling.
//!
//! Inject an [`Arc<dyn PipelineObserver>`] via
//! [`crate::config::SummaryConfigBuilder::observer`] to follow a request as it
//! moves through the pipeline. The CLI uses this to drive its spinner; a web
//! front end could forward the same events over a socket.
//!
//! # Example
//!
//! ```rust
//! use unishare_summarizer::{PipelineObserver, PipelineState, SummaryConfig};
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! impl PipelineObserver for Logger {
//!     fn on_state(&self, state: PipelineState) {
//!         eprintln!("→ {state}");
//!     }
//! }
//!
//! let config = SummaryConfig::builder()
//!     .api_key("test-key")
//!     .observer(Arc::new(Logger))
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::remote::FileState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Lifecycle of a single summarisation request.
///
/// `Done` and `Errored` are terminal. The staged upload is always released
/// before either is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Staged,
    Classified,
    Submitted,
    Polling,
    Ready,
    Generating,
    Done,
    Errored,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Errored)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::Staged => "staged",
            PipelineState::Classified => "classified",
            PipelineState::Submitted => "submitted",
            PipelineState::Polling => "polling",
            PipelineState::Ready => "ready",
            PipelineState::Generating => "generating",
            PipelineState::Done => "done",
            PipelineState::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// Receives pipeline events. All methods default to no-ops.
pub trait PipelineObserver: Send + Sync {
    /// Called on every state transition, terminal states included.
    fn on_state(&self, state: PipelineState) {
        let _ = state;
    }

    /// Called after each status re-fetch during readiness polling.
    ///
    /// # Arguments
    /// * `attempt`: 1-based count of re-fetches so far
    /// * `state`  : the state the service reported
    fn on_poll(&self, attempt: u32, state: FileState) {
        let _ = (attempt, state);
    }
}

/// A no-op observer, used when none is configured.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::SummaryConfig`].
pub type ObserverHandle = Arc<dyn PipelineObserver>;
