//! Configuration types for a summarisation request.
//!
//! All process-wide behaviour is controlled through [`SummaryConfig`], built
//! via its [`SummaryConfigBuilder`]. The config is the only state shared
//! between requests and is treated as read-only: per-request inputs (the
//! upload and the [`crate::RequestContext`]) are passed separately.
//!
//! The credential is optional at build time on purpose. Its absence is a
//! request-level precondition failure ([`SummaryError::MissingCredential`])
//! reported by [`crate::summarize`] before anything is staged.

use crate::error::SummaryError;
use crate::pipeline::remote::PollPolicy;
use crate::progress::ObserverHandle;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default multimodal model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Environment variables consulted by [`SummaryConfig::from_env`], in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// A service credential. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key; blank input yields `None`.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Configuration for summarisation requests.
///
/// # Example
/// ```rust
/// use unishare_summarizer::SummaryConfig;
/// use std::time::Duration;
///
/// let config = SummaryConfig::builder()
///     .api_key("my-key")
///     .model("gemini-1.5-pro")
///     .poll_interval(Duration::from_secs(1))
///     .max_polls(Some(60))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SummaryConfig {
    /// Inference service credential.
    pub api_key: Option<ApiKey>,

    /// Base URL of the Gemini REST API. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Model used for generation. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Readiness polling: delay between status checks and optional bound.
    /// Default: 2 s interval, at most 300 checks.
    pub poll: PollPolicy,

    /// Sampling temperature. `None` leaves the service default.
    pub temperature: Option<f32>,

    /// Output token cap for the summary. `None` leaves the service default.
    pub max_output_tokens: Option<u32>,

    /// Per-HTTP-request timeout in seconds. Default: 300.
    ///
    /// Applies to each upload, status and generation call individually, not
    /// to the whole pipeline.
    pub request_timeout_secs: u64,

    /// Directory for staged uploads. `None` uses the system temp dir.
    pub staging_dir: Option<PathBuf>,

    /// Optional observer for state transitions and poll events.
    pub observer: Option<ObserverHandle>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            poll: PollPolicy::default(),
            temperature: None,
            max_output_tokens: None,
            request_timeout_secs: 300,
            staging_dir: None,
            observer: None,
        }
    }
}

impl fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("poll", &self.poll)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("staging_dir", &self.staging_dir)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn PipelineObserver>"))
            .finish()
    }
}

impl SummaryConfig {
    /// Create a new builder for `SummaryConfig`.
    pub fn builder() -> SummaryConfigBuilder {
        SummaryConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults overlaid with the process environment.
    ///
    /// Reads the credential from `GOOGLE_API_KEY`, then `GEMINI_API_KEY`;
    /// `UNISHARE_MODEL` and `UNISHARE_GEMINI_BASE_URL` override the model and
    /// endpoint when set.
    pub fn from_env() -> Result<Self, SummaryError> {
        let mut builder = Self::builder();
        if let Some(key) = API_KEY_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().and_then(ApiKey::new))
        {
            builder.config.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("UNISHARE_MODEL") {
            if !model.trim().is_empty() {
                builder = builder.model(model.trim());
            }
        }
        if let Ok(url) = std::env::var("UNISHARE_GEMINI_BASE_URL") {
            if !url.trim().is_empty() {
                builder = builder.base_url(url.trim());
            }
        }
        builder.build()
    }

    /// The credential, or [`SummaryError::MissingCredential`].
    pub fn require_api_key(&self) -> Result<&ApiKey, SummaryError> {
        self.api_key.as_ref().ok_or(SummaryError::MissingCredential)
    }
}

/// Builder for [`SummaryConfig`].
#[derive(Debug)]
pub struct SummaryConfigBuilder {
    config: SummaryConfig,
}

impl SummaryConfigBuilder {
    /// Set the credential. Blank keys are treated as absent.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = ApiKey::new(key);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll.interval = interval;
        self
    }

    /// Bound on status re-fetches. `None` polls until the service settles.
    pub fn max_polls(mut self, max: Option<u32>) -> Self {
        self.config.poll.max_polls = max;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = Some(n);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.staging_dir = Some(dir.into());
        self
    }

    pub fn observer(mut self, observer: ObserverHandle) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SummaryConfig, SummaryError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(SummaryError::InvalidConfig(format!(
                "base URL must be http(s), got '{}'",
                c.base_url
            )));
        }
        if c.model.trim().is_empty() {
            return Err(SummaryError::InvalidConfig("model must not be empty".into()));
        }
        if c.poll.max_polls == Some(0) {
            return Err(SummaryError::InvalidConfig(
                "max polls must be ≥ 1 (use None for no bound)".into(),
            ));
        }
        Ok(self.config)
    }
}
