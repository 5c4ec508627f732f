//! Generation: one model call against a ready file.
//!
//! Prompt wording lives in [`crate::prompts`] and transport in
//! [`super::gemini`]. This step only times the call and normalises every
//! failure into
//! [`SummaryError::GenerationFailed`], so quota, safety and transport errors
//! all surface under the same kind. There is no retry.

use crate::error::SummaryError;
use crate::pipeline::remote::{InferenceService, ReadyFile};
use crate::prompts::Prompt;
use std::time::Instant;
use tracing::{debug, warn};

/// Ask `service` to summarise `file` following `prompt`.
///
/// A reply with no visible text counts as a failure.
pub async fn generate(
    service: &dyn InferenceService,
    file: &ReadyFile,
    prompt: &Prompt,
) -> Result<String, SummaryError> {
    let start = Instant::now();
    debug!(
        "Generating from {} ({}) with a {}-char prompt",
        file.name(),
        file.mime_type(),
        prompt.as_str().chars().count()
    );

    match service.generate(file, prompt).await {
        Ok(text) if text.trim().is_empty() => {
            warn!("{}: model returned no text", file.name());
            Err(SummaryError::GenerationFailed(
                "model returned an empty response".to_string(),
            ))
        }
        Ok(text) => {
            debug!(
                "{}: {} chars generated in {:?}",
                file.name(),
                text.chars().count(),
                start.elapsed()
            );
            Ok(text)
        }
        Err(e @ SummaryError::GenerationFailed(_)) => {
            warn!("{}: generation failed: {}", file.name(), e);
            Err(e)
        }
        Err(e) => {
            warn!("{}: generation failed: {}", file.name(), e);
            Err(SummaryError::GenerationFailed(e.to_string()))
        }
    }
}
