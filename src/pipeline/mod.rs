//! Pipeline stages for remote-file summarisation.
//!
//! Each submodule implements exactly one step. The remote service sits
//! behind a trait so the steps can be tested without a network.
//!
//! ## Data Flow
//!
//! ```text
//! staging ──▶ classify ──▶ remote ──▶ generate ──▶ postprocess
//! (temp file) (MIME)      (upload +   (model call)  (cleanup)
//!                          polling)
//! ```
//!
//! 1. [`staging`]: write the upload to a uniquely named temp file that is
//!    removed on every exit path
//! 2. [`crate::media`]: resolve the MIME type sent with the upload
//! 3. [`remote`]: the [`remote::InferenceService`] seam, upload, and the
//!    readiness poll loop; [`gemini`] is the production implementation
//! 4. [`generate`]: one generation call against a ready file; no retries
//! 5. [`postprocess`]: deterministic text cleanup and the section check

pub mod gemini;
pub mod generate;
pub mod postprocess;
pub mod remote;
pub mod staging;
