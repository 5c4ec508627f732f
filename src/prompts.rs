//! Instruction prompt for the summary request.
//!
//! The prompt is a pure function of the [`RequestContext`]: the same context
//! always produces byte-identical text. It names the output language, embeds
//! the user's major and document category, and fixes a three-section output
//! contract whose headings are stable (`### 1.`, `### 2.`, `### 3.`) and
//! labelled in the target language.
//!
//! Major and category are user-influenced free text and go into the prompt
//! as-is. [`compose_with`] takes a [`FieldSanitizer`] so a filtering policy
//! can be plugged in here without touching any other stage.

use crate::request::RequestContext;
use std::borrow::Cow;
use std::fmt;

/// Stable heading prefixes of the three required output sections.
pub const SECTION_MARKERS: [&str; 3] = ["### 1.", "### 2.", "### 3."];

/// A composed instruction. Contains no file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Policy applied to each user-supplied field before it is embedded.
pub trait FieldSanitizer {
    fn sanitize<'a>(&self, field: &'a str) -> Cow<'a, str>;
}

/// Embeds fields unchanged.
pub struct Verbatim;

impl FieldSanitizer for Verbatim {
    fn sanitize<'a>(&self, field: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(field)
    }
}

/// Compose the instruction with fields embedded verbatim.
pub fn compose(ctx: &RequestContext) -> Prompt {
    compose_with(ctx, &Verbatim)
}

/// Compose the instruction, passing major and category through `sanitizer`.
pub fn compose_with(ctx: &RequestContext, sanitizer: &dyn FieldSanitizer) -> Prompt {
    let labels = ctx.language.labels();
    let major = sanitizer.sanitize(&ctx.major);
    let category = sanitizer.sanitize(&ctx.category);
    let target = ctx.language.name();
    let [s1, s2, s3] = SECTION_MARKERS;

    Prompt(format!(
        r#"Role: You are an expert academic tutor for the UniShare platform.
Context: The student is majoring in '{major}' and this file is a '{category}'.
Task: Analyze the file and generate a comprehensive summary in **{target}**.

Strict Output Format:

{s1} {overview}
- Provide a clear, high-level summary of the material.
- Identify the central thesis or main topic.

{s2} {insights}
- List 5-7 critical bullet points.
- Focus on facts, dates, theories, or exam-relevant details.

{s3} {terms}
- Extract key definitions or technical terms found in the text.
- Format as: **Term**: Definition.

Style: Professional, academic, and concise. Write the entire response in {target}."#,
        overview = labels.overview,
        insights = labels.insights,
        terms = labels.terms,
    ))
}
