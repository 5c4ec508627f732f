//! Post-processing: deterministic cleanup of the generated summary.
//!
//! Models sometimes wrap their answer in a ` ```markdown ` fence despite the
//! prompt, emit `\r\n` line endings, or scatter zero-width characters. These
//! rules fix such artefacts without touching content; lines inside fenced
//! code blocks are never re-spaced. Each rule is a pure
//! `&str → String` pass and independently testable.
//!
//! [`missing_sections`] reports which of the three requested headings are
//! absent. It never rejects a summary: a non-conforming answer is still
//! returned to the user, only flagged.
//!
//! ## Rule Order
//!
//! Fences are stripped before line endings are normalised so the fence regex
//! sees the raw reply; heading spacing runs on already-trimmed lines.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to the raw model output.
///
/// Rules (applied in order):
/// 1. Strip outer markdown fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
/// 5. Ensure heading lines have a blank line before them
/// 6. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 7. Ensure the text ends with exactly one newline
pub fn clean_summary(input: &str) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = normalise_heading_spacing(&s);
    let s = remove_invisible_chars(&s);
    ensure_final_newline(&s)
}

/// Numbers (1-based) of the required sections with no matching heading.
///
/// A heading matches when a line starts with two to four `#`, then the
/// section number and a dot, e.g. `### 2.` or `## 2.`. The label text after
/// the number is not checked since it is localised.
pub fn missing_sections(text: &str) -> Vec<u8> {
    (1u8..=3)
        .filter(|n| {
            !text
                .lines()
                .filter_map(|line| RE_SECTION_HEADING.captures(line))
                .any(|caps| caps[1].parse::<u8>().ok() == Some(*n))
        })
        .collect()
}

static RE_SECTION_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s{0,3}#{2,4}\s*(\d+)\.").unwrap());

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\r?\n(.*)\r?\n```\s*$").unwrap());

fn is_fence(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("```") || line.starts_with("~~~")
}

/// Only a single wrapping fence is stripped. A body that contains fence lines
/// of its own means the first and last fences belong to separate blocks.
fn strip_markdown_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) if !caps[1].lines().any(is_fence) => caps[1].to_string(),
        _ => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 5: Normalise heading spacing ────────────────────────────────────────

fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    (1..=6).contains(&hashes) && line[hashes..].starts_with(' ')
}

fn normalise_heading_spacing(input: &str) -> String {
    let mut result = String::with_capacity(input.len() + 64);
    let mut in_code = false;
    for (i, line) in input.lines().enumerate() {
        if is_fence(line) {
            in_code = !in_code;
        } else if !in_code && is_heading(line) && i > 0 {
            let trimmed = result.trim_end_matches('\n');
            result.truncate(trimmed.len());
            result.push_str("\n\n");
        }
        result.push_str(line);
        result.push('\n');
    }
    result
}

// ── Rule 6: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 7: Ensure text ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        let input = "```markdown\n### 1. Overview\nText\n```";
        assert_eq!(strip_markdown_fences(input), "### 1. Overview\nText");
    }

    #[test]
    fn test_strip_fences_no_lang() {
        let input = "```\n### 1. Overview\n```";
        assert_eq!(strip_markdown_fences(input), "### 1. Overview");
    }

    #[test]
    fn test_inner_code_block_kept() {
        let input = "### 3. Terminology\n```\nfn main() {}\n```\nafter";
        assert_eq!(strip_markdown_fences(input), input);
    }

    #[test]
    fn test_separate_code_blocks_are_not_a_wrapper() {
        let input = "```\nls -la\n```\n\n### 1. Overview\ntext\n\n```\necho hi\n```";
        assert_eq!(strip_markdown_fences(input), input);
        assert_eq!(clean_summary(input), format!("{input}\n"));
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        assert_eq!(
            trim_trailing_whitespace("  hello   \nworld  "),
            "  hello\nworld"
        );
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn test_heading_spacing() {
        let result = normalise_heading_spacing("intro\n### 2. Key Insights\n- a");
        assert!(result.contains("intro\n\n### 2. Key Insights\n"));
    }

    #[test]
    fn test_heading_spacing_skips_code_comments() {
        let input = "### 3. Terminology\n```python\nx = 1\n# increment\n```\n# Notes";
        assert_eq!(
            normalise_heading_spacing(input),
            "### 3. Terminology\n```python\nx = 1\n# increment\n```\n\n# Notes\n"
        );
    }

    #[test]
    fn test_hashtag_is_not_heading() {
        assert!(!is_heading("#exam-tips"));
        assert!(is_heading("## 1. Overview"));
    }

    #[test]
    fn test_remove_invisible_keeps_arabic_joiner() {
        // U+200D (ZWJ) is meaningful in Arabic script shaping.
        let input = "a\u{200B}b\u{FEFF}c\u{00AD}d\u{200D}e";
        assert_eq!(remove_invisible_chars(input), "abcd\u{200D}e");
    }

    #[test]
    fn test_ensure_final_newline() {
        assert_eq!(ensure_final_newline("hello"), "hello\n");
        assert_eq!(ensure_final_newline("hello\n\n\n"), "hello\n");
        assert_eq!(ensure_final_newline(""), "\n");
    }

    #[test]
    fn test_clean_summary_full_pipeline() {
        let input = "```markdown\r\n### 1. Overview\r\nText   \r\n\r\n\r\n\r\n\r\n### 2. Insights\r\n- a\r\n```";
        let result = clean_summary(input);
        assert!(result.starts_with("### 1. Overview\nText\n"));
        assert!(!result.contains('\r'));
        assert!(!result.contains("\n\n\n\n"));
        assert!(result.ends_with("- a\n"));
    }

    #[test]
    fn test_all_sections_present() {
        let text = "### 1. Overview\nx\n### 2. Key Insights\n- y\n### 3. Terminology\n**A**: b";
        assert!(missing_sections(text).is_empty());
    }

    #[test]
    fn test_missing_sections_reported() {
        let text = "### 1. Overview\nx\n\nSome prose without more headings.";
        assert_eq!(missing_sections(text), vec![2, 3]);
    }

    #[test]
    fn test_section_levels_and_localised_labels() {
        let text = "## 1. نظرة عامة\n#### 2. الأفكار\n   ### 3. المصطلحات";
        assert!(missing_sections(text).is_empty());
    }

    #[test]
    fn test_number_in_body_does_not_count() {
        let text = "### 1. Overview\nStep 2. do this\n3. numbered item";
        assert_eq!(missing_sections(text), vec![2, 3]);
    }
}
