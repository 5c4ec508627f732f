//! Localised label tables for the two supported output languages.
//!
//! The summarizer serves exactly two languages: English (primary) and Arabic
//! (secondary). Section headings, status lines, error messages and the
//! major/category pick lists all live in one [`Labels`] table per language.
//! The pipeline itself is language-agnostic and receives the language as
//! part of each request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target language of a generated summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Primary language (default).
    #[default]
    English,
    /// Secondary language.
    Arabic,
}

impl Language {
    /// English name used inside the model instruction.
    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Arabic => "Arabic",
        }
    }

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Arabic => "ar",
        }
    }

    /// The label table for this language.
    pub fn labels(self) -> &'static Labels {
        match self {
            Language::English => &ENGLISH,
            Language::Arabic => &ARABIC,
        }
    }

    /// Major names offered to the user in this language.
    pub fn majors(self) -> &'static [&'static str] {
        match self {
            Language::English => &MAJORS_EN,
            Language::Arabic => &MAJORS_AR,
        }
    }

    /// Document categories offered to the user in this language.
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            Language::English => &CATEGORIES_EN,
            Language::Arabic => &CATEGORIES_AR,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "ar" | "arabic" => Ok(Language::Arabic),
            other => Err(format!("unsupported language '{other}' (expected en or ar)")),
        }
    }
}

/// User-visible strings for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub major_label: &'static str,
    pub category_label: &'static str,
    pub processing: &'static str,
    pub success: &'static str,
    /// Heading of section 1 (overview & core concepts).
    pub overview: &'static str,
    /// Heading of section 2 (insights & takeaways).
    pub insights: &'static str,
    /// Heading of section 3 (terminology).
    pub terms: &'static str,
    pub error_credential: &'static str,
    pub error_stage: &'static str,
    pub error_transfer: &'static str,
    pub error_remote: &'static str,
    pub error_timeout: &'static str,
    pub error_generation: &'static str,
    pub error_unexpected: &'static str,
}

impl Labels {
    /// The three section headings in output order.
    pub fn sections(&self) -> [&'static str; 3] {
        [self.overview, self.insights, self.terms]
    }
}

static ENGLISH: Labels = Labels {
    title: "AI Generated Key Takeaways",
    subtitle: "Upload your document to generate a structured summary.",
    major_label: "Filter by Major",
    category_label: "Category",
    processing: "Analyzing content...",
    success: "Summary generated successfully!",
    overview: "Overview & Core Concepts",
    insights: "Key Insights & Takeaways",
    terms: "Terminology",
    error_credential: "API Key is missing. Please check Secrets.",
    error_stage: "The uploaded file could not be prepared for analysis.",
    error_transfer: "The file could not be sent to the AI service.",
    error_remote: "The AI service could not process this file.",
    error_timeout: "The AI service took too long to process this file.",
    error_generation: "The AI service failed to generate a summary.",
    error_unexpected: "An unexpected error occurred.",
};

static ARABIC: Labels = Labels {
    title: "أهم النقاط المستخرجة بالذكاء الاصطناعي",
    subtitle: "ارفع ملفك لتوليد ملخص منظم ودقيق.",
    major_label: "تصفية حسب التخصص",
    category_label: "الفئة",
    processing: "جاري تحليل المحتوى...",
    success: "تم توليد الملخص بنجاح!",
    overview: "نظرة عامة والمفاهيم الأساسية",
    insights: "الرؤى الجوهرية وأهم النقاط",
    terms: "المصطلحات العلمية",
    error_credential: "مفتاح API مفقود. يرجى التحقق من الإعدادات.",
    error_stage: "تعذر تجهيز الملف المرفوع للتحليل.",
    error_transfer: "تعذر إرسال الملف إلى خدمة الذكاء الاصطناعي.",
    error_remote: "تعذر على خدمة الذكاء الاصطناعي معالجة هذا الملف.",
    error_timeout: "استغرقت خدمة الذكاء الاصطناعي وقتاً طويلاً في معالجة هذا الملف.",
    error_generation: "فشلت خدمة الذكاء الاصطناعي في توليد الملخص.",
    error_unexpected: "حدث خطأ غير متوقع.",
};

const MAJORS_EN: [&str; 8] = [
    "Molecular Genetics Biology",
    "Computer Science",
    "Social Thought, Economy, and Policy (STEP)",
    "Global Studies and Diplomacy",
    "Human Rights and International Law",
    "Literature and Society",
    "Digital Media and Communication",
    "Urban Studies",
];

const MAJORS_AR: [&str; 8] = [
    "الأحياء والوراثة الجزيئية",
    "علوم الحاسوب",
    "الفكر الاجتماعي والاقتصاد والسياسة (STEP)",
    "الدراسات العالمية والدبلوماسية",
    "حقوق الإنسان والقانون الدولي",
    "الأدب والمجتمع",
    "الإعلام الرقمي والاتصال",
    "الدراسات الحضرية",
];

const CATEGORIES_EN: [&str; 5] = [
    "Summary",
    "Lecture Notes",
    "Past Exam",
    "Assignment",
    "Cheatsheet",
];

const CATEGORIES_AR: [&str; 5] = [
    "ملخص",
    "ملاحظات محاضرة",
    "امتحان سابق",
    "واجب/تكليف",
    "ورقة مراجعة",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_language_codes_and_names() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::English);
        assert_eq!("Arabic".parse::<Language>().unwrap(), Language::Arabic);
        assert_eq!(" AR ".parse::<Language>().unwrap(), Language::Arabic);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn default_is_primary_language() {
        assert_eq!(Language::default(), Language::English);
    }

    #[test]
    fn pick_lists_are_parallel_across_languages() {
        assert_eq!(Language::English.majors().len(), Language::Arabic.majors().len());
        assert_eq!(
            Language::English.categories().len(),
            Language::Arabic.categories().len()
        );
    }

    #[test]
    fn section_headings_differ_per_language() {
        let en = Language::English.labels().sections();
        let ar = Language::Arabic.labels().sections();
        for (e, a) in en.iter().zip(ar.iter()) {
            assert_ne!(e, a);
        }
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Language::Arabic).unwrap();
        assert_eq!(json, "\"arabic\"");
    }
}
