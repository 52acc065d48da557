use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::analysis::scoring::FormatCheck;
use crate::errors::AnalysisError;

// ────────────────────────────────────────────────────────────────────────────
// Input document
// ────────────────────────────────────────────────────────────────────────────

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Pdf,
    Docx,
}

impl ContentType {
    /// Resolves a declared MIME type. Parameters such as `; charset=...` are ignored.
    pub fn from_mime(mime: &str) -> Result<Self, AnalysisError> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            PDF_MIME => Ok(ContentType::Pdf),
            DOCX_MIME => Ok(ContentType::Docx),
            _ => Err(AnalysisError::unsupported(mime)),
        }
    }

    /// Resolves a content type from a file name's extension.
    pub fn from_filename(name: &str) -> Result<Self, AnalysisError> {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(ContentType::Pdf),
            "docx" => Ok(ContentType::Docx),
            _ => Err(AnalysisError::unsupported(name)),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Pdf => f.write_str("PDF"),
            ContentType::Docx => f.write_str("DOCX"),
        }
    }
}

/// An uploaded document as received from the caller. Immutable once built.
#[derive(Debug, Clone)]
pub struct RawDocument {
    bytes: Bytes,
    content_type: ContentType,
}

impl RawDocument {
    pub fn new(bytes: impl Into<Bytes>, content_type: ContentType) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extracted text
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRole {
    Heading,
    Body,
    Bullet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedLine {
    pub text: String,
    pub role: LineRole,
    /// 1-indexed page the line was found on.
    pub page: u32,
}

/// Coarse layout signal kept alongside the linear text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutHints {
    pub page_count: u32,
    /// Line indices at which a new page starts.
    pub page_breaks: Vec<usize>,
    pub table_count: usize,
    /// Tables that arrange prose side by side instead of holding tabular data.
    pub layout_tables: usize,
    /// True when the source marked headings with explicit heading styles.
    pub heading_styles_used: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub content_type: ContentType,
    pub lines: Vec<ExtractedLine>,
    pub layout: LayoutHints,
}

impl ExtractedText {
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.text.trim().is_empty())
    }

    pub fn full_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Classification and findings
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Resume,
    CoverLetter,
    Transcript,
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Resume => "resume",
            DocumentType::CoverLetter => "cover_letter",
            DocumentType::Transcript => "transcript",
            DocumentType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Contact,
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Other,
}

impl SectionKind {
    pub const ALL: [SectionKind; 7] = [
        SectionKind::Contact,
        SectionKind::Summary,
        SectionKind::Experience,
        SectionKind::Education,
        SectionKind::Skills,
        SectionKind::Projects,
        SectionKind::Other,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            SectionKind::Contact => "Contact Information",
            SectionKind::Summary => "Summary",
            SectionKind::Experience => "Experience",
            SectionKind::Education => "Education",
            SectionKind::Skills => "Skills",
            SectionKind::Projects => "Projects",
            SectionKind::Other => "Additional",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    NoDatesFound,
    NoBulletPoints,
    NoDelimitedList,
    InconsistentDateFormat,
    DateRangeOutOfOrder,
    SectionTooShort,
    NoEmailOrPhone,
}

impl QualityFlag {
    /// Flags that describe structure (formatting) rather than completeness.
    pub fn is_formatting(&self) -> bool {
        !matches!(self, QualityFlag::SectionTooShort | QualityFlag::NoEmailOrPhone)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionFinding {
    pub section: SectionKind,
    pub present: bool,
    pub confidence: f64,
    /// Index of the heading line (or first header line for contact).
    pub start_line: Option<usize>,
    /// Exclusive end line index.
    pub end_line: Option<usize>,
    pub line_count: usize,
    pub bullet_count: usize,
    pub quality_flags: Vec<QualityFlag>,
    /// Set when contact details were taken from the lines above the first heading.
    #[serde(default)]
    pub from_header: bool,
}

impl SectionFinding {
    pub fn absent(section: SectionKind) -> Self {
        Self {
            section,
            present: false,
            confidence: 0.0,
            start_line: None,
            end_line: None,
            line_count: 0,
            bullet_count: 0,
            quality_flags: vec![],
            from_header: false,
        }
    }

    pub fn has_flag(&self, flag: QualityFlag) -> bool {
        self.quality_flags.contains(&flag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub keyword: String,
    pub matched: bool,
    pub kind: MatchKind,
    /// The synonym or word form that produced a fuzzy match.
    pub matched_term: Option<String>,
    pub weight: f64,
    pub contribution: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Result
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerBackend {
    Heuristic,
    Llm,
}

impl fmt::Display for AnalyzerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzerBackend::Heuristic => f.write_str("heuristic"),
            AnalyzerBackend::Llm => f.write_str("llm"),
        }
    }
}

/// Outcome of one analysis call. Owned by the caller and never mutated after creation.
///
/// Scores are `None` whenever `document_type` is not `Resume`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub document_type: DocumentType,
    pub classification_confidence: f64,
    pub ats_score: Option<u32>,
    pub format_score: Option<u32>,
    pub section_score: Option<u32>,
    pub keyword_coverage: Option<f64>,
    pub sections: Vec<SectionFinding>,
    pub keyword_matches: Vec<KeywordMatch>,
    pub format_checks: Vec<FormatCheck>,
    pub suggestions: Vec<String>,
    pub rejection_reason: Option<String>,
    pub analyzer: AnalyzerBackend,
}

impl AnalysisResult {
    /// A terminal non-resume outcome. Carries only the classification.
    pub fn rejected(
        document_type: DocumentType,
        confidence: f64,
        reason: impl Into<String>,
        analyzer: AnalyzerBackend,
    ) -> Self {
        Self {
            document_type,
            classification_confidence: confidence.clamp(0.0, 1.0),
            ats_score: None,
            format_score: None,
            section_score: None,
            keyword_coverage: None,
            sections: vec![],
            keyword_matches: vec![],
            format_checks: vec![],
            suggestions: vec![],
            rejection_reason: Some(reason.into()),
            analyzer,
        }
    }

    pub fn is_resume(&self) -> bool {
        self.document_type == DocumentType::Resume
    }

    /// Converts a rejected result into `ClassificationRejected` for callers that
    /// prefer to branch on errors.
    pub fn ensure_resume(self) -> Result<Self, AnalysisError> {
        if self.is_resume() {
            return Ok(self);
        }
        Err(AnalysisError::ClassificationRejected {
            document_type: self.document_type,
            reason: self
                .rejection_reason
                .unwrap_or_else(|| "document is not a resume".to_string()),
        })
    }
}
