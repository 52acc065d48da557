//! Analyzer: the `analyze` capability and its two interchangeable backends.
//!
//! - `HeuristicAnalyzer`: deterministic pipeline (extract → classify → sections →
//!   keywords → scores). Pure CPU work, run on the blocking pool.
//! - `LlmAnalyzer`: extracts locally, then asks Claude for the verdict. Fails closed
//!   with `AnalysisServiceUnavailable` and never guesses a result.
//!
//! `AppState` holds an `Arc<dyn Analyzer>`, chosen at startup via `ANALYZER_BACKEND`.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::analysis::classifier::classify;
use crate::analysis::config::AnalysisConfig;
use crate::analysis::extractor::extract;
use crate::analysis::keywords::match_keywords;
use crate::analysis::models::{
    AnalysisResult, AnalyzerBackend, DocumentType, ExtractedText, KeywordMatch, MatchKind,
    RawDocument, SectionFinding, SectionKind,
};
use crate::analysis::prompts::{build_analysis_prompt, ANALYSIS_SYSTEM};
use crate::analysis::scoring::{aggregate, to_score};
use crate::analysis::sections::detect_sections;
use crate::errors::AnalysisError;
use crate::llm_client::{LlmClient, LlmError};
use crate::roles::RoleProfile;

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Analyzes one uploaded document against one role profile.
///
/// A non-resume is not an error: it comes back as a result with
/// `document_type != Resume` and no scores.
#[async_trait]
pub trait Analyzer: Send + Sync {
    fn backend(&self) -> AnalyzerBackend;

    async fn analyze(
        &self,
        document: RawDocument,
        role: &RoleProfile,
    ) -> Result<AnalysisResult, AnalysisError>;
}

/// Runs extraction on the blocking pool.
async fn extract_blocking(document: RawDocument) -> Result<ExtractedText, AnalysisError> {
    tokio::task::spawn_blocking(move || extract(&document))
        .await
        .map_err(|e| AnalysisError::Internal(format!("extraction task failed: {e}")))?
}

fn log_outcome(result: &AnalysisResult) {
    if result.is_resume() {
        info!(
            analyzer = %result.analyzer,
            ats = ?result.ats_score,
            format = ?result.format_score,
            section = ?result.section_score,
            "Analysis complete"
        );
    } else {
        warn!(
            analyzer = %result.analyzer,
            document_type = %result.document_type,
            confidence = result.classification_confidence,
            "Document rejected: not a resume"
        );
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicAnalyzer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HeuristicAnalyzer {
    config: Arc<AnalysisConfig>,
}

impl HeuristicAnalyzer {
    pub fn new(config: Arc<AnalysisConfig>) -> Self {
        Self { config }
    }

    /// Synchronous entry point. Same input and configuration always give the same result.
    pub fn analyze_document(
        &self,
        document: &RawDocument,
        role: &RoleProfile,
    ) -> Result<AnalysisResult, AnalysisError> {
        let text = extract(document)?;
        Ok(analyze_text(&text, role, &self.config))
    }
}

/// Scores already-extracted text. Rejections short-circuit before section detection.
pub fn analyze_text(
    text: &ExtractedText,
    role: &RoleProfile,
    config: &AnalysisConfig,
) -> AnalysisResult {
    let classification = classify(text, &config.classifier);
    if !classification.is_resume() {
        return AnalysisResult::rejected(
            classification.document_type,
            classification.confidence,
            classification.rejection_reason(),
            AnalyzerBackend::Heuristic,
        );
    }

    let sections = detect_sections(text);
    let coverage = match_keywords(text, role, &config.match_strengths);
    let scores = aggregate(text, &sections, &coverage, role, config);

    AnalysisResult {
        document_type: DocumentType::Resume,
        classification_confidence: classification.confidence,
        ats_score: Some(scores.ats_score),
        format_score: Some(scores.format_score),
        section_score: Some(scores.section_score),
        keyword_coverage: Some(scores.keyword_coverage),
        sections,
        keyword_matches: coverage.matches,
        format_checks: scores.format_checks,
        suggestions: scores.suggestions,
        rejection_reason: None,
        analyzer: AnalyzerBackend::Heuristic,
    }
}

#[async_trait]
impl Analyzer for HeuristicAnalyzer {
    fn backend(&self) -> AnalyzerBackend {
        AnalyzerBackend::Heuristic
    }

    async fn analyze(
        &self,
        document: RawDocument,
        role: &RoleProfile,
    ) -> Result<AnalysisResult, AnalysisError> {
        let analyzer = self.clone();
        let role = role.clone();
        let result = tokio::task::spawn_blocking(move || analyzer.analyze_document(&document, &role))
            .await
            .map_err(|e| AnalysisError::Internal(format!("analysis task failed: {e}")))??;

        log_outcome(&result);
        Ok(result)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmAnalyzer
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmAnalyzer {
    llm: LlmClient,
    config: Arc<AnalysisConfig>,
}

impl LlmAnalyzer {
    pub fn new(llm: LlmClient, config: Arc<AnalysisConfig>) -> Self {
        Self { llm, config }
    }
}

#[async_trait]
impl Analyzer for LlmAnalyzer {
    fn backend(&self) -> AnalyzerBackend {
        AnalyzerBackend::Llm
    }

    async fn analyze(
        &self,
        document: RawDocument,
        role: &RoleProfile,
    ) -> Result<AnalysisResult, AnalysisError> {
        let text = extract_blocking(document).await?;
        if text.is_blank() {
            let result = AnalysisResult::rejected(
                DocumentType::Unknown,
                0.0,
                "document contains no extractable text",
                AnalyzerBackend::Llm,
            );
            log_outcome(&result);
            return Ok(result);
        }

        let prompt = build_analysis_prompt(&text, role);
        let verdict: LlmVerdict = self
            .llm
            .call_json(&prompt, ANALYSIS_SYSTEM)
            .await
            .map_err(service_unavailable)?;

        let result = verdict.into_result(role, &self.config)?;
        log_outcome(&result);
        Ok(result)
    }
}

fn service_unavailable(err: LlmError) -> AnalysisError {
    warn!("LLM analysis failed: {err}");
    AnalysisError::AnalysisServiceUnavailable {
        attempts: err.attempts(),
        reason: err.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LLM verdict
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LlmVerdict {
    document_type: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    ats_score: Option<f64>,
    #[serde(default)]
    format_score: Option<f64>,
    #[serde(default)]
    section_score: Option<f64>,
    #[serde(default)]
    sections: Vec<LlmSection>,
    #[serde(default)]
    keyword_matches: Vec<LlmKeywordMatch>,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    rejection_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LlmSection {
    section: SectionKind,
    present: bool,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct LlmKeywordMatch {
    keyword: String,
    matched: bool,
    #[serde(default = "default_exact")]
    exact: bool,
    #[serde(default)]
    matched_term: Option<String>,
}

fn default_exact() -> bool {
    true
}

fn parse_document_type(raw: &str) -> DocumentType {
    match raw.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
        "resume" | "cv" => DocumentType::Resume,
        "cover_letter" => DocumentType::CoverLetter,
        "transcript" => DocumentType::Transcript,
        _ => DocumentType::Unknown,
    }
}

impl LlmVerdict {
    fn into_result(
        self,
        role: &RoleProfile,
        config: &AnalysisConfig,
    ) -> Result<AnalysisResult, AnalysisError> {
        let document_type = parse_document_type(&self.document_type);
        let confidence = self
            .confidence
            .filter(|c| c.is_finite())
            .unwrap_or(1.0)
            .clamp(0.0, 1.0);

        if document_type != DocumentType::Resume {
            let reason = self
                .rejection_reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| format!("document classified as {document_type}"));
            return Ok(AnalysisResult::rejected(
                document_type,
                confidence,
                reason,
                AnalyzerBackend::Llm,
            ));
        }

        let (Some(ats), Some(format), Some(section)) =
            (self.ats_score, self.format_score, self.section_score)
        else {
            return Err(AnalysisError::AnalysisServiceUnavailable {
                attempts: 1,
                reason: "model returned a resume verdict without all three scores".to_string(),
            });
        };

        let sections = SectionKind::ALL
            .iter()
            .map(|kind| match self.sections.iter().find(|s| s.section == *kind) {
                Some(s) if s.present => SectionFinding {
                    present: true,
                    confidence: s
                        .confidence
                        .filter(|c| c.is_finite())
                        .unwrap_or(1.0)
                        .clamp(0.0, 1.0),
                    ..SectionFinding::absent(*kind)
                },
                _ => SectionFinding::absent(*kind),
            })
            .collect();

        let strengths = &config.match_strengths;
        let keyword_matches: Vec<KeywordMatch> = role
            .keywords
            .iter()
            .map(|k| {
                let reported = self
                    .keyword_matches
                    .iter()
                    .find(|m| m.keyword.trim().eq_ignore_ascii_case(k.keyword.trim()));
                let (kind, matched_term) = match reported {
                    Some(m) if m.matched && m.exact => (MatchKind::Exact, None),
                    Some(m) if m.matched => (MatchKind::Fuzzy, m.matched_term.clone()),
                    _ => (MatchKind::None, None),
                };
                let weight = k.weight.clamp(0.0, 1.0);
                let strength = match kind {
                    MatchKind::Exact => strengths.exact,
                    MatchKind::Fuzzy => strengths.fuzzy,
                    MatchKind::None => 0.0,
                };
                KeywordMatch {
                    keyword: k.keyword.clone(),
                    matched: kind != MatchKind::None,
                    kind,
                    matched_term,
                    weight,
                    contribution: weight * strength,
                }
            })
            .collect();

        let max_sum: f64 = keyword_matches.iter().map(|m| m.weight * strengths.exact).sum();
        let raw_sum: f64 = keyword_matches.iter().map(|m| m.contribution).sum();
        let keyword_coverage = if max_sum > 0.0 {
            (raw_sum / max_sum).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut seen = HashSet::new();
        let suggestions = self
            .suggestions
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();

        Ok(AnalysisResult {
            document_type,
            classification_confidence: confidence,
            ats_score: Some(to_score(ats)),
            format_score: Some(to_score(format)),
            section_score: Some(to_score(section)),
            keyword_coverage: Some(keyword_coverage),
            sections,
            keyword_matches,
            format_checks: vec![],
            suggestions,
            rejection_reason: None,
            analyzer: AnalyzerBackend::Llm,
        })
    }
}
