//! Score Aggregator: combines findings into the three published scores.
//!
//! - `section_score = round(100 × Σ weight(present required) / Σ weight(required))`
//! - `format_score  = round(100 × mean(format checks))`
//! - `ats_score     = round(100 × (α·coverage + β·section/100 + γ·format/100))`
//!
//! All scores are clamped to [0, 100]. Suggestions are concrete (a section name, a
//! keyword, a flag) and ordered by the weakest dimension first.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::analysis::config::AnalysisConfig;
use crate::analysis::keywords::KeywordCoverage;
use crate::analysis::models::{
    ContentType, ExtractedText, KeywordMatch, MatchKind, QualityFlag, SectionFinding,
    SectionKind,
};
use crate::roles::RoleProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatCheckKind {
    BulletConsistency,
    DatePatterns,
    LayoutAnomalies,
    PageCount,
    HeadingStructure,
}

/// One normalized formatting check in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatCheck {
    pub check: FormatCheckKind,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub ats_score: u32,
    pub format_score: u32,
    pub section_score: u32,
    pub keyword_coverage: f64,
    pub format_checks: Vec<FormatCheck>,
    pub suggestions: Vec<String>,
}

/// Rounds a 0–100 value to a published score. Non-finite input scores zero.
pub fn to_score(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u32
}

pub fn aggregate(
    text: &ExtractedText,
    findings: &[SectionFinding],
    coverage: &KeywordCoverage,
    profile: &RoleProfile,
    config: &AnalysisConfig,
) -> ScoreBreakdown {
    let section_score = compute_section_score(findings, profile, config);
    let format_checks = compute_format_checks(text, findings, config);
    let format_score = compute_format_score(&format_checks);
    let keyword_coverage = coverage.normalized();
    let ats_score = compute_ats_score(keyword_coverage, section_score, format_score, config);

    let suggestions = build_suggestions(
        text,
        findings,
        &coverage.matches,
        profile,
        config,
        DimensionScores {
            section: section_score,
            format: format_score,
            keywords: to_score(keyword_coverage * 100.0),
        },
    );

    ScoreBreakdown {
        ats_score,
        format_score,
        section_score,
        keyword_coverage,
        format_checks,
        suggestions,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scores
// ────────────────────────────────────────────────────────────────────────────

fn required_sections(profile: &RoleProfile) -> Vec<SectionKind> {
    let mut required = profile.required_sections.clone();
    required.sort();
    required.dedup();
    required
}

fn is_present(findings: &[SectionFinding], kind: SectionKind) -> bool {
    findings.iter().any(|f| f.section == kind && f.present)
}

pub fn compute_section_score(
    findings: &[SectionFinding],
    profile: &RoleProfile,
    config: &AnalysisConfig,
) -> u32 {
    let weights = &config.section_weights;
    let required = required_sections(profile);
    let total: f64 = required.iter().map(|k| weights.weight(*k)).sum();
    if total <= 0.0 {
        return 0;
    }
    let present: f64 = required
        .iter()
        .filter(|k| is_present(findings, **k))
        .map(|k| weights.weight(*k))
        .sum();
    to_score(100.0 * present / total)
}

pub fn compute_format_checks(
    text: &ExtractedText,
    findings: &[SectionFinding],
    config: &AnalysisConfig,
) -> Vec<FormatCheck> {
    let fmt = &config.format;
    let find = |kind: SectionKind| findings.iter().find(|f| f.section == kind && f.present);

    let entry_sections: Vec<&SectionFinding> = [SectionKind::Experience, SectionKind::Projects]
        .into_iter()
        .filter_map(find)
        .collect();
    let entry_lines: usize = entry_sections.iter().map(|f| f.line_count).sum();
    let entry_bullets: usize = entry_sections.iter().map(|f| f.bullet_count).sum();
    let bullet_consistency = if entry_lines == 0 || fmt.min_bullet_ratio <= 0.0 {
        0.0
    } else {
        let ratio = entry_bullets as f64 / entry_lines as f64;
        (ratio / fmt.min_bullet_ratio).min(1.0)
    };

    let date_patterns = match (find(SectionKind::Experience), find(SectionKind::Education)) {
        (Some(exp), _) if exp.has_flag(QualityFlag::NoDatesFound) => 0.0,
        (Some(exp), _)
            if exp.has_flag(QualityFlag::InconsistentDateFormat)
                || exp.has_flag(QualityFlag::DateRangeOutOfOrder) =>
        {
            0.5
        }
        (Some(_), _) => 1.0,
        (None, Some(edu)) if !edu.has_flag(QualityFlag::NoDatesFound) => 1.0,
        _ => 0.0,
    };

    let layout_anomalies = if text.layout.layout_tables == 0 { 1.0 } else { 0.0 };

    let pages = text.layout.page_count;
    let page_count = match text.content_type {
        ContentType::Pdf if pages <= fmt.ideal_max_pages => 1.0,
        ContentType::Pdf if pages <= fmt.tolerated_max_pages => 0.5,
        ContentType::Pdf => 0.0,
        ContentType::Docx => 1.0,
    };

    // Contact inferred from the header block has no heading of its own.
    let headings = findings
        .iter()
        .filter(|f| f.present && !f.from_header)
        .count();
    let heading_structure = if fmt.min_headings == 0 {
        1.0
    } else {
        (headings as f64 / fmt.min_headings as f64).min(1.0)
    };

    vec![
        FormatCheck {
            check: FormatCheckKind::BulletConsistency,
            score: bullet_consistency,
        },
        FormatCheck {
            check: FormatCheckKind::DatePatterns,
            score: date_patterns,
        },
        FormatCheck {
            check: FormatCheckKind::LayoutAnomalies,
            score: layout_anomalies,
        },
        FormatCheck {
            check: FormatCheckKind::PageCount,
            score: page_count,
        },
        FormatCheck {
            check: FormatCheckKind::HeadingStructure,
            score: heading_structure,
        },
    ]
}

pub fn compute_format_score(checks: &[FormatCheck]) -> u32 {
    if checks.is_empty() {
        return 0;
    }
    let mean = checks.iter().map(|c| c.score.clamp(0.0, 1.0)).sum::<f64>() / checks.len() as f64;
    to_score(100.0 * mean)
}

pub fn compute_ats_score(
    keyword_coverage: f64,
    section_score: u32,
    format_score: u32,
    config: &AnalysisConfig,
) -> u32 {
    let w = &config.ats_weights;
    let combined = w.alpha * keyword_coverage.clamp(0.0, 1.0)
        + w.beta * section_score as f64 / 100.0
        + w.gamma * format_score as f64 / 100.0;
    to_score(100.0 * combined)
}

// ────────────────────────────────────────────────────────────────────────────
// Suggestions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Sections,
    Keywords,
    Format,
}

struct DimensionScores {
    section: u32,
    format: u32,
    keywords: u32,
}

fn build_suggestions(
    text: &ExtractedText,
    findings: &[SectionFinding],
    matches: &[KeywordMatch],
    profile: &RoleProfile,
    config: &AnalysisConfig,
    scores: DimensionScores,
) -> Vec<String> {
    // Stable sort keeps Sections, Keywords, Format order on ties.
    let mut dimensions = [
        (Dimension::Sections, scores.section),
        (Dimension::Keywords, scores.keywords),
        (Dimension::Format, scores.format),
    ];
    dimensions.sort_by_key(|(_, score)| *score);

    let mut seen = HashSet::new();
    let mut suggestions = Vec::new();
    for (dimension, _) in dimensions {
        let items = match dimension {
            Dimension::Sections => section_suggestions(findings, profile, config),
            Dimension::Keywords => keyword_suggestions(matches, config),
            Dimension::Format => format_suggestions(text, findings, config),
        };
        for item in items {
            if seen.insert(item.clone()) {
                suggestions.push(item);
            }
        }
    }
    suggestions
}

fn section_suggestions(
    findings: &[SectionFinding],
    profile: &RoleProfile,
    config: &AnalysisConfig,
) -> Vec<String> {
    let weights = &config.section_weights;
    let mut missing: Vec<SectionKind> = required_sections(profile)
        .into_iter()
        .filter(|k| !is_present(findings, *k))
        .collect();
    // Highest weight first; `required_sections` is sorted, so ties stay deterministic.
    missing.sort_by(|a, b| weights.weight(*b).total_cmp(&weights.weight(*a)));

    let mut out: Vec<String> = missing
        .iter()
        .map(|kind| match kind {
            SectionKind::Contact => {
                "Add contact information (email and phone number) at the top of your resume."
                    .to_string()
            }
            _ => format!(
                "Add a clearly titled '{}' section; it is expected for a {} resume.",
                kind, profile.name
            ),
        })
        .collect();

    for finding in findings.iter().filter(|f| f.present) {
        for flag in finding.quality_flags.iter().filter(|f| !f.is_formatting()) {
            out.push(flag_suggestion(finding.section, *flag));
        }
    }
    out
}

fn keyword_suggestions(matches: &[KeywordMatch], config: &AnalysisConfig) -> Vec<String> {
    let mut unmatched: Vec<&KeywordMatch> = matches.iter().filter(|m| !m.matched).collect();
    unmatched.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| a.keyword.cmp(&b.keyword))
    });

    let mut out: Vec<String> = unmatched
        .iter()
        .take(config.format.max_keyword_suggestions)
        .map(|m| {
            format!(
                "Add the keyword '{}' where it reflects your actual experience.",
                m.keyword
            )
        })
        .collect();

    let mut fuzzy: Vec<&KeywordMatch> = matches
        .iter()
        .filter(|m| m.kind == MatchKind::Fuzzy)
        .collect();
    fuzzy.sort_by(|a, b| a.keyword.cmp(&b.keyword));
    for m in fuzzy {
        let found = m.matched_term.as_deref().unwrap_or("a related term");
        out.push(format!(
            "Use the exact term '{}' (found '{}'); ATS parsers often match keywords literally.",
            m.keyword, found
        ));
    }
    out
}

fn format_suggestions(
    text: &ExtractedText,
    findings: &[SectionFinding],
    config: &AnalysisConfig,
) -> Vec<String> {
    let mut out = Vec::new();
    for finding in findings.iter().filter(|f| f.present) {
        for flag in finding.quality_flags.iter().filter(|f| f.is_formatting()) {
            out.push(flag_suggestion(finding.section, *flag));
        }
    }

    if text.layout.layout_tables > 0 {
        out.push(format!(
            "Replace the {} layout table(s) with plain single-column text; ATS parsers often scramble table cells.",
            text.layout.layout_tables
        ));
    }
    if text.content_type == ContentType::Pdf && text.layout.page_count > config.format.ideal_max_pages
    {
        out.push(format!(
            "Shorten the resume from {} pages to at most {}.",
            text.layout.page_count, config.format.ideal_max_pages
        ));
    }
    out
}

fn flag_suggestion(section: SectionKind, flag: QualityFlag) -> String {
    match flag {
        QualityFlag::NoDatesFound => format!(
            "{section}: add dates to each entry (e.g. 'Jan 2020 - Present')."
        ),
        QualityFlag::NoBulletPoints => {
            format!("{section}: describe each entry with bullet points.")
        }
        QualityFlag::NoDelimitedList => {
            format!("{section}: list skills separated by commas or as bullet points.")
        }
        QualityFlag::InconsistentDateFormat => {
            format!("{section}: use one date format throughout (e.g. 'Mar 2021').")
        }
        QualityFlag::DateRangeOutOfOrder => {
            format!("{section}: a date range ends before it starts; check the dates.")
        }
        QualityFlag::SectionTooShort => format!("{section}: the section is empty; add content."),
        QualityFlag::NoEmailOrPhone => {
            format!("{section}: include an email address or phone number.")
        }
    }
}
