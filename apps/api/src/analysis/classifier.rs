//! Document Classifier: decides whether extracted text is a resume.
//!
//! Resume signals are summed with configurable weights; a document is a resume only
//! when the sum strictly exceeds `resume_threshold`. Otherwise the strongest of the
//! known alternatives (cover letter, transcript) wins if it clears
//! `alternative_threshold` and beats every other alternative; anything else is
//! `unknown`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::config::ClassifierConfig;
use crate::analysis::models::{DocumentType, ExtractedText, LineRole, SectionKind};
use crate::analysis::patterns::{has_contact_pattern, CLOSING, COURSE_CODE, SALUTATION};
use crate::analysis::sections::recognized_heading;

const CORE_HEADINGS: [SectionKind; 3] = [
    SectionKind::Experience,
    SectionKind::Education,
    SectionKind::Skills,
];

/// Body text counts as essay-like prose above either limit.
const MAX_AVG_LINE_CHARS: f64 = 120.0;
const MAX_LONG_SENTENCE_SHARE: f64 = 0.5;
const LONG_LINE_WORDS: usize = 15;
const SENTENCE_WORDS: usize = 8;
/// Name lines, sign-offs and single contact tokens are ignored for prose density.
const MIN_PROSE_WORDS: usize = 3;
const MIN_COURSE_CODES: usize = 3;

static APPLICATION_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:position|application|apply|applying|opportunity)\b").unwrap()
});
static TRANSCRIPT_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:transcript|academic record)\b").unwrap());
static GPA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:c?gpa|grade point average)\b").unwrap());
static CREDITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:credits?|credit hours|units attempted)\b").unwrap());
static TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:semester|trimester|term)\b").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub document_type: DocumentType,
    pub confidence: f64,
    /// Human-readable signals that fired, in evaluation order.
    pub signals: Vec<String>,
}

impl Classification {
    pub fn is_resume(&self) -> bool {
        self.document_type == DocumentType::Resume
    }

    /// Explanation attached to a rejected analysis.
    pub fn rejection_reason(&self) -> String {
        let detail = if self.signals.is_empty() {
            "no resume signals found".to_string()
        } else {
            self.signals.join("; ")
        };
        match self.document_type {
            DocumentType::Unknown => {
                format!("document could not be identified as a resume ({detail})")
            }
            other => format!("document looks like a {} ({detail})", other.as_str().replace('_', " ")),
        }
    }
}

/// Accumulates weighted signals for one candidate type.
#[derive(Default)]
struct Tally {
    score: f64,
    signals: Vec<String>,
}

impl Tally {
    fn add(&mut self, fired: bool, weight: f64, signal: &str) {
        if fired {
            self.score += weight;
            self.signals.push(signal.to_string());
        }
    }
}

pub fn classify(text: &ExtractedText, config: &ClassifierConfig) -> Classification {
    if text.is_blank() {
        return Classification {
            document_type: DocumentType::Unknown,
            confidence: 0.0,
            signals: vec![],
        };
    }

    let full = text.full_text();
    let prose = is_prose(text);

    let resume = resume_tally(text, prose, config);
    if resume.score > config.resume_threshold {
        return Classification {
            document_type: DocumentType::Resume,
            confidence: resume.score.clamp(0.0, 1.0),
            signals: resume.signals,
        };
    }

    let alternatives = [
        (DocumentType::CoverLetter, cover_letter_tally(text, &full, prose)),
        (DocumentType::Transcript, transcript_tally(&full)),
    ];
    let best = alternatives
        .iter()
        .map(|(_, t)| t.score)
        .fold(0.0_f64, f64::max);
    let winners: Vec<&(DocumentType, Tally)> =
        alternatives.iter().filter(|(_, t)| t.score == best).collect();

    if best >= config.alternative_threshold && winners.len() == 1 {
        let (document_type, tally) = winners[0];
        return Classification {
            document_type: *document_type,
            confidence: tally.score.clamp(0.0, 1.0),
            signals: tally.signals.clone(),
        };
    }

    let strongest = best.max(resume.score).clamp(0.0, 1.0);
    Classification {
        document_type: DocumentType::Unknown,
        confidence: 1.0 - strongest,
        signals: resume.signals,
    }
}

fn resume_tally(text: &ExtractedText, prose: bool, config: &ClassifierConfig) -> Tally {
    let mut tally = Tally::default();
    tally.add(
        text.lines.iter().any(|l| has_contact_pattern(&l.text)),
        config.contact_weight,
        "contact details",
    );

    let mut core: Vec<SectionKind> = text
        .lines
        .iter()
        .filter_map(recognized_heading)
        .filter(|kind| CORE_HEADINGS.contains(kind))
        .collect();
    core.sort();
    core.dedup();
    match core.len() {
        0 => {}
        1 => tally.add(true, config.headings_weight / 2.0, "one core resume heading"),
        _ => tally.add(true, config.headings_weight, "core resume headings"),
    }

    tally.add(!prose, config.structure_weight, "list-like structure");
    tally
}

fn cover_letter_tally(text: &ExtractedText, full: &str, prose: bool) -> Tally {
    let mut tally = Tally::default();
    tally.add(
        text.lines.iter().any(|l| SALUTATION.is_match(&l.text)),
        0.35,
        "salutation",
    );
    tally.add(
        text.lines.iter().any(|l| CLOSING.is_match(&l.text)),
        0.25,
        "letter closing",
    );
    tally.add(prose, 0.25, "essay-like prose");
    tally.add(APPLICATION_WORDS.is_match(full), 0.15, "mentions the application");
    tally
}

fn transcript_tally(full: &str) -> Tally {
    let mut tally = Tally::default();
    tally.add(TRANSCRIPT_WORD.is_match(full), 0.35, "transcript title");
    tally.add(GPA.is_match(full), 0.2, "GPA");
    tally.add(CREDITS.is_match(full), 0.15, "credit hours");
    tally.add(TERM.is_match(full), 0.1, "academic terms");
    tally.add(
        COURSE_CODE.find_iter(full).count() >= MIN_COURSE_CODES,
        0.2,
        "course codes",
    );
    tally
}

/// True when body lines read like paragraphs rather than resume entries.
fn is_prose(text: &ExtractedText) -> bool {
    let body: Vec<&str> = text
        .lines
        .iter()
        .filter(|l| l.role == LineRole::Body)
        .map(|l| l.text.trim())
        .filter(|l| l.split_whitespace().count() >= MIN_PROSE_WORDS)
        .collect();
    if body.is_empty() {
        return false;
    }

    let avg_chars =
        body.iter().map(|l| l.chars().count()).sum::<usize>() as f64 / body.len() as f64;
    let long = body.iter().filter(|l| is_long_sentence(l)).count();
    avg_chars >= MAX_AVG_LINE_CHARS || long as f64 / body.len() as f64 >= MAX_LONG_SENTENCE_SHARE
}

fn is_long_sentence(line: &str) -> bool {
    let words = line.split_whitespace().count();
    words >= LONG_LINE_WORDS || (words >= SENTENCE_WORDS && line.ends_with(['.', '!', '?']))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::extractor::extract;
    use crate::analysis::models::{ContentType, RawDocument};
    use crate::analysis::test_support::{clean_resume_docx, plain_text};

    const COVER_LETTER: &str = "\
Jane Doe
jane@example.com
Dear Hiring Manager,
I am writing to apply for the Backend Developer position at Acme Corp, which I saw advertised on your careers page.
Over the past six years I have built data platforms in Python and SQL, and I would welcome the chance to bring that experience to your team.
My work experience includes leading a migration that cut infrastructure costs by a third across the company.
Thank you for considering my application; I look forward to hearing from you.
Sincerely,
Jane Doe";

    const TRANSCRIPT: &str = "\
OFFICIAL TRANSCRIPT
State University
Student: Jane Doe
Fall Semester 2016
CS 101 Intro to Programming A 4.0 credits
MATH 201 Linear Algebra B+ 3.0 credits
PHYS 150 Mechanics A- 4.0 credits
Cumulative GPA: 3.72";

    #[test]
    fn test_clean_docx_resume_is_resume() {
        let doc = RawDocument::new(clean_resume_docx(), ContentType::Docx);
        let text = extract(&doc).unwrap();
        let c = classify(&text, &ClassifierConfig::default());
        assert_eq!(c.document_type, DocumentType::Resume);
        assert!((c.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cover_letter_is_never_a_resume() {
        let c = classify(&plain_text(COVER_LETTER), &ClassifierConfig::default());
        assert_eq!(c.document_type, DocumentType::CoverLetter);
        assert!(c.signals.iter().any(|s| s == "essay-like prose"));
        assert!(c.confidence >= 0.5);
        assert!(c.rejection_reason().contains("cover letter"));
    }

    #[test]
    fn test_transcript_detected() {
        let c = classify(&plain_text(TRANSCRIPT), &ClassifierConfig::default());
        assert_eq!(c.document_type, DocumentType::Transcript);
        assert!(c.signals.iter().any(|s| s == "course codes"));
    }

    #[test]
    fn test_blank_document_is_unknown_with_zero_confidence() {
        let c = classify(&plain_text("   \n\n"), &ClassifierConfig::default());
        assert_eq!(c.document_type, DocumentType::Unknown);
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn test_contact_and_structure_alone_do_not_reach_threshold() {
        // 0.3 + 0.3 equals the threshold, which is not enough.
        let c = classify(
            &plain_text("Jane Doe\njane@example.com\nRust\nGo"),
            &ClassifierConfig::default(),
        );
        assert_eq!(c.document_type, DocumentType::Unknown);
        assert!((c.confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_single_core_heading_counts_half() {
        let c = classify(
            &plain_text("Jane Doe\njane@example.com\nSKILLS\nRust, Go"),
            &ClassifierConfig::default(),
        );
        assert_eq!(c.document_type, DocumentType::Resume);
        assert!((c.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_custom_threshold_is_respected() {
        let config = ClassifierConfig {
            resume_threshold: 0.9,
            ..ClassifierConfig::default()
        };
        let c = classify(
            &plain_text("Jane Doe\njane@example.com\nSKILLS\nRust, Go"),
            &config,
        );
        assert_ne!(c.document_type, DocumentType::Resume);
    }

    #[test]
    fn test_unrelated_notes_are_unknown() {
        let c = classify(
            &plain_text("Groceries\nmilk\neggs\nbread"),
            &ClassifierConfig::default(),
        );
        assert_eq!(c.document_type, DocumentType::Unknown);
        assert!(c.rejection_reason().contains("could not be identified"));
    }

    #[test]
    fn test_is_long_sentence() {
        assert!(is_long_sentence("I am writing to apply for the open position here."));
        assert!(!is_long_sentence("Python, SQL, Docker"));
    }
}
