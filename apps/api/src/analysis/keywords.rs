//! Keyword Matcher: measures how well resume text covers a role profile's keywords.
//!
//! Matching order per keyword:
//! 1. exact case-insensitive substring → `MatchKind::Exact`
//! 2. declared synonym as whole words, or a shared word stem → `MatchKind::Fuzzy`
//! 3. otherwise `MatchKind::None`
//!
//! Each keyword contributes `weight × strength`; strengths come from `MatchStrengths`.

use serde::{Deserialize, Serialize};

use crate::analysis::config::MatchStrengths;
use crate::analysis::models::{ExtractedText, KeywordMatch, MatchKind};
use crate::roles::{RoleKeyword, RoleProfile};

const MIN_STEM_LEN: usize = 4;
/// Longest suffixes first so `ments` wins over `s`.
const SUFFIXES: &[&str] = &["ments", "ment", "ings", "ing", "ers", "er", "ed", "es", "s"];

/// Per-keyword matches plus the weighted sums behind the coverage ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCoverage {
    pub matches: Vec<KeywordMatch>,
    pub raw_sum: f64,
    pub max_sum: f64,
}

impl KeywordCoverage {
    /// Weighted coverage in [0, 1]. A profile without weighted keywords covers nothing.
    pub fn normalized(&self) -> f64 {
        if self.max_sum <= 0.0 {
            return 0.0;
        }
        (self.raw_sum / self.max_sum).clamp(0.0, 1.0)
    }
}

/// Lowercased text plus its raw and stemmed token streams, built once per document.
struct Haystack {
    text: String,
    words: String,
    stems: String,
}

impl Haystack {
    fn new(text: &ExtractedText) -> Self {
        let text = text.full_text().to_lowercase();
        let words = format!(" {} ", tokens(&text).collect::<Vec<_>>().join(" "));
        let stems = format!(" {} ", stem_phrase(&text));
        Self { text, words, stems }
    }

    fn contains(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        !term.is_empty() && self.text.contains(&term)
    }

    /// Whole-word match: `ts` matches "TS, Go" but not "results".
    fn contains_words(&self, term: &str) -> bool {
        let term = tokens(&term.to_lowercase()).collect::<Vec<_>>().join(" ");
        !term.is_empty() && self.words.contains(&format!(" {term} "))
    }

    /// Returns the stemmed form when every word of `term` appears, stemmed and in order.
    fn contains_stem(&self, term: &str) -> Option<String> {
        let stemmed = stem_phrase(&term.to_lowercase());
        if stemmed.is_empty() || stemmed.split(' ').all(|w| w.chars().count() < MIN_STEM_LEN) {
            return None;
        }
        self.stems
            .contains(&format!(" {stemmed} "))
            .then_some(stemmed)
    }
}

pub fn match_keywords(
    text: &ExtractedText,
    profile: &RoleProfile,
    strengths: &MatchStrengths,
) -> KeywordCoverage {
    let haystack = Haystack::new(text);
    let mut raw_sum = 0.0;
    let mut max_sum = 0.0;

    let matches: Vec<KeywordMatch> = profile
        .keywords
        .iter()
        .map(|keyword| {
            let m = match_one(&haystack, keyword, strengths);
            raw_sum += m.contribution;
            max_sum += m.weight * strengths.exact;
            m
        })
        .collect();

    KeywordCoverage {
        matches,
        raw_sum,
        max_sum,
    }
}

fn match_one(haystack: &Haystack, keyword: &RoleKeyword, strengths: &MatchStrengths) -> KeywordMatch {
    let weight = keyword.weight.clamp(0.0, 1.0);
    let (kind, matched_term) = if haystack.contains(&keyword.keyword) {
        (MatchKind::Exact, None)
    } else if let Some(synonym) = keyword.synonyms.iter().find(|s| haystack.contains_words(s)) {
        (MatchKind::Fuzzy, Some(synonym.clone()))
    } else if let Some(stem) = haystack.contains_stem(&keyword.keyword) {
        (MatchKind::Fuzzy, Some(stem))
    } else {
        (MatchKind::None, None)
    };

    let strength = match kind {
        MatchKind::Exact => strengths.exact,
        MatchKind::Fuzzy => strengths.fuzzy,
        MatchKind::None => 0.0,
    };

    KeywordMatch {
        keyword: keyword.keyword.clone(),
        matched: kind != MatchKind::None,
        kind,
        matched_term,
        weight,
        contribution: weight * strength,
    }
}

/// Splits text into word tokens, keeping `+`, `#` and `.` inside words such as `c++`,
/// `c#`, `node.js`.
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty())
}

fn stem_phrase(text: &str) -> String {
    tokens(text).map(stem).collect::<Vec<_>>().join(" ")
}

/// Light suffix stripping: `managing`, `managed`, `management` and `manager` all
/// reduce to `manag`.
fn stem(word: &str) -> String {
    if !word.chars().all(char::is_alphabetic) {
        return word.to_string();
    }
    let mut stem = word;
    for suffix in SUFFIXES {
        if let Some(stripped) = word.strip_suffix(suffix) {
            if stripped.chars().count() >= MIN_STEM_LEN {
                stem = stripped;
                break;
            }
        }
    }
    match stem.strip_suffix('e') {
        Some(stripped) if stripped.chars().count() >= MIN_STEM_LEN => stripped.to_string(),
        _ => stem.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{keyword, plain_text, profile};

    const TEXT: &str = "SKILLS\nPython, PostgreSQL, Kubernetes\nManaged a team of four engineers";

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let p = profile(vec![keyword("python", 1.0, &[])]);
        let coverage = match_keywords(&plain_text(TEXT), &p, &MatchStrengths::default());
        assert_eq!(coverage.matches[0].kind, MatchKind::Exact);
        assert_eq!(coverage.matches[0].contribution, 1.0);
        assert_eq!(coverage.normalized(), 1.0);
    }

    #[test]
    fn test_synonym_match_is_fuzzy() {
        let p = profile(vec![keyword("k8s", 0.5, &["kubernetes"])]);
        let coverage = match_keywords(&plain_text(TEXT), &p, &MatchStrengths::default());
        let m = &coverage.matches[0];
        assert_eq!(m.kind, MatchKind::Fuzzy);
        assert_eq!(m.matched_term.as_deref(), Some("kubernetes"));
        assert!((m.contribution - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_synonym_must_match_whole_words() {
        let p = profile(vec![
            keyword("typescript", 1.0, &["ts"]),
            keyword("swift", 1.0, &["ios"]),
            keyword("figma", 1.0, &["ui"]),
        ]);
        let text = plain_text("Delivered results for internal portfolios\nBuilt a quick guide");
        let coverage = match_keywords(&text, &p, &MatchStrengths::default());
        assert!(coverage.matches.iter().all(|m| m.kind == MatchKind::None));
        assert_eq!(coverage.normalized(), 0.0);

        let text = plain_text("Stack: TS, iOS and UI/UX reviews");
        let coverage = match_keywords(&text, &p, &MatchStrengths::default());
        let terms: Vec<Option<&str>> = coverage
            .matches
            .iter()
            .map(|m| m.matched_term.as_deref())
            .collect();
        assert_eq!(terms, vec![Some("ts"), Some("ios"), Some("ui")]);
    }

    #[test]
    fn test_multi_word_synonym_matches_across_punctuation() {
        let p = profile(vec![keyword("tableau", 1.0, &["power bi"])]);
        let text = plain_text("Dashboards in Power-BI and Excel");
        let coverage = match_keywords(&text, &p, &MatchStrengths::default());
        assert_eq!(coverage.matches[0].kind, MatchKind::Fuzzy);
    }

    #[test]
    fn test_stem_match_is_fuzzy() {
        let p = profile(vec![keyword("management", 1.0, &[])]);
        let coverage = match_keywords(&plain_text(TEXT), &p, &MatchStrengths::default());
        assert_eq!(coverage.matches[0].kind, MatchKind::Fuzzy);
        assert!((coverage.normalized() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_missing_keyword_contributes_nothing() {
        let p = profile(vec![keyword("java", 1.0, &["jvm"]), keyword("python", 1.0, &[])]);
        let coverage = match_keywords(&plain_text(TEXT), &p, &MatchStrengths::default());
        assert_eq!(coverage.matches[0].kind, MatchKind::None);
        assert!(!coverage.matches[0].matched);
        assert_eq!(coverage.matches[0].contribution, 0.0);
        assert!((coverage.normalized() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_one_match_per_keyword_in_profile_order() {
        let p = profile(vec![
            keyword("sql", 0.8, &[]),
            keyword("rust", 0.4, &[]),
            keyword("python", 1.0, &[]),
        ]);
        let coverage = match_keywords(&plain_text(TEXT), &p, &MatchStrengths::default());
        let names: Vec<&str> = coverage.matches.iter().map(|m| m.keyword.as_str()).collect();
        assert_eq!(names, vec!["sql", "rust", "python"]);
    }

    #[test]
    fn test_keyword_order_does_not_change_coverage() {
        let forward = profile(vec![
            keyword("sql", 0.8, &[]),
            keyword("rust", 0.4, &[]),
            keyword("k8s", 0.7, &["kubernetes"]),
        ]);
        let mut reversed = forward.clone();
        reversed.keywords.reverse();

        let text = plain_text(TEXT);
        let a = match_keywords(&text, &forward, &MatchStrengths::default());
        let b = match_keywords(&text, &reversed, &MatchStrengths::default());
        assert!((a.normalized() - b.normalized()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_profile_has_zero_coverage() {
        let coverage = match_keywords(&plain_text(TEXT), &profile(vec![]), &MatchStrengths::default());
        assert!(coverage.matches.is_empty());
        assert_eq!(coverage.normalized(), 0.0);
    }

    #[test]
    fn test_custom_strengths_apply() {
        let strengths = MatchStrengths {
            exact: 1.0,
            fuzzy: 0.25,
        };
        let p = profile(vec![keyword("k8s", 1.0, &["kubernetes"])]);
        let coverage = match_keywords(&plain_text(TEXT), &p, &strengths);
        assert!((coverage.normalized() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_stem() {
        assert_eq!(stem("managing"), "manag");
        assert_eq!(stem("managed"), "manag");
        assert_eq!(stem("management"), "manag");
        assert_eq!(stem("manager"), "manag");
        assert_eq!(stem("sql"), "sql");
        assert_eq!(stem("uses"), "uses");
    }

    #[test]
    fn test_stem_phrase_keeps_language_names() {
        assert_eq!(stem_phrase("c++, c# and node.js."), "c++ c# and node.js");
    }
}
