// LLM prompt constants for the AI analyzer.
// Scores and section names in the response schema mirror `AnalysisResult`.

use crate::analysis::models::ExtractedText;
use crate::roles::RoleProfile;

/// Resume text beyond this many characters is cut before sending.
const MAX_RESUME_CHARS: usize = 24_000;

pub const ANALYSIS_SYSTEM: &str = "You are an applicant tracking system (ATS) auditor. \
    You assess whether a document is a resume and how well it would parse and rank \
    for a given job role. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Replace `{role_name}`, `{category}`, `{seniority}`, `{required_sections}`,
/// `{keywords}` and `{resume_text}` before sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the document below for the role "{role_name}" ({category}, seniority: {seniority}).

Return a JSON object with this EXACT schema (no extra fields):
{
  "document_type": "resume",
  "confidence": 0.95,
  "ats_score": 78,
  "format_score": 85,
  "section_score": 80,
  "sections": [
    {"section": "experience", "present": true, "confidence": 0.9}
  ],
  "keyword_matches": [
    {"keyword": "python", "matched": true, "exact": true, "matched_term": null}
  ],
  "suggestions": ["Add a clearly titled 'Education' section."],
  "rejection_reason": null
}

Rules:

DOCUMENT TYPE: one of "resume", "cover_letter", "transcript", "unknown".
If the document is not a resume, set all three scores to null, leave sections and
keyword_matches empty, and explain why in rejection_reason.

SCORES are integers from 0 to 100:
- section_score: share of the required sections that are present: {required_sections}
- format_score: consistent bullets, consistent date formats, no multi-column tables,
  reasonable length, clear headings
- ats_score: mostly keyword coverage, then sections, then formatting

SECTIONS: use only "contact", "summary", "experience", "education", "skills",
"projects", "other".

KEYWORDS: report every keyword in this list exactly once. Set "exact" to false when
only a synonym or related word form appears, and put that word in "matched_term".
{keywords}

SUGGESTIONS: concrete and actionable; name the section, keyword or formatting issue.

DOCUMENT:
"""
{resume_text}
""""#;

pub fn build_analysis_prompt(text: &ExtractedText, role: &RoleProfile) -> String {
    let seniority = role
        .seniority
        .and_then(|s| serde_json::to_value(s).ok())
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "unspecified".to_string());
    let required_sections = role
        .required_sections
        .iter()
        .map(|s| s.display_name())
        .collect::<Vec<_>>()
        .join(", ");
    let keywords = role
        .keywords
        .iter()
        .map(|k| {
            if k.synonyms.is_empty() {
                format!("- {} (weight {:.2})", k.keyword, k.weight)
            } else {
                format!(
                    "- {} (weight {:.2}; synonyms: {})",
                    k.keyword,
                    k.weight,
                    k.synonyms.join(", ")
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    ANALYSIS_PROMPT_TEMPLATE
        .replace("{role_name}", &role.name)
        .replace("{category}", &role.category)
        .replace("{seniority}", &seniority)
        .replace("{required_sections}", &required_sections)
        .replace("{keywords}", &keywords)
        .replace("{resume_text}", &truncate_chars(&text.full_text(), MAX_RESUME_CHARS))
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{keyword, plain_text, profile};
    use crate::roles::Seniority;

    #[test]
    fn test_prompt_carries_role_and_text() {
        let mut role = profile(vec![
            keyword("python", 1.0, &[]),
            keyword("kubernetes", 0.5, &["k8s"]),
        ]);
        role.seniority = Some(Seniority::Senior);
        let prompt = build_analysis_prompt(&plain_text("SKILLS\nPython, Go"), &role);

        assert!(prompt.contains("\"Backend Developer\""));
        assert!(prompt.contains("seniority: senior"));
        assert!(prompt.contains("- kubernetes (weight 0.50; synonyms: k8s)"));
        assert!(prompt.contains("Contact Information, Experience, Education, Skills"));
        assert!(prompt.contains("Python, Go"));
        assert!(!prompt.contains("{resume_text}"));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
