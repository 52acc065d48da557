//! Section Detector: partitions resume text into canonical sections.
//!
//! Headings are recognized through a closed synonym table. Every line after a
//! recognized heading belongs to that section until the next recognized heading.
//! The first occurrence of a section wins; a repeated heading is body text.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::analysis::models::{
    ExtractedLine, ExtractedText, LineRole, QualityFlag, SectionFinding, SectionKind,
};
use crate::analysis::patterns::{
    has_contact_pattern, DATE_RANGE, NAMED_MONTH_DATE, NUMERIC_MONTH_DATE, YEAR,
};

/// Canonical section name → accepted heading spellings. The first entry of each
/// list is the canonical term.
pub const SECTION_VOCABULARY: &[(SectionKind, &[&str])] = &[
    (
        SectionKind::Contact,
        &[
            "contact",
            "contact information",
            "contact info",
            "contact details",
            "personal information",
            "personal details",
        ],
    ),
    (
        SectionKind::Summary,
        &[
            "summary",
            "professional summary",
            "career summary",
            "profile",
            "professional profile",
            "objective",
            "career objective",
            "about me",
            "overview",
        ],
    ),
    (
        SectionKind::Experience,
        &[
            "experience",
            "work experience",
            "professional experience",
            "relevant experience",
            "work history",
            "employment",
            "employment history",
            "career history",
            "internships",
            "internship experience",
        ],
    ),
    (
        SectionKind::Education,
        &[
            "education",
            "academic background",
            "educational background",
            "academics",
            "academic qualifications",
            "education and training",
            "qualifications",
        ],
    ),
    (
        SectionKind::Skills,
        &[
            "skills",
            "technical skills",
            "key skills",
            "core skills",
            "skills and abilities",
            "core competencies",
            "competencies",
            "technologies",
            "tools and technologies",
            "areas of expertise",
            "expertise",
        ],
    ),
    (
        SectionKind::Projects,
        &[
            "projects",
            "personal projects",
            "academic projects",
            "key projects",
            "selected projects",
            "project experience",
        ],
    ),
    (
        SectionKind::Other,
        &[
            "certifications",
            "certificates",
            "licenses and certifications",
            "awards",
            "honors",
            "honors and awards",
            "achievements",
            "publications",
            "languages",
            "interests",
            "hobbies",
            "volunteer experience",
            "volunteering",
            "activities",
            "extracurricular activities",
            "references",
        ],
    ),
];

const MAX_HEADING_WORDS: usize = 5;
const MIN_DELIMITED_BULLETS: usize = 3;

/// Lowercases a heading and strips decoration such as `:`, `|` and `#`.
fn normalize_heading(text: &str) -> String {
    let trimmed = text.trim_matches(|c: char| !c.is_alphanumeric());
    trimmed
        .to_lowercase()
        .replace('&', " and ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Looks a heading up in the vocabulary. Returns the section and whether the
/// heading used the canonical term.
fn lookup(text: &str) -> Option<(SectionKind, bool)> {
    if text.split_whitespace().count() > MAX_HEADING_WORDS {
        return None;
    }
    let normalized = normalize_heading(text);
    SECTION_VOCABULARY.iter().find_map(|(kind, synonyms)| {
        synonyms
            .iter()
            .position(|s| *s == normalized)
            .map(|idx| (*kind, idx == 0))
    })
}

/// Maps heading text to its canonical section, if the text is a known heading.
pub fn canonical_section(text: &str) -> Option<SectionKind> {
    lookup(text).map(|(kind, _)| kind)
}

/// A line that can open a section: a heading candidate or a short vocabulary line.
pub fn recognized_heading(line: &ExtractedLine) -> Option<SectionKind> {
    if line.role == LineRole::Bullet {
        return None;
    }
    canonical_section(&line.text)
}

// ────────────────────────────────────────────────────────────────────────────
// Detection
// ────────────────────────────────────────────────────────────────────────────

struct Segment {
    kind: SectionKind,
    heading_line: usize,
    /// Exclusive.
    end: usize,
    canonical: bool,
    styled: bool,
}

/// Produces exactly one finding per `SectionKind`, in `SectionKind::ALL` order.
pub fn detect_sections(text: &ExtractedText) -> Vec<SectionFinding> {
    let segments = segment(text);
    if segments.is_empty() {
        // No recognized headings: every section is recorded with zero confidence.
        return SectionKind::ALL
            .iter()
            .map(|kind| SectionFinding::absent(*kind))
            .collect();
    }

    let header_end = segments[0].heading_line;
    SectionKind::ALL
        .iter()
        .map(|kind| {
            let owned: Vec<&Segment> = segments.iter().filter(|s| s.kind == *kind).collect();
            if owned.is_empty() {
                if *kind == SectionKind::Contact {
                    return contact_from_header(text, header_end);
                }
                return SectionFinding::absent(*kind);
            }
            finding_from_segments(text, *kind, &owned)
        })
        .collect()
}

fn segment(text: &ExtractedText) -> Vec<Segment> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut segments: Vec<Segment> = Vec::new();

    for (idx, line) in text.lines.iter().enumerate() {
        let Some((kind, canonical)) = (line.role != LineRole::Bullet)
            .then(|| lookup(&line.text))
            .flatten()
        else {
            continue;
        };

        // Distinct miscellaneous headings (awards, languages, ...) each open a block.
        let key = match kind {
            SectionKind::Other => normalize_heading(&line.text),
            _ => format!("{kind:?}"),
        };
        if !seen.insert(key) {
            continue;
        }

        if let Some(previous) = segments.last_mut() {
            previous.end = idx;
        }
        segments.push(Segment {
            kind,
            heading_line: idx,
            end: text.lines.len(),
            canonical,
            styled: line.role == LineRole::Heading,
        });
    }
    segments
}

fn finding_from_segments(
    text: &ExtractedText,
    kind: SectionKind,
    segments: &[&Segment],
) -> SectionFinding {
    let content: Vec<&ExtractedLine> = segments
        .iter()
        .flat_map(|s| &text.lines[s.heading_line + 1..s.end])
        .collect();
    let first = segments[0];
    let last = segments[segments.len() - 1];

    let mut confidence: f64 = if first.canonical { 1.0 } else { 0.9 };
    if !first.styled {
        confidence -= 0.1;
    }
    if content.is_empty() {
        confidence -= 0.2;
    }

    SectionFinding {
        section: kind,
        present: true,
        confidence: confidence.clamp(0.3, 1.0),
        start_line: Some(first.heading_line),
        end_line: Some(last.end),
        line_count: content.len(),
        bullet_count: content.iter().filter(|l| l.role == LineRole::Bullet).count(),
        quality_flags: quality_flags(kind, &content),
        from_header: false,
    }
}

/// Most resumes put contact details above the first heading without a heading of their own.
fn contact_from_header(text: &ExtractedText, header_end: usize) -> SectionFinding {
    let header = &text.lines[..header_end];
    if !header.iter().any(|l| has_contact_pattern(&l.text)) {
        return SectionFinding::absent(SectionKind::Contact);
    }
    SectionFinding {
        section: SectionKind::Contact,
        present: true,
        confidence: 0.8,
        start_line: Some(0),
        end_line: Some(header_end),
        line_count: header.len(),
        bullet_count: 0,
        quality_flags: vec![],
        from_header: true,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quality flags
// ────────────────────────────────────────────────────────────────────────────

fn quality_flags(kind: SectionKind, content: &[&ExtractedLine]) -> Vec<QualityFlag> {
    let mut flags = Vec::new();
    if content.is_empty() {
        flags.push(QualityFlag::SectionTooShort);
        if kind == SectionKind::Contact {
            flags.push(QualityFlag::NoEmailOrPhone);
        }
        return flags;
    }

    let bullets = content.iter().filter(|l| l.role == LineRole::Bullet).count();
    match kind {
        SectionKind::Contact => {
            if !content.iter().any(|l| has_contact_pattern(&l.text)) {
                flags.push(QualityFlag::NoEmailOrPhone);
            }
        }
        SectionKind::Experience => {
            flags.extend(date_flags(content));
            if bullets == 0 {
                flags.push(QualityFlag::NoBulletPoints);
            }
        }
        SectionKind::Education => {
            if !content.iter().any(|l| YEAR.is_match(&l.text)) {
                flags.push(QualityFlag::NoDatesFound);
            }
        }
        SectionKind::Skills => {
            let delimited = content
                .iter()
                .any(|l| l.text.contains([',', '|', ';', '•', '·', '/']));
            if !delimited && bullets < MIN_DELIMITED_BULLETS {
                flags.push(QualityFlag::NoDelimitedList);
            }
        }
        SectionKind::Projects => {
            if bullets == 0 {
                flags.push(QualityFlag::NoBulletPoints);
            }
        }
        SectionKind::Summary | SectionKind::Other => {}
    }
    flags
}

/// Date checks for experience entries: presence, style consistency and ordering.
fn date_flags(content: &[&ExtractedLine]) -> Vec<QualityFlag> {
    let mut flags = Vec::new();
    let mut any_range = false;
    let mut out_of_order = false;
    let mut named_style = false;
    let mut numeric_style = false;

    for line in content {
        for caps in DATE_RANGE.captures_iter(&line.text) {
            any_range = true;
            let start = parse_date_point(&caps["start"], false);
            let end = parse_date_point(&caps["end"], true);
            if let (Some(start), Some(end)) = (start, end) {
                if start > end {
                    out_of_order = true;
                }
            }
        }
        named_style |= NAMED_MONTH_DATE.is_match(&line.text);
        numeric_style |= NUMERIC_MONTH_DATE.is_match(&line.text);
    }

    if !any_range {
        flags.push(QualityFlag::NoDatesFound);
    }
    if named_style && numeric_style {
        flags.push(QualityFlag::InconsistentDateFormat);
    }
    if out_of_order {
        flags.push(QualityFlag::DateRangeOutOfOrder);
    }
    flags
}

/// Parses one end of a date range. Open ends (`Present`) yield `None`.
/// Bare years resolve to January for a start and December for an end.
fn parse_date_point(raw: &str, is_end: bool) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Some(caps) = NAMED_MONTH_DATE.captures(raw) {
        let month: String = caps["month"].chars().take(3).collect();
        return NaiveDate::parse_from_str(&format!("1 {month} {}", &caps["year"]), "%d %b %Y").ok();
    }
    if let Some(caps) = NUMERIC_MONTH_DATE.captures(raw) {
        let month: u32 = caps["month"].parse().ok()?;
        let year: i32 = caps["year"].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }
    let year: i32 = raw.parse().ok()?;
    NaiveDate::from_ymd_opt(year, if is_end { 12 } else { 1 }, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::plain_text;

    fn finding(findings: &[SectionFinding], kind: SectionKind) -> &SectionFinding {
        findings.iter().find(|f| f.section == kind).unwrap()
    }

    const RESUME: &str = "\
Jane Doe
jane@example.com | 555-123-4567
SUMMARY
Backend engineer focused on data platforms.
WORK HISTORY
Acme Corp, Jan 2020 - Present
• Led migration to PostgreSQL
• Reduced costs by 30%
EDUCATION
B.S. Computer Science, 2016
SKILLS
Python, SQL, Docker";

    #[test]
    fn test_vocabulary_lookup_is_case_insensitive() {
        assert_eq!(canonical_section("WORK HISTORY"), Some(SectionKind::Experience));
        assert_eq!(canonical_section("Technical Skills:"), Some(SectionKind::Skills));
        assert_eq!(canonical_section("Honors & Awards"), Some(SectionKind::Other));
        assert_eq!(canonical_section("Acme Corp"), None);
    }

    #[test]
    fn test_vocabulary_has_no_duplicate_synonyms() {
        let mut seen = HashSet::new();
        for (_, synonyms) in SECTION_VOCABULARY {
            for s in *synonyms {
                assert!(seen.insert(*s), "duplicate synonym {s}");
            }
        }
    }

    #[test]
    fn test_detects_all_sections_in_order() {
        let findings = detect_sections(&plain_text(RESUME));
        let kinds: Vec<SectionKind> = findings.iter().map(|f| f.section).collect();
        assert_eq!(kinds, SectionKind::ALL.to_vec());

        for kind in [
            SectionKind::Contact,
            SectionKind::Summary,
            SectionKind::Experience,
            SectionKind::Education,
            SectionKind::Skills,
        ] {
            assert!(finding(&findings, kind).present, "{kind:?} missing");
        }
        assert!(!finding(&findings, SectionKind::Projects).present);
    }

    #[test]
    fn test_section_boundaries_and_bullets() {
        let findings = detect_sections(&plain_text(RESUME));
        let experience = finding(&findings, SectionKind::Experience);
        assert_eq!(experience.start_line, Some(4));
        assert_eq!(experience.end_line, Some(8));
        assert_eq!(experience.line_count, 3);
        assert_eq!(experience.bullet_count, 2);
        assert!(experience.quality_flags.is_empty(), "{:?}", experience.quality_flags);
    }

    #[test]
    fn test_synonym_confidence_below_canonical() {
        let findings = detect_sections(&plain_text(RESUME));
        let experience = finding(&findings, SectionKind::Experience);
        let education = finding(&findings, SectionKind::Education);
        assert!(experience.confidence < education.confidence);
        assert_eq!(education.confidence, 1.0);
    }

    #[test]
    fn test_contact_comes_from_header_block() {
        let findings = detect_sections(&plain_text(RESUME));
        let contact = finding(&findings, SectionKind::Contact);
        assert!(contact.present);
        assert_eq!(contact.confidence, 0.8);
        assert_eq!(contact.end_line, Some(2));
        assert!(contact.from_header);
    }

    #[test]
    fn test_repeated_heading_is_body_text() {
        let text = plain_text(
            "SKILLS\nRust, Go\nEXPERIENCE\nAcme, 2019 - 2021\n- Shipped\nSKILLS\nMore text\nEDUCATION\nMIT 2018",
        );
        let findings = detect_sections(&text);
        let skills = finding(&findings, SectionKind::Skills);
        assert_eq!(skills.start_line, Some(0));
        assert_eq!(skills.line_count, 1);

        let experience = finding(&findings, SectionKind::Experience);
        // The second SKILLS heading stays inside experience.
        assert_eq!(experience.end_line, Some(7));
        assert_eq!(experience.line_count, 4);
    }

    #[test]
    fn test_no_headings_yields_zero_confidence_findings() {
        let text = plain_text("jane@example.com\nI like building things and writing code.");
        let findings = detect_sections(&text);
        assert_eq!(findings.len(), SectionKind::ALL.len());
        assert!(findings.iter().all(|f| !f.present && f.confidence == 0.0));
    }

    #[test]
    fn test_experience_without_dates_or_bullets_is_flagged() {
        let text = plain_text("EXPERIENCE\nAcme Corp\nWorked on backend systems");
        let findings = detect_sections(&text);
        let experience = finding(&findings, SectionKind::Experience);
        assert!(experience.has_flag(QualityFlag::NoDatesFound));
        assert!(experience.has_flag(QualityFlag::NoBulletPoints));
    }

    #[test]
    fn test_out_of_order_and_mixed_dates_are_flagged() {
        let text = plain_text("EXPERIENCE\nAcme, Mar 2021 - Jan 2019\n- Did work\nInitech, 01/2015 - 12/2016");
        let findings = detect_sections(&text);
        let experience = finding(&findings, SectionKind::Experience);
        assert!(experience.has_flag(QualityFlag::DateRangeOutOfOrder));
        assert!(experience.has_flag(QualityFlag::InconsistentDateFormat));
        assert!(!experience.has_flag(QualityFlag::NoDatesFound));
    }

    #[test]
    fn test_skills_without_list_is_flagged() {
        let text = plain_text("SKILLS\nI know many programming languages well");
        let findings = detect_sections(&text);
        assert!(finding(&findings, SectionKind::Skills).has_flag(QualityFlag::NoDelimitedList));
    }

    #[test]
    fn test_empty_section_is_too_short() {
        let text = plain_text("EDUCATION\nSKILLS\nRust, Go");
        let findings = detect_sections(&text);
        let education = finding(&findings, SectionKind::Education);
        assert!(education.present);
        assert!(education.has_flag(QualityFlag::SectionTooShort));
        assert!(education.confidence < 1.0);
    }

    #[test]
    fn test_distinct_other_headings_are_separate_blocks() {
        let text = plain_text("SKILLS\nRust, Go\nAWARDS\nHackathon winner\nLANGUAGES\nSpanish\nEDUCATION\nMIT 2018");
        let findings = detect_sections(&text);
        let other = finding(&findings, SectionKind::Other);
        assert_eq!(other.start_line, Some(2));
        assert_eq!(other.line_count, 2);
        assert_eq!(finding(&findings, SectionKind::Skills).line_count, 1);
    }

    #[test]
    fn test_parse_date_points() {
        assert_eq!(
            parse_date_point("Sept 2018", false),
            NaiveDate::from_ymd_opt(2018, 9, 1)
        );
        assert_eq!(
            parse_date_point("2019", true),
            NaiveDate::from_ymd_opt(2019, 12, 1)
        );
        assert_eq!(parse_date_point("Present", true), None);
    }
}
