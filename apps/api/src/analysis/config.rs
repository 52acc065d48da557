//! Tuning knobs for the heuristic analyzer.
//!
//! Every threshold and weight used by classification and scoring lives here with a
//! documented default. The values are a starting point to validate against real
//! resumes, not a reproduction of any prior scoring system. Override them with a JSON
//! file (`ANALYSIS_CONFIG_PATH`); omitted fields keep their defaults.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::models::SectionKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub classifier: ClassifierConfig,
    pub section_weights: SectionWeights,
    pub match_strengths: MatchStrengths,
    pub ats_weights: AtsWeights,
    pub format: FormatConfig,
}

/// Signal weights and thresholds for the document classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// A document is a resume only when its signal sum exceeds this value.
    pub resume_threshold: f64,
    /// Minimum score for a specific non-resume type; below it the type is `unknown`.
    pub alternative_threshold: f64,
    pub contact_weight: f64,
    /// Awarded in full for two or more core headings, half for exactly one.
    pub headings_weight: f64,
    /// Awarded when the body is not essay-like prose.
    pub structure_weight: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            resume_threshold: 0.6,
            alternative_threshold: 0.5,
            contact_weight: 0.3,
            headings_weight: 0.4,
            structure_weight: 0.3,
        }
    }
}

/// Criticality of each section for `section_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionWeights {
    pub contact: f64,
    pub summary: f64,
    pub experience: f64,
    pub education: f64,
    pub skills: f64,
    pub projects: f64,
    pub other: f64,
}

impl Default for SectionWeights {
    fn default() -> Self {
        Self {
            contact: 0.2,
            summary: 0.1,
            experience: 0.35,
            education: 0.2,
            skills: 0.25,
            projects: 0.1,
            other: 0.0,
        }
    }
}

impl SectionWeights {
    pub fn weight(&self, kind: SectionKind) -> f64 {
        let w = match kind {
            SectionKind::Contact => self.contact,
            SectionKind::Summary => self.summary,
            SectionKind::Experience => self.experience,
            SectionKind::Education => self.education,
            SectionKind::Skills => self.skills,
            SectionKind::Projects => self.projects,
            SectionKind::Other => self.other,
        };
        w.max(0.0)
    }
}

/// Strength credited to each keyword match kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchStrengths {
    pub exact: f64,
    pub fuzzy: f64,
}

impl Default for MatchStrengths {
    fn default() -> Self {
        Self {
            exact: 1.0,
            fuzzy: 0.6,
        }
    }
}

/// `ats = alpha * keyword coverage + beta * section + gamma * format`.
/// Content match gets the largest share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtsWeights {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl Default for AtsWeights {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.3,
            gamma: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Share of experience/project lines that should be bullets for full credit.
    pub min_bullet_ratio: f64,
    /// PDF page counts up to this value get full credit.
    pub ideal_max_pages: u32,
    /// PDF page counts up to this value get half credit.
    pub tolerated_max_pages: u32,
    /// Recognized headings needed for full heading-structure credit.
    pub min_headings: usize,
    /// Unmatched keywords listed in suggestions.
    pub max_keyword_suggestions: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            min_bullet_ratio: 0.3,
            ideal_max_pages: 2,
            tolerated_max_pages: 3,
            min_headings: 3,
            max_keyword_suggestions: 5,
        }
    }
}

impl AnalysisConfig {
    /// Loads the config from an optional JSON file, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read analysis config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid analysis config {}", path.display()))?
            }
            None => AnalysisConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let AtsWeights { alpha, beta, gamma } = self.ats_weights;
        if [alpha, beta, gamma].iter().any(|w| !(0.0..=1.0).contains(w)) {
            bail!("ATS weights must each lie in [0, 1]");
        }
        if ((alpha + beta + gamma) - 1.0).abs() > 1e-6 {
            bail!("ATS weights must sum to 1.0 (got {})", alpha + beta + gamma);
        }
        if !(alpha >= beta && alpha >= gamma) {
            bail!("ATS keyword weight (alpha) must be the largest share");
        }

        let c = &self.classifier;
        for (name, value) in [
            ("resume_threshold", c.resume_threshold),
            ("alternative_threshold", c.alternative_threshold),
            ("contact_weight", c.contact_weight),
            ("headings_weight", c.headings_weight),
            ("structure_weight", c.structure_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("classifier.{name} must lie in [0, 1] (got {value})");
            }
        }

        let m = &self.match_strengths;
        if !(0.0..=1.0).contains(&m.exact) || !(0.0..=1.0).contains(&m.fuzzy) {
            bail!("match strengths must lie in [0, 1]");
        }
        if m.fuzzy > m.exact {
            bail!("fuzzy match strength cannot exceed exact match strength");
        }

        if self.format.tolerated_max_pages < self.format.ideal_max_pages {
            bail!("format.tolerated_max_pages must be >= format.ideal_max_pages");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_required_sections_sum_to_one() {
        let w = SectionWeights::default();
        let sum = w.weight(SectionKind::Contact)
            + w.weight(SectionKind::Experience)
            + w.weight(SectionKind::Education)
            + w.weight(SectionKind::Skills);
        assert!((sum - 1.0).abs() < 1e-9, "sum was {sum}");
    }

    #[test]
    fn test_ats_weights_must_sum_to_one() {
        let mut config = AnalysisConfig::default();
        config.ats_weights.gamma = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_alpha_must_be_largest_share() {
        let mut config = AnalysisConfig::default();
        config.ats_weights = AtsWeights {
            alpha: 0.2,
            beta: 0.5,
            gamma: 0.3,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"classifier": {{"resume_threshold": 0.7}}}}"#).unwrap();

        let config = AnalysisConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.classifier.resume_threshold, 0.7);
        assert_eq!(config.classifier.alternative_threshold, 0.5);
        assert_eq!(config.ats_weights, AtsWeights::default());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let missing = Path::new("/nonexistent/analysis.json");
        assert!(AnalysisConfig::load(Some(missing)).is_err());
    }
}
