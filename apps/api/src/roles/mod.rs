//! Role Profile Provider: the job-role catalog the analyzer scores against.
//!
//! Profiles are keyed by `(category, role)` and are read-only once loaded. The
//! catalog comes from `ROLE_CATALOG_PATH` when set, otherwise from the built-in
//! `data/job_roles.json`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::models::SectionKind;

const BUILTIN_CATALOG: &str = include_str!("../../data/job_roles.json");

// ────────────────────────────────────────────────────────────────────────────
// Profile types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    Entry,
    Mid,
    Senior,
    Lead,
}

/// A weighted keyword with accepted alternative spellings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleKeyword {
    pub keyword: String,
    /// Importance in [0, 1].
    pub weight: f64,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleProfile {
    pub name: String,
    pub category: String,
    pub description: String,
    pub keywords: Vec<RoleKeyword>,
    pub required_sections: Vec<SectionKind>,
    /// Carried to the AI analyzer; the heuristic scores ignore it.
    pub seniority: Option<Seniority>,
}

fn default_required_sections() -> Vec<SectionKind> {
    vec![
        SectionKind::Contact,
        SectionKind::Experience,
        SectionKind::Education,
        SectionKind::Skills,
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Catalog file format
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CatalogFile {
    categories: Vec<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
struct CategoryEntry {
    name: String,
    roles: Vec<RoleEntry>,
}

#[derive(Debug, Deserialize)]
struct RoleEntry {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    seniority: Option<Seniority>,
    #[serde(default = "default_required_sections")]
    required_sections: Vec<SectionKind>,
    keywords: Vec<RoleKeyword>,
}

// ────────────────────────────────────────────────────────────────────────────
// Listing (role picker)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RoleSummary {
    pub name: String,
    pub description: String,
    pub seniority: Option<Seniority>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryListing {
    pub name: String,
    pub roles: Vec<RoleSummary>,
}

// ────────────────────────────────────────────────────────────────────────────
// Catalog
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Category {
    name: String,
    roles: Vec<RoleProfile>,
}

#[derive(Debug, Clone)]
pub struct RoleCatalog {
    categories: Vec<Category>,
}

impl RoleCatalog {
    /// Loads the catalog from `path`, or the built-in catalog when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let catalog = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read role catalog {}", path.display()))?;
                Self::from_json(&raw)
                    .with_context(|| format!("Invalid role catalog {}", path.display()))?
            }
            None => Self::builtin()?,
        };
        info!(
            "Role catalog loaded: {} categories, {} roles",
            catalog.categories.len(),
            catalog.role_count()
        );
        Ok(catalog)
    }

    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG).context("Built-in role catalog is invalid")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(raw).context("Malformed role catalog JSON")?;
        let categories = file
            .categories
            .into_iter()
            .map(|category| Category {
                roles: category
                    .roles
                    .into_iter()
                    .map(|role| RoleProfile {
                        name: role.name.trim().to_string(),
                        category: category.name.trim().to_string(),
                        description: role.description,
                        keywords: role.keywords,
                        required_sections: role.required_sections,
                        seniority: role.seniority,
                    })
                    .collect(),
                name: category.name.trim().to_string(),
            })
            .collect();

        let catalog = Self { categories };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            bail!("catalog has no categories");
        }
        for (i, category) in self.categories.iter().enumerate() {
            if category.name.is_empty() {
                bail!("category #{i} has an empty name");
            }
            if self.categories[..i]
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&category.name))
            {
                bail!("duplicate category '{}'", category.name);
            }
            if category.roles.is_empty() {
                bail!("category '{}' has no roles", category.name);
            }
            for (j, role) in category.roles.iter().enumerate() {
                if role.name.is_empty() {
                    bail!("category '{}' has a role with an empty name", category.name);
                }
                if category.roles[..j]
                    .iter()
                    .any(|r| r.name.eq_ignore_ascii_case(&role.name))
                {
                    bail!("duplicate role '{}' in '{}'", role.name, category.name);
                }
                validate_role(role)?;
            }
        }
        Ok(())
    }

    /// Case-insensitive lookup by category and role name.
    pub fn profile(&self, category: &str, role: &str) -> Option<&RoleProfile> {
        let (category, role) = (category.trim(), role.trim());
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(category))?
            .roles
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(role))
    }

    pub fn listing(&self) -> Vec<CategoryListing> {
        self.categories
            .iter()
            .map(|c| CategoryListing {
                name: c.name.clone(),
                roles: c
                    .roles
                    .iter()
                    .map(|r| RoleSummary {
                        name: r.name.clone(),
                        description: r.description.clone(),
                        seniority: r.seniority,
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn role_count(&self) -> usize {
        self.categories.iter().map(|c| c.roles.len()).sum()
    }
}

fn validate_role(role: &RoleProfile) -> Result<()> {
    if role.required_sections.is_empty() {
        bail!("role '{}' requires no sections", role.name);
    }
    for (i, keyword) in role.keywords.iter().enumerate() {
        if keyword.keyword.trim().is_empty() {
            bail!("role '{}' has an empty keyword", role.name);
        }
        if !(0.0..=1.0).contains(&keyword.weight) {
            bail!(
                "keyword '{}' of role '{}' has weight {} outside [0, 1]",
                keyword.keyword,
                role.name,
                keyword.weight
            );
        }
        if role.keywords[..i]
            .iter()
            .any(|k| k.keyword.eq_ignore_ascii_case(&keyword.keyword))
        {
            bail!("duplicate keyword '{}' in role '{}'", keyword.keyword, role.name);
        }
    }
    Ok(())
}
