//! # Content Store
//!
//! Read-only guidance content: roadmap phases, templates, role guides,
//! FAQ, glossary, resources, static pages, the assessment question bank
//! and the vendor table.
//!
//! Content is loaded once from a directory of JSON fixtures. A missing
//! fixture is an empty collection; a malformed one is an error, since
//! silently dropping guidance would be worse than refusing to start.

use crate::assessment::AssessmentBank;
use crate::progress::ProgressTotals;
use crate::vendor::{VendorConfig, VendorRegistry};
use crate::{ContentId, PlaybookError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

// =============================================================================
// CONTENT RECORDS
// =============================================================================

/// A roadmap phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub id: String,
    pub number: u8,
    pub name: String,
    #[serde(default)]
    pub summary: String,
}

/// A downloadable document template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: ContentId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// Role ids the template is aimed at. Empty means everyone.
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub format: String,
}

impl Template {
    /// Whether the template shows under a role filter.
    ///
    /// `None` matches everything. Templates with no role list are shared.
    #[must_use]
    pub fn is_for_role(&self, role: Option<&str>) -> bool {
        match role {
            None => true,
            Some(role) => {
                self.roles.is_empty() || self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
            }
        }
    }
}

/// One row of a deep-linked template list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateListing<'a> {
    #[serde(flatten)]
    pub template: &'a Template,
    pub selected: bool,
}

/// A task in a role guide, grouped by phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTask {
    pub id: String,
    pub phase: String,
    pub title: String,
}

/// A role guide (board, audit committee, CFO, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tasks: Vec<RoleTask>,
}

/// A frequently asked question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub id: ContentId,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub category: String,
}

/// A glossary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    pub id: ContentId,
    pub term: String,
    pub definition: String,
}

/// An article or external resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ContentId,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A static site page, searchable by title and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub path: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

// =============================================================================
// CONTENT STORE
// =============================================================================

/// All static content, immutable after loading.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pub phases: Vec<Phase>,
    pub templates: Vec<Template>,
    pub roles: Vec<Role>,
    pub faqs: Vec<Faq>,
    pub glossary: Vec<GlossaryTerm>,
    pub resources: Vec<Resource>,
    pub pages: Vec<Page>,
    pub assessment: AssessmentBank,
    pub vendors: VendorRegistry,
}

impl ContentStore {
    /// Create an empty content store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every fixture from `dir`.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, PlaybookError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(PlaybookError::ContentError(format!(
                "Content directory '{}' does not exist",
                dir.display()
            )));
        }

        let vendors: Vec<VendorConfig> = load_fixture(dir, "vendors.json")?;
        let store = Self {
            phases: load_fixture(dir, "phases.json")?,
            templates: load_fixture(dir, "templates.json")?,
            roles: load_fixture(dir, "roles.json")?,
            faqs: load_fixture(dir, "faq.json")?,
            glossary: load_fixture(dir, "glossary.json")?,
            resources: load_fixture(dir, "resources.json")?,
            pages: load_fixture(dir, "pages.json")?,
            assessment: AssessmentBank::new(load_fixture(dir, "assessment.json")?),
            vendors: VendorRegistry::new(vendors)?,
        };
        store.validate()?;

        tracing::debug!(
            templates = store.templates.len(),
            faqs = store.faqs.len(),
            glossary = store.glossary.len(),
            resources = store.resources.len(),
            questions = store.assessment.question_count(),
            "content loaded"
        );
        Ok(store)
    }

    /// Reject duplicate ids within a collection.
    pub fn validate(&self) -> Result<(), PlaybookError> {
        ensure_unique("phase", self.phases.iter().map(|p| p.id.as_str()))?;
        ensure_unique("template", self.templates.iter().map(|t| t.id.as_str()))?;
        ensure_unique("role", self.roles.iter().map(|r| r.id.as_str()))?;
        ensure_unique("faq", self.faqs.iter().map(|f| f.id.as_str()))?;
        ensure_unique("glossary", self.glossary.iter().map(|g| g.id.as_str()))?;
        ensure_unique("resource", self.resources.iter().map(|r| r.id.as_str()))?;
        ensure_unique("page", self.pages.iter().map(|p| p.path.as_str()))?;
        ensure_unique(
            "question",
            self.assessment.questions().map(|(_, q)| q.id.as_str()),
        )
    }

    /// Look up a template by id.
    #[must_use]
    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id.as_str() == id)
    }

    /// Look up a resource by id.
    #[must_use]
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id.as_str() == id)
    }

    /// Look up a role guide by id.
    #[must_use]
    pub fn role(&self, id: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    /// Templates visible for a role filter (the `role` deep link).
    #[must_use]
    pub fn templates_for_role(&self, role: Option<&str>) -> Vec<&Template> {
        self.templates.iter().filter(|t| t.is_for_role(role)).collect()
    }

    /// Role-filtered templates with the `selected` deep link marked.
    #[must_use]
    pub fn template_listing(
        &self,
        role: Option<&str>,
        selected: Option<&str>,
    ) -> Vec<TemplateListing<'_>> {
        self.templates_for_role(role)
            .into_iter()
            .map(|template| TemplateListing {
                template,
                selected: selected.is_some_and(|s| template.id.as_str() == s),
            })
            .collect()
    }

    /// Whether a role guide contains the given task in the given phase.
    #[must_use]
    pub fn has_task(&self, role: &str, phase: &str, task: &str) -> bool {
        self.role(role)
            .is_some_and(|r| r.tasks.iter().any(|t| t.phase == phase && t.id == task))
    }

    /// Denominators for the overall progress percentage.
    #[must_use]
    pub fn progress_totals(&self) -> ProgressTotals {
        ProgressTotals {
            templates: self.templates.len(),
            tasks: self.roles.iter().map(|r| r.tasks.len()).sum(),
            articles: self.resources.len(),
        }
    }
}

fn load_fixture<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>, PlaybookError> {
    let path = dir.join(name);
    if !path.exists() {
        tracing::warn!(fixture = name, "content fixture missing, treating as empty");
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(&path).map_err(|e| {
        PlaybookError::ContentError(format!("Cannot read '{}': {}", path.display(), e))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| PlaybookError::ContentError(format!("Malformed '{}': {}", name, e)))
}

fn ensure_unique<'a>(
    kind: &str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), PlaybookError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(PlaybookError::ContentError(format!(
                "Duplicate {} id '{}'",
                kind, id
            )));
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn template(id: &str, roles: &[&str]) -> Template {
        Template {
            id: ContentId::new(id),
            title: id.to_string(),
            description: String::new(),
            category: String::new(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            phase: None,
            format: "docx".to_string(),
        }
    }

    #[test]
    fn role_filter_keeps_shared_templates() {
        let store = ContentStore {
            templates: vec![
                template("board-pack", &["board"]),
                template("cfo-memo", &["cfo"]),
                template("glossary-sheet", &[]),
            ],
            ..ContentStore::default()
        };

        let ids: Vec<_> = store
            .templates_for_role(Some("Board"))
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["board-pack", "glossary-sheet"]);
        assert_eq!(store.templates_for_role(None).len(), 3);
    }

    #[test]
    fn listing_marks_selected_template() {
        let store = ContentStore {
            templates: vec![
                template("board-pack", &["board"]),
                template("cfo-memo", &["cfo"]),
                template("glossary-sheet", &[]),
            ],
            ..ContentStore::default()
        };

        let listing = store.template_listing(Some("cfo"), Some("cfo-memo"));
        let rows: Vec<_> = listing
            .iter()
            .map(|l| (l.template.id.as_str(), l.selected))
            .collect();
        assert_eq!(rows, vec![("cfo-memo", true), ("glossary-sheet", false)]);

        // a selection hidden by the role filter marks nothing
        let hidden = store.template_listing(Some("board"), Some("cfo-memo"));
        assert!(hidden.iter().all(|l| !l.selected));

        let json = serde_json::to_value(&listing[0]).expect("serialize");
        assert_eq!(json["id"], "cfo-memo");
        assert_eq!(json["selected"], true);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let store = ContentStore {
            templates: vec![template("a", &[]), template("a", &[])],
            ..ContentStore::default()
        };
        assert!(matches!(
            store.validate(),
            Err(PlaybookError::ContentError(_))
        ));
    }

    #[test]
    fn load_dir_tolerates_missing_fixtures() {
        let temp = tempdir().expect("temp dir");
        std::fs::write(
            temp.path().join("faq.json"),
            r#"[{"id":"scope","question":"Who is in scope?","answer":"Premium listed companies."}]"#,
        )
        .expect("write");

        let store = ContentStore::load_dir(temp.path()).expect("load");
        assert_eq!(store.faqs.len(), 1);
        assert!(store.templates.is_empty());
    }

    #[test]
    fn load_dir_rejects_malformed_fixture() {
        let temp = tempdir().expect("temp dir");
        std::fs::write(temp.path().join("glossary.json"), "{").expect("write");

        assert!(ContentStore::load_dir(temp.path()).is_err());
    }

    #[test]
    fn progress_totals_count_role_tasks() {
        let store = ContentStore {
            roles: vec![Role {
                id: "board".to_string(),
                name: "Board".to_string(),
                description: String::new(),
                tasks: vec![
                    RoleTask {
                        id: "approve-scope".to_string(),
                        phase: "phase-1".to_string(),
                        title: "Approve scope".to_string(),
                    },
                    RoleTask {
                        id: "sign-declaration".to_string(),
                        phase: "phase-4".to_string(),
                        title: "Sign declaration".to_string(),
                    },
                ],
            }],
            templates: vec![template("a", &[])],
            ..ContentStore::default()
        };

        let totals = store.progress_totals();
        assert_eq!(totals.tasks, 2);
        assert_eq!(totals.templates, 1);
        assert!(store.has_task("board", "phase-4", "sign-declaration"));
        assert!(!store.has_task("board", "phase-1", "sign-declaration"));
    }
}
