//! # Search
//!
//! Linear, case-insensitive scan over the static content collections.
//!
//! No tokenization, stemming or index: each query walks every template,
//! FAQ, glossary term, article and page. Ranking per item:
//!
//! | Match                          | Score          |
//! |--------------------------------|----------------|
//! | title equals query             | 100            |
//! | title starts with query        | 80             |
//! | title contains query           | 60             |
//! | any other field contains query | 40             |
//! | individual query words         | 10 per word    |
//!
//! Results sort by score (descending) then title, and each category is
//! truncated to `limit` after counting its total.

use crate::PlaybookError;
use crate::content::ContentStore;
use crate::primitives::{MAX_QUERY_LENGTH, MAX_RECENT_SEARCHES, MIN_QUERY_LENGTH};
use serde::{Deserialize, Serialize};

/// Title equals the query.
pub const SCORE_EXACT: u32 = 100;
/// Title starts with the query.
pub const SCORE_PREFIX: u32 = 80;
/// Title contains the query.
pub const SCORE_TITLE_SUBSTRING: u32 = 60;
/// Another searchable field contains the query.
pub const SCORE_FIELD_SUBSTRING: u32 = 40;
/// Per query word found in any field.
pub const SCORE_PER_WORD: u32 = 10;

// =============================================================================
// RESULT TYPES
// =============================================================================

/// Content collection a hit comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchCategory {
    Template,
    Faq,
    Glossary,
    Article,
    Page,
}

/// One ranked match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub category: SearchCategory,
    /// Content id, or the path for pages.
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub score: u32,
}

/// Top hits of one category plus the count before truncation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResults {
    pub hits: Vec<SearchHit>,
    pub total: usize,
}

/// Results of [`global_search`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub templates: CategoryResults,
    pub faqs: CategoryResults,
    pub glossary: CategoryResults,
    pub articles: CategoryResults,
    pub pages: CategoryResults,
}

impl SearchResults {
    /// Matches across all categories, before truncation.
    #[must_use]
    pub fn total(&self) -> usize {
        self.categories().map(|(_, c)| c.total).sum()
    }

    /// Whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Categories in display order.
    pub fn categories(&self) -> impl Iterator<Item = (SearchCategory, &CategoryResults)> {
        [
            (SearchCategory::Template, &self.templates),
            (SearchCategory::Faq, &self.faqs),
            (SearchCategory::Glossary, &self.glossary),
            (SearchCategory::Article, &self.articles),
            (SearchCategory::Page, &self.pages),
        ]
        .into_iter()
    }
}

// =============================================================================
// SCORING
// =============================================================================

/// Normalised query: lower-cased phrase and its words.
struct Needle {
    phrase: String,
    words: Vec<String>,
}

impl Needle {
    fn new(query: &str) -> Self {
        let phrase = query.trim().to_lowercase();
        let words = phrase.split_whitespace().map(str::to_string).collect();
        Self { phrase, words }
    }
}

/// Score one item. `fields` are the searchable fields other than the title.
fn score_item(needle: &Needle, title: &str, fields: &[&str]) -> u32 {
    let title = title.to_lowercase();
    if title == needle.phrase {
        return SCORE_EXACT;
    }
    if title.starts_with(&needle.phrase) {
        return SCORE_PREFIX;
    }
    if title.contains(&needle.phrase) {
        return SCORE_TITLE_SUBSTRING;
    }

    let fields: Vec<String> = fields.iter().map(|f| f.to_lowercase()).collect();
    if fields.iter().any(|f| f.contains(&needle.phrase)) {
        return SCORE_FIELD_SUBSTRING;
    }

    let matched = needle
        .words
        .iter()
        .filter(|w| title.contains(w.as_str()) || fields.iter().any(|f| f.contains(w.as_str())))
        .count() as u32;
    matched * SCORE_PER_WORD
}

fn rank(mut hits: Vec<SearchHit>, limit: usize) -> CategoryResults {
    hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.title.cmp(&b.title)));
    let total = hits.len();
    hits.truncate(limit);
    CategoryResults { hits, total }
}

fn collect<'a, T: 'a>(
    items: impl Iterator<Item = &'a T>,
    needle: &Needle,
    limit: usize,
    hit: impl Fn(&'a T, &Needle) -> Option<SearchHit>,
) -> CategoryResults {
    rank(items.filter_map(|item| hit(item, needle)).collect(), limit)
}

fn make_hit(
    category: SearchCategory,
    id: &str,
    title: &str,
    snippet: &str,
    score: u32,
) -> Option<SearchHit> {
    (score > 0).then(|| SearchHit {
        category,
        id: id.to_string(),
        title: title.to_string(),
        snippet: snippet.to_string(),
        score,
    })
}

// =============================================================================
// GLOBAL SEARCH
// =============================================================================

/// Search every content collection for `query`.
///
/// Queries shorter than the minimum length return empty results.
pub fn global_search(
    content: &ContentStore,
    query: &str,
    limit: usize,
) -> Result<SearchResults, PlaybookError> {
    let trimmed = query.trim();
    if trimmed.chars().count() > MAX_QUERY_LENGTH {
        return Err(PlaybookError::InvalidInput(format!(
            "Query exceeds {} characters",
            MAX_QUERY_LENGTH
        )));
    }
    if trimmed.chars().count() < MIN_QUERY_LENGTH {
        return Ok(SearchResults {
            query: trimmed.to_string(),
            ..SearchResults::default()
        });
    }

    let needle = Needle::new(trimmed);

    let templates = collect(content.templates.iter(), &needle, limit, |t, n| {
        let score = score_item(n, &t.title, &[t.description.as_str(), t.category.as_str()]);
        make_hit(SearchCategory::Template, t.id.as_str(), &t.title, &t.description, score)
    });

    let faqs = collect(content.faqs.iter(), &needle, limit, |f, n| {
        let score = score_item(n, &f.question, &[f.answer.as_str(), f.category.as_str()]);
        make_hit(SearchCategory::Faq, f.id.as_str(), &f.question, &f.answer, score)
    });

    let glossary = collect(content.glossary.iter(), &needle, limit, |g, n| {
        let score = score_item(n, &g.term, &[g.definition.as_str()]);
        make_hit(SearchCategory::Glossary, g.id.as_str(), &g.term, &g.definition, score)
    });

    let articles = collect(content.resources.iter(), &needle, limit, |r, n| {
        let tags = r.tags.join(" ");
        let score = score_item(n, &r.title, &[r.summary.as_str(), tags.as_str()]);
        make_hit(SearchCategory::Article, r.id.as_str(), &r.title, &r.summary, score)
    });

    let pages = collect(content.pages.iter(), &needle, limit, |p, n| {
        let score = score_item(n, &p.title, &[p.description.as_str()]);
        make_hit(SearchCategory::Page, &p.path, &p.title, &p.description, score)
    });

    let results = SearchResults {
        query: trimmed.to_string(),
        templates,
        faqs,
        glossary,
        articles,
        pages,
    };
    tracing::debug!(query = trimmed, total = results.total(), "search");
    Ok(results)
}

// =============================================================================
// RECENT SEARCHES (persisted)
// =============================================================================

/// Distinct recent queries, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentSearches(Vec<String>);

impl RecentSearches {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a query, moving an existing case-insensitive duplicate to
    /// the front. Returns `false` for queries too short to search.
    pub fn record(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LENGTH {
            return false;
        }
        let lowered = query.to_lowercase();
        self.0.retain(|q| q.to_lowercase() != lowered);
        self.0.insert(0, query.to_string());
        self.0.truncate(MAX_RECENT_SEARCHES);
        true
    }

    /// Queries, newest first.
    #[must_use]
    pub fn list(&self) -> &[String] {
        &self.0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentId;
    use crate::content::{Faq, GlossaryTerm, Page, Template};

    fn template(id: &str, title: &str, description: &str) -> Template {
        Template {
            id: ContentId::new(id),
            title: title.to_string(),
            description: description.to_string(),
            category: String::new(),
            roles: Vec::new(),
            phase: None,
            format: "docx".to_string(),
        }
    }

    fn store() -> ContentStore {
        ContentStore {
            templates: vec![
                template("controls", "Controls", "Inventory of controls"),
                template("controls-register", "Controls register", "Spreadsheet"),
                template("material", "Material controls memo", "Board memo"),
                template("board-pack", "Board pack", "Summary of control testing"),
                template("unrelated", "Risk appetite", "Statement template"),
            ],
            faqs: vec![Faq {
                id: ContentId::new("scope"),
                question: "Which companies are in scope?".to_string(),
                answer: "Premium listed companies reporting under the Code.".to_string(),
                category: "general".to_string(),
            }],
            glossary: vec![GlossaryTerm {
                id: ContentId::new("material-control"),
                term: "Material control".to_string(),
                definition: "A control whose failure would matter to the board.".to_string(),
            }],
            pages: vec![Page {
                path: "/timeline".to_string(),
                title: "Timeline".to_string(),
                description: "Plan your controls programme".to_string(),
            }],
            ..ContentStore::default()
        }
    }

    #[test]
    fn ranking_order() {
        let results = global_search(&store(), "Controls", 10).expect("search");
        let scores: Vec<_> = results
            .templates
            .hits
            .iter()
            .map(|h| (h.id.as_str(), h.score))
            .collect();
        assert_eq!(
            scores,
            vec![
                ("controls", SCORE_EXACT),
                ("controls-register", SCORE_PREFIX),
                ("material", SCORE_TITLE_SUBSTRING),
            ]
        );
    }

    #[test]
    fn field_and_word_matches() {
        let results = global_search(&store(), "control testing", 10).expect("search");
        assert_eq!(results.templates.hits[0].id, "board-pack");
        assert_eq!(results.templates.hits[0].score, SCORE_FIELD_SUBSTRING);

        let words = global_search(&store(), "board failure", 10).expect("search");
        let glossary = &words.glossary.hits[0];
        assert_eq!(glossary.score, 2 * SCORE_PER_WORD);
    }

    #[test]
    fn limit_truncates_but_total_counts_all() {
        let results = global_search(&store(), "control", 1).expect("search");
        assert_eq!(results.templates.hits.len(), 1);
        assert_eq!(results.templates.total, 4);
        assert!(results.total() >= 6);
    }

    #[test]
    fn short_query_returns_nothing() {
        let results = global_search(&store(), " c ", 10).expect("search");
        assert!(results.is_empty());
        assert_eq!(results.query, "c");
    }

    #[test]
    fn overlong_query_rejected() {
        let query = "a".repeat(MAX_QUERY_LENGTH + 1);
        assert!(global_search(&store(), &query, 10).is_err());
    }

    #[test]
    fn ties_break_on_title() {
        let content = ContentStore {
            templates: vec![
                template("b", "Beta controls", ""),
                template("a", "Alpha controls", ""),
            ],
            ..ContentStore::default()
        };
        let results = global_search(&content, "controls", 10).expect("search");
        let titles: Vec<_> = results.templates.hits.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha controls", "Beta controls"]);
    }

    #[test]
    fn recent_searches_dedupe_newest_first() {
        let mut recent = RecentSearches::new();
        for q in ["controls", "scope", "board", "Controls"] {
            assert!(recent.record(q));
        }
        assert_eq!(recent.list(), ["Controls", "board", "scope"]);
        assert!(!recent.record(" x "));
    }

    #[test]
    fn recent_searches_cap() {
        let mut recent = RecentSearches::new();
        for i in 0..8 {
            recent.record(&format!("query {}", i));
        }
        assert_eq!(recent.list().len(), MAX_RECENT_SEARCHES);
        assert_eq!(recent.list()[0], "query 7");
    }
}
