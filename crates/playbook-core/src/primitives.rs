//! # Innate Primitives
//!
//! Hardcoded constants for the playbook engine.
//!
//! The engine starts with zero state but fixed rules. Everything here is
//! compiled into the binary and immutable at runtime.

use time::Date;
use time::macros::date;

// =============================================================================
// ASSESSMENT
// =============================================================================

/// Number of questions in the readiness assessment.
///
/// `is_complete()` requires exactly this many recorded answers.
pub const ASSESSMENT_QUESTION_COUNT: usize = 30;

/// Highest point value a single assessment option carries.
pub const MAX_OPTION_POINTS: u8 = 4;

/// Maximum attainable assessment score.
pub const MAX_ASSESSMENT_SCORE: u32 = ASSESSMENT_QUESTION_COUNT as u32 * MAX_OPTION_POINTS as u32;

// =============================================================================
// MATURITY
// =============================================================================

/// The eight fixed maturity checklist questions.
pub const MATURITY_QUESTIONS: [&str; 8] = [
    "risk-framework",
    "controls-inventory",
    "material-controls-defined",
    "control-owners",
    "testing-programme",
    "issue-management",
    "board-reporting",
    "assurance-map",
];

// =============================================================================
// TIMELINE
// =============================================================================

/// Provision 29 applies to financial years beginning on or after this date.
pub const P29_EFFECTIVE_DATE: Date = date!(2026 - 01 - 01);

/// Months between the period end and the annual report deadline.
pub const REPORTING_WINDOW_MONTHS: i32 = 4;

// =============================================================================
// PROGRESS POINTS
// =============================================================================

/// Points for checking a roadmap task.
pub const POINTS_TASK_COMPLETE: u32 = 10;

/// Points removed when a checked task is unchecked.
pub const POINTS_TASK_UNCHECK_PENALTY: u32 = 10;

/// Points for the first download of a template.
pub const POINTS_TEMPLATE_DOWNLOAD: u32 = 5;

/// Points for the first read of an article.
pub const POINTS_ARTICLE_READ: u32 = 3;

/// Points for the first completed assessment.
pub const POINTS_ASSESSMENT_COMPLETE: u32 = 50;

/// Points for each new calendar day with a visit.
pub const POINTS_DAILY_VISIT: u32 = 2;

/// Bonus when a milestone is achieved.
pub const POINTS_MILESTONE_BONUS: u32 = 25;

/// Visit history retained for streak computation.
pub const MAX_VISIT_HISTORY: usize = 366;

// =============================================================================
// SEARCH
// =============================================================================

/// Queries shorter than this (after trimming) return no results.
pub const MIN_QUERY_LENGTH: usize = 2;

/// Default number of results returned per category.
pub const DEFAULT_RESULTS_PER_CATEGORY: usize = 5;

/// Number of recent searches remembered.
pub const MAX_RECENT_SEARCHES: usize = 5;

/// Maximum accepted query length.
pub const MAX_QUERY_LENGTH: usize = 256;

// =============================================================================
// FEEDBACK
// =============================================================================

/// Maximum feedback comment length in characters.
pub const MAX_FEEDBACK_COMMENT_LENGTH: usize = 2000;

// =============================================================================
// SNAPSHOT FORMAT
// =============================================================================

/// Magic bytes for the snapshot header.
pub const MAGIC_BYTES: &[u8; 4] = b"P29S";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// STORAGE KEYS
// =============================================================================

/// Persisted storage keys, one JSON document each.
pub mod keys {
    pub const ASSESSMENT: &str = "p29-assessment";
    pub const MATURITY: &str = "p29-maturity";
    pub const PROGRESS: &str = "p29-progress";
    pub const FISCAL_YEAR: &str = "p29-fiscal-year";
    pub const DEMO_MODE: &str = "p29-demo-mode";
    pub const COOKIE_CONSENT: &str = "p29-cookie-consent";
    pub const ANALYTICS_OPT_OUT: &str = "p29-analytics-opt-out";
    pub const RECENT_SEARCHES: &str = "p29-recent-searches";
    pub const AB_TESTS: &str = "p29-ab-tests";
    pub const FEEDBACK: &str = "p29-feedback";
    pub const FINALISATION_CHECKLIST: &str = "p29-finalisation-checklist";

    /// Every key the engine reads or writes.
    pub const ALL: [&str; 11] = [
        ASSESSMENT,
        MATURITY,
        PROGRESS,
        FISCAL_YEAR,
        DEMO_MODE,
        COOKIE_CONSENT,
        ANALYTICS_OPT_OUT,
        RECENT_SEARCHES,
        AB_TESTS,
        FEEDBACK,
        FINALISATION_CHECKLIST,
    ];
}
