//! # playbook-core
//!
//! The derived-state engine behind the P29 compliance playbook.
//!
//! This crate holds every rule of the playbook: assessment scoring,
//! maturity levels, fiscal-year periods and timelines, progress points
//! and milestones, content search, vendor theming and A/B assignment.
//! All user state goes through a [`PersistencePort`] as one JSON document
//! per storage key.
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: no async, no network
//! - Deterministic: `BTreeMap` ordering, integer arithmetic only
//! - The clock and the RNG are passed in by the caller
//! - Content is read-only input; only user state is written

// =============================================================================
// MODULES
// =============================================================================

pub mod assessment;
pub mod checklist;
pub mod content;
pub mod dates;
pub mod experiment;
pub mod feedback;
pub mod fiscal;
pub mod formats;
pub mod maturity;
pub mod milestone;
pub mod preferences;
pub mod primitives;
pub mod progress;
pub mod report;
pub mod search;
pub mod session;
pub mod storage;
pub mod timeline;
pub mod types;
pub mod vendor;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{ContentId, PlaybookError, QuestionId};

// =============================================================================
// RE-EXPORTS: Engines
// =============================================================================

pub use assessment::{
    AssessmentBank, AssessmentState, AssessmentSummary, AssessmentView, DomainScore,
    ReadinessBand,
};
pub use checklist::{CHECKLIST_ITEMS, ChecklistState, declaration_countdown};
pub use content::{ContentStore, TemplateListing};
pub use experiment::{ExperimentState, ExperimentStats, VariantStats};
pub use feedback::{FeedbackEntry, FeedbackLog};
pub use fiscal::{
    CompliancePeriod, FiscalYearEnd, PeriodStatus, TimeRemaining, compliance_period,
    declaration_period, first_compliance_period, time_remaining, time_until_effective,
};
pub use maturity::{MaturityLevel, MaturityState};
pub use milestone::{MILESTONE_RULES, MilestoneId, MilestoneRule, ProgressEvent};
pub use preferences::{AnalyticsOptOut, ConsentState, CookieConsent, DemoMode};
pub use progress::{ProgressRecord, ProgressTotals, TrackOutcome};
pub use report::{ReportContext, render_markdown};
pub use search::{RecentSearches, SearchCategory, SearchHit, SearchResults, global_search};
pub use session::{Session, SessionStatus};
pub use timeline::{PhaseStatus, Timeline, TimelinePhase, build_timeline};
pub use vendor::{LinkParams, VendorConfig, VendorRegistry, VendorSelection};

// =============================================================================
// RE-EXPORTS: Storage and Formats
// =============================================================================

pub use formats::{SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
#[cfg(feature = "crypto-hash")]
pub use formats::snapshot_fingerprint;
pub use storage::{FileStore, MemoryStore, PersistencePort, RedbStore, StateStore};
