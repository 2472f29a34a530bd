//! # Behaviour Tier Tests (B0-B4)
//!
//! If ANY tier fails, the playbook engine is INVALID.
//!
//! ## Tiers
//! - B0: Scoring
//! - B1: Calendar
//! - B2: Progress and milestones
//! - B3: Content, search and theming
//! - B4: Session persistence

use playbook_core::{
    AssessmentView, ContentId, ContentStore, FiscalYearEnd, MaturityLevel, MilestoneId,
    PlaybookError, ProgressRecord, ProgressTotals, QuestionId, Session,
};
use std::collections::BTreeMap;
use tempfile::tempdir;
use time::macros::{date, datetime};
use time::{Duration, OffsetDateTime};

fn now() -> OffsetDateTime {
    datetime!(2026-10-19 09:00 UTC)
}

/// Content directory with a 30-question bank, one role, templates,
/// articles and a vendor.
fn write_content(dir: &std::path::Path) {
    let questions: Vec<String> = (0..30)
        .map(|i| {
            format!(
                r#"{{"id":"q{i}","text":"Question {i}","options":[{{"label":"No","points":0}},{{"label":"Partly","points":2}},{{"label":"Yes","points":4}}]}}"#
            )
        })
        .collect();
    let (first, second) = questions.split_at(15);
    let assessment = format!(
        r#"[{{"id":"governance","name":"Governance","questions":[{}]}},{{"id":"assurance","name":"Assurance","questions":[{}]}}]"#,
        first.join(","),
        second.join(",")
    );
    std::fs::write(dir.join("assessment.json"), assessment).expect("write");

    std::fs::write(
        dir.join("templates.json"),
        r#"[
            {"id":"controls-register","title":"Controls register","description":"Inventory of material controls","roles":["cfo"]},
            {"id":"board-paper","title":"Board paper","description":"Declaration approval paper","roles":["board"]}
        ]"#,
    )
    .expect("write");
    std::fs::write(
        dir.join("roles.json"),
        r#"[{"id":"board","name":"Board","tasks":[
            {"id":"approve-scope","phase":"phase-1","title":"Approve scope"},
            {"id":"sign-declaration","phase":"phase-4","title":"Sign declaration"}
        ]}]"#,
    )
    .expect("write");
    let articles: Vec<String> = (0..6)
        .map(|i| format!(r#"{{"id":"a{i}","title":"Article {i}","summary":"Guidance on controls"}}"#))
        .collect();
    std::fs::write(dir.join("resources.json"), format!("[{}]", articles.join(","))).expect("write");
    std::fs::write(
        dir.join("glossary.json"),
        r#"[{"id":"material-control","term":"Material control","definition":"A control the board relies on."}]"#,
    )
    .expect("write");
    std::fs::write(
        dir.join("vendors.json"),
        r##"[{"id":"acme","name":"Acme Advisory","primaryColor":"#0A3D62","secondaryColor":"#FFFFFF"}]"##,
    )
    .expect("write");
}

fn content() -> ContentStore {
    let dir = tempdir().expect("temp dir");
    write_content(dir.path());
    ContentStore::load_dir(dir.path()).expect("content")
}

// =============================================================================
// TIER B0: SCORING
// =============================================================================

mod b0_scoring {
    use super::*;
    use playbook_core::{AssessmentState, MaturityState};

    /// B0.1: Total is the sum of recorded values.
    #[test]
    fn total_is_sum() {
        let mut state = AssessmentState::new();
        state.set_answer(QuestionId::new("q1"), 4);
        state.set_answer(QuestionId::new("q2"), 2);
        assert_eq!(state.total_score(), 6);
    }

    /// B0.2: Complete iff exactly 30 answers.
    #[test]
    fn complete_at_thirty() {
        let mut state = AssessmentState::new();
        for i in 0..29 {
            state.set_answer(QuestionId::new(format!("q{}", i)), 1);
        }
        assert!(!state.is_complete());
        state.set_answer(QuestionId::new("q29"), 1);
        assert!(state.is_complete());
    }

    /// B0.3: Maturity level boundaries.
    #[test]
    fn maturity_boundaries() {
        let ids = playbook_core::primitives::MATURITY_QUESTIONS;
        let expected = [
            (2, MaturityLevel::Level1),
            (3, MaturityLevel::Level2),
            (4, MaturityLevel::Level2),
            (5, MaturityLevel::Level3),
            (6, MaturityLevel::Level3),
            (7, MaturityLevel::Level4),
            (8, MaturityLevel::Level4),
        ];
        for (count, level) in expected {
            let mut state = MaturityState::new();
            for id in ids.iter().take(count) {
                state.set_answer(QuestionId::new(*id), true).expect("answer");
            }
            assert_eq!(state.maturity_level(), level, "{} checks", count);
        }
    }

    /// B0.4: Checked answers must be a listed option.
    #[test]
    fn checked_answer_validates_options() {
        let mut session = Session::in_memory(content());
        assert!(matches!(
            session.set_checked_answer(QuestionId::new("q0"), 3),
            Err(PlaybookError::InvalidAnswer { .. })
        ));
        assert!(matches!(
            session.set_checked_answer(QuestionId::new("nope"), 4),
            Err(PlaybookError::InvalidQuestion(_))
        ));
        session
            .set_checked_answer(QuestionId::new("q0"), 4)
            .expect("valid");
        assert_eq!(session.assessment().total_score(), 4);
    }
}

// =============================================================================
// TIER B1: CALENDAR
// =============================================================================

mod b1_calendar {
    use super::*;
    use playbook_core::{compliance_period, time_remaining};

    /// B1.1: Compliance start per year-end for a reference date.
    #[test]
    fn compliance_start_per_year_end() {
        let today = date!(2025 - 06 - 01);
        let starts = [
            (FiscalYearEnd::December, date!(2026 - 01 - 01)),
            (FiscalYearEnd::March, date!(2026 - 04 - 01)),
            (FiscalYearEnd::June, date!(2026 - 07 - 01)),
            (FiscalYearEnd::September, date!(2026 - 10 - 01)),
        ];
        for (fye, start) in starts {
            assert_eq!(compliance_period(fye, today).expect("period").start, start);
        }
    }

    /// B1.2: A single countdown function serves every deadline.
    #[test]
    fn countdown_to_effective_date() {
        let left = time_remaining(date!(2026 - 01 - 01), date!(2025 - 07 - 01)).expect("left");
        assert_eq!(left.months, 6);
        assert_eq!(left.days, 184);
    }

    /// B1.3: The session timeline follows the stored year-end and level.
    #[test]
    fn timeline_uses_stored_choices() {
        let mut session = Session::in_memory(ContentStore::new());
        session.set_fiscal_year_end(FiscalYearEnd::March).expect("fye");
        for id in ["risk-framework", "controls-inventory", "control-owners"] {
            session.set_maturity_answer(id, true).expect("maturity");
        }

        let timeline = session.timeline(date!(2026 - 01 - 10)).expect("timeline");
        assert_eq!(timeline.fiscal_year_end, FiscalYearEnd::March);
        assert_eq!(timeline.level, MaturityLevel::Level2);
        assert_eq!(timeline.period.end, date!(2027 - 03 - 31));
    }
}

// =============================================================================
// TIER B2: PROGRESS
// =============================================================================

mod b2_progress {
    use super::*;

    /// B2.1: Streak counts consecutive days back from today.
    #[test]
    fn streak_examples() {
        let mut record = ProgressRecord::new();
        for days in [0, 1, 2] {
            record.track_visit(now() - Duration::days(days)).expect("visit");
        }
        assert_eq!(record.streak(now().date()), 3);

        let mut gap = ProgressRecord::new();
        for days in [0, 2] {
            gap.track_visit(now() - Duration::days(days)).expect("visit");
        }
        assert_eq!(gap.streak(now().date()), 1);
    }

    /// B2.2: Download tracking is idempotent.
    #[test]
    fn download_idempotent() {
        let mut record = ProgressRecord::new();
        record
            .track_template_download(ContentId::new("x"), now())
            .expect("first");
        let points = record.points();
        record
            .track_template_download(ContentId::new("x"), now())
            .expect("second");
        assert_eq!(record.downloads().len(), 1);
        assert_eq!(record.points(), points);
    }

    /// B2.3: Overall progress clamps at 100 when everything saturates.
    #[test]
    fn overall_progress_clamped() {
        let mut record = ProgressRecord::new();
        record
            .track_assessment_completion(100, BTreeMap::new(), now())
            .expect("assessment");
        for i in 0..5 {
            let id = ContentId::new(format!("c{}", i));
            record.track_template_download(id.clone(), now()).expect("download");
            record.track_article_read(id, now()).expect("read");
            record
                .track_task_completion("board", "p1", &format!("t{}", i), true, now())
                .expect("task");
        }
        let totals = ProgressTotals {
            templates: 1,
            tasks: 1,
            articles: 1,
        };
        assert_eq!(record.overall_progress(&totals), 100);
    }

    /// B2.4: Completing the assessment through the session awards the
    /// milestone once.
    #[test]
    fn session_assessment_completion() {
        let mut session = Session::in_memory(content());
        for i in 0..30 {
            session
                .set_checked_answer(QuestionId::new(format!("q{}", i)), 4)
                .expect("answer");
        }
        assert_eq!(session.assessment_view(AssessmentView::Results), AssessmentView::Results);

        let first = session.complete_assessment(now()).expect("complete");
        assert_eq!(first.milestones, vec![MilestoneId::AssessmentComplete]);
        assert_eq!(first.points_delta, 75);

        let retake = session.complete_assessment(now()).expect("retake");
        assert_eq!(retake.points_delta, 0);
        assert_eq!(session.progress().assessments().len(), 2);
        let stored = &session.progress().assessments()[0];
        assert_eq!(stored.domain_scores.get("governance"), Some(&60));
    }

    /// B2.5: Knowledge seeker after five distinct articles.
    #[test]
    fn knowledge_seeker() {
        let mut session = Session::in_memory(content());
        for i in 0..4 {
            session.track_article(&format!("a{}", i), now()).expect("read");
        }
        assert!(!session.progress().is_achieved(MilestoneId::KnowledgeSeeker));
        let outcome = session.track_article("a4", now()).expect("read");
        assert_eq!(outcome.milestones, vec![MilestoneId::KnowledgeSeeker]);
    }

    /// B2.6: Tasks must exist in the role guide.
    #[test]
    fn unknown_task_rejected() {
        let mut session = Session::in_memory(content());
        assert!(matches!(
            session.track_task("board", "phase-1", "invented", true, now()),
            Err(PlaybookError::NotFound(_))
        ));
        session
            .track_task("board", "phase-1", "approve-scope", true, now())
            .expect("task");
        assert!(session.progress().is_achieved(MilestoneId::FirstSteps));
    }
}

// =============================================================================
// TIER B3: CONTENT, SEARCH AND THEMING
// =============================================================================

mod b3_content {
    use super::*;
    use playbook_core::LinkParams;

    /// B3.1: Search ranks the exact title first and remembers the query.
    #[test]
    fn search_and_recent() {
        let mut session = Session::in_memory(content());
        let results = session.search("Controls register", 5).expect("search");
        assert_eq!(results.templates.hits[0].id, "controls-register");
        assert_eq!(results.templates.hits[0].score, 100);
        assert_eq!(session.recent_searches(), ["Controls register"]);

        session.search("x", 5).expect("short");
        assert_eq!(session.recent_searches().len(), 1);
    }

    /// B3.2: Vendor resolves once per session from the link.
    #[test]
    fn vendor_resolves_once() {
        let mut session = Session::in_memory(content());
        let params = LinkParams::parse("vendor=ACME", None);
        let css = session
            .apply_link(&params)
            .map(|v| v.css_variables())
            .expect("vendor");
        assert!(css.contains("--vendor-primary: #0a3d62;"));

        assert!(session.resolve_vendor(Some("other")).is_some());
        assert_eq!(session.vendor().map(|v| v.id.as_str()), Some("acme"));
    }

    /// B3.3: Progress totals come from the content.
    #[test]
    fn totals_from_content() {
        let totals = content().progress_totals();
        assert_eq!(totals.templates, 2);
        assert_eq!(totals.tasks, 2);
        assert_eq!(totals.articles, 6);
    }
}

// =============================================================================
// TIER B4: SESSION PERSISTENCE
// =============================================================================

mod b4_persistence {
    use super::*;

    /// B4.1: File-backed state survives reopening.
    #[test]
    fn file_store_reopen() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("profile.p29");
        {
            let mut session = Session::with_file(&path, content()).expect("open");
            session.track_visit(now()).expect("visit");
            session.set_fiscal_year_end(FiscalYearEnd::June).expect("fye");
        }
        let session = Session::with_file(&path, content()).expect("reopen");
        assert_eq!(session.progress().visit_dates().len(), 1);
        assert_eq!(session.fiscal_year_end(), Some(FiscalYearEnd::June));
    }

    /// B4.2: redb-backed state survives reopening.
    #[test]
    fn redb_store_reopen() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("profile.redb");
        {
            let mut session = Session::with_redb(&path, content()).expect("open");
            session.set_checklist_item("board-sign-off", true).expect("item");
        }
        let session = Session::with_redb(&path, content()).expect("reopen");
        assert!(session.checklist().is_done("board-sign-off"));
    }

    /// B4.3: Snapshots move state between backends and drop unknown keys.
    #[test]
    fn snapshot_between_backends() {
        let dir = tempdir().expect("temp dir");
        let mut source = Session::in_memory(content());
        source.set_demo_mode(true).expect("demo");
        source
            .submit_feedback("/faq", 5, "Clear", now())
            .expect("feedback");
        let bytes = source.export_snapshot().expect("export");

        let mut target =
            Session::with_redb(dir.path().join("target.redb"), content()).expect("open");
        assert_eq!(target.import_snapshot(&bytes).expect("import"), 2);
        assert!(target.demo_mode().enabled);
        assert_eq!(target.feedback().entries().len(), 1);
    }

    /// B4.4: Corrupt snapshots are rejected before touching state.
    #[test]
    fn corrupt_snapshot_rejected() {
        let mut session = Session::in_memory(content());
        session.set_demo_mode(true).expect("demo");
        assert!(session.import_snapshot(b"NOPE\x01").is_err());
        assert!(session.demo_mode().enabled);
    }
}
