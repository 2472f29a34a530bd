//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::{
    AssessAction, ChecklistAction, ConsentAction, Context, FeedbackAction, MaturityAction,
    ProgressAction,
};
use crate::config::{Backend, Settings};
use playbook_core::formats::MAX_SNAPSHOT_SIZE;
use playbook_core::primitives::MATURITY_QUESTIONS;
use playbook_core::{
    AssessmentView, ContentStore, FiscalYearEnd, LinkParams, PlaybookError, QuestionId,
    RedbStore, Session, TimeRemaining, TrackOutcome, snapshot_fingerprint, snapshot_to_bytes,
    time_until_effective,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), PlaybookError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| PlaybookError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(PlaybookError::InvalidInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, PlaybookError> {
    let canonical = path.canonicalize().map_err(|e| {
        PlaybookError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(PlaybookError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent of an output path and require it to be a directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, PlaybookError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        PlaybookError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(PlaybookError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| PlaybookError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn remaining_json(left: &TimeRemaining) -> serde_json::Value {
    serde_json::json!({
        "days": left.days,
        "months": left.months,
        "is_past": left.is_past
    })
}

fn describe_remaining(left: &TimeRemaining) -> String {
    if left.is_past {
        "passed".to_string()
    } else {
        format!("{} days ({} months)", left.days, left.months)
    }
}

fn print_outcome(ctx: &Context, action: &str, outcome: &TrackOutcome) {
    if ctx.json_mode() {
        print_json(&serde_json::json!({
            "action": action,
            "changed": outcome.changed(),
            "points_delta": outcome.points_delta,
            "milestones": outcome.milestones.iter().map(|m| m.as_str()).collect::<Vec<_>>()
        }));
        return;
    }

    if !outcome.changed() {
        println!("{}: already recorded", action);
        return;
    }
    println!("{}: {:+} points", action, outcome.points_delta);
    for milestone in &outcome.milestones {
        println!("  Milestone achieved: {}", milestone.title());
    }
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new profile database.
pub fn cmd_init(ctx: &Context, force: bool) -> Result<(), PlaybookError> {
    let db_path = &ctx.settings.database;
    if db_path.exists() {
        if !force {
            return Err(PlaybookError::InvalidInput(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| PlaybookError::IoError(format!("Remove db: {}", e)))?;
    }

    match ctx.settings.backend {
        Backend::Redb => {
            let _store = RedbStore::open(db_path)?;
        }
        Backend::File => {
            let data = snapshot_to_bytes(&BTreeMap::new())?;
            std::fs::write(db_path, &data)
                .map_err(|e| PlaybookError::IoError(format!("Write db: {}", e)))?;
        }
    }

    if ctx.json_mode() {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": ctx.settings.backend.as_str(),
            "initialized": true
        }));
    } else {
        println!(
            "Initialized new {} profile at {:?}",
            ctx.settings.backend.as_str(),
            db_path
        );
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show profile status.
pub fn cmd_status(ctx: &Context) -> Result<(), PlaybookError> {
    let session = load_or_create_session(&ctx.settings)?;
    let today = ctx.now.date();
    let status = session.status(today);
    let effective = time_until_effective(today)?;
    let countdown = session.declaration_countdown(today)?;

    if ctx.json_mode() {
        print_json(&serde_json::json!({
            "database": ctx.settings.database.to_string_lossy(),
            "backend": ctx.settings.backend.as_str(),
            "status": status,
            "until_effective": remaining_json(&effective),
            "until_declaration": remaining_json(&countdown)
        }));
        return Ok(());
    }

    let total_questions = session.content().assessment.question_count();
    println!("P29 Playbook Status");
    println!("===================");
    println!("Database: {:?}", ctx.settings.database);
    println!("Backend:  {}", ctx.settings.backend.as_str());
    println!();
    println!(
        "Assessment:      {}/{} answered, score {}{}",
        status.answered,
        total_questions,
        status.assessment_score,
        if status.assessment_complete { " (complete)" } else { "" }
    );
    println!("Maturity:        {}", status.maturity_level);
    match status.fiscal_year_end {
        Some(fye) => println!("Fiscal year-end: {}", fye),
        None => println!("Fiscal year-end: not set"),
    }
    println!("Points:          {}", status.points);
    println!("Progress:        {}%", status.overall_progress);
    println!("Streak:          {} days", status.streak);
    println!("Milestones:      {}", status.milestones_achieved);
    println!("Checklist:       {}%", status.checklist_percent);
    println!();
    println!("P29 takes effect in:   {}", describe_remaining(&effective));
    println!("Declaration deadline:  {}", describe_remaining(&countdown));

    Ok(())
}

// =============================================================================
// ASSESSMENT COMMAND
// =============================================================================

/// Answer and review the readiness assessment.
pub fn cmd_assess(ctx: &Context, action: AssessAction) -> Result<(), PlaybookError> {
    let mut session = load_or_create_session(&ctx.settings)?;

    match action {
        AssessAction::Show => show_current_question(ctx, &session),
        AssessAction::Answer { question, points } => {
            session.set_checked_answer(QuestionId::new(question.as_str()), points)?;
            let answered = session.assessment().answered_count();
            let total = session.content().assessment.question_count();
            if ctx.json_mode() {
                print_json(&serde_json::json!({
                    "question": question,
                    "points": points,
                    "answered": answered,
                    "total": total
                }));
            } else {
                println!("Recorded {} = {} ({}/{} answered)", question, points, answered, total);
            }
            Ok(())
        }
        AssessAction::Next => {
            session.next_question()?;
            show_current_question(ctx, &session)
        }
        AssessAction::Back => {
            session.previous_question()?;
            show_current_question(ctx, &session)
        }
        AssessAction::Goto { index } => {
            session.go_to_question(index)?;
            show_current_question(ctx, &session)
        }
        AssessAction::Results => show_results(ctx, &session),
        AssessAction::Complete => {
            let outcome = session.complete_assessment(ctx.now)?;
            print_outcome(ctx, "Assessment completed", &outcome);
            Ok(())
        }
        AssessAction::Reset => {
            session.reset_assessment()?;
            if ctx.json_mode() {
                print_json(&serde_json::json!({ "reset": "assessment" }));
            } else {
                println!("Assessment answers cleared");
            }
            Ok(())
        }
    }
}

fn show_current_question(ctx: &Context, session: &Session) -> Result<(), PlaybookError> {
    let bank = &session.content().assessment;
    let index = session.assessment().current_question();
    let question = bank.question_at(index).ok_or_else(|| {
        PlaybookError::NotFound("No assessment questions loaded".to_string())
    })?;
    let chosen = session.assessment().answer(&question.id);

    if ctx.json_mode() {
        print_json(&serde_json::json!({
            "index": index,
            "total": bank.question_count(),
            "question": question,
            "answer": chosen
        }));
        return Ok(());
    }

    println!("Question {} of {}", index + 1, bank.question_count());
    println!("[{}] {}", question.id, question.text);
    for option in &question.options {
        let marker = if chosen == Some(option.points) { "*" } else { " " };
        println!("  {} {} - {}", marker, option.points, option.label);
    }
    Ok(())
}

/// JSON body of `assess results`. Scores stay hidden until the
/// assessment is complete.
#[must_use]
pub fn results_json(session: &Session) -> serde_json::Value {
    let view = session.assessment_view(AssessmentView::Results);
    if view != AssessmentView::Results {
        return serde_json::json!({
            "view": view,
            "answered": session.assessment().answered_count(),
            "total": session.content().assessment.question_count()
        });
    }
    serde_json::json!({
        "view": view,
        "summary": session.assessment_summary()
    })
}

fn show_results(ctx: &Context, session: &Session) -> Result<(), PlaybookError> {
    if ctx.json_mode() {
        print_json(&results_json(session));
        return Ok(());
    }

    let view = session.assessment_view(AssessmentView::Results);
    if view != AssessmentView::Results {
        println!(
            "Assessment incomplete: {}/{} answered",
            session.assessment().answered_count(),
            session.content().assessment.question_count()
        );
        return Ok(());
    }

    let summary = session.assessment_summary();
    println!("Readiness Results");
    println!("=================");
    println!(
        "Score: {}/{} ({}%) - {}",
        summary.total, summary.max, summary.percentage, summary.band
    );
    println!("{}", summary.band.recommendation());
    println!();
    for domain in &summary.domains {
        println!(
            "  {:<24} {:>3}/{:<3} {:>3}%",
            domain.domain,
            domain.score,
            domain.max,
            domain.percentage()
        );
    }
    Ok(())
}

// =============================================================================
// MATURITY COMMAND
// =============================================================================

/// Answer and show the maturity quiz.
pub fn cmd_maturity(ctx: &Context, action: Option<MaturityAction>) -> Result<(), PlaybookError> {
    let mut session = load_or_create_session(&ctx.settings)?;

    match action {
        Some(MaturityAction::Set { id, no }) => session.set_maturity_answer(&id, !no)?,
        Some(MaturityAction::Reset) => session.reset_maturity()?,
        None => {}
    }

    let state = session.maturity();
    let level = state.maturity_level();

    if ctx.json_mode() {
        let answers: BTreeMap<&str, bool> = MATURITY_QUESTIONS
            .iter()
            .map(|id| (*id, state.answer(id)))
            .collect();
        print_json(&serde_json::json!({
            "answers": answers,
            "score": state.score(),
            "level": level.number(),
            "name": level.name(),
            "starting_phase": level.starting_phase(),
            "track_months": level.track_months(),
            "answers_to_next_level": state.answers_to_next_level()
        }));
        return Ok(());
    }

    for id in MATURITY_QUESTIONS {
        let mark = if state.answer(id) { "x" } else { " " };
        println!("  [{}] {}", mark, id);
    }
    println!();
    println!("{} ({} of {})", level, state.score(), MATURITY_QUESTIONS.len());
    println!("{}", level.recommendation());
    if let Some(needed) = state.answers_to_next_level() {
        println!("{} more to reach the next level", needed);
    }
    Ok(())
}

// =============================================================================
// TIMELINE COMMAND
// =============================================================================

/// Show the personalised timeline, optionally storing a new year-end first.
pub fn cmd_timeline(ctx: &Context, fiscal_year_end: Option<&str>) -> Result<(), PlaybookError> {
    let mut session = load_or_create_session(&ctx.settings)?;

    if let Some(raw) = fiscal_year_end {
        let fye: FiscalYearEnd = raw.parse()?;
        session.set_fiscal_year_end(fye)?;
        tracing::info!(fiscal_year_end = %fye, "fiscal year-end stored");
    }

    let today = ctx.now.date();
    let timeline = session.timeline(today)?;

    if ctx.json_mode() {
        print_json(&serde_json::json!({
            "fiscal_year_end_set": session.fiscal_year_end().is_some(),
            "timeline": timeline
        }));
        return Ok(());
    }

    if session.fiscal_year_end().is_none() {
        println!("Fiscal year-end not set, assuming {}", timeline.fiscal_year_end);
    }
    println!("Compliance Timeline");
    println!("===================");
    println!("Level:              {}", timeline.level);
    println!(
        "First P29 period:   {} to {} ({:?})",
        timeline.period.start,
        timeline.period.end,
        timeline.period.status(today)
    );
    println!("Reporting deadline: {}", timeline.reporting_deadline);
    println!("Plan starts:        {}", timeline.plan_start);
    if timeline.behind_schedule {
        println!("Behind schedule: the recommended start date has passed");
    }
    println!();
    for phase in &timeline.phases {
        match &phase.window {
            Some(window) => println!(
                "  {}. {:<28} {} to {}  {:?}",
                phase.number, phase.name, window.start, window.end, phase.status
            ),
            None => println!("  {}. {:<28} {:?}", phase.number, phase.name, phase.status),
        }
    }
    println!();
    println!("Until period start:  {}", describe_remaining(&timeline.until_period_start));
    println!("Until period end:    {}", describe_remaining(&timeline.until_period_end));
    println!(
        "Until deadline:      {}",
        describe_remaining(&timeline.until_reporting_deadline)
    );
    Ok(())
}

// =============================================================================
// PROGRESS COMMAND
// =============================================================================

/// Track activity or show the progress dashboard.
pub fn cmd_progress(ctx: &Context, action: Option<ProgressAction>) -> Result<(), PlaybookError> {
    let mut session = load_or_create_session(&ctx.settings)?;

    let tracked = match action {
        Some(ProgressAction::Task {
            role,
            phase,
            task,
            undo,
        }) => Some((
            "Task",
            session.track_task(&role, &phase, &task, !undo, ctx.now)?,
        )),
        Some(ProgressAction::Download { id }) => {
            Some(("Download", session.track_download(&id, ctx.now)?))
        }
        Some(ProgressAction::Read { id }) => Some(("Article", session.track_article(&id, ctx.now)?)),
        Some(ProgressAction::Visit) => Some(("Visit", session.track_visit(ctx.now)?)),
        Some(ProgressAction::Reset) => {
            session.reset_progress()?;
            None
        }
        None => None,
    };
    if let Some((action, outcome)) = tracked {
        print_outcome(ctx, action, &outcome);
        return Ok(());
    }

    let progress = session.progress();
    let totals = session.content().progress_totals();
    let today = ctx.now.date();

    if ctx.json_mode() {
        print_json(&serde_json::json!({
            "points": progress.points(),
            "overall_progress": session.overall_progress(),
            "streak": progress.streak(today),
            "tasks": { "done": progress.completed_task_count(), "total": totals.tasks },
            "downloads": { "done": progress.downloads().len(), "total": totals.templates },
            "articles": { "done": progress.articles_read().len(), "total": totals.articles },
            "assessments": progress.assessments().len(),
            "milestones": progress.milestones()
        }));
        return Ok(());
    }

    println!("Progress Dashboard");
    println!("==================");
    println!("Points:      {}", progress.points());
    println!("Overall:     {}%", session.overall_progress());
    println!("Streak:      {} days", progress.streak(today));
    println!("Tasks:       {}/{}", progress.completed_task_count(), totals.tasks);
    println!("Downloads:   {}/{}", progress.downloads().len(), totals.templates);
    println!("Articles:    {}/{}", progress.articles_read().len(), totals.articles);
    println!("Assessments: {}", progress.assessments().len());
    println!();
    println!("Milestones:");
    for milestone in progress.milestones() {
        let mark = if milestone.achieved { "x" } else { " " };
        println!("  [{}] {}", mark, milestone.id.title());
    }
    Ok(())
}

// =============================================================================
// SEARCH COMMAND
// =============================================================================

/// Search content, or list recent searches when no query is given.
pub fn cmd_search(
    ctx: &Context,
    query: Option<&str>,
    limit: usize,
    clear_recent: bool,
) -> Result<(), PlaybookError> {
    let mut session = load_or_create_session(&ctx.settings)?;

    if clear_recent {
        session.clear_recent_searches()?;
    }

    let Some(query) = query else {
        let recent = session.recent_searches();
        if ctx.json_mode() {
            print_json(&serde_json::json!({ "recent": recent }));
        } else if recent.is_empty() {
            println!("No recent searches");
        } else {
            println!("Recent searches:");
            for q in recent {
                println!("  {}", q);
            }
        }
        return Ok(());
    };

    let results = session.search(query, limit)?;

    if ctx.json_mode() {
        print_json(&serde_json::json!(results));
        return Ok(());
    }

    if results.is_empty() {
        println!("No results for \"{}\"", results.query);
        return Ok(());
    }

    println!("{} results for \"{}\"", results.total(), results.query);
    for (category, group) in results.categories() {
        if group.hits.is_empty() {
            continue;
        }
        println!();
        println!("{:?} ({})", category, group.total);
        for hit in &group.hits {
            println!("  [{:>3}] {} - {}", hit.score, hit.title, hit.snippet);
        }
    }
    Ok(())
}

// =============================================================================
// VENDOR COMMAND
// =============================================================================

/// Resolve white-label branding from an id or a share link.
pub fn cmd_vendor(
    ctx: &Context,
    id: Option<&str>,
    link: Option<&str>,
    css: bool,
) -> Result<(), PlaybookError> {
    let mut session = load_or_create_session(&ctx.settings)?;

    let params = match link {
        Some(link) => LinkParams::from_url(link)?,
        None => LinkParams {
            vendor: id.map(str::to_string),
            ..LinkParams::default()
        },
    };
    let vendor = session.apply_link(&params).cloned();

    if ctx.json_mode() {
        print_json(&serde_json::json!({
            "vendor": vendor,
            "role": params.role,
            "selected": params.selected,
            "fragment": params.fragment,
            "css": vendor.as_ref().filter(|_| css).map(|v| v.css_variables())
        }));
        return Ok(());
    }

    match &vendor {
        Some(v) => {
            println!("Vendor: {} ({})", v.name, v.id);
            if let Some(tagline) = &v.tagline {
                println!("  {}", tagline);
            }
            if let Some(email) = &v.contact_email {
                println!("  Contact: {}", email);
            }
            if css {
                println!();
                print!("{}", v.css_variables());
            }
        }
        None => println!("No vendor: default branding"),
    }
    if let Some(role) = &params.role {
        println!("Role:     {}", role);
    }
    if let Some(selected) = &params.selected {
        println!("Selected: {}", selected);
    }
    Ok(())
}

// =============================================================================
// TEMPLATES COMMAND
// =============================================================================

/// List templates under a role filter, marking the selected one.
pub fn cmd_templates(
    ctx: &Context,
    role: Option<&str>,
    selected: Option<&str>,
    link: Option<&str>,
) -> Result<(), PlaybookError> {
    let session = load_or_create_session(&ctx.settings)?;

    let params = match link {
        Some(link) => LinkParams::from_url(link)?,
        None => LinkParams {
            role: role.map(str::to_string),
            selected: selected.map(str::to_string),
            ..LinkParams::default()
        },
    };
    let listing = session.template_listing(&params);
    let unmatched = params
        .selected
        .as_deref()
        .filter(|_| !listing.iter().any(|l| l.selected));
    if let Some(id) = unmatched {
        tracing::warn!(template = id, "selected template not in listing");
    }

    if ctx.json_mode() {
        print_json(&serde_json::json!({
            "role": params.role,
            "selected": params.selected,
            "templates": listing
        }));
        return Ok(());
    }

    match &params.role {
        Some(role) => println!("Templates for {} ({})", role, listing.len()),
        None => println!("Templates ({})", listing.len()),
    }
    for entry in &listing {
        let mark = if entry.selected { ">" } else { " " };
        println!("{} {:<28} {}", mark, entry.template.id, entry.template.title);
    }
    Ok(())
}

// =============================================================================
// EXPERIMENT COMMAND
// =============================================================================

/// Assign a variant and optionally record an impression or conversion.
pub fn cmd_experiment(
    ctx: &Context,
    name: &str,
    variants: u8,
    impression: bool,
    conversion: bool,
) -> Result<(), PlaybookError> {
    let mut session = load_or_create_session(&ctx.settings)?;

    let mut rng = rand::thread_rng();
    let variant = session.assign_variant(name, variants, &mut rng)?;
    if impression {
        session.record_impression(name)?;
    }
    if conversion {
        session.record_conversion(name)?;
    }
    let stats = session.experiment_stats(name);

    if ctx.json_mode() {
        print_json(&serde_json::json!(stats));
        return Ok(());
    }

    println!("Experiment {}: variant {}", name, variant);
    for v in &stats.variants {
        println!(
            "  {}  impressions {:>6}  conversions {:>6}  ({} per mille)",
            v.variant, v.impressions, v.conversions, v.conversion_per_mille
        );
    }
    Ok(())
}

// =============================================================================
// CONSENT COMMAND
// =============================================================================

/// Update or show privacy preferences and demo mode.
pub fn cmd_consent(ctx: &Context, action: Option<ConsentAction>) -> Result<(), PlaybookError> {
    let mut session = load_or_create_session(&ctx.settings)?;

    match action {
        Some(ConsentAction::Set {
            analytics,
            marketing,
        }) => session.set_consent(analytics, marketing, ctx.now)?,
        Some(ConsentAction::Withdraw) => session.withdraw_consent()?,
        Some(ConsentAction::OptOut { undo }) => session.set_analytics_opt_out(!undo)?,
        Some(ConsentAction::Demo { off }) => session.set_demo_mode(!off)?,
        None => {}
    }

    let demo = session.demo_mode();
    let show_intro = demo.show_intro();
    if show_intro {
        session.mark_demo_intro_seen()?;
    }
    let decision = session.consent().decision().copied();

    if ctx.json_mode() {
        print_json(&serde_json::json!({
            "consent": decision,
            "pending": decision.is_none(),
            "analytics_enabled": session.analytics_enabled(),
            "demo_mode": demo.enabled,
            "show_intro": show_intro
        }));
        return Ok(());
    }

    match &decision {
        Some(c) => println!(
            "Cookie consent: analytics {}, marketing {} (decided {})",
            on_off(c.analytics),
            on_off(c.marketing),
            c.decided_at.date()
        ),
        None => println!("Cookie consent: not yet decided"),
    }
    println!("Analytics:      {}", on_off(session.analytics_enabled()));
    println!("Demo mode:      {}", on_off(demo.enabled));
    if show_intro {
        println!();
        println!("Demo mode uses sample data. Nothing you do here affects a real profile.");
    }
    Ok(())
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

// =============================================================================
// FEEDBACK COMMAND
// =============================================================================

/// Submit or list page feedback.
pub fn cmd_feedback(ctx: &Context, action: FeedbackAction) -> Result<(), PlaybookError> {
    let mut session = load_or_create_session(&ctx.settings)?;

    if let FeedbackAction::Submit {
        page,
        rating,
        comment,
    } = action
    {
        let entry = session.submit_feedback(&page, rating, &comment, ctx.now)?;
        if ctx.json_mode() {
            print_json(&serde_json::json!(entry));
        } else {
            println!("Thanks! Recorded {}/5 for {}", entry.rating, entry.page);
        }
        return Ok(());
    }

    let log = session.feedback();
    if ctx.json_mode() {
        print_json(&serde_json::json!({
            "entries": log.entries(),
            "average_rating_tenths": log.average_rating_tenths()
        }));
        return Ok(());
    }

    if log.entries().is_empty() {
        println!("No feedback yet");
        return Ok(());
    }
    for entry in log.entries() {
        println!(
            "  {}  {}/5  {}  {}",
            entry.timestamp.date(),
            entry.rating,
            entry.page,
            entry.comment
        );
    }
    if let Some(avg) = log.average_rating_tenths() {
        println!("Average: {}.{}", avg / 10, avg % 10);
    }
    Ok(())
}

// =============================================================================
// CHECKLIST COMMAND
// =============================================================================

/// Tick items or show the declaration checklist with its countdown.
pub fn cmd_checklist(ctx: &Context, action: Option<ChecklistAction>) -> Result<(), PlaybookError> {
    let mut session = load_or_create_session(&ctx.settings)?;

    match action {
        Some(ChecklistAction::Tick { id }) => session.set_checklist_item(&id, true)?,
        Some(ChecklistAction::Untick { id }) => session.set_checklist_item(&id, false)?,
        Some(ChecklistAction::Reset) => session.reset_checklist()?,
        None => {}
    }

    let checklist = session.checklist();
    let countdown = session.declaration_countdown(ctx.now.date())?;

    if ctx.json_mode() {
        let items: Vec<serde_json::Value> = checklist
            .items()
            .map(|(item, done)| {
                serde_json::json!({ "id": item.id, "label": item.label, "done": done })
            })
            .collect();
        print_json(&serde_json::json!({
            "items": items,
            "percent": checklist.percent(),
            "complete": checklist.is_complete(),
            "countdown": remaining_json(&countdown)
        }));
        return Ok(());
    }

    println!("Declaration Checklist");
    println!("=====================");
    for (item, done) in checklist.items() {
        let mark = if done { "x" } else { " " };
        println!("  [{}] {:<30} {}", mark, item.id, item.label);
    }
    println!();
    println!("{}% complete", checklist.percent());
    println!("Reporting deadline: {}", describe_remaining(&countdown));
    Ok(())
}

// =============================================================================
// REPORT COMMAND
// =============================================================================

/// Render the assessment report to stdout or a file.
pub fn cmd_report(
    ctx: &Context,
    output: Option<&Path>,
    vendor: Option<&str>,
) -> Result<(), PlaybookError> {
    let validated_output = output.map(validate_output_path).transpose()?;
    let mut session = load_or_create_session(&ctx.settings)?;
    session.resolve_vendor(vendor);

    let report = session.assessment_report(ctx.now.date())?;

    match validated_output {
        Some(path) => {
            std::fs::write(&path, report.as_bytes())
                .map_err(|e| PlaybookError::IoError(format!("Write file: {}", e)))?;
            if ctx.json_mode() {
                print_json(&serde_json::json!({
                    "output": path.to_string_lossy(),
                    "bytes": report.len()
                }));
            } else {
                println!("Wrote report ({} bytes) to {:?}", report.len(), path);
            }
        }
        None => print!("{}", report),
    }
    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export the profile snapshot.
pub fn cmd_export(ctx: &Context, output: &Path) -> Result<(), PlaybookError> {
    let validated_output = validate_output_path(output)?;
    let session = load_or_create_session(&ctx.settings)?;

    let data = session.export_snapshot()?;
    let fingerprint = snapshot_fingerprint(&data);

    std::fs::write(&validated_output, &data)
        .map_err(|e| PlaybookError::IoError(format!("Write file: {}", e)))?;

    if ctx.json_mode() {
        print_json(&serde_json::json!({
            "output": validated_output.to_string_lossy(),
            "bytes": data.len(),
            "blake3": fingerprint
        }));
    } else {
        println!("Fingerprint: {}", fingerprint);
        println!("Exported {} bytes to {:?}", data.len(), validated_output);
    }
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Replace the profile with a snapshot.
pub fn cmd_import(ctx: &Context, input: &Path) -> Result<(), PlaybookError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_SNAPSHOT_SIZE as u64)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| PlaybookError::IoError(format!("Read file: {}", e)))?;

    let mut session = load_or_create_session(&ctx.settings)?;
    let imported = session.import_snapshot(&data)?;

    if ctx.json_mode() {
        print_json(&serde_json::json!({
            "input": validated_path.to_string_lossy(),
            "keys": imported
        }));
    } else {
        println!("Imported {} state keys from {:?}", imported, validated_path);
    }
    Ok(())
}

// =============================================================================
// HASH COMMAND
// =============================================================================

/// Compute the BLAKE3 fingerprint of the current profile.
pub fn cmd_hash(ctx: &Context) -> Result<(), PlaybookError> {
    let session = load_or_create_session(&ctx.settings)?;
    let data = session.export_snapshot()?;
    let fingerprint = snapshot_fingerprint(&data);

    if ctx.json_mode() {
        print_json(&serde_json::json!({
            "blake3": fingerprint,
            "bytes": data.len()
        }));
    } else {
        println!("{}", fingerprint);
    }
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Load the content fixtures, or an empty store if the directory is absent.
pub fn load_content(dir: &Path) -> Result<ContentStore, PlaybookError> {
    if !dir.is_dir() {
        tracing::warn!(
            dir = %dir.display(),
            "content directory not found, continuing without content"
        );
        return Ok(ContentStore::new());
    }
    ContentStore::load_dir(dir)
}

/// Open the profile with the configured backend.
pub fn load_or_create_session(settings: &Settings) -> Result<Session, PlaybookError> {
    let content = load_content(&settings.content)?;
    match settings.backend {
        Backend::Redb => Session::with_redb(&settings.database, content),
        Backend::File => Session::with_file(&settings.database, content),
    }
}
