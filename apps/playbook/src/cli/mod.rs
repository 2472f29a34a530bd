//! # Playbook CLI Module
//!
//! This module implements the CLI interface for the P29 playbook.
//!
//! ## Available Commands
//!
//! - `init` - Initialize a new profile database
//! - `status` - Show profile status
//! - `assess` - Answer and review the readiness assessment
//! - `maturity` - Answer the maturity quiz
//! - `timeline` - Show the personalised compliance timeline
//! - `progress` - Track tasks, downloads, articles and visits
//! - `search` - Search playbook content
//! - `vendor` - Resolve white-label branding
//! - `templates` - List templates for a role deep link
//! - `experiment` - Assign and record A/B variants
//! - `consent` - Cookie consent, analytics opt-out and demo mode
//! - `feedback` - Submit and list page feedback
//! - `checklist` - Declaration readiness checklist
//! - `report` - Render the assessment report
//! - `export` - Export the profile snapshot
//! - `import` - Import a profile snapshot
//! - `hash` - Compute BLAKE3 fingerprint of the profile

mod commands;

use crate::config::{Overrides, Settings};
use clap::{Parser, Subcommand};
use playbook_core::PlaybookError;
use playbook_core::dates::parse_date;
use std::path::PathBuf;
use time::OffsetDateTime;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// P29 Playbook - compliance readiness from the command line
///
/// Tracks one organisation's progress towards a Provision 29 declaration.
#[derive(Parser, Debug)]
#[command(name = "playbook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a playbook.toml config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the profile database
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "file" (snapshot file) or "redb" (ACID database)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Directory holding the content fixtures
    #[arg(short = 'C', long, global = true)]
    pub content: Option<PathBuf>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    pub today: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new empty profile
    Init {
        /// Force initialization even if the database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show profile status
    Status,

    /// Readiness assessment
    Assess {
        #[command(subcommand)]
        action: Option<AssessAction>,
    },

    /// Maturity quiz
    Maturity {
        #[command(subcommand)]
        action: Option<MaturityAction>,
    },

    /// Personalised compliance timeline
    Timeline {
        /// Fiscal year-end to store first (december, march, june, september)
        #[arg(short, long)]
        fiscal_year_end: Option<String>,
    },

    /// Progress tracking
    Progress {
        #[command(subcommand)]
        action: Option<ProgressAction>,
    },

    /// Search templates, FAQs, glossary, articles and pages
    Search {
        /// Search query (omit to list recent searches)
        query: Option<String>,

        /// Maximum hits per category
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Clear the recent search list
        #[arg(long)]
        clear_recent: bool,
    },

    /// Resolve white-label branding
    Vendor {
        /// Vendor id from a `?vendor=` parameter
        #[arg(short, long, conflicts_with = "link")]
        id: Option<String>,

        /// Full share link to parse for vendor, role and selection
        #[arg(short, long)]
        link: Option<String>,

        /// Print CSS custom properties for the vendor
        #[arg(long)]
        css: bool,
    },

    /// List templates for a role, marking the selected one
    Templates {
        /// Role filter from a `?role=` parameter
        #[arg(short, long, conflicts_with = "link")]
        role: Option<String>,

        /// Template id from a `?selected=` parameter
        #[arg(short, long, conflicts_with = "link")]
        selected: Option<String>,

        /// Full share link to parse for role and selection
        #[arg(short, long)]
        link: Option<String>,
    },

    /// A/B experiment assignment and counters
    Experiment {
        /// Experiment name
        name: String,

        /// Number of variants
        #[arg(short = 'n', long, default_value = "2")]
        variants: u8,

        /// Record an impression for the assigned variant
        #[arg(long)]
        impression: bool,

        /// Record a conversion for the assigned variant
        #[arg(long)]
        conversion: bool,
    },

    /// Cookie consent, analytics opt-out and demo mode
    Consent {
        #[command(subcommand)]
        action: Option<ConsentAction>,
    },

    /// Page feedback
    Feedback {
        #[command(subcommand)]
        action: Option<FeedbackAction>,
    },

    /// Declaration readiness checklist
    Checklist {
        #[command(subcommand)]
        action: Option<ChecklistAction>,
    },

    /// Render the assessment report as Markdown
    Report {
        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Vendor id to brand the report with
        #[arg(long)]
        vendor: Option<String>,
    },

    /// Export the profile snapshot
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Replace the profile with a snapshot
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compute BLAKE3 fingerprint of the profile
    Hash,
}

/// `assess` subcommands.
#[derive(Subcommand, Debug)]
pub enum AssessAction {
    /// Show the current question
    Show,
    /// Answer a question
    Answer {
        /// Question id
        question: String,
        /// Points of the chosen option
        points: u8,
    },
    /// Move to the next question
    Next,
    /// Move to the previous question
    Back,
    /// Jump to a question by position (0-based)
    Goto { index: usize },
    /// Show scores and readiness band
    Results,
    /// Record the finished assessment in progress history
    Complete,
    /// Clear all answers
    Reset,
}

/// `maturity` subcommands.
#[derive(Subcommand, Debug)]
pub enum MaturityAction {
    /// Answer a quiz question
    Set {
        /// Question id
        id: String,
        /// Answer "no" instead of "yes"
        #[arg(long)]
        no: bool,
    },
    /// Clear all answers
    Reset,
}

/// `progress` subcommands.
#[derive(Subcommand, Debug)]
pub enum ProgressAction {
    /// Check or uncheck a role guide task
    Task {
        role: String,
        phase: String,
        task: String,
        /// Uncheck instead of check
        #[arg(long)]
        undo: bool,
    },
    /// Record a template download
    Download { id: String },
    /// Record an article read
    Read { id: String },
    /// Record today's visit
    Visit,
    /// Clear all progress
    Reset,
}

/// `consent` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConsentAction {
    /// Record a cookie consent decision
    Set {
        #[arg(long)]
        analytics: bool,
        #[arg(long)]
        marketing: bool,
    },
    /// Withdraw the cookie consent decision
    Withdraw,
    /// Opt out of analytics
    OptOut {
        /// Opt back in
        #[arg(long)]
        undo: bool,
    },
    /// Switch demo mode
    Demo {
        /// Turn demo mode off
        #[arg(long)]
        off: bool,
    },
}

/// `feedback` subcommands.
#[derive(Subcommand, Debug)]
pub enum FeedbackAction {
    /// Submit a rating for a page
    Submit {
        page: String,
        rating: u8,
        #[arg(short, long, default_value = "")]
        comment: String,
    },
    /// List submitted feedback
    List,
}

/// `checklist` subcommands.
#[derive(Subcommand, Debug)]
pub enum ChecklistAction {
    /// Mark an item done
    Tick { id: String },
    /// Mark an item not done
    Untick { id: String },
    /// Clear the checklist
    Reset,
}

// =============================================================================
// COMMAND CONTEXT
// =============================================================================

/// Resolved settings plus the clock reading for one invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub settings: Settings,
    pub now: OffsetDateTime,
}

impl Context {
    fn from_cli(cli: &Cli) -> Result<Self, PlaybookError> {
        let settings = Settings::resolve(&Overrides {
            config: cli.config.clone(),
            database: cli.database.clone(),
            backend: cli.backend.clone(),
            content: cli.content.clone(),
            json_mode: cli.json_mode,
        })?;
        let now = match &cli.today {
            Some(day) => parse_date(day)?.midnight().assume_utc(),
            None => OffsetDateTime::now_utc(),
        };
        Ok(Self { settings, now })
    }

    #[must_use]
    pub fn json_mode(&self) -> bool {
        self.settings.json_mode
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), PlaybookError> {
    let ctx = Context::from_cli(&cli)?;
    tracing::debug!(
        database = %ctx.settings.database.display(),
        backend = ctx.settings.backend.as_str(),
        "settings resolved"
    );

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&ctx, force),
        Some(Commands::Status) => cmd_status(&ctx),
        Some(Commands::Assess { action }) => {
            cmd_assess(&ctx, action.unwrap_or(AssessAction::Show))
        }
        Some(Commands::Maturity { action }) => cmd_maturity(&ctx, action),
        Some(Commands::Timeline { fiscal_year_end }) => {
            cmd_timeline(&ctx, fiscal_year_end.as_deref())
        }
        Some(Commands::Progress { action }) => cmd_progress(&ctx, action),
        Some(Commands::Search {
            query,
            limit,
            clear_recent,
        }) => cmd_search(&ctx, query.as_deref(), limit, clear_recent),
        Some(Commands::Vendor { id, link, css }) => {
            cmd_vendor(&ctx, id.as_deref(), link.as_deref(), css)
        }
        Some(Commands::Templates {
            role,
            selected,
            link,
        }) => cmd_templates(&ctx, role.as_deref(), selected.as_deref(), link.as_deref()),
        Some(Commands::Experiment {
            name,
            variants,
            impression,
            conversion,
        }) => cmd_experiment(&ctx, &name, variants, impression, conversion),
        Some(Commands::Consent { action }) => cmd_consent(&ctx, action),
        Some(Commands::Feedback { action }) => {
            cmd_feedback(&ctx, action.unwrap_or(FeedbackAction::List))
        }
        Some(Commands::Checklist { action }) => cmd_checklist(&ctx, action),
        Some(Commands::Report { output, vendor }) => {
            cmd_report(&ctx, output.as_deref(), vendor.as_deref())
        }
        Some(Commands::Export { output }) => cmd_export(&ctx, &output),
        Some(Commands::Import { input }) => cmd_import(&ctx, &input),
        Some(Commands::Hash) => cmd_hash(&ctx),
        None => {
            // No subcommand - show status by default
            cmd_status(&ctx)
        }
    }
}
