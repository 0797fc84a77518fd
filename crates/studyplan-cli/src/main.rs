//! Studyplan CLI
//!
//! Command-line front end for the study planner.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use studyplan_core::{
    ChainOutcome, CommittedPlan, ConflictAction, DailyHoursRule, DateRange, DistributionResult,
    NewCommitment, PerformanceData, PlanRequest, Planner, PlannerConfig, ReviewMode, Scenario,
    ScheduledSession, Storage, StudyItem, TopicConflictReport, format_minutes,
};

/// Studyplan - capacity-aware study scheduling
#[derive(Parser)]
#[command(name = "studyplan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Plan study sessions around daily capacity and schedule revisions with FSRS-6")]
struct Cli {
    /// Custom data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// User whose plan is managed (overrides STUDYPLAN_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Revision spacing: aggressive, balanced or spaced (overrides STUDYPLAN_REVIEW_MODE)
    #[arg(long, global = true)]
    mode: Option<ReviewMode>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct RangeArgs {
    /// First day of the period (YYYY-MM-DD)
    #[arg(long)]
    from: NaiveDate,
    /// Last day of the period, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: NaiveDate,
}

impl RangeArgs {
    fn range(&self) -> anyhow::Result<DateRange> {
        DateRange::new(self.from, self.to)
            .with_context(|| format!("--to ({}) is before --from ({})", self.to, self.from))
    }
}

#[derive(Args, Clone, Copy)]
struct HoursArgs {
    /// Study hours per weekday (overrides STUDYPLAN_WEEKDAY_HOURS)
    #[arg(long)]
    weekday_hours: Option<f64>,
    /// Study hours per weekend day (overrides STUDYPLAN_WEEKEND_HOURS)
    #[arg(long)]
    weekend_hours: Option<f64>,
    /// Do not study on weekends
    #[arg(long)]
    no_weekends: bool,
}

impl HoursArgs {
    fn apply(&self, mut rule: DailyHoursRule) -> DailyHoursRule {
        if let Some(h) = self.weekday_hours {
            rule.weekday_hours = h;
        }
        if let Some(h) = self.weekend_hours {
            rule.weekend_hours = h;
        }
        if self.no_weekends {
            rule.include_weekends = false;
        }
        rule
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Record an ad-hoc study commitment
    AddCommitment {
        /// Day of the commitment (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Planned minutes
        #[arg(long)]
        minutes: u32,
        /// What will be studied
        #[arg(long)]
        title: String,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        subtopic: Option<String>,
    },

    /// List ad-hoc commitments overlapping the selected items' topics
    Conflicts {
        /// JSON file with the study items
        #[arg(long)]
        items: PathBuf,
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Show how the items would be distributed, without saving anything
    Preview {
        #[arg(long)]
        items: PathBuf,
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        hours: HoursArgs,
    },

    /// Distribute the items and save the plan
    Commit {
        #[arg(long)]
        items: PathBuf,
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        hours: HoursArgs,
        /// Item ids whose overlapping commitments are discarded and rescheduled
        #[arg(long = "replace", value_name = "ITEM_ID")]
        replace: Vec<String>,
        /// Item ids whose overlapping commitments stay outside the plan
        #[arg(long = "exclude", value_name = "ITEM_ID")]
        exclude: Vec<String>,
    },

    /// Mark a session completed and schedule what comes next
    Complete {
        /// Session id
        session_id: String,
        /// Explicit rating: 1 again, 2 hard, 3 good, 4 easy
        #[arg(long, value_parser = clap::value_parser!(i32).range(1..=4))]
        rating: Option<i32>,
        /// Time-on-task score (0-4)
        #[arg(long)]
        time: Option<f64>,
        /// Flashcard score (0-4)
        #[arg(long)]
        flashcards: Option<f64>,
        /// Question score (0-4)
        #[arg(long)]
        questions: Option<f64>,
        /// Completion score (0-4)
        #[arg(long)]
        completion: Option<f64>,
    },

    /// List planned sessions
    Sessions {
        #[command(flatten)]
        range: RangeArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs to stderr; stdout carries results
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    let mut config = PlannerConfig::from_env();
    if let Some(user) = cli.user.clone() {
        config.user_id = user;
    }
    if let Some(mode) = cli.mode {
        config.review_mode = mode;
    }

    tracing::debug!(user = %config.user_id, mode = %config.review_mode, "Loaded configuration");

    let storage = open_storage(cli.data_dir.as_deref())?;
    let planner = Planner::new(storage, config);
    let json = cli.json;

    match cli.command {
        Commands::AddCommitment {
            date,
            minutes,
            title,
            topic,
            subtopic,
        } => run_add_commitment(&planner, json, NewCommitment {
            date,
            minutes,
            title,
            topic_ref: topic,
            subtopic_ref: subtopic,
        }),
        Commands::Conflicts { items, range } => run_conflicts(&planner, json, &items, range),
        Commands::Preview { items, range, hours } => run_preview(&planner, json, &items, range, hours),
        Commands::Commit {
            items,
            range,
            hours,
            replace,
            exclude,
        } => run_commit(&planner, json, &items, range, hours, &replace, &exclude),
        Commands::Complete {
            session_id,
            rating,
            time,
            flashcards,
            questions,
            completion,
        } => run_complete(&planner, json, &session_id, PerformanceData {
            time_score: time,
            flashcard_score: flashcards,
            question_score: questions,
            completion_score: completion,
            rating,
        }),
        Commands::Sessions { range } => run_sessions(&planner, json, range),
    }
}

fn open_storage(data_dir: Option<&Path>) -> anyhow::Result<Storage> {
    let path = data_dir.map(|dir| dir.join("studyplan.db"));
    Storage::new(path).context("Failed to open the plan database")
}

fn load_items(path: &Path) -> anyhow::Result<Vec<StudyItem>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let items: Vec<StudyItem> =
        serde_json::from_str(&raw).with_context(|| format!("{} is not a JSON list of study items", path.display()))?;
    if items.is_empty() {
        bail!("{} contains no study items", path.display());
    }
    Ok(items)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_add_commitment(planner: &Planner<Storage>, json: bool, input: NewCommitment) -> anyhow::Result<()> {
    let commitment = planner.store().add_commitment(&planner.config().user_id, input)?;
    if json {
        return print_json(&commitment);
    }
    println!(
        "{} {} on {} ({})",
        "Added".green().bold(),
        commitment.title,
        commitment.date,
        format_minutes(u64::from(commitment.minutes))
    );
    println!("  {}", commitment.id.dimmed());
    Ok(())
}

fn run_conflicts(planner: &Planner<Storage>, json: bool, items: &Path, range: RangeArgs) -> anyhow::Result<()> {
    let items = load_items(items)?;
    let report = planner.detect_topic_conflicts(&items, &range.range()?)?;
    if json {
        return print_json(&report);
    }
    print_topic_conflicts(&report);
    Ok(())
}

fn run_preview(
    planner: &Planner<Storage>,
    json: bool,
    items: &Path,
    range: RangeArgs,
    hours: HoursArgs,
) -> anyhow::Result<()> {
    let request = PlanRequest::new(load_items(items)?, range.range()?).with_hours(hours.apply(planner.config().hours));
    let result = planner.preview_distribution(&request)?;
    if json {
        return print_json(&result);
    }

    println!("{}", "=== Plan Preview (not saved) ===".cyan().bold());
    print_result(&result);
    Ok(())
}

fn run_commit(
    planner: &Planner<Storage>,
    json: bool,
    items: &Path,
    range: RangeArgs,
    hours: HoursArgs,
    replace: &[String],
    exclude: &[String],
) -> anyhow::Result<()> {
    let items = load_items(items)?;
    let range = range.range()?;

    let mut report = planner.detect_topic_conflicts(&items, &range)?;
    for (ids, action) in [(replace, ConflictAction::Replace), (exclude, ConflictAction::Exclude)] {
        for id in ids {
            if !report.resolve(id, action) {
                bail!("item {} has no overlapping commitments to {}", id, format!("{:?}", action).to_lowercase());
            }
        }
    }

    let request = PlanRequest::new(items, range).with_hours(hours.apply(planner.config().hours));
    let plan = planner.commit_distribution(&request, &report.conflicts)?;
    if json {
        return print_json(&plan);
    }
    print_commit(&plan);
    Ok(())
}

fn run_complete(
    planner: &Planner<Storage>,
    json: bool,
    session_id: &str,
    performance: PerformanceData,
) -> anyhow::Result<()> {
    let outcome = planner.complete_session(session_id, performance, Utc::now())?;
    if json {
        return print_json(&outcome);
    }

    println!("{} {}", "Completed".green().bold(), outcome.completed.title);
    match &outcome.chain {
        ChainOutcome::Scheduled(follow) => {
            if let Some(rating) = follow.rating {
                println!("  {}: {}", "Rated".white().bold(), rating);
            }
            println!("  {}: {}", "Next".white().bold(), describe_session(&follow.session));
        }
        ChainOutcome::Existing(next) => {
            println!("  {}: {}", "Next".white().bold(), describe_session(next));
        }
        ChainOutcome::PriorStateMissing => {
            println!(
                "  {}",
                "No review history for this item; no further revision was scheduled.".yellow()
            );
        }
        ChainOutcome::AlreadyCompleted { next_session_id } => {
            println!("  {}", "Session was already completed; nothing changed.".dimmed());
            if let Some(id) = next_session_id {
                println!("  {}: {}", "Next session".white().bold(), id);
            }
        }
    }
    Ok(())
}

fn run_sessions(planner: &Planner<Storage>, json: bool, range: RangeArgs) -> anyhow::Result<()> {
    let sessions = planner.store().list_sessions(&planner.config().user_id, &range.range()?)?;
    if json {
        return print_json(&sessions);
    }
    if sessions.is_empty() {
        println!("{}", "No sessions planned in this period.".dimmed());
        return Ok(());
    }
    print_sessions(&sessions);
    Ok(())
}

// ============================================================================
// OUTPUT
// ============================================================================

fn describe_session(session: &ScheduledSession) -> String {
    format!(
        "{} on {} ({})",
        session.title,
        session.date,
        format_minutes(u64::from(session.duration_minutes))
    )
}

fn print_sessions(sessions: &[ScheduledSession]) {
    let mut current: Option<NaiveDate> = None;
    for session in sessions {
        if current != Some(session.date) {
            println!("{}", session.date.format("%a %Y-%m-%d").to_string().white().bold());
            current = Some(session.date);
        }
        let mark = if session.completed { "x" } else { " " };
        let title = match session.flag {
            Some(_) => session.title.red().to_string(),
            None => session.title.clone(),
        };
        println!(
            "  [{}] {:>7}  {}  {}",
            mark,
            format_minutes(u64::from(session.duration_minutes)),
            title,
            session.id.dimmed()
        );
    }
}

fn print_scenario(scenario: Scenario) {
    let label = scenario.to_string().to_uppercase();
    let label = match scenario {
        Scenario::Impossible => label.red().bold(),
        Scenario::Tight => label.yellow().bold(),
        Scenario::Normal => label.green().bold(),
        Scenario::Relaxed => label.cyan().bold(),
    };
    println!("{}: {}", "Scenario".white().bold(), label);
}

fn print_result(result: &DistributionResult) {
    print_scenario(result.scenario());
    println!(
        "{}: {} of {} ({}%)",
        "Required".white().bold(),
        format_minutes(result.total_required_minutes),
        format_minutes(result.total_available_minutes),
        result.utilization_percentage
    );

    for warning in result.warnings() {
        println!("  {} {}", "!".yellow().bold(), warning);
    }
    for suggestion in &result.feasibility.suggestions {
        println!("  {} {}", "→".cyan(), suggestion);
    }

    if !result.conflicts.is_empty() {
        println!();
        println!("{}", "=== Overloaded Days ===".yellow().bold());
        for conflict in &result.conflicts {
            println!(
                "  {}  {} planned, {} available (+{}%)",
                conflict.date,
                format_minutes(u64::from(conflict.required_minutes)),
                format_minutes(u64::from(conflict.available_minutes)),
                conflict.overload_percentage
            );
        }
    }

    println!();
    println!("{}", "=== Sessions ===".cyan().bold());
    print_sessions(&result.sessions);
}

fn print_commit(plan: &CommittedPlan) {
    println!("{} {}", "Saved plan".green().bold(), plan.plan_id.dimmed());
    if plan.linked_commitments > 0 {
        println!("  {} existing commitment(s) linked", plan.linked_commitments);
    }
    if plan.discarded_commitments > 0 {
        println!("  {} existing commitment(s) replaced", plan.discarded_commitments);
    }
    print_result(&plan.result);
}

fn print_topic_conflicts(report: &TopicConflictReport) {
    if report.conflicts.is_empty() {
        println!("{}", "No topic conflicts.".green());
    }
    for conflict in &report.conflicts {
        println!("{} {}", conflict.item.title.white().bold(), format!("({})", conflict.item.id).dimmed());
        for c in &conflict.commitments {
            println!("  {}  {}  {}", c.date, format_minutes(u64::from(c.minutes)), c.title);
        }
    }
    if !report.unrelated_commitments.is_empty() {
        println!();
        println!("{}", "Other commitments in this period:".dimmed());
        for c in &report.unrelated_commitments {
            println!("  {}  {}  {}", c.date, format_minutes(u64::from(c.minutes)), c.title);
        }
    }
}
