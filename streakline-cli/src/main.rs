use anyhow::{bail, Context, Result};
use chrono::{Days, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use streakline_core::time::{local_today, parse_day, parse_timezone};
use streakline_core::{
    day_grid, mark_progress, progress_in_range, recalculate_streak, resolve_destination,
    resolve_duplicates, EditPolicy, Goal, GoalStatus, Location, ProgressMark, RecordStore,
    StreakSnapshot, SubscriptionStatus,
};
use streakline_ingest::parse_progress_file;
use std::path::PathBuf;
use tracing::debug;

mod config;
mod logging;
mod state;
mod store;

use config::{init_config, load_config};
use store::FileStore;

#[derive(Parser, Debug)]
#[command(
    name = "streakline",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("STREAKLINE_BUILD_SHA"), ")"),
    about = "Habit progress and streak tracker"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Config file management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Local account/session state used by `route`
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },

    /// Goal management
    Goal {
        #[command(subcommand)]
        command: GoalCommand,
    },

    /// Mark a day for a goal and print the updated streak
    Mark {
        goal: String,

        /// Day to mark (default: today in the configured timezone)
        #[arg(long)]
        date: Option<String>,

        /// Record the day as not completed
        #[arg(long, default_value_t = false)]
        missed: bool,

        /// Record as a manual edit rather than a check-in
        #[arg(long, default_value_t = false)]
        manual: bool,
    },

    /// Recompute and print the streak for one goal
    Streak { goal: String },

    /// Print stored streak snapshots for every goal
    Streaks,

    /// List recorded days for a goal, newest first
    History {
        goal: String,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,
    },

    /// Show the last N days with completion and editability
    Grid {
        goal: String,

        #[arg(long, default_value_t = 14)]
        days: u64,
    },

    /// Import a backend export (.json rows or .csv) into a goal's history
    Import { goal: String, file: PathBuf },

    /// Print where the app would route the current session
    Route {
        /// Current route path, e.g. `auth/payment-setup` or `/(tabs)`
        #[arg(long, default_value = "other")]
        at: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config.toml if missing
    Init,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Sign in locally and set payment state
    Set {
        #[arg(long, value_enum, default_value_t = Subscription::Cancelled)]
        subscription: Subscription,

        /// Payment-provider customer id
        #[arg(long)]
        customer: Option<String>,
    },

    /// Drop the local session
    SignOut,
}

#[derive(Subcommand, Debug)]
enum GoalCommand {
    /// Add or replace a goal
    Add {
        id: String,
        description: String,

        #[arg(long, default_value_t = false)]
        primary: bool,
    },

    /// List goals
    List,

    /// Mark a goal active, completed or abandoned
    Status {
        id: String,

        #[arg(value_enum)]
        status: Status,
    },

    /// Print the goal currently being worked on
    Active,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Status {
    Active,
    Completed,
    Abandoned,
}

impl From<Status> for GoalStatus {
    fn from(s: Status) -> Self {
        match s {
            Status::Active => GoalStatus::Active,
            Status::Completed => GoalStatus::Completed,
            Status::Abandoned => GoalStatus::Abandoned,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Subscription {
    Active,
    PastDue,
    Cancelled,
}

impl From<Subscription> for SubscriptionStatus {
    fn from(s: Subscription) -> Self {
        match s {
            Subscription::Active => SubscriptionStatus::Active,
            Subscription::PastDue => SubscriptionStatus::PastDue,
            Subscription::Cancelled => SubscriptionStatus::Cancelled,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config()?;
    logging::init(&cfg.log.level);

    let tz = parse_timezone(&cfg.calendar.timezone)?;
    let today = local_today(Utc::now(), tz);
    let user_id = cfg.profile.user_id.clone();
    debug!(%today, timezone = %cfg.calendar.timezone, user_id = %user_id, "resolved local day");

    match cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Init => init_config()?,
        },

        Command::Account { command } => match command {
            AccountCommand::Set { subscription, customer } => {
                let account = state::AccountFile {
                    subscription_status: subscription.into(),
                    payment_customer_id: customer,
                };
                state::write_account(&account)?;
                println!("Signed in as {user_id} ({:?})", account.subscription_status);
            }
            AccountCommand::SignOut => {
                if state::sign_out()? {
                    println!("Signed out");
                } else {
                    println!("No local session");
                }
            }
        },

        Command::Goal { command } => {
            let mut store = open_store()?;
            match command {
                GoalCommand::Add { id, description, primary } => {
                    let mut goal = Goal::new(&id, description);
                    if primary {
                        goal = goal.primary();
                    }
                    store.upsert_goal(&user_id, goal)?;
                    println!("Saved goal {id}");
                }
                GoalCommand::List => {
                    for g in store.list_goals(&user_id)? {
                        let star = if g.is_primary { "*" } else { " " };
                        println!("{star} {} [{:?}] {}", g.id, g.status, g.description);
                    }
                }
                GoalCommand::Status { id, status } => {
                    let goal = store.set_goal_status(&user_id, &id, status.into())?;
                    println!("{} is now {:?}", goal.id, goal.status);
                }
                GoalCommand::Active => match store.active_goal(&user_id)? {
                    Some(g) => println!("{} {}", g.id, g.description),
                    None => println!("No active goal. Run: streakline goal add <id> \"<description>\""),
                },
            }
        }

        Command::Mark { goal, date, missed, manual } => {
            let mut store = open_store()?;
            require_goal(&store, &user_id, &goal)?;

            let date = match date {
                Some(d) => parse_day(&d)?,
                None => today,
            };
            ensure_markable(date, today, cfg.edit_policy())?;

            let now = Utc::now();
            let mut mark = if missed {
                ProgressMark::missed(date, now)
            } else {
                ProgressMark::completed(date, now)
            };
            if manual {
                mark = mark.manual();
            }

            let out = mark_progress(&mut store, &user_id, &goal, mark, today)?;
            let verb = if out.record.completed { "done" } else { "missed" };
            println!("{} marked {verb} for {goal}", out.record.date);
            print_snapshot(&goal, &out.snapshot);
        }

        Command::Streak { goal } => {
            let mut store = open_store()?;
            require_goal(&store, &user_id, &goal)?;
            let snapshot = recalculate_streak(&mut store, &user_id, &goal, today)?;
            print_snapshot(&goal, &snapshot);
        }

        Command::Streaks => {
            let store = open_store()?;
            let snapshots = store.list_streak_snapshots(&user_id)?;
            if snapshots.is_empty() {
                println!("No streaks yet. Run: streakline mark <goal>");
            }
            for (goal, snapshot) in snapshots {
                print_snapshot(&goal, &snapshot);
            }
        }

        Command::History { goal, from, to } => {
            let store = open_store()?;
            let records = store.list_progress(&user_id, &goal)?;
            let start = from.as_deref().map(parse_day).transpose()?.unwrap_or(NaiveDate::MIN);
            let end = to.as_deref().map(parse_day).transpose()?.unwrap_or(NaiveDate::MAX);

            for r in progress_in_range(&records, start, end) {
                let mark = if r.completed { "x" } else { " " };
                let edited = r
                    .edited_at
                    .map(|t| format!(" (edited {})", t.to_rfc3339()))
                    .unwrap_or_default();
                println!("[{mark}] {} {}{edited}", r.date, r.marked_method.as_str());
            }
        }

        Command::Grid { goal, days } => {
            let store = open_store()?;
            let records = store.list_progress(&user_id, &goal)?;
            let start = today
                .checked_sub_days(Days::new(days.saturating_sub(1)))
                .context("grid range out of bounds")?;

            for d in day_grid(&records, start, today, today, cfg.edit_policy()) {
                let mark = if d.completed { "x" } else { " " };
                let flag = if d.is_locked {
                    "locked"
                } else if d.is_editable {
                    "editable"
                } else {
                    ""
                };
                println!("{} [{mark}] {flag}", d.date.format("%a %Y-%m-%d"));
            }
        }

        Command::Import { goal, file } => {
            let mut store = open_store()?;
            require_goal(&store, &user_id, &goal)?;

            let report = parse_progress_file(&file, &user_id, &goal, tz)?;
            for rejected in &report.rejected {
                eprintln!("skipped row {}: {}", rejected.index + 1, rejected.error);
            }

            let now = Utc::now();
            let records = resolve_duplicates(&report.records);
            for r in &records {
                store.upsert_progress(&user_id, &goal, r.to_mark(now))?;
            }
            let snapshot = recalculate_streak(&mut store, &user_id, &goal, today)?;

            println!(
                "Imported {} days from {} ({} rows skipped)",
                records.len(),
                file.display(),
                report.rejected.len()
            );
            print_snapshot(&goal, &snapshot);
        }

        Command::Route { at } => {
            let store = open_store()?;
            let session = state::current_session(&user_id)?;
            let location = Location::parse(&at);
            let decision = resolve_destination(&store, &session, &location)
                .context("checking onboarding status")?;
            println!("{} ({:?})", decision.destination, decision.rule);
        }
    }

    Ok(())
}

/// `mark` accepts only days the grid shows as editable.
fn ensure_markable(date: NaiveDate, today: NaiveDate, policy: EditPolicy) -> Result<()> {
    let editable = day_grid(&[], date, date, today, policy)
        .first()
        .is_some_and(|d| d.is_editable);
    if !editable {
        if date > today {
            bail!("{date} is in the future (today is {today})");
        }
        bail!("{date} is locked; set [editing] streak_editing_enabled = true to edit older days");
    }
    Ok(())
}

fn open_store() -> Result<FileStore> {
    let path = state::store_path()?;
    FileStore::open(&path).with_context(|| format!("opening {}", path.display()))
}

fn require_goal(store: &FileStore, user_id: &str, goal: &str) -> Result<()> {
    if !store.list_goals(user_id)?.iter().any(|g| g.id == goal) {
        bail!("Unknown goal '{goal}'. Run: streakline goal add {goal} \"<description>\"");
    }
    Ok(())
}

fn print_snapshot(goal: &str, s: &StreakSnapshot) {
    let last = s
        .last_completion_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "never".to_string());
    println!(
        "{goal}: current={} longest={} total={} last={last}",
        s.current_streak, s.longest_streak, s.total_days_completed
    );
}
