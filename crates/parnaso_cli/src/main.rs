//! Command-line surface for Parnaso.
//!
//! # Responsibility
//! - Map subcommands onto `parnaso_core` services for one data directory.
//! - Keep presentation here; every data rule lives in the core crate.

use anyhow::{anyhow, bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use parnaso_core::{
    clear_backend_config, default_log_level, export_backup_json, import_backup_json,
    init_logging, logout, update_backend_config, AppContext, Project, ProjectStatus,
    SessionDetails, UserId, UserSettings, WritingSession,
};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "parnaso", version, about = "Parnaso: writing-habit tracker")]
struct Cli {
    /// Directory holding storage.json, logs and the default database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Relational backend configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Create an account (the first one becomes admin)
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in and remember the account for later commands
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show the account commands act on
    Whoami,
    #[command(subcommand)]
    Session(SessionCommand),
    #[command(subcommand)]
    Project(ProjectCommand),
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Dashboard numbers for today (or --date)
    Progress {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete every session and project and restore default goals
    Reset {
        #[arg(long)]
        yes: bool,
    },
    #[command(subcommand)]
    Admin(AdminCommand),
    /// Local storage backup
    #[command(subcommand)]
    Backup(BackupCommand),
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    Show,
    /// Store the SQLite database path (relative paths live in the data dir)
    SetDatabase { path: String },
    /// Forget the stored database path and fall back to local storage
    Clear,
}

#[derive(Debug, Subcommand)]
enum SessionCommand {
    Add(SessionArgs),
    List,
    Delete { id: String },
}

#[derive(Debug, Args)]
struct SessionArgs {
    /// Words written
    #[arg(long)]
    words: u32,
    /// Session day, defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    project: Option<String>,
    /// Start time, HH:MM
    #[arg(long)]
    start: Option<String>,
    /// End time, HH:MM
    #[arg(long)]
    end: Option<String>,
    #[arg(long, default_value_t = 3)]
    stress: u8,
    #[arg(long, default_value_t = 3)]
    difficulty: u8,
    #[arg(long, default_value_t = 3)]
    rating: u8,
    #[arg(long)]
    multitasking: bool,
    #[arg(long)]
    reward: bool,
    #[arg(long)]
    time_strategy: bool,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Debug, Subcommand)]
enum ProjectCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0)]
        target: u32,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        color: Option<String>,
    },
    List,
    /// Change a project's status (active, paused, completed)
    Status {
        id: String,
        #[arg(value_parser = parse_status)]
        status: ProjectStatus,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        daily: Option<u32>,
        #[arg(long)]
        weekly: Option<u32>,
    },
}

#[derive(Debug, Subcommand)]
enum AdminCommand {
    /// List accounts, optionally filtered by name or e-mail
    Users {
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Approve or block a writer
    Block { user_id: String },
    Delete {
        user_id: String,
        #[arg(long)]
        yes: bool,
    },
    Promote { user_id: String },
    /// Print everything stored for one writer as JSON
    Inspect { user_id: String },
    Stats,
}

#[derive(Debug, Subcommand)]
enum BackupCommand {
    /// Write every parnaso_* data key (not sign-in or config) to a JSON file
    Export { file: PathBuf },
    /// Load a backup file, overwriting matching keys
    Import { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) if dir.is_relative() => std::env::current_dir()?.join(dir),
        Some(dir) => dir,
        None => dirs::data_dir()
            .map(|dir| dir.join("parnaso"))
            .ok_or_else(|| anyhow!("no platform data directory; pass --data-dir"))?,
    };

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    if let Err(err) = init_logging(level, data_dir.join("logs")) {
        eprintln!("warning: logging disabled: {err}");
    }

    info!(
        "event=cli_start module=cli status=ok version={} data_dir={}",
        env!("CARGO_PKG_VERSION"),
        data_dir.display()
    );

    let ctx = AppContext::open(&data_dir)
        .with_context(|| format!("cannot open data directory {}", data_dir.display()))?;
    let result = run(&ctx, cli.command);
    if let Err(err) = &result {
        error!("event=cli_command module=cli status=error error={err:#}");
    }
    result
}

fn run(ctx: &AppContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Config(command) => run_config(ctx, command),
        Command::Register {
            name,
            email,
            password,
        } => {
            let user = ctx.auth_service()?.register(&name, &email, &password)?;
            println!("registered {} <{}> role={}", user.id, user.email, user.role.as_str());
            Ok(())
        }
        Command::Login { email, password } => {
            let session = ctx
                .auth_service()?
                .login_and_remember(ctx.kv(), &email, &password)?;
            println!("signed in as {}", session.user().name);
            Ok(())
        }
        Command::Logout => {
            logout(ctx.kv())?;
            println!("signed out");
            Ok(())
        }
        Command::Whoami => {
            let session = ctx.current_session()?;
            let user = session.user();
            println!(
                "{} {} <{}> role={} backend={}",
                user.id,
                user.name,
                user.email,
                user.role.as_str(),
                if ctx.is_relational() { "sqlite" } else { "local" }
            );
            Ok(())
        }
        Command::Session(command) => run_session(ctx, command),
        Command::Project(command) => run_project(ctx, command),
        Command::Settings(command) => run_settings(ctx, command),
        Command::Progress { date } => print_progress(ctx, date.unwrap_or_else(today)),
        Command::Reset { yes } => {
            if !yes {
                bail!("reset deletes all your sessions and projects; rerun with --yes");
            }
            let session = ctx.current_session()?;
            ctx.writing_service()?.reset(&session)?;
            println!("data reset");
            Ok(())
        }
        Command::Admin(command) => run_admin(ctx, command),
        Command::Backup(command) => run_backup(ctx, command),
    }
}

fn run_config(ctx: &AppContext, command: ConfigCommand) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show => {
            let config = ctx.config();
            match config.database_path() {
                Some(path) => println!(
                    "database={} source={}",
                    path.display(),
                    config.source().as_str()
                ),
                None => println!("database=<local storage> source=unset"),
            }
        }
        ConfigCommand::SetDatabase { path } => {
            if !update_backend_config(ctx.kv(), &path)? {
                bail!("database path must not be blank");
            }
            println!("database path stored; it applies from the next command");
        }
        ConfigCommand::Clear => {
            clear_backend_config(ctx.kv())?;
            println!("database path cleared");
        }
    }
    Ok(())
}

fn run_session(ctx: &AppContext, command: SessionCommand) -> anyhow::Result<()> {
    let session = ctx.current_session()?;
    let service = ctx.writing_service()?;
    match command {
        SessionCommand::Add(args) => {
            let mut record = WritingSession::new(args.date.unwrap_or_else(today), args.words);
            record.project_id = args.project;
            record.details = SessionDetails {
                start_time: args.start,
                end_time: args.end,
                stress_level: args.stress,
                difficulty_level: args.difficulty,
                was_multitasking: args.multitasking,
                used_reward: args.reward,
                used_time_strategy: args.time_strategy,
                session_rating: args.rating,
                notes: args.notes,
            };
            let sessions = service.log_session(&session, &record)?;
            println!("logged {} ({} sessions total)", record.id, sessions.len());
        }
        SessionCommand::List => {
            for record in service.sessions(&session)? {
                let minutes = record
                    .details
                    .duration_minutes()
                    .map(|m| format!(" {m}min"))
                    .unwrap_or_default();
                println!(
                    "{} {} {:>6} words{} rating={} project={}",
                    record.id,
                    record.date,
                    record.word_count,
                    minutes,
                    record.details.session_rating,
                    record.project_id.as_deref().unwrap_or("-")
                );
            }
        }
        SessionCommand::Delete { id } => {
            service.delete_session(&session, &id)?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn run_project(ctx: &AppContext, command: ProjectCommand) -> anyhow::Result<()> {
    let session = ctx.current_session()?;
    let service = ctx.writing_service()?;
    match command {
        ProjectCommand::Add {
            name,
            target,
            description,
            color,
        } => {
            let mut project = Project::new(name, target);
            project.description = description;
            if let Some(color) = color {
                project.color = color;
            }
            service.save_project(&session, &project)?;
            println!("created project {}", project.id);
        }
        ProjectCommand::List => {
            for project in service.projects(&session)? {
                println!(
                    "{} {} target={} status={} color={}",
                    project.id,
                    project.name,
                    project.target_word_count,
                    project.status.as_str(),
                    project.color
                );
            }
        }
        ProjectCommand::Status { id, status } => {
            let mut project = service
                .projects(&session)?
                .into_iter()
                .find(|project| project.id == id)
                .ok_or_else(|| anyhow!("unknown project: {id}"))?;
            project.status = status;
            service.save_project(&session, &project)?;
            println!("{} is now {}", project.name, status.as_str());
        }
    }
    Ok(())
}

fn run_settings(ctx: &AppContext, command: SettingsCommand) -> anyhow::Result<()> {
    let session = ctx.current_session()?;
    let service = ctx.writing_service()?;
    let current = service.settings(&session)?;
    let shown = match command {
        SettingsCommand::Show => current,
        SettingsCommand::Set { daily, weekly } => service.update_settings(
            &session,
            &UserSettings {
                daily_word_goal: daily.unwrap_or(current.daily_word_goal),
                weekly_word_goal: weekly.unwrap_or(current.weekly_word_goal),
            },
        )?,
    };
    println!(
        "daily_goal={} weekly_goal={}",
        shown.daily_word_goal, shown.weekly_word_goal
    );
    Ok(())
}

fn print_progress(ctx: &AppContext, date: NaiveDate) -> anyhow::Result<()> {
    let session = ctx.current_session()?;
    let summary = ctx.writing_service()?.progress(&session, date)?;
    println!("{}", summary.today);
    println!(
        "today: {}/{} words ({}%){}",
        summary.words_today,
        summary.daily_goal,
        summary.daily_percent,
        if summary.daily_goal_met { " goal met" } else { "" }
    );
    println!(
        "week:  {}/{} words ({}%){}",
        summary.words_this_week,
        summary.weekly_goal,
        summary.weekly_percent,
        if summary.weekly_goal_met { " goal met" } else { "" }
    );
    println!(
        "total: {} words in {} sessions, {} minutes tracked, streak {} days",
        summary.total_words,
        summary.total_sessions,
        summary.total_minutes,
        summary.current_streak_days
    );
    for project in &summary.projects {
        println!(
            "  {} [{}] {}/{} ({}%)",
            project.name,
            project.status.as_str(),
            project.words,
            project.target_word_count,
            project.percent
        );
    }
    Ok(())
}

fn run_backup(ctx: &AppContext, command: BackupCommand) -> anyhow::Result<()> {
    match command {
        BackupCommand::Export { file } => {
            let json = export_backup_json(ctx.kv())?;
            fs::write(&file, json).with_context(|| format!("cannot write {}", file.display()))?;
            println!("backup written to {}", file.display());
        }
        BackupCommand::Import { file } => {
            let json = fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let report = import_backup_json(ctx.kv(), &json)?;
            println!(
                "imported {} keys, skipped {}",
                report.imported, report.skipped
            );
        }
    }
    Ok(())
}

fn run_admin(ctx: &AppContext, command: AdminCommand) -> anyhow::Result<()> {
    let actor = ctx.current_session()?;
    let admin = ctx.admin_service()?;
    match command {
        AdminCommand::Users { search } => {
            for user in admin.list_users(&actor, &search)? {
                println!(
                    "{} {} <{}> role={}{}",
                    user.id,
                    user.name,
                    user.email,
                    user.role.as_str(),
                    if user.is_blocked { " blocked" } else { "" }
                );
            }
        }
        AdminCommand::Block { user_id } => {
            let user = admin.toggle_block(&actor, &UserId::new(user_id))?;
            let state = if user.is_blocked { "blocked" } else { "approved" };
            println!("{} {state}", user.email);
        }
        AdminCommand::Delete { user_id, yes } => {
            if !yes {
                bail!("delete removes the account and all of its data; rerun with --yes");
            }
            admin.delete_user(&actor, &UserId::new(user_id.clone()))?;
            println!("deleted {user_id}");
        }
        AdminCommand::Promote { user_id } => {
            let user = admin.promote(&actor, &UserId::new(user_id))?;
            println!("{} is now admin", user.email);
        }
        AdminCommand::Inspect { user_id } => {
            let data = admin.inspect_user(&actor, &UserId::new(user_id))?;
            let document = serde_json::json!({
                "user": data.user,
                "sessions": data.sessions,
                "projects": data.projects,
                "settings": data.settings,
            });
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        AdminCommand::Stats => {
            let stats = admin.global_stats(&actor)?;
            println!(
                "users={} pending={} sessions={} words={}",
                stats.total_users, stats.pending_users, stats.total_sessions, stats.total_words
            );
            if stats.skipped_users > 0 {
                println!("warning: {} users could not be read", stats.skipped_users);
            }
        }
    }
    Ok(())
}

fn parse_status(value: &str) -> Result<ProjectStatus, String> {
    ProjectStatus::parse(value).ok_or_else(|| format!("unknown status `{value}`"))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
