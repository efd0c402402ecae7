//! Rollcall - QR check-in attendance
//!
//! Command-line front end for issuing check-in credentials, recording
//! check-ins and reading attendance reports.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rollcall_core::SessionId;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;
mod state;

/// rollcall - QR check-in attendance
#[derive(Parser, Debug)]
#[command(name = "rollcall")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to policy configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the SQLite database
    #[arg(long)]
    database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Session and roster management
    #[command(subcommand)]
    Session(SessionCommands),

    /// Issue a check-in credential for a session
    Issue {
        /// Session ID
        session: SessionId,

        /// Validity in minutes
        #[arg(short, long, default_value = "5")]
        minutes: i64,
    },

    /// Check a student in with a scanned link
    CheckIn {
        /// Check-in link from the QR code
        link: String,

        /// Student ID
        student: String,

        /// Presentation time (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Preview a scanned link without checking in
    Verify {
        /// Check-in link from the QR code
        link: String,

        /// Student ID
        student: String,
    },

    /// Show classified attendance for a session
    Report {
        /// Session ID
        session: SessionId,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one student's attendance across sessions
    History {
        /// Student ID
        student: String,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List credentials that are still accepted
    Active {
        /// Session ID
        session: SessionId,
    },

    /// Revoke every credential of a session
    Revoke {
        /// Session ID
        session: SessionId,
    },

    /// Delete expired credentials
    Prune,

    /// Read one JSON request from stdin and write the response to stdout
    Handle,
}

#[derive(Subcommand, Debug)]
enum SessionCommands {
    /// Register a session
    Add {
        /// Start time (RFC 3339)
        #[arg(long)]
        start: DateTime<Utc>,

        /// End time (RFC 3339)
        #[arg(long)]
        end: DateTime<Utc>,

        /// Grace period in minutes; falls back to the configured default
        #[arg(long)]
        grace: Option<u32>,
    },

    /// Add students to a session roster
    Enroll {
        /// Session ID
        session: SessionId,

        /// Student IDs
        #[arg(required = true)]
        students: Vec<String>,
    },
}

fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = log_filter(&cli.log_level);

    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let app = state::AppState::new(cli.config.as_deref(), cli.database.as_deref())
        .context("Failed to initialize application")?;
    tracing::debug!(data_dir = %app.data_dir().display(), "Starting rollcall");

    match cli.command {
        Commands::Session(SessionCommands::Add { start, end, grace }) => {
            commands::add_session(&app, start, end, grace)
        }
        Commands::Session(SessionCommands::Enroll { session, students }) => {
            commands::enroll(&app, session, &students)
        }
        Commands::Issue { session, minutes } => commands::issue(&app, session, minutes),
        Commands::CheckIn { link, student, at } => commands::check_in(&app, &link, &student, at),
        Commands::Verify { link, student } => commands::verify(&app, &link, &student),
        Commands::Report { session, json } => commands::report(&app, session, json),
        Commands::History { student, json } => commands::history(&app, &student, json),
        Commands::Active { session } => commands::active(&app, session),
        Commands::Revoke { session } => commands::revoke(&app, session),
        Commands::Prune => commands::prune(&app),
        Commands::Handle => commands::handle(&app, std::io::stdin().lock(), std::io::stdout().lock()),
    }
}
