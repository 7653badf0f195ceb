//! Command-line front end
//!
//! # Usage
//!
//! ```bash
//! nihongo-coach login aiko@example.jp secret1
//! nihongo-coach settings set "みんなの日本語" 12
//! nihongo-coach mark 64f0c0ffee --lesson
//! nihongo-coach theme toggle
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::Config;
use crate::models::UserRole;
use crate::services::{AttendanceBoard, NoticeBoard, SettingsService, ThemePreference};
use crate::session::{GuardDecision, RegisterInput, SessionState, SessionStore};
use crate::storage::Storage;

#[derive(Debug, Parser)]
#[command(name = "nihongo-coach")]
#[command(author, version, about = "Nihongo Coach command-line client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Log in and keep the session token
    Login { email: String, password: String },
    /// Create a student account and log in
    Register {
        name: String,
        email: String,
        password: String,
        /// Must repeat the password
        confirm: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Read or write the class book and lesson
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
    /// Today's attendance board
    Attendance,
    /// Mark one student present
    Mark {
        user_id: String,
        /// Also advance the student's lesson count
        #[arg(long)]
        lesson: bool,
    },
    /// Mark every unmarked student present
    MarkAll {
        #[arg(long)]
        lesson: bool,
    },
    /// List notices
    Notices,
    /// Show or switch the colour theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum SettingsAction {
    /// Show the current settings (default)
    Get,
    /// Save a new book and lesson
    Set { book: String, lesson: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum ThemeAction {
    /// Flip between light and dark
    Toggle,
}

/// Everything a command needs
pub struct App {
    pub config: Config,
    pub storage: Arc<Storage>,
    pub api: ApiClient,
    pub session: SessionStore,
}

/// Run one command
pub async fn run(command: Commands, app: &App) -> Result<()> {
    match command {
        Commands::Login { email, password } => {
            let user = app.session.login(&email, &password).await?;
            println!("Logged in as {} ({})", user.name, user.role);
        }
        Commands::Register {
            name,
            email,
            password,
            confirm,
        } => {
            let user = app
                .session
                .register_with_confirmation(RegisterInput::new(name, email, password), &confirm)
                .await?;
            println!("Registered {} ({})", user.name, user.role);
        }
        Commands::Logout => {
            app.session.logout().await;
            println!("Logged out");
        }
        Commands::Whoami => match app.session.state() {
            SessionState::Authenticated(user) => {
                println!("{} <{}> role={}", user.name, user.email, user.role)
            }
            _ => println!("Not logged in"),
        },
        Commands::Settings { action } => {
            let mut settings = SettingsService::new(app.api.clone(), &app.config.settings);
            match action.unwrap_or(SettingsAction::Get) {
                SettingsAction::Get => {
                    require(app, &[])?;
                    let current = settings.refresh().await;
                    println!(
                        "Book: {}  Lesson: {}",
                        current.current_book_name_ja, current.current_lesson
                    );
                }
                SettingsAction::Set { book, lesson } => {
                    require(app, &UserRole::STAFF)?;
                    match settings.update(&book, lesson).await {
                        Ok(outcome) => println!(
                            "Saved via {} after {} rejected attempts",
                            outcome.accepted,
                            outcome.failed_attempts.len()
                        ),
                        Err(e) => {
                            for attempt in e.attempts() {
                                eprintln!("  {}", attempt);
                            }
                            return Err(e.into());
                        }
                    }
                }
            }
        }
        Commands::Attendance => {
            require(app, &UserRole::STAFF)?;
            let mut board = AttendanceBoard::new(app.api.clone());
            board.refresh().await?;
            println!("Marked: {} / {}", board.marked_count(), board.student_count());
            for row in board.students() {
                println!(
                    "{:<24} {:<10} lessons={} streak={}  [{}]",
                    row.user.name,
                    if row.marked { "Present" } else { "Not Marked" },
                    row.lessons_completed,
                    row.current_streak,
                    row.user.id
                );
            }
        }
        Commands::Mark { user_id, lesson } => {
            require(app, &UserRole::STAFF)?;
            let mut board = AttendanceBoard::new(app.api.clone());
            board.refresh().await?;
            let state = board.mark(&user_id, lesson).await?;
            match state.error() {
                Some(error) => bail!("{}", error),
                None => println!("Marked {} present", user_id),
            }
        }
        Commands::MarkAll { lesson } => {
            require(app, &UserRole::STAFF)?;
            let mut board = AttendanceBoard::new(app.api.clone());
            board.refresh().await?;
            let outcome = board.mark_all_unmarked(lesson).await;
            println!("Marked {} students", outcome.confirmed.len());
            if let Some(error) = outcome.error() {
                bail!("{} ({} rejected)", error, outcome.failed.len());
            }
        }
        Commands::Notices => {
            require(app, &[])?;
            let mut board = NoticeBoard::new(app.api.clone());
            for notice in board.refresh().await? {
                println!("[{}] {} by {}", notice.priority, notice.title, notice.author_name());
                println!("    {}", notice.content);
            }
        }
        Commands::Theme { action } => {
            let mut theme = ThemePreference::load(app.storage.clone()).await?;
            if action == Some(ThemeAction::Toggle) {
                theme.toggle().await?;
            }
            println!("{}", theme.current());
        }
    }
    Ok(())
}

fn require(app: &App, roles: &[UserRole]) -> Result<()> {
    match app.session.guard(roles) {
        GuardDecision::Render => Ok(()),
        GuardDecision::Pending => bail!("Session is still loading"),
        GuardDecision::Redirect(path) => {
            bail!("Not permitted; log in with a suitable account ({})", path)
        }
    }
}
