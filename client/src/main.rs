// Classroom client - command line front end
// Entry point and application setup

use anyhow::Context;
use clap::{Parser, Subcommand};
use classroom_client::app;
use classroom_client::commands::{self, ClassContent};
use classroom_client::config::{self, ClientConfig};
use classroom_client::models::{ClassInfo, GradeRow};
use classroom_client::services::GradeReport;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "classroom")]
#[command(about = "Classroom service client")]
#[command(version)]
struct Cli {
    /// Base URL of the classroom service
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Directory holding the local database
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and remember the session
    Login { email: String, password: String },
    /// Forget the session and its attachment locks
    Logout,
    /// Show the stored session
    Whoami,
    /// List taught and enrolled classes
    Classes,
    /// Show topics, tasks, materials, quizzes and announcements of a class
    Content { class_id: String },
    /// Show your grades in a class
    Grades { class_id: String },
}

impl Cli {
    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(url) = &self.api_url {
            config.api_base_url = config::normalize_base_url(url);
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(secs) = self.timeout.filter(|s| *s > 0) {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config::DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting classroom client");

    let state = app::setup(cli.config())
        .await
        .context("failed to initialize the client")?;

    match cli.command {
        Command::Login { email, password } => {
            let session = commands::login(&state, &email, &password).await?;
            println!("Logged in as {} (id {}, {})", session.display_name, session.user_id, session.role);
        }
        Command::Logout => {
            commands::logout(&state).await?;
            println!("Logged out");
        }
        Command::Whoami => match commands::whoami(&state).await? {
            Some(session) => {
                println!("{} (id {}, {})", session.display_name, session.user_id, session.role);
                if let Some(email) = session.email {
                    println!("{}", email);
                }
            }
            None => println!("Not logged in"),
        },
        Command::Classes => {
            let classes = commands::list_classes(&state).await?;
            print_classes("Teaching", &classes.taught);
            print_classes("Enrolled", &classes.enrolled);
        }
        Command::Content { class_id } => {
            let content = commands::class_content(&state, &class_id).await?;
            print_content(&content);
        }
        Command::Grades { class_id } => {
            let report = commands::class_grades(&state, &class_id).await?;
            print_grades(&report);
        }
    }

    Ok(())
}

fn print_classes(heading: &str, classes: &[ClassInfo]) {
    println!("{}:", heading);
    if classes.is_empty() {
        println!("  (none)");
    }
    for class in classes {
        println!("  [{}] {} ({})", class.id, class.name, class.code);
    }
}

fn print_content(content: &ClassContent) {
    println!("Class {} ({:?})", content.class_id, content.role);
    if let Some(teacher) = &content.teacher {
        println!("Teacher: {}", teacher);
    }

    for entry in &content.topics {
        println!();
        println!("# {}", entry.topic.title);
        for task in &entry.tasks {
            println!("  task     [{}] {} (due {})", task.id, task.title, task.due_at);
        }
        for material in &entry.materials {
            println!("  material [{}] {}", material.id, material.title);
        }
        for quiz in &entry.quizzes {
            println!("  quiz     [{}] {}", quiz.id, quiz.title);
        }
    }

    if !content.announcements.is_empty() {
        println!();
        println!("Announcements:");
        for announcement in &content.announcements {
            let author = announcement.author_name.as_deref().unwrap_or("?");
            println!("  [{}] {}: {}", announcement.id, author, announcement.message);
        }
    }

    for error in &content.errors {
        eprintln!("warning: {}", error);
    }
}

fn print_grades(report: &GradeReport) {
    print_grade_rows("Tasks", &report.tasks);
    print_grade_rows("Quizzes", &report.quizzes);
    for error in &report.errors {
        eprintln!("warning: {}", error);
    }
}

fn print_grade_rows(heading: &str, rows: &[GradeRow]) {
    println!("{}:", heading);
    if rows.is_empty() {
        println!("  (none)");
    }
    for row in rows {
        println!("  {:<30} {:<20} {}", row.title, row.date, row.grade);
    }
}
