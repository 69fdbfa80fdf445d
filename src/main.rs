use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use fastline::api;
use fastline::clock::SystemClock;
use fastline::config::Settings;
use fastline::db::Database;
use fastline::models::{CreateWindowInput, SaveRegimenInput, UpdateWindowInput, Window, WindowKind};
use fastline::reminders::{InMemoryScheduler, NotificationScheduler, TokioScheduler};
use fastline::timeline::Timeline;

#[derive(Parser)]
#[command(name = "fastline")]
#[command(about = "Intermittent-fasting timeline with regimens and reminders")]
struct Cli {
    /// Database file (overrides FASTLINE_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API and reminder scheduler
    Serve {
        /// Port for HTTP API (overrides FASTLINE_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Start a fast
    Start {
        /// RFC 3339 instant, defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Stop the current fast
    Stop {
        /// RFC 3339 instant, defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Show the current window and today's timeline
    Status,
    /// Manage windows
    Window {
        #[command(subcommand)]
        command: WindowCommand,
    },
    /// Manage regimens
    Regimen {
        #[command(subcommand)]
        command: RegimenCommand,
    },
    /// Fasting achieved over the last seven days
    Summary,
    /// Fasts of the last seven days, grouped by day
    History,
    /// Reminders derived from the upcoming timeline
    Reminders,
    /// Copy the database to PATH
    Export { path: PathBuf },
    /// Replace all data with the contents of the database at PATH
    Import { path: PathBuf },
    /// Delete all windows and regimens
    Reset,
}

#[derive(Subcommand)]
enum WindowCommand {
    /// List windows intersecting a range (defaults to today)
    List {
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },
    /// Add a window
    Add {
        /// fast or eat
        #[arg(long, value_parser = parse_kind)]
        kind: WindowKind,
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Edit a window
    Edit {
        id: Uuid,
        #[arg(long, value_parser = parse_kind)]
        kind: Option<WindowKind>,
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        #[arg(long)]
        end: Option<DateTime<Utc>>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Delete a window
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum RegimenCommand {
    /// List regimens
    List,
    /// Create a regimen, or update one with --id
    Save {
        #[arg(long)]
        id: Option<Uuid>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        fast_hours: f64,
        #[arg(long)]
        feed_hours: f64,
        /// Make it the active regimen
        #[arg(long)]
        activate: bool,
    },
    /// Make a regimen the active one
    Activate { id: Uuid },
    /// Delete a regimen
    Delete { id: Uuid },
}

fn parse_kind(raw: &str) -> Result<WindowKind, String> {
    WindowKind::from_str(raw).ok_or_else(|| format!("unknown window type '{raw}' (fast, eat)"))
}

fn hours_to_secs(hours: f64) -> i64 {
    (hours * 3600.0).round() as i64
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "fastline=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_timeline(
    settings: &Settings,
    scheduler: Arc<dyn NotificationScheduler>,
) -> anyhow::Result<Timeline<Database>> {
    let db = Database::open(settings.db_path.clone())?;
    db.migrate()?;

    let mut timeline = Timeline::new(db, Arc::new(SystemClock), scheduler)
        .with_lead_time(settings.lead_time())
        .with_upcoming_fasts(settings.upcoming_fasts);
    timeline.refresh()?;
    Ok(timeline)
}

fn print_window(window: &Window) {
    let note = window.note.as_deref().unwrap_or("");
    println!(
        "{}  {:<4} {} -> {}  ({}m, {}) {}",
        window.id,
        window.kind.as_str(),
        window.start.with_timezone(&Local).format("%a %d %b %H:%M"),
        window.end.with_timezone(&Local).format("%a %d %b %H:%M"),
        window.duration().num_minutes(),
        window.source.as_str(),
        note
    );
}

async fn serve(settings: &Settings, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting fastline server on port {}", port);

    let timeline = open_timeline(settings, Arc::new(TokioScheduler::new()))?;
    let app = api::create_router(timeline);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("fastline server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut settings = Settings::from_env()?;
    if let Some(db) = cli.db {
        settings.db_path = db;
    }

    let command = cli.command.unwrap_or(Commands::Serve { port: None });
    if let Commands::Serve { port } = command {
        return serve(&settings, port.unwrap_or(settings.port)).await;
    }

    // One-shot commands derive reminders but have nothing running to deliver them
    let mut timeline = open_timeline(&settings, Arc::new(InMemoryScheduler::new()))?;
    run(command, &mut timeline)
}

fn run(command: Commands, timeline: &mut Timeline<Database>) -> anyhow::Result<()> {
    match command {
        Commands::Serve { .. } => anyhow::bail!("serve is not a one-shot command"),
        Commands::Start { at } => {
            let at = at.unwrap_or_else(Utc::now);
            let fast = timeline.start_fast(at)?;
            println!("Fasting until {}", fast.end.with_timezone(&Local).format("%a %d %b %H:%M"));
        }
        Commands::Stop { at } => {
            let at = at.unwrap_or_else(Utc::now);
            let fast = timeline.stop_fast(at)?;
            let hours = fast.duration().num_minutes() as f64 / 60.0;
            println!("Fast stopped after {:.1}h", hours);
        }
        Commands::Status => {
            let durations = timeline.configured_durations();
            match timeline.active_window() {
                Some(window) if window.is_fast() => {
                    let left = window.end - timeline.now();
                    println!("Fasting, {}m to go", left.num_minutes().max(0));
                }
                Some(_) => println!("Eating"),
                None => println!("No active window"),
            }
            println!(
                "Regimen: {}h fast / {}h feed",
                durations.fast_secs / 3600,
                durations.feed_secs / 3600
            );
            for window in timeline.today_windows() {
                print_window(window);
            }
        }
        Commands::Window { command } => match command {
            WindowCommand::List { from, to } => {
                let (day_start, day_end) = timeline.today_bounds();
                let windows =
                    timeline.list_windows(from.unwrap_or(day_start), to.unwrap_or(day_end))?;
                for window in &windows {
                    print_window(window);
                }
            }
            WindowCommand::Add { kind, start, end, note } => {
                let window = timeline.create_window(CreateWindowInput { kind, start, end, note })?;
                print_window(&window);
            }
            WindowCommand::Edit { id, kind, start, end, note } => {
                let window =
                    timeline.update_window(id, UpdateWindowInput { kind, start, end, note })?;
                print_window(&window);
            }
            WindowCommand::Delete { id } => {
                if timeline.delete_window(id)? {
                    println!("Deleted window {}", id);
                } else {
                    anyhow::bail!("Window {} not found", id);
                }
            }
        },
        Commands::Regimen { command } => match command {
            RegimenCommand::List => {
                for regimen in timeline.regimens()? {
                    let marker = if regimen.is_active { "*" } else { " " };
                    println!(
                        "{} {}  {:<12} {:.1}h fast / {:.1}h feed",
                        marker,
                        regimen.id,
                        regimen.name,
                        regimen.fast_duration().num_minutes() as f64 / 60.0,
                        regimen.feed_duration().num_minutes() as f64 / 60.0
                    );
                }
            }
            RegimenCommand::Save { id, name, fast_hours, feed_hours, activate } => {
                let regimen = timeline.save_regimen(SaveRegimenInput {
                    id,
                    name,
                    fast_secs: hours_to_secs(fast_hours),
                    feed_secs: hours_to_secs(feed_hours),
                    activate,
                })?;
                println!("Saved regimen {} ({})", regimen.name, regimen.id);
            }
            RegimenCommand::Activate { id } => {
                let regimen = timeline.activate_regimen(id)?;
                println!("Active regimen: {}", regimen.name);
            }
            RegimenCommand::Delete { id } => {
                if timeline.delete_regimen(id)? {
                    println!("Deleted regimen {}", id);
                } else {
                    anyhow::bail!("Regimen {} not found", id);
                }
            }
        },
        Commands::Summary => {
            for day in timeline.weekly_summary() {
                println!(
                    "{} {}  {:>5.1}h  {:>3.0}%",
                    day.label,
                    day.date,
                    day.achieved_secs as f64 / 3600.0,
                    day.percent
                );
            }
        }
        Commands::History => {
            for group in timeline.history() {
                println!("{}", group.date);
                for window in &group.windows {
                    print_window(window);
                }
            }
        }
        Commands::Reminders => {
            for event in timeline.reminder_events() {
                println!(
                    "{}  {:<16} {}",
                    event.fire_at.with_timezone(&Local).format("%a %d %b %H:%M"),
                    event.title,
                    event.id
                );
            }
            if timeline.reminder_events().is_empty() {
                println!("No upcoming reminders (lead time {}m)", timeline.lead_time().num_minutes());
            }
        }
        Commands::Export { path } => {
            timeline.export_snapshot(&path)?;
            println!("Exported to {}", path.display());
        }
        Commands::Import { path } => {
            timeline.import_snapshot(&path)?;
            println!("Imported from {}", path.display());
        }
        Commands::Reset => {
            timeline.reset()?;
            println!("All windows and regimens deleted");
        }
    }

    Ok(())
}
