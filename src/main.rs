//! tomato - a terminal Pomodoro timer.
//!
//! Alternates focus and break countdowns, credits finished focus sessions
//! to a selected task and keeps per-day completion counts.

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod app;
mod audio;
mod clock;
mod command;
mod display;
mod event;
mod models;
mod notifications;
mod persistence;
mod scheduler;
mod settings;
mod stats;
mod tasks;
mod timer;

use app::App;
use audio::AudioPlayer;
use command::{Command, Outcome, View};
use event::Event;
use persistence::SqliteStore;
use settings::SettingsForm;

/// How long the shell waits for input when no countdown is running.
const IDLE_POLL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "tomato", version, about = "A terminal Pomodoro timer with task tracking")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "TOMATO_DB", global = true)]
    db: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive timer shell (default)
    Run,
    /// Manage tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Show today, week and total counts with a 7-day chart
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Write settings, tasks and records as one JSON document
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete all settings, tasks and records
    ResetData {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Add a task
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        /// Pomodoros needed to finish it
        #[arg(short, long, default_value_t = 1)]
        pomos: u32,
    },
    /// List tasks
    List {
        #[arg(long)]
        json: bool,
    },
    /// Toggle a task's completion
    Done { task: String },
    /// Delete a task
    Delete {
        task: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    Set(SetArgs),
}

#[derive(Args)]
struct SetArgs {
    /// Focus minutes
    #[arg(long)]
    work: Option<String>,
    /// Short break minutes
    #[arg(long = "break")]
    break_mins: Option<String>,
    /// Long break minutes
    #[arg(long)]
    long_break: Option<String>,
    /// Focus sessions before a long break
    #[arg(long)]
    interval: Option<String>,
    #[arg(long)]
    sound: Option<bool>,
    #[arg(long)]
    notifications: Option<bool>,
    #[arg(long)]
    auto_start: Option<bool>,
}

impl From<SetArgs> for SettingsForm {
    fn from(args: SetArgs) -> Self {
        Self {
            work_mins: args.work,
            break_mins: args.break_mins,
            long_break_mins: args.long_break,
            long_break_interval: args.interval,
            sound_enabled: args.sound,
            notifications_enabled: args.notifications,
            auto_start_next: args.auto_start,
        }
    }
}

/// Input from the stdin reader thread.
enum Input {
    Line(String),
    Eof,
}

/// Plays sounds and shows notifications for events, as settings allow.
struct Presenter {
    audio: AudioPlayer,
}

impl Presenter {
    fn new() -> Self {
        Self {
            audio: AudioPlayer::new(),
        }
    }

    fn present(&self, app: &App, events: &[Event]) {
        for event in events {
            if let Some(message) = event.message() {
                println!("\n{}", message);
            }

            let cue = matches!(
                event,
                Event::Started { .. } | Event::SessionCompleted { natural: true, .. }
            );
            if cue && app.settings.sound_enabled {
                self.audio.play_chime();
            }
            if app.settings.notifications_enabled {
                notifications::notify(event);
            }
        }
    }
}

fn print_view(app: &App, view: View) {
    match view {
        View::Tasks => println!(
            "{}",
            display::format_task_list(app.tasks.tasks(), app.tasks.selected_id())
        ),
        View::Stats => println!("{}", display::format_stats(&app.stats, app.settings.work_mins)),
        View::Status => {
            let state = app.state();
            println!("{}", display::format_status(state));
            println!("{}", display::format_progress(state));
            if let Some(task) = app.tasks.selected() {
                println!(
                    "Task: {} ({}, {} min)",
                    task.title,
                    task.progress_label(),
                    task.focus_minutes()
                );
            }
            println!(
                "Cycle: {}/{} before a long break",
                app.pomodoros_in_cycle(),
                app.settings.long_break_interval
            );
            println!("{}", display::format_today(app.stats.today_count(), app.settings.work_mins));
        }
        View::Settings => println!("{}", display::format_settings(&app.settings)),
        View::Help => println!("{}", command::HELP),
    }
}

/// The in-place countdown line, redrawn only while running and never over
/// an open y/N prompt.
fn status_line(app: &App, awaiting_answer: bool) -> Option<String> {
    let state = app.state();
    if !state.running || awaiting_answer {
        return None;
    }
    Some(format!(
        "{}  {}",
        display::format_status(state),
        display::format_progress(state)
    ))
}

fn spawn_stdin_reader() -> Receiver<Input> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Input::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Input::Eof);
    });
    rx
}

/// Single-threaded event loop: all app state is touched only here. The
/// reader thread just forwards lines.
fn run_interactive(mut app: App) -> Result<(), Box<dyn Error>> {
    let presenter = Presenter::new();
    let input = spawn_stdin_reader();
    let mut pending_delete: Option<String> = None;

    print_view(&app, View::Status);
    println!("Type 'help' for commands.");

    loop {
        let timeout = app
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_POLL);

        match input.recv_timeout(timeout) {
            Ok(Input::Line(line)) => {
                if let Some(task) = pending_delete.take() {
                    if matches!(line.trim(), "y" | "Y" | "yes") {
                        app.sync();
                        let events = app.delete_task(&task);
                        presenter.present(&app, &events);
                    } else {
                        println!("Not deleted.");
                    }
                    continue;
                }

                match line.parse::<Command>() {
                    Ok(Command::Delete(task)) => {
                        print!("Delete task {}? [y/N] ", task);
                        io::stdout().flush()?;
                        pending_delete = Some(task);
                    }
                    Ok(cmd) => match command::execute(&mut app, cmd) {
                        Outcome::Events(events) => presenter.present(&app, &events),
                        Outcome::Show(view) => print_view(&app, view),
                        Outcome::Quit => break,
                    },
                    Err(e) => println!("{}", e),
                }
            }
            Ok(Input::Eof) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let events = app.pump();
        if !events.is_empty() {
            presenter.present(&app, &events);
        }
        if let Some(line) = status_line(&app, pending_delete.is_some()) {
            print!("\r{}   ", line);
            io::stdout().flush()?;
        }
    }

    println!();
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let db_path = cli.db.unwrap_or_else(SqliteStore::default_path);
    let mut app = App::open(&db_path)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_interactive(app)?,
        Commands::Task { action } => match action {
            TaskAction::Add { title, pomos } => {
                report(&app.add_task(&title.join(" "), pomos))?;
            }
            TaskAction::List { json } => {
                if json {
                    println!("{}", serde_json::to_string_pretty(app.tasks.tasks())?);
                } else {
                    print_view(&app, View::Tasks);
                }
            }
            TaskAction::Done { task } => report(&app.toggle_task(&task))?,
            TaskAction::Delete { task, yes } => {
                if !yes {
                    return Err("refusing to delete without --yes".into());
                }
                report(&app.delete_task(&task))?;
            }
        },
        Commands::Stats { json } => {
            if json {
                let days: Vec<_> = app.stats.last_7_days().collect();
                let summary = serde_json::json!({
                    "today": app.stats.today_count(),
                    "week": app.stats.week_count(),
                    "total": app.stats.total_count(),
                    "focusMinutes": app.stats.total_focus_minutes(app.settings.work_mins),
                    "last7Days": days,
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_view(&app, View::Stats);
            }
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show => println!("{}", serde_json::to_string_pretty(&app.settings)?),
            SettingsAction::Set(args) => {
                let form = SettingsForm::from(args);
                if form.is_empty() {
                    return Err("nothing to change; see `tomato settings set --help`".into());
                }
                let next = form.apply(&app.settings);
                report(&app.save_settings(next))?;
                println!("{}", serde_json::to_string_pretty(&app.settings)?);
            }
        },
        Commands::Export { output } => {
            let json = serde_json::to_string_pretty(&app.export())?;
            match output {
                Some(path) => std::fs::write(&path, json)?,
                None => println!("{}", json),
            }
        }
        Commands::ResetData { yes } => {
            if !yes {
                return Err("refusing to reset all data without --yes".into());
            }
            if !app.reset_all_data() {
                return Err("some data could not be removed".into());
            }
            println!("All data removed.");
        }
    }
    Ok(())
}

/// Prints event messages for one-shot commands; a rejected or unmatched
/// request becomes the process error.
fn report(events: &[Event]) -> Result<(), Box<dyn Error>> {
    for event in events {
        let Some(message) = event.message() else { continue };
        match event {
            Event::ValidationRejected { .. } | Event::TaskNotFound { .. } => {
                return Err(message.into())
            }
            _ => println!("{}", message),
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    run(cli)
}
