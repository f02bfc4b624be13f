//! Commands of the interactive shell and their dispatch into the app.

use crate::app::App;
use crate::event::Event;
use crate::settings::SettingsForm;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Reset,
    Skip,
    Add { title: String, target_pomos: u32 },
    Select(String),
    Toggle(String),
    Delete(String),
    Set(SettingsForm),
    Tasks,
    Stats,
    Status,
    Settings,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("'{0}' needs a task id or number")]
    MissingTask(&'static str),
    #[error("Usage: set <work|break|long-break|interval|sound|notifications|auto-start> <value>")]
    BadSetting,
}

/// Views the shell can print on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Tasks,
    Stats,
    Status,
    Settings,
    Help,
}

/// Result of executing a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// State may have changed; these are the resulting events.
    Events(Vec<Event>),
    /// Nothing changed; show a view.
    Show(View),
    /// User requested quit.
    Quit,
}

pub const HELP: &str = "\
Commands:
  start                 start or resume the countdown
  pause                 pause the countdown
  reset                 stop and return to a full focus session
  skip                  jump to the next phase (not counted)
  add [N] <title>       add a task needing N pomodoros (default 1)
  select <task>         attribute completed sessions to a task
  done <task>           toggle a task's completion
  delete <task>         delete a task (asks first)
  set <field> <value>   change a setting and restart the countdown
                        fields: work, break, long-break, interval (numbers)
                        sound, notifications, auto-start (on/off)
  tasks | stats | status | settings
  help | quit
<task> is an id or a list number.";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let task_ref = |name: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingTask(name))
            } else {
                Ok(rest.to_string())
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "start" | "s" => Ok(Self::Start),
            "pause" | "p" => Ok(Self::Pause),
            "reset" | "r" => Ok(Self::Reset),
            "skip" => Ok(Self::Skip),
            "add" | "a" => Ok(parse_add(rest)),
            "select" | "sel" => task_ref("select").map(Self::Select),
            "done" | "toggle" => task_ref("done").map(Self::Toggle),
            "delete" | "del" | "rm" => task_ref("delete").map(Self::Delete),
            "set" => parse_set(rest).map(Self::Set),
            "settings" => Ok(Self::Settings),
            "tasks" | "ls" => Ok(Self::Tasks),
            "stats" => Ok(Self::Stats),
            "status" | "" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// `add 3 Write report` or `add Write report`. An empty title is passed
/// through so the registry can reject it.
fn parse_add(rest: &str) -> Command {
    let counted = rest
        .split_once(char::is_whitespace)
        .and_then(|(n, title)| Some((n.parse::<u32>().ok()?, title.trim())));
    let (target_pomos, title) = match counted {
        Some(counted) => counted,
        None => match rest.parse::<u32>() {
            Ok(n) => (n, ""),
            Err(_) => (1, rest),
        },
    };
    Command::Add {
        title: title.to_string(),
        target_pomos,
    }
}

/// `set work 50` or `set auto-start on`. Numbers stay raw text so the
/// form applies its own coercion.
fn parse_set(rest: &str) -> Result<SettingsForm, CommandError> {
    let (field, value) = rest
        .split_once(char::is_whitespace)
        .map(|(field, value)| (field.to_ascii_lowercase(), value.trim()))
        .ok_or(CommandError::BadSetting)?;

    let number = || Some(value.to_string());
    let mut form = SettingsForm::default();
    match field.as_str() {
        "work" => form.work_mins = number(),
        "break" => form.break_mins = number(),
        "long-break" | "long" => form.long_break_mins = number(),
        "interval" => form.long_break_interval = number(),
        "sound" => form.sound_enabled = Some(parse_toggle(value)?),
        "notifications" | "notify" => form.notifications_enabled = Some(parse_toggle(value)?),
        "auto-start" | "auto" => form.auto_start_next = Some(parse_toggle(value)?),
        _ => return Err(CommandError::BadSetting),
    }
    Ok(form)
}

fn parse_toggle(value: &str) -> Result<bool, CommandError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(CommandError::BadSetting),
    }
}

/// Runs a command against the app. Picks up what other processes stored
/// first, so views and edits see current data.
pub fn execute(app: &mut App, command: Command) -> Outcome {
    app.sync();
    match command {
        Command::Start => Outcome::Events(app.start()),
        Command::Pause => Outcome::Events(app.pause()),
        Command::Reset => Outcome::Events(app.reset()),
        Command::Skip => Outcome::Events(app.skip()),
        Command::Add {
            title,
            target_pomos,
        } => Outcome::Events(app.add_task(&title, target_pomos)),
        Command::Select(task) => Outcome::Events(app.select_task(&task)),
        Command::Toggle(task) => Outcome::Events(app.toggle_task(&task)),
        Command::Delete(task) => Outcome::Events(app.delete_task(&task)),
        Command::Set(form) => {
            let next = form.apply(&app.settings);
            Outcome::Events(app.save_settings(next))
        }
        Command::Tasks => Outcome::Show(View::Tasks),
        Command::Stats => Outcome::Show(View::Stats),
        Command::Status => Outcome::Show(View::Status),
        Command::Settings => Outcome::Show(View::Settings),
        Command::Help => Outcome::Show(View::Help),
        Command::Quit => Outcome::Quit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::persistence::MemoryStore;
    use std::rc::Rc;

    fn parse(line: &str) -> Result<Command, CommandError> {
        line.parse()
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("start"), Ok(Command::Start));
        assert_eq!(parse("  PAUSE "), Ok(Command::Pause));
        assert_eq!(parse("r"), Ok(Command::Reset));
        assert_eq!(parse("skip"), Ok(Command::Skip));
        assert_eq!(parse(""), Ok(Command::Status));
        assert_eq!(parse("q"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_add() {
        assert_eq!(
            parse("add 3 Write the report"),
            Ok(Command::Add {
                title: "Write the report".into(),
                target_pomos: 3
            })
        );
        assert_eq!(
            parse("add Read"),
            Ok(Command::Add {
                title: "Read".into(),
                target_pomos: 1
            })
        );
        assert_eq!(
            parse("add"),
            Ok(Command::Add {
                title: String::new(),
                target_pomos: 1
            })
        );
        assert_eq!(
            parse("add 4"),
            Ok(Command::Add {
                title: String::new(),
                target_pomos: 4
            })
        );
    }

    #[test]
    fn test_parse_task_commands() {
        assert_eq!(parse("select 2"), Ok(Command::Select("2".into())));
        assert_eq!(parse("done 1760788800000"), Ok(Command::Toggle("1760788800000".into())));
        assert_eq!(parse("rm 1"), Ok(Command::Delete("1".into())));
        assert_eq!(parse("select"), Err(CommandError::MissingTask("select")));
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(
            parse("set work 50"),
            Ok(Command::Set(SettingsForm {
                work_mins: Some("50".into()),
                ..SettingsForm::default()
            }))
        );
        assert_eq!(
            parse("set auto-start on"),
            Ok(Command::Set(SettingsForm {
                auto_start_next: Some(true),
                ..SettingsForm::default()
            }))
        );
        assert_eq!(
            parse("set sound off"),
            Ok(Command::Set(SettingsForm {
                sound_enabled: Some(false),
                ..SettingsForm::default()
            }))
        );
        assert_eq!(parse("set work"), Err(CommandError::BadSetting));
        assert_eq!(parse("set theme dark"), Err(CommandError::BadSetting));
        assert_eq!(parse("set sound maybe"), Err(CommandError::BadSetting));
        assert_eq!(parse("settings"), Ok(Command::Settings));
    }

    #[test]
    fn test_set_resets_running_countdown() {
        let clock = ManualClock::at(2026, 10, 18);
        let store = MemoryStore::new();
        let mut app = App::with_store(store.clone(), Rc::new(clock.clone()));
        execute(&mut app, Command::Start);
        clock.advance_secs(3);
        app.pump();
        assert_eq!(app.state().remaining_secs, 25 * 60 - 3);

        let outcome = execute(&mut app, parse("set work 50").unwrap());
        let Outcome::Events(events) = outcome else {
            panic!("expected events");
        };
        assert_eq!(events[0], Event::SettingsSaved);
        assert!(matches!(events[1], Event::Reset { total_secs: 3000 }));

        let state = app.state();
        assert!(!state.running);
        assert_eq!(state.remaining_secs, 50 * 60);
        assert_eq!(state.total_secs, 50 * 60);
        assert_eq!(app.settings.work_mins, 50);
        assert!(store.raw(crate::persistence::KEY_SETTINGS).unwrap().contains("\"workDuration\":50"));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(parse("launch"), Err(CommandError::Unknown("launch".into())));
    }

    #[test]
    fn test_execute_dispatches_to_app() {
        let clock = ManualClock::at(2026, 10, 18);
        let mut app = App::with_store(MemoryStore::new(), Rc::new(clock));

        let outcome = execute(&mut app, parse("add 2 Plan").unwrap());
        assert!(matches!(outcome, Outcome::Events(ref e) if matches!(e[0], Event::TaskAdded { .. })));

        execute(&mut app, Command::Start);
        assert!(app.state().running);
        execute(&mut app, Command::Pause);
        assert!(!app.state().running);

        assert_eq!(execute(&mut app, Command::Stats), Outcome::Show(View::Stats));
        assert_eq!(execute(&mut app, Command::Quit), Outcome::Quit);
    }

    #[test]
    fn test_execute_add_empty_is_rejected() {
        let clock = ManualClock::at(2026, 10, 18);
        let mut app = App::with_store(MemoryStore::new(), Rc::new(clock));
        let outcome = execute(&mut app, parse("add").unwrap());
        assert!(matches!(
            outcome,
            Outcome::Events(ref e) if matches!(e[0], Event::ValidationRejected { .. })
        ));
        assert!(app.tasks.tasks().is_empty());
    }
}
