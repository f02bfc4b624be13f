//! Main application state and logic.
//!
//! [`App`] is the single owner of settings, tasks, statistics and the
//! countdown. All commands go through it and return the events they caused.

use crate::clock::{Clock, SystemClock};
use crate::event::Event;
use crate::models::{Phase, SessionState, Settings};
use crate::persistence::{
    KeyValueStore, Repository, SqliteStore, StoreError, KEY_RECORDS, KEY_SETTINGS, KEY_TASKS,
};
use crate::scheduler::{Scheduler, Wakeup};
use crate::settings;
use crate::stats::Statistics;
use crate::tasks::TaskRegistry;
use crate::timer::{SessionTimer, TickOutcome};
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Pause between a natural completion and the automatic start of the next
/// phase when auto-start is on.
pub const AUTO_START_DELAY: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

pub struct App {
    pub settings: Settings,
    pub tasks: TaskRegistry,
    pub stats: Statistics,
    timer: SessionTimer,
    repo: Rc<Repository>,
    clock: Rc<dyn Clock>,
    /// Work sessions completed since the last long break.
    pomodoros_in_cycle: u32,
    /// The last settings save failed; the in-memory copy is newer.
    settings_unsaved: bool,
}

impl App {
    /// Opens the SQLite store at `path` and loads everything from it.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let store = SqliteStore::open(path)?;
        Ok(Self::with_store(store, Rc::new(SystemClock)))
    }

    /// Builds an app over any store and clock.
    pub fn with_store(store: impl KeyValueStore + 'static, clock: Rc<dyn Clock>) -> Self {
        let repo = Rc::new(Repository::new(store));
        let settings = settings::load(&repo);
        let tasks = TaskRegistry::load(Rc::clone(&repo), Rc::clone(&clock));
        let stats = Statistics::load(Rc::clone(&repo), Rc::clone(&clock));
        let timer = SessionTimer::new(&settings, Scheduler::new(Rc::clone(&clock)));

        Self {
            settings,
            tasks,
            stats,
            timer,
            repo,
            clock,
            pomodoros_in_cycle: 0,
            settings_unsaved: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.timer.state()
    }

    pub fn pomodoros_in_cycle(&self) -> u32 {
        self.pomodoros_in_cycle
    }

    pub fn start(&mut self) -> Vec<Event> {
        if !self.timer.start() {
            return Vec::new();
        }
        let state = self.timer.state();
        vec![Event::Started {
            phase: state.phase,
            remaining_secs: state.remaining_secs,
        }]
    }

    pub fn pause(&mut self) -> Vec<Event> {
        if !self.timer.pause() {
            return Vec::new();
        }
        vec![Event::Paused {
            remaining_secs: self.timer.state().remaining_secs,
        }]
    }

    /// Stops and reverts to a full work session.
    pub fn reset(&mut self) -> Vec<Event> {
        self.timer.reset(&self.settings);
        self.pomodoros_in_cycle = 0;
        vec![Event::Reset {
            total_secs: self.timer.state().total_secs,
        }]
    }

    /// Ends the current phase early. Skipped sessions are never counted.
    pub fn skip(&mut self) -> Vec<Event> {
        let state = self.timer.state();
        let completed = Event::SessionCompleted {
            phase: state.phase,
            natural: false,
            pomodoros_today: self.stats.today_count(),
        };
        vec![completed, self.switch_mode(false)]
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> Vec<Event> {
        match self.timer.tick() {
            TickOutcome::Finished => self.complete_session(),
            TickOutcome::Idle | TickOutcome::Counting => Vec::new(),
        }
    }

    /// Delivers every wakeup the scheduler has due.
    pub fn pump(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(wakeup) = self.timer.next_due() {
            match wakeup {
                Wakeup::Tick => events.extend(self.tick()),
                Wakeup::Start => events.extend(self.start()),
            }
        }
        events
    }

    /// Picks up settings, tasks and records another process stored since
    /// they were loaded. New durations apply from the next reset or phase
    /// switch, like any settings change.
    pub fn sync(&mut self) {
        if !self.settings_unsaved {
            match self.repo.try_get::<Settings>(KEY_SETTINGS) {
                Ok(stored) => self.settings = stored.unwrap_or_default(),
                Err(e) => tracing::warn!(error = %e, "could not re-read settings"),
            }
        }
        self.tasks.sync();
        self.stats.sync();
    }

    /// When the event loop next needs to call [`App::pump`].
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.next_deadline()
    }

    fn complete_session(&mut self) -> Vec<Event> {
        self.timer.halt();

        let state = self.timer.state();
        let phase = state.phase;
        let duration_mins = state.total_secs / 60;
        let mut events = Vec::new();
        let mut long_break = false;

        if phase == Phase::Work {
            self.stats.record_completion(self.clock.today());
            self.pomodoros_in_cycle += 1;
            long_break = self.pomodoros_in_cycle >= self.settings.long_break_interval;
            if long_break {
                self.pomodoros_in_cycle = 0;
            }

            events.push(Event::SessionCompleted {
                phase,
                natural: true,
                pomodoros_today: self.stats.today_count(),
            });

            if let Some(attribution) = self.tasks.attribute_completed_session(duration_mins) {
                tracing::debug!(task = %attribution.task_id, done = attribution.completed_pomos, "session attributed");
                if attribution.finished {
                    events.push(Event::TaskFinished {
                        title: attribution.title,
                    });
                }
            }
        } else {
            events.push(Event::SessionCompleted {
                phase,
                natural: true,
                pomodoros_today: self.stats.today_count(),
            });
        }

        tracing::info!(?phase, "session completed");
        events.push(self.switch_mode(long_break));

        if self.settings.auto_start_next {
            self.timer.schedule_start(AUTO_START_DELAY);
        }
        events
    }

    fn switch_mode(&mut self, long_break: bool) -> Event {
        self.timer.switch_mode(&self.settings, long_break);
        let state = self.timer.state();
        Event::PhaseChanged {
            phase: state.phase,
            long_break: state.long_break,
            total_secs: state.total_secs,
        }
    }

    pub fn add_task(&mut self, title: &str, target_pomos: u32) -> Vec<Event> {
        match self.tasks.add_task(title, target_pomos) {
            Ok(task) => vec![Event::TaskAdded {
                id: task.id.clone(),
                title: task.title.clone(),
            }],
            Err(e) => vec![Event::ValidationRejected {
                message: e.to_string(),
            }],
        }
    }

    /// `reference` is a task id or a 1-based list position.
    pub fn select_task(&mut self, reference: &str) -> Vec<Event> {
        let selected = self
            .tasks
            .resolve(reference)
            .and_then(|id| self.tasks.select_task(&id))
            .map(|task| Event::TaskSelected {
                id: task.id.clone(),
                title: task.title.clone(),
            });
        vec![selected.unwrap_or_else(|| not_found(reference))]
    }

    pub fn toggle_task(&mut self, reference: &str) -> Vec<Event> {
        let toggled = self
            .tasks
            .resolve(reference)
            .and_then(|id| self.tasks.toggle_complete(&id))
            .map(|task| Event::TaskToggled {
                title: task.title.clone(),
                completed: task.is_completed,
            });
        vec![toggled.unwrap_or_else(|| not_found(reference))]
    }

    /// Deletes without asking; confirmation belongs to the caller.
    pub fn delete_task(&mut self, reference: &str) -> Vec<Event> {
        let deleted = self
            .tasks
            .resolve(reference)
            .and_then(|id| self.tasks.delete_task(&id))
            .map(|task| Event::TaskDeleted { title: task.title });
        vec![deleted.unwrap_or_else(|| not_found(reference))]
    }

    /// Stores new settings and restarts the countdown with them.
    pub fn save_settings(&mut self, new_settings: Settings) -> Vec<Event> {
        self.settings_unsaved = !settings::save(&self.repo, &new_settings);
        self.settings = new_settings;
        let mut events = vec![Event::SettingsSaved];
        events.extend(self.reset());
        events
    }

    /// Deletes all stored data and returns to defaults.
    pub fn reset_all_data(&mut self) -> bool {
        let cleared = self.repo.clear_all();
        self.tasks.clear();
        self.stats.clear();
        self.settings = Settings::default();
        self.settings_unsaved = false;
        self.reset();
        tracing::info!(cleared, "all data reset");
        cleared
    }

    /// Everything that is persisted, under the keys it is stored with.
    pub fn export(&self) -> serde_json::Value {
        serde_json::json!({
            KEY_SETTINGS: self.settings,
            KEY_TASKS: self.tasks.tasks(),
            KEY_RECORDS: self.stats.records(),
        })
    }
}

fn not_found(reference: &str) -> Event {
    Event::TaskNotFound {
        reference: reference.to_string(),
    }
}
