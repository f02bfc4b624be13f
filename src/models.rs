//! Data models for the tomato timer.
//!
//! Persisted shapes (`Settings`, `Task`) keep the camelCase field names the
//! stored JSON blobs use, so older data files load unchanged.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// What the current countdown is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Focused work. Only these sessions count as pomodoros.
    #[default]
    Work,
    /// Short or long break.
    Break,
}

impl Phase {
    /// Returns the other phase.
    pub fn toggled(self) -> Self {
        match self {
            Self::Work => Self::Break,
            Self::Break => Self::Work,
        }
    }
}

/// The live countdown.
///
/// `remaining_secs` never exceeds `total_secs`; a phase completes exactly
/// when `remaining_secs` reaches zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub remaining_secs: u32,
    pub total_secs: u32,
    pub running: bool,
    /// Set while a long break is counting down.
    pub long_break: bool,
}

impl SessionState {
    /// Creates a stopped, full-length countdown for `phase`.
    pub fn new(phase: Phase, total_secs: u32) -> Self {
        Self {
            phase,
            remaining_secs: total_secs,
            total_secs,
            running: false,
            long_break: false,
        }
    }

    /// Returns true if a countdown has been started and then paused part way.
    pub fn is_paused(&self) -> bool {
        !self.running && self.remaining_secs < self.total_secs
    }

    #[cfg(test)]
    pub fn is_work(&self) -> bool {
        self.phase == Phase::Work
    }

    #[cfg(test)]
    pub fn is_break(&self) -> bool {
        self.phase == Phase::Break
    }

    /// Returns the progress percentage (0.0 to 1.0) of the current phase.
    pub fn progress_percent(&self) -> f32 {
        if self.total_secs == 0 {
            return 1.0;
        }
        1.0 - (self.remaining_secs as f32 / self.total_secs as f32)
    }
}

/// User-configurable settings, stored wholesale under the `settings` key.
///
/// Missing fields fall back to the defaults; unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Duration of a work session in minutes.
    #[serde(rename = "workDuration")]
    pub work_mins: u32,
    /// Duration of a short break in minutes.
    #[serde(rename = "breakDuration")]
    pub break_mins: u32,
    /// Duration of a long break in minutes.
    #[serde(rename = "longBreakDuration")]
    pub long_break_mins: u32,
    /// Number of completed work sessions before a long break.
    #[serde(rename = "longBreakInterval")]
    pub long_break_interval: u32,
    #[serde(rename = "soundEnabled")]
    pub sound_enabled: bool,
    #[serde(rename = "notificationsEnabled")]
    pub notifications_enabled: bool,
    /// Start the next phase automatically after a natural completion.
    #[serde(rename = "autoStart")]
    pub auto_start_next: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_mins: 25,
            break_mins: 5,
            long_break_mins: 15,
            long_break_interval: 4,
            sound_enabled: true,
            notifications_enabled: true,
            auto_start_next: false,
        }
    }
}

impl Settings {
    /// Length in seconds of a countdown for the given phase.
    pub fn phase_secs(&self, phase: Phase, long_break: bool) -> u32 {
        let mins = match phase {
            Phase::Work => self.work_mins,
            Phase::Break if long_break => self.long_break_mins,
            Phase::Break => self.break_mins,
        };
        mins.saturating_mul(60)
    }
}

/// One completed work session attributed to a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroEntry {
    pub start_time: DateTime<Local>,
    #[serde(rename = "duration", alias = "durationMinutes")]
    pub duration_minutes: u32,
}

/// A task that work sessions can be attributed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub target_pomos: u32,
    #[serde(default)]
    pub completed_pomos: u32,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: DateTime<Local>,
    #[serde(default)]
    pub pomodoros: Vec<PomodoroEntry>,
}

impl Task {
    pub fn new(id: String, title: String, target_pomos: u32, created_at: DateTime<Local>) -> Self {
        Self {
            id,
            title,
            target_pomos,
            completed_pomos: 0,
            is_completed: false,
            created_at,
            pomodoros: Vec::new(),
        }
    }

    /// Progress as "done/target".
    pub fn progress_label(&self) -> String {
        format!("{}/{}", self.completed_pomos, self.target_pomos)
    }

    /// Total minutes of work attributed to this task.
    pub fn focus_minutes(&self) -> u32 {
        self.pomodoros.iter().map(|p| p.duration_minutes).sum()
    }
}
