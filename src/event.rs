//! Events emitted by the core for the presentation layer.

use crate::models::Phase;

/// Something the user should see or hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The countdown started or resumed.
    Started { phase: Phase, remaining_secs: u32 },
    Paused { remaining_secs: u32 },
    /// Timer reverted to a full, stopped work session.
    Reset { total_secs: u32 },
    /// A phase ended. `natural` is false when it was skipped.
    SessionCompleted {
        phase: Phase,
        natural: bool,
        pomodoros_today: u32,
    },
    PhaseChanged {
        phase: Phase,
        long_break: bool,
        total_secs: u32,
    },
    TaskAdded { id: String, title: String },
    TaskSelected { id: String, title: String },
    TaskToggled { title: String, completed: bool },
    TaskDeleted { title: String },
    /// A task reached its target pomodoro count.
    TaskFinished { title: String },
    TaskNotFound { reference: String },
    /// Input was rejected without changing any state.
    ValidationRejected { message: String },
    SettingsSaved,
}

impl Event {
    /// Short text for transient display, if the event warrants one.
    pub fn message(&self) -> Option<String> {
        let text = match self {
            Self::Started {
                phase: Phase::Work, ..
            } => "Focus time started".to_string(),
            Self::Started {
                phase: Phase::Break,
                ..
            } => "Break started".to_string(),
            Self::Paused { .. } => "Paused".to_string(),
            Self::Reset { .. } => "Timer reset".to_string(),
            Self::SessionCompleted {
                phase: Phase::Work,
                natural: true,
                pomodoros_today,
            } => {
                if *pomodoros_today == 1 {
                    "Pomodoro complete! 1 pomodoro today. Time for a break.".to_string()
                } else {
                    format!(
                        "Pomodoro complete! {} pomodoros today. Time for a break.",
                        pomodoros_today
                    )
                }
            }
            Self::SessionCompleted {
                phase: Phase::Break,
                natural: true,
                ..
            } => "Break over! Ready for another pomodoro?".to_string(),
            Self::SessionCompleted { natural: false, .. } => return None,
            Self::PhaseChanged {
                phase: Phase::Work, ..
            } => "Focus time".to_string(),
            Self::PhaseChanged {
                phase: Phase::Break,
                long_break: true,
                total_secs,
            } => format!("Long break: {} minutes. Great job staying focused!", total_secs / 60),
            Self::PhaseChanged {
                phase: Phase::Break,
                ..
            } => "Break time".to_string(),
            Self::TaskAdded { title, .. } => format!("Task added: {}", title),
            Self::TaskSelected { title, .. } => format!("Selected task: {}", title),
            Self::TaskToggled {
                title,
                completed: true,
            } => format!("Marked done: {}", title),
            Self::TaskToggled {
                title,
                completed: false,
            } => format!("Marked open: {}", title),
            Self::TaskDeleted { title } => format!("Task deleted: {}", title),
            Self::TaskFinished { title } => format!("Congratulations! Task finished: {}", title),
            Self::TaskNotFound { reference } => format!("No task matches '{}'", reference),
            Self::ValidationRejected { message } => message.clone(),
            Self::SettingsSaved => "Settings saved".to_string(),
        };
        Some(text)
    }
}
