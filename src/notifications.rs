//! Desktop notifications for timer and task events.

use crate::event::Event;
use crate::models::Phase;
use notify_rust::Notification;
use std::thread;

/// Summary and body of the desktop notification for `event`, if it gets one.
pub fn notification_for(event: &Event) -> Option<(&'static str, String)> {
    match event {
        Event::SessionCompleted {
            phase: Phase::Work,
            natural: true,
            ..
        } => Some((
            "Pomodoro Complete! 🍅",
            event.message().unwrap_or_default(),
        )),
        Event::SessionCompleted {
            phase: Phase::Break,
            natural: true,
            ..
        } => Some(("Break Over! ☕", "Ready to start another pomodoro?".to_string())),
        Event::PhaseChanged {
            long_break: true, ..
        } => Some(("Long Break Time! 🎉", event.message().unwrap_or_default())),
        Event::TaskFinished { title } => Some(("Task Finished! ✅", title.clone())),
        _ => None,
    }
}

/// Shows the notification for `event`, if any.
/// Runs in a background thread to avoid blocking.
pub fn notify(event: &Event) {
    let Some((summary, body)) = notification_for(event) else {
        return;
    };

    thread::spawn(move || {
        if let Err(e) = Notification::new()
            .summary(summary)
            .body(&body)
            .appname("tomato")
            .show()
        {
            tracing::warn!(error = %e, "failed to show notification");
        }
    });
}
