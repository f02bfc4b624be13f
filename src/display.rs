//! Text rendering of timer state, tasks and statistics.

use crate::models::{Phase, SessionState, Settings, Task};
use crate::stats::Statistics;

/// Formats time in MM:SS format.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Formats the one-line status of the countdown.
pub fn format_status(state: &SessionState) -> String {
    let time = format_time(state.remaining_secs);
    match (state.phase, state.running) {
        (Phase::Work, true) => format!("🍅 {} remaining", time),
        (Phase::Break, true) => {
            let kind = if state.long_break {
                "Long break"
            } else {
                "Short break"
            };
            format!("☕ {} - {}", kind, time)
        }
        _ if state.is_paused() => format!("⏸ {} (paused)", time),
        (Phase::Work, false) => format!("Ready to focus - {}", time),
        (Phase::Break, false) => format!("Ready for a break - {}", time),
    }
}

/// Formats the progress bar.
pub fn format_progress(state: &SessionState) -> String {
    let pct = state.progress_percent();
    let filled = ((pct * 20.0).round() as usize).min(20);
    let empty = 20 - filled;
    format!(
        "{}{}  {}%",
        "█".repeat(filled),
        "░".repeat(empty),
        (pct * 100.0).round() as u32
    )
}

/// One line of the task list. Positions are 1-based.
pub fn format_task(position: usize, task: &Task, selected: bool) -> String {
    let marker = if selected { '>' } else { ' ' };
    let check = if task.is_completed { 'x' } else { ' ' };
    format!(
        "{} {:>2}. [{}] {}  ({} pomodoros)",
        marker,
        position,
        check,
        task.title,
        task.progress_label()
    )
}

/// The full task list, or a hint when there are none.
pub fn format_task_list(tasks: &[Task], selected_id: Option<&str>) -> String {
    if tasks.is_empty() {
        return "No tasks yet.".to_string();
    }
    tasks
        .iter()
        .enumerate()
        .map(|(i, task)| format_task(i + 1, task, selected_id == Some(task.id.as_str())))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats the short daily summary.
pub fn format_today(count: u32, work_mins: u32) -> String {
    if count == 0 {
        return "Today: —  0 (0 min)".to_string();
    }
    let tomatoes = "🍅".repeat(count.min(10) as usize);
    let extra = if count > 10 {
        format!("+{}", count - 10)
    } else {
        String::new()
    };
    format!(
        "Today: {}{}  {} ({} min)",
        tomatoes,
        extra,
        count,
        count.saturating_mul(work_mins)
    )
}

/// Today, week and total counts followed by a 7-day bar chart.
pub fn format_stats(stats: &Statistics, work_mins: u32) -> String {
    let focus_mins = stats.total_focus_minutes(work_mins);
    let mut lines = vec![
        format_today(stats.today_count(), work_mins),
        format!("This week: {}", stats.week_count()),
        format!(
            "Total: {} ({}h {}m focus)",
            stats.total_count(),
            focus_mins / 60,
            focus_mins % 60
        ),
        String::new(),
    ];
    lines.extend(format_chart(stats.last_7_days()));
    lines.join("\n")
}

pub fn format_settings(settings: &Settings) -> String {
    let toggle = |on: bool| if on { "on" } else { "off" };
    [
        format!("Focus: {} min", settings.work_mins),
        format!("Short break: {} min", settings.break_mins),
        format!(
            "Long break: {} min every {} sessions",
            settings.long_break_mins, settings.long_break_interval
        ),
        format!("Sound: {}", toggle(settings.sound_enabled)),
        format!("Notifications: {}", toggle(settings.notifications_enabled)),
        format!("Auto-start: {}", toggle(settings.auto_start_next)),
    ]
    .join("\n")
}

/// Horizontal bars, one line per `(label, count)` pair.
pub fn format_chart(series: impl Iterator<Item = (String, u32)> + Clone) -> Vec<String> {
    let max = series.clone().map(|(_, count)| count).max().unwrap_or(0);
    series
        .map(|(label, count)| {
            let width = if max == 0 {
                0
            } else {
                ((count as f32 / max as f32) * 20.0).round() as usize
            };
            format!("{:>7} {:<20} {}", label, "█".repeat(width), count)
        })
        .collect()
}
