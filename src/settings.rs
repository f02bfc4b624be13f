//! Settings model: load, save and form coercion.

use crate::models::Settings;
use crate::persistence::{Repository, KEY_SETTINGS};

/// Loads settings, falling back to defaults if absent or malformed.
pub fn load(repo: &Repository) -> Settings {
    repo.get(KEY_SETTINGS)
}

/// Overwrites the stored settings in a single write.
pub fn save(repo: &Repository, settings: &Settings) -> bool {
    repo.set(KEY_SETTINGS, settings)
}

/// Raw settings input as typed by the user. `None` leaves a field as is.
///
/// Numeric fields are coerced the way a loose integer parse would: leading
/// decimal digits are taken and the rest ignored. Values are not range
/// checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    pub work_mins: Option<String>,
    pub break_mins: Option<String>,
    pub long_break_mins: Option<String>,
    pub long_break_interval: Option<String>,
    pub sound_enabled: Option<bool>,
    pub notifications_enabled: Option<bool>,
    pub auto_start_next: Option<bool>,
}

impl SettingsForm {
    /// Applies the form on top of `current`.
    pub fn apply(&self, current: &Settings) -> Settings {
        let mut next = current.clone();
        coerce_into(&mut next.work_mins, self.work_mins.as_deref());
        coerce_into(&mut next.break_mins, self.break_mins.as_deref());
        coerce_into(&mut next.long_break_mins, self.long_break_mins.as_deref());
        coerce_into(
            &mut next.long_break_interval,
            self.long_break_interval.as_deref(),
        );
        if let Some(v) = self.sound_enabled {
            next.sound_enabled = v;
        }
        if let Some(v) = self.notifications_enabled {
            next.notifications_enabled = v;
        }
        if let Some(v) = self.auto_start_next {
            next.auto_start_next = v;
        }
        next
    }

    pub fn is_empty(&self) -> bool {
        self.work_mins.is_none()
            && self.break_mins.is_none()
            && self.long_break_mins.is_none()
            && self.long_break_interval.is_none()
            && self.sound_enabled.is_none()
            && self.notifications_enabled.is_none()
            && self.auto_start_next.is_none()
    }
}

fn coerce_into(field: &mut u32, raw: Option<&str>) {
    let Some(raw) = raw else { return };
    match parse_leading_int(raw) {
        Some(value) => *field = value,
        None => tracing::warn!(input = raw, "ignoring non-numeric setting"),
    }
}

/// Parses the leading decimal digits of `raw` after trimming whitespace.
pub fn parse_leading_int(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}
