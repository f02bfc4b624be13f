//! Statistics over the daily record store.
//!
//! The store maps a calendar date to the number of work sessions finished
//! that day. Entries only ever grow; they are removed only by a full data
//! reset. Weeks start on Sunday.
//!
//! Counts recorded here but not yet written are kept as a delta over the
//! last stored snapshot, so a write never discards sessions another
//! process recorded in the meantime.

use crate::clock::Clock;
use crate::persistence::{Repository, KEY_RECORDS};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Format of the date keys written to the store.
pub const DATE_KEY_FMT: &str = "%Y-%m-%d";

/// Older data files used this form (e.g. "Sun Oct 18 2026").
const LEGACY_DATE_KEY_FMT: &str = "%a %b %d %Y";

/// Label format of the 7-day series.
const DAY_LABEL_FMT: &str = "%b %-d";

pub type DailyRecords = BTreeMap<String, u32>;

/// Formats a date the way the store keys it.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FMT).to_string()
}

/// Parses a store key in either the current or the legacy format.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FMT)
        .or_else(|_| NaiveDate::parse_from_str(key, LEGACY_DATE_KEY_FMT))
        .ok()
}

/// First day (Sunday) of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

pub struct Statistics {
    records: DailyRecords,
    /// Records as last read from or written to the store.
    synced: DailyRecords,
    repo: Rc<Repository>,
    clock: Rc<dyn Clock>,
}

impl Statistics {
    pub fn load(repo: Rc<Repository>, clock: Rc<dyn Clock>) -> Self {
        let records: DailyRecords = repo.get(KEY_RECORDS);
        Self {
            synced: records.clone(),
            records,
            repo,
            clock,
        }
    }

    pub fn records(&self) -> &DailyRecords {
        &self.records
    }

    /// Adds one completed work session to `date`, then persists.
    /// Returns the new count for that date.
    pub fn record_completion(&mut self, date: NaiveDate) -> u32 {
        self.sync();
        let count = self.records.entry(date_key(date)).or_insert(0);
        *count += 1;
        let count = *count;
        if self.repo.set(KEY_RECORDS, &self.records) {
            self.synced = self.records.clone();
        }
        count
    }

    /// Re-reads the stored records and reapplies the counts not yet
    /// written. An unreadable store leaves the records untouched.
    pub fn sync(&mut self) {
        let stored: DailyRecords = match self.repo.try_get(KEY_RECORDS) {
            Ok(stored) => stored.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "could not re-read daily records");
                return;
            }
        };

        let mut merged = stored.clone();
        for (key, count) in &self.records {
            let unsaved = count.saturating_sub(self.synced.get(key).copied().unwrap_or(0));
            if unsaved > 0 {
                *merged.entry(key.clone()).or_insert(0) += unsaved;
            }
        }
        self.records = merged;
        self.synced = stored;
    }

    /// Count for the given date, accepting either key format.
    pub fn count_on(&self, date: NaiveDate) -> u32 {
        self.records
            .iter()
            .filter(|(key, _)| parse_date_key(key) == Some(date))
            .map(|(_, count)| count)
            .sum()
    }

    pub fn today_count(&self) -> u32 {
        self.count_on(self.clock.today())
    }

    pub fn total_count(&self) -> u32 {
        self.records.values().sum()
    }

    /// Sessions dated on or after the most recent Sunday.
    pub fn week_count(&self) -> u32 {
        let start = week_start(self.clock.today());
        self.records
            .iter()
            .filter(|(key, _)| parse_date_key(key).is_some_and(|d| d >= start))
            .map(|(_, count)| count)
            .sum()
    }

    /// Minutes of focus represented by all recorded sessions.
    pub fn total_focus_minutes(&self, work_mins: u32) -> u32 {
        self.total_count().saturating_mul(work_mins)
    }

    /// The seven days ending today, oldest first, with zero for days
    /// without records. Clone the iterator to walk it again.
    pub fn last_7_days(&self) -> LastSevenDays<'_> {
        LastSevenDays {
            stats: self,
            today: self.clock.today(),
            days_back: 7,
        }
    }

    /// Forgets every record (full data reset).
    pub fn clear(&mut self) {
        self.records.clear();
        self.synced.clear();
    }
}

/// Lazy `(label, count)` series produced by [`Statistics::last_7_days`].
#[derive(Clone)]
pub struct LastSevenDays<'a> {
    stats: &'a Statistics,
    today: NaiveDate,
    days_back: i64,
}

impl Iterator for LastSevenDays<'_> {
    type Item = (String, u32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.days_back == 0 {
            return None;
        }
        self.days_back -= 1;
        let date = self.today - Duration::days(self.days_back);
        Some((
            date.format(DAY_LABEL_FMT).to_string(),
            self.stats.count_on(date),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.days_back as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for LastSevenDays<'_> {}
