//! Time source used by the scheduler, task registry and statistics.
//!
//! Everything that needs "now" goes through [`Clock`], so tests can move
//! time forward by hand instead of sleeping.

use chrono::{DateTime, Local, NaiveDate};
use std::time::Instant;

pub trait Clock {
    /// Monotonic time for countdown deadlines.
    fn now(&self) -> Instant;

    /// Wall-clock time for timestamps and calendar dates.
    fn local_now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate {
        self.local_now().date_naive()
    }
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn local_now(&self) -> DateTime<Local> {
        Local::now()
    }
}

#[cfg(test)]
pub use manual::ManualClock;

#[cfg(test)]
mod manual {
    use super::Clock;
    use chrono::{DateTime, Local, TimeZone};
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    /// A clock that only moves when told to. Clones share the same time.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        base_instant: Instant,
        base_time: DateTime<Local>,
        offset: Rc<Cell<Duration>>,
    }

    impl ManualClock {
        /// Starts the clock at noon on the given local date.
        pub fn at(year: i32, month: u32, day: u32) -> Self {
            let base_time = Local
                .with_ymd_and_hms(year, month, day, 12, 0, 0)
                .single()
                .expect("valid local date");
            Self {
                base_instant: Instant::now(),
                base_time,
                offset: Rc::new(Cell::new(Duration::ZERO)),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.offset.set(self.offset.get() + by);
        }

        pub fn advance_secs(&self, secs: u64) {
            self.advance(Duration::from_secs(secs));
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base_instant + self.offset.get()
        }

        fn local_now(&self) -> DateTime<Local> {
            let offset = chrono::Duration::from_std(self.offset.get())
                .unwrap_or_else(|_| chrono::Duration::zero());
            self.base_time + offset
        }
    }
}
