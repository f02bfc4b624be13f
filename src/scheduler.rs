//! Deadline scheduler driving the countdown.
//!
//! Holds at most one recurring tick source and at most one pending
//! auto-start. Nothing here sleeps: the event loop asks for
//! [`Scheduler::next_deadline`], waits, then drains [`Scheduler::next_due`].

use crate::clock::Clock;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Period of the countdown tick.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Something the scheduler wants the application to do now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    /// One second of countdown has elapsed.
    Tick,
    /// A delayed auto-start is due.
    Start,
}

#[derive(Debug, Clone, Copy)]
struct Interval {
    period: Duration,
    next: Instant,
}

pub struct Scheduler {
    clock: Rc<dyn Clock>,
    interval: Option<Interval>,
    restart_at: Option<Instant>,
}

impl Scheduler {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            interval: None,
            restart_at: None,
        }
    }

    /// Arms the recurring tick. Returns false if one is already armed.
    pub fn start_interval(&mut self, period: Duration) -> bool {
        if self.interval.is_some() {
            return false;
        }
        self.interval = Some(Interval {
            period,
            next: self.clock.now() + period,
        });
        true
    }

    pub fn cancel_interval(&mut self) {
        self.interval = None;
    }

    #[cfg(test)]
    pub fn is_ticking(&self) -> bool {
        self.interval.is_some()
    }

    /// Number of armed tick sources; never more than one.
    #[cfg(test)]
    pub fn active_sources(&self) -> usize {
        usize::from(self.interval.is_some())
    }

    /// Requests a single [`Wakeup::Start`] after `delay`, replacing any
    /// earlier request.
    pub fn schedule_start(&mut self, delay: Duration) {
        self.restart_at = Some(self.clock.now() + delay);
    }

    pub fn cancel_start(&mut self) {
        self.restart_at = None;
    }

    #[cfg(test)]
    pub fn start_pending(&self) -> bool {
        self.restart_at.is_some()
    }

    /// Earliest instant at which something becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        let tick = self.interval.map(|i| i.next);
        match (tick, self.restart_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Pops the earliest due wakeup, if any.
    ///
    /// Ticks are delivered one period at a time, so after a long wait the
    /// caller keeps draining until this returns `None`. Cancelling the
    /// interval in between drops the rest.
    pub fn next_due(&mut self) -> Option<Wakeup> {
        let now = self.clock.now();
        let tick_due = self.interval.filter(|i| i.next <= now).map(|i| i.next);
        let start_due = self.restart_at.filter(|at| *at <= now);

        match (tick_due, start_due) {
            (Some(tick), Some(start)) if start < tick => {
                self.restart_at = None;
                Some(Wakeup::Start)
            }
            (Some(_), _) => {
                if let Some(interval) = self.interval.as_mut() {
                    interval.next += interval.period;
                }
                Some(Wakeup::Tick)
            }
            (None, Some(_)) => {
                self.restart_at = None;
                Some(Wakeup::Start)
            }
            (None, None) => None,
        }
    }
}
