//! Countdown mechanics for the session state machine.
//!
//! [`SessionTimer`] owns the live [`SessionState`] and the scheduler that
//! feeds it ticks. It knows nothing about tasks or statistics; the app
//! decides what a finished phase means.

use crate::models::{Phase, SessionState, Settings};
use crate::scheduler::{Scheduler, Wakeup, TICK_PERIOD};
use std::time::{Duration, Instant};

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer not running; nothing changed.
    Idle,
    /// One second elapsed, time remains.
    Counting,
    /// The countdown reached zero.
    Finished,
}

pub struct SessionTimer {
    state: SessionState,
    scheduler: Scheduler,
}

impl SessionTimer {
    /// Creates a stopped timer at the start of a work session.
    pub fn new(settings: &Settings, scheduler: Scheduler) -> Self {
        Self {
            state: SessionState::new(Phase::Work, settings.phase_secs(Phase::Work, false)),
            scheduler,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[cfg(test)]
    pub fn is_ticking(&self) -> bool {
        self.scheduler.is_ticking()
    }

    #[cfg(test)]
    pub fn active_sources(&self) -> usize {
        self.scheduler.active_sources()
    }

    /// Starts counting. Returns false if already running.
    pub fn start(&mut self) -> bool {
        if self.state.running {
            return false;
        }
        self.scheduler.cancel_start();
        self.state.running = true;
        self.scheduler.start_interval(TICK_PERIOD);
        tracing::debug!(phase = ?self.state.phase, remaining = self.state.remaining_secs, "timer started");
        true
    }

    /// Stops counting, keeping the remaining time. Also drops a pending
    /// auto-start. Returns false if the timer was not running.
    pub fn pause(&mut self) -> bool {
        self.scheduler.cancel_start();
        if !self.state.running {
            return false;
        }
        self.halt();
        tracing::debug!(remaining = self.state.remaining_secs, "timer paused");
        true
    }

    /// Stops and reverts to a full work session with current settings.
    pub fn reset(&mut self, settings: &Settings) {
        self.halt();
        self.scheduler.cancel_start();
        self.state = SessionState::new(Phase::Work, settings.phase_secs(Phase::Work, false));
    }

    /// Advances the countdown by one second while running.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.running {
            return TickOutcome::Idle;
        }
        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
        if self.state.remaining_secs == 0 {
            TickOutcome::Finished
        } else {
            TickOutcome::Counting
        }
    }

    /// Cancels the tick source and marks the timer stopped.
    pub fn halt(&mut self) {
        self.scheduler.cancel_interval();
        self.state.running = false;
    }

    /// Flips to the other phase at its full configured length, stopped.
    pub fn switch_mode(&mut self, settings: &Settings, long_break: bool) {
        self.halt();
        self.scheduler.cancel_start();
        let phase = self.state.phase.toggled();
        let long_break = long_break && phase == Phase::Break;
        let mut state = SessionState::new(phase, settings.phase_secs(phase, long_break));
        state.long_break = long_break;
        tracing::debug!(?phase, long_break, total = state.total_secs, "phase switched");
        self.state = state;
    }

    /// Requests a `start()` after `delay`.
    pub fn schedule_start(&mut self, delay: Duration) {
        self.scheduler.schedule_start(delay);
    }

    #[cfg(test)]
    pub fn start_pending(&self) -> bool {
        self.scheduler.start_pending()
    }

    pub fn next_due(&mut self) -> Option<Wakeup> {
        self.scheduler.next_due()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::rc::Rc;

    fn short_settings() -> Settings {
        Settings {
            work_mins: 1,
            break_mins: 1,
            long_break_mins: 2,
            ..Settings::default()
        }
    }

    fn timer(settings: &Settings) -> (ManualClock, SessionTimer) {
        let clock = ManualClock::at(2026, 10, 18);
        let timer = SessionTimer::new(settings, Scheduler::new(Rc::new(clock.clone())));
        (clock, timer)
    }

    #[test]
    fn test_new_timer_is_stopped_work() {
        let (_, timer) = timer(&Settings::default());
        let state = timer.state();
        assert_eq!(state.phase, Phase::Work);
        assert_eq!(state.remaining_secs, 1500);
        assert_eq!(state.total_secs, 1500);
        assert!(!state.running);
        assert!(!timer.is_ticking());
    }

    #[test]
    fn test_start_is_idempotent() {
        let (_, mut timer) = timer(&Settings::default());
        assert!(timer.start());
        assert!(!timer.start());
        assert_eq!(timer.active_sources(), 1);
    }

    #[test]
    fn test_pause_when_stopped_is_noop() {
        let (_, mut timer) = timer(&Settings::default());
        assert!(!timer.pause());
        assert_eq!(timer.state().remaining_secs, 1500);
    }

    #[test]
    fn test_tick_only_counts_while_running() {
        let (_, mut timer) = timer(&Settings::default());
        assert_eq!(timer.tick(), TickOutcome::Idle);
        assert_eq!(timer.state().remaining_secs, 1500);

        timer.start();
        assert_eq!(timer.tick(), TickOutcome::Counting);
        assert_eq!(timer.state().remaining_secs, 1499);

        timer.pause();
        assert!(!timer.is_ticking());
        assert_eq!(timer.tick(), TickOutcome::Idle);
        assert_eq!(timer.state().remaining_secs, 1499);
    }

    #[test]
    fn test_finishes_exactly_at_zero() {
        let settings = short_settings();
        let (_, mut timer) = timer(&settings);
        timer.start();

        for expected in (1..60).rev() {
            assert_eq!(timer.tick(), TickOutcome::Counting);
            assert_eq!(timer.state().remaining_secs, expected);
        }
        assert_eq!(timer.tick(), TickOutcome::Finished);
        assert_eq!(timer.state().remaining_secs, 0);
    }

    #[test]
    fn test_zero_length_phase_finishes_on_first_tick() {
        let settings = Settings {
            work_mins: 0,
            ..Settings::default()
        };
        let (_, mut timer) = timer(&settings);
        timer.start();
        assert_eq!(timer.tick(), TickOutcome::Finished);
        assert_eq!(timer.state().remaining_secs, 0);
    }

    #[test]
    fn test_switch_mode_resets_duration_and_stops() {
        let settings = short_settings();
        let (_, mut timer) = timer(&settings);
        timer.start();
        timer.tick();

        timer.switch_mode(&settings, false);
        let state = timer.state();
        assert_eq!(state.phase, Phase::Break);
        assert_eq!(state.remaining_secs, 60);
        assert_eq!(state.total_secs, 60);
        assert!(!state.running);
        assert!(!timer.is_ticking());

        timer.switch_mode(&settings, true);
        assert_eq!(timer.state().phase, Phase::Work);
        assert!(!timer.state().long_break);
    }

    #[test]
    fn test_switch_to_long_break() {
        let settings = short_settings();
        let (_, mut timer) = timer(&settings);
        timer.switch_mode(&settings, true);
        assert!(timer.state().long_break);
        assert_eq!(timer.state().total_secs, 120);
    }

    #[test]
    fn test_reset_returns_to_full_work() {
        let settings = short_settings();
        let (_, mut timer) = timer(&settings);
        timer.switch_mode(&settings, false);
        timer.start();
        timer.tick();

        timer.reset(&settings);
        let state = timer.state();
        assert_eq!(state.phase, Phase::Work);
        assert_eq!(state.remaining_secs, 60);
        assert_eq!(state.total_secs, 60);
        assert!(!state.running);
        assert!(!timer.is_ticking());
    }

    #[test]
    fn test_pause_cancels_pending_start() {
        let (_, mut timer) = timer(&Settings::default());
        timer.schedule_start(Duration::from_secs(1));
        assert!(timer.start_pending());
        timer.pause();
        assert!(!timer.start_pending());
    }

    #[test]
    fn test_scheduler_drives_ticks() {
        let (clock, mut timer) = timer(&Settings::default());
        timer.start();
        clock.advance_secs(3);
        while let Some(wakeup) = timer.next_due() {
            assert_eq!(wakeup, Wakeup::Tick);
            timer.tick();
        }
        assert_eq!(timer.state().remaining_secs, 1497);
    }
}
