//! Cooperative timing: per-frame drivers, finite animations and wall-clock countdowns
//!
//! A game owns one [`Scheduler`]. At most one tick driver is live at a time;
//! scheduling a new one retires the old. Countdowns measure real elapsed time
//! and are polled at a bounded rate, independent of how many frames run.

use serde::{Deserialize, Serialize};

use crate::consts::{COUNTDOWN_POLL_MS, FRAME_MS, MAX_SUBSTEPS};

/// Handle returned when a tick driver is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickHandle(u64);

/// Handle returned when a countdown is started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

/// Finite animation advanced by a fixed step per frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameAnimation {
    pub progress: f32,
    pub step: f32,
    pub total: f32,
}

impl FrameAnimation {
    /// Completes after exactly `frames` ticks
    pub fn frames(frames: u32) -> Self {
        Self {
            progress: 0.0,
            step: 1.0,
            total: frames as f32,
        }
    }

    /// Normalized progress growing by `rate` per tick until 1.0
    pub fn normalized(rate: f32) -> Self {
        Self {
            progress: 0.0,
            step: rate,
            total: 1.0,
        }
    }

    /// Advance one tick; true once the animation has completed
    pub fn advance(&mut self) -> bool {
        if !self.is_complete() {
            self.progress += self.step;
        }
        self.is_complete()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.progress >= self.total
    }

    /// Completed fraction in [0, 1]
    #[inline]
    pub fn fraction(&self) -> f32 {
        if self.total <= 0.0 {
            return 1.0;
        }
        (self.progress / self.total).clamp(0.0, 1.0)
    }

    /// Ticks still to run (for frame-count animations)
    #[inline]
    pub fn remaining(&self) -> f32 {
        (self.total - self.progress).max(0.0)
    }
}

/// Wall-clock countdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    pub started_at_ms: f64,
    pub duration_ms: f64,
    last_poll_ms: f64,
    remaining: f32,
}

impl Countdown {
    pub fn new(now_ms: f64, duration_ms: f64) -> Self {
        Self {
            started_at_ms: now_ms,
            duration_ms,
            last_poll_ms: now_ms,
            remaining: 1.0,
        }
    }

    /// Re-evaluate if the poll interval has passed; true once expired
    pub fn poll(&mut self, now_ms: f64) -> bool {
        if now_ms - self.last_poll_ms < COUNTDOWN_POLL_MS {
            return self.remaining <= 0.0;
        }
        self.last_poll_ms = now_ms;
        let elapsed = now_ms - self.started_at_ms;
        self.remaining = if self.duration_ms <= 0.0 {
            0.0
        } else {
            (1.0 - elapsed / self.duration_ms).max(0.0) as f32
        };
        self.remaining <= 0.0
    }

    /// Fraction of time left as of the last poll (1.0 = full)
    #[inline]
    pub fn remaining_fraction(&self) -> f32 {
        self.remaining
    }
}

/// Bookkeeping used to verify the single-driver invariant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub scheduled: u64,
    pub cancelled: u64,
    pub timers_started: u64,
    pub timers_cancelled: u64,
    pub timers_fired: u64,
}

/// Holds the single live tick driver and the optional countdown
#[derive(Debug, Clone)]
pub struct Scheduler<D> {
    driver: Option<(TickHandle, D)>,
    countdown: Option<(TimerHandle, Countdown)>,
    next_handle: u64,
    stats: SchedulerStats,
}

impl<D> Default for Scheduler<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Scheduler<D> {
    pub fn new() -> Self {
        Self {
            driver: None,
            countdown: None,
            next_handle: 1,
            stats: SchedulerStats::default(),
        }
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    /// Make `driver` the live per-frame driver, retiring any previous one
    pub fn schedule_tick(&mut self, driver: D) -> TickHandle {
        if self.driver.take().is_some() {
            self.stats.cancelled += 1;
        }
        let handle = TickHandle(self.allocate());
        self.driver = Some((handle, driver));
        self.stats.scheduled += 1;
        handle
    }

    /// Cancel the driver if `handle` is still the live one
    pub fn cancel(&mut self, handle: TickHandle) -> bool {
        match self.driver {
            Some((live, _)) if live == handle => {
                self.driver = None;
                self.stats.cancelled += 1;
                true
            }
            _ => false,
        }
    }

    /// Start a countdown, replacing any running one
    pub fn start_countdown(&mut self, now_ms: f64, duration_ms: f64) -> TimerHandle {
        if self.countdown.take().is_some() {
            self.stats.timers_cancelled += 1;
        }
        let handle = TimerHandle(self.allocate());
        self.countdown = Some((handle, Countdown::new(now_ms, duration_ms)));
        self.stats.timers_started += 1;
        handle
    }

    pub fn cancel_countdown(&mut self) -> bool {
        if self.countdown.take().is_some() {
            self.stats.timers_cancelled += 1;
            true
        } else {
            false
        }
    }

    /// Cancel the driver and the countdown
    pub fn cancel_all(&mut self) {
        if self.driver.take().is_some() {
            self.stats.cancelled += 1;
        }
        self.cancel_countdown();
    }

    /// Poll the countdown; returns its handle exactly once, on expiry
    pub fn poll_countdown(&mut self, now_ms: f64) -> Option<TimerHandle> {
        let (handle, countdown) = self.countdown.as_mut()?;
        if countdown.poll(now_ms) {
            let handle = *handle;
            self.countdown = None;
            self.stats.timers_fired += 1;
            return Some(handle);
        }
        None
    }

    pub fn active(&self) -> Option<&D> {
        self.driver.as_ref().map(|(_, d)| d)
    }

    pub fn active_mut(&mut self) -> Option<&mut D> {
        self.driver.as_mut().map(|(_, d)| d)
    }

    pub fn active_handle(&self) -> Option<TickHandle> {
        self.driver.as_ref().map(|(h, _)| *h)
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        self.countdown.as_ref().map(|(_, c)| c)
    }

    /// Number of live tick drivers (0 or 1)
    pub fn pending(&self) -> usize {
        usize::from(self.driver.is_some())
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }
}

/// Fixed-timestep accumulator turning display refreshes into whole frames
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    accumulator_ms: f64,
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fixed frames to run for a refresh at `now_ms`
    pub fn advance(&mut self, now_ms: f64) -> u32 {
        let Some(last) = self.last_ms.replace(now_ms) else {
            return 1;
        };
        // Long stalls (background tab) are not caught up
        let dt = (now_ms - last).clamp(0.0, 100.0);
        self.accumulator_ms += dt;

        let mut frames = 0;
        while self.accumulator_ms >= FRAME_MS && frames < MAX_SUBSTEPS {
            self.accumulator_ms -= FRAME_MS;
            frames += 1;
        }
        if frames == MAX_SUBSTEPS {
            self.accumulator_ms = self.accumulator_ms.min(FRAME_MS);
        }
        frames
    }

    /// Forget timing history (after a pause)
    pub fn reset(&mut self) {
        self.accumulator_ms = 0.0;
        self.last_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Driver {
        Flight,
        Result,
    }

    #[test]
    fn test_schedule_retires_previous_driver() {
        let mut scheduler = Scheduler::new();
        let first = scheduler.schedule_tick(Driver::Flight);
        let second = scheduler.schedule_tick(Driver::Result);

        assert_ne!(first, second);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.active(), Some(&Driver::Result));
        // The stale handle no longer cancels anything
        assert!(!scheduler.cancel(first));
        assert!(scheduler.cancel(second));
        assert_eq!(scheduler.pending(), 0);

        let stats = scheduler.stats();
        assert_eq!(stats.scheduled, 2);
        assert_eq!(stats.cancelled, 2);
    }

    #[test]
    fn test_cancel_all_clears_timer_too() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_tick(Driver::Flight);
        scheduler.start_countdown(0.0, 1000.0);
        scheduler.cancel_all();

        assert_eq!(scheduler.pending(), 0);
        assert!(scheduler.countdown().is_none());
        assert_eq!(scheduler.poll_countdown(5000.0), None);
    }

    #[test]
    fn test_frame_animation_counts_frames() {
        let mut anim = FrameAnimation::frames(3);
        assert!(!anim.advance());
        assert!(!anim.advance());
        assert!(anim.advance());
        assert!(anim.advance());
        assert_eq!(anim.fraction(), 1.0);
    }

    #[test]
    fn test_countdown_fires_once() {
        let mut scheduler: Scheduler<Driver> = Scheduler::new();
        let handle = scheduler.start_countdown(1000.0, 200.0);

        assert_eq!(scheduler.poll_countdown(1100.0), None);
        assert_eq!(scheduler.poll_countdown(1250.0), Some(handle));
        assert_eq!(scheduler.poll_countdown(1300.0), None);
        assert_eq!(scheduler.stats().timers_fired, 1);
    }

    #[test]
    fn test_countdown_polls_at_bounded_rate() {
        let mut countdown = Countdown::new(0.0, 1000.0);
        // Frames 16 ms apart do not re-evaluate until 50 ms passed
        assert!(!countdown.poll(16.0));
        assert_eq!(countdown.remaining_fraction(), 1.0);
        assert!(!countdown.poll(50.0));
        assert!((countdown.remaining_fraction() - 0.95).abs() < 1e-6);
        assert!(!countdown.poll(980.0));
        // Expiry is only noticed on a poll boundary
        assert!(!countdown.poll(1010.0));
        assert!(countdown.poll(1030.0));
    }

    #[test]
    fn test_frame_clock_caps_substeps() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(0.0), 1);
        assert_eq!(clock.advance(FRAME_MS * 2.0 + 0.5), 2);
        // A long stall is clamped
        assert_eq!(clock.advance(10_000.0), MAX_SUBSTEPS);
    }
}
