#![forbid(unsafe_code)]

//! Window timers.
//!
//! A timer fires every `interval` once it is due and is delivered to its
//! window as a [`RawEvent::Timer`](kwm_core::platform::RawEvent::Timer), so
//! timer events go through the same normalizer and queue as device input.
//! Fire times stay on the grid `start + n * interval`; a late check fires
//! once and skips the missed ticks.

use kwm_core::event::TimerId;
use kwm_core::input::WindowId;
use web_time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Timer {
    id: TimerId,
    pub window: Option<WindowId>,
    pub interval: Duration,
    start: Instant,
    /// Next fire time.
    next: Instant,
    /// Last fire (or start) time.
    last: Instant,
    /// Time between the last two fires.
    pub delta: Duration,
    /// Total time since the first fire window opened.
    pub duration: Duration,
    pub fired: u64,
    /// Sleeping timers keep their schedule but never fire.
    pub sleep: bool,
}

impl Timer {
    #[must_use]
    pub fn id(&self) -> TimerId {
        self.id
    }

    #[must_use]
    pub fn next_fire(&self) -> Instant {
        self.next
    }
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_id: u64,
}

impl TimerQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a timer firing `interval` after `now`, then every `interval`.
    pub fn add(&mut self, window: Option<WindowId>, interval: Duration, now: Instant) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            window,
            interval,
            start: now,
            next: now + interval,
            last: now,
            delta: Duration::ZERO,
            duration: Duration::ZERO,
            fired: 0,
            sleep: false,
        });
        tracing::trace!(target: "kwm.timer", ?id, ?window, ?interval, "timer added");
        id
    }

    pub fn remove(&mut self, id: TimerId) -> Option<Timer> {
        let idx = self.timers.iter().position(|t| t.id == id)?;
        Some(self.timers.remove(idx))
    }

    /// Remove every timer of `window`.
    pub fn remove_window(&mut self, window: WindowId) -> usize {
        let before = self.timers.len();
        self.timers.retain(|t| t.window != Some(window));
        before - self.timers.len()
    }

    #[must_use]
    pub fn get(&self, id: TimerId) -> Option<&Timer> {
        self.timers.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: TimerId) -> Option<&mut Timer> {
        self.timers.iter_mut().find(|t| t.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Advance every due timer and return the fired ids with their windows.
    pub fn due(&mut self, now: Instant) -> Vec<(TimerId, Option<WindowId>)> {
        let mut fired = Vec::new();
        for timer in &mut self.timers {
            if timer.sleep || now < timer.next {
                continue;
            }
            timer.delta = now.saturating_duration_since(timer.last);
            timer.duration += timer.delta;
            timer.last = now;
            timer.fired += 1;
            timer.next = if timer.interval.is_zero() {
                now
            } else {
                let since = now.saturating_duration_since(timer.start).as_nanos();
                let step = timer.interval.as_nanos();
                let ticks = since / step + 1;
                let offset = step.saturating_mul(ticks);
                timer.start + Duration::from_nanos(u64::try_from(offset).unwrap_or(u64::MAX))
            };
            fired.push((timer.id, timer.window));
        }
        fired
    }
}
