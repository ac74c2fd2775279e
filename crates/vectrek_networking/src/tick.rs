//! # Tick Loop
//!
//! Fixed-timestep pacing for [`World::update`](vectrek_core::World::update).
//!
//! The loop keeps a single deadline: the instant the next tick is due. Each
//! tick started pushes the deadline one period further. A session that
//! stalls replays at most [`MAX_CATCH_UP`] missed ticks back to back and
//! forgets the rest, so a long pause never turns into a burst of hundreds of
//! world updates. The world never sees the wall clock; only its tick counter.

use std::time::{Duration, Instant};
use vectrek_shared::TICK_RATE;

/// Missed ticks replayed after a stall before the rest are skipped.
pub const MAX_CATCH_UP: u32 = 8;

/// Fastest supported rate. Faster requests are clamped to it.
pub const MAX_TICK_RATE: u32 = 10_000;

/// Below this much remaining time the wait spins instead of sleeping.
const SPIN_WINDOW: Duration = Duration::from_micros(500);

/// Timing of the ticks run so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Shortest tick body, in microseconds. Zero before the first tick.
    pub min_tick_us: u64,
    /// Longest tick body, in microseconds.
    pub max_tick_us: u64,
    /// Mean tick body over every tick run, in microseconds.
    pub avg_tick_us: u64,
    /// Ticks whose body overran the period.
    pub late_ticks: u64,
    /// Ticks run.
    pub total_ticks: u64,
    /// Ticks dropped after a stall instead of being replayed.
    pub skipped_ticks: u64,
}

impl TickStats {
    fn record(&mut self, busy: Duration, busy_total: Duration, period: Duration) {
        let us = as_micros(busy);
        self.min_tick_us = if self.total_ticks == 0 {
            us
        } else {
            self.min_tick_us.min(us)
        };
        self.max_tick_us = self.max_tick_us.max(us);
        self.total_ticks += 1;
        self.avg_tick_us = as_micros(busy_total) / self.total_ticks;
        if busy > period {
            self.late_ticks += 1;
        }
    }
}

fn as_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Decides when the next world tick runs.
#[derive(Debug)]
pub struct TickLoop {
    period: Duration,
    next_due: Instant,
    started: u64,
    busy_total: Duration,
    stats: TickStats,
}

impl TickLoop {
    /// Paces `tick_rate` ticks per second.
    ///
    /// The rate is clamped to `1..=MAX_TICK_RATE`, so the period is never
    /// zero. The first tick is due one period from now.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let rate = tick_rate.clamp(1, MAX_TICK_RATE);
        if rate != tick_rate {
            tracing::warn!(requested = tick_rate, rate, "tick rate out of range, clamped");
        }
        let period = Duration::from_secs(1) / rate;

        Self {
            period,
            next_due: Instant::now() + period,
            started: 0,
            busy_total: Duration::ZERO,
            stats: TickStats::default(),
        }
    }

    /// True while a tick is due. Poll it in a loop, running one tick per
    /// `true`, until it returns false.
    #[must_use]
    pub fn should_tick(&mut self) -> bool {
        let now = Instant::now();
        let Some(behind) = now.checked_duration_since(self.next_due) else {
            return false;
        };

        // One tick is due at `next_due` itself, one more per whole period
        let due = behind.as_nanos() / self.period.as_nanos() + 1;
        let replay = u128::from(MAX_CATCH_UP);
        if due > replay {
            let skipped = u64::try_from(due - replay).unwrap_or(u64::MAX);
            self.stats.skipped_ticks = self.stats.skipped_ticks.saturating_add(skipped);
            self.next_due = now
                .checked_sub(self.period * (MAX_CATCH_UP - 1))
                .unwrap_or(now);
            tracing::debug!(skipped, "tick loop stalled, backlog dropped");
        }
        true
    }

    /// Consumes the due tick. Returns the instant the tick body starts.
    #[must_use]
    pub fn begin_tick(&mut self) -> Instant {
        self.next_due += self.period;
        self.started += 1;
        Instant::now()
    }

    /// Records how long the tick body that began at `start` took.
    pub fn end_tick(&mut self, start: Instant) {
        let busy = start.elapsed();
        self.busy_total += busy;
        self.stats.record(busy, self.busy_total, self.period);
    }

    /// Blocks until the next tick is due.
    ///
    /// Sleeps until shortly before the deadline, then spins on the clock.
    pub fn wait_for_next_tick(&self) {
        let Some(remaining) = self.next_due.checked_duration_since(Instant::now()) else {
            return;
        };
        if remaining > SPIN_WINDOW {
            std::thread::sleep(remaining - SPIN_WINDOW);
        }
        while Instant::now() < self.next_due {
            std::hint::spin_loop();
        }
    }

    /// Ticks begun so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.started
    }

    /// Timing of the ticks run so far.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// The period between ticks.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.period
    }

    /// Forgets every recorded timing.
    pub fn reset_stats(&mut self) {
        self.busy_total = Duration::ZERO;
        self.stats = TickStats::default();
    }
}

impl Default for TickLoop {
    fn default() -> Self {
        Self::new(TICK_RATE)
    }
}
