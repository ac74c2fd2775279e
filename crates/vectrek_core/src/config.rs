//! # World Configuration
//!
//! Loaded once at startup (the networking crate reads it from TOML) and
//! fixed for the lifetime of a [`World`](crate::World).

use serde::{Deserialize, Serialize};
use vectrek_shared::{
    Vec2, ARENA_HEIGHT, ARENA_WIDTH, INBOX_CAPACITY, SYNC_PERIOD, THRUST_ACCEL, TURN_RATE_DEGREES,
};

/// Wraps `value` into `[0, extent)`.
///
/// Exiting one edge re-enters the opposite one. Idempotent for every finite
/// input: `wrap(wrap(x, w), w) == wrap(x, w)`.
#[inline]
#[must_use]
pub fn wrap(value: f64, extent: f64) -> f64 {
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round a tiny negative input up to exactly `extent`
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}

/// The toroidal playing field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Arena {
    /// Width in world units
    pub width: f64,
    /// Height in world units
    pub height: f64,
}

impl Arena {
    /// Creates an arena.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Wraps both axes of a point into the arena.
    #[inline]
    #[must_use]
    pub fn wrap_point(&self, point: Vec2) -> Vec2 {
        Vec2::new(wrap(point.x, self.width), wrap(point.y, self.height))
    }

    /// Shortest displacement from `from` to `to` on the torus.
    ///
    /// Equals `to - from` whenever the straight path does not cross an edge.
    #[must_use]
    pub fn displacement(&self, from: Vec2, to: Vec2) -> Vec2 {
        Vec2::new(
            shortest(to.x - from.x, self.width),
            shortest(to.y - from.y, self.height),
        )
    }

    fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(ARENA_WIDTH, ARENA_HEIGHT)
    }
}

fn shortest(delta: f64, extent: f64) -> f64 {
    let half = extent / 2.0;
    if delta > half {
        delta - extent
    } else if delta < -half {
        delta + extent
    } else {
        delta
    }
}

/// Simulation parameters for one world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Playing field
    pub arena: Arena,
    /// Ticks between authoritative broadcasts; also the correction divisor
    pub sync_period: u64,
    /// SyncReceiver inbox bound; the oldest state is dropped on overflow
    pub inbox_capacity: usize,
    /// Heading change per tick while turning
    pub turn_rate_degrees: f64,
    /// Velocity gained per tick while thrusting
    pub thrust_accel: f64,
}

impl WorldConfig {
    /// Replaces values the simulation cannot run with by their defaults.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.arena.is_valid() {
            tracing::warn!(arena = ?self.arena, "invalid arena, using default");
            self.arena = defaults.arena;
        }
        if self.sync_period == 0 {
            tracing::warn!("sync_period must be at least 1, using default");
            self.sync_period = defaults.sync_period;
        }
        if self.inbox_capacity == 0 {
            tracing::warn!("inbox_capacity must be at least 1, using default");
            self.inbox_capacity = defaults.inbox_capacity;
        }
        if !self.turn_rate_degrees.is_finite() {
            self.turn_rate_degrees = defaults.turn_rate_degrees;
        }
        if !self.thrust_accel.is_finite() {
            self.thrust_accel = defaults.thrust_accel;
        }
        self
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            arena: Arena::default(),
            sync_period: SYNC_PERIOD,
            inbox_capacity: INBOX_CAPACITY,
            turn_rate_degrees: TURN_RATE_DEGREES,
            thrust_accel: THRUST_ACCEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_range_and_idempotence() {
        let width = 800.0;
        for x in [
            -1e-20,
            -0.0,
            0.0,
            4.0,
            799.0,
            799.999_999,
            800.0,
            804.0,
            -1.0,
            -800.0,
            -1601.5,
            1e9,
            -1e9,
        ] {
            let once = wrap(x, width);
            assert!((0.0..width).contains(&once), "wrap({x}) = {once}");
            assert_eq!(wrap(once, width), once);
        }
    }

    #[test]
    fn test_wrap_exits_reenter_opposite_edge() {
        assert_eq!(wrap(804.0, 800.0), 4.0);
        assert_eq!(wrap(-5.0, 800.0), 795.0);
    }

    #[test]
    fn test_displacement_shortest_path() {
        let arena = Arena::new(640.0, 480.0);
        let d = arena.displacement(Vec2::new(100.0, 100.0), Vec2::new(130.0, 90.0));
        assert_eq!(d, Vec2::new(30.0, -10.0));

        // Across the right edge
        let d = arena.displacement(Vec2::new(638.0, 10.0), Vec2::new(2.0, 470.0));
        assert_eq!(d, Vec2::new(4.0, -20.0));
    }

    #[test]
    fn test_sanitized_repairs_zero_period() {
        let config = WorldConfig {
            sync_period: 0,
            inbox_capacity: 0,
            arena: Arena::new(-1.0, f64::NAN),
            ..WorldConfig::default()
        }
        .sanitized();
        assert_eq!(config, WorldConfig::default());
    }
}
