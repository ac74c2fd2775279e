//! # Simulation Constants
//!
//! Defaults baked into both binaries. Every value here can be overridden
//! through the world configuration; these are what you get without a config
//! file.

// =============================================================================
// TIMING
// =============================================================================

/// Tick rate (updates per second).
pub const TICK_RATE: u32 = 60;

/// The authoritative side broadcasts its state every `SYNC_PERIOD` ticks.
///
/// The predicting side divides its positional error by the same number, so a
/// correction is spread over exactly one broadcast interval.
pub const SYNC_PERIOD: u64 = 3;

// =============================================================================
// ARENA
// =============================================================================

/// Arena width in world units. Both axes wrap.
pub const ARENA_WIDTH: f64 = 640.0;

/// Arena height in world units.
pub const ARENA_HEIGHT: f64 = 480.0;

// =============================================================================
// SHIP HANDLING
// =============================================================================

/// Heading change per tick while turning, in degrees.
pub const TURN_RATE_DEGREES: f64 = 3.0;

/// Velocity added along the heading per tick while thrusting.
pub const THRUST_ACCEL: f64 = 0.2;

// =============================================================================
// SYNC RECEIVER
// =============================================================================

/// Pending authoritative states a receiver holds before dropping the oldest.
pub const INBOX_CAPACITY: usize = 16;
