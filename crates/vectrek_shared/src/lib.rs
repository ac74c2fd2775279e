//! # VECTREK Shared
//!
//! Common types used by both the authoritative server and the predicting
//! client.
//!
//! ## Contents
//!
//! - [`constants`]: tick rate, sync cadence, ship handling constants
//! - [`math`]: the 2D vector and heading types every component is built from
//! - [`protocol`]: entity ids and the closed set of component messages
//! - [`codec`]: the tagged JSON wire format for those messages

#![deny(unsafe_code)]

pub mod codec;
pub mod constants;
pub mod math;
pub mod protocol;

pub use codec::{decode, encode, CodecError, WireMessage};
pub use constants::{
    ARENA_HEIGHT, ARENA_WIDTH, INBOX_CAPACITY, SYNC_PERIOD, THRUST_ACCEL, TICK_RATE,
    TURN_RATE_DEGREES,
};
pub use math::{Angle, Vec2};
pub use protocol::{ComponentMessage, EntityId, HelmInput, Payload, SyncState};
