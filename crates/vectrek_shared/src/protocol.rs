//! Network protocol types shared between client and server.
//!
//! These types are sent over the network. Both client and server must agree
//! on these definitions.
//!
//! The payload set is closed: a [`ComponentMessage`] carries either a
//! [`HelmInput`] or a [`SyncState`] and nothing else. Anything that does not
//! decode into one of those never reaches the world.

use crate::math::{Angle, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque entity identifier.
///
/// Unique per live entity and stable for the entity's lifetime. The client
/// and server address the same ship by the same id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Control input snapshot for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelmInput {
    /// Turn counter-clockwise (decreasing heading)
    pub left: bool,
    /// Turn clockwise (increasing heading)
    pub right: bool,
    /// Accelerate along the current heading
    pub thrust: bool,
}

impl HelmInput {
    /// Thrust only.
    pub const THRUST: Self = Self {
        left: false,
        right: false,
        thrust: true,
    };

    /// No controls held.
    pub const IDLE: Self = Self {
        left: false,
        right: false,
        thrust: false,
    };
}

/// Authoritative motion state broadcast by the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    /// Velocity in world units per tick
    pub velocity: Vec2,
    /// Position in world units
    pub position: Vec2,
    /// Heading
    pub angle: Angle,
}

/// Message body. Closed set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Payload {
    /// Pilot input, routed to the target entity's Helm
    HelmInput(HelmInput),
    /// Authoritative state, routed to the target entity's SyncReceiver inbox
    SyncState(SyncState),
}

impl Payload {
    /// Type discriminator used on the wire.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::HelmInput(_) => "HelmInput",
            Self::SyncState(_) => "SyncState",
        }
    }
}

impl From<HelmInput> for Payload {
    fn from(input: HelmInput) -> Self {
        Self::HelmInput(input)
    }
}

impl From<SyncState> for Payload {
    fn from(state: SyncState) -> Self {
        Self::SyncState(state)
    }
}

/// A payload addressed to one entity's components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComponentMessage {
    /// Target entity
    pub entity: EntityId,
    /// Body
    pub payload: Payload,
}

impl ComponentMessage {
    /// Creates a message for `entity`.
    #[must_use]
    pub fn new(entity: EntityId, payload: impl Into<Payload>) -> Self {
        Self {
            entity,
            payload: payload.into(),
        }
    }
}
