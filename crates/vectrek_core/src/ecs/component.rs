//! # Component System
//!
//! Components are per-entity data records. Each type lives in its own
//! [`SparseSet`] inside the [`World`] and declares which sibling types it
//! needs on the same entity.
//!
//! ## Construction order
//!
//! [`ComponentKind`]'s declaration order is the construction priority:
//!
//! ```text
//! Position < Motion < Helm < Sprite < Player < SyncReceiver < SyncSender
//! ```
//!
//! Every prerequisite sorts before its dependents, so initializing in this
//! order guarantees a dependent finds its siblings already stored.
//!
//! ## Back-references
//!
//! Components never hold references to their siblings. Systems resolve a
//! sibling by `EntityId` every time they need it.

use super::sparse_set::SparseSet;
use super::world::World;
use crate::config::{Arena, WorldConfig};
use std::collections::VecDeque;
use std::fmt;
use vectrek_shared::{Angle, HelmInput, SyncState, Vec2, INBOX_CAPACITY};

/// Component type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    /// Pose
    Position,
    /// Velocity integration
    Motion,
    /// Input to heading and thrust
    Helm,
    /// Render projection (never ticked)
    Sprite,
    /// Local pilot seat
    Player,
    /// Authoritative state consumer
    SyncReceiver,
    /// Authoritative state producer
    SyncSender,
}

impl ComponentKind {
    /// All kinds in construction order.
    pub const ALL: [Self; 7] = [
        Self::Position,
        Self::Motion,
        Self::Helm,
        Self::Sprite,
        Self::Player,
        Self::SyncReceiver,
        Self::SyncSender,
    ];

    /// Sibling kinds that must already exist on the entity.
    #[must_use]
    pub const fn requires(self) -> &'static [Self] {
        match self {
            Self::Position => &[],
            Self::Motion => &[Self::Position],
            Self::Helm | Self::Sprite | Self::SyncReceiver | Self::SyncSender => {
                &[Self::Position, Self::Motion]
            }
            Self::Player => &[Self::Helm],
        }
    }

    /// Type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Position => "Position",
            Self::Motion => "Motion",
            Self::Helm => "Helm",
            Self::Sprite => "Sprite",
            Self::Player => "Player",
            Self::SyncReceiver => "SyncReceiver",
            Self::SyncSender => "SyncSender",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A component type stored in the world.
pub trait Component: Sized + 'static {
    /// Type tag.
    const KIND: ComponentKind;

    /// The world's store for this type.
    fn storage(world: &World) -> &SparseSet<Self>;

    /// The world's store for this type, mutably.
    fn storage_mut(world: &mut World) -> &mut SparseSet<Self>;
}

// =============================================================================
// Position
// =============================================================================

/// The entity's pose. Every other component reads it through the world.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    /// Location in world units
    pub vector: Vec2,
    /// Heading
    pub angle: Angle,
}

impl Position {
    /// Creates a pose.
    #[must_use]
    pub const fn new(vector: Vec2, angle: Angle) -> Self {
        Self { vector, angle }
    }

    /// Pose at `(x, y)` heading along +X.
    #[must_use]
    pub const fn at(x: f64, y: f64) -> Self {
        Self::new(Vec2::new(x, y), Angle(0.0))
    }
}

// =============================================================================
// Motion
// =============================================================================

/// Integrates position by velocity every tick, wrapping on the arena.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Motion {
    /// World units per tick
    pub velocity: Vec2,
}

impl Motion {
    /// Creates a motion with the given velocity.
    #[must_use]
    pub const fn new(velocity: Vec2) -> Self {
        Self { velocity }
    }

    /// One tick: `position += velocity`, then wrap both axes.
    #[inline]
    pub fn update(&self, position: &mut Position, arena: &Arena) {
        position.vector = arena.wrap_point(position.vector + self.velocity);
    }
}

// =============================================================================
// Helm
// =============================================================================

/// Converts the last received control input into heading and velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Helm {
    /// Latest input; persists until overwritten
    pub input: HelmInput,
}

impl Helm {
    /// One tick of steering.
    ///
    /// Left and right turn by the configured rate; thrust adds the configured
    /// acceleration along the heading *after* turning.
    pub fn update(&self, position: &mut Position, motion: &mut Motion, config: &WorldConfig) {
        let turn = Angle::from_degrees(config.turn_rate_degrees);
        if self.input.left {
            position.angle -= turn;
        }
        if self.input.right {
            position.angle += turn;
        }
        if self.input.thrust {
            motion.velocity += position.angle.to_vector() * config.thrust_accel;
            tracing::trace!(vx = motion.velocity.x, vy = motion.velocity.y, "thrust");
        }
    }
}

// =============================================================================
// Sprite
// =============================================================================

/// Render projection of the pose: a triangle pointing along the heading.
///
/// Read by the rendering side only; no system updates it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    /// Distance from centre to each vertex
    pub length: f64,
}

impl Sprite {
    /// Angle between the nose and each rear vertex (120 degrees).
    const REAR_OFFSET: f64 = 2.0 * std::f64::consts::FRAC_PI_3;

    /// The three vertices: nose, right rear, left rear.
    #[must_use]
    pub fn outline(&self, position: &Position) -> [Vec2; 3] {
        let heading = position.angle.radians();
        [heading, heading + Self::REAR_OFFSET, heading - Self::REAR_OFFSET]
            .map(|theta| position.vector + Angle(theta).to_vector() * self.length)
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self { length: 15.0 }
    }
}

// =============================================================================
// Player
// =============================================================================

/// Local pilot seat on the predicting side.
///
/// The input collaborator writes `input` through
/// [`World::steer`](crate::World::steer). Each tick the player system copies
/// it into the entity's own Helm and sends it to the authoritative side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Player {
    /// Current control snapshot
    pub input: HelmInput,
}

// =============================================================================
// SyncSender
// =============================================================================

/// Authoritative side: snapshots motion state every `sync_period` ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncSender {
    sent: u64,
}

impl SyncSender {
    /// Number of states produced so far.
    #[must_use]
    pub const fn sent(&self) -> u64 {
        self.sent
    }

    /// Returns the state to broadcast on this tick, if the cadence says so.
    pub fn update(
        &mut self,
        tick: u64,
        sync_period: u64,
        position: &Position,
        motion: &Motion,
    ) -> Option<SyncState> {
        if sync_period == 0 || tick % sync_period != 0 {
            return None;
        }
        self.sent += 1;
        Some(SyncState {
            velocity: motion.velocity,
            position: position.vector,
            angle: position.angle,
        })
    }
}

// =============================================================================
// SyncReceiver
// =============================================================================

/// Predicting side: a bounded inbox of authoritative states.
///
/// When full, pushing drops the *oldest* pending state so the freshest
/// authority always gets through.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncReceiver {
    inbox: VecDeque<SyncState>,
    capacity: usize,
    dropped: u64,
    applied: u64,
}

impl SyncReceiver {
    /// Creates a receiver holding at most `capacity` pending states.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inbox: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
            applied: 0,
        }
    }

    /// Inbox bound.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pending states.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }

    /// States discarded on overflow so far.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// States folded into the local pose so far.
    #[must_use]
    pub const fn applied(&self) -> u64 {
        self.applied
    }

    /// Queues a state. Returns the state dropped to make room, if any.
    pub fn push(&mut self, state: SyncState) -> Option<SyncState> {
        let evicted = if self.inbox.len() >= self.capacity {
            self.dropped += 1;
            self.inbox.pop_front()
        } else {
            None
        };
        self.inbox.push_back(state);
        evicted
    }

    /// Changes the bound, dropping the oldest states if over it.
    pub(crate) fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.inbox.len() > self.capacity {
            self.inbox.pop_front();
            self.dropped += 1;
        }
    }

    /// Drains the inbox oldest-first into the local motion state.
    ///
    /// For each state:
    /// `velocity = remote.velocity + displacement(local, remote) / sync_period`
    /// and the heading is overwritten outright. Returns how many states were
    /// applied; zero just means the ship keeps coasting on its last velocity.
    pub fn update(
        &mut self,
        position: &mut Position,
        motion: &mut Motion,
        arena: &Arena,
        sync_period: u64,
    ) -> usize {
        let divisor = sync_period.max(1) as f64;
        let mut count = 0;
        while let Some(remote) = self.inbox.pop_front() {
            let error = arena.displacement(position.vector, remote.position);
            motion.velocity = remote.velocity + error / divisor;
            position.angle = remote.angle;
            count += 1;
        }
        self.applied += count as u64;
        count
    }
}

impl Default for SyncReceiver {
    fn default() -> Self {
        Self::with_capacity(INBOX_CAPACITY)
    }
}

// =============================================================================
// Type-erased construction input
// =============================================================================

/// One component of any type, as passed to
/// [`World::add_entity`](crate::World::add_entity).
#[derive(Clone, Debug, PartialEq)]
pub enum AnyComponent {
    /// Position
    Position(Position),
    /// Motion
    Motion(Motion),
    /// Helm
    Helm(Helm),
    /// Sprite
    Sprite(Sprite),
    /// Player
    Player(Player),
    /// SyncReceiver
    SyncReceiver(SyncReceiver),
    /// SyncSender
    SyncSender(SyncSender),
}

impl AnyComponent {
    /// Type tag of the wrapped component.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Position(_) => ComponentKind::Position,
            Self::Motion(_) => ComponentKind::Motion,
            Self::Helm(_) => ComponentKind::Helm,
            Self::Sprite(_) => ComponentKind::Sprite,
            Self::Player(_) => ComponentKind::Player,
            Self::SyncReceiver(_) => ComponentKind::SyncReceiver,
            Self::SyncSender(_) => ComponentKind::SyncSender,
        }
    }
}

macro_rules! component_impls {
    ($($ty:ident => $store:ident),* $(,)?) => {
        $(
            impl Component for $ty {
                const KIND: ComponentKind = ComponentKind::$ty;

                fn storage(world: &World) -> &SparseSet<Self> {
                    &world.$store
                }

                fn storage_mut(world: &mut World) -> &mut SparseSet<Self> {
                    &mut world.$store
                }
            }

            impl From<$ty> for AnyComponent {
                fn from(component: $ty) -> Self {
                    Self::$ty(component)
                }
            }
        )*
    };
}

component_impls! {
    Position => positions,
    Motion => motions,
    Helm => helms,
    Sprite => sprites,
    Player => players,
    SyncReceiver => sync_receivers,
    SyncSender => sync_senders,
}
