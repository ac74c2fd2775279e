//! # Per-Tick Systems
//!
//! One system per component type. [`World::update`] runs the ticking ones in
//! [`TICK_ORDER`]; the order is load-bearing:
//!
//! ```text
//! Helm -> Motion -> Player -> SyncSender -> SyncReceiver
//! ```
//!
//! Helm turns the latest input into velocity before Motion integrates it, and
//! SyncSender snapshots state before SyncReceiver overwrites it with what just
//! arrived from the network.
//!
//! Every system destructures the world so it can borrow its own store mutably
//! alongside the sibling stores it reads. A component whose sibling is gone
//! reports a [`ComponentError`] and the pass moves on to the next entity.

use super::component::{ComponentKind, Motion, Position};
use super::sparse_set::SparseSet;
use super::world::World;
use crate::error::ComponentError;
use vectrek_shared::{ComponentMessage, EntityId};

/// Systems that run every tick, in execution order.
pub const TICK_ORDER: [ComponentKind; 5] = [
    ComponentKind::Helm,
    ComponentKind::Motion,
    ComponentKind::Player,
    ComponentKind::SyncSender,
    ComponentKind::SyncReceiver,
];

/// The update routine for one component type.
pub trait System: Sync {
    /// Component type this system drives.
    fn kind(&self) -> ComponentKind;

    /// Runs one tick over every live component of the type, appending any
    /// per-component failure to `errors`.
    fn run(&self, world: &mut World, errors: &mut Vec<ComponentError>);

    /// Number of live components of the type.
    fn count(&self, world: &World) -> usize {
        world.component_count(self.kind())
    }
}

/// Returns the system for `kind`.
#[must_use]
pub fn system_for(kind: ComponentKind) -> &'static dyn System {
    match kind {
        ComponentKind::Position => &PositionSystem,
        ComponentKind::Motion => &MotionSystem,
        ComponentKind::Helm => &HelmSystem,
        ComponentKind::Sprite => &SpriteSystem,
        ComponentKind::Player => &PlayerSystem,
        ComponentKind::SyncReceiver => &SyncReceiverSystem,
        ComponentKind::SyncSender => &SyncSenderSystem,
    }
}

fn missing(entity: EntityId, component: ComponentKind, sibling: ComponentKind) -> ComponentError {
    ComponentError::MissingSibling {
        entity,
        component,
        sibling,
    }
}

/// Resolves the pose and motion an entity's component reads every tick.
fn pose<'a>(
    positions: &'a mut SparseSet<Position>,
    motions: &'a mut SparseSet<Motion>,
    entity: EntityId,
    component: ComponentKind,
) -> Result<(&'a mut Position, &'a mut Motion), ComponentError> {
    let position = positions
        .get_mut(entity)
        .ok_or_else(|| missing(entity, component, ComponentKind::Position))?;
    let motion = motions
        .get_mut(entity)
        .ok_or_else(|| missing(entity, component, ComponentKind::Motion))?;
    Ok((position, motion))
}

/// Pose is passive data.
struct PositionSystem;

impl System for PositionSystem {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Position
    }

    fn run(&self, _world: &mut World, _errors: &mut Vec<ComponentError>) {}
}

/// Sprites are a read-only projection and never tick.
struct SpriteSystem;

impl System for SpriteSystem {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Sprite
    }

    fn run(&self, _world: &mut World, _errors: &mut Vec<ComponentError>) {}
}

struct HelmSystem;

impl System for HelmSystem {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Helm
    }

    fn run(&self, world: &mut World, errors: &mut Vec<ComponentError>) {
        let World {
            config,
            positions,
            motions,
            helms,
            ..
        } = world;
        errors.extend(helms.iterate::<ComponentError, _>(|entity, helm| {
            let (position, motion) = pose(positions, motions, entity, ComponentKind::Helm)?;
            helm.update(position, motion, config);
            Ok(())
        }));
    }
}

struct MotionSystem;

impl System for MotionSystem {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Motion
    }

    fn run(&self, world: &mut World, errors: &mut Vec<ComponentError>) {
        let World {
            config,
            positions,
            motions,
            ..
        } = world;
        errors.extend(motions.iterate::<ComponentError, _>(|entity, motion| {
            let position = positions
                .get_mut(entity)
                .ok_or_else(|| missing(entity, ComponentKind::Motion, ComponentKind::Position))?;
            motion.update(position, &config.arena);
            Ok(())
        }));
    }
}

struct PlayerSystem;

impl System for PlayerSystem {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Player
    }

    fn run(&self, world: &mut World, errors: &mut Vec<ComponentError>) {
        let World {
            helms,
            players,
            sender,
            ..
        } = world;
        errors.extend(players.iterate::<ComponentError, _>(|entity, player| {
            let helm = helms
                .get_mut(entity)
                .ok_or_else(|| missing(entity, ComponentKind::Player, ComponentKind::Helm))?;
            helm.input = player.input;
            sender.send(ComponentMessage::new(entity, player.input));
            Ok(())
        }));
    }
}

struct SyncSenderSystem;

impl System for SyncSenderSystem {
    fn kind(&self) -> ComponentKind {
        ComponentKind::SyncSender
    }

    fn run(&self, world: &mut World, errors: &mut Vec<ComponentError>) {
        let World {
            config,
            tick,
            positions,
            motions,
            sync_senders,
            sender,
            ..
        } = world;
        let tick = *tick;
        errors.extend(sync_senders.iterate::<ComponentError, _>(|entity, sync| {
            let (position, motion) = pose(positions, motions, entity, ComponentKind::SyncSender)?;
            if let Some(state) = sync.update(tick, config.sync_period, position, motion) {
                tracing::trace!(%entity, tick, "sync state out");
                sender.send(ComponentMessage::new(entity, state));
            }
            Ok(())
        }));
    }
}

struct SyncReceiverSystem;

impl System for SyncReceiverSystem {
    fn kind(&self) -> ComponentKind {
        ComponentKind::SyncReceiver
    }

    fn run(&self, world: &mut World, errors: &mut Vec<ComponentError>) {
        let World {
            config,
            positions,
            motions,
            sync_receivers,
            ..
        } = world;
        errors.extend(sync_receivers.iterate::<ComponentError, _>(|entity, sync| {
            let (position, motion) =
                pose(positions, motions, entity, ComponentKind::SyncReceiver)?;
            let applied = sync.update(position, motion, &config.arena, config.sync_period);
            if applied > 0 {
                tracing::trace!(%entity, applied, "reconciled");
            }
            Ok(())
        }));
    }
}
