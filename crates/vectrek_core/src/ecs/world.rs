//! # ECS World
//!
//! The system manager: one [`SparseSet`] per component type, the tick
//! counter, and the two transport seams.
//!
//! The world is the sole mutator of component state. Inbound messages are
//! only ever *dispatched* here, at the start of [`World::update`], on the
//! simulation thread.

use super::component::{
    AnyComponent, Component, ComponentKind, Helm, Motion, Player, Position, Sprite, SyncReceiver,
    SyncSender,
};
use super::sparse_set::SparseSet;
use super::systems::{system_for, System, TICK_ORDER};
use crate::config::WorldConfig;
use crate::error::{TickErrors, WorldError};
use crate::link::{Disconnected, Receiver, Sender};
use crate::WorldResult;
use std::collections::BTreeSet;
use vectrek_shared::{ComponentMessage, EntityId, HelmInput, Payload, Vec2};

/// The three vertices of one ship, ready to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShipOutline {
    /// Owning entity
    pub entity: EntityId,
    /// Nose, right rear, left rear
    pub vertices: [Vec2; 3],
}

/// The ECS world.
///
/// # Example
///
/// ```rust
/// use vectrek_core::{Helm, Motion, Position, World, WorldConfig};
///
/// let mut world = World::new("server", WorldConfig::default());
/// let ship = world.allocate_entity().unwrap();
/// world
///     .add_entity(
///         ship,
///         [Helm::default().into(), Position::at(320.0, 240.0).into(), Motion::default().into()],
///     )
///     .unwrap();
///
/// world.update().unwrap();
/// assert_eq!(world.tick(), 1);
/// ```
pub struct World {
    name: String,
    pub(crate) config: WorldConfig,
    entities: BTreeSet<EntityId>,
    /// `None` once the id space is used up.
    next_entity: Option<u64>,
    pub(crate) tick: u64,
    undeliverable: u64,

    // =========================================================================
    // Component stores, one per ComponentKind
    // =========================================================================
    pub(crate) positions: SparseSet<Position>,
    pub(crate) motions: SparseSet<Motion>,
    pub(crate) helms: SparseSet<Helm>,
    pub(crate) sprites: SparseSet<Sprite>,
    pub(crate) players: SparseSet<Player>,
    pub(crate) sync_receivers: SparseSet<SyncReceiver>,
    pub(crate) sync_senders: SparseSet<SyncSender>,

    pub(crate) sender: Box<dyn Sender>,
    receiver: Box<dyn Receiver>,
}

impl World {
    /// Creates an empty world wired to [`Disconnected`] on both seams.
    ///
    /// Invalid configuration values are replaced by their defaults.
    #[must_use]
    pub fn new(name: impl Into<String>, config: WorldConfig) -> Self {
        Self {
            name: name.into(),
            config: config.sanitized(),
            entities: BTreeSet::new(),
            next_entity: Some(0),
            tick: 0,
            undeliverable: 0,
            positions: SparseSet::new(),
            motions: SparseSet::new(),
            helms: SparseSet::new(),
            sprites: SparseSet::new(),
            players: SparseSet::new(),
            sync_receivers: SparseSet::new(),
            sync_senders: SparseSet::new(),
            sender: Box::new(Disconnected),
            receiver: Box::new(Disconnected),
        }
    }

    /// Wires the outbound seam.
    pub fn set_sender(&mut self, sender: impl Sender + 'static) {
        self.sender = Box::new(sender);
    }

    /// Wires the inbound seam.
    pub fn set_receiver(&mut self, receiver: impl Receiver + 'static) {
        self.receiver = Box::new(receiver);
    }

    /// Label used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective (sanitized) configuration.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Completed `update` calls.
    #[inline]
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Inbound messages dropped because their target could not take them.
    #[must_use]
    pub const fn undeliverable(&self) -> u64 {
        self.undeliverable
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Returns a fresh id. Ids are never reused within one world.
    ///
    /// # Errors
    ///
    /// [`WorldError::IdsExhausted`] once `u64::MAX` has been handed out or
    /// added explicitly.
    pub fn allocate_entity(&mut self) -> WorldResult<EntityId> {
        let raw = self.next_entity.ok_or(WorldError::IdsExhausted)?;
        self.next_entity = raw.checked_add(1);
        Ok(EntityId::new(raw))
    }

    /// Live entity count.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Checks if an entity is live.
    #[must_use]
    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.entities.contains(&entity)
    }

    /// Live entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().copied()
    }

    /// Constructs an entity from its components, in any input order.
    ///
    /// Components are sorted by [`ComponentKind`] priority and initialized one
    /// at a time; each checks that its prerequisites are already stored. On
    /// any failure every component stored so far is removed again, so no
    /// half-wired entity is ever left behind.
    ///
    /// A [`SyncReceiver`]'s inbox bound is taken from the world config.
    ///
    /// # Errors
    ///
    /// - [`WorldError::DuplicateEntity`] if `entity` is already live
    /// - [`WorldError::DuplicateComponent`] if a type is given twice
    /// - [`WorldError::MissingPrerequisite`] if a required sibling is absent
    pub fn add_entity(
        &mut self,
        entity: EntityId,
        components: impl IntoIterator<Item = AnyComponent>,
    ) -> WorldResult<()> {
        if self.entities.contains(&entity) {
            return Err(WorldError::DuplicateEntity(entity));
        }

        let mut components: Vec<AnyComponent> = components.into_iter().collect();
        components.sort_by_key(AnyComponent::kind);
        if let Some(pair) = components.windows(2).find(|w| w[0].kind() == w[1].kind()) {
            return Err(WorldError::DuplicateComponent {
                entity,
                component: pair[0].kind(),
            });
        }

        self.entities.insert(entity);
        if self.next_entity.is_some_and(|next| entity.raw() >= next) {
            self.next_entity = entity.raw().checked_add(1);
        }

        let count = components.len();
        for component in components {
            if let Err(err) = self.init_component(entity, component) {
                self.despawn(entity);
                tracing::warn!(world = %self.name, %err, "entity construction aborted");
                return Err(err);
            }
        }

        tracing::info!(world = %self.name, %entity, components = count, "entity added");
        Ok(())
    }

    fn init_component(&mut self, entity: EntityId, component: AnyComponent) -> WorldResult<()> {
        let kind = component.kind();
        if let Some(&requires) = kind
            .requires()
            .iter()
            .find(|&&required| !self.has_component(required, entity))
        {
            return Err(WorldError::MissingPrerequisite {
                entity,
                component: kind,
                requires,
            });
        }

        match component {
            AnyComponent::Position(c) => {
                self.positions.insert(entity, c);
            }
            AnyComponent::Motion(c) => {
                self.motions.insert(entity, c);
            }
            AnyComponent::Helm(c) => {
                self.helms.insert(entity, c);
            }
            AnyComponent::Sprite(c) => {
                self.sprites.insert(entity, c);
            }
            AnyComponent::Player(c) => {
                self.players.insert(entity, c);
            }
            AnyComponent::SyncReceiver(mut c) => {
                c.set_capacity(self.config.inbox_capacity);
                self.sync_receivers.insert(entity, c);
            }
            AnyComponent::SyncSender(c) => {
                self.sync_senders.insert(entity, c);
            }
        }
        Ok(())
    }

    /// Removes an entity and all of its components.
    ///
    /// Returns `false` if the entity was not live.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        if !self.entities.remove(&entity) {
            return false;
        }
        self.positions.remove(entity);
        self.motions.remove(entity);
        self.helms.remove(entity);
        self.sprites.remove(entity);
        self.players.remove(entity);
        self.sync_receivers.remove(entity);
        self.sync_senders.remove(entity);
        tracing::debug!(world = %self.name, %entity, "entity despawned");
        true
    }

    /// Detaches one component from a live entity.
    ///
    /// Dependents stay attached; until they are removed as well their systems
    /// report [`ComponentError::MissingSibling`](crate::ComponentError) every
    /// tick.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        let removed = T::storage_mut(self).remove(entity);
        if removed.is_some() {
            tracing::debug!(world = %self.name, %entity, component = %T::KIND, "component removed");
        }
        removed
    }

    // =========================================================================
    // Component access
    // =========================================================================

    /// Checks whether `entity` has a component of type `kind`.
    #[must_use]
    pub fn has_component(&self, kind: ComponentKind, entity: EntityId) -> bool {
        match kind {
            ComponentKind::Position => self.positions.contains(entity),
            ComponentKind::Motion => self.motions.contains(entity),
            ComponentKind::Helm => self.helms.contains(entity),
            ComponentKind::Sprite => self.sprites.contains(entity),
            ComponentKind::Player => self.players.contains(entity),
            ComponentKind::SyncReceiver => self.sync_receivers.contains(entity),
            ComponentKind::SyncSender => self.sync_senders.contains(entity),
        }
    }

    /// Live components of type `kind`.
    #[must_use]
    pub fn component_count(&self, kind: ComponentKind) -> usize {
        match kind {
            ComponentKind::Position => self.positions.len(),
            ComponentKind::Motion => self.motions.len(),
            ComponentKind::Helm => self.helms.len(),
            ComponentKind::Sprite => self.sprites.len(),
            ComponentKind::Player => self.players.len(),
            ComponentKind::SyncReceiver => self.sync_receivers.len(),
            ComponentKind::SyncSender => self.sync_senders.len(),
        }
    }

    /// Gets an entity's component of type `T`.
    #[must_use]
    pub fn component<T: Component>(&self, entity: EntityId) -> Option<&T> {
        T::storage(self).get(entity)
    }

    /// Gets an entity's component of type `T`, mutably.
    pub fn component_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        T::storage_mut(self).get_mut(entity)
    }

    /// The whole store for `T`.
    #[must_use]
    pub fn store<T: Component>(&self) -> &SparseSet<T> {
        T::storage(self)
    }

    /// The update routine for `kind`.
    #[must_use]
    pub fn system(&self, kind: ComponentKind) -> &'static dyn System {
        system_for(kind)
    }

    // =========================================================================
    // Input and output
    // =========================================================================

    /// Sets the local pilot's control snapshot.
    ///
    /// Takes effect on the next tick, when the player system copies it into
    /// the entity's Helm and sends it out.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownEntity`] or [`WorldError::MissingComponent`] if
    /// the entity has no Player.
    pub fn steer(&mut self, entity: EntityId, input: HelmInput) -> WorldResult<()> {
        match self.players.get_mut(entity) {
            Some(player) => {
                player.input = input;
                Ok(())
            }
            None => Err(self.absent(entity, ComponentKind::Player)),
        }
    }

    /// Routes one inbound message to its target component.
    ///
    /// `HelmInput` overwrites the target's Helm input; `SyncState` is pushed
    /// onto the target's SyncReceiver inbox, dropping the oldest pending
    /// state if the inbox is full.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownEntity`] or [`WorldError::MissingComponent`] if the
    /// target cannot take this payload.
    pub fn deliver(&mut self, msg: ComponentMessage) -> WorldResult<()> {
        let entity = msg.entity;
        match msg.payload {
            Payload::HelmInput(input) => match self.helms.get_mut(entity) {
                Some(helm) => {
                    helm.input = input;
                    Ok(())
                }
                None => Err(self.absent(entity, ComponentKind::Helm)),
            },
            Payload::SyncState(state) => match self.sync_receivers.get_mut(entity) {
                Some(receiver) => {
                    if receiver.push(state).is_some() {
                        tracing::debug!(
                            world = %self.name,
                            %entity,
                            dropped = receiver.dropped(),
                            "inbox full, oldest sync state dropped"
                        );
                    }
                    Ok(())
                }
                None => Err(self.absent(entity, ComponentKind::SyncReceiver)),
            },
        }
    }

    fn absent(&self, entity: EntityId, component: ComponentKind) -> WorldError {
        if self.entities.contains(&entity) {
            WorldError::MissingComponent { entity, component }
        } else {
            WorldError::UnknownEntity(entity)
        }
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Advances the simulation one tick.
    ///
    /// 1. Increments the tick counter.
    /// 2. Drains the receiver until it reports nothing pending, dispatching
    ///    each message. Undeliverable messages are logged and dropped.
    /// 3. Runs Helm, Motion, Player, SyncSender, SyncReceiver in that order.
    ///
    /// # Errors
    ///
    /// Every per-component failure of the tick, aggregated. The pass over
    /// other entities is never cut short, and the world stays consistent.
    pub fn update(&mut self) -> Result<(), TickErrors> {
        self.tick += 1;

        let mut inbound = 0_usize;
        while let Some(msg) = self.receiver.receive() {
            inbound += 1;
            if let Err(err) = self.deliver(msg) {
                self.undeliverable += 1;
                tracing::warn!(
                    world = %self.name,
                    tick = self.tick,
                    kind = msg.payload.type_name(),
                    %err,
                    "undeliverable message dropped"
                );
            }
        }

        let mut errors = Vec::new();
        for kind in TICK_ORDER {
            system_for(kind).run(self, &mut errors);
        }

        tracing::trace!(
            world = %self.name,
            tick = self.tick,
            inbound,
            errors = errors.len(),
            "tick"
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TickErrors::new(errors))
        }
    }

    // =========================================================================
    // Rendering projection
    // =========================================================================

    /// Outlines of every entity with a Sprite and a Position.
    #[must_use]
    pub fn ship_outlines(&self) -> Vec<ShipOutline> {
        self.sprites
            .iter()
            .filter_map(|(entity, sprite)| {
                let position = self.positions.get(entity)?;
                Some(ShipOutline {
                    entity,
                    vertices: sprite.outline(position),
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("name", &self.name)
            .field("tick", &self.tick)
            .field("entities", &self.entities.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use vectrek_shared::SyncState;

    /// Shared buffer usable as both seams.
    #[derive(Clone, Default)]
    struct Loopback(Arc<Mutex<VecDeque<ComponentMessage>>>);

    impl Sender for Loopback {
        fn send(&mut self, msg: ComponentMessage) {
            self.0.lock().unwrap().push_back(msg);
        }
    }

    impl Receiver for Loopback {
        fn receive(&mut self) -> Option<ComponentMessage> {
            self.0.lock().unwrap().pop_front()
        }
    }

    fn ship(world: &mut World, extra: Vec<AnyComponent>) -> EntityId {
        let id = world.allocate_entity().unwrap();
        let mut components = vec![
            Position::at(320.0, 240.0).into(),
            Motion::default().into(),
            Helm::default().into(),
        ];
        components.extend(extra);
        world.add_entity(id, components).unwrap();
        id
    }

    #[test]
    fn test_missing_prerequisite_rolls_back() {
        let mut world = World::new("test", WorldConfig::default());
        let id = world.allocate_entity().unwrap();

        let err = world
            .add_entity(id, [Position::default().into(), Helm::default().into()])
            .unwrap_err();

        assert_eq!(
            err,
            WorldError::MissingPrerequisite {
                entity: id,
                component: ComponentKind::Helm,
                requires: ComponentKind::Motion,
            }
        );
        assert!(!world.contains_entity(id));
        assert!(!world.has_component(ComponentKind::Position, id));
        assert_eq!(world.component_count(ComponentKind::Position), 0);
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut world = World::new("test", WorldConfig::default());
        let id = ship(&mut world, vec![]);

        assert_eq!(
            world.add_entity(id, [Position::default().into()]),
            Err(WorldError::DuplicateEntity(id))
        );

        let other = world.allocate_entity().unwrap();
        assert_eq!(
            world.add_entity(other, [Position::default().into(), Position::default().into()]),
            Err(WorldError::DuplicateComponent {
                entity: other,
                component: ComponentKind::Position,
            })
        );
    }

    #[test]
    fn test_allocate_skips_explicit_ids() {
        let mut world = World::new("test", WorldConfig::default());
        world
            .add_entity(EntityId::new(7), [Position::default().into()])
            .unwrap();
        assert_eq!(world.allocate_entity(), Ok(EntityId::new(8)));
    }

    #[test]
    fn test_allocate_after_max_id_is_exhausted() {
        let mut world = World::new("test", WorldConfig::default());
        let last = EntityId::new(u64::MAX);
        world.add_entity(last, [Position::default().into()]).unwrap();

        assert_eq!(world.allocate_entity(), Err(WorldError::IdsExhausted));
        assert_eq!(world.allocate_entity(), Err(WorldError::IdsExhausted));
        assert!(world.contains_entity(last));

        // Explicit lower ids stay usable
        world.add_entity(EntityId::new(3), [Position::default().into()]).unwrap();
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn test_deliver_routes_by_payload() {
        let mut world = World::new("test", WorldConfig::default());
        let id = ship(&mut world, vec![SyncReceiver::default().into()]);

        world
            .deliver(ComponentMessage::new(id, HelmInput::THRUST))
            .unwrap();
        world
            .deliver(ComponentMessage::new(id, SyncState::default()))
            .unwrap();

        assert_eq!(world.component::<Helm>(id).unwrap().input, HelmInput::THRUST);
        assert_eq!(world.component::<SyncReceiver>(id).unwrap().pending(), 1);
    }

    #[test]
    fn test_deliver_to_absent_target() {
        let mut world = World::new("test", WorldConfig::default());
        let id = ship(&mut world, vec![]);
        let ghost = EntityId::new(99);

        assert_eq!(
            world.deliver(ComponentMessage::new(ghost, HelmInput::THRUST)),
            Err(WorldError::UnknownEntity(ghost))
        );
        assert_eq!(
            world.deliver(ComponentMessage::new(id, SyncState::default())),
            Err(WorldError::MissingComponent {
                entity: id,
                component: ComponentKind::SyncReceiver,
            })
        );
    }

    #[test]
    fn test_update_drains_receiver_and_counts_undeliverable() {
        let link = Loopback::default();
        let mut world = World::new("test", WorldConfig::default());
        world.set_receiver(link.clone());
        let id = ship(&mut world, vec![]);

        let mut feed = link.clone();
        feed.send(ComponentMessage::new(id, HelmInput::THRUST));
        feed.send(ComponentMessage::new(EntityId::new(42), HelmInput::THRUST));

        world.update().unwrap();

        assert_eq!(world.tick(), 1);
        assert_eq!(world.undeliverable(), 1);
        assert!(link.0.lock().unwrap().is_empty());
        assert!(world.component::<Motion>(id).unwrap().velocity.x > 0.0);
    }

    #[test]
    fn test_player_copies_input_and_sends() {
        let outbox = Loopback::default();
        let mut world = World::new("client", WorldConfig::default());
        world.set_sender(outbox.clone());
        let id = ship(&mut world, vec![Player::default().into()]);

        world.steer(id, HelmInput::THRUST).unwrap();
        world.update().unwrap();

        assert_eq!(world.component::<Helm>(id).unwrap().input, HelmInput::THRUST);
        let sent = outbox.0.lock().unwrap().pop_front().unwrap();
        assert_eq!(sent, ComponentMessage::new(id, HelmInput::THRUST));
    }

    #[test]
    fn test_steer_requires_player() {
        let mut world = World::new("test", WorldConfig::default());
        let id = ship(&mut world, vec![]);
        assert_eq!(
            world.steer(id, HelmInput::THRUST),
            Err(WorldError::MissingComponent {
                entity: id,
                component: ComponentKind::Player,
            })
        );
    }

    #[test]
    fn test_sync_sender_fires_every_period() {
        let outbox = Loopback::default();
        let mut world = World::new("server", WorldConfig::default());
        world.set_sender(outbox.clone());
        ship(&mut world, vec![SyncSender::default().into()]);

        for _ in 0..9 {
            world.update().unwrap();
        }

        assert_eq!(outbox.0.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_inbox_capacity_from_config() {
        let config = WorldConfig {
            inbox_capacity: 2,
            ..WorldConfig::default()
        };
        let mut world = World::new("client", config);
        let id = ship(&mut world, vec![SyncReceiver::default().into()]);

        for _ in 0..5 {
            world
                .deliver(ComponentMessage::new(id, SyncState::default()))
                .unwrap();
        }

        let receiver = world.component::<SyncReceiver>(id).unwrap();
        assert_eq!(receiver.capacity(), 2);
        assert_eq!(receiver.pending(), 2);
        assert_eq!(receiver.dropped(), 3);
    }

    #[test]
    fn test_ship_outlines_only_for_sprites() {
        let mut world = World::new("client", WorldConfig::default());
        let with_sprite = ship(&mut world, vec![Sprite::default().into()]);
        ship(&mut world, vec![]);

        let outlines = world.ship_outlines();
        assert_eq!(outlines.len(), 1);
        assert_eq!(outlines[0].entity, with_sprite);
    }

    #[test]
    fn test_system_lookup() {
        let mut world = World::new("test", WorldConfig::default());
        ship(&mut world, vec![]);
        assert_eq!(world.system(ComponentKind::Helm).count(&world), 1);
        assert_eq!(world.system(ComponentKind::Sprite).count(&world), 0);
    }
}
