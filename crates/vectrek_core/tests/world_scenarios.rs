//! # World Scenario Tests
//!
//! End-to-end behaviour of the world through its public API: steering,
//! wrapping, dependency-ordered construction, reconciliation, message loss.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use vectrek_core::{
    AnyComponent, Arena, ComponentError, ComponentKind, Helm, Motion, Position, Receiver, Sender,
    SyncReceiver, SyncSender, World, WorldConfig, WorldError,
};
use vectrek_shared::{Angle, ComponentMessage, EntityId, HelmInput, SyncState, Vec2};

/// In-memory queue shared between a sending world and a receiving world.
#[derive(Clone, Default)]
struct Queue(Arc<Mutex<VecDeque<ComponentMessage>>>);

impl Sender for Queue {
    fn send(&mut self, msg: ComponentMessage) {
        self.0.lock().unwrap().push_back(msg);
    }
}

impl Receiver for Queue {
    fn receive(&mut self) -> Option<ComponentMessage> {
        self.0.lock().unwrap().pop_front()
    }
}

/// Sender that forgets a seeded random subset of what it is given while
/// `lossy` is set.
struct Flaky {
    inner: Queue,
    rng: ChaCha8Rng,
    lossy: Arc<Mutex<bool>>,
}

impl Sender for Flaky {
    fn send(&mut self, msg: ComponentMessage) {
        let lossy = *self.lossy.lock().unwrap();
        if lossy && self.rng.gen_bool(0.6) {
            return;
        }
        self.inner.send(msg);
    }
}

fn ship_at(x: f64, y: f64) -> Vec<AnyComponent> {
    vec![
        Position::at(x, y).into(),
        Motion::default().into(),
        Helm::default().into(),
    ]
}

fn position(world: &World, entity: EntityId) -> Vec2 {
    world.component::<Position>(entity).unwrap().vector
}

#[test]
fn thrust_from_rest_moves_along_heading() {
    let mut world = World::new("server", WorldConfig::default());
    let ship = world.allocate_entity().unwrap();
    world.add_entity(ship, ship_at(320.0, 240.0)).unwrap();
    world
        .deliver(ComponentMessage::new(ship, HelmInput::THRUST))
        .unwrap();

    let mut last_x = position(&world, ship).x;
    for _ in 0..5 {
        world.update().unwrap();

        let velocity = world.component::<Motion>(ship).unwrap().velocity;
        let now = position(&world, ship);
        assert!(velocity.x > 0.0);
        assert_eq!(velocity.y, 0.0);
        assert!(now.x > last_x, "x must increase every tick");
        last_x = now.x;
    }

    // 0.2 + 0.4 + 0.6 + 0.8 + 1.0
    assert!((last_x - 323.0).abs() < 1e-9);
}

#[test]
fn motion_wraps_at_screen_edge() {
    let config = WorldConfig {
        arena: Arena::new(800.0, 600.0),
        ..WorldConfig::default()
    };
    let mut world = World::new("server", config);
    let ship = world.allocate_entity().unwrap();
    world
        .add_entity(
            ship,
            vec![
                Position::at(799.0, 300.0).into(),
                Motion::new(Vec2::new(5.0, 0.0)).into(),
            ],
        )
        .unwrap();

    world.update().unwrap();

    assert_eq!(position(&world, ship), Vec2::new(4.0, 300.0));
}

#[test]
fn helm_without_motion_is_rejected() {
    let mut world = World::new("server", WorldConfig::default());
    let ship = world.allocate_entity().unwrap();

    let err = world
        .add_entity(ship, vec![Helm::default().into(), Position::default().into()])
        .unwrap_err();

    assert!(matches!(
        err,
        WorldError::MissingPrerequisite {
            component: ComponentKind::Helm,
            requires: ComponentKind::Motion,
            ..
        }
    ));
    assert!(err.to_string().contains("missing prerequisite"));
    assert_eq!(world.entity_count(), 0);
}

#[test]
fn construction_order_does_not_matter() {
    let base = ship_at(100.0, 50.0);
    let orders: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    let mut results = Vec::new();
    for order in orders {
        let mut world = World::new("server", WorldConfig::default());
        let ship = world.allocate_entity().unwrap();
        world
            .add_entity(ship, order.iter().map(|&i| base[i].clone()))
            .unwrap();
        world
            .deliver(ComponentMessage::new(
                ship,
                HelmInput {
                    left: true,
                    right: false,
                    thrust: true,
                },
            ))
            .unwrap();
        for _ in 0..4 {
            world.update().unwrap();
        }
        results.push(*world.component::<Position>(ship).unwrap());
    }

    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn reconciliation_converges_on_fixed_remote() {
    let mut world = World::new("client", WorldConfig::default());
    let ship = world.allocate_entity().unwrap();
    let mut components = ship_at(100.0, 100.0);
    components.push(SyncReceiver::default().into());
    world.add_entity(ship, components).unwrap();

    let remote = SyncState {
        velocity: Vec2::ZERO,
        position: Vec2::new(130.0, 70.0),
        angle: Angle(0.5),
    };

    let mut errors = Vec::new();
    for tick in 0..15_u64 {
        if tick % 3 == 0 {
            world.deliver(ComponentMessage::new(ship, remote)).unwrap();
        }
        world.update().unwrap();
        errors.push(position(&world, ship).distance(remote.position));
    }

    let epsilon = 1e-9;
    for pair in errors.windows(2) {
        if pair[0] > epsilon {
            assert!(pair[1] < pair[0], "error must shrink: {errors:?}");
        }
    }
    assert!(errors[errors.len() - 1] < epsilon);
    assert_eq!(world.component::<Position>(ship).unwrap().angle, Angle(0.5));
}

#[test]
fn prediction_survives_message_loss() {
    let wire = Queue::default();
    let lossy = Arc::new(Mutex::new(true));

    let mut server = World::new("server", WorldConfig::default());
    server.set_sender(Flaky {
        inner: wire.clone(),
        rng: ChaCha8Rng::seed_from_u64(7),
        lossy: Arc::clone(&lossy),
    });
    let mut client = World::new("client", WorldConfig::default());
    client.set_receiver(wire);

    let ship = server.allocate_entity().unwrap();
    let mut authoritative = ship_at(320.0, 240.0);
    authoritative[1] = Motion::new(Vec2::new(1.5, -0.75)).into();
    authoritative.push(SyncSender::default().into());
    server.add_entity(ship, authoritative).unwrap();

    let mut predicted = ship_at(500.0, 400.0);
    predicted.push(SyncReceiver::default().into());
    client.add_entity(ship, predicted).unwrap();

    // Half the run with most syncs lost, then a clean link
    for tick in 0..120 {
        if tick == 60 {
            *lossy.lock().unwrap() = false;
        }
        server.update().unwrap();
        client.update().unwrap();
    }

    let arena = client.config().arena;
    let gap = arena.displacement(position(&client, ship), position(&server, ship));
    assert!(gap.length() < 1e-6, "client still {gap:?} away");
    assert_eq!(client.undeliverable(), 0);
}

#[test]
fn message_for_unknown_entity_is_dropped() {
    let inbox = Queue::default();
    let mut world = World::new("client", WorldConfig::default());
    world.set_receiver(inbox.clone());
    let ship = world.allocate_entity().unwrap();
    world.add_entity(ship, ship_at(10.0, 10.0)).unwrap();

    let mut feed = inbox;
    feed.send(ComponentMessage::new(EntityId::new(404), HelmInput::THRUST));
    feed.send(ComponentMessage::new(ship, SyncState::default()));

    assert!(world.update().is_ok());
    assert_eq!(world.undeliverable(), 2);
    assert_eq!(world.tick(), 1);
}

#[test]
fn component_errors_are_aggregated_not_fatal() {
    let mut world = World::new("server", WorldConfig::default());
    let broken = world.allocate_entity().unwrap();
    let healthy = world.allocate_entity().unwrap();
    world.add_entity(broken, ship_at(0.0, 0.0)).unwrap();
    world.add_entity(healthy, ship_at(0.0, 0.0)).unwrap();
    world
        .deliver(ComponentMessage::new(healthy, HelmInput::THRUST))
        .unwrap();

    assert!(world.remove_component::<Motion>(broken).is_some());
    let errors = world.update().unwrap_err();

    assert_eq!(
        errors.errors(),
        &[ComponentError::MissingSibling {
            entity: broken,
            component: ComponentKind::Helm,
            sibling: ComponentKind::Motion,
        }]
    );
    // The healthy ship still ticked
    assert!(position(&world, healthy).x > 0.0);
    assert_eq!(world.tick(), 1);
}

#[test]
fn inbox_overflow_keeps_freshest_state() {
    let config = WorldConfig {
        inbox_capacity: 3,
        ..WorldConfig::default()
    };
    let mut world = World::new("client", config);
    let ship = world.allocate_entity().unwrap();
    let mut components = ship_at(0.0, 0.0);
    components.push(SyncReceiver::default().into());
    world.add_entity(ship, components).unwrap();

    for i in 0..10 {
        world
            .deliver(ComponentMessage::new(
                ship,
                SyncState {
                    angle: Angle(f64::from(i)),
                    ..SyncState::default()
                },
            ))
            .unwrap();
    }
    world.update().unwrap();

    // Last applied state wins the heading
    assert_eq!(world.component::<Position>(ship).unwrap().angle, Angle(9.0));
    let receiver = world.component::<SyncReceiver>(ship).unwrap();
    assert_eq!(receiver.dropped(), 7);
    assert_eq!(receiver.applied(), 3);
}
