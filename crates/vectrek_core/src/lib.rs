//! # VECTREK Core Engine
//!
//! Sparse-set Entity Component System with client/server state
//! synchronization for a networked space shooter:
//! - The authoritative side broadcasts ship state every few ticks
//! - The predicting side keeps simulating locally and steers its copy back
//!   towards each authoritative state it receives
//!
//! ## Architecture Rules
//!
//! 1. **The tick never blocks** - all I/O goes through [`Sender`] and [`Receiver`]
//! 2. **Fixed system order** - Helm, Motion, Player, SyncSender, SyncReceiver
//! 3. **No wall clock** - the tick counter is the only clock
//!
//! ## Example
//!
//! ```rust
//! use vectrek_core::{Helm, Motion, Position, SyncSender, World, WorldConfig};
//!
//! let mut world = World::new("server", WorldConfig::default());
//! let ship = world.allocate_entity().unwrap();
//! world
//!     .add_entity(
//!         ship,
//!         vec![
//!             Position::at(320.0, 240.0).into(),
//!             Motion::default().into(),
//!             Helm::default().into(),
//!             SyncSender::default().into(),
//!         ],
//!     )
//!     .unwrap();
//!
//! for _ in 0..3 {
//!     world.update().unwrap();
//! }
//! assert_eq!(world.component::<SyncSender>(ship).unwrap().sent(), 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod link;

pub use config::{wrap, Arena, WorldConfig};
pub use ecs::{
    AnyComponent, Component, ComponentKind, Helm, Motion, Player, Position, ShipOutline,
    SparseSet, Sprite, SyncReceiver, SyncSender, System, World,
};
pub use error::{ComponentError, StoreError, TickErrors, WorldError};
pub use link::{Disconnected, Receiver, Sender};

/// Result type for world construction and addressing.
pub type WorldResult<T> = Result<T, WorldError>;
