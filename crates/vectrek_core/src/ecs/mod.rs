//! # Entity Component System
//!
//! Sparse-set storage, one store per component type, driven by a world that
//! runs a fixed sequence of systems once per tick.
//!
//! ## Design Philosophy
//!
//! - Components are plain records; siblings are looked up by `EntityId`
//! - Construction is dependency-ordered and all-or-nothing
//! - One writer: only the world mutates component state

mod component;
mod sparse_set;
mod systems;
mod world;

pub use component::{
    AnyComponent, Component, ComponentKind, Helm, Motion, Player, Position, Sprite, SyncReceiver,
    SyncSender,
};
pub use sparse_set::SparseSet;
pub use systems::{system_for, System, TICK_ORDER};
pub use world::{ShipOutline, World};
