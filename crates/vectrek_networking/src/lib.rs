//! # VECTREK Networking
//!
//! Everything between two [`World`](vectrek_core::World)s: transports that
//! implement the core [`Sender`](vectrek_core::Sender) /
//! [`Receiver`](vectrek_core::Receiver) seams, the fixed-timestep loop that
//! drives a world, and the configuration both binaries load.
//!
//! ## Architecture
//!
//! ```text
//!  SERVER                                   CLIENT
//!  World (SyncSender) --UdpSender--> reader thread --> pipe --> World (SyncReceiver)
//!  World (Helm)  <-- pipe <-- reader thread <--UdpSender-- World (Player)
//! ```
//!
//! - **Transport**: bounded pipes in-process, JSON datagrams over UDP
//! - **Simulation**: seeded loss, duplication and reordering for testing
//! - **Pacing**: [`TickLoop`] at the configured rate, [`Session`] on its own thread
//!
//! ## Example
//!
//! ```rust
//! use vectrek_core::{Helm, Motion, Position, SyncReceiver, SyncSender, World, WorldConfig};
//! use vectrek_networking::pipe;
//!
//! let (to_client, from_server) = pipe(64);
//!
//! let mut server = World::new("server", WorldConfig::default());
//! server.set_sender(to_client);
//! let mut client = World::new("client", WorldConfig::default());
//! client.set_receiver(from_server);
//!
//! let ship = server.allocate_entity().unwrap();
//! server
//!     .add_entity(ship, vec![
//!         Position::at(320.0, 240.0).into(),
//!         Motion::default().into(),
//!         Helm::default().into(),
//!         SyncSender::default().into(),
//!     ])
//!     .unwrap();
//! client
//!     .add_entity(ship, vec![
//!         Position::at(0.0, 0.0).into(),
//!         Motion::default().into(),
//!         SyncReceiver::default().into(),
//!     ])
//!     .unwrap();
//!
//! for _ in 0..6 {
//!     server.update().unwrap();
//!     client.update().unwrap();
//! }
//! assert_eq!(client.component::<SyncReceiver>(ship).unwrap().applied(), 2);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod channel;
pub mod config;
pub mod error;
pub mod session;
pub mod simulation;
pub mod telemetry;
pub mod tick;
pub mod transport;

pub use channel::{pipe, PipeReceiver, PipeSender};
pub use config::{GameConfig, NetConfig};
pub use error::{ConfigError, NetResult, NetworkError};
pub use session::{Session, SessionHandle};
pub use simulation::{LinkConditions, LinkStats, LossyLink};
pub use tick::{TickLoop, TickStats, MAX_CATCH_UP, MAX_TICK_RATE};
pub use transport::{ReaderHandle, TransportStats, UdpLink, UdpSender, MAX_DATAGRAM_SIZE};
