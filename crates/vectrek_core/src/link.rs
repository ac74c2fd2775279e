//! # Transport Seams
//!
//! The world talks to the network through exactly two traits. Implementations
//! live in the networking crate (bounded pipes, UDP, lossy simulators); the
//! core never assumes ordering or delivery.

use vectrek_shared::ComponentMessage;

/// Outbound half. Fire-and-forget.
///
/// `send` must return immediately. Buffering, backpressure and failure
/// handling belong to the implementation, never to the simulation tick.
pub trait Sender: Send {
    /// Hands a message to the transport.
    fn send(&mut self, msg: ComponentMessage);
}

/// Inbound half. Non-blocking poll.
pub trait Receiver: Send {
    /// Returns the next pending message, or `None` if nothing is pending
    /// right now. `None` is never an error.
    fn receive(&mut self) -> Option<ComponentMessage>;
}

/// A link with nobody on the other end.
///
/// Sends vanish, receives are always empty. Worlds start out wired to this.
#[derive(Clone, Copy, Debug, Default)]
pub struct Disconnected;

impl Sender for Disconnected {
    fn send(&mut self, msg: ComponentMessage) {
        tracing::trace!(
            entity = %msg.entity,
            kind = msg.payload.type_name(),
            "no link, message discarded"
        );
    }
}

impl Receiver for Disconnected {
    fn receive(&mut self) -> Option<ComponentMessage> {
        None
    }
}
