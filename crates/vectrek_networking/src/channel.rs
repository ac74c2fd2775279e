//! # In-Process Pipes
//!
//! A bounded queue with a [`Sender`] end and a [`Receiver`] end. Used to
//! connect two worlds in one process and as the hand-off between a socket
//! reader thread and the simulation thread.
//!
//! Neither end ever blocks: a full pipe drops the new message and counts it,
//! an empty pipe reports nothing pending.

use crossbeam_channel::{bounded, TryRecvError, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use vectrek_core::{Receiver, Sender};
use vectrek_shared::ComponentMessage;

/// Creates a pipe holding at most `capacity` messages.
#[must_use]
pub fn pipe(capacity: usize) -> (PipeSender, PipeReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        PipeSender {
            tx,
            dropped: Arc::clone(&dropped),
        },
        PipeReceiver { rx, dropped },
    )
}

/// Writing end. Cheap to clone; every clone feeds the same queue.
#[derive(Clone, Debug)]
pub struct PipeSender {
    tx: crossbeam_channel::Sender<ComponentMessage>,
    dropped: Arc<AtomicU64>,
}

impl PipeSender {
    /// Queues a message without blocking. Returns `false` if it was dropped.
    pub fn push(&self, msg: ComponentMessage) -> bool {
        match self.tx.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(msg)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::debug!(entity = %msg.entity, dropped, "pipe full, message dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("pipe closed, message dropped");
                false
            }
        }
    }

    /// Messages dropped so far on either end's account.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Sender for PipeSender {
    fn send(&mut self, msg: ComponentMessage) {
        self.push(msg);
    }
}

/// Reading end. The simulation thread is its only consumer.
#[derive(Debug)]
pub struct PipeReceiver {
    rx: crossbeam_channel::Receiver<ComponentMessage>,
    dropped: Arc<AtomicU64>,
}

impl PipeReceiver {
    /// Messages currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Messages the sending side had to drop.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Receiver for PipeReceiver {
    fn receive(&mut self) -> Option<ComponentMessage> {
        match self.rx.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}
