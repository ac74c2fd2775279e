//! # Transport Layer
//!
//! UDP datagrams carrying one JSON-encoded [`ComponentMessage`] each.
//!
//! ## Design
//!
//! ```text
//! socket --> reader thread --decode--> pipe --> World (simulation thread)
//! World --> UdpSender --encode--> socket
//! ```
//!
//! - The reader thread only ever appends to a bounded pipe
//! - Undecodable datagrams are logged and dropped, never fatal
//! - No acknowledgements, retries or ordering: the sync protocol tolerates loss

use crate::channel::{pipe, PipeReceiver, PipeSender};
use parking_lot::Mutex;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use vectrek_core::Sender;
use vectrek_shared::{decode, encode, ComponentMessage};

/// Largest datagram read or written.
pub const MAX_DATAGRAM_SIZE: usize = 1200;

/// How often the reader thread wakes to check its stop flag.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Transport statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Packets sent.
    pub packets_sent: u64,
    /// Packets received.
    pub packets_received: u64,
    /// Bytes sent.
    pub bytes_sent: u64,
    /// Bytes received.
    pub bytes_received: u64,
    /// Send errors, encode failures included.
    pub send_errors: u64,
    /// Receive errors.
    pub recv_errors: u64,
    /// Datagrams that did not decode to a known message.
    pub decode_errors: u64,
}

/// A bound UDP socket, not yet split into its two halves.
#[derive(Debug)]
pub struct UdpLink {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl UdpLink {
    /// Binds a socket to `addr`. Port 0 picks a free port.
    ///
    /// # Errors
    ///
    /// Any bind failure.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        let local_addr = socket.local_addr()?;
        Ok(Self { socket, local_addr })
    }

    /// Returns the local address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts the reader thread and returns both halves.
    ///
    /// Outbound messages go to `peer`. Inbound messages from anyone are
    /// queued in a pipe of `capacity` for the world to poll.
    ///
    /// # Errors
    ///
    /// Socket cloning, timeout setup or thread spawn failure.
    pub fn split(
        self,
        peer: SocketAddr,
        capacity: usize,
    ) -> io::Result<(UdpSender, PipeReceiver, ReaderHandle)> {
        let reader_socket = self.socket.try_clone()?;
        reader_socket.set_read_timeout(Some(READ_TIMEOUT))?;

        let (tx, rx) = pipe(capacity);
        let stop = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(Mutex::new(TransportStats::default()));

        let thread = {
            let stop = Arc::clone(&stop);
            let stats = Arc::clone(&stats);
            std::thread::Builder::new()
                .name(format!("udp-reader-{}", self.local_addr))
                .spawn(move || read_loop(&reader_socket, &tx, &stop, &stats))?
        };

        tracing::info!(local = %self.local_addr, %peer, "udp link up");

        let sender = UdpSender {
            socket: self.socket,
            peer,
            stats: Arc::clone(&stats),
        };
        let handle = ReaderHandle {
            stop,
            stats,
            thread: Some(thread),
        };
        Ok((sender, rx, handle))
    }
}

fn read_loop(
    socket: &UdpSocket,
    tx: &PipeSender,
    stop: &AtomicBool,
    stats: &Mutex<TransportStats>,
) {
    let mut buffer = [0_u8; MAX_DATAGRAM_SIZE];
    while !stop.load(Ordering::Acquire) {
        match socket.recv_from(&mut buffer) {
            Ok((len, from)) => {
                {
                    let mut stats = stats.lock();
                    stats.packets_received += 1;
                    stats.bytes_received += len as u64;
                }
                match decode(&buffer[..len]) {
                    Ok(msg) => {
                        tx.push(msg);
                    }
                    Err(err) => {
                        stats.lock().decode_errors += 1;
                        tracing::warn!(%from, %err, "undecodable datagram dropped");
                    }
                }
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
            Err(e) => {
                stats.lock().recv_errors += 1;
                tracing::debug!(error = %e, "udp receive failed");
            }
        }
    }
    tracing::debug!("udp reader stopped");
}

/// Outbound half: encodes and sends each message as one datagram.
#[derive(Debug)]
pub struct UdpSender {
    socket: UdpSocket,
    peer: SocketAddr,
    stats: Arc<Mutex<TransportStats>>,
}

impl UdpSender {
    /// Destination address.
    #[must_use]
    pub const fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Returns statistics for both halves.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        *self.stats.lock()
    }
}

impl Sender for UdpSender {
    fn send(&mut self, msg: ComponentMessage) {
        let bytes = match encode(&msg) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.stats.lock().send_errors += 1;
                tracing::warn!(entity = %msg.entity, %err, "encode failed, message dropped");
                return;
            }
        };

        match self.socket.send_to(&bytes, self.peer) {
            Ok(n) => {
                let mut stats = self.stats.lock();
                stats.packets_sent += 1;
                stats.bytes_sent += n as u64;
            }
            Err(err) => {
                self.stats.lock().send_errors += 1;
                tracing::debug!(peer = %self.peer, %err, "udp send failed");
            }
        }
    }
}

/// Owns the reader thread. Dropping it stops the thread as well.
#[derive(Debug)]
pub struct ReaderHandle {
    stop: Arc<AtomicBool>,
    stats: Arc<Mutex<TransportStats>>,
    thread: Option<JoinHandle<()>>,
}

impl ReaderHandle {
    /// Returns statistics for both halves.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        *self.stats.lock()
    }

    /// Signals the reader to stop and waits for it.
    pub fn stop(mut self) -> TransportStats {
        self.shutdown();
        self.stats()
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("udp reader panicked");
            }
        }
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
