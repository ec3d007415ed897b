// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The datagram transport the client runs on, and the handle through which
//! the transport hands arriving datagrams back to the client.
//!
//! A [`Transport`] only has to open and close endpoints, send datagrams and
//! subscribe to multicast groups. Arrival notification goes through the
//! [`DatagramReceiver`] passed to [`Transport::open`]; it may be called from
//! any thread or task, including from inside [`Transport::send`].

use std::net::{Ipv6Addr, SocketAddrV6};
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use ntp_tick_proto::protocol::PACKET_LEN;

use crate::error::TransportError;
use crate::state::ClientState;

/// Result of subscribing to a multicast group.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinOutcome {
    /// The group was joined.
    Joined,
    /// The group was already joined; nothing changed.
    AlreadyJoined,
    /// The address is not a multicast address; unicast datagrams to it are
    /// still received.
    NotMulticast,
}

/// An event-driven UDP transport.
///
/// Implementations own whatever sockets or stack handles they need. The
/// client owns its transport and is the only caller of these methods.
pub trait Transport {
    /// An open endpoint. Closing consumes it, so an endpoint is closed at
    /// most once.
    type Endpoint;

    /// Open an endpoint bound to `local_port` (`0` for an ephemeral port).
    ///
    /// Every datagram received on the endpoint until it is closed must be
    /// handed to `receiver`.
    fn open(
        &mut self,
        local_port: u16,
        receiver: DatagramReceiver,
    ) -> Result<Self::Endpoint, TransportError>;

    /// Send one datagram to `dest` with the given hop limit.
    fn send(
        &mut self,
        endpoint: &mut Self::Endpoint,
        datagram: &[u8],
        dest: SocketAddrV6,
        hop_limit: u8,
    ) -> Result<(), TransportError>;

    /// Close an endpoint. No datagram is delivered for it afterwards.
    fn close(&mut self, endpoint: Self::Endpoint) -> Result<(), TransportError>;

    /// Subscribe to a multicast group for endpoints opened afterwards.
    fn join_multicast(&mut self, group: &Ipv6Addr) -> Result<JoinOutcome, TransportError>;
}

#[derive(Debug)]
struct Buffer {
    bytes: [u8; PACKET_LEN],
    len: usize,
}

/// State and receive buffer shared between a client and the receivers it
/// hands out.
#[derive(Debug)]
pub(crate) struct Inbox {
    state: AtomicU8,
    // Bumped whenever an endpoint is opened or closed; receivers from an
    // earlier endpoint no longer match and are ignored.
    generation: AtomicU64,
    buffer: Mutex<Buffer>,
}

impl Inbox {
    pub(crate) fn new() -> Arc<Inbox> {
        Arc::new(Inbox {
            state: AtomicU8::new(ClientState::Idle.code()),
            generation: AtomicU64::new(0),
            buffer: Mutex::new(Buffer {
                bytes: [0u8; PACKET_LEN],
                len: 0,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Buffer> {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn state(&self) -> ClientState {
        // Only valid codes are ever stored.
        ClientState::from_code(self.state.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Store a state the receivers never act on, or one that must win
    /// regardless of a concurrent delivery.
    pub(crate) fn store(&self, state: ClientState) {
        self.state.store(state.code(), Ordering::Release);
    }

    /// Move from `from` to `to` unless a delivery got there first.
    pub(crate) fn transition(&self, from: ClientState, to: ClientState) -> bool {
        self.state
            .compare_exchange(from.code(), to.code(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// A receiver for a newly opened endpoint.
    pub(crate) fn receiver(self: &Arc<Self>) -> DatagramReceiver {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        DatagramReceiver {
            inbox: Arc::clone(self),
            generation,
        }
    }

    /// Invalidate every receiver handed out so far.
    pub(crate) fn retire(&self) {
        let _guard = self.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Copy out the last accepted datagram and its received length.
    pub(crate) fn take(&self) -> ([u8; PACKET_LEN], usize) {
        let buf = self.lock();
        (buf.bytes, buf.len)
    }
}

/// Handle a [`Transport`] uses to hand received datagrams to the client.
///
/// Delivery only classifies the datagram: it checks the session state,
/// copies up to one NTP header into the session buffer and publishes the
/// new state. Decoding and notification happen on the next
/// [`process`](crate::NtpClient::process) tick.
#[derive(Clone, Debug)]
pub struct DatagramReceiver {
    inbox: Arc<Inbox>,
    generation: u64,
}

impl DatagramReceiver {
    /// Offer a received datagram to the client.
    ///
    /// Returns `true` if the datagram was accepted (including a truncated
    /// one) and `false` if the session was not waiting for one or the
    /// endpoint this receiver belongs to has been closed.
    pub fn deliver(&self, datagram: &[u8]) -> bool {
        let mut buf = self.inbox.lock();
        if self.inbox.generation.load(Ordering::Acquire) != self.generation {
            return false;
        }
        let full = datagram.len() >= PACKET_LEN;
        let (from, to) = match self.inbox.state() {
            ClientState::Sent if full => (ClientState::Sent, ClientState::Received),
            ClientState::Sent => (ClientState::Sent, ClientState::Truncated),
            ClientState::Listening if full => {
                (ClientState::Listening, ClientState::ReceivedBroadcast)
            }
            ClientState::Listening => (ClientState::Listening, ClientState::TruncatedBroadcast),
            _ => return false,
        };
        let n = datagram.len().min(PACKET_LEN);
        buf.bytes[..n].copy_from_slice(&datagram[..n]);
        buf.bytes[n..].fill(0);
        buf.len = datagram.len();
        self.inbox.transition(from, to)
    }

    /// Whether the endpoint this receiver was handed out for is still open.
    pub fn is_current(&self) -> bool {
        self.inbox.generation.load(Ordering::Acquire) == self.generation
    }
}
