// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The tick-driven NTP client state machine.
//!
//! [`NtpClient::begin`] sends one unicast request, [`NtpClient::listen`]
//! subscribes to broadcast updates. Arriving datagrams are only classified
//! by the transport's [`DatagramReceiver`](crate::transport::DatagramReceiver);
//! every observable effect (closing the endpoint, decoding, calling the
//! handler) happens in [`NtpClient::process`], which the caller drives on a
//! fixed tick.

use std::net::{Ipv6Addr, SocketAddrV6};
use std::sync::Arc;

use log::{debug, trace, warn};
use ntp_tick_proto::codec;
use ntp_tick_proto::protocol::{ConstPackedSizeBytes, Packet};
use ntp_tick_proto::unix_time::Timeval;

use crate::config::ClientConfig;
use crate::error::{NtpError, TransportError};
use crate::event::{ClientEvent, EventHandler};
use crate::state::ClientState;
use crate::transport::{Inbox, JoinOutcome, Transport};

/// A single NTP request or broadcast-listen session over a [`Transport`].
///
/// ```
/// use ntp_tick_client::{ClientState, NtpClient};
/// # use ntp_tick_client::transport::{DatagramReceiver, JoinOutcome, Transport};
/// # use ntp_tick_client::error::TransportError;
/// # use std::net::{Ipv6Addr, SocketAddrV6};
/// # struct Loop(Option<DatagramReceiver>);
/// # impl Transport for Loop {
/// #     type Endpoint = ();
/// #     fn open(&mut self, _: u16, rx: DatagramReceiver) -> Result<(), TransportError> {
/// #         self.0 = Some(rx);
/// #         Ok(())
/// #     }
/// #     fn send(&mut self, _: &mut (), d: &[u8], _: SocketAddrV6, _: u8) -> Result<(), TransportError> {
/// #         let mut reply = [0u8; 48];
/// #         reply[..d.len()].copy_from_slice(d);
/// #         reply[40..44].copy_from_slice(&3_208_988_800u32.to_be_bytes());
/// #         self.0.as_ref().unwrap().deliver(&reply);
/// #         Ok(())
/// #     }
/// #     fn close(&mut self, _: ()) -> Result<(), TransportError> { Ok(()) }
/// #     fn join_multicast(&mut self, _: &Ipv6Addr) -> Result<JoinOutcome, TransportError> {
/// #         Ok(JoinOutcome::Joined)
/// #     }
/// # }
/// let mut client = NtpClient::new(Loop(None));
/// client
///     .begin(Ipv6Addr::LOCALHOST, 123, 64, |ev: &ntp_tick_client::ClientEvent| {
///         println!("{:?}", ev.result());
///     })
///     .unwrap();
/// while !client.is_done() {
///     client.process();
/// }
/// assert_eq!(client.state(), ClientState::Done);
/// assert_eq!(client.timestamp().unwrap().secs(), 1_000_000_000);
/// ```
pub struct NtpClient<T: Transport> {
    transport: T,
    config: ClientConfig,
    endpoint: Option<T::Endpoint>,
    inbox: Arc<Inbox>,
    remaining_ticks: u32,
    timestamp: Option<Timeval>,
    packet: Option<Packet>,
    received_len: usize,
    last_error: Option<TransportError>,
    handler: Option<Box<dyn EventHandler>>,
}

impl<T: Transport> NtpClient<T> {
    /// Create an idle client with the default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    /// Create an idle client.
    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        NtpClient {
            transport,
            config,
            endpoint: None,
            inbox: Inbox::new(),
            remaining_ticks: 0,
            timestamp: None,
            packet: None,
            received_len: 0,
            last_error: None,
            handler: None,
        }
    }

    /// Send a request to `address`:`port` and start counting down the
    /// timeout.
    ///
    /// The request leaves with the given hop limit. `handler` is called once
    /// from [`process`](Self::process) when the exchange ends.
    ///
    /// # Errors
    ///
    /// - [`NtpError::AlreadyInProgress`] if an exchange is in flight. No
    ///   transport call is made.
    /// - [`NtpError::InvalidArgument`] for the unspecified address or port 0.
    /// - [`NtpError::Transport`] if the endpoint cannot be opened or the
    ///   request cannot be sent. The session is then in `InternalError` and
    ///   the endpoint has been closed.
    pub fn begin<H>(
        &mut self,
        address: Ipv6Addr,
        port: u16,
        hop_limit: u8,
        handler: H,
    ) -> Result<(), NtpError>
    where
        H: EventHandler + 'static,
    {
        self.ensure_reusable()?;
        if address.is_unspecified() {
            return Err(NtpError::InvalidArgument("address must be specified"));
        }
        if port == 0 {
            return Err(NtpError::InvalidArgument("port must be non-zero"));
        }
        self.start(handler);

        let dest = SocketAddrV6::new(address, port, 0, self.config.interface);
        let receiver = self.inbox.receiver();
        let mut endpoint = match self.transport.open(0, receiver) {
            Ok(ep) => ep,
            Err(e) => return Err(self.fail_sync(e)),
        };

        // Armed before sending so a reply delivered from inside send() is kept.
        self.remaining_ticks = self.config.timeout_ticks;
        self.inbox.store(ClientState::Sent);

        let request = codec::encode_request();
        if let Err(e) = self.transport.send(&mut endpoint, &request, dest, hop_limit) {
            self.inbox.retire();
            if let Err(close_err) = self.transport.close(endpoint) {
                warn!("close after failed send also failed: {}", close_err);
            }
            return Err(self.fail_sync(e));
        }
        self.endpoint = Some(endpoint);
        debug!(
            "request sent to {}, waiting {} ticks",
            dest, self.remaining_ticks
        );
        Ok(())
    }

    /// Subscribe to broadcast updates sent to `group` on `port`.
    ///
    /// `handler` is called from [`process`](Self::process) for every decoded
    /// update. The session stays in `Listening` until [`shutdown`](Self::shutdown).
    ///
    /// # Errors
    ///
    /// - [`NtpError::AlreadyInProgress`] and [`NtpError::InvalidArgument`] as
    ///   for [`begin`](Self::begin).
    /// - [`NtpError::Transport`] if the group cannot be joined (the session is
    ///   left untouched) or the endpoint cannot be opened (the session moves
    ///   to `InternalError`). A group that is already joined, or an address
    ///   that is not a multicast group, is not an error.
    pub fn listen<H>(&mut self, group: Ipv6Addr, port: u16, handler: H) -> Result<(), NtpError>
    where
        H: EventHandler + 'static,
    {
        self.ensure_reusable()?;
        if group.is_unspecified() {
            return Err(NtpError::InvalidArgument("address must be specified"));
        }
        if port == 0 {
            return Err(NtpError::InvalidArgument("port must be non-zero"));
        }
        match self.transport.join_multicast(&group)? {
            JoinOutcome::Joined => debug!("joined multicast group {}", group),
            JoinOutcome::AlreadyJoined => debug!("multicast group {} already joined", group),
            JoinOutcome::NotMulticast => debug!("{} is not a multicast group, not joining", group),
        }
        self.start(handler);

        self.inbox.store(ClientState::Listening);
        let receiver = self.inbox.receiver();
        match self.transport.open(port, receiver) {
            Ok(ep) => self.endpoint = Some(ep),
            Err(e) => {
                self.inbox.retire();
                return Err(self.fail_sync(e));
            }
        }
        debug!("listening for broadcasts on port {}", port);
        Ok(())
    }

    /// Close the endpoint and force a terminal state.
    ///
    /// Moves to `Done` unless the session is already terminal. Calling it
    /// again is a no-op.
    ///
    /// # Errors
    ///
    /// [`NtpError::Transport`] if closing fails; the session is then in
    /// `InternalError`.
    pub fn shutdown(&mut self) -> Result<(), NtpError> {
        if let Some(endpoint) = self.endpoint.take() {
            self.inbox.retire();
            if let Err(e) = self.transport.close(endpoint) {
                warn!("close on shutdown failed: {}", e);
                self.last_error = Some(e.clone());
                self.inbox.store(ClientState::InternalError);
                return Err(e.into());
            }
        }
        if !self.state().is_terminal() {
            self.inbox.store(ClientState::Done);
        }
        Ok(())
    }

    /// Advance the state machine by one tick.
    ///
    /// Call this at the configured tick period. It never blocks.
    pub fn process(&mut self) {
        match self.state() {
            ClientState::Sent => self.tick_sent(),
            ClientState::Received => self.finish_received(),
            ClientState::ReceivedBroadcast => self.finish_broadcast(),
            ClientState::Truncated => {
                let (_, len) = self.inbox.take();
                self.received_len = len;
                warn!("{}", NtpError::Truncated { received: len });
                let final_state = match self.close_endpoint() {
                    Ok(()) => ClientState::CommunicationError,
                    Err(_) => ClientState::InternalError,
                };
                self.inbox.store(final_state);
                self.notify(final_state);
            }
            ClientState::TruncatedBroadcast => {
                let (_, len) = self.inbox.take();
                self.received_len = len;
                debug!("{}", NtpError::TruncatedBroadcast { received: len });
                self.inbox.store(ClientState::Listening);
            }
            _ => {}
        }
    }

    /// Return a terminal session to `Idle`, clearing its result.
    ///
    /// # Errors
    ///
    /// [`NtpError::AlreadyInProgress`] if an exchange is in flight.
    pub fn reset(&mut self) -> Result<(), NtpError> {
        self.ensure_reusable()?;
        self.clear();
        self.handler = None;
        self.inbox.store(ClientState::Idle);
        Ok(())
    }

    /// Current state.
    pub fn state(&self) -> ClientState {
        self.inbox.state()
    }

    /// Whether the session is in a terminal state.
    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    /// The decoded time of the last accepted reply or broadcast.
    pub fn timestamp(&self) -> Option<Timeval> {
        self.timestamp
    }

    /// The header of the last accepted reply or broadcast.
    pub fn packet(&self) -> Option<&Packet> {
        self.packet.as_ref()
    }

    /// Length of the last datagram taken from the receive buffer.
    pub fn received_len(&self) -> usize {
        self.received_len
    }

    /// The last transport failure.
    pub fn last_error(&self) -> Option<&TransportError> {
        self.last_error.as_ref()
    }

    /// Ticks left before a unicast request times out.
    pub fn remaining_ticks(&self) -> u32 {
        self.remaining_ticks
    }

    /// The outcome of a finished unicast exchange, `None` while one is in
    /// flight or before the first one.
    pub fn result(&self) -> Option<Result<Timeval, NtpError>> {
        let state = self.state();
        if !state.is_terminal() {
            return None;
        }
        if state == ClientState::InternalError {
            let err = self.last_error.clone().unwrap_or(TransportError::Closed);
            return Some(Err(NtpError::Transport(err)));
        }
        match state.failure() {
            Some(err) => Some(Err(err)),
            // Done without a reply means the session was shut down.
            None => Some(self.timestamp.ok_or(NtpError::CommunicationError)),
        }
    }

    /// The configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn ensure_reusable(&self) -> Result<(), NtpError> {
        if self.state().is_reusable() {
            Ok(())
        } else {
            debug!("rejecting new exchange in state {}", self.state());
            Err(NtpError::AlreadyInProgress)
        }
    }

    fn clear(&mut self) {
        self.remaining_ticks = 0;
        self.timestamp = None;
        self.packet = None;
        self.received_len = 0;
        self.last_error = None;
    }

    fn start<H: EventHandler + 'static>(&mut self, handler: H) {
        self.clear();
        self.handler = Some(Box::new(handler));
    }

    // Record a failure of begin/listen that is reported to the caller
    // directly rather than through the handler.
    fn fail_sync(&mut self, err: TransportError) -> NtpError {
        warn!("transport failure: {}", err);
        self.remaining_ticks = 0;
        self.last_error = Some(err.clone());
        self.inbox.store(ClientState::InternalError);
        NtpError::Transport(err)
    }

    fn close_endpoint(&mut self) -> Result<(), TransportError> {
        let Some(endpoint) = self.endpoint.take() else {
            return Ok(());
        };
        self.inbox.retire();
        self.transport.close(endpoint).map_err(|e| {
            warn!("close failed: {}", e);
            self.last_error = Some(e.clone());
            e
        })
    }

    fn tick_sent(&mut self) {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
        trace!("{} ticks remaining", self.remaining_ticks);
        if self.remaining_ticks > 0 {
            return;
        }
        // A reply that lands first is handled on the next tick.
        if !self.inbox.transition(ClientState::Sent, ClientState::Timeout) {
            return;
        }
        debug!("no reply within {} ticks", self.config.timeout_ticks);
        if self.close_endpoint().is_err() {
            self.inbox.store(ClientState::InternalError);
        }
        self.notify(self.state());
    }

    fn finish_received(&mut self) {
        let (bytes, len) = self.inbox.take();
        self.received_len = len;
        let final_state = match self.close_endpoint() {
            Ok(()) => ClientState::Done,
            Err(_) => ClientState::InternalError,
        };
        self.decode(&bytes);
        self.inbox.store(final_state);
        debug!(
            "reply of {} bytes, transmit time {:?}, final state {}",
            len, self.timestamp, final_state
        );
        self.notify(final_state);
    }

    fn finish_broadcast(&mut self) {
        let (bytes, len) = self.inbox.take();
        self.received_len = len;
        self.decode(&bytes);
        // Reopen for the next update before the handler runs; the buffer has
        // already been copied out.
        self.inbox.store(ClientState::Listening);
        debug!("broadcast of {} bytes, transmit time {:?}", len, self.timestamp);
        self.notify(ClientState::ReceivedBroadcast);
    }

    fn decode(&mut self, bytes: &[u8; Packet::PACKED_SIZE_BYTES]) {
        self.packet = Some(Packet::decode(bytes));
        self.timestamp = Some(codec::decode_transmit_timestamp(bytes));
    }

    fn notify(&mut self, state: ClientState) {
        let event = ClientEvent {
            state,
            time: self.timestamp,
            packet: self.packet,
            error: if state == ClientState::InternalError {
                self.last_error.clone()
            } else {
                None
            },
        };
        match self.handler.as_mut() {
            Some(handler) => handler.on_event(&event),
            None => trace!("no handler for {:?}", event.state),
        }
    }
}

impl<T: Transport> Drop for NtpClient<T> {
    fn drop(&mut self) {
        if let Some(endpoint) = self.endpoint.take() {
            self.inbox.retire();
            if let Err(e) = self.transport.close(endpoint) {
                warn!("close on drop failed: {}", e);
            }
        }
    }
}

impl<T: Transport> std::fmt::Debug for NtpClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NtpClient")
            .field("state", &self.state())
            .field("remaining_ticks", &self.remaining_ticks)
            .field("timestamp", &self.timestamp)
            .field("last_error", &self.last_error)
            .field("open", &self.endpoint.is_some())
            .finish()
    }
}
