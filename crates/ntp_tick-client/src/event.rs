// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use ntp_tick_proto::protocol::Packet;
use ntp_tick_proto::unix_time::Timeval;

use crate::error::{NtpError, TransportError};
use crate::state::ClientState;

/// Outcome handed to an [`EventHandler`].
///
/// Raised once when a unicast exchange reaches a terminal state during
/// [`process`](crate::NtpClient::process), and once per decoded broadcast
/// update while listening.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientEvent {
    /// The state the session finished in. `ReceivedBroadcast` for a
    /// broadcast update.
    pub state: ClientState,
    /// Decoded transmit time of the reply, if one was accepted.
    pub time: Option<Timeval>,
    /// The full reply header, if one was accepted.
    pub packet: Option<Packet>,
    /// Transport failure behind an `InternalError`.
    pub error: Option<TransportError>,
}

impl ClientEvent {
    /// Whether this is a broadcast update rather than the end of an exchange.
    pub fn is_broadcast(&self) -> bool {
        self.state == ClientState::ReceivedBroadcast
    }

    /// The decoded time, or the failure the exchange ended with.
    pub fn result(&self) -> Result<Timeval, NtpError> {
        if let Some(err) = &self.error {
            return Err(NtpError::Transport(err.clone()));
        }
        if self.state == ClientState::InternalError {
            return Err(NtpError::Transport(TransportError::Closed));
        }
        match (self.state.failure(), self.time) {
            (Some(err), _) => Err(err),
            (None, Some(time)) => Ok(time),
            (None, None) => Err(NtpError::CommunicationError),
        }
    }
}

/// Receives [`ClientEvent`]s from a client.
///
/// Implemented for every `FnMut(&ClientEvent) + Send` closure; the closure
/// carries whatever context the caller needs.
pub trait EventHandler: Send {
    /// Called from inside [`process`](crate::NtpClient::process).
    fn on_event(&mut self, event: &ClientEvent);
}

impl<F> EventHandler for F
where
    F: FnMut(&ClientEvent) + Send,
{
    fn on_event(&mut self, event: &ClientEvent) {
        self(event)
    }
}
