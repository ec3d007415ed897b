// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::error::NtpError;

/// Lifecycle state of an NTP client session.
///
/// The discriminants are the one-byte state codes exposed to operators.
/// Every terminal state has a code of `0xF0` or above, so
/// [`is_terminal`](ClientState::is_terminal) is a single comparison.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ClientState {
    /// No exchange in progress.
    #[default]
    Idle = 0x00,
    /// Subscribed to a broadcast source.
    Listening = 0x10,
    /// Unicast request sent; counting down timeout ticks.
    Sent = 0x20,
    /// A unicast reply of full length arrived and awaits finalization.
    Received = 0xA0,
    /// A broadcast datagram of full length arrived and awaits decoding.
    ReceivedBroadcast = 0xB0,
    /// A unicast reply shorter than an NTP header arrived.
    Truncated = 0xE0,
    /// A broadcast datagram shorter than an NTP header arrived.
    TruncatedBroadcast = 0xEB,
    /// The unicast exchange completed, or the session was shut down.
    Done = 0xF0,
    /// The transport failed to open, send or close.
    InternalError = 0xF1,
    /// The unicast reply was malformed.
    CommunicationError = 0xFC,
    /// No unicast reply arrived within the tick budget.
    Timeout = 0xFF,
}

const TERMINAL_MIN: u8 = 0xF0;

impl ClientState {
    /// The one-byte state code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a state by its code. Returns `None` for unassigned codes.
    pub fn from_code(code: u8) -> Option<ClientState> {
        Some(match code {
            0x00 => ClientState::Idle,
            0x10 => ClientState::Listening,
            0x20 => ClientState::Sent,
            0xA0 => ClientState::Received,
            0xB0 => ClientState::ReceivedBroadcast,
            0xE0 => ClientState::Truncated,
            0xEB => ClientState::TruncatedBroadcast,
            0xF0 => ClientState::Done,
            0xF1 => ClientState::InternalError,
            0xFC => ClientState::CommunicationError,
            0xFF => ClientState::Timeout,
            _ => return None,
        })
    }

    /// Whether no further transition happens without caller intervention.
    pub fn is_terminal(self) -> bool {
        self.code() >= TERMINAL_MIN
    }

    /// Whether a new `begin`/`listen` may start from this state.
    pub fn is_reusable(self) -> bool {
        self == ClientState::Idle || self.is_terminal()
    }

    /// The failure a protocol-level terminal state stands for.
    ///
    /// `None` for `InternalError`: its cause is the transport error the
    /// session records in `last_error()`.
    pub fn failure(self) -> Option<NtpError> {
        match self {
            ClientState::CommunicationError => Some(NtpError::CommunicationError),
            ClientState::Timeout => Some(NtpError::Timeout),
            _ => None,
        }
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientState::Idle => "idle",
            ClientState::Listening => "listening",
            ClientState::Sent => "sent",
            ClientState::Received => "received",
            ClientState::ReceivedBroadcast => "received broadcast",
            ClientState::Truncated => "truncated",
            ClientState::TruncatedBroadcast => "truncated broadcast",
            ClientState::Done => "done",
            ClientState::InternalError => "internal error",
            ClientState::CommunicationError => "communication error",
            ClientState::Timeout => "timeout",
        };
        write!(f, "{name} (0x{:02x})", self.code())
    }
}
