// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for the NTP client.
//!
//! The state machine reports failures as [`NtpError`] values. The async
//! convenience functions in [`crate::driver`] return `io::Result<T>`; the typed
//! error survives the conversion and can be recovered with
//! `io::Error::get_ref()`:
//!
//! ```
//! use ntp_tick_client::error::NtpError;
//! use std::io;
//!
//! let err: io::Error = NtpError::Timeout.into();
//! assert_eq!(err.kind(), io::ErrorKind::TimedOut);
//! let inner = err.get_ref().and_then(|e| e.downcast_ref::<NtpError>());
//! assert!(matches!(inner, Some(NtpError::Timeout)));
//! ```

pub use ntp_tick_proto::error::ParseError;

use std::fmt;
use std::io;

/// Failure reported by a [`Transport`](crate::transport::Transport) while
/// opening, sending on, closing, or subscribing an endpoint.
///
/// Cheap to clone so the state machine can keep the last one for later
/// inspection and still hand a copy to the event handler.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransportError {
    /// No message buffer could be allocated for the datagram.
    NoBuffers,
    /// An operating-system level failure.
    Io {
        /// Kind of the underlying I/O error.
        kind: io::ErrorKind,
        /// Rendered message of the underlying I/O error.
        detail: String,
    },
    /// The endpoint is no longer open.
    Closed,
}

/// Errors that can occur during NTP client operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NtpError {
    /// A required argument was missing or out of range.
    InvalidArgument(&'static str),
    /// The session has an exchange in flight and cannot be reused yet.
    AlreadyInProgress,
    /// The transport failed to open, send, close or join.
    Transport(TransportError),
    /// A unicast reply was shorter than an NTP header.
    Truncated {
        /// Number of bytes received.
        received: usize,
    },
    /// A broadcast datagram was shorter than an NTP header.
    TruncatedBroadcast {
        /// Number of bytes received.
        received: usize,
    },
    /// The unicast reply was malformed.
    CommunicationError,
    /// No unicast reply arrived within the tick budget.
    Timeout,
}

// ── Display implementations ─────────────────────────────────────────

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NoBuffers => write!(f, "no message buffers available"),
            TransportError::Io { detail, .. } => write!(f, "{detail}"),
            TransportError::Closed => write!(f, "endpoint closed"),
        }
    }
}

impl fmt::Display for NtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NtpError::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
            NtpError::AlreadyInProgress => write!(f, "NTP exchange already in progress"),
            NtpError::Transport(e) => write!(f, "NTP transport error: {e}"),
            NtpError::Truncated { received } => {
                write!(f, "NTP response too short ({received} bytes)")
            }
            NtpError::TruncatedBroadcast { received } => {
                write!(f, "NTP broadcast too short ({received} bytes)")
            }
            NtpError::CommunicationError => write!(f, "malformed NTP response"),
            NtpError::Timeout => write!(f, "NTP request timed out"),
        }
    }
}

// ── Error trait implementations ─────────────────────────────────────

impl std::error::Error for TransportError {}

impl std::error::Error for NtpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NtpError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

// ── From conversions ────────────────────────────────────────────────

impl TransportError {
    /// The `io::ErrorKind` this error corresponds to.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            TransportError::NoBuffers => io::ErrorKind::OutOfMemory,
            TransportError::Io { kind, .. } => *kind,
            TransportError::Closed => io::ErrorKind::NotConnected,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> TransportError {
        TransportError::Io {
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}

impl From<TransportError> for NtpError {
    fn from(err: TransportError) -> NtpError {
        NtpError::Transport(err)
    }
}

impl From<NtpError> for io::Error {
    fn from(err: NtpError) -> io::Error {
        let kind = match &err {
            NtpError::InvalidArgument(_) => io::ErrorKind::InvalidInput,
            NtpError::AlreadyInProgress => io::ErrorKind::AlreadyExists,
            NtpError::Transport(e) => e.kind(),
            NtpError::Truncated { .. }
            | NtpError::TruncatedBroadcast { .. }
            | NtpError::CommunicationError => io::ErrorKind::InvalidData,
            NtpError::Timeout => io::ErrorKind::TimedOut,
        };
        io::Error::new(kind, err)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
