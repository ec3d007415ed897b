// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for integration tests.

// Integration test helpers are `pub` so each `tests/*.rs` file can import them
// via `mod common`, but clippy flags them as unreachable outside the crate.
#![allow(unreachable_pub)]
#![allow(dead_code)]

use std::net::{Ipv6Addr, SocketAddrV6};
use std::sync::{Arc, Mutex};

use ntp_tick_client::ClientEvent;
use ntp_tick_client::error::TransportError;
use ntp_tick_client::transport::{DatagramReceiver, JoinOutcome, Transport};

/// A transport call recorded by [`MockTransport`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    Open { port: u16 },
    Send { dest: SocketAddrV6, hop_limit: u8, datagram: Vec<u8> },
    Close { endpoint: u32 },
    Join { group: Ipv6Addr },
}

/// In-memory transport that records every call and fails on request.
pub struct MockTransport {
    pub calls: Vec<Call>,
    pub receiver: Option<DatagramReceiver>,
    pub fail_open: Option<TransportError>,
    pub fail_send: Option<TransportError>,
    pub fail_close: Option<TransportError>,
    pub join_result: Result<JoinOutcome, TransportError>,
    /// Delivered from inside `send`, before it returns.
    pub reply_during_send: Option<Vec<u8>>,
    pub next_endpoint: u32,
}

impl Default for MockTransport {
    fn default() -> Self {
        MockTransport {
            calls: Vec::new(),
            receiver: None,
            fail_open: None,
            fail_send: None,
            fail_close: None,
            join_result: Ok(JoinOutcome::Joined),
            reply_during_send: None,
            next_endpoint: 0,
        }
    }
}

impl MockTransport {
    pub fn opens(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Open { .. }))
            .count()
    }

    pub fn sends(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Send { .. }))
            .collect()
    }

    pub fn closes(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Close { .. }))
            .count()
    }

    /// Hand `datagram` to the client through the last receiver.
    pub fn deliver(&self, datagram: &[u8]) -> bool {
        self.receiver
            .as_ref()
            .map(|rx| rx.deliver(datagram))
            .unwrap_or(false)
    }
}

impl Transport for MockTransport {
    type Endpoint = u32;

    fn open(&mut self, local_port: u16, receiver: DatagramReceiver) -> Result<u32, TransportError> {
        self.calls.push(Call::Open { port: local_port });
        if let Some(err) = self.fail_open.clone() {
            return Err(err);
        }
        self.receiver = Some(receiver);
        self.next_endpoint += 1;
        Ok(self.next_endpoint)
    }

    fn send(
        &mut self,
        _endpoint: &mut u32,
        datagram: &[u8],
        dest: SocketAddrV6,
        hop_limit: u8,
    ) -> Result<(), TransportError> {
        self.calls.push(Call::Send {
            dest,
            hop_limit,
            datagram: datagram.to_vec(),
        });
        if let Some(err) = self.fail_send.clone() {
            return Err(err);
        }
        if let Some(reply) = self.reply_during_send.take() {
            self.deliver(&reply);
        }
        Ok(())
    }

    fn close(&mut self, endpoint: u32) -> Result<(), TransportError> {
        self.calls.push(Call::Close { endpoint });
        match self.fail_close.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn join_multicast(&mut self, group: &Ipv6Addr) -> Result<JoinOutcome, TransportError> {
        self.calls.push(Call::Join { group: *group });
        self.join_result.clone()
    }
}

/// A 48-byte reply carrying the given transmit timestamp.
pub fn reply(seconds: u32, fraction: u32) -> Vec<u8> {
    let mut buf = vec![0u8; 48];
    buf[0] = 0x1C; // LI=0, VN=3, Mode=4
    buf[1] = 2;
    buf[40..44].copy_from_slice(&seconds.to_be_bytes());
    buf[44..48].copy_from_slice(&fraction.to_be_bytes());
    buf
}

/// NTP seconds for the given Unix seconds.
pub fn ntp_secs(unix: u32) -> u32 {
    unix + 2_208_988_800
}

/// A handler that stores every event, and the store it writes to.
pub fn recorder() -> (
    Arc<Mutex<Vec<ClientEvent>>>,
    impl FnMut(&ClientEvent) + Send + 'static,
) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    (events, move |ev: &ClientEvent| {
        sink.lock().unwrap().push(ev.clone())
    })
}

pub fn server() -> Ipv6Addr {
    "2001:db8::123".parse().unwrap()
}
