// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! IPv6 UDP [`Transport`] built on `socket2` and tokio.
//!
//! Every opened endpoint gets its own IPv6-only, non-blocking socket and a
//! spawned receive task that hands each datagram to the client's
//! [`DatagramReceiver`]. Closing aborts the task and drops the socket.
//!
//! [`Transport::join_multicast`] joins the group on the configured interface
//! through a membership socket the transport keeps, so a refused join is
//! reported by that call and never recorded. Listener endpoints (opened on a
//! fixed port) join every recorded group again on their own socket;
//! ephemeral unicast endpoints join nothing.

use std::io;
use std::net::{Ipv6Addr, SocketAddr, SocketAddrV6};
use std::sync::Arc;

use socket2::{Domain, Protocol, SockRef, Socket, Type};
use tokio::net::UdpSocket;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, debug_span, warn};

use crate::error::TransportError;
use crate::transport::{DatagramReceiver, JoinOutcome, Transport};

// Large enough for a header plus extension fields and a MAC; anything longer
// is cut here and still counts as a full-length reply.
const RECV_BUF_LEN: usize = 1024;

/// UDPv6 transport running its receive tasks on a tokio runtime.
#[derive(Debug)]
pub struct UdpTransport {
    handle: Handle,
    interface: u32,
    groups: Vec<Ipv6Addr>,
    membership: Option<Socket>,
}

/// An open [`UdpTransport`] endpoint.
#[derive(Debug)]
pub struct UdpEndpoint {
    socket: Arc<UdpSocket>,
    task: JoinHandle<()>,
    local_addr: SocketAddrV6,
}

impl UdpEndpoint {
    /// Address the endpoint's socket is bound to.
    pub fn local_addr(&self) -> SocketAddrV6 {
        self.local_addr
    }
}

impl Drop for UdpEndpoint {
    fn drop(&mut self) {
        // The receive task holds the last other reference to the socket.
        self.task.abort();
    }
}

impl UdpTransport {
    /// Create a transport on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails if called outside a tokio runtime.
    pub fn new() -> io::Result<UdpTransport> {
        let handle = Handle::try_current().map_err(io::Error::other)?;
        Ok(UdpTransport::with_handle(handle))
    }

    /// Create a transport that spawns its receive tasks on `handle`.
    pub fn with_handle(handle: Handle) -> UdpTransport {
        UdpTransport {
            handle,
            interface: 0,
            groups: Vec::new(),
            membership: None,
        }
    }

    /// Set the interface index used for multicast membership and outgoing
    /// multicast (default: 0, the system default).
    pub fn interface(mut self, index: u32) -> UdpTransport {
        self.interface = index;
        self
    }

    /// Multicast groups joined so far.
    pub fn groups(&self) -> &[Ipv6Addr] {
        &self.groups
    }

    fn bind(&self, local_port: u16) -> io::Result<std::net::UdpSocket> {
        let socket = new_socket()?;
        let listener = local_port != 0;
        if listener {
            // Listeners share the well-known port with other clients.
            socket.set_reuse_address(true)?;
        }
        socket.set_nonblocking(true)?;
        let bind_addr = SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, local_port, 0, 0);
        socket.bind(&SocketAddr::V6(bind_addr).into())?;
        if listener {
            for group in &self.groups {
                socket.join_multicast_v6(group, self.interface)?;
                debug!(%group, interface = self.interface, "endpoint joined multicast group");
            }
        }
        Ok(socket.into())
    }
}

fn new_socket() -> io::Result<Socket> {
    let socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_only_v6(true)?;
    Ok(socket)
}

impl Transport for UdpTransport {
    type Endpoint = UdpEndpoint;

    fn open(
        &mut self,
        local_port: u16,
        receiver: DatagramReceiver,
    ) -> Result<UdpEndpoint, TransportError> {
        let std_sock = self.bind(local_port)?;
        let local_addr = match std_sock.local_addr()? {
            SocketAddr::V6(addr) => addr,
            SocketAddr::V4(addr) => {
                return Err(TransportError::Io {
                    kind: io::ErrorKind::Unsupported,
                    detail: format!("IPv6 socket bound to IPv4 address {addr}"),
                });
            }
        };
        let socket = {
            let _enter = self.handle.enter();
            Arc::new(UdpSocket::from_std(std_sock)?)
        };
        let span = debug_span!("ntp_recv", local = %local_addr);
        let task = self
            .handle
            .spawn(recv_loop(Arc::clone(&socket), receiver).instrument(span));
        debug!(%local_addr, "endpoint opened");
        Ok(UdpEndpoint {
            socket,
            task,
            local_addr,
        })
    }

    fn send(
        &mut self,
        endpoint: &mut UdpEndpoint,
        datagram: &[u8],
        dest: SocketAddrV6,
        hop_limit: u8,
    ) -> Result<(), TransportError> {
        let sock = SockRef::from(endpoint.socket.as_ref());
        if dest.ip().is_multicast() {
            sock.set_multicast_hops_v6(u32::from(hop_limit))?;
            sock.set_multicast_if_v6(self.interface)?;
        } else {
            sock.set_unicast_hops_v6(u32::from(hop_limit))?;
        }
        // Straight to the kernel: a freshly registered tokio socket reports
        // no write readiness until the reactor has polled it.
        match sock.send_to(datagram, &SocketAddr::V6(dest).into()) {
            Ok(sent) if sent == datagram.len() => {
                debug!(%dest, sent, hop_limit, "datagram sent");
                Ok(())
            }
            Ok(sent) => Err(TransportError::Io {
                kind: io::ErrorKind::WriteZero,
                detail: format!("short send: {sent} of {} bytes", datagram.len()),
            }),
            // The kernel send buffer is full.
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(TransportError::NoBuffers),
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self, endpoint: UdpEndpoint) -> Result<(), TransportError> {
        debug!(local_addr = %endpoint.local_addr, "endpoint closed");
        drop(endpoint);
        Ok(())
    }

    fn join_multicast(&mut self, group: &Ipv6Addr) -> Result<JoinOutcome, TransportError> {
        if !group.is_multicast() {
            return Ok(JoinOutcome::NotMulticast);
        }
        if self.groups.contains(group) {
            return Ok(JoinOutcome::AlreadyJoined);
        }
        let membership = match self.membership.take() {
            Some(socket) => socket,
            None => new_socket()?,
        };
        let joined = membership.join_multicast_v6(group, self.interface);
        self.membership = Some(membership);
        joined?;
        debug!(%group, interface = self.interface, "joined multicast group");
        self.groups.push(*group);
        Ok(JoinOutcome::Joined)
    }
}

async fn recv_loop(socket: Arc<UdpSocket>, receiver: DatagramReceiver) {
    let mut buf = [0u8; RECV_BUF_LEN];
    while receiver.is_current() {
        match socket.recv_from(&mut buf).await {
            Ok((len, from)) => {
                let accepted = receiver.deliver(&buf[..len]);
                debug!(%from, len, accepted, "datagram received");
            }
            // ICMP errors from an earlier send surface here on some platforms.
            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => {
                debug!("ignoring {e}");
            }
            Err(e) => {
                warn!("receive failed, stopping: {e}");
                break;
            }
        }
    }
}
