// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

/*!
Tick-driven NTP client for event-driven UDP transports.

An [`NtpClient`] owns one unicast request or one broadcast subscription at a
time. It never blocks: the transport classifies arriving datagrams through a
[`DatagramReceiver`](transport::DatagramReceiver), and the caller calls
[`NtpClient::process`] on a fixed tick (100 ms by default) to time out,
decode and report. Outcomes are delivered to an [`EventHandler`], which is
implemented for plain closures.

The client runs on any [`Transport`](transport::Transport). With the `tokio`
feature a socket2/tokio IPv6 implementation, [`udp::UdpTransport`], and tick
drivers in [`driver`] are included.

# Example

```rust,no_run
# async fn example() -> std::io::Result<()> {
let time = ntp_tick_client::driver::request("2001:db8::123".parse().unwrap(), 123).await?;
println!("server time: {time}");
# Ok(())
# }
```

# Feature Flags

| Feature | Default | Description |
|---------|---------|-------------|
| `tokio` | yes | UDPv6 transport on tokio + socket2, and async tick drivers. |
*/

#![warn(missing_docs)]

// Re-export protocol types from ntp_tick_proto for convenience.
pub use ntp_tick_proto::{codec, protocol, unix_time};

/// Error types for the client and its transports.
pub mod error;

/// Client tunables and their defaults.
pub mod config;

/// Session states and their one-byte codes.
pub mod state;

/// Events raised by the client and the handler contract.
pub mod event;

/// The transport capability the client runs on.
pub mod transport;

mod session;

/// IPv6 UDP transport on tokio and socket2.
#[cfg(feature = "tokio")]
pub mod udp;

/// Async drivers that call `process()` on a tokio interval.
#[cfg(feature = "tokio")]
pub mod driver;

pub use config::ClientConfig;
pub use error::{NtpError, TransportError};
pub use event::{ClientEvent, EventHandler};
pub use session::NtpClient;
pub use state::ClientState;
pub use unix_time::Timeval;
