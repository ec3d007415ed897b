// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Drive an [`NtpClient`] from a tokio interval.
//!
//! The client never waits on its own; these helpers call
//! [`process`](NtpClient::process) once per configured tick period and
//! suspend only between ticks.
//!
//! # Runtime Requirements
//!
//! These functions must be called from within a Tokio runtime context.
//! The library does **not** create a runtime; you must provide one.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example() -> std::io::Result<()> {
//! let time = ntp_tick_client::driver::request("2001:db8::123".parse().unwrap(), 123).await?;
//! println!("{}", time);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::io;
use std::net::Ipv6Addr;

use tokio::time::{Interval, MissedTickBehavior};
use tracing::{Instrument, debug, debug_span};

use crate::config::ClientConfig;
use crate::error::NtpError;
use crate::event::ClientEvent;
use crate::session::NtpClient;
use crate::state::ClientState;
use crate::transport::Transport;
use crate::udp::UdpTransport;
use crate::unix_time::Timeval;

fn ticker(config: &ClientConfig) -> Interval {
    let mut interval = tokio::time::interval_at(
        tokio::time::Instant::now() + config.tick_period,
        config.tick_period,
    );
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Tick a unicast exchange until it reaches a terminal state.
///
/// Returns the final state. Returns immediately, without ticking, if no
/// unicast exchange is in flight.
pub async fn run_exchange<T: Transport>(client: &mut NtpClient<T>) -> ClientState {
    let mut interval = ticker(client.config());
    while matches!(
        client.state(),
        ClientState::Sent | ClientState::Received | ClientState::Truncated
    ) {
        interval.tick().await;
        client.process();
    }
    debug!(state = %client.state(), "exchange finished");
    client.state()
}

/// Tick a listening client until `shutdown` resolves, then shut it down.
///
/// Also returns, after the same shutdown, if the session is not listening,
/// or stops listening on its own.
///
/// # Errors
///
/// Returns the error of the final [`NtpClient::shutdown`].
pub async fn run_listener<T, F>(client: &mut NtpClient<T>, shutdown: F) -> Result<(), NtpError>
where
    T: Transport,
    F: Future<Output = ()>,
{
    let mut interval = ticker(client.config());
    tokio::pin!(shutdown);
    while matches!(
        client.state(),
        ClientState::Listening | ClientState::ReceivedBroadcast | ClientState::TruncatedBroadcast
    ) {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("listener shutdown requested");
                break;
            }
            _ = interval.tick() => client.process(),
        }
    }
    client.shutdown()
}

/// Send one request to `address`:`port` over a [`UdpTransport`] with the
/// default configuration and wait for the reply.
///
/// # Errors
///
/// The typed [`NtpError`] is reachable through `io::Error::get_ref()`.
pub async fn request(address: Ipv6Addr, port: u16) -> io::Result<Timeval> {
    request_with_config(address, port, ClientConfig::default()).await
}

/// Like [`request`], with explicit configuration.
///
/// # Errors
///
/// The typed [`NtpError`] is reachable through `io::Error::get_ref()`.
pub async fn request_with_config(
    address: Ipv6Addr,
    port: u16,
    config: ClientConfig,
) -> io::Result<Timeval> {
    let span = debug_span!("ntp_request", %address, port);
    request_inner(address, port, config).instrument(span).await
}

/// Inner async implementation without the tracing span.
async fn request_inner(
    address: Ipv6Addr,
    port: u16,
    config: ClientConfig,
) -> io::Result<Timeval> {
    let transport = UdpTransport::new()?.interface(config.interface);
    let hop_limit = config.hop_limit;
    let mut client = NtpClient::with_config(transport, config);
    client.begin(address, port, hop_limit, |ev: &ClientEvent| {
        debug!(state = %ev.state, time = ?ev.time, "request completed");
    })?;
    run_exchange(&mut client).await;
    match client.result() {
        Some(Ok(time)) => Ok(time),
        Some(Err(e)) => Err(e.into()),
        None => Err(NtpError::CommunicationError.into()),
    }
}
