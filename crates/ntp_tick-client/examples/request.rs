// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Send one NTP request and print the server's transmit time.
//!
//! Run with:
//!   RUST_LOG=debug cargo run -p ntp_tick-client --example request -- 2001:db8::123 [port]

use std::net::Ipv6Addr;

use ntp_tick_client::driver::run_exchange;
use ntp_tick_client::udp::UdpTransport;
use ntp_tick_client::{ClientConfig, ClientEvent, ClientState, NtpClient};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let server: Ipv6Addr = args.next().as_deref().unwrap_or("::1").parse()?;
    let port: u16 = args.next().as_deref().unwrap_or("123").parse()?;

    let config = ClientConfig::default();
    let hop_limit = config.hop_limit;
    let mut client = NtpClient::with_config(UdpTransport::new()?, config);
    client.begin(server, port, hop_limit, |ev: &ClientEvent| {
        match ev.result() {
            Ok(time) => info!(%time, stratum = ?ev.packet.map(|p| p.stratum), "reply decoded"),
            Err(e) => error!(state = %ev.state, "request failed: {e}"),
        }
    })?;
    info!(%server, port, "request sent");

    match run_exchange(&mut client).await {
        ClientState::Done => {
            if let Some(time) = client.timestamp() {
                println!("{time} ({:?})", time.to_system_time());
            }
            Ok(())
        }
        state => Err(format!("exchange ended in state {state}").into()),
    }
}
