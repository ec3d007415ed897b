// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Listen for NTP broadcasts on the link-local multicast group until Ctrl-C.
//!
//! Binding port 123 usually needs elevated privileges; pass another port to
//! listen elsewhere.
//!
//! Run with:
//!   RUST_LOG=debug cargo run -p ntp_tick-client --example listen -- [port] [interface]

use ntp_tick_client::driver::run_listener;
use ntp_tick_client::udp::UdpTransport;
use ntp_tick_client::{ClientConfig, ClientEvent, NtpClient};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let port: u16 = args.next().as_deref().unwrap_or("123").parse()?;
    let interface: u32 = args.next().as_deref().unwrap_or("0").parse()?;

    let config = ClientConfig::builder().interface(interface).build()?;
    let group = config.multicast_group;
    let transport = UdpTransport::new()?.interface(interface);
    let mut client = NtpClient::with_config(transport, config);

    client.listen(group, port, |ev: &ClientEvent| match ev.result() {
        Ok(time) => info!(%time, "broadcast update"),
        Err(e) => warn!("broadcast dropped: {e}"),
    })?;
    info!(%group, port, interface, "listening");

    run_listener(&mut client, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("ctrl-c handler failed: {e}");
        }
    })
    .await?;
    info!(state = %client.state(), "listener stopped");
    Ok(())
}
