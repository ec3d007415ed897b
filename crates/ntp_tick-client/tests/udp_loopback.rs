// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests of `UdpTransport` and the drivers over `::1`.
//!
//! Hosts without IPv6 loopback skip these tests.

#![cfg(feature = "tokio")]

use std::net::{Ipv6Addr, SocketAddr};
use std::time::Duration;

use ntp_tick_client::driver::{request_with_config, run_exchange, run_listener};
use ntp_tick_client::error::NtpError;
use ntp_tick_client::udp::UdpTransport;
use ntp_tick_client::{ClientConfig, ClientEvent, ClientState, NtpClient, Timeval};
use tokio::net::UdpSocket;

/// Bind a UDP socket on `[::1]:0`, or `None` if IPv6 loopback is unavailable.
async fn loopback_socket() -> Option<UdpSocket> {
    match UdpSocket::bind((Ipv6Addr::LOCALHOST, 0)).await {
        Ok(sock) => Some(sock),
        Err(e) => {
            eprintln!("skipping: IPv6 loopback unavailable: {e}");
            None
        }
    }
}

fn reply_for(request: &[u8], unix_secs: u32, usecs: u32) -> [u8; 48] {
    let mut reply = [0u8; 48];
    reply[0] = 0x1C;
    reply[1] = 1;
    // Echo the request's transmit timestamp as origin.
    reply[24..32].copy_from_slice(&request[40..48]);
    reply[40..44].copy_from_slice(&(unix_secs + 2_208_988_800).to_be_bytes());
    reply[44..48].copy_from_slice(&(usecs * 4295).to_be_bytes());
    reply
}

fn fast_config(timeout_ticks: u32) -> ClientConfig {
    ClientConfig::builder()
        .tick_period(Duration::from_millis(10))
        .timeout_ticks(timeout_ticks)
        .build()
        .unwrap()
}

#[tokio::test]
async fn request_reply_over_loopback() {
    let Some(server) = loopback_socket().await else {
        return;
    };
    let port = server.local_addr().unwrap().port();
    let server_task = tokio::spawn(async move {
        let mut buf = [0u8; 128];
        let (len, from) = server.recv_from(&mut buf).await.unwrap();
        assert_eq!(len, 48);
        assert_eq!(buf[0], 0x1B);
        server
            .send_to(&reply_for(&buf[..48], 1_000_000_000, 250_000), from)
            .await
            .unwrap();
    });

    let time = request_with_config(Ipv6Addr::LOCALHOST, port, fast_config(300))
        .await
        .unwrap();
    assert_eq!(time, Timeval::new(1_000_000_000, 250_000));
    server_task.await.unwrap();
}

#[tokio::test]
async fn truncated_reply_over_loopback() {
    let Some(server) = loopback_socket().await else {
        return;
    };
    let port = server.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut buf = [0u8; 128];
        let (_, from) = server.recv_from(&mut buf).await.unwrap();
        server.send_to(&[0u8; 47], from).await.unwrap();
    });

    let err = request_with_config(Ipv6Addr::LOCALHOST, port, fast_config(300))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    let inner = err.get_ref().and_then(|e| e.downcast_ref::<NtpError>());
    assert_eq!(inner, Some(&NtpError::CommunicationError));
}

#[tokio::test]
async fn silent_server_times_out() {
    let Some(server) = loopback_socket().await else {
        return;
    };
    let port = server.local_addr().unwrap().port();

    let mut client = NtpClient::with_config(UdpTransport::new().unwrap(), fast_config(5));
    client
        .begin(Ipv6Addr::LOCALHOST, port, 64, |_: &ClientEvent| {})
        .unwrap();
    assert_eq!(run_exchange(&mut client).await, ClientState::Timeout);

    // The request did go out.
    let mut buf = [0u8; 128];
    let (len, _) = server.recv_from(&mut buf).await.unwrap();
    assert_eq!(len, 48);
    drop(server);
}

#[tokio::test]
async fn listener_receives_unicast_broadcasts() {
    // Find a free port, then let the listener bind it.
    let Some(probe) = loopback_socket().await else {
        return;
    };
    let port = probe.local_addr().unwrap().port();
    drop(probe);

    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
    let mut client = NtpClient::with_config(UdpTransport::new().unwrap(), fast_config(1));
    // ::1 is not a multicast group; the listener still receives on the port.
    client
        .listen(Ipv6Addr::LOCALHOST, port, move |ev: &ClientEvent| {
            let _ = events_tx.send(ev.time);
        })
        .unwrap();
    assert!(client.transport().groups().is_empty());

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let sender = tokio::spawn(async move {
        let sock = UdpSocket::bind((Ipv6Addr::LOCALHOST, 0)).await.unwrap();
        let dest = SocketAddr::from((Ipv6Addr::LOCALHOST, port));
        for secs in [10u32, 20, 30] {
            sock.send_to(&reply_for(&[0u8; 48], secs, 0), dest)
                .await
                .unwrap();
            let got = events_rx.recv().await.unwrap();
            assert_eq!(got, Some(Timeval::new(secs as i64, 0)));
        }
        let _ = stop_tx.send(());
    });

    tokio::time::timeout(
        Duration::from_secs(10),
        run_listener(&mut client, async {
            let _ = stop_rx.await;
        }),
    )
    .await
    .unwrap()
    .unwrap();
    sender.await.unwrap();
    assert_eq!(client.state(), ClientState::Done);
}

#[tokio::test]
async fn closed_endpoint_stops_receiving() {
    let Some(server) = loopback_socket().await else {
        return;
    };
    let port = server.local_addr().unwrap().port();

    let mut client = NtpClient::with_config(UdpTransport::new().unwrap(), fast_config(300));
    client
        .begin(Ipv6Addr::LOCALHOST, port, 64, |_: &ClientEvent| {})
        .unwrap();
    let mut buf = [0u8; 128];
    let (_, from) = server.recv_from(&mut buf).await.unwrap();
    client.shutdown().unwrap();
    assert_eq!(client.state(), ClientState::Done);

    server
        .send_to(&reply_for(&buf[..48], 1, 0), from)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    client.process();
    assert_eq!(client.state(), ClientState::Done);
    assert_eq!(client.timestamp(), None);
}

#[tokio::test]
async fn refused_join_leaves_requests_working() {
    let Some(server) = loopback_socket().await else {
        return;
    };
    let port = server.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut buf = [0u8; 128];
        let (_, from) = server.recv_from(&mut buf).await.unwrap();
        server
            .send_to(&reply_for(&buf[..48], 7, 0), from)
            .await
            .unwrap();
    });

    // No interface has this index, so the join is refused.
    let transport = UdpTransport::new().unwrap().interface(999_999);
    let mut client = NtpClient::with_config(transport, fast_config(300));
    let group: Ipv6Addr = "ff02::101".parse().unwrap();
    let err = client
        .listen(group, port, |_: &ClientEvent| {})
        .unwrap_err();
    assert!(matches!(err, NtpError::Transport(_)));
    assert_eq!(client.state(), ClientState::Idle);
    assert!(client.transport().groups().is_empty());

    client
        .begin(Ipv6Addr::LOCALHOST, port, 64, |_: &ClientEvent| {})
        .unwrap();
    assert_eq!(run_exchange(&mut client).await, ClientState::Done);
    assert_eq!(client.timestamp(), Some(Timeval::new(7, 0)));
}
