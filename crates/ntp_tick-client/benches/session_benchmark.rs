// Benchmarks for the client state machine's per-datagram and per-tick paths

use std::hint::black_box;
use std::net::{Ipv6Addr, SocketAddrV6};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ntp_tick_client::error::TransportError;
use ntp_tick_client::transport::{DatagramReceiver, JoinOutcome, Transport};
use ntp_tick_client::{ClientConfig, ClientEvent, NtpClient};

#[derive(Default)]
struct NullTransport {
    receiver: Option<DatagramReceiver>,
}

impl Transport for NullTransport {
    type Endpoint = ();

    fn open(&mut self, _: u16, rx: DatagramReceiver) -> Result<(), TransportError> {
        self.receiver = Some(rx);
        Ok(())
    }

    fn send(&mut self, _: &mut (), _: &[u8], _: SocketAddrV6, _: u8) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&mut self, _: ()) -> Result<(), TransportError> {
        Ok(())
    }

    fn join_multicast(&mut self, _: &Ipv6Addr) -> Result<JoinOutcome, TransportError> {
        Ok(JoinOutcome::Joined)
    }
}

fn make_reply() -> [u8; 48] {
    let mut reply = [0u8; 48];
    reply[0] = 0x1C;
    reply[40..44].copy_from_slice(&3_913_056_001u32.to_be_bytes());
    reply[44..48].copy_from_slice(&0x8000_0000u32.to_be_bytes());
    reply
}

fn bench_unicast_exchange(c: &mut Criterion) {
    let reply = make_reply();
    let mut client = NtpClient::new(NullTransport::default());
    c.bench_function("unicast_exchange", |b| {
        b.iter(|| {
            client
                .begin(Ipv6Addr::LOCALHOST, 123, 64, |_: &ClientEvent| {})
                .unwrap();
            if let Some(rx) = &client.transport().receiver {
                rx.deliver(black_box(&reply));
            }
            client.process();
            black_box(client.timestamp());
        })
    });
}

fn bench_broadcast_update(c: &mut Criterion) {
    let reply = make_reply();
    let mut client = NtpClient::new(NullTransport::default());
    client
        .listen(Ipv6Addr::LOCALHOST, 123, |_: &ClientEvent| {})
        .unwrap();
    let rx = client.transport().receiver.clone().unwrap();
    c.bench_function("broadcast_update", |b| {
        b.iter(|| {
            rx.deliver(black_box(&reply));
            client.process();
        })
    });
}

fn bench_idle_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("sent_ticks");

    for ticks in [10u32, 100, 300].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(ticks), ticks, |b, &ticks| {
            let config = ClientConfig::builder().timeout_ticks(ticks).build().unwrap();
            let mut client = NtpClient::with_config(NullTransport::default(), config);
            b.iter(|| {
                client
                    .begin(Ipv6Addr::LOCALHOST, 123, 64, |_: &ClientEvent| {})
                    .unwrap();
                while !client.is_done() {
                    client.process();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_unicast_exchange,
    bench_broadcast_update,
    bench_idle_ticks
);
criterion_main!(benches);
