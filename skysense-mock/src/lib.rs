use std::net::{Ipv6Addr, SocketAddrV6};
use std::sync::Arc;

use embassy_time::Duration;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use skysense_node::net::Datagram;
use skysense_node::net::address::{self, REPORT_PORT, StaticPrefix};
use skysense_node::responder::{ResourceId, keep_alive};
use skysense_node::sensor::SyntheticSensor;
use skysense_node::{PeriodicSchedule, Report, Reporter, Responder};
use tokio::net::UdpSocket;

use crate::radio::link;
use crate::settings::Settings;
use crate::simulate::SimulatedBus;

mod radio;
pub mod settings;
mod simulate;

pub async fn run(settings: &Arc<Settings>) {
    let prefix = parse_prefix(&settings.reporter.prefix).expect("Invalid network prefix");

    let node_address = address::autoconfigured(prefix, settings.reporter.interface_id);
    tracing::info!("IPv6 address: {}", node_address);

    let sink_address = SocketAddrV6::new(address::peer_address(prefix), REPORT_PORT, 0, 0);
    let (node_end, mut sink_end) = link(
        SocketAddrV6::new(node_address, REPORT_PORT, 0, 0),
        sink_address,
        16,
    );

    // The fixed neighbor: receives each report and logs it.
    tokio::spawn(async move {
        let mut buffer = [0u8; 128];

        loop {
            match sink_end.receive_from(&mut buffer).await {
                Ok(Some((len, source))) => match Report::parse(&buffer[..len]) {
                    Ok(report) => tracing::info!(
                        "Received from {}: Temperatura: {}, Humedad: {}",
                        source,
                        report.temperature,
                        report.humidity
                    ),
                    Err(err) => tracing::warn!("Undecodable report from {}: {}", source, err),
                },
                Ok(None) => break,
                Err(err) => tracing::warn!("Radio receive failed: {}", err),
            }
        }
    });

    // The query responder, reachable over a plain UDP socket standing in
    // for the CoAP engine's transport: datagram in = resource path,
    // datagram out = JSON body.
    let listen = settings.responder.listen.clone();
    let bus = SimulatedBus::new(seeded_rng(settings.reporter.seed, 2));
    tokio::spawn(async move {
        let socket = UdpSocket::bind(&listen)
            .await
            .expect("Failed to bind responder socket");
        tracing::info!("Responder listening on {}", listen);

        for resource in ResourceId::ALL {
            tracing::info!("Registered {} [{}]", resource.path(), resource.attributes());
        }

        let mut responder = Responder::new(bus);
        let mut request = [0u8; 64];
        let mut body = [0u8; 64];

        loop {
            let (len, peer) = match socket.recv_from(&mut request).await {
                Ok(received) => received,
                Err(err) => {
                    tracing::warn!("Responder receive failed: {}", err);
                    continue;
                }
            };

            let Ok(path) = std::str::from_utf8(&request[..len]) else {
                tracing::debug!("Non-UTF8 request from {}", peer);
                continue;
            };

            // Unknown paths are the framework's problem, not the handlers'.
            let Some(resource) = ResourceId::from_path(path.trim()) else {
                tracing::debug!("Unknown resource '{}' from {}", path.trim(), peer);
                continue;
            };

            match responder.handle(resource, &mut body) {
                Ok(response) => {
                    if let Err(err) = socket.send_to(&body[..response.len], peer).await {
                        tracing::warn!("Responder send failed: {}", err);
                    }
                }
                Err(err) => tracing::warn!("GET {} failed: {}", resource.path(), err),
            }
        }
    });

    // Background wake-up tick, as on the device.
    tokio::spawn(async {
        keep_alive().await;
    });

    let schedule = PeriodicSchedule::new(
        Duration::from_secs(settings.reporter.period_secs),
        Duration::from_secs(settings.reporter.jitter_bound_secs),
    )
    .expect("Invalid reporter schedule");

    let mut reporter = Reporter::new(
        node_end,
        SyntheticSensor::new(seeded_rng(settings.reporter.seed, 1)),
        StaticPrefix(prefix),
        schedule,
        seeded_rng(settings.reporter.seed, 0),
    );

    reporter.run().await
}

/// Independent generator per concern so a fixed seed reproduces each
/// stream regardless of the others' draw order.
fn seeded_rng(seed: Option<u64>, stream: u64) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(stream)),
        None => SmallRng::from_rng(&mut rand::rng()),
    }
}

fn parse_prefix(prefix: &str) -> Result<[u16; 4], std::net::AddrParseError> {
    let address: Ipv6Addr = prefix.parse()?;
    let segments = address.segments();

    Ok([segments[0], segments[1], segments[2], segments[3]])
}
