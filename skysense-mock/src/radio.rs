use std::net::SocketAddrV6;

use skysense_node::error::{Error, Result};
use skysense_node::net::Datagram;
use tokio::sync::mpsc;

struct Frame {
    payload: Vec<u8>,
    source: SocketAddrV6,
}

/// One end of a simulated single-hop radio link.
///
/// The medium is promiscuous the way a shared radio channel is: every frame
/// reaches the only neighbor, whatever destination the sender derived. The
/// destination still travels with the log line on the sending side, so the
/// simulation shows where a real stack would have routed it.
pub struct Endpoint {
    address: SocketAddrV6,
    tx: mpsc::Sender<Frame>,
    rx: mpsc::Receiver<Frame>,
}

pub fn link(a: SocketAddrV6, b: SocketAddrV6, capacity: usize) -> (Endpoint, Endpoint) {
    let (a_tx, b_rx) = mpsc::channel(capacity);
    let (b_tx, a_rx) = mpsc::channel(capacity);

    (
        Endpoint {
            address: a,
            tx: a_tx,
            rx: a_rx,
        },
        Endpoint {
            address: b,
            tx: b_tx,
            rx: b_rx,
        },
    )
}

impl Datagram for Endpoint {
    async fn send_to(&mut self, payload: &[u8], _destination: SocketAddrV6) -> Result<()> {
        self.tx
            .send(Frame {
                payload: payload.to_vec(),
                source: self.address,
            })
            .await
            .map_err(|_| Error::NetworkError)
    }

    async fn receive_from(&mut self, buffer: &mut [u8]) -> Result<Option<(usize, SocketAddrV6)>> {
        match self.rx.recv().await {
            Some(frame) => {
                if frame.payload.len() > buffer.len() {
                    return Err(Error::BufferTooSmall);
                }
                buffer[..frame.payload.len()].copy_from_slice(&frame.payload);
                Ok(Some((frame.payload.len(), frame.source)))
            }
            None => Ok(None),
        }
    }
}
