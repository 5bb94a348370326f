use core::net::SocketAddrV6;

use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpAddress, IpEndpoint, Stack};

use crate::error::{Error, Result};

use super::Datagram;

/// Report link over the device's IPv6/UDP stack.
pub struct UdpDatagram {
    socket: UdpSocket<'static>,
}

impl UdpDatagram {
    pub fn new(
        stack: Stack<'static>,
        rx_meta: &'static mut [PacketMetadata],
        rx_buffer: &'static mut [u8],
        tx_meta: &'static mut [PacketMetadata],
        tx_buffer: &'static mut [u8],
    ) -> Self {
        let socket = UdpSocket::new(stack, rx_meta, rx_buffer, tx_meta, tx_buffer);

        Self { socket }
    }

    pub fn bind(&mut self, local_port: u16) -> Result<()> {
        self.socket
            .bind(local_port)
            .map_err(|_| Error::InitializationError)?;
        Ok(())
    }

    pub fn is_bound(&self) -> bool {
        self.socket.is_open()
    }

    pub fn close(&mut self) {
        self.socket.close();
    }
}

fn to_endpoint(addr: SocketAddrV6) -> IpEndpoint {
    IpEndpoint::new(IpAddress::Ipv6(*addr.ip()), addr.port())
}

impl Datagram for UdpDatagram {
    async fn send_to(&mut self, payload: &[u8], destination: SocketAddrV6) -> Result<()> {
        self.socket
            .send_to(payload, to_endpoint(destination))
            .await
            .map_err(|_| Error::NetworkError)?;
        Ok(())
    }

    async fn receive_from(&mut self, buffer: &mut [u8]) -> Result<Option<(usize, SocketAddrV6)>> {
        match self.socket.recv_from(buffer).await {
            Ok((len, meta)) => {
                let ip = match meta.endpoint.addr {
                    IpAddress::Ipv6(ip) => ip,
                    #[allow(unreachable_patterns)]
                    _ => return Ok(None),
                };
                Ok(Some((len, SocketAddrV6::new(ip, meta.endpoint.port, 0, 0))))
            }
            Err(_) => Ok(None),
        }
    }
}
