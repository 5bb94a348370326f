pub mod address;
#[cfg(feature = "udp")]
pub mod udp;

use core::net::SocketAddrV6;

use crate::error::Result;

/// Best-effort, unordered, unreliable datagram transport.
///
/// Sends are fire-and-forget: a failure is reported to the caller for
/// logging but carries no delivery guarantee either way.
#[allow(async_fn_in_trait)]
pub trait Datagram {
    async fn send_to(&mut self, payload: &[u8], destination: SocketAddrV6) -> Result<()>;

    /// Wait for the next inbound datagram, if the medium delivers one.
    async fn receive_from(&mut self, buffer: &mut [u8]) -> Result<Option<(usize, SocketAddrV6)>>;
}
