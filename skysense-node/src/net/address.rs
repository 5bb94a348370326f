use core::net::Ipv6Addr;

/// Port both ends of the report link use.
pub const REPORT_PORT: u16 = 1234;

/// Fixed host suffix of the report sink, the lower four hextets of its
/// address. The sink keeps this identifier across prefix renumbering.
pub const PEER_SUFFIX: [u16; 4] = [0x0201, 0x0001, 0x0001, 0x0001];

/// Source of the current 64-bit network prefix, as advertised by the
/// routing infrastructure. Queried anew before every send so a renumbered
/// prefix is picked up without restarting the agent.
pub trait PrefixSource {
    fn default_prefix(&self) -> [u16; 4];
}

/// Prefix known at configuration time.
#[derive(Debug, Clone, Copy)]
pub struct StaticPrefix(pub [u16; 4]);

impl PrefixSource for StaticPrefix {
    fn default_prefix(&self) -> [u16; 4] {
        self.0
    }
}

/// Address of the report sink under the given prefix.
pub fn peer_address(prefix: [u16; 4]) -> Ipv6Addr {
    Ipv6Addr::new(
        prefix[0],
        prefix[1],
        prefix[2],
        prefix[3],
        PEER_SUFFIX[0],
        PEER_SUFFIX[1],
        PEER_SUFFIX[2],
        PEER_SUFFIX[3],
    )
}

/// Address a node assigns itself at boot: network prefix plus its own
/// hardware-derived interface identifier.
pub fn autoconfigured(prefix: [u16; 4], interface_id: [u16; 4]) -> Ipv6Addr {
    Ipv6Addr::new(
        prefix[0],
        prefix[1],
        prefix[2],
        prefix[3],
        interface_id[0],
        interface_id[1],
        interface_id[2],
        interface_id[3],
    )
}
