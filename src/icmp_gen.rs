//! ICMP generator (§4.H) — builds echo replies and type-3/11 error frames,
//! quoting the original packet where required.

use std::sync::atomic::{AtomicU16, Ordering};

use crate::iface::Interface;
use crate::wire::ethernet::{self, MacAddr};
use crate::wire::ipv4::{self, Ipv4Addr};
use crate::wire::icmp;

static NEXT_IP_ID: AtomicU16 = AtomicU16::new(1);

fn next_ip_id() -> u16 {
    NEXT_IP_ID.fetch_add(1, Ordering::Relaxed)
}

/// Builds a full Ethernet frame carrying an ICMP echo reply (type 0, code
/// 0), preserving the identifier, sequence, and payload of the original
/// echo request (§4.G "Local delivery check", §8 "Round-trips").
pub fn build_echo_reply(
    responding_iface: &Interface,
    reply_dst_mac: MacAddr,
    reply_dst_ip: Ipv4Addr,
    identifier: u16,
    sequence: u16,
    echo_payload: &[u8],
) -> Vec<u8> {
    let icmp_body = icmp::build_echo_reply(identifier, sequence, echo_payload);
    build_frame(responding_iface, reply_dst_mac, reply_dst_ip, &icmp_body)
}

/// Builds a full Ethernet frame carrying an ICMP error (type 3 or 11),
/// quoting up to 28 bytes of `original_ip_packet` (§4.H).
pub fn build_error(
    responding_iface: &Interface,
    reply_dst_mac: MacAddr,
    reply_dst_ip: Ipv4Addr,
    icmp_type: u8,
    code: u8,
    original_ip_packet: &[u8],
) -> Vec<u8> {
    let icmp_body = icmp::build_error(icmp_type, code, original_ip_packet);
    build_frame(responding_iface, reply_dst_mac, reply_dst_ip, &icmp_body)
}

/// §7: "ICMP errors are themselves never generated in response to ICMP
/// errors, to a destination that is a broadcast/multicast address, or to a
/// non-initial fragment." Fragmentation is out of scope, so only the first
/// two conditions are checked here.
pub fn should_suppress_error(ip: &ipv4::Ipv4View) -> bool {
    if ip.dst().is_broadcast() || ip.dst().is_multicast() {
        return true;
    }
    if ip.protocol() == ipv4::PROTO_ICMP {
        if let Some(inner) = icmp::EchoView::parse(ip.payload()) {
            let t = inner.icmp_type();
            if t != icmp::TYPE_ECHO_REQUEST && t != icmp::TYPE_ECHO_REPLY {
                return true;
            }
        }
    }
    false
}

fn build_frame(
    responding_iface: &Interface,
    reply_dst_mac: MacAddr,
    reply_dst_ip: Ipv4Addr,
    icmp_body: &[u8],
) -> Vec<u8> {
    let mut frame = Vec::with_capacity(
        ethernet::HEADER_LEN + ipv4::MIN_HEADER_LEN + icmp_body.len(),
    );
    ethernet::push_header(
        &mut frame,
        reply_dst_mac,
        responding_iface.mac,
        ethernet::ETHERTYPE_IPV4,
    );
    ipv4::push_header(
        &mut frame,
        responding_iface.ipv4,
        reply_dst_ip,
        ipv4::PROTO_ICMP,
        ipv4::DEFAULT_TTL,
        next_ip_id(),
        icmp_body.len(),
    );
    frame.extend_from_slice(icmp_body);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{ethernet::EthernetView, icmp::EchoView, ipv4::Ipv4View};

    fn iface() -> Interface {
        Interface::new(
            "eth0",
            MacAddr::new([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x01]),
            Ipv4Addr::new(10, 0, 1, 1),
            Ipv4Addr::new(255, 255, 255, 0),
        )
    }

    #[test]
    fn echo_reply_frame_is_well_formed() {
        let iface = iface();
        let client_mac = MacAddr::new([0xbb; 6]);
        let client_ip = Ipv4Addr::new(10, 0, 1, 50);
        let frame = build_echo_reply(&iface, client_mac, client_ip, 7, 3, b"hello");

        let eth = EthernetView::parse(&frame).unwrap();
        assert_eq!(eth.dst(), client_mac);
        assert_eq!(eth.src(), iface.mac);
        let ip = Ipv4View::parse(eth.payload()).unwrap();
        assert_eq!(ip.src(), iface.ipv4);
        assert_eq!(ip.dst(), client_ip);
        assert_eq!(ip.ttl(), ipv4::DEFAULT_TTL);
        let echo = EchoView::parse(ip.payload()).unwrap();
        assert_eq!(echo.identifier(), 7);
        assert_eq!(echo.sequence(), 3);
        assert_eq!(echo.payload(), b"hello");
    }

    #[test]
    fn error_frame_quotes_original_packet() {
        let iface = iface();
        let client_mac = MacAddr::new([0xbb; 6]);
        let client_ip = Ipv4Addr::new(10, 0, 1, 50);
        let original = vec![0x45; 40];
        let frame = build_error(
            &iface,
            client_mac,
            client_ip,
            icmp::TYPE_TIME_EXCEEDED,
            icmp::CODE_TTL_EXPIRED_IN_TRANSIT,
            &original,
        );
        let eth = EthernetView::parse(&frame).unwrap();
        let ip = Ipv4View::parse(eth.payload()).unwrap();
        assert_eq!(ip.payload().len(), icmp::ERROR_HEADER_LEN + icmp::QUOTED_LEN);
    }
}
