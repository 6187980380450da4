//! ARP-for-IPv4-over-Ethernet header view (§4.A, §6).
//!
//! `hrd=1, pro=0x0800, hln=6, pln=4, op, sha, sip, tha, tip`.

use super::ethernet::MacAddr;
use super::ipv4::Ipv4Addr;

const HTYPE_ETHERNET: u16 = 1;
const PTYPE_IPV4: u16 = 0x0800;
const HLEN: u8 = 6;
const PLEN: u8 = 4;

pub const OP_REQUEST: u16 = 1;
pub const OP_REPLY: u16 = 2;

/// Size of the ARP-for-IPv4-over-Ethernet payload.
pub const PACKET_LEN: usize = 28;

/// A read-only view over an ARP packet (the Ethernet payload).
#[derive(Debug, Clone, Copy)]
pub struct ArpView<'a> {
    buf: &'a [u8],
}

impl<'a> ArpView<'a> {
    /// Parses `buf`, validating hardware/protocol type and address lengths.
    /// Returns `None` for anything other than Ethernet/IPv4 ARP.
    pub fn parse(buf: &'a [u8]) -> Option<Self> {
        if buf.len() < PACKET_LEN {
            return None;
        }
        let htype = u16::from_be_bytes([buf[0], buf[1]]);
        let ptype = u16::from_be_bytes([buf[2], buf[3]]);
        let hlen = buf[4];
        let plen = buf[5];
        if htype != HTYPE_ETHERNET || ptype != PTYPE_IPV4 || hlen != HLEN || plen != PLEN {
            return None;
        }
        Some(ArpView { buf })
    }

    pub fn operation(&self) -> u16 {
        u16::from_be_bytes([self.buf[6], self.buf[7]])
    }

    pub fn sender_mac(&self) -> MacAddr {
        MacAddr::from_slice(&self.buf[8..14]).unwrap()
    }

    pub fn sender_ip(&self) -> Ipv4Addr {
        Ipv4Addr::from_slice(&self.buf[14..18]).unwrap()
    }

    pub fn target_mac(&self) -> MacAddr {
        MacAddr::from_slice(&self.buf[18..24]).unwrap()
    }

    pub fn target_ip(&self) -> Ipv4Addr {
        Ipv4Addr::from_slice(&self.buf[24..28]).unwrap()
    }
}

/// Builds a raw ARP-for-IPv4 packet (no Ethernet header).
#[allow(clippy::too_many_arguments)]
pub fn build(
    op: u16,
    sender_mac: MacAddr,
    sender_ip: Ipv4Addr,
    target_mac: MacAddr,
    target_ip: Ipv4Addr,
) -> Vec<u8> {
    let mut pkt = Vec::with_capacity(PACKET_LEN);
    pkt.extend_from_slice(&HTYPE_ETHERNET.to_be_bytes());
    pkt.extend_from_slice(&PTYPE_IPV4.to_be_bytes());
    pkt.push(HLEN);
    pkt.push(PLEN);
    pkt.extend_from_slice(&op.to_be_bytes());
    pkt.extend_from_slice(sender_mac.as_bytes());
    pkt.extend_from_slice(&sender_ip.octets());
    pkt.extend_from_slice(target_mac.as_bytes());
    pkt.extend_from_slice(&target_ip.octets());
    pkt
}
