//! Forwarding pipeline (§4.G) — classify, validate, mutate, dispatch.

use std::time::Instant;

use tracing::{debug, warn};

use crate::icmp_gen;
use crate::router::Router;
use crate::wire::arp::{self, ArpView};
use crate::wire::ethernet::{self, EthernetView, MacAddr};
use crate::wire::icmp;
use crate::wire::ipv4::{self, Ipv4View};

/// Entry point for a received frame (§4.G).
pub fn handle_frame(router: &Router, ingress_iface: &str, frame: &[u8]) {
    let Some(eth) = EthernetView::parse(frame) else {
        debug!(iface = ingress_iface, len = frame.len(), "frame shorter than ethernet header, dropped");
        return;
    };

    match eth.ethertype() {
        ethernet::ETHERTYPE_ARP => handle_arp(router, ingress_iface, &eth),
        ethernet::ETHERTYPE_IPV4 => handle_ipv4(router, ingress_iface, frame, &eth),
        other => {
            debug!(iface = ingress_iface, ethertype = format!("{other:#06x}"), "unknown ethertype, dropped");
        }
    }
}

fn send(router: &Router, iface: &str, frame: &[u8]) {
    if let Err(e) = router.transport.send_frame(iface, frame) {
        warn!(iface, error = %e, "send_frame failed");
    }
}

// ── ARP branch ──────────────────────────────────────────────

fn handle_arp(router: &Router, ingress_iface: &str, eth: &EthernetView) {
    let Some(pkt) = ArpView::parse(eth.payload()) else {
        debug!(iface = ingress_iface, "malformed ARP payload, dropped");
        return;
    };

    if !router.interfaces.is_local_ip(pkt.target_ip()) {
        debug!(iface = ingress_iface, target = %pkt.target_ip(), "ARP for non-local target, dropped");
        return;
    }

    match pkt.operation() {
        arp::OP_REQUEST => {
            let Some(target_iface) = router.interfaces.lookup_by_ip(pkt.target_ip()) else {
                return;
            };
            let arp_reply = arp::build(
                arp::OP_REPLY,
                target_iface.mac,
                target_iface.ipv4,
                pkt.sender_mac(),
                pkt.sender_ip(),
            );
            let mut frame = Vec::with_capacity(ethernet::HEADER_LEN + arp_reply.len());
            ethernet::push_header(&mut frame, pkt.sender_mac(), target_iface.mac, ethernet::ETHERTYPE_ARP);
            frame.extend_from_slice(&arp_reply);
            send(router, ingress_iface, &frame);
        }
        arp::OP_REPLY => {
            let now = Instant::now();
            if let Some(pending) = router.arp.insert(pkt.sender_ip(), pkt.sender_mac(), now) {
                let Some(out_iface) = router.interfaces.lookup_by_name(&pending.out_iface) else {
                    warn!(iface = pending.out_iface, "pending request references unknown interface");
                    return;
                };
                let out_iface_name = out_iface.name.clone();
                let out_iface_mac = out_iface.mac;
                for mut buffered in pending.buffered {
                    ethernet::set_dst(&mut buffered.frame, pkt.sender_mac());
                    ethernet::set_src(&mut buffered.frame, out_iface_mac);
                    send(router, &out_iface_name, &buffered.frame);
                }
            }
        }
        other => {
            debug!(iface = ingress_iface, op = other, "unknown ARP operation, dropped");
        }
    }
}

// ── IPv4 branch ─────────────────────────────────────────────

fn handle_ipv4(router: &Router, ingress_iface: &str, frame: &[u8], eth: &EthernetView) {
    let Some(ip) = Ipv4View::parse(eth.payload()) else {
        debug!(iface = ingress_iface, "malformed or bad-checksum IPv4 packet, dropped");
        return;
    };

    let Some(ingress) = router.interfaces.lookup_by_name(ingress_iface) else {
        warn!(iface = ingress_iface, "frame received on unknown interface");
        return;
    };

    if router.interfaces.is_local_ip(ip.dst()) {
        deliver_local(router, ingress, eth.src(), &ip);
        return;
    }

    forward(router, ingress_iface, ingress, frame, eth, &ip);
}

fn deliver_local(
    router: &Router,
    ingress: &crate::iface::Interface,
    orig_eth_src: MacAddr,
    ip: &Ipv4View,
) {
    match ip.protocol() {
        ipv4::PROTO_ICMP => {
            let Some(echo) = icmp::EchoView::parse(ip.payload()) else {
                debug!("malformed ICMP addressed locally, dropped");
                return;
            };
            if echo.icmp_type() == icmp::TYPE_ECHO_REQUEST {
                let reply = icmp_gen::build_echo_reply(
                    ingress,
                    orig_eth_src,
                    ip.src(),
                    echo.identifier(),
                    echo.sequence(),
                    echo.payload(),
                );
                send(router, &ingress.name, &reply);
            }
            // Any other locally-addressed ICMP (including error types) is
            // silently dropped — never ICMP-replied-to (§7).
        }
        ipv4::PROTO_TCP | ipv4::PROTO_UDP => {
            let err = icmp_gen::build_error(
                ingress,
                orig_eth_src,
                ip.src(),
                icmp::TYPE_DEST_UNREACHABLE,
                icmp::CODE_PORT_UNREACHABLE,
                ip.whole_packet(),
            );
            send(router, &ingress.name, &err);
        }
        _ => {
            debug!("locally-addressed packet for unsupported protocol, dropped");
        }
    }
}

fn forward(
    router: &Router,
    ingress_iface: &str,
    ingress: &crate::iface::Interface,
    frame: &[u8],
    eth: &EthernetView,
    ip: &Ipv4View,
) {
    if ip.ttl() <= 1 {
        if !icmp_gen::should_suppress_error(ip) {
            let err = icmp_gen::build_error(
                ingress,
                eth.src(),
                ip.src(),
                icmp::TYPE_TIME_EXCEEDED,
                icmp::CODE_TTL_EXPIRED_IN_TRANSIT,
                ip.whole_packet(),
            );
            send(router, ingress_iface, &err);
        }
        return;
    }

    let mut out = frame.to_vec();
    ipv4::decrement_ttl_and_recompute_checksum(&mut out, ethernet::HEADER_LEN, ip.header_len());

    let Some(route) = router.routes.lpm(ip.dst()) else {
        if !icmp_gen::should_suppress_error(ip) {
            let err = icmp_gen::build_error(
                ingress,
                eth.src(),
                ip.src(),
                icmp::TYPE_DEST_UNREACHABLE,
                icmp::CODE_NET_UNREACHABLE,
                ip.whole_packet(),
            );
            send(router, ingress_iface, &err);
        }
        return;
    };

    let now = Instant::now();
    match router.arp.lookup(route.gateway, now) {
        Some(next_hop_mac) => {
            let Some(out_iface) = router.interfaces.lookup_by_name(&route.out_iface) else {
                warn!(iface = route.out_iface, "route references unknown interface");
                return;
            };
            ethernet::set_dst(&mut out, next_hop_mac);
            ethernet::set_src(&mut out, out_iface.mac);
            send(router, &route.out_iface, &out);
        }
        None => {
            router
                .arp
                .queue_request(route.gateway, out, &route.out_iface, ingress_iface);
        }
    }
}
