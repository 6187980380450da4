//! ARP sweeper (§4.F) — retransmits pending ARP requests, abandons them
//! past the attempt limit (emitting ICMP host-unreachable per buffered
//! frame), and evicts expired cache entries.

use std::time::Instant;

use tracing::{debug, warn};

use crate::arpcache::ARP_REQUEST_INTERVAL;
use crate::icmp_gen;
use crate::router::Router;
use crate::wire::arp;
use crate::wire::ethernet::{self, EthernetView};
use crate::wire::icmp;
use crate::wire::ipv4::Ipv4View;

/// Runs one sweep pass over the ARP cache + pending queue (§4.F). Intended
/// to be invoked once per second by the background sweeper task.
pub fn sweep_once(router: &Router, now: Instant) {
    let outcome = router.arp.sweep(now);

    for req in outcome.retransmit {
        let Some(out_iface) = router.interfaces.lookup_by_name(&req.out_iface) else {
            warn!(iface = req.out_iface, "pending request references unknown interface");
            continue;
        };
        let arp_request = arp::build(
            arp::OP_REQUEST,
            out_iface.mac,
            out_iface.ipv4,
            ethernet::MacAddr::ZERO,
            req.target_ipv4,
        );
        let mut frame = Vec::with_capacity(ethernet::HEADER_LEN + arp_request.len());
        ethernet::push_header(
            &mut frame,
            ethernet::MacAddr::BROADCAST,
            out_iface.mac,
            ethernet::ETHERTYPE_ARP,
        );
        frame.extend_from_slice(&arp_request);
        debug!(target = %req.target_ipv4, iface = %out_iface.name, "retransmitting ARP request");
        if let Err(e) = router.transport.send_frame(&out_iface.name, &frame) {
            warn!(iface = %out_iface.name, error = %e, "send_frame failed for ARP request");
        }
    }

    for expired in outcome.expired {
        debug!(
            target = %expired.target_ipv4,
            buffered = expired.buffered.len(),
            "ARP resolution abandoned, emitting host-unreachable"
        );
        for buffered in expired.buffered {
            emit_host_unreachable(router, &buffered.ingress_iface, &buffered.frame);
        }
    }
}

fn emit_host_unreachable(router: &Router, ingress_iface: &str, frame: &[u8]) {
    let Some(eth) = EthernetView::parse(frame) else {
        return;
    };
    let Some(ip) = Ipv4View::parse(eth.payload()) else {
        return;
    };
    if icmp_gen::should_suppress_error(&ip) {
        return;
    }
    let Some(responding) = router.interfaces.lookup_by_name(ingress_iface) else {
        warn!(iface = ingress_iface, "buffered frame references unknown ingress interface");
        return;
    };

    let err = icmp_gen::build_error(
        responding,
        eth.src(),
        ip.src(),
        icmp::TYPE_DEST_UNREACHABLE,
        icmp::CODE_HOST_UNREACHABLE,
        ip.whole_packet(),
    );
    if let Err(e) = router.transport.send_frame(ingress_iface, &err) {
        warn!(iface = ingress_iface, error = %e, "send_frame failed for host-unreachable");
    }
}

/// Runs the sweeper loop until `shutdown` fires, sleeping roughly
/// [`ARP_REQUEST_INTERVAL`] between passes (§5: "jitter of +/-100ms is
/// acceptable"). Pending requests are dropped without emitting ICMP on
/// shutdown — best-effort, per §5 "Cancellation".
pub async fn run(router: Router, mut shutdown: tokio::sync::watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(ARP_REQUEST_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                sweep_once(&router, Instant::now());
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    debug!("sweeper observed shutdown signal, exiting");
                    return;
                }
            }
        }
    }
}
