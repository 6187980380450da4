//! Router context (§9 "Global router state") — interfaces, routing table,
//! ARP cache, and transport handle, threaded explicitly rather than kept as
//! file-scope globals.

use std::sync::Arc;

use crate::arpcache::ArpCache;
use crate::iface::InterfaceTable;
use crate::route::RoutingTable;
use crate::transport::SharedTransport;

/// Everything the forwarding pipeline and the sweeper need. Cheap to clone
/// (an `Arc` around the mutable pieces); constructed once at startup and
/// shared between the frame-handling contexts and the sweeper task.
#[derive(Clone)]
pub struct Router {
    pub interfaces: Arc<InterfaceTable>,
    pub routes: Arc<RoutingTable>,
    pub arp: Arc<ArpCache>,
    pub transport: SharedTransport,
}

impl Router {
    pub fn new(interfaces: InterfaceTable, routes: RoutingTable, transport: SharedTransport) -> Self {
        Router {
            interfaces: Arc::new(interfaces),
            routes: Arc::new(routes),
            arp: Arc::new(ArpCache::new()),
            transport,
        }
    }

    /// Handles one received frame (§4.G). Never panics on malformed input;
    /// errors from the transport are logged and swallowed (§7).
    pub fn handle_frame(&self, ingress_iface: &str, frame: &[u8]) {
        crate::forward::handle_frame(self, ingress_iface, frame);
    }

    /// Runs one ARP sweeper pass (§4.F). Intended to be called every
    /// [`crate::arpcache::ARP_REQUEST_INTERVAL`] by a background task.
    pub fn sweep(&self, now: std::time::Instant) {
        crate::sweeper::sweep_once(self, now);
    }
}
