//! An IPv4 software router data plane: wire-format parsing, ARP resolution,
//! longest-prefix-match forwarding, and ICMP generation over raw Ethernet
//! frames.
//!
//! The core ([`router`], [`forward`], [`arpcache`], [`sweeper`], [`wire`])
//! is transport-agnostic — it is driven through the [`transport::FrameTransport`]
//! seam rather than talking to any NIC directly, which is what lets
//! `tests/forwarding.rs` exercise it without raw sockets.

pub mod arpcache;
pub mod config;
pub mod error;
pub mod forward;
pub mod iface;
pub mod icmp_gen;
pub mod route;
pub mod router;
pub mod sweeper;
pub mod transport;
pub mod wire;

pub use config::{load, load_str, Topology};
pub use error::{ConfigError, TransportError};
pub use iface::{Interface, InterfaceTable};
pub use route::{Route, RoutingTable};
pub use router::Router;
pub use transport::{FrameTransport, PnetTransport, SharedTransport};
