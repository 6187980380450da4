//! Error types for the router data plane.

use std::net::AddrParseError;

/// Errors raised while loading interface/routing-table configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid address in config: {0}")]
    Addr(#[from] AddrParseError),

    #[error("invalid MAC address {0:?}")]
    Mac(String),

    #[error("route {dest}/{mask} has host bits set (dest & mask != dest)")]
    RouteNotNormalized { dest: String, mask: String },

    #[error("interface {0:?} referenced by a route is not defined")]
    UnknownInterface(String),
}

/// Errors raised by a [`crate::transport::FrameTransport`] implementation.
///
/// Per the data-plane error model, a transport error is logged and the
/// frame is discarded; it never aborts the forwarding pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("interface {0:?} is not known to this transport")]
    UnknownInterface(String),

    #[error("send on {iface:?} failed: {source}")]
    Send {
        iface: String,
        #[source]
        source: std::io::Error,
    },
}
