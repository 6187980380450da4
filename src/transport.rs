//! The frame I/O transport collaborator (§6).
//!
//! The transport that actually delivers received frames and accepts
//! outgoing ones is explicitly out of the data plane's scope (§1); this
//! module defines the seam (`FrameTransport`) the core is generic over, and
//! one real implementation (`PnetTransport`) built on raw Ethernet sockets.

use std::collections::HashMap;
use std::sync::Arc;

use pnet::datalink::{self, Channel, DataLinkReceiver, DataLinkSender, NetworkInterface};
use tracing::{debug, warn};

use crate::error::TransportError;

/// Sends a fully-formed Ethernet frame out a named interface.
///
/// Implementations are synchronous (§6 "send_frame(...) -> ok|err"); a
/// failure is logged by the caller and discarded — no retransmission at
/// this layer (§7 "Transport errors").
pub trait FrameTransport: Send + Sync {
    fn send_frame(&self, iface: &str, frame: &[u8]) -> Result<(), TransportError>;
}

/// A raw-Ethernet transport backed by `pnet::datalink`, one channel per
/// configured interface name. Each interface is pumped on its own OS
/// thread, which calls the supplied `on_frame` callback for every received
/// frame — this is the `recv_frame` event of §6.
pub struct PnetTransport {
    senders: HashMap<String, std::sync::Mutex<Box<dyn DataLinkSender>>>,
}

impl PnetTransport {
    /// Opens a datalink channel for every interface name in `iface_names`
    /// that exists on the host, and spawns a receive thread for each one
    /// that calls `on_frame(iface_name, bytes)` for every frame read.
    pub fn open<F>(iface_names: &[String], on_frame: F) -> Result<Self, TransportError>
    where
        F: Fn(&str, &[u8]) + Send + Sync + Clone + 'static,
    {
        let host_interfaces: HashMap<String, NetworkInterface> = datalink::interfaces()
            .into_iter()
            .map(|i| (i.name.clone(), i))
            .collect();

        let mut senders = HashMap::new();

        for name in iface_names {
            let nic = host_interfaces
                .get(name)
                .ok_or_else(|| TransportError::UnknownInterface(name.clone()))?
                .clone();

            let channel = datalink::channel(&nic, Default::default()).map_err(|e| {
                TransportError::Send {
                    iface: name.clone(),
                    source: e,
                }
            })?;

            let (tx, rx) = match channel {
                Channel::Ethernet(tx, rx) => (tx, rx),
                _ => {
                    return Err(TransportError::UnknownInterface(format!(
                        "{name}: unsupported channel type"
                    )))
                }
            };

            senders.insert(name.clone(), std::sync::Mutex::new(tx));
            spawn_receiver(name.clone(), rx, on_frame.clone());
        }

        Ok(PnetTransport { senders })
    }
}

fn spawn_receiver<F>(iface_name: String, mut rx: Box<dyn DataLinkReceiver>, on_frame: F)
where
    F: Fn(&str, &[u8]) + Send + Sync + 'static,
{
    std::thread::Builder::new()
        .name(format!("rx-{iface_name}"))
        .spawn(move || loop {
            match rx.next() {
                Ok(frame) => on_frame(&iface_name, frame),
                Err(e) => {
                    warn!(iface = %iface_name, error = %e, "receive error");
                }
            }
        })
        .expect("failed to spawn interface receive thread");
}

impl FrameTransport for PnetTransport {
    fn send_frame(&self, iface: &str, frame: &[u8]) -> Result<(), TransportError> {
        let sender = self
            .senders
            .get(iface)
            .ok_or_else(|| TransportError::UnknownInterface(iface.to_string()))?;
        let mut sender = sender.lock().expect("transport lock poisoned");
        match sender.send_to(frame, None) {
            Some(Ok(())) => {
                debug!(iface, len = frame.len(), "sent frame");
                Ok(())
            }
            Some(Err(e)) => Err(TransportError::Send {
                iface: iface.to_string(),
                source: e,
            }),
            None => Err(TransportError::Send {
                iface: iface.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::WouldBlock, "send queue full"),
            }),
        }
    }
}

/// A shared handle to any [`FrameTransport`] implementation.
pub type SharedTransport = Arc<dyn FrameTransport>;
