//! ARP cache and pending-request queue (§4.D, §4.E).
//!
//! Both are guarded by a single mutex — one critical section for cache and
//! queue together keeps the "a pending request and a live cache entry for
//! the same IPv4 never coexist" invariant trivial to maintain (§3, §9).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::wire::{Ipv4Addr, MacAddr};

/// Default lifetime of a resolved ARP cache entry.
pub const ARP_CACHE_TTL: Duration = Duration::from_secs(15);
/// Minimum spacing between ARP request retransmissions for one target.
pub const ARP_REQUEST_INTERVAL: Duration = Duration::from_secs(1);
/// Number of retransmissions attempted before a pending request is
/// abandoned (the request is sent on attempt 0..=5, i.e. up to 6 times,
/// and abandoned once `attempts > 5`).
pub const ARP_MAX_ATTEMPTS: u32 = 5;

/// A single Ethernet frame buffered while its next hop's MAC is unresolved.
///
/// Owned by exactly one [`PendingRequest`]; on resolution it is dispatched,
/// on abandonment it is consumed to build an ICMP host-unreachable.
#[derive(Debug, Clone)]
pub struct BufferedFrame {
    pub frame: Vec<u8>,
    /// The interface the frame was originally received on — used both to
    /// address a host-unreachable reply and, for a cache hit dispatch, as
    /// the frame whose Ethernet header gets overwritten before resend.
    pub ingress_iface: String,
}

/// A record of an unresolved next-hop IP and the frames awaiting it (§3).
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub target_ipv4: Ipv4Addr,
    pub out_iface: String,
    pub buffered: VecDeque<BufferedFrame>,
    pub attempts: u32,
    pub last_sent_at: Option<Instant>,
}

impl PendingRequest {
    fn new(target_ipv4: Ipv4Addr, out_iface: String) -> Self {
        PendingRequest {
            target_ipv4,
            out_iface,
            buffered: VecDeque::new(),
            attempts: 0,
            last_sent_at: None,
        }
    }
}

struct CacheEntry {
    mac: MacAddr,
    inserted_at: Instant,
}

struct Inner {
    entries: std::collections::HashMap<Ipv4Addr, CacheEntry>,
    pending: std::collections::HashMap<Ipv4Addr, PendingRequest>,
}

/// Instruction to retransmit a broadcast ARP request for `target_ipv4` via
/// `out_iface`, produced by a sweep pass. Kept separate from `PendingRequest`
/// so the sweeper never needs to reach back into the cache while building
/// the broadcast frame.
#[derive(Debug, Clone)]
pub struct RetransmitRequest {
    pub target_ipv4: Ipv4Addr,
    pub out_iface: String,
}

/// The result of one sweeper pass (§4.F): requests to retransmit, and
/// requests that exceeded [`ARP_MAX_ATTEMPTS`] and must now be abandoned
/// (each yielding one ICMP host-unreachable per buffered frame).
#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub retransmit: Vec<RetransmitRequest>,
    pub expired: Vec<PendingRequest>,
}

/// The ARP cache plus its associated pending-request queue, behind one lock.
pub struct ArpCache {
    inner: Mutex<Inner>,
}

impl Default for ArpCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ArpCache {
    pub fn new() -> Self {
        ArpCache {
            inner: Mutex::new(Inner {
                entries: std::collections::HashMap::new(),
                pending: std::collections::HashMap::new(),
            }),
        }
    }

    /// Returns a cached MAC for `ip` if present and not expired (§4.D). The
    /// returned value is a copy — the caller holds no lock afterwards.
    pub fn lookup(&self, ip: Ipv4Addr, now: Instant) -> Option<MacAddr> {
        let inner = self.inner.lock().expect("arp_lock poisoned");
        let entry = inner.entries.get(&ip)?;
        if now.saturating_duration_since(entry.inserted_at) <= ARP_CACHE_TTL {
            Some(entry.mac)
        } else {
            None
        }
    }

    /// Updates or creates a cache entry, and atomically removes and returns
    /// the pending request for `ip` if one exists (§3, §4.D). The caller is
    /// responsible for dispatching the returned request's buffered frames
    /// — this must happen after releasing the lock, never during it
    /// (§5 "dispatch of buffered frames happens after releasing the lock").
    pub fn insert(&self, ip: Ipv4Addr, mac: MacAddr, now: Instant) -> Option<PendingRequest> {
        let mut inner = self.inner.lock().expect("arp_lock poisoned");
        inner.entries.insert(
            ip,
            CacheEntry {
                mac,
                inserted_at: now,
            },
        );
        inner.pending.remove(&ip)
    }

    /// Queues `frame` awaiting resolution of `target_ipv4`. If a pending
    /// request already exists for that IP, appends to its buffer;
    /// otherwise creates one with `attempts = 0` and no request sent yet
    /// (§4.D, §9 "the sweeper's responsibility, including the first
    /// attempt").
    pub fn queue_request(
        &self,
        target_ipv4: Ipv4Addr,
        frame: Vec<u8>,
        out_iface: &str,
        ingress_iface: &str,
    ) {
        let mut inner = self.inner.lock().expect("arp_lock poisoned");
        let entry = inner
            .pending
            .entry(target_ipv4)
            .or_insert_with(|| PendingRequest::new(target_ipv4, out_iface.to_string()));
        entry.buffered.push_back(BufferedFrame {
            frame,
            ingress_iface: ingress_iface.to_string(),
        });
    }

    /// Runs one sweeper pass (§4.F): evicts expired cache entries, and for
    /// every pending request either schedules a retransmission or (past
    /// [`ARP_MAX_ATTEMPTS`]) removes it for abandonment. Holds the lock for
    /// the whole scan — an O(entries) operation, matching §5's "critical
    /// sections are short" — and returns before any I/O is performed.
    pub fn sweep(&self, now: Instant) -> SweepOutcome {
        let mut inner = self.inner.lock().expect("arp_lock poisoned");

        inner
            .entries
            .retain(|_, entry| now.saturating_duration_since(entry.inserted_at) <= ARP_CACHE_TTL);

        let mut outcome = SweepOutcome::default();
        let expired_keys: Vec<Ipv4Addr> = inner
            .pending
            .iter()
            .filter(|(_, req)| req.attempts > ARP_MAX_ATTEMPTS)
            .map(|(ip, _)| *ip)
            .collect();

        for ip in expired_keys {
            if let Some(req) = inner.pending.remove(&ip) {
                outcome.expired.push(req);
            }
        }

        for req in inner.pending.values_mut() {
            let should_send = match req.last_sent_at {
                None => true,
                Some(last) => now.saturating_duration_since(last) >= ARP_REQUEST_INTERVAL,
            };
            if should_send {
                req.attempts += 1;
                req.last_sent_at = Some(now);
                outcome.retransmit.push(RetransmitRequest {
                    target_ipv4: req.target_ipv4,
                    out_iface: req.out_iface.clone(),
                });
            }
        }

        outcome
    }

    #[cfg(test)]
    pub(crate) fn pending_count(&self) -> usize {
        self.inner.lock().expect("arp_lock poisoned").pending.len()
    }
}
