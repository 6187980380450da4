//! Interface table (§4.B) — an immutable mapping `name -> (MAC, IPv4)`
//! established once at startup.

use crate::wire::{Ipv4Addr, MacAddr};

/// A router-owned network interface.
///
/// Immutable after construction; interface counts are small so linear scan
/// is the right data structure (§4.B).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub mac: MacAddr,
    pub ipv4: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl Interface {
    pub fn new(name: impl Into<String>, mac: MacAddr, ipv4: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        Interface {
            name: name.into(),
            mac,
            ipv4,
            netmask,
        }
    }
}

/// The set of interfaces owned by a router instance.
#[derive(Debug, Clone, Default)]
pub struct InterfaceTable {
    interfaces: Vec<Interface>,
}

impl InterfaceTable {
    pub fn new(interfaces: Vec<Interface>) -> Self {
        InterfaceTable { interfaces }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter()
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn lookup_by_ip(&self, ip: Ipv4Addr) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.ipv4 == ip)
    }

    pub fn is_local_ip(&self, ip: Ipv4Addr) -> bool {
        self.lookup_by_ip(ip).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> InterfaceTable {
        InterfaceTable::new(vec![
            Interface::new(
                "eth0",
                MacAddr::new([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x01]),
                Ipv4Addr::new(10, 0, 1, 1),
                Ipv4Addr::new(255, 255, 255, 0),
            ),
            Interface::new(
                "eth1",
                MacAddr::new([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x02]),
                Ipv4Addr::new(10, 0, 2, 1),
                Ipv4Addr::new(255, 255, 255, 0),
            ),
        ])
    }

    #[test]
    fn looks_up_by_name_and_ip() {
        let t = table();
        assert_eq!(t.lookup_by_name("eth1").unwrap().ipv4, Ipv4Addr::new(10, 0, 2, 1));
        assert_eq!(t.lookup_by_ip(Ipv4Addr::new(10, 0, 1, 1)).unwrap().name, "eth0");
        assert!(t.lookup_by_name("eth2").is_none());
    }

    #[test]
    fn is_local_ip_checks_all_interfaces() {
        let t = table();
        assert!(t.is_local_ip(Ipv4Addr::new(10, 0, 2, 1)));
        assert!(!t.is_local_ip(Ipv4Addr::new(192, 0, 2, 5)));
    }
}
