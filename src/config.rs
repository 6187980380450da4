//! Startup configuration loading (§6 "Interface/route configuration") —
//! the interface list and routing table are loaded once from a YAML file
//! and never mutated thereafter.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::iface::{Interface, InterfaceTable};
use crate::route::{Route, RoutingTable};
use crate::wire::{ethernet::MacAddr, ipv4::Ipv4Addr};

#[derive(Debug, Deserialize)]
struct RawConfig {
    interfaces: Vec<RawInterface>,
    #[serde(default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
struct RawInterface {
    name: String,
    mac: String,
    /// CIDR notation, e.g. `"10.0.1.1/24"`.
    ipv4: String,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    /// CIDR notation, e.g. `"10.0.2.0/24"`.
    dest: String,
    gateway: String,
    iface: String,
}

/// The immutable topology a router instance is constructed from.
pub struct Topology {
    pub interfaces: InterfaceTable,
    pub routes: RoutingTable,
}

/// Loads interfaces and routes from a YAML file at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<Topology, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_str(&text)
}

/// Parses a YAML topology from a string (used directly by tests).
pub fn load_str(text: &str) -> Result<Topology, ConfigError> {
    let raw: RawConfig = serde_yaml::from_str(text)?;

    let mut interfaces = Vec::with_capacity(raw.interfaces.len());
    for i in &raw.interfaces {
        let mac: MacAddr = i
            .mac
            .parse()
            .map_err(|_| ConfigError::Mac(i.mac.clone()))?;
        let (ipv4, netmask) = parse_cidr(&i.ipv4)?;
        interfaces.push(Interface::new(i.name.clone(), mac, ipv4, netmask));
    }
    let interfaces = InterfaceTable::new(interfaces);

    let mut routes = RoutingTable::new();
    for r in &raw.routes {
        if interfaces.lookup_by_name(&r.iface).is_none() {
            return Err(ConfigError::UnknownInterface(r.iface.clone()));
        }
        let (dest, mask) = parse_cidr(&r.dest)?;
        let gateway: Ipv4Addr = r.gateway.parse()?;
        let masked = Ipv4Addr::from_u32(dest.to_u32() & mask.to_u32());
        if masked != dest {
            return Err(ConfigError::RouteNotNormalized {
                dest: dest.to_string(),
                mask: mask.to_string(),
            });
        }
        routes.push(Route {
            dest,
            mask,
            gateway,
            out_iface: r.iface.clone(),
        });
    }

    Ok(Topology { interfaces, routes })
}

/// Parses `"a.b.c.d/prefix"` into an address and its corresponding netmask.
fn parse_cidr(s: &str) -> Result<(Ipv4Addr, Ipv4Addr), ConfigError> {
    let (addr_part, prefix_part) = s
        .split_once('/')
        .ok_or_else(|| ConfigError::Mac(format!("{s:?} is not in CIDR notation")))?;
    let addr: Ipv4Addr = addr_part.parse()?;
    let prefix: u32 = prefix_part
        .parse()
        .map_err(|_| ConfigError::Mac(format!("{s:?} has an invalid prefix length")))?;
    let mask = if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    };
    Ok((addr, Ipv4Addr::from_u32(mask)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
interfaces:
  - name: eth0
    mac: "aa:aa:aa:aa:aa:01"
    ipv4: "10.0.1.1/24"
  - name: eth1
    mac: "aa:aa:aa:aa:aa:02"
    ipv4: "10.0.2.1/24"
routes:
  - dest: "10.0.2.0/24"
    gateway: "10.0.2.1"
    iface: eth1
"#;

    #[test]
    fn loads_interfaces_and_routes() {
        let topo = load_str(SAMPLE).unwrap();
        let eth0 = topo.interfaces.lookup_by_name("eth0").unwrap();
        assert_eq!(eth0.ipv4, Ipv4Addr::new(10, 0, 1, 1));
        assert_eq!(eth0.netmask, Ipv4Addr::new(255, 255, 255, 0));

        let route = topo.routes.lpm(Ipv4Addr::new(10, 0, 2, 77)).unwrap();
        assert_eq!(route.out_iface, "eth1");
        assert_eq!(route.gateway, Ipv4Addr::new(10, 0, 2, 1));
    }

    #[test]
    fn rejects_route_on_unknown_interface() {
        let bad = SAMPLE.replace("iface: eth1", "iface: eth9");
        assert!(matches!(load_str(&bad), Err(ConfigError::UnknownInterface(_))));
    }

    #[test]
    fn rejects_unnormalized_route() {
        let bad = SAMPLE.replace("dest: \"10.0.2.0/24\"", "dest: \"10.0.2.5/24\"");
        assert!(matches!(load_str(&bad), Err(ConfigError::RouteNotNormalized { .. })));
    }
}
