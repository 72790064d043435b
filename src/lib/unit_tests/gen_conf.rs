// SPDX-License-Identifier: Apache-2.0

use crate::{NetworkState, NmKeyFile};

fn find_keyfile<'a>(keyfiles: &'a [NmKeyFile], id: &str) -> &'a NmKeyFile {
    match keyfiles.iter().find(|k| k.id == id) {
        Some(k) => k,
        None => panic!("Keyfile {id} not found in {keyfiles:?}"),
    }
}

#[test]
fn test_gen_conf_bridge_with_vlan_filtering() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          ipv4:
            enabled: true
            dhcp: true
          bridge:
            options:
              stp:
                enabled: false
            port:
            - name: eth1
              vlan:
                mode: trunk
                tag: 100
                enable-native: true
                trunk-tags:
                - id: 101
                - id-range:
                    min: 200
                    max: 299
        "#,
    )
    .unwrap();

    let keyfiles = desired.gen_conf().unwrap();
    assert_eq!(keyfiles.len(), 2);

    let br_conf = find_keyfile(&keyfiles, "br0");
    assert_eq!(br_conf.file_name(), "br0.nmconnection");
    assert_eq!(br_conf.get("connection", "type"), Some("bridge"));
    assert_eq!(br_conf.get("connection", "interface-name"), Some("br0"));
    assert_eq!(br_conf.get("connection", "autoconnect"), Some("true"));
    assert_eq!(br_conf.get("bridge", "stp"), Some("false"));
    assert_eq!(br_conf.get("bridge", "vlan-filtering"), Some("true"));
    assert_eq!(br_conf.get("ipv4", "method"), Some("auto"));
    assert_eq!(br_conf.get("ipv4", "ignore-auto-dns"), Some("false"));
    assert_eq!(br_conf.get("ipv6", "method"), Some("disabled"));
    assert!(br_conf.to_string().starts_with("[connection]\nid=br0\n"));

    let port_conf = find_keyfile(&keyfiles, "eth1");
    assert_eq!(port_conf.get("connection", "type"), Some("ethernet"));
    assert_eq!(port_conf.get("connection", "controller"), Some("br0"));
    assert_eq!(port_conf.get("connection", "port-type"), Some("bridge"));
    assert_eq!(
        port_conf.get("connection", "autoconnect-priority"),
        Some("99")
    );
    assert_eq!(
        port_conf.get("bridge-port", "vlans"),
        Some("100 pvid untagged,101,200-299")
    );
    assert!(!port_conf.has_section("ipv4"));
    assert!(!port_conf.has_section("ipv6"));
}

#[test]
fn test_gen_conf_uuid_is_stable() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: dummy0
          type: dummy
          state: up
        - name: dummy1
          type: dummy
          state: up
        "#,
    )
    .unwrap();

    let keyfiles1 = desired.gen_conf().unwrap();
    let keyfiles2 = desired.gen_conf().unwrap();
    assert_eq!(keyfiles1, keyfiles2);

    let uuid0 = find_keyfile(&keyfiles1, "dummy0")
        .get("connection", "uuid")
        .unwrap();
    let uuid1 = find_keyfile(&keyfiles1, "dummy1")
        .get("connection", "uuid")
        .unwrap();
    assert_ne!(uuid0, uuid1);
    assert!(uuid::Uuid::parse_str(uuid0).is_ok());
}

#[test]
fn test_gen_conf_ovs_port_profile() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: br0
          type: ovs-bridge
          state: up
          bridge:
            port:
            - name: ovs0
        "#,
    )
    .unwrap();

    let keyfiles = desired.gen_conf().unwrap();
    assert_eq!(keyfiles.len(), 3);

    let br_conf = find_keyfile(&keyfiles, "br0");
    let port_conf = find_keyfile(&keyfiles, "ovs-port-ovs0");
    let iface_conf = find_keyfile(&keyfiles, "ovs0");

    assert_eq!(br_conf.get("connection", "type"), Some("ovs-bridge"));
    assert!(!br_conf.has_section("ipv4"));
    assert_eq!(port_conf.get("connection", "type"), Some("ovs-port"));
    assert_eq!(
        port_conf.get("connection", "controller"),
        br_conf.get("connection", "uuid")
    );
    assert_eq!(port_conf.get("connection", "port-type"), Some("ovs-bridge"));
    assert_eq!(
        iface_conf.get("connection", "controller"),
        port_conf.get("connection", "uuid")
    );
    assert_eq!(iface_conf.get("connection", "port-type"), Some("ovs-port"));
    assert_eq!(iface_conf.get("ovs-interface", "type"), Some("internal"));
}

#[test]
fn test_gen_conf_static_ip_with_route_and_dns() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        dns-resolver:
          config:
            server:
            - 192.0.2.53
            search:
            - example.org
        routes:
          config:
          - destination: 0.0.0.0/0
            next-hop-interface: eth1
            next-hop-address: 192.0.2.1
          - destination: 198.51.100.0/24
            next-hop-interface: eth1
            next-hop-address: 192.0.2.2
            metric: 150
            table-id: 100
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          mtu: 1400
          ipv4:
            enabled: true
            address:
            - ip: 192.0.2.251
              prefix-length: 24
          ipv6:
            enabled: false
        "#,
    )
    .unwrap();

    let keyfiles = desired.gen_conf().unwrap();
    assert_eq!(keyfiles.len(), 1);

    let eth_conf = find_keyfile(&keyfiles, "eth1");
    assert_eq!(eth_conf.get("ethernet", "mtu"), Some("1400"));
    assert_eq!(eth_conf.get("ipv4", "method"), Some("manual"));
    assert_eq!(eth_conf.get("ipv4", "address1"), Some("192.0.2.251/24"));
    assert_eq!(eth_conf.get("ipv4", "route1"), Some("0.0.0.0/0,192.0.2.1"));
    assert_eq!(
        eth_conf.get("ipv4", "route2"),
        Some("198.51.100.0/24,192.0.2.2,150")
    );
    assert_eq!(eth_conf.get("ipv4", "route2_options"), Some("table=100"));
    assert_eq!(eth_conf.get("ipv4", "dns"), Some("192.0.2.53;"));
    assert_eq!(eth_conf.get("ipv4", "dns-search"), Some("example.org;"));
    assert_eq!(eth_conf.get("ipv4", "dns-priority"), Some("40"));
    assert_eq!(eth_conf.get("ipv6", "method"), Some("disabled"));
}
