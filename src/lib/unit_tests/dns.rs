// SPDX-License-Identifier: Apache-2.0

use crate::{
    DnsIfaceMetadata, ErrorKind, MergedNetworkState, NetstateInterface,
    NetworkState,
};

const CURRENT_WITH_GATEWAYS: &str = r#"
interfaces:
- name: eth1
  type: ethernet
  state: up
  ipv4:
    enabled: true
    address:
    - ip: 192.0.2.251
      prefix-length: 24
  ipv6:
    enabled: false
- name: eth2
  type: ethernet
  state: up
  ipv4:
    enabled: false
  ipv6:
    enabled: true
    address:
    - ip: 2001:db8:1::1
      prefix-length: 64
routes:
  config:
  - destination: 0.0.0.0/0
    next-hop-interface: eth1
    next-hop-address: 192.0.2.1
  - destination: ::/0
    next-hop-interface: eth2
    next-hop-address: 2001:db8:1::2
"#;

#[test]
fn test_dns_ipv6_preferred_split_by_family() {
    let current = NetworkState::new_from_yaml(CURRENT_WITH_GATEWAYS).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        dns-resolver:
          config:
            server:
            - 2001:4860:4860::8888
            - 8.8.8.8
            search:
            - example.org
            options:
            - rotate
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    assert!(merged.dns.is_changed());

    let apply_state = merged.gen_state_for_apply();
    let eth1_iface = apply_state.ifaces.kernel_ifaces.get("eth1").unwrap();
    let eth2_iface = apply_state.ifaces.kernel_ifaces.get("eth2").unwrap();

    let ipv6_dns = eth2_iface
        .base_iface()
        .ipv6
        .as_ref()
        .and_then(|i| i.metadata().dns.clone());
    assert_eq!(
        ipv6_dns,
        Some(DnsIfaceMetadata {
            priority: 0,
            server: vec!["2001:4860:4860::8888".to_string()],
            search: vec!["example.org".to_string()],
            options: vec!["rotate".to_string()],
        })
    );

    let ipv4_dns = eth1_iface
        .base_iface()
        .ipv4
        .as_ref()
        .and_then(|i| i.metadata().dns.clone());
    assert_eq!(
        ipv4_dns,
        Some(DnsIfaceMetadata {
            priority: 1,
            server: vec!["8.8.8.8".to_string()],
            search: Vec::new(),
            options: Vec::new(),
        })
    );

    let dns_for_apply = apply_state.dns.unwrap().config.unwrap();
    assert_eq!(
        dns_for_apply.server,
        Some(vec!["2001:4860:4860::8888".to_string(), "8.8.8.8".to_string()])
    );
}

#[test]
fn test_dns_ipv4_preferred() {
    let current = NetworkState::new_from_yaml(CURRENT_WITH_GATEWAYS).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        dns-resolver:
          config:
            server:
            - 8.8.8.8
            - 2001:4860:4860::8888
            search:
            - example.org
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    let eth1_dns = merged
        .ifaces
        .kernel_ifaces
        .get("eth1")
        .and_then(|i| i.merged.base_iface().ipv4.as_ref())
        .and_then(|i| i.metadata().dns.as_ref())
        .unwrap();
    let eth2_dns = merged
        .ifaces
        .kernel_ifaces
        .get("eth2")
        .and_then(|i| i.merged.base_iface().ipv6.as_ref())
        .and_then(|i| i.metadata().dns.as_ref())
        .unwrap();

    assert_eq!(eth1_dns.priority, 0);
    assert_eq!(eth1_dns.search, vec!["example.org".to_string()]);
    assert_eq!(eth2_dns.priority, 1);
    assert!(eth2_dns.search.is_empty());
}

#[test]
fn test_dns_prefer_dynamic_iface_without_auto_dns() {
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          ipv4:
            enabled: true
            dhcp: true
        - name: eth2
          type: ethernet
          state: up
          ipv4:
            enabled: true
            dhcp: true
            auto-dns: false
        "#,
    )
    .unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        dns-resolver:
          config:
            server:
            - 192.0.2.53
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    let eth2_iface = merged.ifaces.kernel_ifaces.get("eth2").unwrap();
    assert!(eth2_iface.is_for_apply());
    assert_eq!(
        eth2_iface
            .merged
            .base_iface()
            .ipv4
            .as_ref()
            .and_then(|i| i.metadata().dns.as_ref())
            .map(|d| d.server.clone()),
        Some(vec!["192.0.2.53".to_string()])
    );
    let eth1_iface = merged.ifaces.kernel_ifaces.get("eth1").unwrap();
    assert!(!eth1_iface.is_for_apply());
}

#[test]
fn test_dns_no_carrier_iface() {
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          ipv4:
            enabled: true
            address:
            - ip: 192.0.2.251
              prefix-length: 24
        "#,
    )
    .unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        dns-resolver:
          config:
            server:
            - 192.0.2.53
        "#,
    )
    .unwrap();

    let result =
        MergedNetworkState::new(desired, current, Default::default());

    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn test_dns_purge_and_verify() {
    let current: NetworkState = serde_yaml::from_str(
        r#"
        dns-resolver:
          config:
            server:
            - 192.0.2.53
            search:
            - example.org
        "#,
    )
    .unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        dns-resolver:
          config: {}
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current.clone(), Default::default())
            .unwrap();

    assert!(merged.dns.is_changed());
    assert!(merged.dns.servers.is_empty());
    assert!(merged.dns.searches.is_empty());
    assert!(merged.verify(&current).is_err());
    merged.verify(&NetworkState::new()).unwrap();
}
