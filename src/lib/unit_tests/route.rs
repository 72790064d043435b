// SPDX-License-Identifier: Apache-2.0

use crate::{
    ErrorKind, MergedNetworkState, NetstateInterface, NetworkState, RouteEntry,
    RouteState,
};

const CURRENT_WITH_ROUTES: &str = r#"
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
    enabled: true
    address:
    - ip: 2001:db8:1::1
      prefix-length: 64
- name: eth2
  type: ethernet
  state: up
  ipv4:
    enabled: true
    address:
    - ip: 198.51.100.1
      prefix-length: 24
routes:
  config:
  - destination: 198.51.100.0/24
    next-hop-interface: eth1
    next-hop-address: 192.0.2.1
    metric: 150
    table-id: 254
  - destination: 2001:db8:a::/64
    next-hop-interface: eth1
    next-hop-address: 2001:db8:1::2
    metric: 108
    table-id: 254
  - destination: 203.0.113.0/24
    next-hop-interface: eth2
    next-hop-address: 198.51.100.254
    metric: 150
    table-id: 254
"#;

#[test]
fn test_route_absent_wildcard_by_next_hop_iface() {
    let current = NetworkState::new_from_yaml(CURRENT_WITH_ROUTES).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        routes:
          config:
          - next-hop-interface: eth1
            state: absent
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    assert!(merged.routes.is_changed());
    assert_eq!(merged.routes.route_changed_ifaces, vec!["eth1".to_string()]);
    assert_eq!(merged.routes.changed_routes.len(), 2);
    for rt in merged.routes.changed_routes.iter() {
        assert_eq!(rt.state, Some(RouteState::Absent));
        assert_eq!(rt.next_hop_iface.as_deref(), Some("eth1"));
    }
    assert!(!merged.routes.merged.contains_key("eth1"));
    assert_eq!(merged.routes.merged.get("eth2").map(|r| r.len()), Some(1));

    // Interface with routes removed is included in edit plan with empty
    // route list stored.
    let apply_state = merged.gen_state_for_apply();
    let eth1_iface = apply_state.ifaces.kernel_ifaces.get("eth1").unwrap();
    let ipv4 = eth1_iface.base_iface().ipv4.as_ref().unwrap();
    assert_eq!(ipv4.metadata().routes, Some(Vec::new()));
    assert!(ipv4.metadata().routes_changed);
    assert!(apply_state.ifaces.kernel_ifaces.get("eth2").is_none());

    let routes_for_apply = apply_state.routes.config.unwrap();
    assert_eq!(routes_for_apply.len(), 2);
}

#[test]
fn test_route_absent_by_destination() {
    let current = NetworkState::new_from_yaml(CURRENT_WITH_ROUTES).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        routes:
          config:
          - destination: 203.0.113.0/24
            state: absent
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    assert_eq!(merged.routes.route_changed_ifaces, vec!["eth2".to_string()]);
    assert_eq!(merged.routes.changed_routes.len(), 1);
    assert!(!merged.routes.merged.contains_key("eth2"));
    assert_eq!(merged.routes.merged.get("eth1").map(|r| r.len()), Some(2));
}

#[test]
fn test_route_table_id_zero_means_main_table() {
    let current = NetworkState::new_from_yaml(CURRENT_WITH_ROUTES).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        routes:
          config:
          - destination: 192.0.2.0/25
            next-hop-interface: eth2
            next-hop-address: 198.51.100.2
            table-id: 0
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    assert_eq!(merged.routes.changed_routes.len(), 1);
    let new_rt = &merged.routes.changed_routes[0];
    assert_eq!(new_rt.table_id, None);
    assert_eq!(
        new_rt.table_id_or_default(),
        RouteEntry::DEFAULT_ROUTE_TABLE_ID
    );
    assert_eq!(merged.routes.merged.get("eth2").map(|r| r.len()), Some(2));
}

#[test]
fn test_route_already_exists() {
    let current = NetworkState::new_from_yaml(CURRENT_WITH_ROUTES).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        routes:
          config:
          - destination: 198.51.100.0/24
            next-hop-interface: eth1
            next-hop-address: 192.0.2.1
            metric: 150
            table-id: 254
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    assert!(merged.routes.changed_routes.is_empty());
    // Duplicate of current route is merged into single entry
    assert_eq!(merged.routes.merged.get("eth1").map(|r| r.len()), Some(2));
}

#[test]
fn test_route_metric_changed() {
    let current = NetworkState::new_from_yaml(CURRENT_WITH_ROUTES).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        routes:
          config:
          - destination: 198.51.100.0/24
            next-hop-interface: eth1
            next-hop-address: 192.0.2.1
            metric: 200
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    assert_eq!(merged.routes.changed_routes.len(), 1);
    assert_eq!(merged.routes.changed_routes[0].metric, Some(200));

    let eth1_rts = merged.routes.merged.get("eth1").unwrap();
    assert_eq!(eth1_rts.len(), 2);
    let rt = eth1_rts
        .iter()
        .find(|r| r.destination.as_deref() == Some("198.51.100.0/24"))
        .unwrap();
    assert_eq!(rt.metric, Some(200));

    let apply_state = merged.gen_state_for_apply();
    let eth1_iface = apply_state.ifaces.kernel_ifaces.get("eth1").unwrap();
    let ipv4_rts = eth1_iface
        .base_iface()
        .ipv4
        .as_ref()
        .and_then(|i| i.metadata().routes.clone())
        .unwrap();
    assert_eq!(ipv4_rts.len(), 1);
    assert_eq!(ipv4_rts[0].metric, Some(200));
}

#[test]
fn test_route_next_hop_iface_not_exist() {
    let current = NetworkState::new_from_yaml(CURRENT_WITH_ROUTES).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        routes:
          config:
          - destination: 192.0.2.0/25
            next-hop-interface: eth9
            next-hop-address: 198.51.100.2
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
fn test_route_next_hop_iface_ip_disabled() {
    let current = NetworkState::new_from_yaml(CURRENT_WITH_ROUTES).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth2
          type: ethernet
          state: up
          ipv4:
            enabled: false
        routes:
          config:
          - destination: 192.0.2.0/25
            next-hop-interface: eth2
            next-hop-address: 198.51.100.2
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
fn test_route_next_hop_iface_dynamic_ip() {
    let current = NetworkState::new_from_yaml(CURRENT_WITH_ROUTES).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth2
          type: ethernet
          state: up
          ipv4:
            enabled: true
            dhcp: true
        routes:
          config:
          - destination: 192.0.2.0/25
            next-hop-interface: eth2
            next-hop-address: 203.0.113.1
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    assert_eq!(merged.routes.route_changed_ifaces, vec!["eth2".to_string()]);
    assert_eq!(merged.routes.changed_routes.len(), 1);
    assert_eq!(
        merged.routes.changed_routes[0].next_hop_addr.as_deref(),
        Some("203.0.113.1")
    );
    assert_eq!(merged.routes.merged.get("eth2").map(|r| r.len()), Some(2));
}

#[test]
fn test_route_removed_when_next_hop_iface_absent() {
    let current = NetworkState::new_from_yaml(CURRENT_WITH_ROUTES).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth2
          type: ethernet
          state: absent
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    assert_eq!(merged.routes.changed_routes.len(), 1);
    assert_eq!(
        merged.routes.changed_routes[0].state,
        Some(RouteState::Absent)
    );
    assert!(!merged.routes.merged.contains_key("eth2"));
}

#[test]
fn test_route_verify() {
    let current = NetworkState::new_from_yaml(CURRENT_WITH_ROUTES).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        routes:
          config:
          - destination: 203.0.113.0/24
            state: absent
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current.clone(), Default::default())
            .unwrap();

    // Route not removed yet
    let result = merged.verify(&current);
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::VerificationError);
    }

    let mut post_apply = current;
    if let Some(rts) = post_apply.routes.config.as_mut() {
        rts.retain(|rt| rt.next_hop_iface.as_deref() != Some("eth2"));
    }
    merged.verify(&post_apply).unwrap();
}
