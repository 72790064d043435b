// SPDX-License-Identifier: Apache-2.0

use crate::{
    ErrorKind, MergedNetworkState, MergedRouteRules, NetstateInterface,
    NetworkState, RouteRuleState,
};

const CURRENT_STATE: &str = r#"
interfaces:
- name: eth1
  type: ethernet
  state: up
  ipv4:
    enabled: true
    address:
    - ip: 192.0.2.251
      prefix-length: 24
routes:
  config:
  - destination: 198.51.100.0/24
    next-hop-interface: eth1
    next-hop-address: 192.0.2.1
    table-id: 100
"#;

#[test]
fn test_route_rule_auto_priority() {
    let current = NetworkState::new_from_yaml(CURRENT_STATE).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        route-rules:
          config:
          - ip-from: 192.0.2.0/24
            route-table: 100
          - ip-to: 198.51.100.1
            route-table: 100
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    assert!(merged.rules.is_changed());
    let mut priorities: Vec<i64> = merged
        .rules
        .for_apply
        .iter()
        .filter_map(|r| r.priority)
        .collect();
    priorities.sort_unstable();
    assert_eq!(
        priorities,
        vec![
            MergedRouteRules::AUTO_PRIORITY_START,
            MergedRouteRules::AUTO_PRIORITY_START + 1
        ]
    );

    // Rules are stored on the interface holding routes of the table
    let apply_state = merged.gen_state_for_apply();
    let eth1_iface = apply_state.ifaces.kernel_ifaces.get("eth1").unwrap();
    let ipv4 = eth1_iface.base_iface().ipv4.as_ref().unwrap();
    assert_eq!(ipv4.metadata().route_rules.as_ref().map(|r| r.len()), Some(2));
    assert!(ipv4.metadata().rules_changed);
}

#[test]
fn test_route_rule_reuse_current_priority() {
    let mut current = NetworkState::new_from_yaml(CURRENT_STATE).unwrap();
    let current_rules: NetworkState = serde_yaml::from_str(
        r#"
        route-rules:
          config:
          - family: ipv4
            ip-from: 192.0.2.0/24
            route-table: 100
            priority: 30000
        "#,
    )
    .unwrap();
    current.rules = current_rules.rules;

    let desired: NetworkState = serde_yaml::from_str(
        r#"
        route-rules:
          config:
          - ip-from: 192.0.2.0/24
            route-table: 100
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    assert!(!merged.rules.is_changed());
    assert!(!merged.is_changed());
    assert_eq!(merged.rules.merged.len(), 1);
    assert_eq!(merged.rules.merged[0].priority, Some(30000));
}

#[test]
fn test_route_rule_skip_used_priority() {
    let mut current = NetworkState::new_from_yaml(CURRENT_STATE).unwrap();
    let current_rules: NetworkState = serde_yaml::from_str(
        r#"
        route-rules:
          config:
          - family: ipv4
            ip-from: 192.0.2.0/24
            route-table: 100
            priority: 30000
        "#,
    )
    .unwrap();
    current.rules = current_rules.rules;

    let desired: NetworkState = serde_yaml::from_str(
        r#"
        route-rules:
          config:
          - ip-to: 198.51.100.1
            route-table: 100
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    assert_eq!(merged.rules.for_apply.len(), 1);
    assert_eq!(merged.rules.for_apply[0].priority, Some(30001));
}

#[test]
fn test_route_rule_table_without_route() {
    let current = NetworkState::new_from_yaml(CURRENT_STATE).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        route-rules:
          config:
          - ip-from: 192.0.2.0/24
            route-table: 200
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
fn test_route_rule_main_table_is_always_valid() {
    let current = NetworkState::new_from_yaml(CURRENT_STATE).unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        route-rules:
          config:
          - ip-from: 192.0.2.0/24
            priority: 1000
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    assert_eq!(merged.rules.for_apply.len(), 1);
    assert_eq!(merged.rules.for_apply[0].table_id, Some(254));
    assert_eq!(merged.rules.for_apply[0].priority, Some(1000));
}

#[test]
fn test_route_rule_absent() {
    let mut current = NetworkState::new_from_yaml(CURRENT_STATE).unwrap();
    let current_rules: NetworkState = serde_yaml::from_str(
        r#"
        route-rules:
          config:
          - family: ipv4
            ip-from: 192.0.2.0/24
            route-table: 100
            priority: 30000
          - family: ipv4
            ip-to: 198.51.100.1/32
            route-table: 100
            priority: 30001
        "#,
    )
    .unwrap();
    current.rules = current_rules.rules;

    let desired: NetworkState = serde_yaml::from_str(
        r#"
        route-rules:
          config:
          - ip-to: 198.51.100.1
            state: absent
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    assert_eq!(merged.rules.for_apply.len(), 1);
    assert_eq!(
        merged.rules.for_apply[0].state,
        Some(RouteRuleState::Absent)
    );
    assert_eq!(merged.rules.merged.len(), 1);
    assert_eq!(merged.rules.merged[0].priority, Some(30000));
}
