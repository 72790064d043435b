// SPDX-License-Identifier: Apache-2.0

use crate::{
    ErrorKind, Interface, InterfaceType, NetstateInterface, NetworkPolicy,
    NetworkState,
};

const CURRENT_STATE: &str = r#"
interfaces:
- name: eth1
  type: ethernet
  state: up
  mac-address: 00:23:45:67:89:1A
  ipv4:
    enabled: true
    address:
    - ip: 192.0.2.251
      prefix-length: 24
- name: eth2
  type: ethernet
  state: up
  mac-address: 00:23:45:67:89:1B
routes:
  running:
  - destination: 0.0.0.0/0
    next-hop-address: 192.0.2.1
    next-hop-interface: eth1
    table-id: 254
  - destination: 198.51.100.0/24
    next-hop-address: 192.0.2.1
    next-hop-interface: eth1
    table-id: 254
  config:
  - destination: 0.0.0.0/0
    next-hop-address: 192.0.2.1
    next-hop-interface: eth1
    table-id: 254
"#;

#[test]
fn test_policy_move_default_gateway_to_bridge() {
    let policy = NetworkPolicy::new_from_yaml(
        r#"
        capture:
          default-gw: 'routes.running.destination=="0.0.0.0/0"'
          base-iface: >-
            interfaces.name ==
            capture.default-gw.routes.running.0.next-hop-interface
          base-iface-routes: >-
            routes.running.next-hop-interface ==
            capture.default-gw.routes.running.0.next-hop-interface
          bridge-routes: >-
            capture.base-iface-routes |
            routes.running.next-hop-interface := "br1"
        desired-state:
          interfaces:
          - name: br1
            type: linux-bridge
            state: up
            mac-address: "{{ capture.base-iface.interfaces.0.mac-address }}"
            ipv4: "{{ capture.base-iface.interfaces.0.ipv4 }}"
            bridge:
              port:
              - name: "{{ capture.base-iface.interfaces.0.name }}"
          routes:
            config: "{{ capture.bridge-routes.routes.running }}"
        "#,
    )
    .unwrap();
    let current = NetworkState::new_from_yaml(CURRENT_STATE).unwrap();

    let state = policy.policy_to_state(&current).unwrap();

    let Some(Interface::LinuxBridge(br_iface)) = state
        .ifaces
        .get("br1", Some(&InterfaceType::LinuxBridge))
    else {
        panic!("br1 not found in {state}");
    };
    assert_eq!(br_iface.ports(), Some(vec!["eth1"]));
    assert_eq!(
        br_iface.base.mac_address.as_deref(),
        Some("00:23:45:67:89:1A")
    );
    assert_eq!(
        br_iface
            .base
            .ipv4
            .as_ref()
            .map(|i| i.addresses()[0].to_string()),
        Some("192.0.2.251/24".to_string())
    );
    assert_eq!(state.ifaces.len(), 1);

    let routes = state.routes.config.unwrap();
    assert_eq!(routes.len(), 2);
    assert!(
        routes
            .iter()
            .all(|r| r.next_hop_iface.as_deref() == Some("br1"))
    );
}

#[test]
fn test_policy_capture_filter_by_value() {
    let policy = NetworkPolicy::new_from_yaml(
        r#"
        capture:
          eth2: interfaces.mac-address == "00:23:45:67:89:1B"
        desired-state:
          interfaces:
          - name: "{{ capture.eth2.interfaces.0.name }}"
            type: ethernet
            state: down
        "#,
    )
    .unwrap();
    let current = NetworkState::new_from_yaml(CURRENT_STATE).unwrap();

    let state = policy.policy_to_state(&current).unwrap();

    let iface = state.ifaces.get("eth2", None).unwrap();
    assert!(iface.is_down());
}

#[test]
fn test_policy_template_with_prefix() {
    let policy = NetworkPolicy::new_from_yaml(
        r#"
        capture:
          gw: 'routes.running.destination=="0.0.0.0/0"'
        desired-state:
          interfaces:
          - name: dummy0
            type: dummy
            state: up
            description: >-
              backup of {{ capture.gw.routes.running.0.next-hop-interface }}
        "#,
    )
    .unwrap();
    let current = NetworkState::new_from_yaml(CURRENT_STATE).unwrap();

    let state = policy.policy_to_state(&current).unwrap();

    let iface = state.ifaces.get("dummy0", None).unwrap();
    assert_eq!(
        iface.base_iface().description.as_deref(),
        Some("backup of eth1")
    );
}

#[test]
fn test_policy_capture_not_found() {
    let policy = NetworkPolicy::new_from_yaml(
        r#"
        desired-state:
          interfaces:
          - name: "{{ capture.nonexist.interfaces.0.name }}"
            type: ethernet
            state: up
        "#,
    )
    .unwrap();
    let current = NetworkState::new_from_yaml(CURRENT_STATE).unwrap();

    let result = policy.policy_to_state(&current);

    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
        let lines: Vec<&str> = e.msg().lines().collect();
        assert_eq!(lines[0], "Failed to find capture nonexist");
        assert_eq!(
            lines[1],
            "| {{ capture.nonexist.interfaces.0.name }}"
        );
        assert_eq!(lines[2], format!("| {}^", " ".repeat(11)));
    }
}

#[test]
fn test_policy_invalid_capture_line() {
    let result = NetworkPolicy::new_from_yaml(
        r#"
        capture:
          gw: routes.running.destination = "0.0.0.0/0"
        "#,
    );

    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn test_policy_empty_desired_state() {
    let policy = NetworkPolicy::new_from_yaml(
        r#"
        capture:
          gw: 'routes.running.destination=="0.0.0.0/0"'
        "#,
    )
    .unwrap();
    let current = NetworkState::new_from_yaml(CURRENT_STATE).unwrap();

    let state = policy.policy_to_state(&current).unwrap();

    assert!(state.is_empty());
}
