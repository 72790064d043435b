// SPDX-License-Identifier: Apache-2.0

use crate::{
    ErrorKind, Interface, InterfaceType, MergedNetworkState, NetstateError,
    NetstateInterface, NetworkState,
};

const CURRENT_BR0_WITH_PORTS: &str = r#"
interfaces:
- name: br0
  type: linux-bridge
  state: up
  bridge:
    port:
    - name: eth1
    - name: eth2
- name: eth1
  type: ethernet
  state: up
  controller: br0
  mac-address: 00:23:45:67:89:1A
  permanent-mac-address: 00:23:45:67:89:1B
- name: eth2
  type: ethernet
  state: up
  controller: br0
  mac-address: 00:23:45:67:89:2A
- name: eth3
  type: ethernet
  state: up
  ipv4:
    enabled: true
    dhcp: true
- name: ib0
  type: infiniband
  state: up
  infiniband:
    mode: datagram
"#;

fn merge_with_br0(
    desired_yaml: &str,
) -> Result<MergedNetworkState, NetstateError> {
    let desired = NetworkState::new_from_yaml(desired_yaml)?;
    let current = NetworkState::new_from_yaml(CURRENT_BR0_WITH_PORTS)?;
    MergedNetworkState::new(desired, current, Default::default())
}

fn assert_invalid_argument(
    result: Result<MergedNetworkState, NetstateError>,
    msg: &str,
) {
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
        assert!(e.msg().contains(msg), "unexpected error: {e}");
    }
}

#[test]
fn test_port_overbooked_by_two_controllers() {
    let result = merge_with_br0(
        r#"
        interfaces:
        - name: br1
          type: linux-bridge
          state: up
          bridge:
            port:
            - name: eth3
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: active-backup
            port:
            - eth3
        "#,
    );
    assert_invalid_argument(result, "overbooked");
}

#[test]
fn test_port_controller_not_in_port_list() {
    let result = merge_with_br0(
        r#"
        interfaces:
        - name: br1
          type: linux-bridge
          state: up
          bridge:
            port: []
        - name: eth3
          type: ethernet
          state: up
          controller: br1
        "#,
    );
    assert_invalid_argument(result, "not listed in port list");
}

#[test]
fn test_port_controller_not_found() {
    let result = merge_with_br0(
        r#"
        interfaces:
        - name: eth3
          type: ethernet
          state: up
          controller: br9
        "#,
    );
    assert_invalid_argument(result, "br9 not found");
}

#[test]
fn test_port_controller_listed_by_other_controller() {
    let result = merge_with_br0(
        r#"
        interfaces:
        - name: br1
          type: linux-bridge
          state: up
          bridge:
            port:
            - name: eth3
        - name: br2
          type: linux-bridge
          state: up
        - name: eth3
          type: ethernet
          state: up
          controller: br2
        "#,
    );
    assert_invalid_argument(result, "been listed as port of controller br1");
}

#[test]
fn test_port_detach_but_still_in_port_list() {
    let result = merge_with_br0(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          bridge:
            port:
            - name: eth1
            - name: eth2
        - name: eth1
          type: ethernet
          state: up
          controller: ""
        "#,
    );
    assert_invalid_argument(result, "desired to detach controller");
}

#[test]
fn test_port_detach_by_empty_controller() {
    let merged = merge_with_br0(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          controller: ""
        "#,
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let eth1_iface = apply_state.ifaces.kernel_ifaces.get("eth1").unwrap();
    assert_eq!(eth1_iface.base_iface().controller.as_deref(), Some(""));
}

#[test]
fn test_bridge_port_removed_from_port_list() {
    let merged = merge_with_br0(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          bridge:
            port:
            - name: eth1
        "#,
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::LinuxBridge(br_iface)) =
        apply_state.ifaces.kernel_ifaces.get("br0")
    else {
        panic!("br0 not found in {apply_state}");
    };
    assert_eq!(br_iface.ports(), Some(vec!["eth1"]));

    let eth2_iface = apply_state.ifaces.kernel_ifaces.get("eth2").unwrap();
    assert_eq!(eth2_iface.base_iface().controller.as_deref(), Some(""));
    assert_eq!(eth2_iface.base_iface().controller_type, None);
    assert!(apply_state.ifaces.kernel_ifaces.get("eth1").is_none());
}

#[test]
fn test_bridge_empty_port_list_detach_all() {
    let merged = merge_with_br0(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          bridge:
            port: []
        "#,
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::LinuxBridge(br_iface)) =
        apply_state.ifaces.kernel_ifaces.get("br0")
    else {
        panic!("br0 not found in {apply_state}");
    };
    assert_eq!(br_iface.ports(), Some(Vec::new()));
    for port_name in ["eth1", "eth2"] {
        let port_iface =
            apply_state.ifaces.kernel_ifaces.get(port_name).unwrap();
        assert_eq!(port_iface.base_iface().controller.as_deref(), Some(""));
    }
}

#[test]
fn test_bridge_without_port_list_keep_ports() {
    let merged = merge_with_br0(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
        "#,
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::LinuxBridge(br_iface)) =
        apply_state.ifaces.kernel_ifaces.get("br0")
    else {
        panic!("br0 not found in {apply_state}");
    };
    assert_eq!(br_iface.ports(), Some(vec!["eth1", "eth2"]));
    assert!(apply_state.ifaces.kernel_ifaces.get("eth2").is_none());
}

#[test]
fn test_copy_mac_from_port_permanent_mac() {
    let merged = merge_with_br0(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          copy-mac-from: eth1
        - name: bond0
          type: bond
          state: up
          copy-mac-from: eth3
          link-aggregation:
            mode: active-backup
            port:
            - eth3
        "#,
    );
    // eth3 holds no MAC address in current state
    assert_invalid_argument(merged, "Failed to find MAC address");

    let merged = merge_with_br0(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          copy-mac-from: eth1
        "#,
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let br0_iface = apply_state.ifaces.kernel_ifaces.get("br0").unwrap();
    assert_eq!(
        br0_iface.base_iface().mac_address.as_deref(),
        Some("00:23:45:67:89:1B")
    );
}

#[test]
fn test_copy_mac_from_non_port() {
    let result = merge_with_br0(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          copy-mac-from: eth3
        "#,
    );
    assert_invalid_argument(result, "which is not its port");
}

#[test]
fn test_infiniband_as_bridge_port() {
    let result = merge_with_br0(
        r#"
        interfaces:
        - name: br1
          type: linux-bridge
          state: up
          bridge:
            port:
            - name: ib0
        "#,
    );
    assert_invalid_argument(result, "only active-backup bond is allowed");
}

#[test]
fn test_infiniband_as_bond_port() {
    let result = merge_with_br0(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: balance-rr
            port:
            - ib0
        "#,
    );
    assert_invalid_argument(result, "only active-backup bond is allowed");

    let merged = merge_with_br0(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: active-backup
            port:
            - ib0
        "#,
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let ib0_iface = apply_state.ifaces.kernel_ifaces.get("ib0").unwrap();
    assert_eq!(ib0_iface.base_iface().controller.as_deref(), Some("bond0"));
    assert_eq!(
        ib0_iface.base_iface().controller_type,
        Some(InterfaceType::Bond)
    );
}

#[test]
fn test_port_with_ip_enabled_in_desired() {
    let result = merge_with_br0(
        r#"
        interfaces:
        - name: br1
          type: linux-bridge
          state: up
          bridge:
            port:
            - name: eth3
        - name: eth3
          type: ethernet
          state: up
          ipv4:
            enabled: true
            dhcp: true
        "#,
    );
    assert_invalid_argument(result, "does not allow IP on its ports");
}

#[test]
fn test_port_ip_disabled_when_attached() {
    let merged = merge_with_br0(
        r#"
        interfaces:
        - name: br1
          type: linux-bridge
          state: up
          bridge:
            port:
            - name: eth3
        "#,
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let eth3_iface = apply_state.ifaces.kernel_ifaces.get("eth3").unwrap();
    let base_iface = eth3_iface.base_iface();
    assert_eq!(base_iface.controller.as_deref(), Some("br1"));
    assert_eq!(base_iface.ipv4.as_ref().and_then(|i| i.enabled), Some(false));
    assert_eq!(base_iface.ipv6.as_ref().and_then(|i| i.enabled), Some(false));
}

#[test]
fn test_vrf_port_keep_ip() {
    let merged = merge_with_br0(
        r#"
        interfaces:
        - name: vrf0
          type: vrf
          state: up
          vrf:
            route-table-id: 100
            port:
            - eth3
        - name: eth3
          type: ethernet
          state: up
          ipv4:
            enabled: true
            dhcp: true
        "#,
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let eth3_iface = apply_state.ifaces.kernel_ifaces.get("eth3").unwrap();
    let base_iface = eth3_iface.base_iface();
    assert_eq!(base_iface.controller.as_deref(), Some("vrf0"));
    assert_eq!(base_iface.controller_type, Some(InterfaceType::Vrf));
    assert_eq!(base_iface.ipv4.as_ref().and_then(|i| i.enabled), Some(true));
}
