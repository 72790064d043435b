// SPDX-License-Identifier: Apache-2.0

use crate::{
    ErrorKind, Interface, InterfaceType, MergedNetworkState, NetstateError,
    NetstateInterface, NetworkState,
};

const CURRENT_ETH: &str = r#"
interfaces:
- name: eth1
  type: ethernet
  state: up
- name: eth2
  type: ethernet
  state: up
"#;

fn merge_with_eth(
    desired_yaml: &str,
) -> Result<MergedNetworkState, NetstateError> {
    let desired = NetworkState::new_from_yaml(desired_yaml)?;
    let current = NetworkState::new_from_yaml(CURRENT_ETH)?;
    MergedNetworkState::new(desired, current, Default::default())
}

#[test]
fn test_ovs_unknown_port_as_internal_iface() {
    let merged = merge_with_eth(
        r#"
        interfaces:
        - name: br0
          type: ovs-bridge
          state: up
          bridge:
            port:
            - name: eth1
            - name: ovs0
        "#,
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::OvsInterface(ovs_iface)) =
        apply_state.ifaces.kernel_ifaces.get("ovs0")
    else {
        panic!("ovs0 not found in {apply_state}");
    };
    assert!(ovs_iface.is_up());
    assert_eq!(ovs_iface.base.controller.as_deref(), Some("br0"));
    assert_eq!(
        ovs_iface.base.controller_type,
        Some(InterfaceType::OvsBridge)
    );

    let Some(Interface::Ethernet(eth_iface)) =
        apply_state.ifaces.kernel_ifaces.get("eth1")
    else {
        panic!("eth1 not found in {apply_state}");
    };
    assert_eq!(eth_iface.base.controller.as_deref(), Some("br0"));
    assert!(apply_state.ifaces.kernel_ifaces.get("eth2").is_none());
}

#[test]
fn test_ovs_link_aggregation_with_single_port() {
    let result = merge_with_eth(
        r#"
        interfaces:
        - name: br0
          type: ovs-bridge
          state: up
          bridge:
            port:
            - name: bond1
              link-aggregation:
                mode: balance-slb
                port:
                - name: eth1
        "#,
    );
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
        assert!(e.msg().contains("bond1"));
    }
}

#[test]
fn test_ovs_link_aggregation_members_as_ports() {
    let merged = merge_with_eth(
        r#"
        interfaces:
        - name: br0
          type: ovs-bridge
          state: up
          bridge:
            port:
            - name: bond1
              link-aggregation:
                mode: balance-slb
                port:
                - name: eth2
                - name: eth1
        "#,
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    for port_name in ["eth1", "eth2"] {
        let port_iface =
            apply_state.ifaces.kernel_ifaces.get(port_name).unwrap();
        assert_eq!(
            port_iface.base_iface().controller.as_deref(),
            Some("br0")
        );
    }
    assert!(apply_state.ifaces.kernel_ifaces.get("bond1").is_none());
}

#[test]
fn test_ovs_patch_peer_not_exist() {
    let result = merge_with_eth(
        r#"
        interfaces:
        - name: br0
          type: ovs-bridge
          state: up
          bridge:
            port:
            - name: patch0
        - name: patch0
          type: ovs-interface
          state: up
          controller: br0
          patch:
            peer: patch1
        "#,
    );
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
        assert!(e.msg().contains("does not exist"));
    }
}

#[test]
fn test_ovs_patch_peer_not_patch() {
    let result = merge_with_eth(
        r#"
        interfaces:
        - name: br0
          type: ovs-bridge
          state: up
          bridge:
            port:
            - name: patch0
            - name: ovs1
        - name: patch0
          type: ovs-interface
          state: up
          controller: br0
          patch:
            peer: ovs1
        "#,
    );
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
        assert!(e.msg().contains("not OVS patch interface"));
    }
}

#[test]
fn test_ovs_patch_pair() {
    let merged = merge_with_eth(
        r#"
        interfaces:
        - name: br0
          type: ovs-bridge
          state: up
          bridge:
            port:
            - name: patch0
        - name: br1
          type: ovs-bridge
          state: up
          bridge:
            port:
            - name: patch1
        - name: patch0
          type: ovs-interface
          state: up
          controller: br0
          patch:
            peer: patch1
        - name: patch1
          type: ovs-interface
          state: up
          controller: br1
          patch:
            peer: patch0
        "#,
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::OvsInterface(patch_iface)) =
        apply_state.ifaces.kernel_ifaces.get("patch1")
    else {
        panic!("patch1 not found in {apply_state}");
    };
    assert!(patch_iface.is_patch());
    assert_eq!(patch_iface.base.controller.as_deref(), Some("br1"));
}
