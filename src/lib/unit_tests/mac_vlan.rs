// SPDX-License-Identifier: Apache-2.0

use crate::{
    ErrorKind, Interface, MacVlanMode, MergedNetworkState, NetstateError,
    NetworkState,
};

const CURRENT_ETH1: &str = r#"
interfaces:
- name: eth1
  type: ethernet
  state: up
"#;

fn merge_with_eth1(
    desired_yaml: &str,
) -> Result<MergedNetworkState, NetstateError> {
    let desired = NetworkState::new_from_yaml(desired_yaml)?;
    let current = NetworkState::new_from_yaml(CURRENT_ETH1)?;
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
fn test_mac_vlan_new() {
    let merged = merge_with_eth1(
        r#"
        interfaces:
        - name: mac0
          type: mac-vlan
          state: up
          mac-vlan:
            base-iface: eth1
            mode: bridge
            accept-all-mac: true
        "#,
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::MacVlan(mac_vlan_iface)) =
        apply_state.ifaces.kernel_ifaces.get("mac0")
    else {
        panic!("mac0 not found in {apply_state}");
    };
    let conf = mac_vlan_iface.mac_vlan.as_ref().unwrap();
    assert_eq!(conf.base_iface.as_deref(), Some("eth1"));
    assert_eq!(conf.mode, Some(MacVlanMode::Bridge));
    assert_eq!(conf.promiscuous, Some(true));
}

#[test]
fn test_mac_vlan_missing_mode() {
    let result = merge_with_eth1(
        r#"
        interfaces:
        - name: mac0
          type: mac-vlan
          state: up
          mac-vlan:
            base-iface: eth1
        "#,
    );
    assert_invalid_argument(result, "mac-vlan.mode");
}

#[test]
fn test_mac_vlan_unknown_parent() {
    let result = merge_with_eth1(
        r#"
        interfaces:
        - name: mac0
          type: mac-vlan
          state: up
          mac-vlan:
            base-iface: eth9
            mode: vepa
        "#,
    );
    assert_invalid_argument(result, "unknown parent eth9");
}

#[test]
fn test_mac_vlan_disable_promiscuous() {
    let result = merge_with_eth1(
        r#"
        interfaces:
        - name: mac0
          type: mac-vlan
          state: up
          mac-vlan:
            base-iface: eth1
            mode: vepa
            promiscuous: false
        "#,
    );
    assert_invalid_argument(result, "only allowed on passthru mode");

    merge_with_eth1(
        r#"
        interfaces:
        - name: mac0
          type: mac-vlan
          state: up
          mac-vlan:
            base-iface: eth1
            mode: passthru
            promiscuous: false
        "#,
    )
    .unwrap();
}

#[test]
fn test_mac_vtap_new() {
    let merged = merge_with_eth1(
        r#"
        interfaces:
        - name: tap0
          type: mac-vtap
          state: up
          mac-vtap:
            base-iface: eth1
            mode: passthru
            promiscuous: false
        "#,
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::MacVtap(mac_vtap_iface)) =
        apply_state.ifaces.kernel_ifaces.get("tap0")
    else {
        panic!("tap0 not found in {apply_state}");
    };
    let conf = mac_vtap_iface.mac_vtap.as_ref().unwrap();
    assert_eq!(conf.mode, Some(MacVlanMode::Passthru));
    assert_eq!(conf.promiscuous, Some(false));
}

#[test]
fn test_mac_vtap_invalid_conf() {
    let result = merge_with_eth1(
        r#"
        interfaces:
        - name: tap0
          type: mac-vtap
          state: up
          mac-vtap:
            mode: vepa
        "#,
    );
    assert_invalid_argument(result, "mac-vtap.base-iface");

    let result = merge_with_eth1(
        r#"
        interfaces:
        - name: tap0
          type: mac-vtap
          state: up
          mac-vtap:
            base-iface: eth1
            mode: unknown
        "#,
    );
    assert_invalid_argument(result, "Mode unknown is not supported");
}
