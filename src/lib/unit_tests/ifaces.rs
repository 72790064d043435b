// SPDX-License-Identifier: Apache-2.0

use crate::{
    ErrorKind, InfiniBandConfig, Interface, InterfaceState, InterfaceType,
    MergedNetworkState, NetstateError, NetstateInterface, NetworkState,
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

#[test]
fn test_vlan_id_range() {
    for vlan_id in [0u32, 4095] {
        let desired = format!(
            r#"
            interfaces:
            - name: eth1.{vlan_id}
              type: vlan
              state: up
              vlan:
                base-iface: eth1
                id: {vlan_id}
            "#
        );
        merge_with_eth1(&desired).unwrap();
    }

    let result = merge_with_eth1(
        r#"
        interfaces:
        - name: eth1.4096
          type: vlan
          state: up
          vlan:
            base-iface: eth1
            id: 4096
        "#,
    );
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn test_vlan_without_base_iface() {
    let result = merge_with_eth1(
        r#"
        interfaces:
        - name: vlan101
          type: vlan
          state: up
          vlan:
            id: 101
        "#,
    );
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn test_vxlan_id_range() {
    for vxlan_id in [0u32, 16777215] {
        let desired = format!(
            r#"
            interfaces:
            - name: vxlan0
              type: vxlan
              state: up
              vxlan:
                base-iface: eth1
                id: {vxlan_id}
                remote: 192.0.2.1
            "#
        );
        merge_with_eth1(&desired).unwrap();
    }

    let result = merge_with_eth1(
        r#"
        interfaces:
        - name: vxlan0
          type: vxlan
          state: up
          vxlan:
            base-iface: eth1
            id: 16777216
            remote: 192.0.2.1
        "#,
    );
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn test_vxlan_without_remote() {
    let result = merge_with_eth1(
        r#"
        interfaces:
        - name: vxlan0
          type: vxlan
          state: up
          vxlan:
            base-iface: eth1
            id: 101
        "#,
    );
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
        assert!(e.msg().contains("vxlan.remote"));
    }
}

#[test]
fn test_infiniband_pkey_range() {
    for pkey in ["1", "0xffff", "\"0x8001\""] {
        let conf: InfiniBandConfig = serde_yaml::from_str(&format!(
            r#"
            mode: datagram
            base-iface: ib0
            pkey: {pkey}
            "#
        ))
        .unwrap();
        assert!(conf.pkey.is_some());
    }

    for pkey in ["0", "0x10000"] {
        let result = serde_yaml::from_str::<InfiniBandConfig>(&format!(
            r#"
            mode: datagram
            base-iface: ib0
            pkey: {pkey}
            "#
        ));
        assert!(result.is_err());
    }
}

#[test]
fn test_infiniband_pkey_name_mismatch() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: ib0.8001
          type: infiniband
          state: up
          infiniband:
            mode: datagram
            base-iface: ib0
            pkey: "0x8002"
        "#,
    )
    .unwrap();
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: ib0
          type: infiniband
          state: up
          infiniband:
            mode: datagram
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
fn test_child_marked_absent_with_parent() {
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
        - name: eth1.101
          type: vlan
          state: up
          vlan:
            base-iface: eth1
            id: 101
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: balance-rr
            port: []
        - name: bond0.102
          type: vlan
          state: up
          vlan:
            base-iface: bond0
            id: 102
        "#,
    )
    .unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: absent
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    let apply_state = merged.gen_state_for_apply();
    assert_eq!(
        apply_state
            .ifaces
            .kernel_ifaces
            .get("bond0.102")
            .map(|i| i.iface_state()),
        Some(InterfaceState::Absent)
    );
    assert!(apply_state.ifaces.kernel_ifaces.get("eth1.101").is_none());
}

#[test]
fn test_child_desired_up_with_parent_absent() {
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: balance-rr
            port: []
        - name: bond0.102
          type: vlan
          state: up
          vlan:
            base-iface: bond0
            id: 102
        "#,
    )
    .unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: absent
        - name: bond0.102
          type: vlan
          state: up
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
fn test_new_veth_bring_peer_up() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: veth1
          type: veth
          state: up
          veth:
            peer: veth1.ep
        "#,
    )
    .unwrap();

    let merged = MergedNetworkState::new(
        desired,
        NetworkState::default(),
        Default::default(),
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::Ethernet(peer_iface)) =
        apply_state.ifaces.kernel_ifaces.get("veth1.ep")
    else {
        panic!("veth1.ep not found in {apply_state}");
    };
    assert!(peer_iface.is_up());
    assert_eq!(peer_iface.veth_peer(), Some("veth1"));
    assert!(peer_iface.is_veth_peer());
}

#[test]
fn test_new_veth_pair_both_desired() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: veth1
          type: veth
          state: up
          veth:
            peer: veth0
        - name: veth0
          type: veth
          state: up
          veth:
            peer: veth1
        "#,
    )
    .unwrap();

    let merged = MergedNetworkState::new(
        desired.clone(),
        NetworkState::default(),
        Default::default(),
    )
    .unwrap();

    let veth0 = merged.ifaces.kernel_ifaces.get("veth0").unwrap();
    let veth1 = merged.ifaces.kernel_ifaces.get("veth1").unwrap();
    let veth0_value = veth0.metadata_value().unwrap();
    let veth1_value = veth1.metadata_value().unwrap();
    assert!(veth0_value.get("_is_veth_peer").is_none());
    assert_eq!(veth1_value["_is_veth_peer"], serde_json::Value::Bool(true));

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::Ethernet(veth1_iface)) =
        apply_state.ifaces.kernel_ifaces.get("veth1")
    else {
        panic!("veth1 not found in {apply_state}");
    };
    assert!(veth1_iface.is_veth_peer());
    assert_eq!(veth1_iface.veth_peer(), Some("veth0"));

    let keyfiles = desired.gen_conf().unwrap();
    let veth0_conf = keyfiles.iter().find(|k| k.id == "veth0").unwrap();
    let veth1_conf = keyfiles.iter().find(|k| k.id == "veth1").unwrap();
    assert_eq!(veth0_conf.get("connection", "type"), Some("veth"));
    assert_eq!(veth0_conf.get("veth", "peer"), Some("veth1"));
    assert_eq!(veth1_conf.get("connection", "type"), Some("ethernet"));
    assert!(!veth1_conf.has_section("veth"));
}

#[test]
fn test_new_ethernet_without_veth_peer() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth9
          type: ethernet
          state: up
        "#,
    )
    .unwrap();

    let result = MergedNetworkState::new(
        desired,
        NetworkState::default(),
        Default::default(),
    );
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn test_veth_absent_remove_peer() {
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: veth1
          type: veth
          state: up
          veth:
            peer: veth1.ep
        - name: veth1.ep
          type: veth
          state: up
          veth:
            peer: veth1
        "#,
    )
    .unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: veth1
          type: veth
          state: absent
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    let apply_state = merged.gen_state_for_apply();
    assert_eq!(
        apply_state
            .ifaces
            .kernel_ifaces
            .get("veth1.ep")
            .map(|i| i.iface_state()),
        Some(InterfaceState::Absent)
    );
}

#[test]
fn test_iface_type_from_current() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth1
          mtu: 1400
        "#,
    )
    .unwrap();
    let current = NetworkState::new_from_yaml(CURRENT_ETH1).unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let iface = apply_state.ifaces.kernel_ifaces.get("eth1").unwrap();
    assert_eq!(iface.iface_type(), &InterfaceType::Ethernet);
    assert_eq!(iface.base_iface().mtu, Some(1400));
}

#[test]
fn test_iface_without_type_not_exist() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth9
          mtu: 1400
        - name: eth8
          state: absent
        "#,
    )
    .unwrap();

    let result = MergedNetworkState::new(
        desired.clone(),
        NetworkState::default(),
        Default::default(),
    );
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn test_absent_iface_not_exist() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: dummy0
          type: dummy
          state: absent
        - name: eth8
          state: absent
        "#,
    )
    .unwrap();

    let merged = MergedNetworkState::new(
        desired,
        NetworkState::default(),
        Default::default(),
    )
    .unwrap();

    assert!(merged.gen_state_for_apply().ifaces.is_empty());
    assert!(!merged.is_changed());
}

#[test]
fn test_ignored_iface_not_in_plan() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: ignore
          mtu: 1400
        "#,
    )
    .unwrap();
    let current = NetworkState::new_from_yaml(CURRENT_ETH1).unwrap();

    let merged =
        MergedNetworkState::new(desired, current.clone(), Default::default())
            .unwrap();

    assert!(merged.gen_state_for_apply().ifaces.is_empty());
    merged.verify(&current).unwrap();
}

#[test]
fn test_port_up_priority() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          bridge:
            port:
            - name: bond0
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: balance-rr
            port:
            - eth1
        "#,
    )
    .unwrap();
    let current = NetworkState::new_from_yaml(CURRENT_ETH1).unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let names: Vec<&str> =
        apply_state.ifaces.to_vec().iter().map(|i| i.name()).collect();
    assert_eq!(names, vec!["br0", "bond0", "eth1"]);

    let bond0 = apply_state.ifaces.kernel_ifaces.get("bond0").unwrap();
    assert_eq!(bond0.base_iface().controller.as_deref(), Some("br0"));
    assert_eq!(
        bond0.base_iface().controller_type,
        Some(InterfaceType::LinuxBridge)
    );
}
