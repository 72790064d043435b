// SPDX-License-Identifier: Apache-2.0

use crate::{
    BridgeVlanConfig, ErrorKind, Interface, InterfaceType,
    MergedNetworkState, NetworkState,
};

#[test]
fn test_bridge_port_trunk_to_access() {
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          bridge:
            port:
            - name: eth1
              vlan:
                mode: trunk
                tag: 100
                enable-native: true
                trunk-tags:
                - id: 101
                - id-range:
                    min: 500
                    max: 599
        - name: eth1
          type: ethernet
          state: up
          controller: br0
        "#,
    )
    .unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          bridge:
            port:
            - name: eth1
              vlan:
                mode: access
                tag: 305
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::LinuxBridge(br_iface)) =
        apply_state.ifaces.kernel_ifaces.get("br0")
    else {
        panic!("br0 not found in {apply_state}");
    };
    let port_conf = br_iface.get_port_conf("eth1").unwrap();

    let expected: BridgeVlanConfig = serde_yaml::from_str(
        r#"
        mode: access
        tag: 305
        "#,
    )
    .unwrap();

    assert_eq!(port_conf.vlan.as_ref(), Some(&expected));
}

#[test]
fn test_bridge_port_access_with_trunk_tags() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          bridge:
            port:
            - name: eth1
              vlan:
                mode: access
                tag: 305
                trunk-tags:
                - id: 101
        - name: eth1
          type: ethernet
          state: up
        "#,
    )
    .unwrap();
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
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
fn test_bridge_port_metadata() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          bridge:
            options:
              stp:
                enabled: false
            port:
            - name: eth1
              stp-priority: 32
            - name: eth2
        "#,
    )
    .unwrap();
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
        - name: eth2
          type: ethernet
          state: up
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    for port_name in ["eth1", "eth2"] {
        let port_iface = merged
            .ifaces
            .get_iface(port_name, &InterfaceType::Ethernet)
            .unwrap();
        assert!(port_iface.is_for_apply());

        let value = port_iface.metadata_value().unwrap();
        assert_eq!(value["_controller"], serde_json::json!("br0"));
        assert_eq!(
            value["_controller_type"],
            serde_json::json!("linux-bridge")
        );
        assert_eq!(
            value["_brport_options"]["name"],
            serde_json::json!(port_name)
        );
    }

    let eth1_value = merged
        .ifaces
        .get_iface("eth1", &InterfaceType::Ethernet)
        .unwrap()
        .metadata_value()
        .unwrap();
    assert_eq!(
        eth1_value["_brport_options"]["stp-priority"],
        serde_json::json!(32)
    );
}

#[test]
fn test_bridge_verify_kernel_rounded_multicast_timer() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          bridge:
            options:
              multicast-membership-interval: 26000
            port: []
        "#,
    )
    .unwrap();
    let post_apply: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          bridge:
            options:
              multicast-membership-interval: 25999
            port: []
        "#,
    )
    .unwrap();

    let merged = MergedNetworkState::new(
        desired,
        NetworkState::default(),
        Default::default(),
    )
    .unwrap();

    let result = merged.verify(&post_apply);

    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::KernelIntegerRoundedError);
    }
}

#[test]
fn test_bridge_verify_multicast_timer_real_difference() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          bridge:
            options:
              multicast-membership-interval: 26000
            port: []
        "#,
    )
    .unwrap();
    let post_apply: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          bridge:
            options:
              multicast-membership-interval: 20000
            port: []
        "#,
    )
    .unwrap();

    let merged = MergedNetworkState::new(
        desired,
        NetworkState::default(),
        Default::default(),
    )
    .unwrap();

    let result = merged.verify(&post_apply);

    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::VerificationError);
    }
}

#[test]
fn test_bridge_verify_rounded_timer_with_other_difference() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          bridge:
            options:
              multicast-membership-interval: 26000
              multicast-snooping: true
            port: []
        "#,
    )
    .unwrap();
    let post_apply: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: br0
          type: linux-bridge
          state: up
          bridge:
            options:
              multicast-membership-interval: 25999
              multicast-snooping: false
            port: []
        "#,
    )
    .unwrap();

    let merged = MergedNetworkState::new(
        desired,
        NetworkState::default(),
        Default::default(),
    )
    .unwrap();

    let result = merged.verify(&post_apply);

    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::VerificationError);
        assert!(e.msg().contains("multicast-snooping"));
    }
}
