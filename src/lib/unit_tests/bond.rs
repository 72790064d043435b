// SPDX-License-Identifier: Apache-2.0

use crate::{
    BondConfig, BondLacpRate, BondMode, BondXmitHashPolicy, ErrorKind,
    Interface, MergedNetworkState, NetworkState,
};

#[test]
fn test_bond_mode_change_discard_current_options() {
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: balance-rr
            options:
              miimon: 100
            port:
            - eth1
        - name: eth1
          type: ethernet
          state: up
          controller: bond0
        "#,
    )
    .unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: active-backup
            options:
              arp_interval: 140
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::Bond(bond_iface)) =
        apply_state.ifaces.kernel_ifaces.get("bond0")
    else {
        panic!("bond0 not found in {apply_state}");
    };
    let bond_conf = bond_iface.bond.as_ref().unwrap();
    let opts = bond_conf.options.as_ref().unwrap();

    assert_eq!(bond_conf.mode, Some(BondMode::ActiveBackup));
    assert_eq!(opts.arp_interval, Some(140));
    assert_eq!(opts.arp_ip_target.as_deref(), Some(""));
    assert_eq!(opts.miimon, None);
    assert_eq!(bond_conf.port, Some(vec!["eth1".to_string()]));
}

#[test]
fn test_bond_keep_current_options_without_mode_change() {
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: balance-rr
            options:
              miimon: 100
            port: []
        "#,
    )
    .unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            options:
              updelay: 200
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::Bond(bond_iface)) =
        apply_state.ifaces.kernel_ifaces.get("bond0")
    else {
        panic!("bond0 not found in {apply_state}");
    };
    let opts = bond_iface.bond.as_ref().unwrap().options.as_ref().unwrap();

    assert_eq!(opts.miimon, Some(100));
    assert_eq!(opts.updelay, Some(200));
}

#[test]
fn test_bond_new_without_mode() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            port: []
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
fn test_bond_mac_in_fail_over_mac_active_mode() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          mac-address: 00:23:45:67:89:1A
          link-aggregation:
            mode: active-backup
            options:
              fail_over_mac: active
            port: []
        "#,
    )
    .unwrap();
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: active-backup
            port: []
        "#,
    )
    .unwrap();

    let result =
        MergedNetworkState::new(desired, current, Default::default());

    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
        assert!(e.msg().contains("fail_over_mac"));
    }
}

#[test]
fn test_bond_verify_ignore_option_drift() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: balance-rr
            options:
              miimon: 100
              updelay: 150
            port: []
        "#,
    )
    .unwrap();
    let post_apply: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: balance-rr
            options:
              miimon: 100
              updelay: 100
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

    merged.verify(&post_apply).unwrap();
}

#[test]
fn test_bond_miimon_and_arp_interval_conflict() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: active-backup
            options:
              miimon: 100
              arp_interval: 100
            port: []
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
        assert!(e.msg().contains("conflicting with miimon"));
    }
}

#[test]
fn test_bond_miimon_disabled_with_arp_interval() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: active-backup
            options:
              miimon: 0
              arp_interval: 100
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

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::Bond(bond_iface)) =
        apply_state.ifaces.kernel_ifaces.get("bond0")
    else {
        panic!("bond0 not found in {apply_state}");
    };
    let opts = bond_iface.bond.as_ref().unwrap().options.as_ref().unwrap();
    assert_eq!(opts.arp_interval, Some(100));
    assert_eq!(opts.arp_ip_target.as_deref(), Some(""));
}

#[test]
fn test_bond_ad_actor_system_multicast() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: 802.3ad
            options:
              ad_actor_system: "01:00:5e:00:0f:01"
            port: []
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
        assert!(e.msg().contains("01:00:5E"));
    }
}

#[test]
fn test_bond_ad_actor_system_uppercase() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: bond0
          type: bond
          state: up
          link-aggregation:
            mode: 802.3ad
            options:
              ad_actor_system: "02:00:5e:00:0f:0a"
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

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::Bond(bond_iface)) =
        apply_state.ifaces.kernel_ifaces.get("bond0")
    else {
        panic!("bond0 not found in {apply_state}");
    };
    let opts = bond_iface.bond.as_ref().unwrap().options.as_ref().unwrap();
    assert_eq!(opts.ad_actor_system.as_deref(), Some("02:00:5E:00:0F:0A"));
}

#[test]
fn test_bond_numeric_mode_and_options() {
    let bond_conf: BondConfig = serde_yaml::from_str(
        r#"
        mode: 4
        options:
          lacp_rate: 1
          xmit_hash_policy: "2"
          miimon: "100"
        "#,
    )
    .unwrap();

    assert_eq!(bond_conf.mode, Some(BondMode::LACP));
    let opts = bond_conf.options.as_ref().unwrap();
    assert_eq!(opts.lacp_rate, Some(BondLacpRate::Fast));
    assert_eq!(opts.xmit_hash_policy, Some(BondXmitHashPolicy::Layer23));
    assert_eq!(opts.miimon, Some(100));

    let value = serde_json::to_value(&bond_conf).unwrap();
    assert_eq!(value["mode"], "802.3ad");
    assert_eq!(value["options"]["lacp_rate"], "fast");
    assert_eq!(value["options"]["xmit_hash_policy"], "layer2+3");
}
