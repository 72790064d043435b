// SPDX-License-Identifier: Apache-2.0

use crate::{
    ErrorKind, HostNameState, Interface, MergedNetworkState,
    NetstateApplyOption, NetworkState,
};

#[test]
fn test_unsupported_schema_version() {
    let yaml = r#"
        version: 2
        interfaces: []
        "#;
    let result = NetworkState::new_from_yaml(yaml);
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidSchemaVersion);
    }

    let desired: NetworkState = serde_yaml::from_str(yaml).unwrap();
    let result = MergedNetworkState::new(
        desired,
        NetworkState::default(),
        Default::default(),
    );
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidSchemaVersion);
    }
}

#[test]
fn test_empty_input_is_default_state() {
    let state = NetworkState::new_from_yaml("").unwrap();
    assert_eq!(state, NetworkState::default());
    assert_eq!(state.version, Some(1));
    assert!(state.is_empty());

    let state = NetworkState::new_from_json(r#"{"interfaces": []}"#).unwrap();
    assert!(state.is_empty());
}

#[test]
fn test_unknown_top_level_key() {
    let result = NetworkState::new_from_yaml("interface: []");
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn test_hide_secrets() {
    let mut state = NetworkState::new_from_yaml(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          802.1x:
            identity: client.example.org
            eap-methods:
            - tls
            private-key-password: password
        - name: wg0
          type: wireguard
          state: up
          wireguard:
            private-key: kJgzT6Tc3Nbd2nI4SbMhE1tqqbNAR9plSb6thKZqgXk=
        "#,
    )
    .unwrap();

    let display_output = state.to_string();
    assert!(!display_output.contains(":\"password\""));
    assert!(!display_output.contains("kJgzT6Tc3Nbd2nI4"));
    assert!(display_output.contains(NetworkState::HIDE_PASSWORD_STR));

    state.hide_secrets();

    let Some(Interface::Ethernet(eth_iface)) =
        state.ifaces.kernel_ifaces.get("eth1")
    else {
        panic!("eth1 not found");
    };
    assert_eq!(
        eth_iface
            .base
            .ieee8021x
            .as_ref()
            .and_then(|c| c.private_key_password.as_deref()),
        Some(NetworkState::HIDE_PASSWORD_STR)
    );
    let Some(Interface::Wireguard(wg_iface)) =
        state.ifaces.kernel_ifaces.get("wg0")
    else {
        panic!("wg0 not found");
    };
    assert_eq!(
        wg_iface
            .wireguard
            .as_ref()
            .and_then(|c| c.private_key.as_deref()),
        Some(NetworkState::HIDE_PASSWORD_STR)
    );
}

#[test]
fn test_kernel_only_ignore_user_space() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: br0
          type: ovs-bridge
          state: up
          bridge:
            port:
            - name: eth1
        - name: eth1
          type: ethernet
          state: up
          mtu: 1400
        ovs-db:
          external_ids:
            hostname: host1
        "#,
    )
    .unwrap();
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          mtu: 1500
        "#,
    )
    .unwrap();

    let merged = MergedNetworkState::new(
        desired,
        current,
        NetstateApplyOption::new().kernel_only(),
    )
    .unwrap();

    let apply_state = merged.gen_state_for_apply();
    assert!(apply_state.ifaces.user_ifaces.is_empty());
    assert_eq!(apply_state.ifaces.len(), 1);
    assert!(apply_state.ovsdb.is_none());
    assert!(merged.option.kernel_only);
}

#[test]
fn test_apply_option_builder() {
    let option = NetstateApplyOption::new().memory_only().no_verify();
    assert!(option.memory_only);
    assert!(option.no_verify);
    assert!(!option.save_to_disk());
    assert!(NetstateApplyOption::default().save_to_disk());
}

#[test]
fn test_hostname_change_and_verify() {
    let current: NetworkState = serde_yaml::from_str(
        r#"
        hostname:
          running: host1.example.org
          config: host1.example.org
        "#,
    )
    .unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        hostname:
          running: host2.example.org
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current.clone(), Default::default())
            .unwrap();

    assert!(merged.is_changed());
    assert_eq!(
        merged.hostname.merged,
        Some(HostNameState {
            running: Some("host2.example.org".to_string()),
            config: Some("host1.example.org".to_string()),
        })
    );
    let apply_state = merged.gen_state_for_apply();
    assert_eq!(
        apply_state.hostname.and_then(|h| h.running),
        Some("host2.example.org".to_string())
    );

    let result = merged.verify(&current);
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::VerificationError);
    }

    let mut post_apply = current;
    if let Some(hostname) = post_apply.hostname.as_mut() {
        hostname.running = Some("host2.example.org".to_string());
    }
    merged.verify(&post_apply).unwrap();
}

#[test]
fn test_hostname_unchanged() {
    let current: NetworkState = serde_yaml::from_str(
        r#"
        hostname:
          running: host1.example.org
        "#,
    )
    .unwrap();

    let merged = MergedNetworkState::new(
        current.clone(),
        current,
        Default::default(),
    )
    .unwrap();

    assert!(!merged.is_changed());
    assert!(merged.gen_state_for_apply().hostname.is_none());
}

#[test]
fn test_ovsdb_merge_remove_key_by_null() {
    let current: NetworkState = serde_yaml::from_str(
        r#"
        ovs-db:
          external_ids:
            hostname: host1
            owner: admin
          other_config:
            stats-update-interval: "1000"
        "#,
    )
    .unwrap();
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        ovs-db:
          external_ids:
            owner: null
            rack: a1
        "#,
    )
    .unwrap();

    let merged =
        MergedNetworkState::new(desired, current.clone(), Default::default())
            .unwrap();

    assert!(merged.is_changed());
    let external_ids = merged.ovsdb.merged.external_ids.as_ref().unwrap();
    assert_eq!(external_ids.len(), 2);
    assert_eq!(
        external_ids.get("hostname"),
        Some(&Some("host1".to_string()))
    );
    assert_eq!(external_ids.get("rack"), Some(&Some("a1".to_string())));
    assert!(!external_ids.contains_key("owner"));
    assert_eq!(
        merged.ovsdb.merged.other_config,
        current.ovsdb.as_ref().and_then(|o| o.other_config.clone())
    );

    assert!(merged.verify(&current).is_err());
    let post_apply: NetworkState = serde_yaml::from_str(
        r#"
        ovs-db:
          external_ids:
            hostname: host1
            rack: a1
          other_config:
            stats-update-interval: "1000"
        "#,
    )
    .unwrap();
    merged.verify(&post_apply).unwrap();
}

#[test]
fn test_desired_iface_always_in_plan() {
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          mtu: 1500
          ipv4:
            enabled: true
            address:
            - ip: 192.0.2.251
              prefix-length: 24
          ipv6:
            enabled: false
        "#,
    )
    .unwrap();

    let merged = MergedNetworkState::new(
        current.clone(),
        current.clone(),
        Default::default(),
    )
    .unwrap();

    assert!(merged.is_changed());
    assert!(!merged.routes.is_changed());
    assert!(!merged.dns.is_changed());
    assert_eq!(merged.gen_state_for_apply().ifaces.len(), 1);
    merged.verify(&current).unwrap();
}
