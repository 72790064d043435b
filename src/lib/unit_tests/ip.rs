// SPDX-License-Identifier: Apache-2.0

use crate::{
    ErrorKind, InterfaceIpv4, InterfaceIpv6, MergedNetworkState,
    NetstateInterface, NetworkState,
};

const CURRENT_STATIC: &str = r#"
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
    - ip: fe80::1
      prefix-length: 64
"#;

fn merged_eth1_ipv4(desired_yaml: &str) -> InterfaceIpv4 {
    let desired: NetworkState = serde_yaml::from_str(desired_yaml).unwrap();
    let current = NetworkState::new_from_yaml(CURRENT_STATIC).unwrap();
    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();
    let apply_state = merged.gen_state_for_apply();
    apply_state
        .ifaces
        .kernel_ifaces
        .get("eth1")
        .and_then(|i| i.base_iface().ipv4.clone())
        .unwrap()
}

#[test]
fn test_ip_disabled_reduced_to_enabled_only() {
    let ipv4 = merged_eth1_ipv4(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          ipv4:
            enabled: false
            dhcp: true
            address:
            - ip: 192.0.2.252
              prefix-length: 24
        "#,
    );

    assert_eq!(ipv4.enabled, Some(false));
    assert_eq!(ipv4.dhcp, None);
    assert_eq!(ipv4.addresses, None);
    assert_eq!(ipv4.auto_dns, None);
}

#[test]
fn test_ip_dhcp_drop_static_address() {
    let ipv4 = merged_eth1_ipv4(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          ipv4:
            dhcp: true
            address:
            - ip: 192.0.2.252
              prefix-length: 24
        "#,
    );

    assert!(ipv4.is_enabled());
    assert!(ipv4.is_auto());
    assert!(!ipv4.is_static());
    assert_eq!(ipv4.addresses, Some(Vec::new()));
    assert_eq!(ipv4.auto_dns, Some(true));
    assert_eq!(ipv4.auto_gateway, Some(true));
    assert_eq!(ipv4.auto_routes, Some(true));
}

#[test]
fn test_ip_static_drop_auto_options() {
    let ipv4 = merged_eth1_ipv4(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          ipv4:
            enabled: true
            dhcp: false
            auto-dns: false
            address:
            - ip: 192.0.2.252
              prefix-length: 24
            - ip: 192.0.2.200
              prefix-length: 24
        "#,
    );

    assert!(ipv4.is_static());
    assert_eq!(ipv4.auto_dns, None);
    let addrs: Vec<String> =
        ipv4.addresses().iter().map(|a| a.to_string()).collect();
    assert_eq!(
        addrs,
        vec!["192.0.2.200/24".to_string(), "192.0.2.252/24".to_string()]
    );
}

#[test]
fn test_ip_address_wrong_family() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          ipv4:
            enabled: true
            address:
            - ip: 2001:db8:1::2
              prefix-length: 64
        "#,
    )
    .unwrap();
    let current = NetworkState::new_from_yaml(CURRENT_STATIC).unwrap();

    let result =
        MergedNetworkState::new(desired, current, Default::default());
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn test_ip_prefix_length_too_big() {
    let mut ipv6: InterfaceIpv6 = serde_yaml::from_str(
        r#"
        enabled: true
        address:
        - ip: 2001:db8:1::2
          prefix-length: 129
        "#,
    )
    .unwrap();

    let result = ipv6.sanitize();
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn test_ipv6_state_for_verify_idempotent() {
    let mut ipv6: InterfaceIpv6 = serde_yaml::from_str(
        r#"
        enabled: true
        address:
        - ip: fe80::1
          prefix-length: 64
        - ip: 2001:db8:1::2
          prefix-length: 64
          valid-life-time: forever
          preferred-life-time: forever
        - ip: 2001:db8:1::1
          prefix-length: 64
        "#,
    )
    .unwrap();

    ipv6.state_for_verify();
    let once = ipv6.clone();
    ipv6.state_for_verify();

    assert_eq!(ipv6, once);
    let addrs: Vec<String> =
        ipv6.addresses().iter().map(|a| a.to_string()).collect();
    assert_eq!(
        addrs,
        vec!["2001:db8:1::1/64".to_string(), "2001:db8:1::2/64".to_string()]
    );
    assert!(ipv6.addresses().iter().all(|a| a.valid_life_time.is_none()));
}

#[test]
fn test_ipv6_autoconf_is_dynamic() {
    let mut ipv6: InterfaceIpv6 = serde_yaml::from_str(
        r#"
        autoconf: true
        dhcp: false
        "#,
    )
    .unwrap();

    ipv6.sanitize().unwrap();

    assert!(ipv6.is_enabled());
    assert!(ipv6.is_auto());
    assert!(ipv6.auto_dns());
}

#[test]
fn test_ip_verify_allow_extra_address() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          ipv4:
            enabled: true
            address:
            - ip: 192.0.2.251
              prefix-length: 24
        "#,
    )
    .unwrap();
    let current = NetworkState::new_from_yaml(CURRENT_STATIC).unwrap();
    let post_apply: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          ipv4:
            enabled: true
            address:
            - ip: 192.0.2.251
              prefix-length: 24
            - ip: 192.0.2.2
              prefix-length: 24
          ipv6:
            enabled: true
            address:
            - ip: 2001:db8:1::1
              prefix-length: 64
        "#,
    )
    .unwrap();

    let merged = MergedNetworkState::new(
        desired.clone(),
        current.clone(),
        Default::default(),
    )
    .unwrap();
    merged.verify(&post_apply).unwrap();

    let mut desired = desired;
    if let Some(ipv4) = desired
        .ifaces
        .kernel_ifaces
        .get_mut("eth1")
        .and_then(|i| i.base_iface_mut().ipv4.as_mut())
    {
        ipv4.allow_extra_address = Some(false);
    }
    let merged =
        MergedNetworkState::new(desired, current, Default::default())
            .unwrap();
    let result = merged.verify(&post_apply);
    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::VerificationError);
    }
}
