// SPDX-License-Identifier: Apache-2.0

use crate::{ErrorKind, Interface, MergedNetworkState, NetworkState};

#[test]
fn test_vrf_table_id_zero() {
    for table_conf in ["route-table-id: 0", "port: []"] {
        let desired: NetworkState = serde_yaml::from_str(&format!(
            r#"
            interfaces:
            - name: vrf0
              type: vrf
              state: up
              vrf:
                {table_conf}
            "#
        ))
        .unwrap();

        let result = MergedNetworkState::new(
            desired,
            NetworkState::default(),
            Default::default(),
        );
        assert!(result.is_err());
        if let Err(e) = result {
            assert_eq!(e.kind(), ErrorKind::InvalidArgument);
            assert!(e.msg().contains("cannot be 0"));
        }
    }
}

#[test]
fn test_vrf_ignore_mac_and_accept_all_mac() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: vrf0
          type: vrf
          state: up
          mac-address: 00:23:45:67:89:1a
          accept-all-mac-addresses: false
          vrf:
            route-table-id: 100
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
    let Some(Interface::Vrf(vrf_iface)) =
        apply_state.ifaces.kernel_ifaces.get("vrf0")
    else {
        panic!("vrf0 not found in {apply_state}");
    };
    assert_eq!(vrf_iface.table_id(), Some(100));
    assert_eq!(vrf_iface.base.mac_address, None);
    assert_eq!(vrf_iface.base.accept_all_mac_addresses, None);
}

#[test]
fn test_vrf_verify_ignore_current_mac() {
    let desired: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: vrf0
          type: vrf
          state: up
          accept-all-mac-addresses: false
          vrf:
            route-table-id: 100
        "#,
    )
    .unwrap();
    let current: NetworkState = serde_yaml::from_str(
        r#"
        interfaces:
        - name: vrf0
          type: vrf
          state: up
          mac-address: 00:23:45:67:89:1A
          accept-all-mac-addresses: true
          vrf:
            route-table-id: 100
        "#,
    )
    .unwrap();

    let merged = MergedNetworkState::new(
        desired,
        current.clone(),
        Default::default(),
    )
    .unwrap();

    merged.verify(&current).unwrap();
}
