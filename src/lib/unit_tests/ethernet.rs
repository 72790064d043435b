// SPDX-License-Identifier: Apache-2.0

use crate::{
    EthernetDuplex, Interface, MergedNetworkState, NetstateInterface,
    NetworkState,
};

const CURRENT_ETH1_WITH_VFS: &str = r#"
interfaces:
- name: eth1
  type: ethernet
  state: up
  ethernet:
    auto-negotiation: false
    speed: 1000
    duplex: full
    sr-iov:
      total-vfs: 4
      vfs:
      - id: 0
        trust: true
      - id: 1
      - id: 2
      - id: 3
- name: eth1v0
  type: ethernet
  state: up
- name: eth1v1
  type: ethernet
  state: up
- name: eth1v2
  type: ethernet
  state: up
- name: eth1v3
  type: ethernet
  state: up
"#;

fn merge_with_eth1_vfs(desired_yaml: &str) -> MergedNetworkState {
    let desired: NetworkState = serde_yaml::from_str(desired_yaml).unwrap();
    let current: NetworkState =
        serde_yaml::from_str(CURRENT_ETH1_WITH_VFS).unwrap();
    MergedNetworkState::new(desired, current, Default::default()).unwrap()
}

#[test]
fn test_ethernet_auto_neg_not_merged_from_current() {
    let merged = merge_with_eth1_vfs(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          ethernet:
            auto-negotiation: true
        "#,
    );

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::Ethernet(eth_iface)) =
        apply_state.ifaces.kernel_ifaces.get("eth1")
    else {
        panic!("eth1 not found in {apply_state}");
    };
    let eth_conf = eth_iface.ethernet.as_ref().unwrap();
    assert_eq!(eth_conf.auto_neg, Some(true));
    assert_eq!(eth_conf.speed, None);
    assert_eq!(eth_conf.duplex, None);
    // Other properties of ethernet section still merged from current
    assert_eq!(
        eth_conf.sr_iov.as_ref().and_then(|s| s.total_vfs),
        Some(4)
    );
}

#[test]
fn test_ethernet_speed_kept_without_ethernet_section() {
    let merged = merge_with_eth1_vfs(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          mtu: 1500
        "#,
    );

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::Ethernet(eth_iface)) =
        apply_state.ifaces.kernel_ifaces.get("eth1")
    else {
        panic!("eth1 not found in {apply_state}");
    };
    let eth_conf = eth_iface.ethernet.as_ref().unwrap();
    assert_eq!(eth_conf.auto_neg, Some(false));
    assert_eq!(eth_conf.speed, Some(1000));
    assert_eq!(eth_conf.duplex, Some(EthernetDuplex::Full));
}

#[test]
fn test_sriov_shrink_total_vfs_remove_vf_ifaces() {
    let merged = merge_with_eth1_vfs(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          ethernet:
            sr-iov:
              total-vfs: 2
        "#,
    );

    let apply_state = merged.gen_state_for_apply();
    let Some(Interface::Ethernet(eth_iface)) =
        apply_state.ifaces.kernel_ifaces.get("eth1")
    else {
        panic!("eth1 not found in {apply_state}");
    };
    let sriov_conf = eth_iface
        .ethernet
        .as_ref()
        .and_then(|e| e.sr_iov.as_ref())
        .unwrap();
    assert_eq!(sriov_conf.total_vfs, Some(2));
    let vf_ids: Vec<u32> = sriov_conf
        .vfs
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|vf| vf.id)
        .collect();
    assert_eq!(vf_ids, vec![0, 1]);

    for vf_iface_name in ["eth1v2", "eth1v3"] {
        let vf_iface =
            apply_state.ifaces.kernel_ifaces.get(vf_iface_name).unwrap();
        assert!(vf_iface.is_absent());
    }
    assert!(apply_state.ifaces.kernel_ifaces.get("eth1v0").is_none());
    assert!(apply_state.ifaces.kernel_ifaces.get("eth1v1").is_none());
}

#[test]
fn test_sriov_vf_iface_name_metadata() {
    let merged = merge_with_eth1_vfs(
        r#"
        interfaces:
        - name: eth1
          type: ethernet
          state: up
          ethernet:
            sr-iov:
              total-vfs: 4
              vfs:
              - id: 1
                trust: false
        "#,
    );

    let eth1_iface = merged.ifaces.kernel_ifaces.get("eth1").unwrap();
    let value = eth1_iface.metadata_value().unwrap();
    let vfs = value["ethernet"]["sr-iov"]["vfs"].as_array().unwrap();
    assert_eq!(vfs.len(), 1);
    assert_eq!(vfs[0]["_vf_iface_name"], "eth1v1");
    assert_eq!(vfs[0]["trust"], false);
}
