// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>
//  * Ales Musil <amusil@redhat.com>
//  * Jan Vaclav <jvaclav@redhat.com>

use serde::{Deserialize, Serialize};

use crate::{
    BaseInterface, BridgeVlanConfig, ErrorKind, InterfaceType, JsonDisplay,
    NetstateError, NetstateInterface,
};

/// OpenvSwitch Bridge
///
/// ```yml
/// interfaces:
/// - name: br0
///   type: ovs-bridge
///   state: up
///   bridge:
///     options:
///       stp: true
///     port:
///     - name: ovs0
///     - name: bond1
///       link-aggregation:
///         mode: balance-slb
///         port:
///         - name: eth1
///         - name: eth2
///     - name: eth3
///       vlan:
///         mode: access
///         tag: 2
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonDisplay)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct OvsBridgeInterface {
    #[serde(flatten)]
    pub base: BaseInterface,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<OvsBridgeConfig>,
}

impl Default for OvsBridgeInterface {
    fn default() -> Self {
        Self {
            base: BaseInterface {
                iface_type: InterfaceType::OvsBridge,
                ..Default::default()
            },
            bridge: None,
        }
    }
}

impl OvsBridgeInterface {
    pub fn new(base: BaseInterface, bridge: Option<OvsBridgeConfig>) -> Self {
        Self { base, bridge }
    }

    pub(crate) fn port_confs(&self) -> &[OvsBridgePortConfig] {
        self.bridge
            .as_ref()
            .and_then(|br_conf| br_conf.ports.as_deref())
            .unwrap_or_default()
    }

    /// Port configuration holding specified interface, for link
    /// aggregation member, the link aggregation port is returned.
    pub(crate) fn get_port_conf(
        &self,
        iface_name: &str,
    ) -> Option<&OvsBridgePortConfig> {
        self.port_confs().iter().find(|port_conf| {
            match port_conf.bond.as_ref() {
                Some(bond_conf) => bond_conf.ports().contains(&iface_name),
                None => port_conf.name == iface_name,
            }
        })
    }

    fn validate_lag_port_count(&self) -> Result<(), NetstateError> {
        for port_conf in self.port_confs() {
            if let Some(bond_conf) = port_conf.bond.as_ref()
                && bond_conf.ports().len() < 2
            {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "OVS bridge {} link aggregation port {} has less \
                         than 2 ports",
                        self.base.name, port_conf.name
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }
}

impl NetstateInterface for OvsBridgeInterface {
    fn base_iface(&self) -> &BaseInterface {
        &self.base
    }

    fn base_iface_mut(&mut self) -> &mut BaseInterface {
        &mut self.base
    }

    fn is_virtual(&self) -> bool {
        true
    }

    fn is_controller(&self) -> bool {
        true
    }

    /// Link aggregation members are included instead of the link
    /// aggregation port name.
    fn ports(&self) -> Option<Vec<&str>> {
        self.bridge
            .as_ref()
            .and_then(|br_conf| br_conf.ports.as_ref())
            .map(|port_confs| {
                port_confs
                    .iter()
                    .flat_map(|port_conf| match port_conf.bond.as_ref() {
                        Some(bond_conf) => bond_conf.ports(),
                        None => vec![port_conf.name.as_str()],
                    })
                    .collect()
            })
    }

    // OVS bridge only exists in OVS database, it cannot hold MTU or IP.
    fn sanitize_iface_specfic(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        if let Some(mtu) = self.base.mtu.take() {
            log::warn!(
                "OVS bridge {} could not hold 'mtu:{mtu}' configuration as \
                 it only exists in OVS database, ignoring",
                self.base.name
            );
        }
        self.base.ipv4 = None;
        self.base.ipv6 = None;
        for port_conf in self.port_confs() {
            if let Some(vlan_conf) = port_conf.vlan.as_ref() {
                vlan_conf.validate()?;
            }
        }
        self.sort_ports();
        Ok(())
    }

    // Port VLAN configuration is inherited from current when not desired.
    fn post_merge_iface_specific(
        &mut self,
        desired: &Self,
        current: &Self,
    ) -> Result<(), NetstateError> {
        if desired.ports().is_none() {
            return Ok(());
        }
        if let Some(port_confs) =
            self.bridge.as_mut().and_then(|b| b.ports.as_mut())
        {
            for port_conf in
                port_confs.iter_mut().filter(|p| p.vlan.is_none())
            {
                port_conf.vlan = current
                    .port_confs()
                    .iter()
                    .find(|cur| cur.name == port_conf.name)
                    .and_then(|cur| cur.vlan.clone());
            }
        }
        Ok(())
    }

    fn pre_edit_cleanup_iface_specific(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        self.validate_lag_port_count()?;
        if let Some(port_confs) =
            self.bridge.as_mut().and_then(|b| b.ports.as_mut())
        {
            for vlan_conf in
                port_confs.iter_mut().filter_map(|p| p.vlan.as_mut())
            {
                vlan_conf.cleanup();
            }
        }
        Ok(())
    }

    fn state_for_verify_iface_specific(&mut self) {
        self.sort_ports();
    }

    fn sort_ports(&mut self) {
        if let Some(port_confs) =
            self.bridge.as_mut().and_then(|b| b.ports.as_mut())
        {
            port_confs.sort_unstable_by(|a, b| a.name.cmp(&b.name));
            for bond_conf in
                port_confs.iter_mut().filter_map(|p| p.bond.as_mut())
            {
                bond_conf.sort_ports();
            }
        }
    }

    // Removing a member of link aggregation is not supported as it will
    // break the minimum port count of link aggregation.
    fn remove_port(&mut self, port_name: &str) -> Result<(), NetstateError> {
        if let Some(port_confs) =
            self.bridge.as_mut().and_then(|b| b.ports.as_mut())
        {
            port_confs.retain(|p| p.name != port_name);
        }
        Ok(())
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct OvsBridgeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OvsBridgeOptions>,
    /// Serialize to 'port'. Deserialize from `port` or `ports`.
    #[serde(
        skip_serializing_if = "Option::is_none",
        rename = "port",
        alias = "ports"
    )]
    pub ports: Option<Vec<OvsBridgePortConfig>>,
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct OvsBridgeOptions {
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub stp: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub rstp: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub mcast_snooping_enable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_mode: Option<String>,
    /// Set to `netdev` for DPDK.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datapath: Option<String>,
}

#[derive(
    Debug, Clone, PartialEq, Default, Eq, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct OvsBridgePortConfig {
    pub name: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        rename = "link-aggregation"
    )]
    pub bond: Option<OvsBridgeBondConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<BridgeVlanConfig>,
}

impl OvsBridgePortConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct OvsBridgeBondConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<OvsBridgeBondMode>,
    /// Serialize to 'port'. Deserialize from `port` or `ports`.
    #[serde(
        skip_serializing_if = "Option::is_none",
        rename = "port",
        alias = "ports"
    )]
    pub ports: Option<Vec<OvsBridgeBondPortConfig>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub bond_downdelay: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub bond_updelay: Option<u32>,
}

impl OvsBridgeBondConfig {
    pub(crate) fn ports(&self) -> Vec<&str> {
        self.ports
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|p| p.name.as_str())
            .collect()
    }

    fn sort_ports(&mut self) {
        if let Some(ports) = self.ports.as_mut() {
            ports.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct OvsBridgeBondPortConfig {
    pub name: String,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    JsonDisplay,
)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum OvsBridgeBondMode {
    ActiveBackup,
    #[default]
    BalanceSlb,
    BalanceTcp,
    Lacp,
}
