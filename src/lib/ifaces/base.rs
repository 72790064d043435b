// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>
//  * Mat Kowalski <mko@redhat.com>

use serde::{Deserialize, Serialize};

use crate::{
    ErrorKind, EthtoolConfig, Ieee8021XConfig, InterfaceIpv4, InterfaceIpv6,
    InterfaceState, InterfaceType, JsonDisplay, LldpConfig, MptcpConfig,
    NetstateError, OvsDbIfaceConfig, serializer::is_zero,
};

/// Information shared among all interface types
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct BaseInterface {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub iface_type: InterfaceType,
    /// Kernel interface index, only reported by current state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iface_index: Option<u32>,
    #[serde(default)]
    pub state: InterfaceState,
    /// In which order should this interface been activated. The smallest
    /// number will be activated first.
    /// Undefined or set to 0 when applying desire state means automatically
    /// decide the correct value.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub up_priority: u32,
    /// Controller interface name. Empty string means detach from
    /// current controller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_type: Option<InterfaceType>,
    /// MAC address in the format: upper case hex string separated by `:` on
    /// every two characters. Case insensitive when applying.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    /// MAC address stored in firmware of network interface. Ignored during
    /// apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permanent_mac_address: Option<String>,
    /// Use MAC address of specified port. Only valid for bond, linux bridge
    /// and OVS interface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_mac_from: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub accept_all_mac_addresses: Option<bool>,
    /// Maximum transmission unit.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u64_or_string"
    )]
    pub mtu: Option<u64>,
    /// Minimum MTU allowed. Ignored during apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_mtu: Option<u64>,
    /// Maximum MTU allowed. Ignored during apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_mtu: Option<u64>,
    /// Which IP stack should be ready before considering the interface as
    /// activated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_ip: Option<WaitIp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<InterfaceIpv4>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<InterfaceIpv6>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "802.1x")]
    pub ieee8021x: Option<Ieee8021XConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethtool: Option<EthtoolConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lldp: Option<LldpConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ovs_db: Option<OvsDbIfaceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mptcp: Option<MptcpConfig>,
    /// Port configuration of this interface copied from the port list of
    /// its controller.
    #[serde(skip)]
    pub(crate) port_config: Option<serde_json::Value>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonDisplay,
)]
#[non_exhaustive]
pub enum WaitIp {
    /// The activation is considered done once IPv4 stack or IPv6 stack is
    /// configured.
    #[serde(rename = "any")]
    Any,
    #[serde(rename = "ipv4")]
    Ipv4,
    #[serde(rename = "ipv6")]
    Ipv6,
    /// Both IPv4 and IPv6 stack should be configured.
    #[serde(rename = "ipv4+ipv6")]
    Ipv4AndIpv6,
}

impl BaseInterface {
    pub fn new(name: String, iface_type: InterfaceType) -> Self {
        Self {
            name,
            iface_type,
            state: InterfaceState::Up,
            ..Default::default()
        }
    }

    pub fn hide_secrets(&mut self) {
        if let Some(conf) = self.ieee8021x.as_mut() {
            conf.hide_secrets();
        }
    }

    pub(crate) fn sanitize(
        &mut self,
        current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        if let Some(ipv4) = self.ipv4.as_mut() {
            ipv4.sanitize()?;
        }
        if let Some(ipv6) = self.ipv6.as_mut() {
            ipv6.sanitize()?;
        }
        self.iface_index = None;
        self.validate_mtu(current)?;
        self.min_mtu = None;
        self.max_mtu = None;
        self.permanent_mac_address = None;
        if let Some(ethtool) = self.ethtool.as_mut() {
            ethtool.sanitize()?;
        }
        if let Some(lldp) = self.lldp.as_mut() {
            lldp.sanitize();
        }
        self.validate_mptcp()
    }

    fn validate_mtu(
        &self,
        current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        if let Some(current) = current
            && let (Some(desire_mtu), Some(min_mtu), Some(max_mtu)) =
                (self.mtu, current.min_mtu, current.max_mtu)
        {
            if desire_mtu > max_mtu {
                return Err(NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Desired MTU {desire_mtu} for interface {} is bigger \
                         than maximum allowed MTU {max_mtu}",
                        self.name
                    ),
                ));
            } else if desire_mtu < min_mtu {
                return Err(NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Desired MTU {desire_mtu} for interface {} is smaller \
                         than minimum allowed MTU {min_mtu}",
                        self.name
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Clean up merged state of desired and up interface before apply:
    ///  * Canonicalize IP stacks and remove IPv6 link local address.
    ///  * Remove per IP address MPTCP flags.
    pub(crate) fn pre_edit_cleanup(&mut self) {
        if let Some(ipv4) = self.ipv4.as_mut() {
            ipv4.canonicalize();
        }
        if let Some(ipv6) = self.ipv6.as_mut() {
            ipv6.canonicalize();
            ipv6.remove_link_local();
        }
        self.remove_per_addr_mptcp_flags();
    }

    /// Normalized state used for verification, idempotent.
    pub(crate) fn state_for_verify(&mut self) {
        if let Some(mac) = self.mac_address.as_mut() {
            mac.make_ascii_uppercase();
        }
        self.permanent_mac_address = None;
        self.iface_index = None;
        self.up_priority = 0;
        self.min_mtu = None;
        self.max_mtu = None;
        self.copy_mac_from = None;
        self.port_config = None;
        if self.description.as_deref() == Some("") {
            self.description = None;
        }
        if let Some(ipv4) = self.ipv4.as_mut() {
            ipv4.state_for_verify();
        }
        if let Some(ipv6) = self.ipv6.as_mut() {
            ipv6.state_for_verify();
        }
        if let Some(lldp) = self.lldp.as_mut() {
            lldp.neighbors.clear();
        }
        self.remove_per_addr_mptcp_flags();
    }

    pub(crate) fn sanitize_before_verify(&mut self, current: &mut Self) {
        if let Some(des_ipv4) = self.ipv4.as_mut()
            && let Some(cur_ipv4) = current.ipv4.as_mut()
        {
            des_ipv4.sanitize_before_verify(cur_ipv4);
        }
        if let Some(des_ipv6) = self.ipv6.as_mut()
            && let Some(cur_ipv6) = current.ipv6.as_mut()
        {
            des_ipv6.sanitize_before_verify(cur_ipv6);
        }
        // Empty controller means detached.
        if self.controller.as_deref() == Some("") {
            self.controller = None;
            self.controller_type = None;
        }
    }

    pub fn clone_name_type_only(&self) -> Self {
        Self {
            name: self.name.clone(),
            iface_type: self.iface_type.clone(),
            state: InterfaceState::Up,
            ..Default::default()
        }
    }

    pub(crate) fn is_up_priority_valid(&self) -> bool {
        if self.has_controller() {
            self.up_priority != 0
        } else {
            true
        }
    }

    pub(crate) fn has_controller(&self) -> bool {
        self.controller.as_deref().is_some_and(|c| !c.is_empty())
    }

    pub(crate) fn is_ipv4_enabled(&self) -> bool {
        self.ipv4.as_ref().map(|i| i.is_enabled()) == Some(true)
    }

    pub(crate) fn is_ipv6_enabled(&self) -> bool {
        self.ipv6.as_ref().map(|i| i.is_enabled()) == Some(true)
    }

    pub(crate) fn need_controller(&self) -> bool {
        self.iface_type.need_controller()
    }

    /// Whether this interface can hold IP information or not.
    pub(crate) fn can_have_ip(&self) -> bool {
        !self.has_controller()
            || self.iface_type == InterfaceType::OvsInterface
            || self.controller_type == Some(InterfaceType::Vrf)
    }

    /// Disable both IP stacks, used when interface is attached to a
    /// controller which does not allow IP on port.
    pub(crate) fn disable_ip(&mut self) {
        self.ipv4 = Some(InterfaceIpv4::new_disabled());
        self.ipv6 = Some(InterfaceIpv6::new_disabled());
    }
}
