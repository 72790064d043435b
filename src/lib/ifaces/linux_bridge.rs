// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>
//  * Quique Llorente <ellorent@redhat.com>

use serde::{Deserialize, Serialize};

use crate::{
    BaseInterface, BridgeVlanConfig, ErrorKind, InterfaceType, JsonDisplay,
    NetstateError, NetstateInterface, VlanProtocol,
};

/// Bridge interface provided by linux kernel.
///
/// When serializing or deserializing, the [BaseInterface] will
/// be flatted and [LinuxBridgeConfig] stored as `bridge` section:
/// ```yml
/// interfaces:
/// - name: br0
///   type: linux-bridge
///   state: up
///   bridge:
///     options:
///       group-addr: 01:80:C2:00:00:00
///       mac-ageing-time: 300
///       multicast-membership-interval: 26000
///       multicast-snooping: true
///       stp:
///         enabled: true
///         forward-delay: 15
///     port:
///     - name: eth1
///       stp-path-cost: 100
///       vlan:
///         mode: access
///         tag: 305
///     - name: eth2
///       vlan:
///         mode: trunk
///         trunk-tags:
///         - id: 101
///         - id-range:
///             min: 200
///             max: 299
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonDisplay)]
#[non_exhaustive]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LinuxBridgeInterface {
    #[serde(flatten)]
    pub base: BaseInterface,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<LinuxBridgeConfig>,
}

impl Default for LinuxBridgeInterface {
    fn default() -> Self {
        Self {
            base: BaseInterface {
                iface_type: InterfaceType::LinuxBridge,
                ..Default::default()
            },
            bridge: None,
        }
    }
}

impl LinuxBridgeInterface {
    pub fn new(name: String, bridge: LinuxBridgeConfig) -> Self {
        Self {
            base: BaseInterface::new(name, InterfaceType::LinuxBridge),
            bridge: Some(bridge),
        }
    }

    pub(crate) fn get_port_conf(
        &self,
        port_name: &str,
    ) -> Option<&LinuxBridgePortConfig> {
        self.port_confs()
            .iter()
            .find(|port_conf| port_conf.name.as_str() == port_name)
    }

    fn port_confs(&self) -> &[LinuxBridgePortConfig] {
        self.bridge
            .as_ref()
            .and_then(|br_conf| br_conf.ports.as_deref())
            .unwrap_or_default()
    }

    fn port_confs_mut(&mut self) -> &mut [LinuxBridgePortConfig] {
        self.bridge
            .as_mut()
            .and_then(|br_conf| br_conf.ports.as_deref_mut())
            .unwrap_or_default()
    }

    fn options_mut(&mut self) -> Option<&mut LinuxBridgeOptions> {
        self.bridge.as_mut().and_then(|b| b.options.as_mut())
    }

    /// Ports whose port configuration differs from current.
    pub(crate) fn config_changed_ports(&self, current: &Self) -> Vec<&str> {
        self.port_confs()
            .iter()
            .filter(|des_port| {
                current
                    .get_port_conf(des_port.name.as_str())
                    .is_some_and(|cur_port| cur_port != *des_port)
            })
            .map(|p| p.name.as_str())
            .collect()
    }

    // Kernel with CONFIG_HZ 250 will round the multicast timers which
    // is stored in unit of 1/100 seconds by userspace.
    // The drift is 1 for values below 8,000,000 and grows proportionally
    // above.
    pub(crate) fn is_integer_rounded(
        reference: &str,
        desired: &serde_json::Value,
        current: &serde_json::Value,
    ) -> bool {
        if !LinuxBridgeOptions::INTEGER_ROUNDED_OPTIONS
            .iter()
            .any(|opt| reference.ends_with(opt))
        {
            return false;
        }
        if let (Some(des), Some(cur)) = (desired.as_u64(), current.as_u64()) {
            let tolerance = des.div_ceil(8_000_000).max(1);
            des != cur && des.abs_diff(cur) <= tolerance
        } else {
            false
        }
    }

    /// Overwrite the desired integer rounded options with the value
    /// reported by kernel. Return the first overwritten option as
    /// `(reference, desired, current)`.
    pub(crate) fn accept_integer_rounded(
        reference_prefix: &str,
        desired: &mut serde_json::Value,
        current: &serde_json::Value,
    ) -> Option<(String, serde_json::Value, serde_json::Value)> {
        let mut ret = None;
        for opt in LinuxBridgeOptions::INTEGER_ROUNDED_OPTIONS {
            let pointer = format!("/{}", opt.replace('.', "/"));
            let Some(cur_value) = current.pointer(&pointer) else {
                continue;
            };
            let Some(des_value) = desired.pointer_mut(&pointer) else {
                continue;
            };
            let reference = format!("{reference_prefix}.{opt}");
            if Self::is_integer_rounded(&reference, des_value, cur_value) {
                if ret.is_none() {
                    ret = Some((
                        reference,
                        des_value.clone(),
                        cur_value.clone(),
                    ));
                }
                *des_value = cur_value.clone();
            }
        }
        ret
    }
}

impl NetstateInterface for LinuxBridgeInterface {
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

    fn ports(&self) -> Option<Vec<&str>> {
        self.bridge
            .as_ref()
            .and_then(|br_conf| br_conf.ports.as_ref())
            .map(|ports| ports.iter().map(|p| p.name.as_str()).collect())
    }

    fn sanitize_iface_specfic(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        let iface_name = self.base.name.clone();
        if let Some(opts) = self.options_mut() {
            opts.sanitize_group_fwd_mask(iface_name.as_str())?;
            if let Some(stp_opts) = opts.stp.as_ref() {
                stp_opts.sanitize()?;
            }
        }
        for port_conf in self.port_confs() {
            if let Some(vlan_conf) = port_conf.vlan.as_ref() {
                vlan_conf.validate()?;
            }
        }
        self.sort_ports();
        Ok(())
    }

    // Port list is not merged: ports missing in desired are detached,
    // an empty desired list detaches all. Per-port options of ports found
    // in both desired and current are merged.
    fn post_merge_iface_specific(
        &mut self,
        desired: &Self,
        current: &Self,
    ) -> Result<(), NetstateError> {
        if desired.ports().is_none() {
            return Ok(());
        }
        for port_conf in self.port_confs_mut() {
            if let Some(cur_port_conf) =
                current.get_port_conf(port_conf.name.as_str())
            {
                port_conf.merge(cur_port_conf)?;
            }
        }
        Ok(())
    }

    fn pre_edit_cleanup_iface_specific(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        for port_conf in self.port_confs_mut() {
            if let Some(vlan_conf) = port_conf.vlan.as_mut() {
                vlan_conf.cleanup();
            }
        }
        Ok(())
    }

    fn state_for_verify_iface_specific(&mut self) {
        self.sort_ports();
        if let Some(opts) = self.options_mut() {
            opts.gc_timer = None;
            opts.hello_timer = None;
            if let Some(address) = opts.group_addr.as_mut() {
                address.make_ascii_uppercase();
            }
        }
        for port_conf in self.port_confs_mut() {
            if let Some(vlan_conf) = port_conf.vlan.as_mut() {
                vlan_conf.compress_trunk_tags();
            }
        }
    }

    // User desires `vlan: {}` for resetting VLAN filtering, the current
    // will show as no VLAN section.
    fn sanitize_before_verify_iface_specfic(&mut self, current: &mut Self) {
        for port_conf in current.port_confs_mut() {
            if port_conf.vlan.is_none() {
                port_conf.vlan = Some(BridgeVlanConfig::default());
            }
        }
    }

    fn sort_ports(&mut self) {
        if let Some(port_confs) =
            self.bridge.as_mut().and_then(|b| b.ports.as_mut())
        {
            port_confs.sort_unstable_by(|a, b| a.name.cmp(&b.name))
        }
    }

    fn remove_port(&mut self, port_name: &str) -> Result<(), NetstateError> {
        if let Some(port_confs) =
            self.bridge.as_mut().and_then(|b| b.ports.as_mut())
        {
            port_confs.retain(|p| p.name != port_name);
        }
        Ok(())
    }
}

/// Linux bridge specific configuration.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct LinuxBridgeConfig {
    /// Linux bridge options. When applying, existing options will merged into
    /// desired.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<LinuxBridgeOptions>,
    /// Linux bridge ports. When applying, desired port list will __override__
    /// current port list. Serialize to `port`, deserialize from `port` or
    /// `ports`.
    #[serde(
        skip_serializing_if = "Option::is_none",
        alias = "ports",
        rename = "port"
    )]
    pub ports: Option<Vec<LinuxBridgePortConfig>>,
}

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct LinuxBridgePortConfig {
    /// The kernel interface name of this bridge port.
    #[serde(default)]
    pub name: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub stp_hairpin_mode: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub stp_path_cost: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    pub stp_priority: Option<u16>,
    /// Linux bridge VLAN filtering configure. If not defined, current VLAN
    /// filtering is preserved for the specified port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<BridgeVlanConfig>,
}

impl LinuxBridgePortConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn merge(&mut self, current: &Self) -> Result<(), NetstateError> {
        let mut value = serde_json::to_value(&*self)?;
        crate::value::copy_undefined_value(
            &mut value,
            &serde_json::to_value(current)?,
        );
        *self = serde_json::from_value(value)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct LinuxBridgeOptions {
    /// Query only, ignored when verifying.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gc_timer: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_addr: Option<String>,
    /// Alias of [LinuxBridgeOptions.group_fwd_mask].
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    pub group_forward_mask: Option<u16>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    pub group_fwd_mask: Option<u16>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub hash_max: Option<u32>,
    /// Query only, ignored when verifying.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hello_timer: Option<u64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub mac_ageing_time: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub multicast_last_member_count: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u64_or_string"
    )]
    pub multicast_last_member_interval: Option<u64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u64_or_string"
    )]
    pub multicast_membership_interval: Option<u64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub multicast_querier: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u64_or_string"
    )]
    pub multicast_querier_interval: Option<u64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u64_or_string"
    )]
    pub multicast_query_interval: Option<u64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u64_or_string"
    )]
    pub multicast_query_response_interval: Option<u64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub multicast_query_use_ifaddr: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_enum_string_or_integer"
    )]
    pub multicast_router: Option<LinuxBridgeMulticastRouterType>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub multicast_snooping: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub multicast_startup_query_count: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u64_or_string"
    )]
    pub multicast_startup_query_interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stp: Option<LinuxBridgeStpOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_protocol: Option<VlanProtocol>,
}

impl LinuxBridgeOptions {
    pub(crate) const INTEGER_ROUNDED_OPTIONS: [&'static str; 5] = [
        "bridge.options.multicast-last-member-interval",
        "bridge.options.multicast-membership-interval",
        "bridge.options.multicast-querier-interval",
        "bridge.options.multicast-query-response-interval",
        "bridge.options.multicast-startup-query-interval",
    ];

    fn sanitize_group_fwd_mask(
        &mut self,
        iface_name: &str,
    ) -> Result<(), NetstateError> {
        match (self.group_forward_mask.take(), self.group_fwd_mask) {
            (Some(v1), Some(v2)) if v1 != v2 => {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Linux bridge {iface_name} has different \
                         group_forward_mask: {v1}, group_fwd_mask: {v2}, \
                         these two property is the same, hence conflicting",
                    ),
                );
                log::error!("{e}");
                Err(e)
            }
            (Some(v), _) => {
                self.group_fwd_mask = Some(v);
                Ok(())
            }
            (None, _) => Ok(()),
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct LinuxBridgeStpOptions {
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub enabled: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u8_or_string"
    )]
    pub forward_delay: Option<u8>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u8_or_string"
    )]
    pub hello_time: Option<u8>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u8_or_string"
    )]
    pub max_age: Option<u8>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    pub priority: Option<u16>,
}

impl LinuxBridgeStpOptions {
    pub const HELLO_TIME_MAX: u8 = 10;
    pub const HELLO_TIME_MIN: u8 = 1;
    pub const MAX_AGE_MAX: u8 = 40;
    pub const MAX_AGE_MIN: u8 = 6;
    pub const FORWARD_DELAY_MAX: u8 = 30;
    pub const FORWARD_DELAY_MIN: u8 = 2;

    fn sanitize(&self) -> Result<(), NetstateError> {
        for (prop_name, value, min, max) in [
            (
                "hello time",
                self.hello_time,
                Self::HELLO_TIME_MIN,
                Self::HELLO_TIME_MAX,
            ),
            ("max age", self.max_age, Self::MAX_AGE_MIN, Self::MAX_AGE_MAX),
            (
                "forward delay",
                self.forward_delay,
                Self::FORWARD_DELAY_MIN,
                Self::FORWARD_DELAY_MAX,
            ),
        ] {
            if let Some(value) = value
                && !(min..=max).contains(&value)
            {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "Desired STP {prop_name} {value} is not in the valid \
                         range of [{min},{max}]"
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }
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
pub enum LinuxBridgeMulticastRouterType {
    #[default]
    #[serde(alias = "1")]
    Auto,
    #[serde(alias = "0")]
    Disabled,
    #[serde(alias = "2")]
    Enabled,
}
