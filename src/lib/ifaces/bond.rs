// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>
//  * Wen Liang <liangwen12year@gmail.com>

use serde::{Deserialize, Serialize};

use crate::{
    BaseInterface, ErrorKind, InterfaceType, JsonDisplay, NetstateError,
    NetstateInterface,
};

/// Bond interface.
///
/// When serializing or deserializing, the [BaseInterface] will
/// be flatted and [BondConfig] stored as `link-aggregation` section:
/// ```yml
/// interfaces:
/// - name: bond99
///   type: bond
///   state: up
///   link-aggregation:
///     mode: active-backup
///     options:
///       arp_interval: 0
///       arp_ip_target: ""
///       miimon: 100
///       primary_reselect: always
///     port:
///     - eth1
///     - eth2
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonDisplay)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct BondInterface {
    #[serde(flatten)]
    pub base: BaseInterface,
    #[serde(
        skip_serializing_if = "Option::is_none",
        rename = "link-aggregation",
        alias = "bond"
    )]
    pub bond: Option<BondConfig>,
}

impl Default for BondInterface {
    fn default() -> Self {
        Self {
            base: BaseInterface {
                iface_type: InterfaceType::Bond,
                ..Default::default()
            },
            bond: None,
        }
    }
}

impl BondInterface {
    const IANA_MULTICAST_MAC_PREFIX: &'static str = "01:00:5E";

    pub fn new(name: String, bond: BondConfig) -> Self {
        Self {
            base: BaseInterface::new(name, InterfaceType::Bond),
            bond: Some(bond),
        }
    }

    pub fn mode(&self) -> Option<BondMode> {
        self.bond.as_ref().and_then(|b| b.mode)
    }

    fn options(&self) -> Option<&BondOptions> {
        self.bond.as_ref().and_then(|b| b.options.as_ref())
    }

    fn options_mut(&mut self) -> Option<&mut BondOptions> {
        self.bond.as_mut().and_then(|b| b.options.as_mut())
    }

    /// Whether bond mode is different from current.
    pub(crate) fn is_mode_changed(&self, current: &Self) -> bool {
        self.mode().is_some() && self.mode() != current.mode()
    }

    /// In active-backup mode with `fail_over_mac: active`, the MAC address
    /// of bond is determined by its active port.
    pub(crate) fn is_mac_restricted_mode(&self) -> bool {
        self.mode() == Some(BondMode::ActiveBackup)
            && self.options().and_then(|o| o.fail_over_mac)
                == Some(BondFailOverMac::Active)
    }

    /// Copy of this bond without options, used when verification failure
    /// is caused by options kernel does not honor.
    pub(crate) fn clone_without_options(&self) -> Self {
        let mut ret = self.clone();
        if let Some(bond_conf) = ret.bond.as_mut() {
            bond_conf.options = None;
        }
        ret
    }
}

impl NetstateInterface for BondInterface {
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
        self.bond
            .as_ref()
            .and_then(|bond_conf| bond_conf.port.as_ref())
            .map(|ports| ports.iter().map(|p| p.as_str()).collect())
    }

    fn sanitize_iface_specfic(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        self.sort_ports();
        if let Some(mac) = self
            .options_mut()
            .and_then(|o| o.ad_actor_system.as_mut())
        {
            mac.make_ascii_uppercase();
            if mac.starts_with(Self::IANA_MULTICAST_MAC_PREFIX) {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "The ad_actor_system bond option cannot be an IANA \
                         multicast address(prefix with {})",
                        Self::IANA_MULTICAST_MAC_PREFIX
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }

    // Options of different bond mode are not compatible with each other,
    // when mode changed, only desired options are used.
    fn post_merge_iface_specific(
        &mut self,
        desired: &Self,
        current: &Self,
    ) -> Result<(), NetstateError> {
        if self.is_up() && desired.is_mode_changed(current) {
            log::warn!(
                "Discarding all current bond options as interface {} has \
                 bond mode changed",
                self.base.name
            );
            if let Some(bond_conf) = self.bond.as_mut() {
                bond_conf.options = Some(
                    desired
                        .options()
                        .cloned()
                        .unwrap_or_default(),
                );
            }
        }
        if self.is_up() && self.is_mac_restricted_mode() {
            if desired.base.mac_address.is_some() {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "MAC address cannot be specified in bond interface \
                         {} along with fail_over_mac active on active backup \
                         mode",
                        self.base.name
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
            self.base.mac_address = None;
        }
        Ok(())
    }

    fn pre_edit_cleanup_iface_specific(
        &mut self,
        _current: Option<&Self>,
    ) -> Result<(), NetstateError> {
        if self.mode().is_none() {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Bond interface {} does not have bond mode defined",
                    self.base.name
                ),
            );
            log::error!("{e}");
            return Err(e);
        }
        if let Some(opts) = self.options_mut() {
            opts.validate_miimon_and_arp_interval()?;
            opts.include_arp_ip_target_explicitly();
        }
        Ok(())
    }

    fn state_for_verify_iface_specific(&mut self) {
        self.sort_ports();
        if let Some(opts) = self.options_mut() {
            opts.include_arp_ip_target_explicitly();
            if let Some(mac) = opts.ad_actor_system.as_mut() {
                mac.make_ascii_uppercase();
            }
        }
    }

    fn sort_ports(&mut self) {
        if let Some(ports) = self.bond.as_mut().and_then(|b| b.port.as_mut())
        {
            ports.sort_unstable();
        }
    }

    fn remove_port(&mut self, port_name: &str) -> Result<(), NetstateError> {
        if let Some(ports) = self.bond.as_mut().and_then(|b| b.port.as_mut())
        {
            ports.retain(|p| p != port_name);
        }
        Ok(())
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct BondConfig {
    /// Mode is mandatory when create new bond interface.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_enum_string_or_integer"
    )]
    pub mode: Option<BondMode>,
    /// When mode changed, current options are discarded.
    /// The verification will not fail on bond options miss-match but an
    /// warning message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BondOptions>,
    /// Deserialize and serialize from/to `port`.
    /// You can also use `ports` or `slaves` for deserializing.
    /// When applying, if defined, it will override current port list.
    #[serde(
        skip_serializing_if = "Option::is_none",
        alias = "ports",
        alias = "slaves"
    )]
    pub port: Option<Vec<String>>,
}

/// Bond mode, deserialize from kernel numeric value is supported.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Default,
    JsonDisplay,
)]
#[non_exhaustive]
pub enum BondMode {
    #[serde(rename = "balance-rr", alias = "0")]
    #[default]
    RoundRobin,
    #[serde(rename = "active-backup", alias = "1")]
    ActiveBackup,
    #[serde(rename = "balance-xor", alias = "2")]
    XOR,
    #[serde(rename = "broadcast", alias = "3")]
    Broadcast,
    #[serde(rename = "802.3ad", alias = "lacp", alias = "4")]
    LACP,
    #[serde(rename = "balance-tlb", alias = "5")]
    TLB,
    #[serde(rename = "balance-alb", alias = "6")]
    ALB,
}

/// Bond options using kernel option names.
///
/// Please refer to [kernel documentation](https://www.kernel.org/doc/Documentation/networking/bonding.txt)
/// for detail.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default, JsonDisplay,
)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct BondOptions {
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    pub ad_actor_sys_prio: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_actor_system: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_enum_string_or_integer"
    )]
    pub ad_select: Option<BondAdSelect>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    pub ad_user_port_key: Option<u16>,
    /// Deserialize from `all_ports_active` or `all_slaves_active`.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_enum_string_or_integer",
        rename = "all_slaves_active",
        alias = "all_ports_active"
    )]
    pub all_ports_active: Option<BondAllPortActive>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_enum_string_or_integer"
    )]
    pub arp_all_targets: Option<BondArpAllTargets>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub arp_interval: Option<u32>,
    /// Comma separated IPv4 addresses. Empty string means no target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arp_ip_target: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_enum_string_or_integer"
    )]
    pub arp_validate: Option<BondArpValidate>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub downdelay: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_enum_string_or_integer"
    )]
    pub fail_over_mac: Option<BondFailOverMac>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_enum_string_or_integer"
    )]
    pub lacp_rate: Option<BondLacpRate>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub lp_interval: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub miimon: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub min_links: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u8_or_string"
    )]
    pub num_grat_arp: Option<u8>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u8_or_string"
    )]
    pub num_unsol_na: Option<u8>,
    /// Deserialize from `packets_per_port` or `packets_per_slave`.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string",
        rename = "packets_per_slave",
        alias = "packets_per_port"
    )]
    pub packets_per_port: Option<u32>,
    /// Not validated against the port list of bond.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_enum_string_or_integer"
    )]
    pub primary_reselect: Option<BondPrimaryReselect>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub resend_igmp: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub tlb_dynamic_lb: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub updelay: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub use_carrier: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_enum_string_or_integer"
    )]
    pub xmit_hash_policy: Option<BondXmitHashPolicy>,
}

impl BondOptions {
    fn validate_miimon_and_arp_interval(&self) -> Result<(), NetstateError> {
        if self.miimon.unwrap_or_default() > 0
            && self.arp_interval.unwrap_or_default() > 0
        {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                "Bond option arp_interval is conflicting with miimon, please \
                 disable one of them by setting to 0"
                    .to_string(),
            );
            log::error!("{e}");
            return Err(e);
        }
        Ok(())
    }

    // The ARP monitor targets are removed by `arp_ip_target: ""`.
    fn include_arp_ip_target_explicitly(&mut self) {
        if self.arp_interval.is_some() && self.arp_ip_target.is_none() {
            self.arp_ip_target = Some(String::new());
        }
    }
}

/// Specifies the 802.3ad aggregation selection logic to use.
#[derive(
    Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, JsonDisplay,
)]
#[non_exhaustive]
#[serde(rename_all = "kebab-case")]
pub enum BondAdSelect {
    #[serde(alias = "0")]
    Stable,
    #[serde(alias = "1")]
    Bandwidth,
    #[serde(alias = "2")]
    Count,
}

/// Rate of LACPDU requested from link partner in 802.3ad mode.
#[derive(
    Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, JsonDisplay,
)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum BondLacpRate {
    #[serde(alias = "0")]
    Slow,
    #[serde(alias = "1")]
    Fast,
}

/// Whether duplicate frames received on inactive ports are dropped.
#[derive(
    Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, JsonDisplay,
)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum BondAllPortActive {
    #[serde(alias = "0")]
    Dropped,
    #[serde(alias = "1")]
    Delivered,
}

#[derive(
    Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, JsonDisplay,
)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum BondArpAllTargets {
    #[serde(alias = "0")]
    Any,
    #[serde(alias = "1")]
    All,
}

#[derive(
    Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, JsonDisplay,
)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum BondArpValidate {
    #[serde(alias = "0")]
    None,
    #[serde(alias = "1")]
    Active,
    #[serde(alias = "2")]
    Backup,
    #[serde(alias = "3")]
    All,
    #[serde(alias = "4")]
    Filter,
    #[serde(alias = "5")]
    FilterActive,
    #[serde(alias = "6")]
    FilterBackup,
}

/// MAC address handling of active-backup mode.
#[derive(
    Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, JsonDisplay,
)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum BondFailOverMac {
    /// Set all ports to the same MAC address.
    #[serde(alias = "0")]
    None,
    /// Bond always use the MAC address of active port.
    #[serde(alias = "1")]
    Active,
    /// Ports get the MAC address of bond on failover.
    #[serde(alias = "2")]
    Follow,
}

#[derive(
    Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, JsonDisplay,
)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum BondPrimaryReselect {
    #[serde(alias = "0")]
    Always,
    #[serde(alias = "1")]
    Better,
    #[serde(alias = "2")]
    Failure,
}

#[derive(
    Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, JsonDisplay,
)]
#[non_exhaustive]
pub enum BondXmitHashPolicy {
    #[serde(rename = "layer2", alias = "0")]
    Layer2,
    #[serde(rename = "layer3+4", alias = "1")]
    Layer34,
    #[serde(rename = "layer2+3", alias = "2")]
    Layer23,
    #[serde(rename = "encap2+3", alias = "3")]
    Encap23,
    #[serde(rename = "encap3+4", alias = "4")]
    Encap34,
    #[serde(rename = "vlan+srcmac", alias = "5")]
    VlanSrcMac,
}
