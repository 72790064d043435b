// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>
//  * Wen Liang <liangwen12year@gmail.com>
//  * Íñigo Huguet <ihuguet@redhat.com>
//  * Quique Llorente <ellorent@redhat.com>

use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    DnsIfaceMetadata, ErrorKind, JsonDisplay, MptcpAddressFlag, NetstateError,
    RouteEntry, RouteRuleEntry,
};

pub(crate) const IPV4_ADDR_LEN: usize = 32;
pub(crate) const IPV6_ADDR_LEN: usize = 128;
const FOREVER: &str = "forever";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Dhcpv4ClientId {
    /// Use link layer address as DHCPv4 client ID.
    /// Serialize and deserialize to/from `ll`.
    #[serde(rename = "ll", alias = "LL")]
    LinkLayerAddress,
    /// RFC 4361 type 255, 32 bits IAID followed by DUID.
    /// Serialize and deserialize to/from `iaid+duid`.
    #[serde(rename = "iaid+duid", alias = "IAID+DUID")]
    IaidPlusDuid,
    /// Hex string or backend specific client id type
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Dhcpv6Duid {
    /// DUID Based on Link-Layer Address Plus Time
    #[serde(rename = "llt", alias = "LLT")]
    LinkLayerAddressPlusTime,
    /// DUID Assigned by Vendor Based on Enterprise Number
    #[serde(rename = "en", alias = "EN")]
    EnterpriseNumber,
    /// DUID Based on Link-Layer Address
    #[serde(rename = "ll", alias = "LL")]
    LinkLayerAddress,
    /// DUID Based on Universally Unique Identifier
    #[serde(rename = "uuid", alias = "UUID")]
    Uuid,
    /// Backend specific
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Ipv6AddrGenMode {
    /// EUI-64 format defined by RFC 4862
    #[serde(rename = "eui64", alias = "EUI64")]
    Eui64,
    /// Semantically Opaque Interface Identifiers defined by RFC 7217
    #[serde(rename = "stable-privacy", alias = "STABLE-PRIVACY")]
    StablePrivacy,
    #[serde(untagged)]
    Other(String),
}

/// Internal data attached to IP stack after metadata generation.
/// Never serialized to or deserialized from public state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct IpMetadata {
    /// Routes using this interface as next hop interface.
    pub routes: Option<Vec<RouteEntry>>,
    /// Route rules pointing to route table owned by this interface.
    pub route_rules: Option<Vec<RouteRuleEntry>>,
    /// DNS configuration this interface is carrying.
    pub dns: Option<DnsIfaceMetadata>,
    /// Routes of this interface changed, backend should reapply them even
    /// when `routes` is empty.
    pub routes_changed: bool,
    /// Route rules pointing to this interface changed.
    pub rules_changed: bool,
}

impl IpMetadata {
    pub(crate) fn is_empty(&self) -> bool {
        self.routes.is_none()
            && self.route_rules.is_none()
            && self.dns.is_none()
            && !self.routes_changed
            && !self.rules_changed
    }
}

/// IPv4 configuration of interface.
/// Example YAML output of interface holding static IPv4:
/// ```yaml
/// ---
/// interfaces:
/// - name: eth1
///   state: up
///   mtu: 1500
///   ipv4:
///     address:
///     - ip: 192.0.2.252
///       prefix-length: 24
///     - ip: 192.0.2.251
///       prefix-length: 24
///     dhcp: false
///     enabled: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct InterfaceIpv4 {
    /// Whether IPv4 stack is enabled. When set to false, all IPv4 address will
    /// be removed from this interface.
    /// Undefined with DHCP or static address defined means true.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub enabled: Option<bool>,
    /// Whether DHCPv4 is enabled.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub dhcp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_client_id: Option<Dhcpv4ClientId>,
    /// IPv4 addresses.
    /// When applying with `None`, current IP address will be preserved.
    /// When applying with `Some(Vec::new())`, all IP address will be removed.
    /// Ignored when DHCP is enabled.
    #[serde(skip_serializing_if = "Option::is_none", rename = "address")]
    pub addresses: Option<Vec<InterfaceIpAddr>>,
    /// Whether to apply DNS resolver information retrieved from DHCP server.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub auto_dns: Option<bool>,
    /// Whether to set default gateway retrieved from DHCP server.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub auto_gateway: Option<bool>,
    /// Whether to set routes(including default gateway) retrieved from
    /// DHCP server.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub auto_routes: Option<bool>,
    /// The route table ID used to hold routes retrieved from DHCP server.
    #[serde(
        skip_serializing_if = "Option::is_none",
        rename = "auto-route-table-id",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub auto_table_id: Option<u32>,
    /// The metric number of routes retrieved from DHCP server.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub auto_route_metric: Option<u32>,
    /// Whether current IP addresses not mentioned in desired state is
    /// allowed when verifying. Undefined means true.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub allow_extra_address: Option<bool>,
    #[serde(skip)]
    pub(crate) metadata: IpMetadata,
}

/// IPv6 configurations of interface.
/// Example output of interface holding automatic IPv6 settings:
/// ```yaml
/// ---
/// interfaces:
/// - name: eth1
///   state: up
///   ipv6:
///     address:
///       - ip: 2001:db8:2::1
///         prefix-length: 64
///     autoconf: true
///     dhcp: true
///     enabled: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct InterfaceIpv6 {
    /// Whether IPv6 stack is enabled. When set to false, the IPv6 stack is
    /// disabled with IPv6 link-local address purged also.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub enabled: Option<bool>,
    /// Whether DHCPv6 enabled.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub dhcp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_duid: Option<Dhcpv6Duid>,
    /// Whether autoconf via IPv6 router announcement enabled.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub autoconf: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr_gen_mode: Option<Ipv6AddrGenMode>,
    /// IPv6 addresses. Ignored when DHCPv6 or autoconf is enabled.
    #[serde(skip_serializing_if = "Option::is_none", rename = "address")]
    pub addresses: Option<Vec<InterfaceIpAddr>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub auto_dns: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub auto_gateway: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub auto_routes: Option<bool>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        rename = "auto-route-table-id",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub auto_table_id: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub auto_route_metric: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_bool_or_string"
    )]
    pub allow_extra_address: Option<bool>,
    /// IPv6 tokenized interface identifier, e.g. `::fac1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip)]
    pub(crate) metadata: IpMetadata,
}

macro_rules! impl_ip_common {
    ($ip_type:ty, $family:literal, $is_dynamic:ident) => {
        impl $ip_type {
            /// Create IP stack config with IP disabled.
            pub fn new_disabled() -> Self {
                Self {
                    enabled: Some(false),
                    ..Default::default()
                }
            }

            pub fn is_enabled(&self) -> bool {
                self.enabled == Some(true)
            }

            /// Whether dynamic IP is enabled, DHCP for IPv4, DHCP or
            /// autoconf for IPv6.
            pub fn is_auto(&self) -> bool {
                self.is_enabled() && $is_dynamic(self)
            }

            pub fn is_static(&self) -> bool {
                self.is_enabled()
                    && !self.is_auto()
                    && !self.addresses.as_deref().unwrap_or_default().is_empty()
            }

            pub fn auto_dns(&self) -> bool {
                self.is_auto() && self.auto_dns != Some(false)
            }

            pub fn addresses(&self) -> &[InterfaceIpAddr] {
                self.addresses.as_deref().unwrap_or_default()
            }

            pub(crate) fn metadata(&self) -> &IpMetadata {
                &self.metadata
            }

            pub(crate) fn metadata_mut(&mut self) -> &mut IpMetadata {
                &mut self.metadata
            }

            pub(crate) fn allow_extra_address(&self) -> bool {
                self.allow_extra_address != Some(false)
            }

            // Sanitize the user input:
            //  * Treat undefined `enabled` as true if DHCP or static address
            //    defined.
            //  * Drop static IP when dynamic IP enabled.
            //  * Reject IP address of the wrong family or invalid prefix
            //    length.
            //  * Remove life time of static address.
            pub(crate) fn sanitize(&mut self) -> Result<(), NetstateError> {
                if self.enabled.is_none()
                    && ($is_dynamic(self) || self.addresses.is_some())
                {
                    self.enabled = Some(true);
                }
                if let Some(addrs) = self.addresses.as_mut() {
                    validate_addrs_family_and_prefix(addrs, $family)?;
                    for addr in addrs.iter_mut() {
                        if !addr.is_auto() {
                            addr.valid_life_time = None;
                            addr.preferred_life_time = None;
                        }
                    }
                }
                if self.is_auto()
                    && let Some(addrs) = self.addresses.as_mut()
                {
                    let static_addrs: Vec<String> = addrs
                        .iter()
                        .filter(|a| !a.is_auto())
                        .map(|a| a.to_string())
                        .collect();
                    if !static_addrs.is_empty() {
                        log::warn!(
                            "Static {} addresses {} are ignored when \
                             dynamic IP is enabled",
                            $family,
                            static_addrs.join(", ")
                        );
                        addrs.retain(|a| a.is_auto());
                    }
                }
                Ok(())
            }

            // Canonicalize merged IP stack:
            //  * Disabled stack is reduced to `enabled: false` only.
            //  * Dynamic stack drops the address list and defaults the
            //    `auto-*` flags to true.
            //  * Static stack drops the `auto-*` flags.
            //  * Addresses are sorted.
            pub(crate) fn canonicalize(&mut self) {
                if !self.is_enabled() {
                    let metadata = std::mem::take(&mut self.metadata);
                    *self = Self::new_disabled();
                    self.metadata = metadata;
                    return;
                }
                if self.is_auto() {
                    let static_addrs: Vec<String> = self
                        .addresses()
                        .iter()
                        .filter(|a| !a.is_auto())
                        .map(|a| a.to_string())
                        .collect();
                    if !static_addrs.is_empty() {
                        log::warn!(
                            "Static {} addresses {} are ignored when \
                             dynamic IP is enabled",
                            $family,
                            static_addrs.join(", ")
                        );
                    }
                    self.addresses = Some(Vec::new());
                    self.auto_dns.get_or_insert(true);
                    self.auto_gateway.get_or_insert(true);
                    self.auto_routes.get_or_insert(true);
                } else {
                    self.auto_dns = None;
                    self.auto_gateway = None;
                    self.auto_routes = None;
                    self.auto_table_id = None;
                    self.auto_route_metric = None;
                }
                self.sort_addresses();
            }

            pub(crate) fn sort_addresses(&mut self) {
                if let Some(addrs) = self.addresses.as_mut() {
                    addrs.sort_unstable();
                    addrs.dedup();
                }
            }

            /// Normalize for verification:
            ///  * Canonicalize.
            ///  * Remove IPv6 link local address.
            ///  * Remove address life time.
            ///  * Remove metadata.
            pub(crate) fn state_for_verify(&mut self) {
                self.metadata = IpMetadata::default();
                self.canonicalize();
                self.remove_link_local();
                if let Some(addrs) = self.addresses.as_mut() {
                    for addr in addrs.iter_mut() {
                        addr.valid_life_time = None;
                        addr.preferred_life_time = None;
                    }
                }
            }

            /// Prepare desired and current for comparison:
            ///  * Set undefined `enabled` of current to false.
            ///  * When `allow-extra-address` is not false, remove current
            ///    addresses not mentioned in desire.
            ///  * Remove `allow-extra-address` as it is not reported by
            ///    current.
            pub(crate) fn sanitize_before_verify(
                &mut self,
                current: &mut Self,
            ) {
                if current.enabled.is_none() {
                    current.enabled = Some(false);
                }
                if self.is_static() || self.addresses.is_some() {
                    if current.addresses.is_none() {
                        current.addresses = Some(Vec::new());
                    }
                    if self.allow_extra_address()
                        && let (Some(des_addrs), Some(cur_addrs)) = (
                            self.addresses.as_ref(),
                            current.addresses.as_mut(),
                        )
                    {
                        cur_addrs.retain(|cur_addr| {
                            des_addrs.iter().any(|des_addr| {
                                des_addr.ip == cur_addr.ip
                                    && des_addr.prefix_length
                                        == cur_addr.prefix_length
                            })
                        });
                    }
                }
                self.allow_extra_address = None;
                current.allow_extra_address = None;
            }
        }
    };
}

fn ipv4_is_dynamic(ip: &InterfaceIpv4) -> bool {
    ip.dhcp == Some(true)
}

fn ipv6_is_dynamic(ip: &InterfaceIpv6) -> bool {
    ip.dhcp == Some(true) || ip.autoconf == Some(true)
}

impl_ip_common!(InterfaceIpv4, "IPv4", ipv4_is_dynamic);
impl_ip_common!(InterfaceIpv6, "IPv6", ipv6_is_dynamic);

impl InterfaceIpv4 {
    pub(crate) fn remove_link_local(&mut self) {}
}

impl InterfaceIpv6 {
    /// Remove IPv6 link local addresses(fe80::/10).
    pub(crate) fn remove_link_local(&mut self) {
        if let Some(addrs) = self.addresses.as_mut() {
            addrs.retain(|addr| {
                if is_ipv6_link_local(&addr.ip, addr.prefix_length) {
                    log::debug!("Ignoring IPv6 link local address {addr}");
                    false
                } else {
                    true
                }
            })
        }
    }
}

fn validate_addrs_family_and_prefix(
    addrs: &[InterfaceIpAddr],
    family: &str,
) -> Result<(), NetstateError> {
    let is_ipv6 = family == "IPv6";
    let max_prefix_len = if is_ipv6 { IPV6_ADDR_LEN } else { IPV4_ADDR_LEN };
    for addr in addrs {
        if addr.ip.is_ipv6() != is_ipv6 {
            return Err(NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Got address {addr} in {} config section",
                    family.to_lowercase()
                ),
            ));
        }
        if addr.prefix_length as usize > max_prefix_len {
            return Err(NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Invalid {family} network prefix length '{}', should be \
                     in the range of 0 to {max_prefix_len}",
                    addr.prefix_length
                ),
            ));
        }
    }
    Ok(())
}

/// IP Address
///
/// Address with `valid_life_time` not equal to `None` or `Some("forever")`
/// is treated as dynamic address.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct InterfaceIpAddr {
    /// IP address.
    pub ip: IpAddr,
    /// Prefix length.
    /// Serialize and deserialize to/from `prefix-length`.
    #[serde(deserialize_with = "crate::deserializer::u8_or_string")]
    pub prefix_length: u8,
    /// MPTCP flag on this IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mptcp_flags: Option<Vec<MptcpAddressFlag>>,
    /// Remaining time for IP address been valid. The output format is
    /// "32sec" or "forever".
    #[serde(
        skip_serializing_if = "Option::is_none",
        alias = "valid-left",
        alias = "valid-lft"
    )]
    pub valid_life_time: Option<String>,
    /// Remaining time for IP address been preferred.
    #[serde(
        skip_serializing_if = "Option::is_none",
        alias = "preferred-left",
        alias = "preferred-lft"
    )]
    pub preferred_life_time: Option<String>,
}

impl std::fmt::Display for InterfaceIpAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.ip, self.prefix_length)
    }
}

impl Default for InterfaceIpAddr {
    fn default() -> Self {
        Self {
            ip: IpAddr::V6(Ipv6Addr::LOCALHOST),
            prefix_length: 128,
            mptcp_flags: None,
            valid_life_time: None,
            preferred_life_time: None,
        }
    }
}

impl InterfaceIpAddr {
    pub fn new(ip: IpAddr, prefix_length: u8) -> Self {
        Self {
            ip,
            prefix_length,
            ..Default::default()
        }
    }

    pub(crate) fn is_auto(&self) -> bool {
        self.valid_life_time.is_some()
            && self.valid_life_time.as_deref() != Some(FOREVER)
    }
}

impl std::convert::TryFrom<&str> for InterfaceIpAddr {
    type Error = NetstateError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let (ip_str, prefix_str) = match value.split_once('/') {
            Some((ip, prefix)) => (ip, Some(prefix)),
            None => (value, None),
        };
        let ip = IpAddr::from_str(ip_str).map_err(|e| {
            NetstateError::new(
                ErrorKind::InvalidArgument,
                format!("Invalid IP address {ip_str}: {e}"),
            )
        })?;
        let prefix_length = match prefix_str {
            None => {
                if ip.is_ipv6() {
                    IPV6_ADDR_LEN as u8
                } else {
                    IPV4_ADDR_LEN as u8
                }
            }
            Some(p) => p.parse::<u8>().map_err(|e| {
                NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!("Invalid IP address {value}: {e}"),
                )
            })?,
        };
        Ok(Self::new(ip, prefix_length))
    }
}

/// Whether IPv6 address is inside fe80::/10 with prefix length at least 10.
pub(crate) fn is_ipv6_link_local(ip: &IpAddr, prefix_length: u8) -> bool {
    match ip {
        IpAddr::V6(ip) => {
            (ip.segments()[0] & 0xffc0) == 0xfe80 && prefix_length >= 10
        }
        IpAddr::V4(_) => false,
    }
}

/// Normalize IP network string:
///  * Host bits cleared: `192.0.2.5/24` to `192.0.2.0/24`.
///  * Address without prefix length get `/32` or `/128`.
///  * IPv6 compressed to shortest form.
pub(crate) fn sanitize_ip_network(
    ip_net: &str,
) -> Result<String, NetstateError> {
    if ip_net.is_empty() {
        return Err(NetstateError::new(
            ErrorKind::InvalidArgument,
            "Invalid IP network string, got empty string".into(),
        ));
    }
    let (ip_str, prefix_str) = match ip_net.split_once('/') {
        Some((ip, prefix)) => (ip, Some(prefix)),
        None => (ip_net, None),
    };
    if prefix_str.is_some_and(|p| p.contains('/')) {
        return Err(NetstateError::new(
            ErrorKind::InvalidArgument,
            format!(
                "Invalid IP network string: '{ip_net}', expecting 'ip/prefix' \
                 or 'ip' format, for example: 192.0.2.0/24 or 2001:db8:1::/64 \
                 or 192.0.2.1"
            ),
        ));
    }
    let ip = IpAddr::from_str(ip_str).map_err(|e| {
        NetstateError::new(
            ErrorKind::InvalidArgument,
            format!("Invalid IP network '{ip_net}': {e}"),
        )
    })?;
    let max_len = if ip.is_ipv6() { IPV6_ADDR_LEN } else { IPV4_ADDR_LEN };
    let prefix_len = match prefix_str {
        None => max_len,
        Some(p) => p.parse::<usize>().map_err(|e| {
            NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Invalid IP network prefix length '{p}' in '{ip_net}': {e}"
                ),
            )
        })?,
    };
    if prefix_len > max_len {
        return Err(NetstateError::new(
            ErrorKind::InvalidArgument,
            format!(
                "Invalid IP network prefix length '{prefix_len}' in \
                 '{ip_net}', should not be bigger than {max_len}"
            ),
        ));
    }
    Ok(format!("{}/{prefix_len}", apply_ip_prefix_len(ip, prefix_len)))
}

pub(crate) fn is_ipv6_addr(addr: &str) -> bool {
    addr.contains(':')
}

/// Unspecified address of the same family of specified IP network.
pub(crate) fn unspecified_addr_of(ip_net: &str) -> &'static str {
    if is_ipv6_addr(ip_net) { "::" } else { "0.0.0.0" }
}

fn apply_ip_prefix_len(ip: IpAddr, prefix_length: usize) -> IpAddr {
    if prefix_length == 0 {
        return if ip.is_ipv6() {
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        };
    }

    match ip {
        IpAddr::V6(i) if prefix_length < IPV6_ADDR_LEN => Ipv6Addr::from(
            u128::from(i) & (u128::MAX << (IPV6_ADDR_LEN - prefix_length)),
        )
        .into(),
        IpAddr::V4(i) if prefix_length < IPV4_ADDR_LEN => Ipv4Addr::from(
            u32::from(i) & (u32::MAX << (IPV4_ADDR_LEN - prefix_length)),
        )
        .into(),
        _ => ip,
    }
}

/// Canonicalize a single IP address string, IPv6 in compressed form.
pub(crate) fn sanitize_ip_addr(addr: &str) -> Result<String, NetstateError> {
    Ok(IpAddr::from_str(addr)
        .map_err(|e| {
            NetstateError::new(
                ErrorKind::InvalidArgument,
                format!("Invalid IP address '{addr}': {e}"),
            )
        })?
        .to_string())
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonDisplay,
)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}
