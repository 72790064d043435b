// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Wen Liang <liangwen12year@gmail.com>
//  * Jan Vaclav <jvaclav@redhat.com>
//  * Íñigo Huguet <ihuguet@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>

use std::{
    hash::{Hash, Hasher},
    net::Ipv4Addr,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    ErrorKind, JsonDisplay, NetstateError,
    ip::{is_ipv6_addr, sanitize_ip_addr, sanitize_ip_network,
         unspecified_addr_of},
};

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[non_exhaustive]
#[serde(deny_unknown_fields)]
/// IP routing status
pub struct Routes {
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Running effected routes including routes from dynamic IP and routing
    /// daemons. Ignored when applying.
    pub running: Option<Vec<RouteEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Static routes.
    ///
    /// When applying, `None` means preserve current routes.
    /// This property is not overriding but adding specified routes to
    /// existing routes. To delete a route entry, please [RouteEntry.state] as
    /// [RouteState::Absent]. Any property of absent [RouteEntry] set to
    /// `None` means wildcard. For example, this [crate::NetworkState] could
    /// remove all routes next hop to interface eth1(showing in yaml):
    /// ```yaml
    /// routes:
    ///   config:
    ///   - next-hop-interface: eth1
    ///     state: absent
    /// ```
    pub config: Option<Vec<RouteEntry>>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether configured routes is empty or undefined.
    pub fn is_empty(&self) -> bool {
        self.config.as_ref().is_none_or(|rts| rts.is_empty())
    }

    pub(crate) fn validate(&self) -> Result<(), NetstateError> {
        for route in self.config.as_deref().unwrap_or_default() {
            if !route.is_absent() {
                if !route.is_unicast()
                    && (route.next_hop_iface.is_some()
                        || route.next_hop_addr.is_some())
                {
                    let e = NetstateError::new(
                        ErrorKind::InvalidArgument,
                        format!(
                            "A {} route cannot have a next hop: {route}",
                            route.route_type.unwrap_or_default()
                        ),
                    );
                    log::error!("{e}");
                    return Err(e);
                }
                if route.destination.is_none() {
                    let e = NetstateError::new(
                        ErrorKind::InvalidArgument,
                        format!(
                            "Route entry does not have destination: {route}"
                        ),
                    );
                    log::error!("{e}");
                    return Err(e);
                }
                if route.next_hop_iface.is_none() && route.is_unicast() {
                    let e = NetstateError::new(
                        ErrorKind::InvalidArgument,
                        format!(
                            "Route entry does not have next hop interface: \
                             {route}"
                        ),
                    );
                    log::error!("{e}");
                    return Err(e);
                }
            }
            validate_route_dst(route)?;
        }
        Ok(())
    }

    pub(crate) fn remove_ignored_routes(&mut self) {
        for rts in [self.running.as_mut(), self.config.as_mut()]
            .into_iter()
            .flatten()
        {
            rts.retain(|rt| !rt.is_ignore());
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
#[derive(Default)]
pub enum RouteState {
    /// Mark a route entry as absent to remove it.
    #[default]
    Absent,
    /// Mark a route as ignored
    Ignore,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonDisplay)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
#[serde(deny_unknown_fields)]
/// Route entry
pub struct RouteEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Only used for delete route when applying.
    pub state: Option<RouteState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Route destination address or network
    /// Mandatory for every non-absent routes.
    pub destination: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        rename = "next-hop-interface"
    )]
    /// Route next hop interface name.
    /// Serialize and deserialize to/from `next-hop-interface`.
    /// Mandatory for every non-absent unicast routes.
    pub next_hop_iface: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        rename = "next-hop-address"
    )]
    /// Route next hop IP address.
    /// Serialize and deserialize to/from `next-hop-address`.
    /// Undefined is identical to unspecified address of the destination
    /// address family.
    pub next_hop_addr: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_i64_or_string"
    )]
    /// Route metric. [RouteEntry::USE_DEFAULT_METRIC] for default
    /// setting of network backend.
    pub metric: Option<i64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    /// Route table id. [RouteEntry::USE_DEFAULT_ROUTE_TABLE] for main
    /// route table 254.
    pub table_id: Option<u32>,
    /// ECMP(Equal-Cost Multi-Path) route weight
    /// The valid range of this property is 1-256.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u16_or_string"
    )]
    pub weight: Option<u16>,
    /// Route type
    /// Serialize and deserialize to/from `route-type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_type: Option<RouteType>,
    /// Congestion window clamp
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub cwnd: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Preferred source address of packets routed via this route.
    pub source: Option<String>,
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
pub enum RouteType {
    #[default]
    Unicast,
    Blackhole,
    Unreachable,
    Prohibit,
}

const RTN_UNICAST: u8 = 1;
const RTN_BLACKHOLE: u8 = 6;
const RTN_UNREACHABLE: u8 = 7;
const RTN_PROHIBIT: u8 = 8;

impl From<RouteType> for u8 {
    fn from(v: RouteType) -> u8 {
        match v {
            RouteType::Unicast => RTN_UNICAST,
            RouteType::Blackhole => RTN_BLACKHOLE,
            RouteType::Unreachable => RTN_UNREACHABLE,
            RouteType::Prohibit => RTN_PROHIBIT,
        }
    }
}

impl RouteEntry {
    pub const USE_DEFAULT_METRIC: i64 = -1;
    pub const USE_DEFAULT_ROUTE_TABLE: u32 = 0;
    /// Kernel main route table.
    pub const DEFAULT_ROUTE_TABLE_ID: u32 = 254;
    const IPV4_DEFAULT_GATEWAY: &str = "0.0.0.0/0";
    const IPV6_DEFAULT_GATEWAY: &str = "::/0";

    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_absent(&self) -> bool {
        matches!(self.state, Some(RouteState::Absent))
    }

    pub(crate) fn is_ignore(&self) -> bool {
        matches!(self.state, Some(RouteState::Ignore))
    }

    /// Route table ID with [RouteEntry::USE_DEFAULT_ROUTE_TABLE] resolved
    /// to main route table.
    pub(crate) fn table_id_or_default(&self) -> u32 {
        match self.table_id {
            None | Some(Self::USE_DEFAULT_ROUTE_TABLE) => {
                Self::DEFAULT_ROUTE_TABLE_ID
            }
            Some(t) => t,
        }
    }

    /// Default gateway in main route table.
    pub(crate) fn is_gateway(&self) -> bool {
        self.table_id_or_default() == Self::DEFAULT_ROUTE_TABLE_ID
            && matches!(
                self.destination.as_deref(),
                Some(Self::IPV4_DEFAULT_GATEWAY)
                    | Some(Self::IPV6_DEFAULT_GATEWAY)
            )
    }

    fn next_hop_addr_or_default(&self) -> &str {
        match self.next_hop_addr.as_deref() {
            None | Some("") => unspecified_addr_of(
                self.destination.as_deref().unwrap_or_default(),
            ),
            Some(a) => a,
        }
    }

    /// Whether the absent route (self) matches with another.
    /// Undefined property means wildcard.
    pub(crate) fn is_match(&self, other: &Self) -> bool {
        if self.destination.as_deref().is_some_and(|d| !d.is_empty())
            && self.destination != other.destination
        {
            return false;
        }
        if self.next_hop_iface.is_some()
            && self.next_hop_iface != other.next_hop_iface
        {
            return false;
        }
        if self.next_hop_addr.is_some()
            && self.next_hop_addr_or_default()
                != other.next_hop_addr_or_default()
        {
            return false;
        }
        if self.table_id.is_some()
            && self.table_id != Some(RouteEntry::USE_DEFAULT_ROUTE_TABLE)
            && self.table_id_or_default() != other.table_id_or_default()
        {
            return false;
        }
        if self.metric.is_some()
            && self.metric != Some(RouteEntry::USE_DEFAULT_METRIC)
            && self.metric != other.metric
        {
            return false;
        }
        if self.weight.is_some() && self.weight != other.weight {
            return false;
        }
        if self.route_type.is_some()
            && self.route_type.unwrap_or_default()
                != other.route_type.unwrap_or_default()
        {
            return false;
        }
        if self.cwnd.is_some() && self.cwnd != other.cwnd {
            return false;
        }
        if self.source.is_some() && self.source != other.source {
            return false;
        }
        true
    }

    // Return tuple of all properties with default value unwrapped.
    // Metric is ignored.
    fn sort_key(&self) -> (bool, bool, &str, &str, &str, &str, [u32; 4]) {
        (
            !self.is_absent(),
            self.is_ipv6(),
            self.next_hop_iface.as_deref().unwrap_or_default(),
            self.destination.as_deref().unwrap_or_default(),
            self.next_hop_addr_or_default(),
            self.source.as_deref().unwrap_or_default(),
            [
                self.table_id_or_default(),
                self.weight.unwrap_or_default().into(),
                u8::from(self.route_type.unwrap_or_default()).into(),
                self.cwnd.unwrap_or_default(),
            ],
        )
    }

    pub(crate) fn sanitize(&mut self) -> Result<(), NetstateError> {
        if let Some(dst) = self.destination.as_ref() {
            if dst.is_empty() {
                self.destination = None;
            } else {
                let new_dst = sanitize_ip_network(dst)?;
                if dst != &new_dst {
                    log::warn!(
                        "Route destination {dst} sanitized to {new_dst}"
                    );
                    self.destination = Some(new_dst);
                }
            }
        }
        if let Some(via) = self.next_hop_addr.as_ref()
            && !via.is_empty()
        {
            let new_via = sanitize_ip_addr(via)?;
            if via != &new_via {
                log::warn!(
                    "Route next-hop-address {via} sanitized to {new_via}"
                );
                self.next_hop_addr = Some(new_via);
            }
        }
        if let Some(src) = self.source.as_ref() {
            let new_src = sanitize_ip_addr(src)?;
            if src != &new_src {
                log::info!("Route source address {src} sanitized to {new_src}");
                self.source = Some(new_src);
            }
        }
        if !self.is_absent() && self.table_id == Some(0) {
            self.table_id = None;
        }
        if let Some(weight) = self.weight
            && !(1..=256).contains(&weight)
        {
            return Err(NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Invalid ECMP route weight {weight}, should be in the \
                     range of 1 to 256"
                ),
            ));
        }
        if self.cwnd == Some(0) {
            return Err(NetstateError::new(
                ErrorKind::InvalidArgument,
                "The value of 'cwnd' cannot be 0".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn is_ipv6(&self) -> bool {
        self.destination
            .as_deref()
            .is_some_and(|d| is_ipv6_addr(d))
    }

    pub(crate) fn is_unicast(&self) -> bool {
        self.route_type.unwrap_or_default() == RouteType::Unicast
    }
}

// For Vec::dedup()
impl PartialEq for RouteEntry {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

// For Vec::sort_unstable()
impl Ord for RouteEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

// For ord
impl Eq for RouteEntry {}

// For ord
impl PartialOrd for RouteEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for RouteEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state);
    }
}

// 0.0.0.0/8 and its subnet cannot be used as the route destination network
// for unicast route
fn validate_route_dst(route: &RouteEntry) -> Result<(), NetstateError> {
    let Some(dst) = route.destination.as_deref() else {
        return Ok(());
    };
    if is_ipv6_addr(dst) || !route.is_unicast() {
        return Ok(());
    }
    let (ip_str, prefix) = match dst.split_once('/') {
        Some((ip, prefix)) => (
            ip,
            prefix.parse::<u8>().map_err(|_| {
                NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "The prefix of the route destination network \
                         '{dst}' is invalid"
                    ),
                )
            })?,
        ),
        None => (dst, 32),
    };
    let ip_addr = Ipv4Addr::from_str(ip_str)?;
    if ip_addr.octets()[0] == 0 && prefix >= 8 {
        let e = NetstateError::new(
            ErrorKind::InvalidArgument,
            "0.0.0.0/8 and its subnet cannot be used as the route \
             destination for unicast route, please use the default \
             gateway 0.0.0.0/0 instead"
                .to_string(),
        );
        log::error!("{e}");
        return Err(e);
    }
    Ok(())
}
