// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>
//  * Wen Liang <liangwen12year@gmail.com>

use serde::{Deserialize, Serialize};

use crate::{
    AddressFamily, ErrorKind, InterfaceIpAddr, JsonDisplay, NetstateError,
    ip::{is_ipv6_addr, sanitize_ip_network},
};

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[non_exhaustive]
#[serde(deny_unknown_fields)]
/// Routing rules
pub struct RouteRules {
    #[serde(skip_serializing_if = "Option::is_none")]
    /// When applying, `None` means preserve existing route rules.
    /// Desired route rules are appended to existing ones. To delete route
    /// rule, set [RouteRuleEntry.state] to [RouteRuleState::Absent], any
    /// property set to `None` in absent route rule means wildcard. For
    /// example, this removes all route rules looking up route table 500:
    /// ```yml
    /// ---
    /// route-rules:
    ///   config:
    ///     - state: absent
    ///       route-table: 500
    /// ```
    pub config: Option<Vec<RouteRuleEntry>>,
}

impl RouteRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.config.is_none()
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
pub enum RouteRuleState {
    /// Used for delete route rule
    #[default]
    Absent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
#[serde(deny_unknown_fields)]
pub struct RouteRuleEntry {
    /// Address family of the route rule. Mandatory when neither `ip-from`
    /// nor `ip-to` is defined.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<AddressFamily>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<RouteRuleState>,
    /// Source prefix to match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_from: Option<String>,
    /// Destination prefix to match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_to: Option<String>,
    /// Bigger number means lower priority.
    /// [RouteRuleEntry::USE_DEFAULT_PRIORITY] or undefined means
    /// auto-assigned.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_i64_or_string"
    )]
    pub priority: Option<i64>,
    /// The routing table ID to lookup if the rule selector matches.
    /// Serialize and deserialize to/from `route-table`.
    #[serde(
        skip_serializing_if = "Option::is_none",
        rename = "route-table",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub table_id: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string",
        serialize_with = "crate::serializer::option_u32_as_hex"
    )]
    pub fwmark: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string",
        serialize_with = "crate::serializer::option_u32_as_hex"
    )]
    pub fwmask: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<RouteRuleAction>,
    /// Incoming interface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iif: Option<String>,
    /// Reject routing decisions that have a prefix length of this or less.
    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        deserialize_with = "crate::deserializer::option_u32_or_string"
    )]
    pub suppress_prefix_length: Option<u32>,
}

impl RouteRuleEntry {
    /// Auto-assign the priority.
    pub const USE_DEFAULT_PRIORITY: i64 = -1;
    /// Use main route table 254.
    pub const USE_DEFAULT_ROUTE_TABLE: u32 = 0;
    /// Main route table.
    pub const DEFAULT_ROUTE_TABLE_ID: u32 = 254;

    pub fn new() -> Self {
        Self::default()
    }

    fn validate_ip_from_to(&self) -> Result<(), NetstateError> {
        if self.ip_from.is_none()
            && self.ip_to.is_none()
            && self.family.is_none()
        {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!(
                    "Neither ip-from, ip-to nor family is defined '{self}'"
                ),
            );
            log::error!("{e}");
            return Err(e);
        }
        let Some(family) = self.family else {
            return Ok(());
        };
        for (prop, ip) in [("ip-from", &self.ip_from), ("ip-to", &self.ip_to)]
        {
            if let Some(ip) = ip.as_deref()
                && is_ipv6_addr(ip) != (family == AddressFamily::Ipv6)
            {
                let e = NetstateError::new(
                    ErrorKind::InvalidArgument,
                    format!(
                        "The {prop} format mismatches with the family set \
                         '{self}'"
                    ),
                );
                log::error!("{e}");
                return Err(e);
            }
        }
        Ok(())
    }

    fn validate_fwmark_and_fwmask(&self) -> Result<(), NetstateError> {
        if self.fwmark.is_none() && self.fwmask.is_some() {
            let e = NetstateError::new(
                ErrorKind::InvalidArgument,
                format!("fwmask is present but fwmark is not defined: {self}"),
            );
            log::error!("{e}");
            return Err(e);
        }
        Ok(())
    }

    pub(crate) fn is_absent(&self) -> bool {
        matches!(self.state, Some(RouteRuleState::Absent))
    }

    pub(crate) fn is_ipv6(&self) -> bool {
        self.family == Some(AddressFamily::Ipv6)
            || self.ip_from.as_deref().is_some_and(is_ipv6_addr)
            || self.ip_to.as_deref().is_some_and(is_ipv6_addr)
    }

    /// Route table ID with [RouteRuleEntry::USE_DEFAULT_ROUTE_TABLE]
    /// resolved to main route table.
    pub(crate) fn table_id_or_default(&self) -> u32 {
        match self.table_id {
            None | Some(Self::USE_DEFAULT_ROUTE_TABLE) => {
                Self::DEFAULT_ROUTE_TABLE_ID
            }
            Some(t) => t,
        }
    }

    pub(crate) fn has_priority(&self) -> bool {
        self.priority
            .is_some_and(|p| p != Self::USE_DEFAULT_PRIORITY)
    }

    /// Whether the absent route rule (self) matches with another.
    /// Undefined property means wildcard.
    pub(crate) fn is_match(&self, other: &Self) -> bool {
        for (des, cur) in
            [(&self.ip_from, &other.ip_from), (&self.ip_to, &other.ip_to)]
        {
            if let Some(ip) = des.as_deref() {
                let ip = if ip.contains('/') {
                    ip.to_string()
                } else {
                    match InterfaceIpAddr::try_from(ip) {
                        Ok(i) => i.to_string(),
                        Err(e) => {
                            log::error!("{e}");
                            return false;
                        }
                    }
                };
                if cur.as_deref() != Some(ip.as_str()) {
                    return false;
                }
            }
        }
        if self.family.is_some() && self.is_ipv6() != other.is_ipv6() {
            return false;
        }
        if self.has_priority() && self.priority != other.priority {
            return false;
        }
        if self.table_id.is_some()
            && self.table_id != Some(Self::USE_DEFAULT_ROUTE_TABLE)
            && self.table_id_or_default() != other.table_id_or_default()
        {
            return false;
        }
        if self.fwmark.is_some()
            && self.fwmark.unwrap_or_default()
                != other.fwmark.unwrap_or_default()
        {
            return false;
        }
        if self.fwmask.is_some()
            && self.fwmask.unwrap_or_default()
                != other.fwmask.unwrap_or_default()
        {
            return false;
        }
        if self.iif.is_some() && self.iif != other.iif {
            return false;
        }
        if self.action.is_some() && self.action != other.action {
            return false;
        }
        if self.suppress_prefix_length.is_some()
            && self.suppress_prefix_length != other.suppress_prefix_length
        {
            return false;
        }
        true
    }

    // Return tuple of (no_absent, is_ipv4, table_id, ip_from, ip_to, iif,
    // priority, [fwmark, fwmask, action, suppress_prefix_length])
    fn sort_key(&self) -> (bool, bool, u32, &str, &str, &str, i64, [u32; 4]) {
        (
            !self.is_absent(),
            !self.is_ipv6(),
            self.table_id_or_default(),
            self.ip_from.as_deref().unwrap_or_default(),
            self.ip_to.as_deref().unwrap_or_default(),
            self.iif.as_deref().unwrap_or_default(),
            self.priority.unwrap_or(Self::USE_DEFAULT_PRIORITY),
            [
                self.fwmark.unwrap_or_default(),
                self.fwmask.unwrap_or_default(),
                self.action.map(u8::from).unwrap_or_default().into(),
                self.suppress_prefix_length.unwrap_or_default(),
            ],
        )
    }

    pub(crate) fn sanitize(&mut self) -> Result<(), NetstateError> {
        for (prop, ip) in
            [("ip-from", &mut self.ip_from), ("ip-to", &mut self.ip_to)]
        {
            if let Some(old_ip) = ip.as_ref() {
                let new_ip = sanitize_ip_network(old_ip)?;
                if self.family.is_none() {
                    self.family = Some(if is_ipv6_addr(&new_ip) {
                        AddressFamily::Ipv6
                    } else {
                        AddressFamily::Ipv4
                    });
                }
                if old_ip != &new_ip {
                    log::warn!(
                        "Route rule {prop} {old_ip} sanitized to {new_ip}"
                    );
                    *ip = Some(new_ip);
                }
            }
        }
        self.validate_ip_from_to()?;
        self.validate_fwmark_and_fwmask()?;

        if !self.is_absent()
            && self.action.is_none()
            && self.table_id_or_default() == Self::DEFAULT_ROUTE_TABLE_ID
            && self.table_id != Some(Self::DEFAULT_ROUTE_TABLE_ID)
        {
            log::info!(
                "Route rule {self} has no action or route-table defined, \
                 using default route table {}",
                Self::DEFAULT_ROUTE_TABLE_ID
            );
            self.table_id = Some(Self::DEFAULT_ROUTE_TABLE_ID);
        }
        Ok(())
    }
}

// For Vec::dedup()
impl PartialEq for RouteRuleEntry {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

// For Vec::sort_unstable()
impl Ord for RouteRuleEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

// For ord
impl Eq for RouteRuleEntry {}

// For ord
impl PartialOrd for RouteRuleEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for RouteRuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut props = Vec::new();
        if self.is_absent() {
            props.push("state: absent".to_string());
        }
        if let Some(v) = self.family.as_ref() {
            props.push(format!("family: {v}"));
        }
        if let Some(v) = self.ip_from.as_ref() {
            props.push(format!("ip-from: {v}"));
        }
        if let Some(v) = self.ip_to.as_ref() {
            props.push(format!("ip-to: {v}"));
        }
        if let Some(v) = self.priority.as_ref() {
            props.push(format!("priority: {v}"));
        }
        if let Some(v) = self.table_id.as_ref() {
            props.push(format!("route-table: {v}"));
        }
        if let Some(v) = self.fwmark.as_ref() {
            props.push(format!("fwmark: {v:#x}"));
        }
        if let Some(v) = self.fwmask.as_ref() {
            props.push(format!("fwmask: {v:#x}"));
        }
        if let Some(v) = self.iif.as_ref() {
            props.push(format!("iif: {v}"));
        }
        if let Some(v) = self.action.as_ref() {
            props.push(format!("action: {v}"));
        }
        if let Some(v) = self.suppress_prefix_length.as_ref() {
            props.push(format!("suppress-prefix-length: {v}"));
        }
        write!(f, "{}", props.join(" "))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum RouteRuleAction {
    Blackhole,
    Unreachable,
    Prohibit,
}

impl std::fmt::Display for RouteRuleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Blackhole => "blackhole",
                Self::Unreachable => "unreachable",
                Self::Prohibit => "prohibit",
            }
        )
    }
}

const FR_ACT_BLACKHOLE: u8 = 6;
const FR_ACT_UNREACHABLE: u8 = 7;
const FR_ACT_PROHIBIT: u8 = 8;

impl From<RouteRuleAction> for u8 {
    fn from(v: RouteRuleAction) -> u8 {
        match v {
            RouteRuleAction::Blackhole => FR_ACT_BLACKHOLE,
            RouteRuleAction::Unreachable => FR_ACT_UNREACHABLE,
            RouteRuleAction::Prohibit => FR_ACT_PROHIBIT,
        }
    }
}
