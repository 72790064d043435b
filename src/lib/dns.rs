// SPDX-License-Identifier: Apache-2.0

// This file is based on the work of nmstate project(https://nmstate.io/) which
// is under license of Apache 2.0, authors of original file are:
//  * Gris Ge <fge@redhat.com>
//  * Fernando Fernandez Mancera <ffmancera@riseup.net>

use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use crate::{ErrorKind, JsonDisplay, NetstateError, ip::is_ipv6_addr};

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[non_exhaustive]
#[serde(deny_unknown_fields)]
/// DNS resolver state. Example partial yaml output of [crate::NetworkState]
/// with static DNS config:
/// ```yaml
/// ---
/// dns-resolver:
///   running:
///      server:
///      - 2001:db8:1::250
///      - 192.0.2.250
///      search:
///      - example.org
///   config:
///      server:
///      - 2001:db8:1::250
///      - 192.0.2.250
///      search:
///      - example.org
/// ```
pub struct DnsState {
    #[serde(skip_serializing_if = "Option::is_none")]
    /// The running effective state. The DNS server might be from DHCP(IPv6
    /// autoconf) or manual setup.
    /// Ignored when applying state.
    pub running: Option<DnsClientState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// The static saved DNS resolver config.
    /// When applying, `None` means preserve current static DNS config.
    /// Otherwise, every defined list overrides the current one.
    pub config: Option<DnsClientState>,
}

impl DnsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_none() && self.config.is_none()
    }

    pub(crate) fn sanitize(&mut self) -> Result<(), NetstateError> {
        if let Some(config) = self.config.as_mut() {
            config.sanitize()?;
        }
        Ok(())
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[non_exhaustive]
#[serde(deny_unknown_fields)]
/// DNS Client state
pub struct DnsClientState {
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Name server IP address list, the order is the priority.
    /// To remove all existing servers, please use `Some(Vec::new())`.
    /// If undefined(set to `None`), will preserve current config.
    pub server: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Search list for host-name lookup.
    /// To remove all existing search, please use `Some(Vec::new())`.
    /// If undefined(set to `None`), will preserve current config.
    pub search: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// DNS option list, e.g. `rotate`, `ndots:9`.
    /// To remove all existing options, please use `Some(Vec::new())`.
    /// If undefined(set to `None`), will preserve current config.
    pub options: Option<Vec<String>>,
}

impl DnsClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.server.is_none() && self.search.is_none() && self.options.is_none()
    }

    // Whether user want to purge all DNS settings
    pub(crate) fn is_purge(&self) -> bool {
        [&self.server, &self.search, &self.options]
            .iter()
            .all(|v| v.as_ref().is_none_or(|v| v.is_empty()))
    }

    pub(crate) fn sanitize(&mut self) -> Result<(), NetstateError> {
        if let Some(srvs) = self.server.as_mut() {
            for srv in srvs.iter_mut() {
                let new_srv = sanitize_dns_server(srv)?;
                if srv != &new_srv {
                    log::debug!("DNS server {srv} sanitized to {new_srv}");
                    *srv = new_srv;
                }
            }
        }
        Ok(())
    }
}

/// DNS configuration stored on a single IP family of the carrier interface.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[non_exhaustive]
pub struct DnsIfaceMetadata {
    /// Lower is preferred.
    pub priority: i32,
    pub server: Vec<String>,
    pub search: Vec<String>,
    pub options: Vec<String>,
}

// IPv6 link local address is allowed to hold `%<iface>` suffix.
fn sanitize_dns_server(srv: &str) -> Result<String, NetstateError> {
    if is_ipv6_addr(srv) {
        if let Some((ip, iface)) = parse_dns_ipv6_link_local_srv(srv)? {
            return Ok(format!("{ip}%{iface}"));
        }
        if let Ok(ip) = srv.parse::<Ipv6Addr>() {
            return Ok(ip.to_string());
        }
    } else if let Ok(ip) = srv.parse::<Ipv4Addr>() {
        return Ok(ip.to_string());
    }
    let e = NetstateError::new(
        ErrorKind::InvalidArgument,
        format!("Invalid DNS server string {srv}"),
    );
    log::error!("{e}");
    Err(e)
}

pub(crate) fn parse_dns_ipv6_link_local_srv(
    srv: &str,
) -> Result<Option<(Ipv6Addr, &str)>, NetstateError> {
    let Some((ip_str, iface)) = srv.split_once('%') else {
        return Ok(None);
    };
    if iface.is_empty() || iface.contains('%') {
        return Err(NetstateError::new(
            ErrorKind::InvalidArgument,
            format!(
                "Invalid DNS server {srv}, the IPv6 link local DNS server \
                 should be in the format like 'fe80::deef:1%eth1'"
            ),
        ));
    }
    match ip_str.parse::<Ipv6Addr>() {
        Ok(ip) if ip.is_unicast_link_local() => Ok(Some((ip, iface))),
        _ => Err(NetstateError::new(
            ErrorKind::InvalidArgument,
            format!(
                "Invalid IPv6 address in {srv}, only IPv6 link local \
                 address is allowed to have '%' character in DNS name \
                 server, the correct format should be 'fe80::deef:1%eth1'"
            ),
        )),
    }
}
