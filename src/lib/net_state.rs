// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{
    DnsState, ErrorKind, HostNameState, Interfaces, JsonDisplayHideSecrets,
    NetstateError, OvsDbGlobalConfig, RouteRules, Routes,
};

/// Only supported schema version of [NetworkState].
pub const CUR_SCHEMA_VERSION: u32 = 1;

/// The whole network state, used as desired state, current state and the
/// state of edit plan.
///
/// Example yaml(many lines omitted) of NetworkState:
/// ```yaml
/// version: 1
/// hostname:
///   running: host1.example.org
///   config: host1.example.org
/// dns-resolver:
///   config:
///     server:
///     - 192.0.2.1
///     search:
///     - example.org
/// route-rules:
///   config:
///   - ip-from: 192.0.2.0/24
///     route-table: 500
/// routes:
///   config:
///   - destination: 0.0.0.0/0
///     next-hop-address: 192.0.2.254
///     next-hop-interface: eth1
/// interfaces:
/// - name: eth1
///   type: ethernet
///   state: up
///   ipv4:
///     enabled: true
///     address:
///     - ip: 192.0.2.10
///       prefix-length: 24
/// ```
#[derive(
    Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonDisplayHideSecrets,
)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct NetworkState {
    /// Please set it to 1 explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Description for the whole desire state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hostname of current host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<HostNameState>,
    /// DNS resolver.
    #[serde(
        default,
        rename = "dns-resolver",
        skip_serializing_if = "Option::is_none"
    )]
    pub dns: Option<DnsState>,
    /// Route rules
    #[serde(default, rename = "route-rules", skip_serializing_if = "is_empty")]
    pub rules: RouteRules,
    /// Routes
    #[serde(default, skip_serializing_if = "Routes::is_empty")]
    pub routes: Routes,
    /// Network interfaces
    #[serde(default, rename = "interfaces")]
    pub ifaces: Interfaces,
    /// The global configurations of OpenvSwitch daemon
    #[serde(
        default,
        rename = "ovs-db",
        skip_serializing_if = "Option::is_none"
    )]
    pub ovsdb: Option<OvsDbGlobalConfig>,
}

fn is_empty(rules: &RouteRules) -> bool {
    rules.is_empty()
}

impl Default for NetworkState {
    fn default() -> Self {
        Self {
            version: Some(CUR_SCHEMA_VERSION),
            description: None,
            hostname: None,
            dns: None,
            rules: Default::default(),
            routes: Default::default(),
            ifaces: Default::default(),
            ovsdb: None,
        }
    }
}

impl NetworkState {
    pub const HIDE_PASSWORD_STR: &str = "<_password_hid_by_netstate>";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.hostname.as_ref().is_none_or(|h| h.is_empty())
            && self.dns.as_ref().is_none_or(|d| d.is_empty())
            && self.rules.is_empty()
            && self.routes.is_empty()
            && self.ifaces.is_empty()
            && self.ovsdb.as_ref().is_none_or(|o| o.is_none())
    }

    /// Replace secrets (802.1X password, wireguard keys) with
    /// [NetworkState::HIDE_PASSWORD_STR].
    pub fn hide_secrets(&mut self) {
        self.ifaces.hide_secrets();
    }

    pub(crate) fn validate_version(&self) -> Result<(), NetstateError> {
        match self.version {
            None | Some(CUR_SCHEMA_VERSION) => Ok(()),
            Some(v) => {
                let e = NetstateError::new(
                    ErrorKind::InvalidSchemaVersion,
                    format!(
                        "Unsupported schema version {v}, only version \
                         {CUR_SCHEMA_VERSION} is supported"
                    ),
                );
                log::error!("{e}");
                Err(e)
            }
        }
    }

    /// Wrapping function of [serde_json::from_str()] with error mapped to
    /// [NetstateError].
    pub fn new_from_json(net_state_json: &str) -> Result<Self, NetstateError> {
        let state: Self = serde_json::from_str(net_state_json)?;
        state.validate_version()?;
        Ok(state)
    }

    /// Wrapping function of [serde_yaml::from_str()] with error mapped to
    /// [NetstateError].
    pub fn new_from_yaml(net_state_yaml: &str) -> Result<Self, NetstateError> {
        let state: Self = if net_state_yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(net_state_yaml)?
        };
        state.validate_version()?;
        Ok(state)
    }
}
