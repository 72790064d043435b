// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{
    BaseInterface, InterfaceType, JsonDisplay, NetstateError,
    NetstateInterface,
};

/// Team interface managed by userspace teamd.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonDisplay)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct TeamInterface {
    #[serde(flatten)]
    pub base: BaseInterface,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamConfig>,
}

impl Default for TeamInterface {
    fn default() -> Self {
        Self {
            base: BaseInterface {
                iface_type: InterfaceType::Team,
                ..Default::default()
            },
            team: None,
        }
    }
}

impl NetstateInterface for TeamInterface {
    fn base_iface(&self) -> &BaseInterface {
        &self.base
    }

    fn base_iface_mut(&mut self) -> &mut BaseInterface {
        &mut self.base
    }

    fn is_virtual(&self) -> bool {
        true
    }

    fn ports(&self) -> Option<Vec<&str>> {
        self.team
            .as_ref()
            .and_then(|t| t.ports.as_ref())
            .map(|ports| ports.iter().map(|p| p.name.as_str()).collect())
    }

    fn state_for_verify_iface_specific(&mut self) {
        self.sort_ports();
    }

    fn sort_ports(&mut self) {
        if let Some(ports) = self.team.as_mut().and_then(|t| t.ports.as_mut()) {
            ports.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        }
    }

    fn remove_port(&mut self, port_name: &str) -> Result<(), NetstateError> {
        if let Some(ports) = self.team.as_mut().and_then(|t| t.ports.as_mut()) {
            ports.retain(|p| p.name != port_name);
        }
        Ok(())
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct TeamConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<TeamPortConfig>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<TeamRunnerConfig>,
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct TeamPortConfig {
    pub name: String,
}

#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct TeamRunnerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<TeamRunnerMode>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum TeamRunnerMode {
    Broadcast,
    RoundRobin,
    ActiveBackup,
    LoadBalance,
    Lacp,
}
