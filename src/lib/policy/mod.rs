// SPDX-License-Identifier: Apache-2.0

mod capture;
mod json;
mod template;
mod token;

use serde::{Deserialize, Serialize};

use crate::{ErrorKind, JsonDisplay, NetstateError, NetworkState};

pub use self::{
    capture::{NetworkCaptureCommand, NetworkCaptureRules},
    template::NetworkStateTemplate,
};

/// Network policy expands into desired state using data captured from
/// current state.
///
/// Example:
/// ```yaml
/// capture:
///   default-gw: routes.running.destination=="0.0.0.0/0"
///   base-iface: >-
///     interfaces.name==capture.default-gw.routes.running.0.next-hop-interface
/// desired-state:
///   interfaces:
///   - name: br0
///     type: linux-bridge
///     mac-address: "{{ capture.base-iface.interfaces.0.mac-address }}"
///     bridge:
///       port:
///       - name: "{{ capture.base-iface.interfaces.0.name }}"
/// ```
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonDisplay,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[non_exhaustive]
pub struct NetworkPolicy {
    #[serde(default, skip_serializing_if = "NetworkCaptureRules::is_empty")]
    pub capture: NetworkCaptureRules,
    #[serde(
        default,
        alias = "desiredState",
        skip_serializing_if = "NetworkStateTemplate::is_empty"
    )]
    pub desired_state: NetworkStateTemplate,
}

impl NetworkPolicy {
    pub fn new_from_yaml(policy_yaml: &str) -> Result<Self, NetstateError> {
        Ok(serde_yaml::from_str(policy_yaml)?)
    }

    /// Expand the policy into desired [NetworkState] using data captured
    /// from current state.
    pub fn policy_to_state(
        &self,
        current: &NetworkState,
    ) -> Result<NetworkState, NetstateError> {
        if self.desired_state.is_empty() {
            return Ok(NetworkState::new());
        }
        let current_value = serde_json::to_value(current).map_err(|e| {
            NetstateError::new(
                ErrorKind::Bug,
                format!(
                    "Failed to convert NetworkState {current} to JSON value: \
                     {e}"
                ),
            )
        })?;
        let captures = self.capture.execute(&current_value)?;
        self.desired_state.fill_with_captured_data(&captures)
    }
}
